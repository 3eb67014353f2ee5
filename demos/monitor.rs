//! Terminal monitor for a Linux Audio Server
//!
//! Usage: `cargo run --example monitor -- <host | config.json>`
//!
//! Logs go to `monitor.log`; set `RUST_LOG=linux_audio_server=debug` to see
//! how each sink's state is resolved.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use linux_audio_server::{
    AudioServerClient, Coordinator, KnownSource, PlaybackStatus, ServerConfig, SinkPlayer,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const VOLUME_STEP: f64 = 0.05;

struct App {
    coordinator: Arc<Coordinator>,
    selected_sink_index: usize,
    status_message: String,
}

impl App {
    fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            selected_sink_index: 0,
            status_message: "Connected".to_string(),
        }
    }

    fn sinks(&self) -> Vec<SinkPlayer> {
        self.coordinator.sinks()
    }

    fn selected_sink(&self) -> Option<SinkPlayer> {
        self.sinks().into_iter().nth(self.selected_sink_index)
    }

    fn select_next(&mut self) {
        let sink_count = self.sinks().len();
        if sink_count > 0 {
            self.selected_sink_index = (self.selected_sink_index + 1) % sink_count;
        }
    }

    fn select_previous(&mut self) {
        let sink_count = self.sinks().len();
        if sink_count > 0 {
            self.selected_sink_index = (self.selected_sink_index + sink_count - 1) % sink_count;
        }
    }

    async fn toggle_playback(&mut self) {
        let Some(sink) = self.selected_sink() else { return };
        if sink.state() == PlaybackStatus::Playing {
            sink.pause().await;
            self.status_message = format!("Paused {}", sink.name());
        } else {
            sink.play().await;
            self.status_message = format!("Play sent to {}", sink.name());
        }
    }

    async fn skip(&mut self, forward: bool) {
        let Some(sink) = self.selected_sink() else { return };
        if forward {
            sink.next_track().await;
        } else {
            sink.previous_track().await;
        }
    }

    async fn adjust_volume(&mut self, delta: f64) {
        let Some(sink) = self.selected_sink() else { return };
        let Some(volume) = sink.volume() else { return };
        let volume = (volume + delta).clamp(0.0, 1.0);

        self.status_message = match sink.set_volume(volume).await {
            Ok(()) => format!("{} volume {:.0}%", sink.name(), volume * 100.0),
            Err(e) => format!("Failed to set volume: {}", e),
        };
    }

    async fn toggle_mute(&mut self) {
        let Some(sink) = self.selected_sink() else { return };
        let muted = sink.is_muted().unwrap_or(false);

        self.status_message = match sink.set_mute(!muted).await {
            Ok(()) => format!("{} {}", sink.name(), if muted { "unmuted" } else { "muted" }),
            Err(e) => format!("Failed to toggle mute: {}", e),
        };
    }

    async fn make_default(&mut self) {
        let Some(sink) = self.selected_sink() else { return };

        self.status_message = match sink.make_default().await {
            Ok(()) => format!("{} is now the default output", sink.name()),
            Err(e) => format!("Failed to set default sink: {}", e),
        };
    }

    async fn toggle_power(&mut self) {
        let Some(sink) = self.selected_sink() else { return };
        if !sink.is_bluetooth() {
            self.status_message = "Power control is only supported for Bluetooth outputs".to_string();
            return;
        }

        let result = if sink.state() == PlaybackStatus::Off {
            sink.turn_on().await
        } else {
            sink.turn_off().await
        };
        if let Err(e) = result {
            self.status_message = format!("Bluetooth control failed: {}", e);
        }
    }
}

fn status_style(status: PlaybackStatus) -> Style {
    match status {
        PlaybackStatus::Playing => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        PlaybackStatus::Paused => Style::default().fg(Color::Yellow),
        PlaybackStatus::On => Style::default().fg(Color::Cyan),
        PlaybackStatus::Idle => Style::default().fg(Color::Gray),
        PlaybackStatus::Off => Style::default().fg(Color::DarkGray),
    }
}

fn ui(f: &mut Frame, app: &App) {
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.size());

    let inner_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(outer_chunks[0]);

    render_sinks(f, app, inner_chunks[0]);
    render_details(f, app, inner_chunks[1]);
    render_status(f, app, outer_chunks[1]);
}

fn render_sinks(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Outputs (j/k select, space play/pause, n/p skip, +/- vol, m mute, d default, o power, q quit) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let sinks = app.sinks();
    if sinks.is_empty() {
        let text = Paragraph::new("No outputs reported by the server.")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = sinks
        .iter()
        .map(|sink| {
            let status = sink.state();
            let volume = sink
                .volume()
                .map(|v| format!("{:.0}%", v * 100.0))
                .unwrap_or_else(|| "-".to_string());
            let muted = if sink.is_muted().unwrap_or(false) { " (muted)" } else { "" };
            let default = if sink.is_default() { " *" } else { "" };

            let mut content = vec![Line::from(vec![
                Span::styled(
                    format!("{}{}", sink.name(), default),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw("  "),
                Span::styled(status.to_string(), status_style(status)),
                Span::raw(format!("  {}{}", volume, muted)),
            ])];

            if let Some(track) = sink.track() {
                content.push(Line::from(Span::raw(format!(
                    "    {} - {}",
                    track.artist.as_deref().unwrap_or("Unknown Artist"),
                    track.name.as_deref().unwrap_or("Unknown Title")
                ))));
            }
            content.push(Line::from(""));
            ListItem::new(content)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected_sink_index));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut state);
}

fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Server ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let snapshot = app.coordinator.snapshot();
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Active streams: ", Style::default().fg(Color::Yellow)),
            Span::raw(snapshot.active_stream_count().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Active players: ", Style::default().fg(Color::Yellow)),
            Span::raw(snapshot.active_player_count().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Radio: ", Style::default().fg(Color::Yellow)),
            Span::raw(snapshot.current_radio_station().unwrap_or("-").to_string()),
        ]),
        Line::from(vec![
            Span::styled("Keep-alive: ", Style::default().fg(Color::Yellow)),
            Span::raw(if snapshot.keep_alive.enabled { "enabled" } else { "disabled" }),
        ]),
        Line::from(""),
        Line::from(Span::styled("Sources:", Style::default().fg(Color::Yellow))),
    ];

    for source in KnownSource::ALL {
        let route = match source.route(&snapshot) {
            Some(route) => format!(
                "{} ({:.0}%)",
                route.current_option().unwrap_or("unknown output"),
                route.volume() * 100.0
            ),
            None => "inactive".to_string(),
        };
        lines.push(Line::from(format!("  {}: {}", source, route)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Recently played:", Style::default().fg(Color::Yellow))));
    for entry in app.coordinator.history(10) {
        lines.push(Line::from(format!(
            "  {} {} - {}",
            entry.timestamp.format("%H:%M"),
            entry.artist,
            entry.title
        )));
    }

    if !app.coordinator.last_update_success() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Server unreachable, showing last known state",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let text = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(text, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let text = Paragraph::new(app.status_message.clone())
        .block(block)
        .wrap(Wrap { trim: true });

    f.render_widget(text, area);
}

fn load_config() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let arg = std::env::args()
        .nth(1)
        .ok_or("usage: monitor <host | config.json>")?;
    if arg.ends_with(".json") {
        Ok(ServerConfig::from_json_file(&arg)?)
    } else {
        Ok(ServerConfig::new(arg))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_file = std::fs::File::create("monitor.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let config = load_config()?;
    let coordinator = Coordinator::new(AudioServerClient::new(&config)?, config);
    coordinator.first_refresh().await?;
    coordinator.start().await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(coordinator.clone());
    let res = run_app(&mut terminal, &mut app).await;

    coordinator.stop().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {}", err);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Snapshots refresh in the background, so just redraw periodically
        if !event::poll(std::time::Duration::from_millis(250))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
                KeyCode::Char(' ') => app.toggle_playback().await,
                KeyCode::Char('n') => app.skip(true).await,
                KeyCode::Char('p') => app.skip(false).await,
                KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_volume(VOLUME_STEP).await,
                KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_volume(-VOLUME_STEP).await,
                KeyCode::Char('m') => app.toggle_mute().await,
                KeyCode::Char('d') => app.make_default().await,
                KeyCode::Char('o') => app.toggle_power().await,
                _ => {}
            }
        }
    }
}
