use crate::coordinator::Coordinator;
use crate::error::Result;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Push notification from the server
///
/// Only the event type is read; every notification triggers a full refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEvent {
    #[serde(default, rename = "type", alias = "event")]
    pub event_type: Option<String>,
}

/// Background consumer of the server's push-event WebSocket
///
/// Each notification asks the coordinator for a refresh. When the socket
/// drops, the stream waits a fixed delay and reconnects. Stopping is clean
/// at any point, including during that delay.
///
/// # Example
///
/// ```no_run
/// use linux_audio_server::{AudioServerClient, Coordinator, EventStream, ServerConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::new("192.168.1.20");
///     let coordinator = Coordinator::new(AudioServerClient::new(&config)?, config.clone());
///
///     let mut events = EventStream::new(config.events_url(), Duration::from_secs(5));
///     events.start(&coordinator).await?;
///
///     tokio::time::sleep(Duration::from_secs(60)).await;
///     events.stop().await;
///     Ok(())
/// }
/// ```
pub struct EventStream {
    url: String,
    reconnect_delay: Duration,
    stop_tx: Option<broadcast::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl EventStream {
    /// Create an event stream for a `ws://` URL
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            stop_tx: None,
            task_handle: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the background task is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start consuming events
    ///
    /// If the stream is already running it is stopped and restarted. The task
    /// holds only a weak reference to the coordinator and ends on its own once
    /// the coordinator is dropped.
    pub async fn start(&mut self, coordinator: &Arc<Coordinator>) -> Result<()> {
        self.stop().await;

        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        self.stop_tx = Some(stop_tx);

        let url = self.url.clone();
        let reconnect_delay = self.reconnect_delay;
        let coordinator = Arc::downgrade(coordinator);

        let handle = tokio::spawn(async move {
            loop {
                let outcome = tokio::select! {
                    _ = stop_rx.recv() => None,
                    result = run_event_stream_once(&url, &coordinator) => Some(result),
                };

                let Some(result) = outcome else {
                    tracing::info!("Event stream stopped by user");
                    break;
                };
                match result {
                    Ok(()) => tracing::info!("Event stream closed by server"),
                    Err(e) => tracing::error!("Event stream error: {}", e),
                }

                if coordinator.strong_count() == 0 {
                    tracing::debug!("Coordinator dropped, ending event stream");
                    break;
                }

                tracing::info!("Reconnecting to event stream in {:?}", reconnect_delay);
                let stopped = tokio::select! {
                    _ = stop_rx.recv() => true,
                    _ = sleep(reconnect_delay) => false,
                };
                if stopped {
                    tracing::info!("Event stream stopped by user");
                    break;
                }
            }
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop consuming events
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            // Give it a moment to stop gracefully
            if let Err(e) = tokio::time::timeout(Duration::from_millis(500), handle).await {
                tracing::warn!("Event stream did not stop in time: {}", e);
            }
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// Connect once and forward notifications until the socket closes
async fn run_event_stream_once(url: &str, coordinator: &Weak<Coordinator>) -> Result<()> {
    tracing::info!("Connecting to event stream: {}", url);

    let (ws_stream, _) = connect_async(url).await?;
    let (mut write, mut read) = ws_stream.split();

    tracing::info!("Event stream connected");

    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                tracing::debug!("Event: {}", text);
                if let Ok(event) = serde_json::from_str::<ServerEvent>(&text) {
                    tracing::debug!(
                        "Server event {}",
                        event.event_type.as_deref().unwrap_or("<untyped>")
                    );
                }
                if !trigger_refresh(coordinator).await {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                if !trigger_refresh(coordinator).await {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("Event stream closed");
                return Ok(());
            }
            Err(e) => {
                let _ = write.close().await;
                return Err(e.into());
            }
            _ => {}
        }
    }

    let _ = write.close().await;
    Ok(())
}

/// Request a refresh; false once the coordinator is gone
async fn trigger_refresh(coordinator: &Weak<Coordinator>) -> bool {
    match coordinator.upgrade() {
        Some(coordinator) => {
            coordinator.request_refresh().await;
            true
        }
        None => false,
    }
}
