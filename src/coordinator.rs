use crate::client::AudioServerClient;
use crate::config::ServerConfig;
use crate::error::{AudioServerError, Result};
use crate::events::EventStream;
use crate::history::{HistoryEntry, TrackHistory};
use crate::resolver::{self, PlaybackStatus, Resolution};
use crate::sink::SinkPlayer;
use crate::snapshot::Snapshot;
use crate::subscription::{SnapshotUpdate, UpdateReceiver};
use crate::types::Track;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Fetches snapshots from the server and publishes them
///
/// The coordinator owns the only writable reference to the current snapshot.
/// A refresh builds a complete new [`Snapshot`] and swaps it in with one
/// atomic publish, so readers always see a whole snapshot, old or new.
///
/// Sinks, sink-inputs, the default sink and the playback status are core
/// subsystems: if any of them fails, the refresh fails and the previous
/// snapshot stays current. Players, assignments, Bluetooth devices, radio
/// streams and keep-alive are optional and fall back to empty values.
///
/// # Example
///
/// ```no_run
/// use linux_audio_server::{AudioServerClient, Coordinator, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::new("192.168.1.20");
///     let coordinator = Coordinator::new(AudioServerClient::new(&config)?, config);
///     coordinator.first_refresh().await?;
///
///     for sink in coordinator.snapshot().sinks.iter() {
///         println!("{}: {}", sink.description, coordinator.status(&sink.name));
///     }
///
///     coordinator.start().await?;
///     Ok(())
/// }
/// ```
pub struct Coordinator {
    client: AudioServerClient,
    config: ServerConfig,
    current: watch::Sender<Arc<Snapshot>>,
    update_tx: broadcast::Sender<SnapshotUpdate>,
    last_update_success: AtomicBool,
    last_error: Mutex<Option<String>>,
    /// Serializes fetches; held for the whole of one refresh
    refresh_lock: tokio::sync::Mutex<()>,
    /// Count of completed refreshes, used to coalesce waiting callers
    generation: AtomicU64,
    history: Mutex<TrackHistory>,
    poll_stop_tx: Mutex<Option<broadcast::Sender<()>>>,
    poll_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    events: tokio::sync::Mutex<Option<EventStream>>,
}

impl Coordinator {
    /// Create a coordinator; no data is fetched until the first refresh
    pub fn new(client: AudioServerClient, config: ServerConfig) -> Arc<Self> {
        let (current, _) = watch::channel(Arc::new(Snapshot::default()));
        let (update_tx, _) = broadcast::channel(16);
        let history = TrackHistory::with_capacity(config.history_capacity);

        Arc::new(Self {
            client,
            config,
            current,
            update_tx,
            last_update_success: AtomicBool::new(false),
            last_error: Mutex::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            history: Mutex::new(history),
            poll_stop_tx: Mutex::new(None),
            poll_handle: Mutex::new(None),
            events: tokio::sync::Mutex::new(None),
        })
    }

    /// The API client, for control calls
    pub fn client(&self) -> &AudioServerClient {
        &self.client
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// A receiver that always holds the latest snapshot
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    /// Subscribe to refresh outcomes
    pub fn subscribe(&self) -> UpdateReceiver {
        UpdateReceiver::new(self.update_tx.subscribe())
    }

    /// Whether the most recent refresh succeeded
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Fetch and publish a new snapshot
    ///
    /// If another refresh is already in flight, this waits for it and
    /// reports its outcome instead of fetching again.
    pub async fn refresh(&self) -> Result<()> {
        let observed = self.generation.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;

        if self.generation.load(Ordering::SeqCst) != observed {
            tracing::debug!("Refresh coalesced with one already in flight");
            return self.last_outcome();
        }

        let result = self.fetch_snapshot().await;
        self.generation.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(snapshot) => {
                self.publish(snapshot);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Error fetching Linux Audio Server data: {}", message);
                self.last_update_success.store(false, Ordering::SeqCst);
                *lock(&self.last_error) = Some(message.clone());
                let _ = self.update_tx.send(SnapshotUpdate::Failed(message));
                Err(e)
            }
        }
    }

    /// Initial refresh; fails if the server cannot be reached
    pub async fn first_refresh(&self) -> Result<()> {
        self.refresh().await?;
        let snapshot = self.snapshot();
        tracing::info!(
            "Connected to Linux Audio Server at {}: {} sink(s), {} stream(s)",
            self.config.base_url(),
            snapshot.sinks.len(),
            snapshot.sink_inputs.len()
        );
        Ok(())
    }

    /// Refresh after a control action or push event
    ///
    /// Failures are logged and surface through [`last_update_success`](Self::last_update_success).
    pub async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!("Requested refresh failed: {}", e);
        }
    }

    fn last_outcome(&self) -> Result<()> {
        if self.last_update_success() {
            Ok(())
        } else {
            let message = lock(&self.last_error)
                .clone()
                .unwrap_or_else(|| "no successful refresh yet".to_string());
            Err(AudioServerError::UpdateFailed(message))
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        lock(&self.history).observe(&snapshot);

        let snapshot = Arc::new(snapshot);
        self.current.send_replace(snapshot.clone());
        self.last_update_success.store(true, Ordering::SeqCst);
        *lock(&self.last_error) = None;
        let _ = self.update_tx.send(SnapshotUpdate::Refreshed(snapshot));
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let client = &self.client;

        let (sinks, sink_inputs, default_sink, playback) = tokio::try_join!(
            client.sinks(),
            client.sink_inputs(),
            client.default_sink(),
            client.playback_status(),
        )
        .map_err(|e| AudioServerError::UpdateFailed(format!("Error communicating with API: {}", e)))?;

        let (players, assignments, bluetooth_devices, radio_streams, keep_alive) = tokio::join!(
            client.players(),
            client.player_assignments(),
            client.bluetooth_devices(),
            client.radio_streams(),
            client.keep_alive(),
        );

        Ok(Snapshot::new()
            .with_sinks(sinks)
            .with_sink_inputs(sink_inputs)
            .with_default_sink(default_sink)
            .with_legacy_playback(playback)
            .with_player_registry(or_default("players", players))
            .with_assignments(or_default("player assignments", assignments))
            .with_bluetooth_devices(or_default("Bluetooth devices", bluetooth_devices))
            .with_radio_streams(or_default("radio streams", radio_streams))
            .with_keep_alive(or_default("keep-alive", keep_alive)))
    }

    // ========== Resolution ==========

    /// Playback status of a sink in the current snapshot
    pub fn status(&self, sink_name: &str) -> PlaybackStatus {
        resolver::resolve_status(sink_name, &self.snapshot())
    }

    /// Current track of a sink in the current snapshot
    pub fn track(&self, sink_name: &str) -> Option<Track> {
        resolver::resolve_track(sink_name, &self.snapshot())
    }

    /// Full resolution of a sink in the current snapshot
    pub fn resolve(&self, sink_name: &str) -> Resolution {
        resolver::resolve(sink_name, &self.snapshot())
    }

    /// Handle for one sink
    pub fn sink(self: &Arc<Self>, sink_name: impl Into<String>) -> SinkPlayer {
        SinkPlayer::new(self.clone(), sink_name)
    }

    /// Handles for every sink in the current snapshot
    pub fn sinks(self: &Arc<Self>) -> Vec<SinkPlayer> {
        self.snapshot()
            .sinks
            .iter()
            .map(|sink| self.sink(sink.name.clone()))
            .collect()
    }

    // ========== History ==========

    /// The `n` most recently played tracks, newest first
    pub fn history(&self, n: usize) -> Vec<HistoryEntry> {
        lock(&self.history).recent(n)
    }

    /// `"artist - title"` of the most recently played track
    pub fn history_summary(&self) -> String {
        lock(&self.history).summary()
    }

    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    // ========== Background tasks ==========

    /// Start periodic polling, and the event stream if enabled
    ///
    /// Restarts anything already running.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.stop().await;

        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        *lock(&self.poll_stop_tx) = Some(stop_tx);

        let period = self.config.scan_interval();
        let coordinator = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let stopped = tokio::select! {
                    _ = stop_rx.recv() => true,
                    _ = ticker.tick() => false,
                };
                if stopped {
                    tracing::info!("Polling stopped");
                    break;
                }

                let Some(coordinator) = coordinator.upgrade() else {
                    break;
                };
                coordinator.request_refresh().await;
            }
        });
        *lock(&self.poll_handle) = Some(handle);
        tracing::info!("Polling every {:?}", period);

        if self.config.enable_events {
            let mut events =
                EventStream::new(self.config.events_url(), self.config.event_reconnect_delay());
            events.start(self).await?;
            *self.events.lock().await = Some(events);
        }

        Ok(())
    }

    /// Stop polling and the event stream
    pub async fn stop(&self) {
        if let Some(tx) = lock(&self.poll_stop_tx).take() {
            let _ = tx.send(());
        }
        let handle = lock(&self.poll_handle).take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(Duration::from_millis(500), handle).await;
        }

        if let Some(mut events) = self.events.lock().await.take() {
            events.stop().await;
        }
    }

    /// Whether periodic polling is running
    pub fn is_polling(&self) -> bool {
        lock(&self.poll_handle)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.poll_handle).take() {
            handle.abort();
        }
    }
}

fn or_default<T: Default>(subsystem: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Could not fetch {}, using empty defaults: {}", subsystem, e);
            T::default()
        }
    }
}

/// Lock a std mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
