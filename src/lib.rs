//! Rust library for monitoring and controlling a Linux Audio Server
//!
//! A Linux Audio Server is a headless box that exposes PulseAudio outputs,
//! Mopidy players, Bluetooth speakers, internet radio and text-to-speech
//! over a REST API. This library provides an async API for it. It supports:
//!
//! - Snapshots of the whole server, replaced atomically on every refresh
//! - Per-sink playback status and current track, resolved from live routing,
//!   player assignments, the legacy playback status and the PulseAudio state
//! - Sink volume, mute, default sink and per-sink transport control
//! - Source routing for Airplay, Spotify and TTS streams
//! - Bluetooth connect and disconnect for Bluetooth outputs
//! - Played tracks history
//! - Periodic polling plus the server's push-event WebSocket
//!
//! # Quick Start
//!
//! ```no_run
//! use linux_audio_server::{AudioServerClient, Coordinator, ServerConfig, SnapshotUpdate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("192.168.1.20");
//!     let coordinator = Coordinator::new(AudioServerClient::new(&config)?, config);
//!
//!     // Fails if the server cannot be reached
//!     coordinator.first_refresh().await?;
//!
//!     for sink in coordinator.sinks() {
//!         println!("{}: {}", sink.name(), sink.state());
//!     }
//!
//!     // Keep the snapshot fresh and watch for changes
//!     coordinator.start().await?;
//!     let mut updates = coordinator.subscribe();
//!     while let Ok(update) = updates.recv().await {
//!         if let SnapshotUpdate::Refreshed(snapshot) = update {
//!             println!("{} active stream(s)", snapshot.active_stream_count());
//!         }
//!     }
//!
//!     coordinator.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Resolving without a server
//!
//! The resolver works on any snapshot:
//!
//! ```
//! use linux_audio_server::{resolve_status, PlaybackStatus, Snapshot};
//!
//! let snapshot = Snapshot::new();
//! assert_eq!(resolve_status("kitchen", &snapshot), PlaybackStatus::Off);
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Client**: REST wrappers for every server endpoint
//! - **Coordinator**: Snapshot fetching, publishing, polling and history
//! - **Events**: Push-event WebSocket that triggers refreshes
//! - **Resolver**: Pure per-sink status and track resolution
//! - **Sink / Routing**: High-level views and controls over the current snapshot
//! - **Protocol**: Endpoint paths and JSON envelopes
//! - **Types**: Domain types and data structures

mod client;
mod config;
mod coordinator;
mod error;
mod events;
mod history;
mod protocol;
mod resolver;
mod routing;
mod sink;
mod snapshot;
mod subscription;
mod types;

// Public exports
pub use client::AudioServerClient;
pub use config::{ServerConfig, DEFAULT_PORT};
pub use coordinator::Coordinator;
pub use error::{AudioServerError, Result};
pub use events::{EventStream, ServerEvent};
pub use history::{HistoryEntry, TrackHistory, DEFAULT_HISTORY_CAPACITY};
pub use protocol::{Endpoint, HealthResponse, TransportAction, VolumeResponse};
pub use resolver::{
    active_player_for_sink, player_for_stream, resolve, resolve_status, resolve_track,
    PlaybackStatus, Priority, Resolution,
};
pub use routing::{KnownSource, SourceRoute};
pub use sink::{sink_available, SinkAttributes, SinkPlayer};
pub use snapshot::Snapshot;
pub use subscription::{SnapshotUpdate, UpdateReceiver};
pub use types::{
    bluetooth_address, is_bluetooth_sink, BluetoothDevice, CombinedSink, KeepAliveStatus,
    PlayerId, PlayerInfo, PlayerState, PlayerStatus, RadioStreams, Sink, SinkDriverState,
    SinkInput, SinkName, Track, TtsSettings, VolumeLevel,
};
