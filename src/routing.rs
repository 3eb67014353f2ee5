//! Where an application's audio stream is currently routed

use crate::coordinator::Coordinator;
use crate::error::{AudioServerError, Result};
use crate::snapshot::Snapshot;
use crate::types::{SinkInput, VolumeLevel};
use std::fmt;

/// Applications the server is known to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownSource {
    Airplay,
    Tts,
    Spotify,
}

impl KnownSource {
    pub const ALL: [KnownSource; 3] = [KnownSource::Airplay, KnownSource::Tts, KnownSource::Spotify];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            KnownSource::Airplay => "Airplay",
            KnownSource::Tts => "TTS",
            KnownSource::Spotify => "Spotify",
        }
    }

    /// Fragment of the stream name the application registers with PulseAudio
    pub fn identifier(&self) -> &'static str {
        match self {
            KnownSource::Airplay => "Shairport Sync",
            KnownSource::Tts => "Mopidy Player 1 (TTS)",
            KnownSource::Spotify => "librespot",
        }
    }

    /// Current route of this source, `None` while it isn't playing
    pub fn route(&self, snapshot: &Snapshot) -> Option<SourceRoute> {
        SourceRoute::find(snapshot, self.identifier())
    }
}

impl fmt::Display for KnownSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Route of one active source stream
///
/// Built from a single snapshot and never updated. Controls issue the REST
/// call and ask the coordinator for a refresh; the new route shows up in the
/// next snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRoute {
    identifier: String,
    input: SinkInput,
    current_option: Option<String>,
}

impl SourceRoute {
    /// First stream whose name contains `identifier`
    pub fn find(snapshot: &Snapshot, identifier: &str) -> Option<Self> {
        let input = snapshot
            .sink_inputs
            .iter()
            .find(|input| input.stream_name.contains(identifier))?;

        let current_option = input
            .target_sink
            .as_deref()
            .and_then(|name| snapshot.sink(name))
            .map(|sink| sink.description.clone());

        Some(Self {
            identifier: identifier.to_string(),
            input: input.clone(),
            current_option,
        })
    }

    /// Every output a source can be moved to, as sink descriptions
    pub fn options(snapshot: &Snapshot) -> Vec<String> {
        snapshot.sink_descriptions()
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Description of the sink the stream plays on
    ///
    /// `None` when the stream targets a sink missing from the snapshot.
    pub fn current_option(&self) -> Option<&str> {
        self.current_option.as_deref()
    }

    pub fn stream_name(&self) -> &str {
        &self.input.stream_name
    }

    pub fn stream_index(&self) -> Option<u32> {
        self.input.index
    }

    pub fn volume(&self) -> VolumeLevel {
        self.input.volume
    }

    pub fn muted(&self) -> bool {
        self.input.muted
    }

    /// Move the stream to the sink with description `option`
    pub async fn move_to(&self, coordinator: &Coordinator, option: &str) -> Result<()> {
        let index = self.require_index()?;
        let sink_name = coordinator
            .snapshot()
            .sink_by_description(option)
            .map(|sink| sink.name.clone())
            .ok_or_else(|| AudioServerError::SinkNotFound(option.to_string()))?;

        tracing::info!("Moving {} to {}", self.identifier, option);
        coordinator.client().move_stream(index, &sink_name).await?;
        coordinator.request_refresh().await;
        Ok(())
    }

    pub async fn set_volume(&self, coordinator: &Coordinator, volume: VolumeLevel) -> Result<()> {
        let index = self.require_index()?;

        tracing::info!("Setting {} volume to {:.2}", self.identifier, volume);
        coordinator.client().set_stream_volume(index, volume).await?;
        coordinator.request_refresh().await;
        Ok(())
    }

    pub async fn set_mute(&self, coordinator: &Coordinator, mute: bool) -> Result<()> {
        let index = self.require_index()?;

        coordinator.client().set_stream_mute(index, mute).await?;
        coordinator.request_refresh().await;
        Ok(())
    }

    fn require_index(&self) -> Result<u32> {
        self.input
            .index
            .ok_or_else(|| AudioServerError::SourceInactive(self.identifier.clone()))
    }
}
