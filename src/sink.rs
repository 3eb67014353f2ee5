use crate::coordinator::Coordinator;
use crate::error::{AudioServerError, Result};
use crate::protocol::TransportAction;
use crate::resolver::{self, PlaybackStatus};
use crate::snapshot::Snapshot;
use crate::types::{bluetooth_address, is_bluetooth_sink, SinkDriverState, SinkName, Track, VolumeLevel};
use serde::Serialize;
use std::sync::Arc;

/// Interface for one audio output
///
/// A `SinkPlayer` reads everything from the coordinator's current snapshot,
/// so two calls may observe different snapshots if a refresh lands between
/// them. Use [`Coordinator::snapshot`] with [`resolve`](crate::resolve) when
/// several values must agree.
///
/// Every control sends one REST call and then asks the coordinator to
/// refresh; nothing is updated locally.
#[derive(Clone)]
pub struct SinkPlayer {
    coordinator: Arc<Coordinator>,
    sink_name: SinkName,
    bluetooth_address: Option<String>,
}

/// Extra sink details for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkAttributes {
    pub sink_name: SinkName,
    pub sink_index: Option<u32>,
    pub sink_state: SinkDriverState,
    pub is_default: bool,
}

impl SinkPlayer {
    pub(crate) fn new(coordinator: Arc<Coordinator>, sink_name: impl Into<SinkName>) -> Self {
        let sink_name = sink_name.into();
        let bluetooth_address = bluetooth_address(&sink_name);
        Self {
            coordinator,
            sink_name,
            bluetooth_address,
        }
    }

    /// Get the sink name
    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Get the sink description, falling back to the name once the sink is gone
    pub fn name(&self) -> String {
        self.coordinator
            .snapshot()
            .sink(&self.sink_name)
            .map(|sink| sink.description.clone())
            .unwrap_or_else(|| self.sink_name.clone())
    }

    pub fn is_bluetooth(&self) -> bool {
        is_bluetooth_sink(&self.sink_name)
    }

    /// MAC address for Bluetooth sinks
    pub fn bluetooth_address(&self) -> Option<&str> {
        self.bluetooth_address.as_deref()
    }

    // ========== State ==========

    /// Resolved playback status
    pub fn state(&self) -> PlaybackStatus {
        resolver::resolve_status(&self.sink_name, &self.coordinator.snapshot())
    }

    /// Resolved current track
    pub fn track(&self) -> Option<Track> {
        resolver::resolve_track(&self.sink_name, &self.coordinator.snapshot())
    }

    /// `"music"` while a track is known
    pub fn media_content_type(&self) -> Option<&'static str> {
        self.track().map(|_| "music")
    }

    /// Position in the legacy player's current track, in whole seconds
    pub fn media_position_secs(&self) -> Option<u64> {
        self.coordinator
            .snapshot()
            .legacy_playback
            .time_position_ms
            .map(|ms| ms / 1000)
    }

    pub fn volume(&self) -> Option<VolumeLevel> {
        self.coordinator.snapshot().sink(&self.sink_name).map(|sink| sink.volume)
    }

    pub fn is_muted(&self) -> Option<bool> {
        self.coordinator.snapshot().sink(&self.sink_name).map(|sink| sink.muted)
    }

    /// Description of this sink, shown as the selected source
    pub fn source(&self) -> Option<String> {
        self.coordinator
            .snapshot()
            .sink(&self.sink_name)
            .map(|sink| sink.description.clone())
    }

    /// Descriptions of every sink
    pub fn source_list(&self) -> Vec<String> {
        self.coordinator.snapshot().sink_descriptions()
    }

    /// Empty while the sink is missing
    pub fn attributes(&self) -> Option<SinkAttributes> {
        let snapshot = self.coordinator.snapshot();
        let sink = snapshot.sink(&self.sink_name)?;
        Some(SinkAttributes {
            sink_name: sink.name.clone(),
            sink_index: sink.index,
            sink_state: sink.driver_state.clone(),
            is_default: sink.is_default,
        })
    }

    /// Whether the sink can be shown and controlled
    ///
    /// A paired Bluetooth device stays available while disconnected so that
    /// it can be turned back on. Everything else needs its sink present.
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
            && sink_available(&self.coordinator.snapshot(), &self.sink_name)
    }

    /// Whether this sink is the server's default
    pub fn is_default(&self) -> bool {
        self.coordinator.snapshot().is_default_sink(&self.sink_name)
    }

    // ========== Volume ==========

    /// Set the sink volume, range 0..=1
    pub async fn set_volume(&self, volume: VolumeLevel) -> Result<()> {
        self.coordinator
            .client()
            .set_sink_volume(&self.sink_name, volume)
            .await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    pub async fn set_mute(&self, mute: bool) -> Result<()> {
        self.coordinator.client().set_sink_mute(&self.sink_name, mute).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    // ========== Routing ==========

    /// Make the sink with description `source` the default
    pub async fn select_source(&self, source: &str) -> Result<()> {
        let target = self
            .coordinator
            .snapshot()
            .sink_by_description(source)
            .map(|sink| sink.name.clone());

        let Some(target) = target else {
            tracing::warn!("Source '{}' not found in available sinks", source);
            return Err(AudioServerError::SinkNotFound(source.to_string()));
        };

        self.coordinator.client().set_default_sink(&target).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    /// Make this sink the server's default
    pub async fn make_default(&self) -> Result<()> {
        tracing::info!("Setting {} as default sink", self.sink_name);
        self.coordinator.client().set_default_sink(&self.sink_name).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    // ========== Transport ==========

    pub async fn play(&self) {
        self.transport(TransportAction::Play).await
    }

    pub async fn pause(&self) {
        self.transport(TransportAction::Pause).await
    }

    pub async fn stop(&self) {
        self.transport(TransportAction::Stop).await
    }

    pub async fn next_track(&self) {
        self.transport(TransportAction::Next).await
    }

    pub async fn previous_track(&self) {
        self.transport(TransportAction::Previous).await
    }

    /// Send a transport command to the player behind this sink
    ///
    /// The server answers 404 when no player is assigned yet, so failures
    /// are only logged.
    async fn transport(&self, action: TransportAction) {
        match self
            .coordinator
            .client()
            .sink_transport(&self.sink_name, action)
            .await
        {
            Ok(_) => tracing::debug!("{} command sent to sink {}", action.as_str(), self.sink_name),
            Err(e) => tracing::debug!(
                "{} command failed for sink {}: {}",
                action.as_str(),
                self.sink_name,
                e
            ),
        }
        self.coordinator.request_refresh().await;
    }

    /// Play a URL or player URI (`http(s)://`, `spotify:`, `file://`) on this sink
    ///
    /// The sink becomes the default first.
    pub async fn play_media(&self, media_id: &str) -> Result<()> {
        tracing::info!("Playing media on {}: {}", self.sink_name, media_id);

        let client = self.coordinator.client();
        client.set_default_sink(&self.sink_name).await?;
        client.play_radio_url(media_id, Some(&self.sink_name)).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    // ========== Power ==========

    /// Connect the Bluetooth device behind this sink
    pub async fn turn_on(&self) -> Result<()> {
        let Some(address) = self.bluetooth_address() else {
            tracing::warn!("Turn on is only supported for Bluetooth devices");
            return Ok(());
        };

        tracing::info!("Turning on Bluetooth device {} ({})", self.sink_name, address);
        self.coordinator.client().connect_bluetooth(address).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    /// Disconnect the Bluetooth device behind this sink
    pub async fn turn_off(&self) -> Result<()> {
        let Some(address) = self.bluetooth_address() else {
            tracing::warn!("Turn off is only supported for Bluetooth devices");
            return Ok(());
        };

        tracing::info!("Turning off Bluetooth device {} ({})", self.sink_name, address);
        self.coordinator.client().disconnect_bluetooth(address).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }
}

/// Availability of a sink in one snapshot, ignoring refresh health
pub fn sink_available(snapshot: &Snapshot, sink_name: &str) -> bool {
    let sink_exists = snapshot.sink(sink_name).is_some();

    let Some(address) = bluetooth_address(sink_name) else {
        return sink_exists;
    };

    match snapshot.bluetooth_device(&address) {
        Some(device) => {
            tracing::debug!(
                "Bluetooth device {} found: paired={}, sink_exists={}",
                address,
                device.paired,
                sink_exists
            );
            device.paired
        }
        // Just discovered, not in the device list yet
        None => sink_exists,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BluetoothDevice, Sink};

    const BT_SINK: &str = "bluez_output.00_02_3C_71_8B_55.1";

    fn sink(name: &str) -> Sink {
        Sink {
            name: name.to_string(),
            description: name.to_string(),
            index: Some(1),
            driver_state: SinkDriverState::Idle,
            volume: 0.5,
            muted: false,
            is_default: false,
        }
    }

    fn device(paired: bool) -> BluetoothDevice {
        BluetoothDevice {
            address: "00:02:3C:71:8B:55".to_string(),
            name: Some("Headphones".to_string()),
            paired,
            connected: false,
            trusted: paired,
        }
    }

    #[test]
    fn test_wired_sink_needs_sink() {
        let snapshot = Snapshot::new().with_sinks(vec![sink("kitchen")]);
        assert!(sink_available(&snapshot, "kitchen"));
        assert!(!sink_available(&snapshot, "office"));
    }

    #[test]
    fn test_paired_bluetooth_available_without_sink() {
        let snapshot = Snapshot::new().with_bluetooth_devices(vec![device(true)]);
        assert!(sink_available(&snapshot, BT_SINK));
    }

    #[test]
    fn test_unpaired_bluetooth_unavailable_even_with_sink() {
        let snapshot = Snapshot::new()
            .with_sinks(vec![sink(BT_SINK)])
            .with_bluetooth_devices(vec![device(false)]);
        assert!(!sink_available(&snapshot, BT_SINK));
    }

    #[test]
    fn test_unknown_bluetooth_device_falls_back_to_sink() {
        let with_sink = Snapshot::new().with_sinks(vec![sink(BT_SINK)]);
        assert!(sink_available(&with_sink, BT_SINK));
        assert!(!sink_available(&Snapshot::new(), BT_SINK));
    }
}
