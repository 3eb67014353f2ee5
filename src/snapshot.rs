//! Immutable point-in-time view of the audio server

use crate::types::{
    BluetoothDevice, KeepAliveStatus, PlayerId, PlayerInfo, PlayerStatus, RadioStreams, Sink,
    SinkInput, SinkName,
};
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, HashSet};

/// A snapshot of the remote system, replaced wholesale on every refresh
///
/// Nothing in the crate mutates a snapshot after it has been published; the
/// coordinator hands out `Arc<Snapshot>` and readers work on that single value.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Audio outputs, unique by name
    pub sinks: Vec<Sink>,

    /// Active streams in the order the server reported them
    pub sink_inputs: Vec<SinkInput>,

    /// Per-player playback status
    pub players: BTreeMap<PlayerId, PlayerStatus>,

    /// Administrative sink to player assignment, may be stale
    pub assignments: BTreeMap<SinkName, PlayerId>,

    /// Global single-player status used as last resort
    pub legacy_playback: PlayerStatus,

    /// Name of the server's default sink
    pub default_sink: Option<SinkName>,

    /// Player registry (name, active flag, status string)
    pub player_registry: Vec<PlayerInfo>,

    pub bluetooth_devices: Vec<BluetoothDevice>,

    pub radio_streams: RadioStreams,

    pub keep_alive: KeepAliveStatus,

    /// When the snapshot was fetched
    pub fetched_at: DateTime<Local>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            sinks: Vec::new(),
            sink_inputs: Vec::new(),
            players: BTreeMap::new(),
            assignments: BTreeMap::new(),
            legacy_playback: PlayerStatus::default(),
            default_sink: None,
            player_registry: Vec::new(),
            bluetooth_devices: Vec::new(),
            radio_streams: RadioStreams::new(),
            keep_alive: KeepAliveStatus::default(),
            fetched_at: Local::now(),
        }
    }
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sinks, dropping later duplicates of an already seen name
    pub fn with_sinks(mut self, sinks: Vec<Sink>) -> Self {
        let mut seen = HashSet::new();
        self.sinks = sinks
            .into_iter()
            .filter(|sink| {
                let fresh = seen.insert(sink.name.clone());
                if !fresh {
                    tracing::warn!("Dropping duplicate sink '{}' from snapshot", sink.name);
                }
                fresh
            })
            .collect();
        self
    }

    pub fn with_sink_inputs(mut self, sink_inputs: Vec<SinkInput>) -> Self {
        self.sink_inputs = sink_inputs;
        self
    }

    /// Set the player registry; per-player status is derived from it
    pub fn with_player_registry(mut self, registry: Vec<PlayerInfo>) -> Self {
        self.players = registry
            .iter()
            .map(|player| (player.id.clone(), player.playback.clone()))
            .collect();
        self.player_registry = registry;
        self
    }

    pub fn with_player(mut self, id: impl Into<PlayerId>, status: PlayerStatus) -> Self {
        self.players.insert(id.into(), status);
        self
    }

    pub fn with_assignments(mut self, assignments: BTreeMap<SinkName, PlayerId>) -> Self {
        self.assignments = assignments;
        self
    }

    pub fn with_assignment(mut self, sink: impl Into<SinkName>, player: impl Into<PlayerId>) -> Self {
        self.assignments.insert(sink.into(), player.into());
        self
    }

    pub fn with_legacy_playback(mut self, playback: PlayerStatus) -> Self {
        self.legacy_playback = playback;
        self
    }

    pub fn with_default_sink(mut self, default_sink: Option<SinkName>) -> Self {
        self.default_sink = default_sink;
        self
    }

    pub fn with_bluetooth_devices(mut self, devices: Vec<BluetoothDevice>) -> Self {
        self.bluetooth_devices = devices;
        self
    }

    pub fn with_radio_streams(mut self, streams: RadioStreams) -> Self {
        self.radio_streams = streams;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAliveStatus) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Get a sink by name
    pub fn sink(&self, name: &str) -> Option<&Sink> {
        self.sinks.iter().find(|s| s.name == name)
    }

    /// Get a sink by its description
    pub fn sink_by_description(&self, description: &str) -> Option<&Sink> {
        self.sinks.iter().find(|s| s.description == description)
    }

    /// Get the status of a player
    pub fn player(&self, id: &str) -> Option<&PlayerStatus> {
        self.players.get(id)
    }

    /// Get the player nominally assigned to a sink
    pub fn assigned_player(&self, sink_name: &str) -> Option<&PlayerId> {
        self.assignments.get(sink_name)
    }

    /// Streams currently routed to a sink
    pub fn inputs_for_sink<'a>(&'a self, sink_name: &'a str) -> impl Iterator<Item = &'a SinkInput> + 'a {
        self.sink_inputs
            .iter()
            .filter(move |input| input.target_sink.as_deref() == Some(sink_name))
    }

    /// Get a Bluetooth device by address
    pub fn bluetooth_device(&self, address: &str) -> Option<&BluetoothDevice> {
        self.bluetooth_devices.iter().find(|d| d.address == address)
    }

    /// Whether a sink is the server's default
    pub fn is_default_sink(&self, sink_name: &str) -> bool {
        self.default_sink.as_deref() == Some(sink_name)
    }

    /// Descriptions of all sinks, in server order
    pub fn sink_descriptions(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.description.clone()).collect()
    }

    /// Number of active streams
    pub fn active_stream_count(&self) -> usize {
        self.sink_inputs.len()
    }

    /// Number of players the server reports as active
    pub fn active_player_count(&self) -> usize {
        self.player_registry.iter().filter(|p| p.active).count()
    }

    /// Radio station currently playing, if the legacy track is a known station
    pub fn current_radio_station(&self) -> Option<&str> {
        let title = self
            .legacy_playback
            .current_track
            .as_ref()
            .and_then(|t| t.name.as_deref())?;
        self.radio_streams
            .get_key_value(title)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SinkDriverState, Track};

    fn sink(name: &str, description: &str) -> Sink {
        Sink {
            name: name.to_string(),
            description: description.to_string(),
            index: None,
            driver_state: SinkDriverState::Idle,
            volume: 0.5,
            muted: false,
            is_default: false,
        }
    }

    #[test]
    fn test_duplicate_sinks_dropped() {
        let snapshot = Snapshot::new().with_sinks(vec![
            sink("kitchen", "Kitchen"),
            sink("kitchen", "Kitchen (dup)"),
            sink("office", "Office"),
        ]);
        assert_eq!(snapshot.sinks.len(), 2);
        assert_eq!(snapshot.sink("kitchen").unwrap().description, "Kitchen");
    }

    #[test]
    fn test_lookups() {
        let snapshot = Snapshot::new()
            .with_sinks(vec![sink("kitchen", "Kitchen"), sink("office", "Office")])
            .with_default_sink(Some("office".to_string()))
            .with_assignment("kitchen", "player1");

        assert_eq!(snapshot.sink_by_description("Office").unwrap().name, "office");
        assert!(snapshot.is_default_sink("office"));
        assert!(!snapshot.is_default_sink("kitchen"));
        assert_eq!(snapshot.assigned_player("kitchen").map(String::as_str), Some("player1"));
        assert!(snapshot.sink("garage").is_none());
        assert_eq!(snapshot.sink_descriptions(), vec!["Kitchen", "Office"]);
    }

    #[test]
    fn test_current_radio_station() {
        let mut streams = RadioStreams::new();
        streams.insert("FIP".to_string(), "http://icecast.radiofrance.fr/fip-hifi.aac".to_string());

        let snapshot = Snapshot::new()
            .with_radio_streams(streams.clone())
            .with_legacy_playback(PlayerStatus {
                current_track: Some(Track::with_name("FIP")),
                ..Default::default()
            });
        assert_eq!(snapshot.current_radio_station(), Some("FIP"));

        let snapshot = Snapshot::new()
            .with_radio_streams(streams)
            .with_legacy_playback(PlayerStatus {
                current_track: Some(Track::with_name("So What")),
                ..Default::default()
            });
        assert_eq!(snapshot.current_radio_station(), None);
    }
}
