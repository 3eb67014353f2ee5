use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Player identifier (e.g. `"player2"`)
pub type PlayerId = String;

/// Sink name, the unique key of an audio output (e.g. `"alsa_output.pci-0000_00_1f.3.analog-stereo"`)
pub type SinkName = String;

/// Volume level in the range 0.0..=1.0
pub type VolumeLevel = f64;

/// Radio stream catalogue, station name to stream URL
pub type RadioStreams = BTreeMap<String, String>;

/// PulseAudio driver state of a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SinkDriverState {
    /// A stream is attached and the sink is running
    Running,
    /// Opened but nothing is playing
    #[default]
    Idle,
    /// Closed by the suspend-on-idle module
    Suspended,
    /// Anything the server reports that we don't know about
    Other(String),
}

impl From<String> for SinkDriverState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "RUNNING" => SinkDriverState::Running,
            "IDLE" => SinkDriverState::Idle,
            "SUSPENDED" => SinkDriverState::Suspended,
            _ => SinkDriverState::Other(value),
        }
    }
}

impl From<SinkDriverState> for String {
    fn from(value: SinkDriverState) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SinkDriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkDriverState::Running => f.write_str("RUNNING"),
            SinkDriverState::Idle => f.write_str("IDLE"),
            SinkDriverState::Suspended => f.write_str("SUSPENDED"),
            SinkDriverState::Other(s) => f.write_str(s),
        }
    }
}

/// Audio output device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    pub name: SinkName,

    /// Human readable name, used as the "source" label in UIs
    pub description: String,

    #[serde(default)]
    pub index: Option<u32>,

    #[serde(default, rename = "state", deserialize_with = "null_as_default")]
    pub driver_state: SinkDriverState,

    #[serde(default, deserialize_with = "null_as_default")]
    pub volume: VolumeLevel,

    #[serde(default, deserialize_with = "null_as_default")]
    pub muted: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_default: bool,
}

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Sink {
    /// Whether this sink is a Bluetooth output (`bluez_output.XX_XX_XX_XX_XX_XX.N`)
    pub fn is_bluetooth(&self) -> bool {
        is_bluetooth_sink(&self.name)
    }
}

const BLUETOOTH_SINK_PREFIX: &str = "bluez_output.";

/// Whether a sink name belongs to a Bluetooth output
pub fn is_bluetooth_sink(sink_name: &str) -> bool {
    sink_name.starts_with(BLUETOOTH_SINK_PREFIX)
}

/// Extract the MAC address from a Bluetooth sink name
///
/// `bluez_output.00_02_3C_71_8B_55.1` becomes `00:02:3C:71:8B:55`.
pub fn bluetooth_address(sink_name: &str) -> Option<String> {
    if !is_bluetooth_sink(sink_name) {
        return None;
    }
    sink_name
        .split('.')
        .nth(1)
        .filter(|part| !part.is_empty())
        .map(|part| part.replace('_', ":"))
}

/// Active audio stream routed to a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkInput {
    #[serde(default)]
    pub index: Option<u32>,

    /// Application stream name, e.g. `"Mopidy Player 2@unix:/run/pulse/native"`
    #[serde(default, rename = "name")]
    pub stream_name: String,

    /// Sink the stream is currently routed to
    #[serde(default, rename = "sink")]
    pub target_sink: Option<SinkName>,

    #[serde(default)]
    pub sink_description: Option<String>,

    #[serde(default)]
    pub volume: VolumeLevel,

    #[serde(default)]
    pub muted: bool,
}

/// Playback state reported by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Playing,
    Paused,
    Stopped,
    /// Any state string we don't recognize
    #[serde(other)]
    Unknown,
}

/// Track metadata, every field is optional
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,

    /// Track length in milliseconds
    #[serde(default, alias = "length")]
    pub duration_ms: Option<u64>,
}

impl Track {
    /// Track with only a title
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Identity used for history deduplication
    ///
    /// The URI when present, otherwise `artist|name`. Returns `None` when
    /// the track carries nothing to identify it by.
    pub fn identity(&self) -> Option<String> {
        if let Some(uri) = self.uri.as_deref().filter(|u| !u.is_empty()) {
            return Some(uri.to_string());
        }
        let artist = self.artist.as_deref().unwrap_or("");
        let name = self.name.as_deref().unwrap_or("");
        if artist.is_empty() && name.is_empty() {
            return None;
        }
        Some(format!("{}|{}", artist, name))
    }
}

/// Playback status of one player
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub state: Option<PlayerState>,

    #[serde(default, alias = "track")]
    pub current_track: Option<Track>,

    /// Position in the current track in milliseconds
    #[serde(default, alias = "time_position")]
    pub time_position_ms: Option<u64>,
}

/// Player registry entry as reported by the players endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub active: bool,

    /// Free-form status string from the server
    #[serde(default)]
    pub status: Option<String>,

    #[serde(flatten)]
    pub playback: PlayerStatus,
}

/// Bluetooth device known to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BluetoothDevice {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub paired: bool,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub trusted: bool,
}

/// Bluetooth keep-alive configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepAliveStatus {
    #[serde(default)]
    pub enabled: bool,

    /// Interval between keep-alive tones in seconds
    #[serde(default = "default_keep_alive_interval")]
    pub interval: u64,

    #[serde(default)]
    pub enabled_sinks: Vec<SinkName>,
}

fn default_keep_alive_interval() -> u64 {
    240
}

impl Default for KeepAliveStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_keep_alive_interval(),
            enabled_sinks: Vec::new(),
        }
    }
}

/// Combined sink or stereo pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSink {
    pub name: SinkName,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slaves: Vec<SinkName>,
}

/// Text-to-speech settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_tts_language")]
    pub language: String,
    #[serde(default)]
    pub volume: Option<VolumeLevel>,
    #[serde(default)]
    pub sink: Option<SinkName>,
}

fn default_tts_language() -> String {
    "en".to_string()
}
