use crate::types::{
    BluetoothDevice, CombinedSink, PlayerId, PlayerInfo, PlayerStatus, RadioStreams, Sink,
    SinkInput, SinkName, VolumeLevel,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// API endpoints
///
/// Variants carrying names are percent-encoded as single path segments when
/// the URL is built, so sink names containing `/` or spaces stay intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Sinks,
    DefaultSink,
    Volume,
    SinkVolume(SinkName),
    SinkMute(SinkName),
    SinkInputs,
    StreamVolume(u32),
    StreamMute(u32),
    MoveStream,
    MoveAllStreams,
    CombinedSinks,
    CombinedSink,
    DeleteCombinedSink(SinkName),
    StereoPair,
    BluetoothDevices,
    BluetoothScan,
    BluetoothPair,
    BluetoothConnect,
    BluetoothDisconnect,
    BluetoothConnectAndSetDefault,
    KeepAlive,
    KeepAliveStart,
    KeepAliveStop,
    KeepAliveInterval,
    KeepAliveEnableSink,
    KeepAliveDisableSink,
    PlaybackStatus,
    Playback(TransportAction),
    SinkPlayback(SinkName, TransportAction),
    PauseAll,
    StopAll,
    Players,
    PlayerAssignments,
    AssignPlayer,
    RadioStreams,
    RadioStream,
    NamedRadioStream(String),
    RadioPlay,
    RadioPlayUrl,
    TtsSpeak,
    TtsSettings,
    Events,
}

/// Transport controls of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
}

impl TransportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportAction::Play => "play",
            TransportAction::Pause => "pause",
            TransportAction::Stop => "stop",
            TransportAction::Next => "next",
            TransportAction::Previous => "previous",
        }
    }
}

impl Endpoint {
    /// Path segments below the server root
    pub fn segments(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            Endpoint::Health => &["api", "health"],
            Endpoint::Sinks => &["api", "audio", "sinks"],
            Endpoint::DefaultSink => &["api", "audio", "sink", "default"],
            Endpoint::Volume => &["api", "audio", "volume"],
            Endpoint::SinkVolume(sink) => return owned(&["api", "audio", "sink", sink.as_str(), "volume"]),
            Endpoint::SinkMute(sink) => return owned(&["api", "audio", "sink", sink.as_str(), "mute"]),
            Endpoint::SinkInputs => &["api", "audio", "sink-inputs"],
            Endpoint::StreamVolume(index) => {
                return owned(&["api", "audio", "sink-input", index.to_string().as_str(), "volume"])
            }
            Endpoint::StreamMute(index) => {
                return owned(&["api", "audio", "sink-input", index.to_string().as_str(), "mute"])
            }
            Endpoint::MoveStream => &["api", "audio", "sink-input", "move"],
            Endpoint::MoveAllStreams => &["api", "audio", "sink-inputs", "move-all"],
            Endpoint::CombinedSinks => &["api", "audio", "combined-sinks"],
            Endpoint::CombinedSink => &["api", "audio", "combined-sink"],
            Endpoint::DeleteCombinedSink(sink) => return owned(&["api", "audio", "combined-sink", sink.as_str()]),
            Endpoint::StereoPair => &["api", "audio", "stereo-pair"],
            Endpoint::BluetoothDevices => &["api", "bluetooth", "devices"],
            Endpoint::BluetoothScan => &["api", "bluetooth", "scan"],
            Endpoint::BluetoothPair => &["api", "bluetooth", "pair"],
            Endpoint::BluetoothConnect => &["api", "bluetooth", "connect"],
            Endpoint::BluetoothDisconnect => &["api", "bluetooth", "disconnect"],
            Endpoint::BluetoothConnectAndSetDefault => &["api", "bluetooth", "connect-and-set-default"],
            Endpoint::KeepAlive => &["api", "bluetooth", "keep-alive"],
            Endpoint::KeepAliveStart => &["api", "bluetooth", "keep-alive", "start"],
            Endpoint::KeepAliveStop => &["api", "bluetooth", "keep-alive", "stop"],
            Endpoint::KeepAliveInterval => &["api", "bluetooth", "keep-alive", "interval"],
            Endpoint::KeepAliveEnableSink => &["api", "bluetooth", "keep-alive", "enable-sink"],
            Endpoint::KeepAliveDisableSink => &["api", "bluetooth", "keep-alive", "disable-sink"],
            Endpoint::PlaybackStatus => &["api", "playback", "status"],
            Endpoint::Playback(action) => return owned(&["api", "playback", action.as_str()]),
            Endpoint::SinkPlayback(sink, action) => {
                return owned(&["api", "playback", "sink", sink.as_str(), action.as_str()])
            }
            Endpoint::PauseAll => &["api", "playback", "pause-all"],
            Endpoint::StopAll => &["api", "playback", "stop-all"],
            Endpoint::Players => &["api", "mopidy", "players"],
            Endpoint::PlayerAssignments => &["api", "mopidy", "assignments"],
            Endpoint::AssignPlayer => &["api", "mopidy", "assign"],
            Endpoint::RadioStreams => &["api", "radio", "streams"],
            Endpoint::RadioStream => &["api", "radio", "stream"],
            Endpoint::NamedRadioStream(name) => return owned(&["api", "radio", "stream", name.as_str()]),
            Endpoint::RadioPlay => &["api", "radio", "play"],
            Endpoint::RadioPlayUrl => &["api", "radio", "play_url"],
            Endpoint::TtsSpeak => &["api", "tts", "speak"],
            Endpoint::TtsSettings => &["api", "tts", "settings"],
            Endpoint::Events => &["ws"],
        };
        owned(fixed)
    }
}

fn owned(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Error body returned by the server on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, alias = "error", alias = "message")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinksResponse {
    #[serde(default)]
    pub sinks: Vec<Sink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkInputsResponse {
    #[serde(default)]
    pub sink_inputs: Vec<SinkInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSinkResponse {
    #[serde(default)]
    pub default_sink: Option<SinkName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeResponse {
    #[serde(default)]
    pub volume: Option<VolumeLevel>,
    #[serde(default)]
    pub muted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedSinksResponse {
    #[serde(default)]
    pub combined_sinks: Vec<CombinedSink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveAllResponse {
    #[serde(default)]
    pub moved_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothDevicesResponse {
    #[serde(default)]
    pub devices: Vec<BluetoothDevice>,
}

/// Playback status of the global (legacy) player
pub type PlaybackStatusResponse = PlayerStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayersResponse {
    #[serde(default)]
    pub players: Vec<PlayerInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentsResponse {
    #[serde(default)]
    pub assignments: BTreeMap<SinkName, PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioStreamsResponse {
    #[serde(default)]
    pub streams: RadioStreams,
}
