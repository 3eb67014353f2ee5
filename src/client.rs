use crate::config::ServerConfig;
use crate::error::{AudioServerError, Result};
use crate::protocol::{
    ApiErrorBody, AssignmentsResponse, BluetoothDevicesResponse, CombinedSinksResponse,
    DefaultSinkResponse, Endpoint, HealthResponse, Method, MoveAllResponse, PlaybackStatusResponse,
    PlayersResponse, RadioStreamsResponse, SinkInputsResponse, SinksResponse, TransportAction,
    VolumeResponse,
};
use crate::types::{
    BluetoothDevice, CombinedSink, KeepAliveStatus, PlayerId, PlayerInfo, PlayerStatus,
    RadioStreams, Sink, SinkInput, SinkName, TtsSettings, VolumeLevel,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the Linux Audio Server REST API
///
/// Every method is a thin wrapper around one endpoint. Control methods
/// return the server's acknowledgement body as raw JSON.
///
/// # Example
///
/// ```no_run
/// use linux_audio_server::{AudioServerClient, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = AudioServerClient::new(&ServerConfig::new("192.168.1.20"))?;
///     for sink in client.sinks().await? {
///         println!("{} ({})", sink.description, sink.driver_state);
///     }
///     client.set_sink_volume("speaker_kitchen", 0.4).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AudioServerClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl AudioServerClient {
    /// Create a client for the server described by `config`
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self::with_base_url(config.base_url())?.with_timeout(config.request_timeout()))
    }

    /// Create a client for a server root URL such as `http://192.168.1.20:6681`
    pub fn with_base_url(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| AudioServerError::InvalidResponse(format!("Invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AudioServerError::InvalidResponse(format!(
                "Invalid base URL: {}",
                base_url
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// The server root URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of an endpoint
    pub fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(endpoint.segments());
        }
        url
    }

    /// Send a request and decode the JSON response
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<Value>,
    ) -> Result<T> {
        let url = self.url(&endpoint);
        tracing::debug!("{:?} {}", method, url);

        let mut request = self.http.request(method.into(), url.clone());
        if let Some(body) = &body {
            tracing::debug!("Sending: {}", body);
            request = request.json(body);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, AudioServerError>((status, bytes))
        };

        let (status, bytes) = match timeout(self.request_timeout, exchange).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!("Error communicating with {}: {}", url, e);
                e
            })?,
            Err(_) => {
                tracing::error!("Timeout connecting to {}", url);
                return Err(AudioServerError::Timeout(url.to_string()));
            }
        };

        if !status.is_success() {
            let detail = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(AudioServerError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| {
            tracing::error!("Invalid JSON response from {}: {}", url, e);
            AudioServerError::InvalidResponse(format!("Invalid JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        self.request(Method::Get, endpoint, None).await
    }

    async fn post(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
        self.request(Method::Post, endpoint, Some(body)).await
    }

    async fn post_empty(&self, endpoint: Endpoint) -> Result<Value> {
        self.request(Method::Post, endpoint, None).await
    }

    async fn delete(&self, endpoint: Endpoint) -> Result<Value> {
        self.request(Method::Delete, endpoint, None).await
    }

    // ========== Health ==========

    /// Check the health of the server
    pub async fn health_check(&self) -> Result<HealthResponse> {
        self.get(Endpoint::Health).await
    }

    // ========== Sinks ==========

    /// Get all audio sinks
    pub async fn sinks(&self) -> Result<Vec<Sink>> {
        let response: SinksResponse = self.get(Endpoint::Sinks).await?;
        Ok(response.sinks)
    }

    /// Get the name of the default sink
    pub async fn default_sink(&self) -> Result<Option<SinkName>> {
        let response: DefaultSinkResponse = self.get(Endpoint::DefaultSink).await?;
        Ok(response.default_sink)
    }

    /// Set the default sink
    pub async fn set_default_sink(&self, sink_name: &str) -> Result<Value> {
        self.post(Endpoint::DefaultSink, json!({ "sink_name": sink_name })).await
    }

    /// Get the system volume
    pub async fn volume(&self) -> Result<VolumeResponse> {
        self.get(Endpoint::Volume).await
    }

    /// Set the system volume (0.0 to 1.0)
    pub async fn set_volume(&self, volume: VolumeLevel) -> Result<Value> {
        self.post(Endpoint::Volume, json!({ "volume": volume.clamp(0.0, 1.0) })).await
    }

    /// Get the volume of a sink
    pub async fn sink_volume(&self, sink_name: &str) -> Result<VolumeResponse> {
        self.get(Endpoint::SinkVolume(sink_name.to_string())).await
    }

    /// Set the volume of a sink (0.0 to 1.0)
    pub async fn set_sink_volume(&self, sink_name: &str, volume: VolumeLevel) -> Result<Value> {
        self.post(
            Endpoint::SinkVolume(sink_name.to_string()),
            json!({ "volume": volume.clamp(0.0, 1.0) }),
        )
        .await
    }

    /// Mute or unmute a sink
    pub async fn set_sink_mute(&self, sink_name: &str, mute: bool) -> Result<Value> {
        self.post(Endpoint::SinkMute(sink_name.to_string()), json!({ "mute": mute }))
            .await
    }

    // ========== Streams ==========

    /// Get all active audio streams
    pub async fn sink_inputs(&self) -> Result<Vec<SinkInput>> {
        let response: SinkInputsResponse = self.get(Endpoint::SinkInputs).await?;
        Ok(response.sink_inputs)
    }

    /// Set the volume of a stream
    pub async fn set_stream_volume(&self, input_index: u32, volume: VolumeLevel) -> Result<Value> {
        self.post(
            Endpoint::StreamVolume(input_index),
            json!({ "volume": volume.clamp(0.0, 1.0) }),
        )
        .await
    }

    /// Mute or unmute a stream
    pub async fn set_stream_mute(&self, input_index: u32, mute: bool) -> Result<Value> {
        self.post(Endpoint::StreamMute(input_index), json!({ "mute": mute }))
            .await
    }

    /// Move a stream to a different sink
    pub async fn move_stream(&self, input_index: u32, sink_name: &str) -> Result<Value> {
        self.post(
            Endpoint::MoveStream,
            json!({ "input_index": input_index, "sink_name": sink_name }),
        )
        .await
    }

    /// Move every stream to a sink, returns how many were moved
    pub async fn move_all_streams(&self, sink_name: &str) -> Result<u32> {
        let value = self
            .post(Endpoint::MoveAllStreams, json!({ "sink_name": sink_name }))
            .await?;
        let response: MoveAllResponse = serde_json::from_value(value)?;
        Ok(response.moved_count)
    }

    // ========== Combined sinks ==========

    /// Get all combined sinks and stereo pairs
    pub async fn combined_sinks(&self) -> Result<Vec<CombinedSink>> {
        let response: CombinedSinksResponse = self.get(Endpoint::CombinedSinks).await?;
        Ok(response.combined_sinks)
    }

    /// Create a combined sink for multi-room audio
    pub async fn create_combined_sink(&self, name: &str, sinks: &[SinkName]) -> Result<Value> {
        self.post(Endpoint::CombinedSink, json!({ "name": name, "sinks": sinks }))
            .await
    }

    /// Create a stereo pair
    pub async fn create_stereo_pair(&self, name: &str, left_sink: &str, right_sink: &str) -> Result<Value> {
        self.post(
            Endpoint::StereoPair,
            json!({ "name": name, "left_sink": left_sink, "right_sink": right_sink }),
        )
        .await
    }

    /// Delete a combined sink or stereo pair
    pub async fn delete_combined_sink(&self, sink_name: &str) -> Result<Value> {
        self.delete(Endpoint::DeleteCombinedSink(sink_name.to_string()))
            .await
    }

    // ========== Bluetooth ==========

    /// Get all Bluetooth devices
    pub async fn bluetooth_devices(&self) -> Result<Vec<BluetoothDevice>> {
        let response: BluetoothDevicesResponse = self.get(Endpoint::BluetoothDevices).await?;
        Ok(response.devices)
    }

    /// Scan for Bluetooth devices for `duration_secs`
    pub async fn scan_bluetooth(&self, duration_secs: u32) -> Result<Value> {
        self.post(Endpoint::BluetoothScan, json!({ "duration": duration_secs }))
            .await
    }

    pub async fn pair_bluetooth(&self, address: &str) -> Result<Value> {
        self.post(Endpoint::BluetoothPair, json!({ "address": address }))
            .await
    }

    pub async fn connect_bluetooth(&self, address: &str) -> Result<Value> {
        self.post(Endpoint::BluetoothConnect, json!({ "address": address }))
            .await
    }

    pub async fn disconnect_bluetooth(&self, address: &str) -> Result<Value> {
        self.post(Endpoint::BluetoothDisconnect, json!({ "address": address }))
            .await
    }

    /// Connect a Bluetooth device and make it the default output
    pub async fn connect_and_set_default_bluetooth(&self, address: &str) -> Result<Value> {
        self.post(
            Endpoint::BluetoothConnectAndSetDefault,
            json!({ "address": address }),
        )
        .await
    }

    // ========== Bluetooth keep-alive ==========

    /// Get the keep-alive configuration
    pub async fn keep_alive(&self) -> Result<KeepAliveStatus> {
        self.get(Endpoint::KeepAlive).await
    }

    pub async fn keep_alive_start(&self) -> Result<Value> {
        self.post_empty(Endpoint::KeepAliveStart).await
    }

    pub async fn keep_alive_stop(&self) -> Result<Value> {
        self.post_empty(Endpoint::KeepAliveStop).await
    }

    /// Set the keep-alive interval in seconds
    pub async fn keep_alive_set_interval(&self, interval_secs: u64) -> Result<Value> {
        self.post(Endpoint::KeepAliveInterval, json!({ "interval": interval_secs }))
            .await
    }

    pub async fn keep_alive_enable_sink(&self, sink_name: &str) -> Result<Value> {
        self.post(Endpoint::KeepAliveEnableSink, json!({ "sink_name": sink_name }))
            .await
    }

    pub async fn keep_alive_disable_sink(&self, sink_name: &str) -> Result<Value> {
        self.post(Endpoint::KeepAliveDisableSink, json!({ "sink_name": sink_name }))
            .await
    }

    // ========== Playback ==========

    /// Get the global playback state and track
    pub async fn playback_status(&self) -> Result<PlayerStatus> {
        let response: PlaybackStatusResponse = self.get(Endpoint::PlaybackStatus).await?;
        Ok(response)
    }

    /// Send a transport action to the global player
    pub async fn transport(&self, action: TransportAction) -> Result<Value> {
        self.post_empty(Endpoint::Playback(action)).await
    }

    pub async fn play(&self) -> Result<Value> {
        self.transport(TransportAction::Play).await
    }

    pub async fn pause(&self) -> Result<Value> {
        self.transport(TransportAction::Pause).await
    }

    pub async fn stop(&self) -> Result<Value> {
        self.transport(TransportAction::Stop).await
    }

    pub async fn next_track(&self) -> Result<Value> {
        self.transport(TransportAction::Next).await
    }

    pub async fn previous_track(&self) -> Result<Value> {
        self.transport(TransportAction::Previous).await
    }

    /// Send a transport action to the player feeding a sink
    ///
    /// The server answers 404 when no player is assigned to the sink.
    pub async fn sink_transport(&self, sink_name: &str, action: TransportAction) -> Result<Value> {
        self.post_empty(Endpoint::SinkPlayback(sink_name.to_string(), action))
            .await
    }

    /// Pause every player
    pub async fn pause_all(&self) -> Result<Value> {
        self.post_empty(Endpoint::PauseAll).await
    }

    /// Stop every player
    pub async fn stop_all(&self) -> Result<Value> {
        self.post_empty(Endpoint::StopAll).await
    }

    // ========== Players ==========

    /// Get the player registry with per-player playback status
    pub async fn players(&self) -> Result<Vec<PlayerInfo>> {
        let response: PlayersResponse = self.get(Endpoint::Players).await?;
        Ok(response.players)
    }

    /// Get the sink to player assignment table
    pub async fn player_assignments(&self) -> Result<BTreeMap<SinkName, PlayerId>> {
        let response: AssignmentsResponse = self.get(Endpoint::PlayerAssignments).await?;
        Ok(response.assignments)
    }

    /// Assign a player to a sink
    pub async fn assign_player(&self, player_name: &str, sink_name: &str) -> Result<Value> {
        self.post(
            Endpoint::AssignPlayer,
            json!({ "player_name": player_name, "sink_name": sink_name }),
        )
        .await
    }

    // ========== Radio ==========

    /// Get the radio stream catalogue
    pub async fn radio_streams(&self) -> Result<RadioStreams> {
        let response: RadioStreamsResponse = self.get(Endpoint::RadioStreams).await?;
        Ok(response.streams)
    }

    pub async fn add_radio_stream(&self, name: &str, url: &str) -> Result<Value> {
        self.post(Endpoint::RadioStream, json!({ "name": name, "url": url }))
            .await
    }

    pub async fn update_radio_stream(&self, name: &str, url: &str) -> Result<Value> {
        self.post(
            Endpoint::NamedRadioStream(name.to_string()),
            json!({ "name": name, "url": url }),
        )
        .await
    }

    pub async fn delete_radio_stream(&self, name: &str) -> Result<Value> {
        self.delete(Endpoint::NamedRadioStream(name.to_string()))
            .await
    }

    /// Play a catalogued radio stream
    pub async fn play_radio_stream(&self, name: &str) -> Result<Value> {
        self.post(Endpoint::RadioPlay, json!({ "stream": name })).await
    }

    /// Play an arbitrary URL or URI, optionally on a given sink
    pub async fn play_radio_url(&self, url: &str, sink: Option<&str>) -> Result<Value> {
        let body = match sink {
            Some(sink) => json!({ "url": url, "sink": sink }),
            None => json!({ "url": url }),
        };
        self.post(Endpoint::RadioPlayUrl, body).await
    }

    // ========== Text-to-speech ==========

    /// Speak a message
    pub async fn speak_tts(&self, message: &str, language: &str) -> Result<Value> {
        self.post(
            Endpoint::TtsSpeak,
            json!({ "message": message, "language": language }),
        )
        .await
    }

    pub async fn tts_settings(&self) -> Result<TtsSettings> {
        self.get(Endpoint::TtsSettings).await
    }

    pub async fn set_tts_settings(&self, settings: &TtsSettings) -> Result<Value> {
        self.post(Endpoint::TtsSettings, serde_json::to_value(settings)?)
            .await
    }
}
