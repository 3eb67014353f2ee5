use crate::error::Result;
use crate::protocol::Endpoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default server port
pub const DEFAULT_PORT: u16 = 6681;

/// Connection and polling settings for a Linux Audio Server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between periodic refreshes
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Fixed delay before the event stream reconnects, in seconds
    #[serde(default = "default_event_reconnect_delay")]
    pub event_reconnect_delay_secs: u64,

    /// Whether to consume the server's push-event WebSocket
    #[serde(default = "default_enable_events")]
    pub enable_events: bool,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scan_interval() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_event_reconnect_delay() -> u64 {
    5
}

fn default_enable_events() -> bool {
    true
}

fn default_history_capacity() -> usize {
    crate::history::DEFAULT_HISTORY_CAPACITY
}

impl ServerConfig {
    /// Config for `host` with every other setting at its default
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            scan_interval_secs: default_scan_interval(),
            request_timeout_secs: default_request_timeout(),
            event_reconnect_delay_secs: default_event_reconnect_delay(),
            enable_events: default_enable_events(),
            history_capacity: default_history_capacity(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn with_events(mut self, enabled: bool) -> Self {
        self.enable_events = enabled;
        self
    }

    /// Load a config from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// `ws://host:port/ws`
    pub fn events_url(&self) -> String {
        format!("ws://{}:{}/{}", self.host, self.port, Endpoint::Events.segments().join("/"))
    }

    // Durations are at least one second; a zero period would panic the poll
    // ticker and a zero delay would spin the reconnect loop.

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn event_reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.event_reconnect_delay_secs.max(1))
    }
}
