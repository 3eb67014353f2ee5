use thiserror::Error;

/// Result type for Linux Audio Server operations
pub type Result<T> = std::result::Result<T, AudioServerError>;

/// Errors that can occur when talking to a Linux Audio Server
#[derive(Error, Debug)]
pub enum AudioServerError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error on the event stream
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Event stream was closed by the server
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timed out waiting for response
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("API error ({status}): {detail}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error detail from the response body, or the status reason
        detail: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unexpected response from the server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No sink with this name or description in the current snapshot
    #[error("Sink not found: {0}")]
    SinkNotFound(String),

    /// No active stream matches the source
    #[error("Source not active: {0}")]
    SourceInactive(String),

    /// A core subsystem failed, no new snapshot was published
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// Channel receive error
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl AudioServerError {
    /// Whether the server reported the resource as missing (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, AudioServerError::Api { status: 404, .. })
    }
}
