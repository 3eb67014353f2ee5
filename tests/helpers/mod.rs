//! Shared mock server setup for integration tests

#![allow(dead_code)]

use linux_audio_server::{AudioServerClient, Coordinator, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const KITCHEN: &str = "alsa_output.kitchen";
pub const OFFICE: &str = "alsa_output.office";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn sinks_json() -> Value {
    json!({
        "sinks": [
            {
                "name": KITCHEN,
                "description": "Kitchen",
                "index": 1,
                "state": "RUNNING",
                "volume": 0.5,
                "muted": false,
                "is_default": true
            },
            {
                "name": OFFICE,
                "description": "Office",
                "index": 2,
                "state": "SUSPENDED",
                "volume": 0.3,
                "muted": true,
                "is_default": false
            }
        ]
    })
}

pub fn sink_inputs_json() -> Value {
    json!({
        "sink_inputs": [
            {
                "index": 12,
                "name": "Mopidy Player 2@unix:/run/pulse/native",
                "sink": KITCHEN,
                "volume": 1.0,
                "muted": false
            },
            {
                "index": 14,
                "name": "Shairport Sync",
                "sink": OFFICE,
                "volume": 0.6,
                "muted": false
            }
        ]
    })
}

pub fn playback_json(state: &str, track: Value) -> Value {
    json!({ "state": state, "track": track, "time_position": 61500 })
}

pub fn players_json() -> Value {
    json!({
        "players": [
            { "id": "player1", "name": "Player 1 (TTS)", "active": false, "state": "stopped" },
            {
                "id": "player2",
                "name": "Player 2",
                "active": true,
                "state": "playing",
                "current_track": { "name": "Giant Steps", "artist": "John Coltrane", "uri": "local:track:giant-steps" }
            }
        ]
    })
}

pub async fn mount_get(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount the core endpoints with a stopped legacy player
pub async fn mount_core(server: &MockServer) {
    mount_core_with_playback(server, playback_json("stopped", Value::Null)).await;
}

pub async fn mount_core_with_playback(server: &MockServer, playback: Value) {
    mount_get(server, "/api/audio/sinks", sinks_json()).await;
    mount_get(server, "/api/audio/sink-inputs", sink_inputs_json()).await;
    mount_get(server, "/api/audio/sink/default", json!({ "default_sink": KITCHEN })).await;
    mount_get(server, "/api/playback/status", playback).await;
}

pub async fn mount_optional(server: &MockServer) {
    mount_get(server, "/api/mopidy/players", players_json()).await;
    mount_get(server, "/api/mopidy/assignments", json!({ "assignments": { "alsa_output.office": "player3" } })).await;
    mount_get(
        server,
        "/api/bluetooth/devices",
        json!({ "devices": [{ "address": "00:02:3C:71:8B:55", "name": "Headphones", "paired": true }] }),
    )
    .await;
    mount_get(
        server,
        "/api/radio/streams",
        json!({ "streams": { "Jazz FM": "http://radio.example/jazz" } }),
    )
    .await;
    mount_get(
        server,
        "/api/bluetooth/keep-alive",
        json!({ "enabled": true, "interval": 120, "enabled_sinks": ["alsa_output.kitchen"] }),
    )
    .await;
}

pub fn test_config() -> ServerConfig {
    ServerConfig::new("127.0.0.1").with_events(false)
}

pub fn coordinator_for(server: &MockServer) -> Arc<Coordinator> {
    coordinator_with_config(server, test_config())
}

pub fn coordinator_with_config(server: &MockServer, config: ServerConfig) -> Arc<Coordinator> {
    let client = AudioServerClient::with_base_url(server.uri())
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    Coordinator::new(client, config)
}

/// Number of requests the server has seen for a method and path
pub async fn request_count(server: &MockServer, http_method: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == http_method && request.url.path() == route)
        .count()
}
