//! Integration tests for the REST client

mod helpers;

use helpers::*;
use linux_audio_server::{AudioServerClient, AudioServerError, SinkDriverState, TransportAction};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AudioServerClient {
    AudioServerClient::with_base_url(server.uri()).unwrap()
}

#[tokio::test]
async fn test_get_sinks() {
    let mock_server = MockServer::start().await;
    mount_get(&mock_server, "/api/audio/sinks", sinks_json()).await;

    let sinks = client_for(&mock_server).sinks().await.unwrap();

    assert_eq!(sinks.len(), 2);
    assert_eq!(sinks[0].name, KITCHEN);
    assert_eq!(sinks[0].description, "Kitchen");
    assert_eq!(sinks[0].driver_state, SinkDriverState::Running);
    assert!(sinks[0].is_default);
    assert_eq!(sinks[1].driver_state, SinkDriverState::Suspended);
    assert!(sinks[1].muted);
}

#[tokio::test]
async fn test_get_sink_inputs() {
    let mock_server = MockServer::start().await;
    mount_get(&mock_server, "/api/audio/sink-inputs", sink_inputs_json()).await;

    let inputs = client_for(&mock_server).sink_inputs().await.unwrap();

    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].index, Some(12));
    assert_eq!(inputs[0].stream_name, "Mopidy Player 2@unix:/run/pulse/native");
    assert_eq!(inputs[0].target_sink.as_deref(), Some(KITCHEN));
}

#[tokio::test]
async fn test_playback_status_aliases() {
    let mock_server = MockServer::start().await;
    mount_get(
        &mock_server,
        "/api/playback/status",
        playback_json("paused", json!({ "name": "So What", "artist": "Miles Davis", "length": 540000 })),
    )
    .await;

    let status = client_for(&mock_server).playback_status().await.unwrap();

    assert_eq!(status.state, Some(linux_audio_server::PlayerState::Paused));
    assert_eq!(status.time_position_ms, Some(61500));
    let track = status.current_track.unwrap();
    assert_eq!(track.name.as_deref(), Some("So What"));
    assert_eq!(track.duration_ms, Some(540000));
}

#[tokio::test]
async fn test_set_sink_volume_posts_clamped_level() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/audio/sink/alsa_output.kitchen/volume"))
        .and(body_json(json!({ "volume": 1.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = client_for(&mock_server)
        .set_sink_volume(KITCHEN, 1.7)
        .await
        .unwrap();

    assert_eq!(response, json!({ "success": true }));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/playback/pause-all"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let response = client_for(&mock_server).pause_all().await.unwrap();
    assert_eq!(response, Value::Null);
}

#[tokio::test]
async fn test_api_error_carries_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/playback/sink/alsa_output.office/play"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "No player assigned to sink" })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .sink_transport(OFFICE, TransportAction::Play)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        AudioServerError::Api { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "No player assigned to sink");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_malformed_json_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/audio/sinks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).sinks().await.unwrap_err();
    assert!(matches!(err, AudioServerError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).with_timeout(Duration::from_millis(100));
    let err = client.health_check().await.unwrap_err();
    assert!(matches!(err, AudioServerError::Timeout(_)));
}

#[tokio::test]
async fn test_play_radio_url_on_sink() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/radio/play_url"))
        .and(body_json(json!({ "url": "http://radio.example/jazz", "sink": KITCHEN })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .play_radio_url("http://radio.example/jazz", Some(KITCHEN))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_move_all_streams_returns_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/audio/sink-inputs/move-all"))
        .and(body_json(json!({ "sink_name": OFFICE })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "moved_count": 3 })))
        .mount(&mock_server)
        .await;

    let moved = client_for(&mock_server).move_all_streams(OFFICE).await.unwrap();
    assert_eq!(moved, 3);
}

#[tokio::test]
async fn test_optional_endpoints_decode() {
    let mock_server = MockServer::start().await;
    mount_optional(&mock_server).await;
    let client = client_for(&mock_server);

    let players = client.players().await.unwrap();
    assert_eq!(players.len(), 2);
    assert!(players[1].active);
    assert_eq!(
        players[1].playback.state,
        Some(linux_audio_server::PlayerState::Playing)
    );

    let assignments = client.player_assignments().await.unwrap();
    assert_eq!(assignments.get(OFFICE).map(String::as_str), Some("player3"));

    let devices = client.bluetooth_devices().await.unwrap();
    assert!(devices[0].paired);
    assert!(!devices[0].connected);

    let streams = client.radio_streams().await.unwrap();
    assert_eq!(streams.get("Jazz FM").map(String::as_str), Some("http://radio.example/jazz"));

    let keep_alive = client.keep_alive().await.unwrap();
    assert!(keep_alive.enabled);
    assert_eq!(keep_alive.interval, 120);
}
