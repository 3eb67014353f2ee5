//! Sink state resolution
//!
//! Decides, for one sink, which information source to trust for "is this
//! speaker playing". Sources are tried in a fixed order and the first one
//! with an answer wins:
//!
//! 1. live routing: a player stream currently routed to the sink
//! 2. the administrative sink to player assignment
//! 3. the global legacy playback status
//! 4. the sink's PulseAudio driver state
//!
//! A missing sink resolves to [`PlaybackStatus::Off`] before any of these run.
//! A referenced player that is missing, or reports no usable state, counts as
//! "no information" and resolution moves to the next source.
//!
//! Every resolution logs its decisions at debug level, prefixed with
//! `[<sink name>]`, in the format the state diagnosis tool reads.

use crate::snapshot::Snapshot;
use crate::types::{PlayerId, PlayerState, PlayerStatus, Sink, SinkDriverState, Track};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stream name marker of a Mopidy player instance
const PLAYER_STREAM_MARKER: &str = "Mopidy Player";

/// Known player identities, in match order
///
/// A stream named `"Mopidy Player 2@unix:/run/pulse/native"` belongs to `player2`.
const KNOWN_PLAYERS: [(&str, &str); 4] = [
    ("Player 1", "player1"),
    ("Player 2", "player2"),
    ("Player 3", "player3"),
    ("Player 4", "player4"),
];

/// Authoritative playback status of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Idle,
    /// Sink is running but no player information exists
    On,
    Off,
}

impl PlaybackStatus {
    /// Map a player state; `None` for states that carry no information
    pub fn from_player_state(state: PlayerState) -> Option<Self> {
        match state {
            PlayerState::Playing => Some(PlaybackStatus::Playing),
            PlayerState::Paused => Some(PlaybackStatus::Paused),
            PlayerState::Stopped => Some(PlaybackStatus::Idle),
            PlayerState::Unknown => None,
        }
    }

    /// Map a sink driver state, the fallback of last resort
    pub fn from_driver_state(state: &SinkDriverState) -> Self {
        match state {
            SinkDriverState::Running => PlaybackStatus::On,
            SinkDriverState::Idle | SinkDriverState::Suspended => PlaybackStatus::Idle,
            SinkDriverState::Other(_) => PlaybackStatus::Off,
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackStatus::Playing => "PLAYING",
            PlaybackStatus::Paused => "PAUSED",
            PlaybackStatus::Idle => "IDLE",
            PlaybackStatus::On => "ON",
            PlaybackStatus::Off => "OFF",
        };
        f.write_str(s)
    }
}

/// Which information source decided a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// The sink does not exist
    SinkMissing,
    /// A player stream routed to the sink
    LiveRouting,
    /// The sink's assigned player
    Assignment,
    /// The global legacy playback status
    Legacy,
    /// The sink's driver state
    DriverState,
    /// No source had an answer (tracks only)
    None,
}

/// Full result of resolving one sink
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: PlaybackStatus,
    /// Source that decided `status`
    pub priority: Priority,
    pub track: Option<Track>,
    /// Source that provided `track`
    pub track_priority: Priority,
}

type PlayerSource = for<'a> fn(&'a Snapshot, &str) -> Option<&'a PlayerStatus>;

/// Player-backed sources, in priority order
const PLAYER_SOURCES: [(Priority, PlayerSource); 3] = [
    (Priority::LiveRouting, live_routing_player),
    (Priority::Assignment, assigned_player),
    (Priority::Legacy, legacy_player),
];

/// Player id a stream name belongs to, if any
///
/// Only Mopidy streams are attributed. When a name matches several player
/// patterns, the first in [`KNOWN_PLAYERS`] order wins.
pub fn player_for_stream(stream_name: &str) -> Option<&'static str> {
    if !stream_name.contains(PLAYER_STREAM_MARKER) {
        return None;
    }
    KNOWN_PLAYERS
        .iter()
        .find(|(pattern, _)| stream_name.contains(pattern))
        .map(|(_, id)| *id)
}

/// Player actually routing audio to a sink, from the sink-inputs
pub fn active_player_for_sink<'a>(snapshot: &'a Snapshot, sink_name: &'a str) -> Option<&'static str> {
    snapshot
        .inputs_for_sink(sink_name)
        .find_map(|input| player_for_stream(&input.stream_name))
}

fn live_routing_player<'a>(snapshot: &'a Snapshot, sink_name: &str) -> Option<&'a PlayerStatus> {
    let player = active_player_for_sink(snapshot, sink_name);
    match player {
        Some(id) => {
            tracing::debug!("[{}] Priority 1: Active player from sink-inputs: {}", sink_name, id);
            let status = snapshot.player(id);
            if let Some(status) = status {
                tracing::debug!(
                    "[{}] Found active player {} with state: {}",
                    sink_name,
                    id,
                    state_label(status.state)
                );
            }
            status
        }
        None => {
            tracing::debug!("[{}] Priority 1: No active player found in sink-inputs", sink_name);
            None
        }
    }
}

fn assigned_player<'a>(snapshot: &'a Snapshot, sink_name: &str) -> Option<&'a PlayerStatus> {
    let assigned: Option<&PlayerId> = snapshot.assigned_player(sink_name);
    tracing::debug!(
        "[{}] Priority 2: Checking player assignments. Assigned player: {}",
        sink_name,
        assigned.map(String::as_str).unwrap_or("None")
    );
    assigned.and_then(|id| snapshot.player(id))
}

fn legacy_player<'a>(snapshot: &'a Snapshot, sink_name: &str) -> Option<&'a PlayerStatus> {
    tracing::debug!(
        "[{}] Priority 3: Checking global playback state: {}",
        sink_name,
        state_label(snapshot.legacy_playback.state)
    );
    Some(&snapshot.legacy_playback)
}

fn state_label(state: Option<PlayerState>) -> &'static str {
    match state {
        Some(PlayerState::Playing) => "playing",
        Some(PlayerState::Paused) => "paused",
        Some(PlayerState::Stopped) => "stopped",
        Some(PlayerState::Unknown) => "unknown",
        None => "None",
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::SinkMissing => "sink missing",
        Priority::LiveRouting => "Priority 1, from active player",
        Priority::Assignment => "Priority 2, from assigned player",
        Priority::Legacy => "Priority 3, from global playback",
        Priority::DriverState => "Priority 4, from PA sink state",
        Priority::None => "no source",
    }
}

fn status_with_priority(sink_name: &str, snapshot: &Snapshot) -> (PlaybackStatus, Priority) {
    tracing::debug!("[{}] === Determining state ===", sink_name);
    tracing::debug!("[{}] Total sink_inputs: {}", sink_name, snapshot.sink_inputs.len());

    let Some(sink) = snapshot.sink(sink_name) else {
        tracing::debug!("[{}] Returning OFF (sink missing)", sink_name);
        return (PlaybackStatus::Off, Priority::SinkMissing);
    };

    for (priority, source) in PLAYER_SOURCES {
        let status = source(snapshot, sink_name)
            .and_then(|player| player.state)
            .and_then(PlaybackStatus::from_player_state);
        if let Some(status) = status {
            tracing::debug!("[{}] Returning {} ({})", sink_name, status, priority_label(priority));
            return (status, priority);
        }
    }

    driver_state_status(sink)
}

fn driver_state_status(sink: &Sink) -> (PlaybackStatus, Priority) {
    tracing::debug!(
        "[{}] Priority 4: Falling back to PulseAudio sink state: {}",
        sink.name,
        sink.driver_state
    );
    let status = PlaybackStatus::from_driver_state(&sink.driver_state);
    tracing::debug!(
        "[{}] Returning {} ({})",
        sink.name,
        status,
        priority_label(Priority::DriverState)
    );
    (status, Priority::DriverState)
}

fn track_with_priority(sink_name: &str, snapshot: &Snapshot) -> (Option<Track>, Priority) {
    // A known live or assigned player decides the track even when it has none
    for (priority, source) in PLAYER_SOURCES {
        if let Some(player) = source(snapshot, sink_name) {
            if player.current_track.is_some() || priority != Priority::Legacy {
                return (player.current_track.clone(), priority);
            }
        }
    }
    (None, Priority::None)
}

/// Resolve the playback status of a sink
///
/// Total over any snapshot: never fails, never mutates.
pub fn resolve_status(sink_name: &str, snapshot: &Snapshot) -> PlaybackStatus {
    status_with_priority(sink_name, snapshot).0
}

/// Resolve the track currently playing on a sink
///
/// Uses the same source order as [`resolve_status`]. The first source that
/// finds a player decides, so a live player without a track yields `None`
/// rather than a stale track from the assigned player. Sources whose player
/// record is missing are skipped.
pub fn resolve_track(sink_name: &str, snapshot: &Snapshot) -> Option<Track> {
    track_with_priority(sink_name, snapshot).0
}

/// Resolve status and track together, reporting which source decided each
pub fn resolve(sink_name: &str, snapshot: &Snapshot) -> Resolution {
    let (status, priority) = status_with_priority(sink_name, snapshot);
    let (track, track_priority) = track_with_priority(sink_name, snapshot);
    Resolution {
        status,
        priority,
        track,
        track_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SinkInput;

    const KITCHEN: &str = "speaker_kitchen";

    fn sink(name: &str, driver_state: SinkDriverState) -> Sink {
        Sink {
            name: name.to_string(),
            description: name.to_string(),
            index: None,
            driver_state,
            volume: 0.5,
            muted: false,
            is_default: false,
        }
    }

    fn stream(name: &str, target: &str) -> SinkInput {
        SinkInput {
            index: Some(1),
            stream_name: name.to_string(),
            target_sink: Some(target.to_string()),
            sink_description: None,
            volume: 1.0,
            muted: false,
        }
    }

    fn player(state: PlayerState, track: Option<&str>) -> PlayerStatus {
        PlayerStatus {
            state: Some(state),
            current_track: track.map(Track::with_name),
            time_position_ms: None,
        }
    }

    fn kitchen() -> Snapshot {
        Snapshot::new().with_sinks(vec![sink(KITCHEN, SinkDriverState::Running)])
    }

    #[test]
    fn test_live_routing_example() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix:/run/pulse/native", KITCHEN)])
            .with_player("player2", player(PlayerState::Playing, Some("X")));

        assert_eq!(resolve_status(KITCHEN, &snapshot), PlaybackStatus::Playing);
        assert_eq!(resolve_track(KITCHEN, &snapshot), Some(Track::with_name("X")));
    }

    #[test]
    fn test_idle_during_radio_reproduced() {
        let snapshot = kitchen()
            .with_assignment(KITCHEN, "player1")
            .with_player("player1", player(PlayerState::Stopped, None));

        assert_eq!(resolve_status(KITCHEN, &snapshot), PlaybackStatus::Idle);
    }

    #[test]
    fn test_live_routing_beats_assignment_and_legacy() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix:/run/pulse/native", KITCHEN)])
            .with_player("player2", player(PlayerState::Paused, Some("live")))
            .with_player("player1", player(PlayerState::Playing, Some("assigned")))
            .with_assignment(KITCHEN, "player1")
            .with_legacy_playback(player(PlayerState::Stopped, Some("legacy")));

        for _ in 0..5 {
            let resolution = resolve(KITCHEN, &snapshot);
            assert_eq!(resolution.status, PlaybackStatus::Paused);
            assert_eq!(resolution.priority, Priority::LiveRouting);
            assert_eq!(resolution.track, Some(Track::with_name("live")));
        }
    }

    #[test]
    fn test_missing_sink_is_off() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 1@unix", "nonexistent")])
            .with_player("player1", player(PlayerState::Playing, None))
            .with_assignment("nonexistent", "player1")
            .with_legacy_playback(player(PlayerState::Playing, None));

        let resolution = resolve("nonexistent", &snapshot);
        assert_eq!(resolution.status, PlaybackStatus::Off);
        assert_eq!(resolution.priority, Priority::SinkMissing);
    }

    #[test]
    fn test_removing_live_routing_falls_to_assignment() {
        let with_routing = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix", KITCHEN)])
            .with_player("player2", player(PlayerState::Playing, None))
            .with_player("player3", player(PlayerState::Paused, None))
            .with_assignment(KITCHEN, "player3")
            .with_legacy_playback(player(PlayerState::Stopped, None));
        assert_eq!(resolve_status(KITCHEN, &with_routing), PlaybackStatus::Playing);

        let without_routing = with_routing.clone().with_sink_inputs(Vec::new());
        let resolution = resolve(KITCHEN, &without_routing);
        assert_eq!(resolution.status, PlaybackStatus::Paused);
        assert_eq!(resolution.priority, Priority::Assignment);
    }

    #[test]
    fn test_state_mapping_at_every_level() {
        let cases = [
            (PlayerState::Playing, PlaybackStatus::Playing),
            (PlayerState::Paused, PlaybackStatus::Paused),
            (PlayerState::Stopped, PlaybackStatus::Idle),
        ];
        for (state, expected) in cases {
            let live = kitchen()
                .with_sink_inputs(vec![stream("Mopidy Player 1@unix", KITCHEN)])
                .with_player("player1", player(state, None));
            assert_eq!(resolve(KITCHEN, &live).status, expected);
            assert_eq!(resolve(KITCHEN, &live).priority, Priority::LiveRouting);

            let assigned = kitchen()
                .with_assignment(KITCHEN, "player4")
                .with_player("player4", player(state, None));
            assert_eq!(resolve(KITCHEN, &assigned).status, expected);
            assert_eq!(resolve(KITCHEN, &assigned).priority, Priority::Assignment);

            let legacy = kitchen().with_legacy_playback(player(state, None));
            assert_eq!(resolve(KITCHEN, &legacy).status, expected);
            assert_eq!(resolve(KITCHEN, &legacy).priority, Priority::Legacy);
        }
    }

    #[test]
    fn test_unknown_state_is_no_information() {
        let snapshot = Snapshot::new()
            .with_sinks(vec![sink(KITCHEN, SinkDriverState::Running)])
            .with_sink_inputs(vec![stream("Mopidy Player 1@unix", KITCHEN)])
            .with_player("player1", player(PlayerState::Unknown, None))
            .with_assignment(KITCHEN, "player2")
            .with_player(
                "player2",
                PlayerStatus {
                    state: None,
                    ..Default::default()
                },
            );

        let resolution = resolve(KITCHEN, &snapshot);
        assert_eq!(resolution.status, PlaybackStatus::On);
        assert_eq!(resolution.priority, Priority::DriverState);
    }

    #[test]
    fn test_stale_assignment_falls_through() {
        let snapshot = kitchen()
            .with_assignment(KITCHEN, "player3")
            .with_legacy_playback(player(PlayerState::Paused, None));

        let resolution = resolve(KITCHEN, &snapshot);
        assert_eq!(resolution.status, PlaybackStatus::Paused);
        assert_eq!(resolution.priority, Priority::Legacy);
    }

    #[test]
    fn test_routed_player_missing_falls_through() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 3@unix", KITCHEN)])
            .with_assignment(KITCHEN, "player1")
            .with_player("player1", player(PlayerState::Playing, None));

        assert_eq!(resolve(KITCHEN, &snapshot).priority, Priority::Assignment);
    }

    #[test]
    fn test_driver_state_fallback() {
        let cases = [
            (SinkDriverState::Running, PlaybackStatus::On),
            (SinkDriverState::Idle, PlaybackStatus::Idle),
            (SinkDriverState::Suspended, PlaybackStatus::Idle),
            (SinkDriverState::Other("UNLINKED".to_string()), PlaybackStatus::Off),
        ];
        for (driver_state, expected) in cases {
            let snapshot = Snapshot::new().with_sinks(vec![sink(KITCHEN, driver_state)]);
            assert_eq!(resolve_status(KITCHEN, &snapshot), expected);
        }
    }

    #[test]
    fn test_streams_on_other_sinks_ignored() {
        let snapshot = Snapshot::new()
            .with_sinks(vec![
                sink(KITCHEN, SinkDriverState::Idle),
                sink("speaker_office", SinkDriverState::Running),
            ])
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix", "speaker_office")])
            .with_player("player2", player(PlayerState::Playing, Some("office")));

        assert_eq!(resolve_status(KITCHEN, &snapshot), PlaybackStatus::Idle);
        assert_eq!(resolve_track(KITCHEN, &snapshot), None);
        assert_eq!(resolve_status("speaker_office", &snapshot), PlaybackStatus::Playing);
    }

    #[test]
    fn test_non_player_streams_skipped() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![
                stream("Shairport Sync", KITCHEN),
                stream("Mopidy Player 9@unix", KITCHEN),
                stream("Mopidy Player 2@unix", KITCHEN),
            ])
            .with_player("player2", player(PlayerState::Playing, None));

        assert_eq!(active_player_for_sink(&snapshot, KITCHEN), Some("player2"));
    }

    #[test]
    fn test_player_for_stream_order() {
        assert_eq!(player_for_stream("Mopidy Player 1 (TTS)@unix:/run/pulse/native"), Some("player1"));
        assert_eq!(player_for_stream("Mopidy Player 4@unix"), Some("player4"));
        assert_eq!(player_for_stream("Mopidy Player 2 / Player 1"), Some("player1"));
        assert_eq!(player_for_stream("librespot"), None);
        assert_eq!(player_for_stream("Player 2"), None);
    }

    #[test]
    fn test_live_player_without_track_hides_assigned_track() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix", KITCHEN)])
            .with_player("player2", player(PlayerState::Playing, None))
            .with_assignment(KITCHEN, "player1")
            .with_player("player1", player(PlayerState::Stopped, Some("stale old song")));

        let resolution = resolve(KITCHEN, &snapshot);
        assert_eq!(resolution.status, PlaybackStatus::Playing);
        assert_eq!(resolution.priority, Priority::LiveRouting);
        assert_eq!(resolution.track, None);
        assert_eq!(resolution.track_priority, Priority::LiveRouting);
    }

    #[test]
    fn test_track_skips_missing_player_record() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix", KITCHEN)])
            .with_assignment(KITCHEN, "player1")
            .with_player("player1", player(PlayerState::Stopped, Some("assigned")));

        let resolution = resolve(KITCHEN, &snapshot);
        assert_eq!(resolution.track, Some(Track::with_name("assigned")));
        assert_eq!(resolution.track_priority, Priority::Assignment);
    }

    #[test]
    fn test_no_track_anywhere() {
        let snapshot = kitchen();
        let resolution = resolve(KITCHEN, &snapshot);
        assert_eq!(resolution.track, None);
        assert_eq!(resolution.track_priority, Priority::None);
    }

    #[test]
    fn test_resolution_does_not_mutate() {
        let snapshot = kitchen()
            .with_sink_inputs(vec![stream("Mopidy Player 2@unix", KITCHEN)])
            .with_player("player2", player(PlayerState::Playing, Some("X")));
        let before = format!("{:?}", snapshot);
        let _ = resolve(KITCHEN, &snapshot);
        let _ = resolve("nonexistent", &snapshot);
        assert_eq!(before, format!("{:?}", snapshot));
    }
}
