//! Recently played tracks

use crate::snapshot::Snapshot;
use crate::types::Track;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One played track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
    pub duration_ms: Option<u64>,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    fn from_track(track: &Track, timestamp: DateTime<Local>) -> Self {
        Self {
            title: track.name.clone().unwrap_or_default(),
            artist: track.artist.clone().unwrap_or_default(),
            album: track.album.clone().unwrap_or_default(),
            uri: track.uri.clone().unwrap_or_default(),
            duration_ms: track.duration_ms,
            timestamp,
        }
    }
}

/// Bounded, newest-first history of tracks seen by the system
///
/// A track is recorded only when its identity differs from the last one
/// recorded, so observing the same track on every poll adds a single entry.
/// History lives in memory only.
#[derive(Debug, Clone)]
pub struct TrackHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    last_identity: Option<String>,
}

impl Default for TrackHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackHistory {
    /// Create a history with the default capacity of 50 entries
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a history keeping at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_identity: None,
        }
    }

    /// Record a track, returns whether a new entry was added
    pub fn record(&mut self, track: &Track) -> bool {
        self.record_at(track, Local::now())
    }

    fn record_at(&mut self, track: &Track, timestamp: DateTime<Local>) -> bool {
        let Some(identity) = track.identity() else {
            return false;
        };
        if self.last_identity.as_deref() == Some(identity.as_str()) {
            return false;
        }

        tracing::debug!(
            "New track detected for history: {} - {}",
            track.artist.as_deref().unwrap_or(""),
            track.name.as_deref().unwrap_or("")
        );

        self.entries.push_front(HistoryEntry::from_track(track, timestamp));
        self.entries.truncate(self.capacity);
        self.last_identity = Some(identity);
        true
    }

    /// Record whatever the system is currently playing
    ///
    /// The current track is the global playback track, or else the first
    /// player (in id order) that has one.
    pub fn observe(&mut self, snapshot: &Snapshot) -> bool {
        match current_system_track(snapshot) {
            Some(track) => self.record(track),
            None => false,
        }
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The `n` most recent entries
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `"artist - title"` of the latest entry
    pub fn summary(&self) -> String {
        match self.latest() {
            Some(entry) => {
                let artist = if entry.artist.is_empty() { "Unknown Artist" } else { &entry.artist };
                let title = if entry.title.is_empty() { "Unknown Title" } else { &entry.title };
                format!("{} - {}", artist, title)
            }
            None => "No tracks played".to_string(),
        }
    }

    /// Forget all entries and the last seen identity
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_identity = None;
    }
}

fn current_system_track(snapshot: &Snapshot) -> Option<&Track> {
    snapshot
        .legacy_playback
        .current_track
        .as_ref()
        .or_else(|| snapshot.players.values().find_map(|p| p.current_track.as_ref()))
}
