//! Playback events and status snapshots
//!
//! Two directions:
//! - `EngineEvent`: engine → controller (prepared, completed, error, tick)
//! - `PlaybackStatus` / `PlayerSnapshot`: controller → listener and sink

use crate::types::{AudioItem, ControllerState, RepeatMode};
use serde::{Deserialize, Serialize};

/// Status of the current item at the moment of an event
///
/// Built fresh for each event and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    /// The item the status describes
    pub audio_item: AudioItem,

    /// Total duration reported by the engine
    pub duration_ms: i64,

    /// Playback position
    pub current_position_ms: i64,
}

impl PlaybackStatus {
    /// Create a status snapshot
    pub fn new(audio_item: AudioItem, duration_ms: i64, current_position_ms: i64) -> Self {
        Self {
            audio_item,
            duration_ms,
            current_position_ms,
        }
    }

    /// Same item and duration at a new position
    pub fn at_position(&self, current_position_ms: i64) -> Self {
        Self::new(self.audio_item.clone(), self.duration_ms, current_position_ms)
    }

    /// Progress from 0.0 to 1.0 (0.0 when the duration is unknown)
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0 {
            return 0.0;
        }
        (self.current_position_ms as f32 / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    /// Time left in the current item
    pub fn remaining_ms(&self) -> i64 {
        (self.duration_ms - self.current_position_ms).max(0)
    }
}

/// Everything a notification builder needs to render the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Controller state
    pub state: ControllerState,

    /// Selected item, if any
    pub current: Option<AudioItem>,

    /// Queue in play order
    pub queue: Vec<AudioItem>,

    /// Last status emitted for the current item
    pub status: Option<PlaybackStatus>,

    /// Repeat mode
    pub repeat: RepeatMode,

    /// Shuffle enabled
    pub shuffle: bool,
}

impl PlayerSnapshot {
    /// Index of the current item in `queue`
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.queue.iter().position(|item| item == current)
    }
}

/// Event reported by the engine (or the ticker) for one prepare request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    /// Request the event belongs to
    pub generation: u64,

    /// What happened
    pub kind: EngineEventKind,
}

/// Engine event payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    /// Source loaded and ready to play
    Prepared,

    /// Item played to the end
    Completed,

    /// Source could not be loaded or decoded
    Error(String),

    /// Engine failed in a way the controller cannot remedy
    Fault(String),

    /// Periodic position update
    Tick,
}
