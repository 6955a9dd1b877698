//! Core types for playback control

use serde::{Deserialize, Serialize};

/// Position marker for an item that has not been placed in a queue yet
pub const UNASSIGNED_POSITION: i64 = -1;

/// Audio item held by the queue
///
/// `id` is unique within one queue instance. Once a queue is initialized,
/// `position` equals the item's index in play order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioItem {
    /// Identifier, unique within the owning queue
    #[serde(default)]
    pub id: i64,

    /// Source locator (local path, `file://`, `asset://` or `http(s)://`)
    pub url: String,

    /// Display title
    pub title: String,

    /// Index marker in play order, `UNASSIGNED_POSITION` when not placed
    #[serde(default = "unassigned_position")]
    pub position: i64,
}

fn unassigned_position() -> i64 {
    UNASSIGNED_POSITION
}

impl AudioItem {
    /// Create an item that has not been placed in a queue yet
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_POSITION,
            url: url.into(),
            title: title.into(),
            position: UNASSIGNED_POSITION,
        }
    }

    /// Whether the item carries a queue position
    pub fn is_placed(&self) -> bool {
        self.position != UNASSIGNED_POSITION
    }

    /// Classify the source locator
    pub fn origin(&self) -> AudioOrigin {
        AudioOrigin::of(&self.url)
    }
}

// Identity is id + locator; title and position are presentation data.
impl PartialEq for AudioItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.url == other.url
    }
}

impl Eq for AudioItem {}

/// Where an item's audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioOrigin {
    /// Local file path or `file://` locator
    File,

    /// Bundled asset (`asset://`)
    Asset,

    /// Remote locator (`http://`, `https://`)
    Remote,
}

impl AudioOrigin {
    /// Classify a locator by its scheme
    pub fn of(url: &str) -> Self {
        let lower = url.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AudioOrigin::Remote
        } else if lower.starts_with("asset://") {
            AudioOrigin::Asset
        } else {
            AudioOrigin::File
        }
    }
}

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    /// No queue, or nothing selected
    Idle,

    /// Engine loading the selected item
    Preparing,

    /// Currently playing
    Playing,

    /// Paused mid-item
    Paused,

    /// Current item finished
    Completed,
}

impl ControllerState {
    /// Whether a busy indicator should be shown
    pub fn is_busy(self) -> bool {
        self == ControllerState::Preparing
    }

    /// Whether the engine holds a prepared item
    pub fn has_prepared_item(self) -> bool {
        matches!(self, ControllerState::Playing | ControllerState::Paused)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the queue boundaries
    #[default]
    Off,

    /// Wrap around at the queue boundaries
    All,

    /// Replay the current item when it completes
    One,
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval between time-tick updates while playing (default: 1000)
    pub tick_interval_ms: u64,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Pick a random neighbour on `next` (default: false)
    pub shuffle: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            repeat: RepeatMode::Off,
            shuffle: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.repeat, RepeatMode::Off);
        assert!(!config.shuffle);
    }

    #[test]
    fn new_item_is_unassigned() {
        let item = AudioItem::new("Song", "/music/song.mp3");
        assert_eq!(item.position, UNASSIGNED_POSITION);
        assert!(!item.is_placed());
        assert_eq!(item.origin(), AudioOrigin::File);
    }

    #[test]
    fn equality_ignores_title_and_position() {
        let mut a = AudioItem::new("A", "/music/a.mp3");
        a.id = 4;
        let mut b = a.clone();
        b.title = "Renamed".to_string();
        b.position = 9;
        assert_eq!(a, b);

        b.url = "/music/b.mp3".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn origin_from_scheme() {
        assert_eq!(AudioOrigin::of("https://radio/stream"), AudioOrigin::Remote);
        assert_eq!(AudioOrigin::of("HTTP://radio/stream"), AudioOrigin::Remote);
        assert_eq!(AudioOrigin::of("asset://intro.ogg"), AudioOrigin::Asset);
        assert_eq!(AudioOrigin::of("file:///tmp/a.flac"), AudioOrigin::File);
    }

    #[test]
    fn item_deserializes_without_position() {
        let item: AudioItem =
            serde_json::from_str(r#"{"url": "/a.mp3", "title": "A"}"#).unwrap();
        assert_eq!(item.position, UNASSIGNED_POSITION);
        assert_eq!(item.id, 0);
    }

    #[test]
    fn busy_only_while_preparing() {
        assert!(ControllerState::Preparing.is_busy());
        assert!(!ControllerState::Playing.is_busy());
        assert!(ControllerState::Paused.has_prepared_item());
        assert!(!ControllerState::Completed.has_prepared_item());
    }
}
