//! Listener and notification sink traits
//!
//! Implemented by the presentation layer. The controller holds at most one of
//! each and replaces it when a new one is set.

use crate::error::PlaybackError;
use crate::events::{PlaybackStatus, PlayerSnapshot};
use crate::types::AudioItem;

/// Receives playback callbacks
///
/// All methods default to no-ops. Callbacks are delivered synchronously from
/// the controller's own processing, so implementations must not block.
///
/// For one request exactly one outcome is reported: either
/// `on_prepared_audio` followed by `on_playing`, or `on_path_error`.
#[allow(unused_variables)]
pub trait PlaybackListener: Send {
    /// The engine loaded the current item
    fn on_prepared_audio(&mut self, status: &PlaybackStatus) {}

    /// Playback of a freshly prepared item started
    fn on_playing(&mut self, status: &PlaybackStatus) {}

    /// Playback paused
    fn on_paused(&mut self, status: &PlaybackStatus) {}

    /// Playback resumed after a pause
    fn on_continue_audio(&mut self, status: &PlaybackStatus) {}

    /// The current item played to its end
    fn on_completed_audio(&mut self) {}

    /// Position changed (periodic tick or seek)
    fn on_time_changed(&mut self, status: &PlaybackStatus) {}

    /// Playback was reset and no item is selected any more
    fn on_stopped(&mut self) {}

    /// The engine failed in a way the controller cannot remedy
    fn on_engine_error(&mut self, error: &PlaybackError) {}

    /// An item's source could not be loaded
    fn on_path_error(&mut self, item: &AudioItem) {}
}

/// Receives a snapshot after every state change
///
/// Feeds OS media notifications or any other out-of-band renderer.
pub trait NotificationSink: Send {
    /// Render the latest snapshot
    fn update(&mut self, snapshot: &PlayerSnapshot);
}
