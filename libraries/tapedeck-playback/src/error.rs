//! Error types for playback control

use thiserror::Error;

/// Playback errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The engine could not load or play an item
    #[error("Invalid audio source {url} (item {id}): {reason}")]
    InvalidSource {
        /// Id of the rejected item
        id: i64,
        /// Locator the engine was asked to load
        url: String,
        /// Engine-supplied reason
        reason: String,
    },

    /// Operation needs a current item but none is selected
    #[error("No audio selected")]
    NoActiveAudio,

    /// Nothing available to play in the requested direction
    #[error("Queue is empty")]
    EmptyQueue,

    /// Unrecoverable engine error
    #[error("Engine fault: {0}")]
    EngineFault(String),

    /// Controller was killed and has no playlist
    #[error("Controller released; initialize a new playlist first")]
    Released,

    /// Player service task is no longer running
    #[error("Player service closed")]
    ServiceClosed,
}

impl PlaybackError {
    /// Whether this error is scoped to a single item rather than the controller
    pub fn is_item_scoped(&self) -> bool {
        matches!(self, PlaybackError::InvalidSource { .. })
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
