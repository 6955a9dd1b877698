//! Playback engine abstraction
//!
//! The controller never decodes audio. It drives an engine through the
//! `PlaybackEngine` trait and hears back through an `EngineNotifier`.

use crate::error::Result;
use crate::events::{EngineEvent, EngineEventKind};
use crate::types::AudioItem;
use tokio::sync::mpsc::UnboundedSender;

/// Platform playback primitive
///
/// Implementors wrap one media player (a CPAL pipeline, a mobile media
/// player, a network renderer...). `prepare` must return quickly: loading
/// happens in the background and its outcome is reported through the
/// notifier handed in with the request.
///
/// An engine that never reports `prepared` or `error` leaves the controller
/// in `Preparing`; no timeout is applied.
pub trait PlaybackEngine: Send {
    /// Start loading an item
    ///
    /// Report the outcome with `notifier.prepared()` or `notifier.error(..)`,
    /// and `notifier.completed()` once the item plays to its end. Returning
    /// `Err` is treated the same as reporting an error.
    fn prepare(&mut self, item: &AudioItem, notifier: EngineNotifier) -> Result<()>;

    /// Start playback of the prepared item
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self) -> Result<()>;

    /// Resume after `pause`
    fn resume(&mut self) -> Result<()> {
        self.play()
    }

    /// Move to a position in the prepared item
    fn seek(&mut self, position_ms: i64) -> Result<()>;

    /// Stop playback and drop the prepared item
    fn stop(&mut self) -> Result<()>;

    /// Release every resource held by the engine
    fn release(&mut self);

    /// Duration of the prepared item (0 when unknown)
    fn duration_ms(&self) -> i64;

    /// Position in the prepared item
    fn current_position_ms(&self) -> i64;
}

impl<E: PlaybackEngine + ?Sized> PlaybackEngine for Box<E> {
    fn prepare(&mut self, item: &AudioItem, notifier: EngineNotifier) -> Result<()> {
        (**self).prepare(item, notifier)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn resume(&mut self) -> Result<()> {
        (**self).resume()
    }

    fn seek(&mut self, position_ms: i64) -> Result<()> {
        (**self).seek(position_ms)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn release(&mut self) {
        (**self).release();
    }

    fn duration_ms(&self) -> i64 {
        (**self).duration_ms()
    }

    fn current_position_ms(&self) -> i64 {
        (**self).current_position_ms()
    }
}

/// Channel back to the controller for one prepare request
///
/// Cheap to clone and safe to move into background tasks. Events sent after
/// the controller moved on to another item are discarded by the controller.
/// Every method returns false once the controller is gone.
#[derive(Debug, Clone)]
pub struct EngineNotifier {
    generation: u64,
    tx: UnboundedSender<EngineEvent>,
}

impl EngineNotifier {
    pub(crate) fn new(generation: u64, tx: UnboundedSender<EngineEvent>) -> Self {
        Self { generation, tx }
    }

    /// Request this notifier belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The source is loaded and ready to play
    pub fn prepared(&self) -> bool {
        self.send(EngineEventKind::Prepared)
    }

    /// The item played to its end
    pub fn completed(&self) -> bool {
        self.send(EngineEventKind::Completed)
    }

    /// The source could not be loaded or decoded
    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.send(EngineEventKind::Error(reason.into()))
    }

    /// The engine itself failed
    pub fn fault(&self, message: impl Into<String>) -> bool {
        self.send(EngineEventKind::Fault(message.into()))
    }

    pub(crate) fn tick(&self) -> bool {
        self.send(EngineEventKind::Tick)
    }

    /// Whether the controller still listens
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, kind: EngineEventKind) -> bool {
        self.tx
            .send(EngineEvent {
                generation: self.generation,
                kind,
            })
            .is_ok()
    }
}
