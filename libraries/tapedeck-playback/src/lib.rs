//! Tapedeck - Playback Queue Control
//!
//! Platform-agnostic playback-queue controller for sequential audio.
//!
//! This crate provides:
//! - Ordered queue with stable ids and zero-based positions
//! - Playback state machine (Idle, Preparing, Playing, Paused, Completed)
//! - Next/previous navigation without wrap-around (repeat-all opt-in)
//! - Repeat modes (Off, All, One) and shuffle
//! - Periodic position updates tied to the active item
//! - Listener callbacks and notification snapshots
//! - A tokio service that serializes concurrent callers
//!
//! # Architecture
//!
//! `tapedeck-playback` never decodes audio. The platform supplies a
//! [`PlaybackEngine`] that loads and plays sources and reports back through
//! an [`EngineNotifier`]. The controller turns those reports into listener
//! callbacks.
//!
//! # Example: Driving the controller by hand
//!
//! ```rust
//! use tapedeck_playback::{
//!     AudioItem, ControllerState, EngineNotifier, PlaybackConfig, PlaybackController,
//!     PlaybackEngine, Result,
//! };
//!
//! // Engine that loads instantly
//! #[derive(Default)]
//! struct InstantEngine {
//!     notifier: Option<EngineNotifier>,
//! }
//!
//! impl PlaybackEngine for InstantEngine {
//!     fn prepare(&mut self, _item: &AudioItem, notifier: EngineNotifier) -> Result<()> {
//!         notifier.prepared();
//!         self.notifier = Some(notifier);
//!         Ok(())
//!     }
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) -> Result<()> { Ok(()) }
//!     fn seek(&mut self, _position_ms: i64) -> Result<()> { Ok(()) }
//!     fn stop(&mut self) -> Result<()> { Ok(()) }
//!     fn release(&mut self) {}
//!     fn duration_ms(&self) -> i64 { 180_000 }
//!     fn current_position_ms(&self) -> i64 { 0 }
//! }
//!
//! let (mut controller, mut events) =
//!     PlaybackController::new(InstantEngine::default(), PlaybackConfig::default());
//!
//! controller.initialize_playlist(vec![
//!     AudioItem::new("Intro", "/music/intro.mp3"),
//!     AudioItem::new("Outro", "/music/outro.mp3"),
//! ]);
//!
//! let first = controller.queue()[0].clone();
//! controller.play_audio(first)?;
//! assert_eq!(controller.state(), ControllerState::Preparing);
//!
//! // Apply the engine's "prepared" report
//! controller.process_pending(&mut events);
//! assert_eq!(controller.state(), ControllerState::Playing);
//! # Ok::<(), tapedeck_playback::PlaybackError>(())
//! ```
//!
//! # Example: Shared service
//!
//! ```rust,no_run
//! # use tapedeck_playback::{PlaybackConfig, PlaybackEngine, PlayerService, AudioItem};
//! # async fn demo(engine: impl PlaybackEngine + 'static) -> tapedeck_playback::Result<()> {
//! let (player, _task) = PlayerService::spawn(engine, PlaybackConfig::default());
//!
//! player
//!     .initialize_playlist(vec![AudioItem::new("Song", "https://example.com/song.mp3")])
//!     .await?;
//! let snapshot = player.snapshot().await?;
//! player.play(snapshot.queue[0].clone()).await?;
//! player.pause().await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod engine;
mod error;
pub mod events;
mod listener;
mod queue;
mod service;
pub mod shuffle;
mod ticker;
pub mod types;

// Public exports
pub use controller::{EngineEventReceiver, PlaybackController};
pub use engine::{EngineNotifier, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::{EngineEvent, EngineEventKind, PlaybackStatus, PlayerSnapshot};
pub use listener::{NotificationSink, PlaybackListener};
pub use queue::Queue;
pub use service::{PlayerCommand, PlayerHandle, PlayerService};
pub use shuffle::ShuffleOrder;
pub use ticker::Ticker;
pub use types::{
    AudioItem, AudioOrigin, ControllerState, PlaybackConfig, RepeatMode, UNASSIGNED_POSITION,
};
