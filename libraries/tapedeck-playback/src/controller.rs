//! Playback controller - core state machine
//!
//! Owns the queue, the engine and the controller state. Transitions are
//! synchronous and return as soon as the engine was instructed; outcomes
//! arrive later as `EngineEvent`s fed back through `handle_engine_event`.
//!
//! ```text
//!            play            prepared
//!   Idle ──────────▶ Preparing ──────────▶ Playing ◀──────▶ Paused
//!    ▲                  │                     │      pause/continue
//!    │   error / remove │            completed│
//!    └──────────────────┘                     ▼
//!                                         Completed ──(next)──▶ Preparing
//! ```

use crate::{
    engine::{EngineNotifier, PlaybackEngine},
    error::{PlaybackError, Result},
    events::{EngineEvent, EngineEventKind, PlaybackStatus, PlayerSnapshot},
    listener::{NotificationSink, PlaybackListener},
    queue::Queue,
    shuffle::ShuffleOrder,
    ticker::Ticker,
    types::{AudioItem, ControllerState, PlaybackConfig, RepeatMode},
};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Receiving end of the engine event channel
///
/// Whoever drives the controller pulls events from here and hands them to
/// `PlaybackController::handle_engine_event`.
pub type EngineEventReceiver = UnboundedReceiver<EngineEvent>;

/// Central playback control
///
/// Single writer: every transition takes `&mut self`. Use
/// [`PlayerService`](crate::PlayerService) to share one controller between
/// concurrent callers.
pub struct PlaybackController<E: PlaybackEngine> {
    // State
    state: ControllerState,
    current: Option<AudioItem>,
    status: Option<PlaybackStatus>,
    engine_started: bool,
    released: bool,

    // Queue and engine
    queue: Queue,
    engine: E,

    // Settings
    repeat: RepeatMode,
    shuffle: bool,
    shuffle_order: ShuffleOrder,

    // Observers
    listener: Option<Box<dyn PlaybackListener>>,
    notification_sink: Option<Box<dyn NotificationSink>>,

    // Engine event plumbing
    generation: u64,
    events_tx: UnboundedSender<EngineEvent>,
    ticker: Ticker,
}

impl<E: PlaybackEngine> PlaybackController<E> {
    /// Create a controller around an engine
    ///
    /// Returns the controller and the receiver its engine events arrive on.
    pub fn new(engine: E, config: PlaybackConfig) -> (Self, EngineEventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            state: ControllerState::Idle,
            current: None,
            status: None,
            engine_started: false,
            released: false,
            queue: Queue::new(),
            engine,
            repeat: config.repeat,
            shuffle: config.shuffle,
            shuffle_order: ShuffleOrder::new(),
            listener: None,
            notification_sink: None,
            generation: 0,
            events_tx,
            ticker: Ticker::new(Duration::from_millis(config.tick_interval_ms)),
        };

        (controller, events_rx)
    }

    // ===== Playlist =====

    /// Replace the queue with a new playlist
    ///
    /// Playlists whose first item already carries a position are restored as
    /// they are; otherwise items are numbered in the given order. Stops any
    /// active item and re-arms a killed controller.
    pub fn initialize_playlist(&mut self, items: Vec<AudioItem>) {
        let already_sorted = Queue::is_presorted(&items);

        if self.current.is_some() || self.state != ControllerState::Idle {
            self.halt_engine();
        }
        self.invalidate_request();
        self.current = None;
        self.status = None;
        self.released = false;

        self.queue.initialize(items, already_sorted);
        self.reshuffle();
        info!(
            items = self.queue.len(),
            already_sorted, "Playlist initialized"
        );
        self.set_state(ControllerState::Idle);
    }

    /// Append an item to the queue
    ///
    /// Returns false if an equal item is already queued.
    pub fn add_audio(&mut self, item: AudioItem) -> Result<bool> {
        self.ensure_alive()?;

        let added = self.queue.add(item);
        if added {
            if self.shuffle {
                if let Some(last) = self.queue.last() {
                    self.shuffle_order.insert(last.id);
                }
            }
            debug!(len = self.queue.len(), "Item added to queue");
            self.publish();
        }
        Ok(added)
    }

    /// Remove an item from the queue
    ///
    /// Removing the current item resets playback: with other items left a
    /// playing engine is paused, while a loading or emptied one is stopped.
    /// Either way no item stays selected. Returns false if the item was not
    /// queued.
    pub fn remove_audio(&mut self, item: &AudioItem) -> Result<bool> {
        self.ensure_alive()?;

        if !self.queue.contains(item) {
            return Ok(false);
        }

        let is_current = self.current.as_ref() == Some(item);
        let was_last = self.queue.len() == 1;
        self.queue.remove(item);
        self.shuffle_order.remove(item.id);

        if !is_current {
            debug!(item_id = item.id, "Removed queued item");
            self.refresh_current();
            self.publish();
            return Ok(true);
        }

        let loading = match self.state {
            ControllerState::Preparing => true,
            ControllerState::Paused => self.status.is_none(),
            _ => false,
        };
        self.invalidate_request();
        if was_last || loading {
            self.halt_engine();
        } else if let Err(e) = self.engine.pause() {
            warn!(error = %e, "Engine failed to pause while removing current item");
        }

        info!(item_id = item.id, "Removed current item, playback reset");
        self.current = None;
        self.status = None;
        self.set_state(ControllerState::Idle);
        self.notify(|listener| listener.on_stopped());
        Ok(true)
    }

    // ===== Playback Control =====

    /// Play an item, appending it to the queue if needed
    ///
    /// Returns once the engine was asked to prepare the item. The outcome is
    /// reported through the listener: `on_prepared_audio` + `on_playing`, or
    /// `on_path_error` for a source the engine cannot load.
    pub fn play_audio(&mut self, item: AudioItem) -> Result<()> {
        self.ensure_alive()?;

        let target = match self.queue.index_of(&item) {
            Some(index) => self.queue.get(index).cloned(),
            None => {
                self.queue.add(item);
                self.queue.last().cloned()
            }
        }
        .ok_or(PlaybackError::EmptyQueue)?;

        if self.current.as_ref() == Some(&target) {
            match self.state {
                ControllerState::Paused => return self.continue_audio(),
                ControllerState::Playing | ControllerState::Preparing => {
                    debug!(item_id = target.id, "Item already active");
                    return Ok(());
                }
                ControllerState::Idle | ControllerState::Completed => {}
            }
        }

        // A picked item starts a new shuffle pass
        self.reshuffle_without(Some(target.id));
        self.start_item(target);
        Ok(())
    }

    /// Pause playback
    ///
    /// Pausing while the engine is still loading holds the item once it is
    /// prepared. Pausing a paused controller is a no-op.
    pub fn pause_audio(&mut self) -> Result<()> {
        self.ensure_alive()?;

        match self.state {
            ControllerState::Playing => {
                self.engine.pause().map_err(|e| self.engine_fault(e))?;
            }
            ControllerState::Preparing => {
                debug!("Pause requested while preparing, holding item");
            }
            ControllerState::Paused => return Ok(()),
            _ if self.current.is_none() => return Err(PlaybackError::NoActiveAudio),
            other => {
                debug!(state = ?other, "Pause ignored");
                return Ok(());
            }
        }

        self.ticker.cancel();
        self.set_state(ControllerState::Paused);

        if let Some(status) = self.current_status() {
            self.notify(|listener| listener.on_paused(&status));
        }
        Ok(())
    }

    /// Resume the current item
    ///
    /// From `Paused` the engine resumes; from `Idle`/`Completed` the current
    /// item is prepared again.
    pub fn continue_audio(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let item = self.current.clone().ok_or(PlaybackError::NoActiveAudio)?;

        match self.state {
            ControllerState::Paused if self.status.is_none() => {
                // Still loading: the prepared event starts playback.
                self.set_state(ControllerState::Preparing);
                Ok(())
            }
            ControllerState::Paused => {
                let resumed = if self.engine_started {
                    self.engine.resume()
                } else {
                    self.engine.play()
                };
                resumed.map_err(|e| self.engine_fault(e))?;
                self.engine_started = true;
                self.set_state(ControllerState::Playing);
                self.start_ticker();

                if let Some(status) = self.current_status() {
                    self.notify(|listener| listener.on_continue_audio(&status));
                }
                Ok(())
            }
            ControllerState::Playing | ControllerState::Preparing => Ok(()),
            ControllerState::Idle | ControllerState::Completed => {
                self.start_item(item);
                Ok(())
            }
        }
    }

    /// Play the item after the current one
    ///
    /// Fails with `EmptyQueue` when the current item is the last one, unless
    /// repeat-all wraps to the start. With shuffle on, "last" means the end
    /// of the current shuffle pass.
    pub fn next_audio(&mut self) -> Result<()> {
        let index = self.current_index()?;

        let target = if self.shuffle {
            self.next_shuffled(index)
        } else {
            self.queue
                .next_index(index)
                .or_else(|| (self.repeat == RepeatMode::All).then_some(0))
        }
        .ok_or(PlaybackError::EmptyQueue)?;

        self.play_index(target)
    }

    /// Play the item before the current one
    ///
    /// Fails with `EmptyQueue` at the first item, unless repeat-all wraps to
    /// the end.
    pub fn previous_audio(&mut self) -> Result<()> {
        let index = self.current_index()?;

        let last = self.queue.len() - 1;
        let target = self
            .queue
            .previous_index(index)
            .or_else(|| (self.repeat == RepeatMode::All).then_some(last))
            .ok_or(PlaybackError::EmptyQueue)?;

        self.play_index(target)
    }

    /// Seek within the prepared item
    ///
    /// The position is clamped to the item's duration when it is known.
    pub fn seek_to(&mut self, position_ms: i64) -> Result<()> {
        self.ensure_alive()?;
        if !self.state.has_prepared_item() || self.status.is_none() {
            return Err(PlaybackError::NoActiveAudio);
        }

        let duration_ms = self.engine.duration_ms();
        let mut target = position_ms.max(0);
        if duration_ms > 0 {
            target = target.min(duration_ms);
        }

        self.engine.seek(target).map_err(|e| self.engine_fault(e))?;
        debug!(position_ms = target, "Seek");

        if let Some(status) = self.status.as_ref().map(|s| s.at_position(target)) {
            self.status = Some(status.clone());
            self.notify(|listener| listener.on_time_changed(&status));
        }
        Ok(())
    }

    /// Release the engine and drop the playlist
    ///
    /// Reports `on_stopped` if an item was selected. Further transitions fail with `Released` until a new playlist is
    /// initialized.
    pub fn kill(&mut self) {
        if self.released {
            return;
        }

        let was_active = self.current.is_some();
        self.invalidate_request();
        self.engine.release();
        self.queue.clear();
        self.shuffle_order.clear();
        self.current = None;
        self.status = None;
        self.released = true;
        info!("Playback controller released");
        self.set_state(ControllerState::Idle);

        if was_active {
            self.notify(|listener| listener.on_stopped());
        }
    }

    // ===== Engine Events =====

    /// Apply one engine event
    ///
    /// Events from a superseded request are dropped. Errors returned here
    /// are engine faults that were also reported to the listener.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Result<()> {
        if self.released || event.generation != self.generation {
            debug!(
                event_generation = event.generation,
                generation = self.generation,
                kind = ?event.kind,
                "Dropping stale engine event"
            );
            return Ok(());
        }

        match event.kind {
            EngineEventKind::Prepared => self.on_prepared(),
            EngineEventKind::Completed => self.on_completed(),
            EngineEventKind::Error(reason) => {
                self.on_source_error(&reason);
                Ok(())
            }
            EngineEventKind::Fault(message) => {
                Err(self.engine_fault(PlaybackError::EngineFault(message)))
            }
            EngineEventKind::Tick => {
                self.on_tick();
                Ok(())
            }
        }
    }

    /// Drain and apply every event already waiting on `events`
    ///
    /// Returns the number of events applied.
    pub fn process_pending(&mut self, events: &mut EngineEventReceiver) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            if let Err(e) = self.handle_engine_event(event) {
                warn!(error = %e, "Engine event failed");
            }
            applied += 1;
        }
        applied
    }

    fn on_prepared(&mut self) -> Result<()> {
        let Some(item) = self.current.clone() else {
            return Ok(());
        };

        match self.state {
            ControllerState::Preparing => {}
            ControllerState::Paused if self.status.is_none() => {
                let status = PlaybackStatus::new(item, self.engine.duration_ms().max(0), 0);
                debug!(item_id = status.audio_item.id, "Prepared while paused");
                self.status = Some(status.clone());
                self.publish();
                self.notify(|listener| listener.on_prepared_audio(&status));
                return Ok(());
            }
            other => {
                debug!(state = ?other, "Prepared event ignored");
                return Ok(());
            }
        }

        self.engine.play().map_err(|e| self.engine_fault(e))?;
        self.engine_started = true;

        let status = PlaybackStatus::new(item, self.engine.duration_ms().max(0), 0);
        info!(
            item_id = status.audio_item.id,
            duration_ms = status.duration_ms,
            "Playing"
        );
        self.status = Some(status.clone());
        self.set_state(ControllerState::Playing);
        self.notify(|listener| {
            listener.on_prepared_audio(&status);
            listener.on_playing(&status);
        });
        self.start_ticker();
        Ok(())
    }

    fn on_completed(&mut self) -> Result<()> {
        if !self.state.has_prepared_item() {
            debug!(state = ?self.state, "Completed event ignored");
            return Ok(());
        }

        self.ticker.cancel();
        self.status = None;
        self.set_state(ControllerState::Completed);
        self.notify(|listener| listener.on_completed_audio());

        if self.repeat == RepeatMode::One {
            if let Some(item) = self.current.clone() {
                self.start_item(item);
                return Ok(());
            }
        }

        match self.next_audio() {
            Ok(()) => Ok(()),
            Err(PlaybackError::EmptyQueue | PlaybackError::NoActiveAudio) => {
                info!("Reached end of queue");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn on_source_error(&mut self, reason: &str) {
        let Some(item) = self.current.clone() else {
            return;
        };

        let error = PlaybackError::InvalidSource {
            id: item.id,
            url: item.url.clone(),
            reason: reason.to_string(),
        };
        warn!(error = %error, "Audio source rejected");

        self.invalidate_request();
        self.halt_engine();
        self.status = None;
        self.set_state(ControllerState::Idle);
        self.notify(|listener| listener.on_path_error(&item));
    }

    fn on_tick(&mut self) {
        if self.state != ControllerState::Playing {
            return;
        }

        let position_ms = self.engine.current_position_ms();
        if let Some(status) = self.status.as_ref().map(|s| s.at_position(position_ms)) {
            self.status = Some(status.clone());
            self.notify(|listener| listener.on_time_changed(&status));
        }
    }

    // ===== Settings =====

    /// Set the primary listener, returning the one it replaces
    pub fn set_listener(
        &mut self,
        listener: Box<dyn PlaybackListener>,
    ) -> Option<Box<dyn PlaybackListener>> {
        self.listener.replace(listener)
    }

    /// Remove the primary listener
    pub fn clear_listener(&mut self) -> Option<Box<dyn PlaybackListener>> {
        self.listener.take()
    }

    /// Set the notification sink and push the current snapshot to it
    pub fn set_notification_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.notification_sink = Some(sink);
        self.publish();
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
        self.publish();
    }

    /// Get repeat mode
    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Enable or disable shuffle
    ///
    /// Enabling starts a shuffle pass over every item but the current one.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle != enabled {
            self.shuffle = enabled;
            self.reshuffle();
        }
        self.publish();
    }

    /// Item ids left in the current shuffle pass, next first
    pub fn shuffle_order(&self) -> &[i64] {
        self.shuffle_order.remaining()
    }

    /// Whether shuffle is enabled
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    // ===== State Queries =====

    /// Current controller state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Selected item
    pub fn current_audio(&self) -> Option<&AudioItem> {
        self.current.as_ref()
    }

    /// Last emitted status
    pub fn status(&self) -> Option<&PlaybackStatus> {
        self.status.as_ref()
    }

    /// Queue in play order
    pub fn queue(&self) -> &[AudioItem] {
        self.queue.items()
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.state == ControllerState::Playing
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.state == ControllerState::Paused
    }

    /// Whether `kill` was called since the last playlist
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Whether a position ticker is running
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Snapshot for notification rendering
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state,
            current: self.current.clone(),
            queue: self.queue.items().to_vec(),
            status: self.status.clone(),
            repeat: self.repeat,
            shuffle: self.shuffle,
        }
    }

    /// Borrow the engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutably borrow the engine
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // ===== Internals =====

    fn ensure_alive(&self) -> Result<()> {
        if self.released {
            Err(PlaybackError::Released)
        } else {
            Ok(())
        }
    }

    fn current_index(&self) -> Result<usize> {
        self.ensure_alive()?;
        if self.queue.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }

        let current = self.current.as_ref().ok_or(PlaybackError::NoActiveAudio)?;
        self.queue
            .index_of(current)
            .ok_or(PlaybackError::NoActiveAudio)
    }

    /// Next queue index of the shuffle pass
    ///
    /// With repeat-all an exhausted pass is followed by a fresh one.
    fn next_shuffled(&mut self, index: usize) -> Option<usize> {
        if self.shuffle_order.is_empty() && self.repeat == RepeatMode::All {
            self.reshuffle();
        }

        match self.shuffle_order.pop_next() {
            Some(id) => self.queue.iter().position(|item| item.id == id),
            None => (self.repeat == RepeatMode::All).then_some(index),
        }
    }

    /// Rebuild the shuffle pass around the selected item
    fn reshuffle(&mut self) {
        self.reshuffle_without(self.current.as_ref().map(|item| item.id));
    }

    /// Rebuild the shuffle pass, or drop it when shuffle is off
    fn reshuffle_without(&mut self, playing: Option<i64>) {
        if !self.shuffle {
            self.shuffle_order.clear();
            return;
        }
        self.shuffle_order
            .reshuffle(self.queue.iter().map(|item| item.id), playing);
    }

    /// Re-read the selected item after the queue renumbered
    fn refresh_current(&mut self) {
        let Some(item) = self
            .current
            .as_ref()
            .and_then(|current| self.queue.index_of(current))
            .and_then(|index| self.queue.get(index))
            .cloned()
        else {
            return;
        };

        if let Some(status) = self.status.as_mut() {
            status.audio_item = item.clone();
        }
        self.current = Some(item);
    }

    fn play_index(&mut self, index: usize) -> Result<()> {
        let item = self
            .queue
            .get(index)
            .cloned()
            .ok_or(PlaybackError::EmptyQueue)?;
        self.start_item(item);
        Ok(())
    }

    /// Select an item and ask the engine to load it
    fn start_item(&mut self, item: AudioItem) {
        self.invalidate_request();
        self.current = Some(item.clone());
        self.status = None;
        self.engine_started = false;

        info!(item_id = item.id, url = %item.url, "Preparing");
        self.set_state(ControllerState::Preparing);

        let notifier = EngineNotifier::new(self.generation, self.events_tx.clone());
        if let Err(e) = self.engine.prepare(&item, notifier) {
            self.on_source_error(&e.to_string());
        }
    }

    /// Start a new request generation, orphaning the previous one's events
    fn invalidate_request(&mut self) {
        self.ticker.cancel();
        self.generation = self.generation.wrapping_add(1);
    }

    fn start_ticker(&mut self) {
        let notifier = EngineNotifier::new(self.generation, self.events_tx.clone());
        self.ticker.start(notifier);
    }

    fn halt_engine(&mut self) {
        self.engine_started = false;
        if let Err(e) = self.engine.stop() {
            warn!(error = %e, "Engine failed to stop");
        }
    }

    /// Status of the current item, rebuilt from the engine if none was emitted
    fn current_status(&self) -> Option<PlaybackStatus> {
        if let Some(status) = &self.status {
            return Some(status.clone());
        }
        self.current.as_ref().map(|item| {
            PlaybackStatus::new(
                item.clone(),
                self.engine.duration_ms().max(0),
                self.engine.current_position_ms(),
            )
        })
    }

    /// Reset after an engine failure and report it
    fn engine_fault(&mut self, error: PlaybackError) -> PlaybackError {
        let error = match error {
            PlaybackError::EngineFault(_) => error,
            other => PlaybackError::EngineFault(other.to_string()),
        };
        warn!(error = %error, "Engine fault");

        self.invalidate_request();
        self.halt_engine();
        self.status = None;
        self.set_state(ControllerState::Idle);
        self.notify(|listener| listener.on_engine_error(&error));
        error
    }

    fn set_state(&mut self, state: ControllerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "State change");
            self.state = state;
        }
        self.publish();
    }

    fn publish(&mut self) {
        if self.notification_sink.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(sink) = self.notification_sink.as_deref_mut() {
            sink.update(&snapshot);
        }
    }

    fn notify(&mut self, f: impl FnOnce(&mut dyn PlaybackListener)) {
        if let Some(listener) = self.listener.as_deref_mut() {
            f(listener);
        }
    }
}
