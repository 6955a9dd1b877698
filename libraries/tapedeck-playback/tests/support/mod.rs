//! Shared test infrastructure: scripted engine, recording listener and sink
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tapedeck_playback::{
    AudioItem, ControllerState, EngineEventReceiver, EngineNotifier, NotificationSink,
    PlaybackConfig, PlaybackController, PlaybackEngine, PlaybackError, PlaybackListener,
    PlaybackStatus, PlayerSnapshot, Result,
};

// ============================================================================
// Scripted engine
// ============================================================================

/// Engine primitive invoked by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Prepare(String),
    Play,
    Pause,
    Resume,
    Seek(i64),
    Stop,
    Release,
}

#[derive(Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    notifiers: Vec<EngineNotifier>,
    duration_ms: i64,
    position_ms: i64,
    rejected_urls: HashSet<String>,
    fail_play: bool,
}

/// Engine that records every call and only reports what the test tells it to
pub struct MockEngine {
    state: Arc<Mutex<EngineState>>,
}

/// Test-side remote control for a `MockEngine`
#[derive(Clone)]
pub struct EngineRemote {
    state: Arc<Mutex<EngineState>>,
}

impl MockEngine {
    pub fn new() -> (Self, EngineRemote) {
        let state = Arc::new(Mutex::new(EngineState {
            duration_ms: 180_000,
            ..EngineState::default()
        }));
        (
            Self {
                state: state.clone(),
            },
            EngineRemote { state },
        )
    }
}

impl PlaybackEngine for MockEngine {
    fn prepare(&mut self, item: &AudioItem, notifier: EngineNotifier) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Prepare(item.url.clone()));
        state.position_ms = 0;
        state.notifiers.push(notifier);

        if state.rejected_urls.contains(&item.url) {
            return Err(PlaybackError::EngineFault("unsupported container".into()));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Play);
        if state.fail_play {
            return Err(PlaybackError::EngineFault("output device lost".into()));
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Resume);
        Ok(())
    }

    fn seek(&mut self, position_ms: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Seek(position_ms));
        state.position_ms = position_ms;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Stop);
        Ok(())
    }

    fn release(&mut self) {
        self.state.lock().unwrap().calls.push(EngineCall::Release);
    }

    fn duration_ms(&self) -> i64 {
        self.state.lock().unwrap().duration_ms
    }

    fn current_position_ms(&self) -> i64 {
        self.state.lock().unwrap().position_ms
    }
}

impl EngineRemote {
    fn latest(&self) -> EngineNotifier {
        self.state
            .lock()
            .unwrap()
            .notifiers
            .last()
            .cloned()
            .expect("no prepare request yet")
    }

    /// Whether the controller asked for any item yet
    pub fn has_requests(&self) -> bool {
        !self.state.lock().unwrap().notifiers.is_empty()
    }

    /// Request generation of the latest prepare
    pub fn generation(&self) -> u64 {
        self.latest().generation()
    }

    /// Notifier handed out with the n-th prepare request
    pub fn notifier(&self, index: usize) -> EngineNotifier {
        self.state.lock().unwrap().notifiers[index].clone()
    }

    /// Report the latest request as prepared
    pub fn prepared(&self) {
        assert!(self.latest().prepared());
    }

    /// Report the latest request as prepared with a duration
    pub fn prepared_with_duration(&self, duration_ms: i64) {
        self.set_duration(duration_ms);
        self.prepared();
    }

    /// Report the latest request as played to the end
    pub fn completed(&self) {
        assert!(self.latest().completed());
    }

    /// Report the latest request's source as unusable
    pub fn error(&self, reason: &str) {
        assert!(self.latest().error(reason));
    }

    /// Report an engine failure
    pub fn fault(&self, message: &str) {
        assert!(self.latest().fault(message));
    }

    pub fn set_duration(&self, duration_ms: i64) {
        self.state.lock().unwrap().duration_ms = duration_ms;
    }

    pub fn set_position(&self, position_ms: i64) {
        self.state.lock().unwrap().position_ms = position_ms;
    }

    /// Make `prepare` fail synchronously for a locator
    pub fn reject(&self, url: &str) {
        self.state.lock().unwrap().rejected_urls.insert(url.to_string());
    }

    pub fn fail_play(&self) {
        self.state.lock().unwrap().fail_play = true;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn prepared_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Prepare(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

// ============================================================================
// Recording listener and sink
// ============================================================================

/// Listener callback as observed by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    Prepared(PlaybackStatus),
    Playing(PlaybackStatus),
    Paused(PlaybackStatus),
    Continued(PlaybackStatus),
    Completed,
    TimeChanged(PlaybackStatus),
    Stopped,
    EngineError(PlaybackError),
    PathError(AudioItem),
}

#[derive(Clone, Default)]
pub struct RecordingListener {
    pub log: Arc<Mutex<Vec<Callback>>>,
}

impl RecordingListener {
    fn record(&self, callback: Callback) {
        self.log.lock().unwrap().push(callback);
    }
}

impl PlaybackListener for RecordingListener {
    fn on_prepared_audio(&mut self, status: &PlaybackStatus) {
        self.record(Callback::Prepared(status.clone()));
    }

    fn on_playing(&mut self, status: &PlaybackStatus) {
        self.record(Callback::Playing(status.clone()));
    }

    fn on_paused(&mut self, status: &PlaybackStatus) {
        self.record(Callback::Paused(status.clone()));
    }

    fn on_continue_audio(&mut self, status: &PlaybackStatus) {
        self.record(Callback::Continued(status.clone()));
    }

    fn on_completed_audio(&mut self) {
        self.record(Callback::Completed);
    }

    fn on_time_changed(&mut self, status: &PlaybackStatus) {
        self.record(Callback::TimeChanged(status.clone()));
    }

    fn on_stopped(&mut self) {
        self.record(Callback::Stopped);
    }

    fn on_engine_error(&mut self, error: &PlaybackError) {
        self.record(Callback::EngineError(error.clone()));
    }

    fn on_path_error(&mut self, item: &AudioItem) {
        self.record(Callback::PathError(item.clone()));
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub snapshots: Arc<Mutex<Vec<PlayerSnapshot>>>,
}

impl NotificationSink for RecordingSink {
    fn update(&mut self, snapshot: &PlayerSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn create_test_item(name: &str) -> AudioItem {
    AudioItem::new(name, format!("/music/{}.mp3", name))
}

pub fn create_test_items(names: &[&str]) -> Vec<AudioItem> {
    names.iter().map(|name| create_test_item(name)).collect()
}

/// Controller wired to a scripted engine, a recording listener and sink
pub struct Harness {
    pub controller: PlaybackController<MockEngine>,
    pub events: EngineEventReceiver,
    pub engine: EngineRemote,
    pub listener: RecordingListener,
    pub sink: RecordingSink,
}

impl Harness {
    pub fn new(names: &[&str]) -> Self {
        Self::with_config(names, PlaybackConfig::default())
    }

    pub fn with_config(names: &[&str], config: PlaybackConfig) -> Self {
        let (engine, remote) = MockEngine::new();
        let (mut controller, events) = PlaybackController::new(engine, config);

        let listener = RecordingListener::default();
        let sink = RecordingSink::default();
        controller.set_listener(Box::new(listener.clone()));
        controller.set_notification_sink(Box::new(sink.clone()));
        controller.initialize_playlist(create_test_items(names));

        let harness = Self {
            controller,
            events,
            engine: remote,
            listener,
            sink,
        };
        harness.clear_records();
        harness
    }

    /// Apply every engine event waiting in the channel
    pub fn pump(&mut self) -> usize {
        self.controller.process_pending(&mut self.events)
    }

    /// Queued item at index
    pub fn item(&self, index: usize) -> AudioItem {
        self.controller.queue()[index].clone()
    }

    /// Play the item at index and let the engine report it prepared
    pub fn start_playing(&mut self, index: usize) {
        let item = self.item(index);
        self.controller.play_audio(item).unwrap();
        self.engine.prepared();
        self.pump();
        assert_eq!(self.controller.state(), ControllerState::Playing);
    }

    pub fn callbacks(&self) -> Vec<Callback> {
        self.listener.log.lock().unwrap().clone()
    }

    /// State sequence published to the notification sink (deduplicated)
    pub fn states(&self) -> Vec<ControllerState> {
        let mut states: Vec<ControllerState> = Vec::new();
        for snapshot in self.sink.snapshots.lock().unwrap().iter() {
            if states.last() != Some(&snapshot.state) {
                states.push(snapshot.state);
            }
        }
        states
    }

    pub fn clear_records(&self) {
        self.listener.log.lock().unwrap().clear();
        self.sink.snapshots.lock().unwrap().clear();
        self.engine.clear_calls();
    }
}
