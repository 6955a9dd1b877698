/// Simulated playback engine
///
/// Stands in for a platform player: loading takes `prepare_delay_ms`, every
/// item lasts `track_length_ms`, and the position follows the tokio clock.
/// Local files that do not exist fail to load, everything else succeeds.
use crate::config::EngineSettings;
use std::path::Path;
use std::time::Duration;
use tapedeck_playback::{
    AudioItem, AudioOrigin, EngineNotifier, PlaybackEngine, PlaybackError, Result,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct Clock {
    base_ms: i64,
    started: Option<Instant>,
}

impl Clock {
    fn position_ms(&self) -> i64 {
        let running = self
            .started
            .map_or(0, |started| started.elapsed().as_millis() as i64);
        self.base_ms + running
    }

    fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn freeze(&mut self) {
        self.base_ms = self.position_ms();
        self.started = None;
    }

    fn set(&mut self, position_ms: i64) {
        self.base_ms = position_ms;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }
}

pub struct SimulatedEngine {
    settings: EngineSettings,
    notifier: Option<EngineNotifier>,
    ready: bool,
    clock: Clock,
    prepare_task: Option<JoinHandle<()>>,
    completion_task: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            notifier: None,
            ready: false,
            clock: Clock::default(),
            prepare_task: None,
            completion_task: None,
        }
    }

    fn length_ms(&self) -> i64 {
        self.settings.track_length_ms as i64
    }

    fn cancel_tasks(&mut self) {
        for task in [self.prepare_task.take(), self.completion_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }

    fn start_output(&mut self) -> Result<()> {
        if !self.ready {
            return Err(PlaybackError::EngineFault("no item prepared".to_string()));
        }
        let notifier = self
            .notifier
            .clone()
            .ok_or_else(|| PlaybackError::EngineFault("no item prepared".to_string()))?;
        let runtime = runtime()?;

        self.clock.start();
        let remaining = (self.length_ms() - self.clock.position_ms()).max(0) as u64;

        if let Some(task) = self.completion_task.take() {
            task.abort();
        }
        self.completion_task = Some(runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(remaining)).await;
            notifier.completed();
        }));
        Ok(())
    }
}

impl PlaybackEngine for SimulatedEngine {
    fn prepare(&mut self, item: &AudioItem, notifier: EngineNotifier) -> Result<()> {
        let runtime = runtime()?;
        self.cancel_tasks();
        self.clock = Clock::default();
        self.ready = false;

        let missing = item.origin() == AudioOrigin::File && !local_path(&item.url).exists();
        let delay = Duration::from_millis(self.settings.prepare_delay_ms);
        let url = item.url.clone();

        let task_notifier = notifier.clone();
        self.prepare_task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if missing {
                task_notifier.error(format!("file not found: {}", url));
            } else {
                task_notifier.prepared();
            }
        }));

        // The controller only calls play/seek after the prepared event.
        self.ready = !missing;
        self.notifier = Some(notifier);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.start_output()
    }

    fn pause(&mut self) -> Result<()> {
        self.clock.freeze();
        if let Some(task) = self.completion_task.take() {
            task.abort();
        }
        Ok(())
    }

    fn seek(&mut self, position_ms: i64) -> Result<()> {
        self.clock.set(position_ms.clamp(0, self.length_ms()));
        if self.completion_task.is_some() {
            self.start_output()?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.cancel_tasks();
        self.clock = Clock::default();
        self.ready = false;
        self.notifier = None;
        Ok(())
    }

    fn release(&mut self) {
        self.cancel_tasks();
        self.notifier = None;
        self.ready = false;
    }

    fn duration_ms(&self) -> i64 {
        if self.ready {
            self.length_ms()
        } else {
            0
        }
    }

    fn current_position_ms(&self) -> i64 {
        self.clock.position_ms().min(self.length_ms())
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.cancel_tasks();
    }
}

fn runtime() -> Result<Handle> {
    Handle::try_current()
        .map_err(|_| PlaybackError::EngineFault("simulated engine needs a tokio runtime".into()))
}

fn local_path(url: &str) -> &Path {
    Path::new(url.strip_prefix("file://").unwrap_or(url))
}
