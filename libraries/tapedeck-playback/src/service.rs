//! Player service
//!
//! Runs one `PlaybackController` on a tokio task. Caller commands and engine
//! events are applied one at a time from the same loop, so the controller
//! never sees two writers. `PlayerHandle` is the cloneable front door.

use crate::{
    controller::{EngineEventReceiver, PlaybackController},
    engine::PlaybackEngine,
    error::{PlaybackError, Result},
    events::PlayerSnapshot,
    listener::{NotificationSink, PlaybackListener},
    types::{AudioItem, PlaybackConfig, RepeatMode},
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pending commands before callers wait on the service
const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Commands sent to the service task
pub enum PlayerCommand {
    /// Replace the playlist
    InitializePlaylist(Vec<AudioItem>, Reply<()>),

    /// Play an item (appended if not queued)
    Play(AudioItem, Reply<()>),

    /// Pause playback
    Pause(Reply<()>),

    /// Resume playback
    Continue(Reply<()>),

    /// Skip to next item
    Next(Reply<()>),

    /// Go to previous item
    Previous(Reply<()>),

    /// Seek to position (ms)
    Seek(i64, Reply<()>),

    /// Add item to queue
    Add(AudioItem, Reply<bool>),

    /// Remove item from queue
    Remove(AudioItem, Reply<bool>),

    /// Set repeat mode
    SetRepeat(RepeatMode),

    /// Enable or disable shuffle
    SetShuffle(bool),

    /// Replace the primary listener
    SetListener(Box<dyn PlaybackListener>),

    /// Replace the notification sink
    SetNotificationSink(Box<dyn NotificationSink>),

    /// Request a snapshot
    Snapshot(oneshot::Sender<PlayerSnapshot>),

    /// Release the engine and drop the playlist
    Kill(oneshot::Sender<()>),

    /// Stop the service task
    Shutdown,
}

/// Task owning a playback controller
pub struct PlayerService<E: PlaybackEngine> {
    controller: PlaybackController<E>,
    events: EngineEventReceiver,
    commands: mpsc::Receiver<PlayerCommand>,
}

impl<E: PlaybackEngine + 'static> PlayerService<E> {
    /// Spawn the service on the current tokio runtime
    ///
    /// The task ends after `PlayerHandle::shutdown` or once every handle is
    /// dropped; the controller is killed on the way out.
    pub fn spawn(engine: E, config: PlaybackConfig) -> (PlayerHandle, JoinHandle<()>) {
        let (controller, events) = PlaybackController::new(engine, config);
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);

        let service = Self {
            controller,
            events,
            commands,
        };
        let task = tokio::spawn(service.run());

        (
            PlayerHandle {
                commands: command_tx,
            },
            task,
        )
    }

    async fn run(mut self) {
        info!("Player service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                Some(event) = self.events.recv() => {
                    if let Err(e) = self.controller.handle_engine_event(event) {
                        warn!(error = %e, "Engine event failed");
                    }
                }
            }
        }

        self.controller.kill();
        info!("Player service stopped");
    }

    fn apply(&mut self, command: PlayerCommand) {
        let controller = &mut self.controller;

        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            PlayerCommand::InitializePlaylist(items, reply) => {
                controller.initialize_playlist(items);
                reply.send(Ok(())).ok();
            }
            PlayerCommand::Play(item, reply) => {
                reply.send(controller.play_audio(item)).ok();
            }
            PlayerCommand::Pause(reply) => {
                reply.send(controller.pause_audio()).ok();
            }
            PlayerCommand::Continue(reply) => {
                reply.send(controller.continue_audio()).ok();
            }
            PlayerCommand::Next(reply) => {
                reply.send(controller.next_audio()).ok();
            }
            PlayerCommand::Previous(reply) => {
                reply.send(controller.previous_audio()).ok();
            }
            PlayerCommand::Seek(position_ms, reply) => {
                reply.send(controller.seek_to(position_ms)).ok();
            }
            PlayerCommand::Add(item, reply) => {
                reply.send(controller.add_audio(item)).ok();
            }
            PlayerCommand::Remove(item, reply) => {
                reply.send(controller.remove_audio(&item)).ok();
            }
            PlayerCommand::SetRepeat(mode) => controller.set_repeat(mode),
            PlayerCommand::SetShuffle(enabled) => controller.set_shuffle(enabled),
            PlayerCommand::SetListener(listener) => {
                controller.set_listener(listener);
            }
            PlayerCommand::SetNotificationSink(sink) => controller.set_notification_sink(sink),
            PlayerCommand::Snapshot(reply) => {
                reply.send(controller.snapshot()).ok();
            }
            PlayerCommand::Kill(reply) => {
                controller.kill();
                reply.send(()).ok();
            }
            PlayerCommand::Shutdown => {
                debug!("Shutdown handled by service loop");
            }
        }
    }
}

/// Cloneable handle to a running player service
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    /// Replace the playlist
    pub async fn initialize_playlist(&self, items: Vec<AudioItem>) -> Result<()> {
        self.request(|reply| PlayerCommand::InitializePlaylist(items, reply))
            .await
    }

    /// Play an item; returns once the engine was asked to prepare it
    pub async fn play(&self, item: AudioItem) -> Result<()> {
        self.request(|reply| PlayerCommand::Play(item, reply)).await
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<()> {
        self.request(PlayerCommand::Pause).await
    }

    /// Resume playback
    pub async fn resume(&self) -> Result<()> {
        self.request(PlayerCommand::Continue).await
    }

    /// Skip to next item
    pub async fn next(&self) -> Result<()> {
        self.request(PlayerCommand::Next).await
    }

    /// Go to previous item
    pub async fn previous(&self) -> Result<()> {
        self.request(PlayerCommand::Previous).await
    }

    /// Seek within the current item
    pub async fn seek(&self, position_ms: i64) -> Result<()> {
        self.request(|reply| PlayerCommand::Seek(position_ms, reply))
            .await
    }

    /// Add an item to the queue
    pub async fn add(&self, item: AudioItem) -> Result<bool> {
        self.request(|reply| PlayerCommand::Add(item, reply)).await
    }

    /// Remove an item from the queue
    pub async fn remove(&self, item: AudioItem) -> Result<bool> {
        self.request(|reply| PlayerCommand::Remove(item, reply)).await
    }

    /// Set repeat mode
    pub async fn set_repeat(&self, mode: RepeatMode) -> Result<()> {
        self.send(PlayerCommand::SetRepeat(mode)).await
    }

    /// Enable or disable shuffle
    pub async fn set_shuffle(&self, enabled: bool) -> Result<()> {
        self.send(PlayerCommand::SetShuffle(enabled)).await
    }

    /// Replace the primary listener
    pub async fn set_listener(&self, listener: Box<dyn PlaybackListener>) -> Result<()> {
        self.send(PlayerCommand::SetListener(listener)).await
    }

    /// Replace the notification sink
    pub async fn set_notification_sink(&self, sink: Box<dyn NotificationSink>) -> Result<()> {
        self.send(PlayerCommand::SetNotificationSink(sink)).await
    }

    /// Current player snapshot
    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(PlayerCommand::Snapshot(reply)).await?;
        response.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Release the engine and drop the playlist
    pub async fn kill(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(PlayerCommand::Kill(reply)).await?;
        response.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Stop the service task
    pub async fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown).await
    }

    /// Whether the service task is gone
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> PlayerCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| PlaybackError::ServiceClosed)?
    }

    async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::ServiceClosed)
    }
}
