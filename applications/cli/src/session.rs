/// Console playback session
///
/// Plays a queue from a start index until it runs out, skipping items whose
/// source cannot be loaded.
use crate::console::{render_status, ConsoleListener, ConsoleSink, Notice};
use crate::error::{CliError, Result};
use std::future::Future;
use tapedeck_playback::{AudioItem, ControllerState, PlaybackError, PlayerHandle};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// How a session ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Items that started playing
    pub started: usize,

    /// Items skipped because their source failed to load
    pub skipped: Vec<AudioItem>,

    /// Whether the session was interrupted before the queue ran out
    pub interrupted: bool,
}

pub struct Session {
    player: PlayerHandle,
    notices: UnboundedReceiver<Notice>,
    show_progress: bool,
    queue_len: usize,
    failures_in_a_row: usize,
}

impl Session {
    /// Attach console observers to a running player
    pub async fn attach(player: PlayerHandle) -> Result<Self> {
        let (tx, notices) = mpsc::unbounded_channel();
        player
            .set_listener(Box::new(ConsoleListener::new(tx.clone())))
            .await?;
        player
            .set_notification_sink(Box::new(ConsoleSink::new(tx)))
            .await?;

        Ok(Self {
            player,
            notices,
            show_progress: true,
            queue_len: 0,
            failures_in_a_row: 0,
        })
    }

    /// Print position updates (on by default)
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Play from `start` until the queue ends or `interrupt` resolves
    pub async fn run(
        mut self,
        start: usize,
        interrupt: impl Future<Output = ()>,
    ) -> Result<SessionSummary> {
        let queue = self.player.snapshot().await?.queue;
        let first = queue.get(start).cloned().ok_or_else(|| {
            CliError::Playlist(format!(
                "start index {} is out of range for {} items",
                start,
                queue.len()
            ))
        })?;

        self.queue_len = queue.len();
        let mut summary = SessionSummary::default();
        self.player.play(first).await?;

        tokio::pin!(interrupt);
        loop {
            let notice = tokio::select! {
                () = &mut interrupt => {
                    info!("Interrupted");
                    summary.interrupted = true;
                    break;
                }
                notice = self.notices.recv() => match notice {
                    Some(notice) => notice,
                    None => break,
                },
            };

            if !self.handle(notice, &mut summary).await? {
                break;
            }
        }

        Ok(summary)
    }

    /// React to one notice; false ends the session
    async fn handle(&mut self, notice: Notice, summary: &mut SessionSummary) -> Result<bool> {
        match notice {
            Notice::Started(status) => {
                summary.started += 1;
                self.failures_in_a_row = 0;
                println!("Now playing: {}", status.audio_item.title);
            }
            Notice::Progress(status) => {
                if self.show_progress {
                    println!("{}", render_status(&status));
                }
            }
            Notice::Paused(status) => println!("Paused: {}", render_status(&status)),
            Notice::Resumed(status) => println!("Resumed: {}", status.audio_item.title),
            Notice::Finished => {
                // The controller has already moved on by the time this is answered.
                let snapshot = self.player.snapshot().await?;
                if snapshot.state == ControllerState::Completed {
                    info!("Queue finished");
                    return Ok(false);
                }
            }
            Notice::Stopped => {
                info!("Playback stopped");
                return Ok(false);
            }
            Notice::PathError(item) => {
                warn!(item_id = item.id, url = %item.url, "Skipping unreadable item");
                println!("Skipped: {} ({})", item.title, item.url);
                summary.skipped.push(item);

                // With repeat-all a queue of broken items would cycle forever.
                self.failures_in_a_row += 1;
                if self.failures_in_a_row >= self.queue_len {
                    warn!("No playable item left");
                    return Ok(false);
                }

                match self.player.next().await {
                    Ok(()) => {}
                    Err(PlaybackError::EmptyQueue) => return Ok(false),
                    Err(e) => return Err(e.into()),
                }
            }
            Notice::EngineError(message) => {
                return Err(CliError::Playback(PlaybackError::EngineFault(message)));
            }
            Notice::State(state) => debug!(?state, "Player state"),
        }
        Ok(true)
    }
}
