/// Console presentation: listener, notification sink and text rendering
use std::fmt::Write as _;
use tapedeck_playback::{
    AudioItem, ControllerState, NotificationSink, PlaybackError, PlaybackListener,
    PlaybackStatus, PlayerSnapshot,
};
use tokio::sync::mpsc::UnboundedSender;

/// What the console session reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Started(PlaybackStatus),
    Progress(PlaybackStatus),
    Paused(PlaybackStatus),
    Resumed(PlaybackStatus),
    Finished,
    Stopped,
    PathError(AudioItem),
    EngineError(String),
    State(ControllerState),
}

/// Forwards listener callbacks to the session loop
pub struct ConsoleListener {
    tx: UnboundedSender<Notice>,
}

impl ConsoleListener {
    pub fn new(tx: UnboundedSender<Notice>) -> Self {
        Self { tx }
    }

    fn forward(&self, notice: Notice) {
        // The session may already be gone during shutdown.
        self.tx.send(notice).ok();
    }
}

impl PlaybackListener for ConsoleListener {
    fn on_playing(&mut self, status: &PlaybackStatus) {
        self.forward(Notice::Started(status.clone()));
    }

    fn on_paused(&mut self, status: &PlaybackStatus) {
        self.forward(Notice::Paused(status.clone()));
    }

    fn on_continue_audio(&mut self, status: &PlaybackStatus) {
        self.forward(Notice::Resumed(status.clone()));
    }

    fn on_completed_audio(&mut self) {
        self.forward(Notice::Finished);
    }

    fn on_time_changed(&mut self, status: &PlaybackStatus) {
        self.forward(Notice::Progress(status.clone()));
    }

    fn on_stopped(&mut self) {
        self.forward(Notice::Stopped);
    }

    fn on_engine_error(&mut self, error: &PlaybackError) {
        self.forward(Notice::EngineError(error.to_string()));
    }

    fn on_path_error(&mut self, item: &AudioItem) {
        self.forward(Notice::PathError(item.clone()));
    }
}

/// Reports state changes, the way a media notification would
pub struct ConsoleSink {
    tx: UnboundedSender<Notice>,
    last_state: Option<ControllerState>,
}

impl ConsoleSink {
    pub fn new(tx: UnboundedSender<Notice>) -> Self {
        Self {
            tx,
            last_state: None,
        }
    }
}

impl NotificationSink for ConsoleSink {
    fn update(&mut self, snapshot: &PlayerSnapshot) {
        if self.last_state == Some(snapshot.state) {
            return;
        }
        self.last_state = Some(snapshot.state);
        self.tx.send(Notice::State(snapshot.state)).ok();
    }
}

/// `m:ss` rendering of a millisecond count
pub fn format_time(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One progress line for the current item
pub fn render_status(status: &PlaybackStatus) -> String {
    const WIDTH: usize = 20;
    let filled = ((status.progress() * WIDTH as f32).round() as usize).min(WIDTH);

    format!(
        "[{}{}] {} / {}  {}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        format_time(status.current_position_ms),
        format_time(status.duration_ms),
        status.audio_item.title
    )
}

/// Table of the queue in play order
pub fn render_queue(items: &[AudioItem], current: Option<&AudioItem>) -> String {
    let mut out = String::new();
    for item in items {
        let marker = if Some(item) == current { '>' } else { ' ' };
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{} {:>3}  id={:<4} {:<40} {:?}  {}",
            marker,
            item.position,
            item.id,
            item.title,
            item.origin(),
            item.url
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(65_400), "1:05");
        assert_eq!(format_time(-20), "0:00");
    }

    #[test]
    fn status_line_shows_progress() {
        let status = PlaybackStatus::new(AudioItem::new("Halfway", "/h.mp3"), 60_000, 30_000);
        let line = render_status(&status);

        assert!(line.starts_with("[##########----------]"));
        assert!(line.contains("0:30 / 1:00"));
        assert!(line.ends_with("Halfway"));
    }

    #[test]
    fn queue_table_marks_current_item() {
        let mut first = AudioItem::new("First", "/a.mp3");
        first.id = 0;
        first.position = 0;
        let mut second = AudioItem::new("Second", "https://x/b.mp3");
        second.id = 1;
        second.position = 1;

        let table = render_queue(&[first, second.clone()], Some(&second));
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(' '));
        assert!(lines[1].starts_with('>'));
        assert!(lines[1].contains("Remote"));
    }

    #[test]
    fn sink_reports_each_state_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ConsoleSink::new(tx);
        let mut snapshot = PlayerSnapshot {
            state: ControllerState::Idle,
            current: None,
            queue: Vec::new(),
            status: None,
            repeat: tapedeck_playback::RepeatMode::Off,
            shuffle: false,
        };

        sink.update(&snapshot);
        sink.update(&snapshot);
        snapshot.state = ControllerState::Preparing;
        sink.update(&snapshot);

        assert_eq!(rx.try_recv(), Ok(Notice::State(ControllerState::Idle)));
        assert_eq!(rx.try_recv(), Ok(Notice::State(ControllerState::Preparing)));
        assert!(rx.try_recv().is_err());
    }
}
