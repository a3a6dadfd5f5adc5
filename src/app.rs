use tokio::sync::watch;

use crate::controller::{Completion, SubmissionController, SubmitOutcome};
use crate::session::{Session, SessionStatus};
use crate::state::ChatRole;

/// One rendered row of the conversation pane, already wrapped to width
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRow {
    Label(ChatRole),
    Text(ChatRole, String),
    Thinking,
    Blank,
}

/// Wrap a single line of text to `width` terminal columns.
/// Leading indentation is kept and words wider than the pane are split.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    use textwrap::{wrap, Options, WordSplitter};

    let options = Options::new(width.max(1)).word_splitter(WordSplitter::NoHyphenation);
    wrap(line, options)
        .into_iter()
        .map(|cow| cow.into_owned())
        .collect()
}

pub struct App {
    pub should_quit: bool,
    pub session: Session,
    pub controller: SubmissionController,
    pub endpoint: String,

    // Conversation pane scrolling
    pub chat_scroll: u16,
    pub scroll_target: u16,
    pub following: bool,
    pub chat_height: u16, // inner height, updated during render
    pub chat_width: u16,  // inner width, updated during render

    // Animation state
    pub animation_frame: u8,

    status_rx: watch::Receiver<SessionStatus>,
    seen_transcript_len: usize,
}

impl App {
    pub fn new(controller: SubmissionController, endpoint: impl Into<String>) -> Self {
        let session = Session::new();
        let status_rx = session.subscribe();

        Self {
            should_quit: false,
            session,
            controller,
            endpoint: endpoint.into(),

            chat_scroll: 0,
            scroll_target: 0,
            following: true,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            status_rx,
            seen_transcript_len: 0,
        }
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        self.controller.submit_draft(&mut self.session)
    }

    pub fn resolve(&mut self, completion: Completion) {
        self.controller.resolve(&mut self.session, completion);
    }

    /// React to session changes. A change in transcript length re-follows
    /// the newest message, whatever caused it.
    pub fn observe_session(&mut self) {
        if !self.status_rx.has_changed().unwrap_or(false) {
            return;
        }
        let status = *self.status_rx.borrow_and_update();
        if status.transcript_len != self.seen_transcript_len {
            self.seen_transcript_len = status.transcript_len;
            self.following = true;
        }
        self.refresh_scroll_target();
    }

    /// Called after the chat pane size is known
    pub fn set_chat_area(&mut self, width: u16, height: u16) {
        if (width, height) != (self.chat_width, self.chat_height) {
            self.chat_width = width;
            self.chat_height = height;
            self.refresh_scroll_target();
        }
    }

    fn wrap_width(&self) -> usize {
        // Default to 50 if not rendered yet
        if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        }
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    pub fn chat_rows(&self) -> Vec<ChatRow> {
        let width = self.wrap_width();
        let mut rows = Vec::new();

        for msg in self.session.transcript() {
            rows.push(ChatRow::Label(msg.role));
            for line in msg.content.lines() {
                for wrapped in wrap_line(line, width) {
                    rows.push(ChatRow::Text(msg.role, wrapped));
                }
            }
            rows.push(ChatRow::Blank);
        }

        if self.session.is_pending() {
            rows.push(ChatRow::Label(ChatRole::Assistant));
            rows.push(ChatRow::Thinking);
        }

        rows
    }

    pub fn max_scroll(&self) -> u16 {
        let total = u16::try_from(self.chat_rows().len()).unwrap_or(u16::MAX);
        total.saturating_sub(self.visible_height())
    }

    fn refresh_scroll_target(&mut self) {
        let max = self.max_scroll();
        if self.following {
            self.scroll_target = max;
        } else {
            self.scroll_target = self.scroll_target.min(max);
            self.chat_scroll = self.chat_scroll.min(max);
        }
    }

    /// Advance animations; the scroll offset eases toward its target
    pub fn on_tick(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = self.animation_frame.wrapping_add(1);
        }

        if self.chat_scroll < self.scroll_target {
            let step = ((self.scroll_target - self.chat_scroll) + 1) / 2;
            self.chat_scroll += step.max(1);
        } else if self.chat_scroll > self.scroll_target {
            let step = ((self.chat_scroll - self.scroll_target) + 1) / 2;
            self.chat_scroll -= step.max(1);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.following = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.scroll_target = self.chat_scroll;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.scroll_target = self.chat_scroll;
        self.following = self.chat_scroll >= max;
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_height() / 2).max(1)
    }
}
