//! Observable session state: transcript, draft input and the pending flag.
//!
//! Every mutation publishes a fresh [`SessionStatus`] on a watch channel so
//! the view can react to transcript, pending and draft changes.

use tokio::sync::watch;

use crate::state::ChatMessage;
use crate::transcript::Transcript;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// The editable input line
#[derive(Debug, Clone, Default)]
pub struct Draft {
    text: String,
    cursor: usize, // cursor position in chars
}

impl Draft {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    /// Remove the character before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_pos);
        true
    }

    /// Remove the character under the cursor
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(byte_pos);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Snapshot published to observers after every session mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub transcript_len: usize,
    pub pending: bool,
    pub draft_revision: u64,
}

pub struct Session {
    transcript: Transcript,
    draft: Draft,
    pending: bool,
    draft_revision: u64,
    status: watch::Sender<SessionStatus>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            transcript: Transcript::new(),
            draft: Draft::default(),
            pending: false,
            draft_revision: 0,
            status,
        }
    }

    /// Subscribe to status changes. The receiver starts at the current status.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            transcript_len: self.transcript.len(),
            pending: self.pending,
            draft_revision: self.draft_revision,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.transcript.append(message);
        self.publish();
    }

    pub fn set_pending(&mut self, pending: bool) {
        if self.pending != pending {
            self.pending = pending;
            self.publish();
        }
    }

    /// Apply an edit to the draft, publishing only when it reports a change.
    pub fn edit_draft<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Draft),
    {
        let before = self.draft.clone();
        edit(&mut self.draft);
        if before.text != self.draft.text || before.cursor != self.draft.cursor {
            self.draft_revision += 1;
            self.publish();
        }
    }

    pub fn clear_draft(&mut self) {
        self.edit_draft(Draft::clear);
    }

    fn publish(&self) {
        self.status.send_replace(self.status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new();
        assert!(session.transcript().is_empty());
        assert_eq!(session.draft().text(), "");
        assert!(!session.is_pending());
    }

    #[test]
    fn test_draft_editing_is_utf8_safe() {
        let mut draft = Draft::default();
        for c in "héllo".chars() {
            draft.insert(c);
        }
        draft.move_left();
        draft.move_left();
        draft.move_left();
        draft.backspace();
        assert_eq!(draft.text(), "hllo");
        assert_eq!(draft.cursor(), 1);

        draft.insert('ë');
        assert_eq!(draft.text(), "hëllo");

        draft.move_home();
        assert!(draft.delete());
        assert_eq!(draft.text(), "ëllo");
        assert!(!draft.backspace());

        draft.move_end();
        assert!(!draft.delete());
        assert_eq!(draft.cursor(), 4);
    }

    #[test]
    fn test_observers_see_transcript_and_pending_changes() {
        let mut session = Session::new();
        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.append(ChatMessage::user("Hello"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().transcript_len, 1);

        session.set_pending(true);
        assert!(rx.borrow_and_update().pending);

        // Setting the same value again is not a change
        session.set_pending(true);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_draft_edits_bump_revision_only_on_change() {
        let mut session = Session::new();
        session.edit_draft(|d| d.insert('a'));
        assert_eq!(session.status().draft_revision, 1);

        // Cursor already at the end, nothing to delete
        session.edit_draft(|d| {
            d.move_end();
            d.delete();
        });
        assert_eq!(session.status().draft_revision, 1);

        session.clear_draft();
        assert_eq!(session.status().draft_revision, 2);
        assert_eq!(session.draft().text(), "");
    }
}
