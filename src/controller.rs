//! Submission lifecycle: validate input, append the user turn, run one
//! generation request in the background and apply exactly one result.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::generate::{GenerateError, GenerateRequest, GenerationOptions, TextGenerator};
use crate::session::Session;
use crate::state::ChatMessage;

pub const FALLBACK_MESSAGE: &str = "Sorry, there was an error processing your request.";

/// What `submit` did with the input. Rejections leave the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Empty,
    Busy,
}

/// Result of one background generation request
#[derive(Debug)]
pub struct Completion {
    pub result: Result<String, GenerateError>,
}

/// Reports the task outcome exactly once. If the task unwinds before
/// `finish` is called, `Drop` reports `Interrupted` instead.
struct CompletionGuard {
    tx: mpsc::UnboundedSender<Completion>,
    sent: bool,
}

impl CompletionGuard {
    fn finish(mut self, result: Result<String, GenerateError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<String, GenerateError>) {
        if !self.sent {
            self.sent = true;
            let _ = self.tx.send(Completion { result });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.send(Err(GenerateError::Interrupted));
    }
}

pub struct SubmissionController {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    completions: mpsc::UnboundedSender<Completion>,
}

impl SubmissionController {
    /// Returns the controller and the receiver its completions arrive on.
    /// The owner of the session feeds every received completion to `resolve`.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        options: GenerationOptions,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            generator,
            options,
            completions: tx,
        };
        (controller, rx)
    }

    pub fn options(&self) -> GenerationOptions {
        self.options
    }

    /// Start a submission. Must be called from within a tokio runtime.
    pub fn submit(&self, session: &mut Session, raw_input: &str) -> SubmitOutcome {
        if raw_input.trim().is_empty() {
            debug!("ignoring empty submission");
            return SubmitOutcome::Empty;
        }
        if session.is_pending() {
            debug!("ignoring submission while a request is in flight");
            return SubmitOutcome::Busy;
        }

        session.append(ChatMessage::user(raw_input));
        session.clear_draft();
        session.set_pending(true);

        let request = GenerateRequest::new(raw_input, self.options);
        let generator = Arc::clone(&self.generator);
        let guard = CompletionGuard {
            tx: self.completions.clone(),
            sent: false,
        };

        info!(prompt_chars = raw_input.chars().count(), "submitting prompt");
        tokio::spawn(async move {
            let result = generator.generate(&request).await;
            guard.finish(result);
        });

        SubmitOutcome::Accepted
    }

    /// Submit whatever is currently in the draft
    pub fn submit_draft(&self, session: &mut Session) -> SubmitOutcome {
        let raw_input = session.draft().text().to_string();
        self.submit(session, &raw_input)
    }

    /// Apply a completion: append exactly one assistant turn, then release
    /// the pending flag.
    pub fn resolve(&self, session: &mut Session, completion: Completion) {
        let message = match completion.result {
            Ok(text) => {
                info!(response_chars = text.chars().count(), "generation completed");
                ChatMessage::assistant(text)
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                ChatMessage::assistant(FALLBACK_MESSAGE)
            }
        };
        session.append(message);
        session.set_pending(false);
    }
}
