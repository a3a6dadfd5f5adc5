//! Terminal chat client for a single text-generation endpoint.
//!
//! The session (transcript, draft, pending flag) is owned by the UI task;
//! generation requests run on background tasks and report back through
//! the submission controller's completion channel.

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod generate;
pub mod handler;
pub mod logging;
pub mod session;
pub mod state;
pub mod transcript;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Config;
pub use controller::{Completion, SubmissionController, SubmitOutcome, FALLBACK_MESSAGE};
pub use generate::{
    GenerateClient, GenerateError, GenerateRequest, GenerationOptions, OptionsError, TextGenerator,
};
pub use session::{Draft, Session, SessionStatus};
pub use state::{ChatMessage, ChatRole};
pub use transcript::Transcript;
