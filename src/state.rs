//! Chat message types shared by the transcript, the controller and the view.

use serde::{Deserialize, Serialize};

/// A single chat turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl ChatRole {
    /// Label shown above the message in the transcript view
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You:",
            ChatRole::Assistant => "AI:",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("Hello")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);

        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"Hi"}"#).unwrap();
        assert_eq!(msg, ChatMessage::assistant("Hi"));
    }
}
