//! Chat transcript for SQLFlow.
//!
//! The transcript is append-only and lives for the process lifetime.

use serde::{Deserialize, Serialize};

/// Greeting every transcript starts with.
pub const GREETING: &str =
    "Hello! I'm your AI SQL assistant. Ask me anything about your database.";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

/// Ordered chat history.
///
/// Starts with the AI greeting. After that, every AI message directly
/// follows a Human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Creates a transcript holding only the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::ai(GREETING)],
        }
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; the greeting is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_has_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0], Message::ai(GREETING));
        assert!(!transcript.is_empty());
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::human("show tables"));
        transcript.push(Message::ai("SQL Query: SHOW TABLES"));

        let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Ai, Role::Human, Role::Ai]);
        assert_eq!(transcript.last().unwrap().content, "SQL Query: SHOW TABLES");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Ai).unwrap(), r#""ai""#);
    }
}
