//! Message and Conversation domain types.
//!
//! These are the core value objects that flow through the pipeline:
//! the prompt assembler builds a system message, the user query follows it,
//! and the completion stream grows a trailing assistant message delta by
//! delta.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (the assembled teaching prompt)
    System,
    /// The learner
    User,
    /// The model's reply
    Assistant,
}

/// A single message in a conversation.
///
/// Position is semantically significant: index 0 is the system prompt,
/// index 1 the initial user query, everything after that alternating turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered sequence of messages forming one tutoring session.
///
/// Request-scoped: created at the start of a turn, discarded when the
/// stream interaction completes. At most one trailing assistant message is
/// ever in a growing (not yet finalized) state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    /// Ordered messages
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Fold one streamed delta into the trailing assistant message.
    ///
    /// If the last message has role `assistant`, the delta is appended to
    /// its content in place; otherwise a new assistant message is started.
    /// Deltas always append, they never replace — concatenating every folded
    /// delta in order reconstructs the final assistant content.
    pub fn apply_delta(&mut self, text: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.push_str(text);
            }
            _ => {
                self.messages.push(Message::assistant(text));
            }
        }
    }

    /// The content of the trailing assistant message, if one exists.
    pub fn last_assistant(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Teach me about photosynthesis");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Teach me about photosynthesis");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::system("You are a tutor");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }

    #[test]
    fn apply_delta_starts_assistant_message() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hello"));

        conv.apply_delta("Hi");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.last_assistant(), Some("Hi"));
    }

    #[test]
    fn apply_delta_appends_in_place() {
        let mut conv = Conversation::new();
        conv.apply_delta("Hi");
        conv.apply_delta(" there");
        conv.apply_delta("!");

        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.last_assistant(), Some("Hi there!"));
    }

    #[test]
    fn apply_delta_never_touches_earlier_turns() {
        let mut conv = Conversation::new();
        conv.push(Message::system("sys"));
        conv.push(Message::user("q1"));
        conv.apply_delta("a1");
        conv.push(Message::user("q2"));
        conv.apply_delta("a2");

        assert_eq!(conv.messages[2].content, "a1");
        assert_eq!(conv.last_assistant(), Some("a2"));
    }
}
