//! Conversation state
//!
//! A session keeps its turns in a [`Conversation`]: an append-only list whose
//! order is both the chronological and the display order. Nothing here knows
//! about the terminal or the backend.

use serde::{Deserialize, Serialize};

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
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

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_insertion_order() {
        let mut conversation = Conversation::new();
        conversation.append(ChatMessage::user("first"));
        conversation.append(ChatMessage::user("second"));
        conversation.append(ChatMessage::assistant("reply"));

        let contents: Vec<&str> = conversation.iter().map(ChatMessage::content).collect();
        assert_eq!(contents, ["first", "second", "reply"]);
        assert_eq!(conversation.last().map(ChatMessage::role), Some(ChatRole::Assistant));
    }

    #[test]
    fn roles_serialize_like_the_chat_api() {
        let json = serde_json::to_value(ChatMessage::user("hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hello" }));
    }
}
