//! Chat message log shared by the assistant chat and forum threads.
//!
//! A log is append-only and keeps insertion order; messages are never edited
//! or removed during a session.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Who sent a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
    /// Another forum member, by display name.
    Member(String),
}

impl Sender {
    pub fn display_name(&self) -> &str {
        match self {
            Sender::User => "Me",
            Sender::Bot => "Assistant",
            Sender::Member(name) => name,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Sender::User)
    }
}

/// A single chat bubble: text, a voice note, or both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: Option<String>,
    pub voice_ref: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct ChatLog {
    prefix: &'static str,
    counter: u64,
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: 0,
            messages: Vec::new(),
        }
    }

    /// Start from existing messages (forum seed data). Ids already used by the
    /// seed are skipped when new ids are issued.
    pub fn seeded(prefix: &'static str, seed: Vec<ChatMessage>) -> Self {
        let mut log = Self::new(prefix);
        log.counter = seed.len() as u64;
        log.messages = seed;
        log
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
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

    fn next_id(&mut self) -> String {
        loop {
            self.counter += 1;
            let id = format!("{}{}", self.prefix, self.counter);
            if !self.messages.iter().any(|m| m.id == id) {
                return id;
            }
        }
    }

    fn push(
        &mut self,
        sender: Sender,
        text: Option<String>,
        voice_ref: Option<String>,
    ) -> &ChatMessage {
        let message = ChatMessage {
            id: self.next_id(),
            sender,
            text,
            voice_ref,
            timestamp: display_time(),
        };
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Blank text is rejected and nothing is appended.
    pub fn push_user_text(&mut self, text: &str) -> Result<&ChatMessage, FetchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FetchError::Validation("Please type a message.".to_string()));
        }
        Ok(self.push(Sender::User, Some(text.to_string()), None))
    }

    pub fn push_voice(&mut self, voice_ref: &str) -> &ChatMessage {
        self.push(Sender::User, None, Some(voice_ref.to_string()))
    }

    pub fn push_bot(&mut self, text: &str) -> &ChatMessage {
        self.push(Sender::Bot, Some(text.to_string()), None)
    }
}

/// Wall-clock time as shown under a bubble, e.g. `10:05 AM`.
pub fn display_time() -> String {
    Local::now().format("%I:%M %p").to_string()
}
