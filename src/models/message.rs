use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// One entry of the chat thread. Immutable once appended to a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn user(id: String, text: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            id,
            text: text.to_string(),
            sender: Sender::User,
            timestamp,
            is_error: false,
        }
    }

    pub fn bot(id: String, text: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            id,
            text: text.to_string(),
            sender: Sender::Bot,
            timestamp,
            is_error: false,
        }
    }

    /// Bot-side notice shown in place of a reply that could not be obtained.
    pub fn bot_error(id: String, text: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            is_error: true,
            ..Self::bot(id, text, timestamp)
        }
    }
}

/// Projection of a message sent to the backend as conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub sender: Sender,
    pub timestamp: NaiveDateTime,
}

impl From<&Message> for HistoryEntry {
    fn from(msg: &Message) -> Self {
        Self {
            text: msg.text.clone(),
            sender: msg.sender,
            timestamp: msg.timestamp,
        }
    }
}
