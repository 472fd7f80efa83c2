use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Utc};

use super::backend::ChatBackend;
use super::history::MessageHistory;
use super::ChatError;
use crate::client::{IdGenerator, CONVERSATION_ID_PREFIX, MESSAGE_ID_PREFIX};
use crate::config::{ChatConfig, ChatLimits};
use crate::models::{ChatReply, ChatRequest, HistoryEntry, Message};

/// Greeting shown when the thread opens. Displayed, never stored.
pub const WELCOME_MESSAGE: &str = "Hello! I'm BitBot, your AI assistant. I'm here to help you \
                                   with your questions and tasks. How can I assist you today?";

/// Handle for a reply the session is waiting on.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub request: ChatRequest,
    pub user_message_id: String,
}

/// One chat thread: bounded history, conversation id and the
/// awaiting-reply guard.
pub struct ChatSession {
    history: MessageHistory,
    conversation_id: String,
    awaiting_reply: bool,
    limits: ChatLimits,
    ids: Arc<dyn IdGenerator>,
}

impl ChatSession {
    pub fn new(config: &ChatConfig, ids: Arc<dyn IdGenerator>) -> Self {
        let conversation_id = ids.generate(CONVERSATION_ID_PREFIX);
        tracing::debug!(conversation_id = %conversation_id, "Chat session started");
        Self {
            history: MessageHistory::new(config.chat.history_limit),
            conversation_id,
            awaiting_reply: false,
            limits: config.chat.clone(),
            ids,
        }
    }

    pub fn welcome_message(&self) -> Message {
        Message::bot(self.ids.generate(MESSAGE_ID_PREFIX), WELCOME_MESSAGE, now())
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Whether `text` would be accepted by `begin_send` right now.
    pub fn can_send(&self, text: &str) -> bool {
        self.validate(text).is_ok()
    }

    pub fn recent_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.recent(limit)
    }

    /// Validate `text`, append it as a user message and build the backend
    /// request. The session stays "awaiting reply" until `complete` or
    /// `abandon`.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingReply, ChatError> {
        let text = self.validate(text)?.to_string();

        let user_message = Message::user(self.ids.generate(MESSAGE_ID_PREFIX), &text, now());
        let user_message_id = user_message.id.clone();
        self.history.push(user_message);
        self.awaiting_reply = true;

        // Context ends with this message.
        let history = self.history.recent(self.limits.context_messages);

        Ok(PendingReply {
            request: ChatRequest {
                message: text,
                conversation_id: self.conversation_id.clone(),
                history,
                timestamp: Utc::now().to_rfc3339(),
            },
            user_message_id,
        })
    }

    /// Record the backend outcome for `pending`. A failure appends the
    /// error notice and is returned to the caller.
    pub fn complete(
        &mut self,
        pending: &PendingReply,
        outcome: Result<ChatReply, ChatError>,
    ) -> Result<&Message, ChatError> {
        if pending.request.conversation_id != self.conversation_id {
            tracing::debug!(
                conversation_id = %pending.request.conversation_id,
                "Dropping reply for cleared conversation"
            );
            return Err(ChatError::StaleReply);
        }
        self.awaiting_reply = false;

        match outcome {
            Ok(reply) => {
                let id = reply
                    .message_id
                    .unwrap_or_else(|| self.ids.generate(MESSAGE_ID_PREFIX));
                self.history.push(Message::bot(id, &reply.reply, now()));
                self.last_message()
            }
            Err(error) => {
                tracing::warn!(
                    conversation_id = %self.conversation_id,
                    user_message_id = %pending.user_message_id,
                    error = %error,
                    "Chat reply failed"
                );
                self.history.push(Message::bot_error(
                    self.ids.generate(MESSAGE_ID_PREFIX),
                    error.user_message(),
                    now(),
                ));
                Err(error)
            }
        }
    }

    /// Give up on a pending reply without recording anything.
    pub fn abandon(&mut self, pending: &PendingReply) {
        if pending.request.conversation_id == self.conversation_id {
            self.awaiting_reply = false;
        }
    }

    /// Send `text` through `backend` and record the reply.
    pub async fn send_message(
        &mut self,
        backend: &dyn ChatBackend,
        text: &str,
    ) -> Result<&Message, ChatError> {
        let pending = self.begin_send(text)?;
        let outcome = backend.send(&pending.request).await;
        self.complete(&pending, outcome)
    }

    /// Empty the thread and start a new conversation id. Replies still in
    /// flight for the old id are rejected as stale.
    pub fn clear(&mut self) {
        self.history.clear();
        self.awaiting_reply = false;
        self.conversation_id = self.ids.generate(CONVERSATION_ID_PREFIX);
        tracing::debug!(conversation_id = %self.conversation_id, "Chat cleared");
    }

    /// Title for the conversation, from its first user message.
    pub fn title(&self) -> String {
        let first = self
            .history
            .iter()
            .find(|m| m.sender == crate::models::Sender::User)
            .map(|m| m.text.as_str())
            .unwrap_or_default();
        super::generate_title(first)
    }

    fn validate<'a>(&self, text: &'a str) -> Result<&'a str, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let length = text.chars().count();
        if length > self.limits.max_message_length {
            return Err(ChatError::MessageTooLong {
                length,
                limit: self.limits.max_message_length,
            });
        }
        if self.awaiting_reply {
            return Err(ChatError::ReplyPending);
        }
        Ok(text)
    }

    fn last_message(&self) -> Result<&Message, ChatError> {
        self.history
            .last()
            .ok_or_else(|| ChatError::Backend("history unexpectedly empty".into()))
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
