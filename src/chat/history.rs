use std::collections::VecDeque;

use crate::models::{HistoryEntry, Message};

/// In-memory ordered thread, oldest first, capped at `limit` messages.
/// Appending past the cap evicts the oldest message.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    messages: VecDeque<Message>,
    limit: usize,
}

impl MessageHistory {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The last `count` messages as backend context, oldest first.
    pub fn recent(&self, count: usize) -> Vec<HistoryEntry> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages
            .iter()
            .skip(skip)
            .map(HistoryEntry::from)
            .collect()
    }
}
