//! Bounded first-come sample of recently observed conversations.
//!
//! Invariants:
//! - never holds more than `max` entries
//! - once a conversation is recorded its timestamp is never updated
//! - once full, nothing is added or evicted

use super::traits::ChatId;
use std::collections::HashMap;

/// First-come map of conversation id to the timestamp of the first message
/// observed there. Owned by the bootstrap orchestrator for the process
/// lifetime; never persisted.
#[derive(Debug)]
pub struct RecentChats {
    max: usize,
    chats: HashMap<ChatId, u64>,
}

impl RecentChats {
    /// Create an empty record bounded at `max` distinct conversations.
    pub fn new(max: usize) -> Self {
        Self {
            max,
            chats: HashMap::new(),
        }
    }

    /// Record a conversation, first-write-wins.
    ///
    /// Returns true when the entry was inserted; false when the record is
    /// full or the conversation is already present.
    pub fn record(&mut self, chat: ChatId, timestamp_ms: u64) -> bool {
        if self.chats.len() >= self.max || self.chats.contains_key(&chat) {
            return false;
        }
        self.chats.insert(chat, timestamp_ms);
        true
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.chats.len() >= self.max
    }

    /// Timestamp of the first message observed in `chat`, if recorded
    pub fn get(&self, chat: &ChatId) -> Option<u64> {
        self.chats.get(chat).copied()
    }

    /// Entries ordered by observation timestamp
    pub fn snapshot(&self) -> Vec<(ChatId, u64)> {
        let mut entries: Vec<_> = self
            .chats
            .iter()
            .map(|(chat, ts)| (chat.clone(), *ts))
            .collect();
        entries.sort_by_key(|(_, ts)| *ts);
        entries
    }
}
