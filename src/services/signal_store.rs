use std::collections::{BTreeSet, HashMap};

use crate::{
    error::AppResult,
    models::{ItemId, Signal, UserId},
};

/// Per-user upvote sets
///
/// Membership is boolean and toggling off removes the id outright. Ids are not
/// checked against the catalog. Writes are last-write-wins.
#[derive(Debug, Default, Clone)]
pub struct SignalStore {
    users: HashMap<UserId, BTreeSet<ItemId>>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (`endorsed`) or removes an upvote and returns the user's updated set
    ///
    /// Both directions are idempotent.
    pub fn record(&mut self, user_id: &str, item_id: ItemId, endorsed: bool) -> &BTreeSet<ItemId> {
        let upvotes = self.users.entry(user_id.to_string()).or_default();
        if endorsed {
            upvotes.insert(item_id);
        } else {
            upvotes.remove(&item_id);
        }
        upvotes
    }

    /// Live set for a user; empty for users never seen before
    pub fn current(&self, user_id: &str) -> BTreeSet<ItemId> {
        self.users.get(user_id).cloned().unwrap_or_default()
    }

    /// Whether the store already holds state for this user
    pub fn knows(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Seeds a user's set from persisted state
    ///
    /// Ignored when the user already has local state, which stays authoritative.
    /// Returns whether the signal was applied.
    pub fn hydrate(&mut self, signal: Signal) -> bool {
        if self.knows(&signal.user_id) {
            return false;
        }
        self.users.insert(signal.user_id, signal.upvoted_item_ids);
        true
    }

    /// Serializable form of a user's state
    pub fn snapshot(&self, user_id: &str) -> Signal {
        Signal {
            user_id: user_id.to_string(),
            upvoted_item_ids: self.current(user_id),
        }
    }
}

/// Durable storage for signal snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SignalRepository: Send + Sync {
    /// Loads the persisted signal for a user, if any
    async fn load(&self, user_id: &str) -> AppResult<Option<Signal>>;

    /// Persists a snapshot without waiting for the write to land
    fn save(&self, signal: &Signal);
}
