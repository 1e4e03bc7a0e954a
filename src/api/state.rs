use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{ScoredId, UserId};
use crate::services::{
    providers::{InteractionSink, RankingProvider},
    Catalog, ScoringPolicy, SignalRepository, SignalStore,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub ranking_provider: Arc<dyn RankingProvider>,
    pub interaction_sink: Arc<dyn InteractionSink>,
    pub signal_repository: Arc<dyn SignalRepository>,
    pub policy: ScoringPolicy,
    /// Number of recommendations requested per feed
    pub recommendation_limit: usize,
}

/// Inner state that can be modified
#[derive(Default)]
pub struct AppStateInner {
    pub catalog: Catalog,
    pub signals: SignalStore,
    /// Last successful provider ranking per user, reused when a fetch fails
    pub last_candidates: LastCandidates,
}

/// Users whose last ranking is kept before the oldest entry is evicted
pub const MAX_LAST_CANDIDATES: usize = 10_000;

/// Bounded per-user store of the last successful provider ranking
///
/// Once `capacity` users are held, the least recently inserted one is evicted.
/// Upvotes live in [`SignalStore`] and are never evicted.
#[derive(Debug)]
pub struct LastCandidates {
    capacity: usize,
    entries: HashMap<UserId, Vec<ScoredId>>,
    order: VecDeque<UserId>,
}

impl LastCandidates {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Replaces the user's list wholesale
    pub fn insert(&mut self, user_id: &str, scored: Vec<ScoredId>) {
        if let Some(existing) = self.entries.get_mut(user_id) {
            *existing = scored;
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(user_id.to_string());
        self.entries.insert(user_id.to_string(), scored);
    }

    pub fn get(&self, user_id: &str) -> Option<&Vec<ScoredId>> {
        self.entries.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LastCandidates {
    fn default() -> Self {
        Self::with_capacity(MAX_LAST_CANDIDATES)
    }
}

impl AppState {
    /// Creates state with an empty catalog and signal store
    pub fn new(
        ranking_provider: Arc<dyn RankingProvider>,
        interaction_sink: Arc<dyn InteractionSink>,
        signal_repository: Arc<dyn SignalRepository>,
        policy: ScoringPolicy,
        recommendation_limit: usize,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner::default())),
            ranking_provider,
            interaction_sink,
            signal_repository,
            policy,
            recommendation_limit,
        }
    }

    /// Swaps in a new catalog snapshot
    pub async fn replace_catalog(&self, catalog: Catalog) {
        self.inner.write().await.catalog = catalog;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;

    fn ranking(id: u64) -> Vec<ScoredId> {
        vec![ScoredId { item_id: ItemId(id), score: Some(1.0) }]
    }

    #[test]
    fn test_last_candidates_evicts_oldest_user() {
        let mut last = LastCandidates::with_capacity(2);
        last.insert("u1", ranking(1));
        last.insert("u2", ranking(2));
        last.insert("u3", ranking(3));

        assert_eq!(last.len(), 2);
        assert!(last.get("u1").is_none());
        assert_eq!(last.get("u2"), Some(&ranking(2)));
        assert_eq!(last.get("u3"), Some(&ranking(3)));
    }

    #[test]
    fn test_last_candidates_replace_keeps_size() {
        let mut last = LastCandidates::with_capacity(2);
        last.insert("u1", ranking(1));
        last.insert("u2", ranking(2));
        last.insert("u1", ranking(7));

        assert_eq!(last.len(), 2);
        assert_eq!(last.get("u1"), Some(&ranking(7)));
        assert_eq!(last.get("u2"), Some(&ranking(2)));
    }
}
