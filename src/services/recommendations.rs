use serde::Serialize;
use std::collections::BTreeSet;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    models::{ItemId, RankedItem, ScoredId},
    services::reranker::partition_and_rerank,
};

/// Where the candidate list of a feed came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// A fresh ranking from the provider
    Provider,
    /// The provider failed; the last successful ranking was reused
    LastKnown,
    /// The provider failed and nothing was cached for this user
    Empty,
}

/// Per-request feed options
#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    /// Catalog search applied before partitioning
    pub query: Option<String>,
    /// Exact genre filter applied before partitioning
    pub genre: Option<String>,
    /// Overrides the configured recommendation limit
    pub limit: Option<usize>,
}

/// A personalized, reranked view of the catalog
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub user_id: String,
    pub source: CandidateSource,
    /// Number of leading items recommended by the provider
    pub recommended_count: usize,
    pub upvoted_item_ids: BTreeSet<ItemId>,
    pub items: Vec<RankedItem>,
}

/// Loads a user's persisted signal into the store the first time they are seen
///
/// On a load failure the user stays unknown, so the next call retries.
pub async fn ensure_signal_loaded(state: &AppState, user_id: &str) -> AppResult<()> {
    if state.inner.read().await.signals.knows(user_id) {
        return Ok(());
    }

    if let Some(signal) = state.signal_repository.load(user_id).await? {
        let count = signal.upvoted_item_ids.len();
        if state.inner.write().await.signals.hydrate(signal) {
            tracing::debug!(user_id = %user_id, count, "Hydrated persisted signal");
        }
    }
    Ok(())
}

/// Fetches candidates from the provider, falling back to the last known list
///
/// A successful fetch replaces the stored list for the user wholesale.
async fn fetch_candidates(
    state: &AppState,
    user_id: &str,
    limit: usize,
) -> (Vec<ScoredId>, CandidateSource) {
    match state.ranking_provider.rank(user_id, limit).await {
        Ok(scored) => {
            state
                .inner
                .write()
                .await
                .last_candidates
                .insert(user_id, scored.clone());
            (scored, CandidateSource::Provider)
        }
        Err(e) => {
            let cached = state.inner.read().await.last_candidates.get(user_id).cloned();
            tracing::warn!(
                error = %e,
                user_id = %user_id,
                provider = state.ranking_provider.name(),
                has_fallback = cached.is_some(),
                "Ranking fetch failed"
            );
            match cached {
                Some(scored) => (scored, CandidateSource::LastKnown),
                None => (Vec::new(), CandidateSource::Empty),
            }
        }
    }
}

/// Builds the personalized feed for a user
///
/// Provider-recommended items come first, the rest of the catalog after them,
/// each partition reranked against the user's current upvotes. Called on every
/// request, so signal changes show up immediately.
pub async fn get_feed(state: &AppState, user_id: &str, options: &FeedOptions) -> AppResult<Feed> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user_id cannot be empty".to_string()));
    }
    let limit = options.limit.unwrap_or(state.recommendation_limit);
    if limit == 0 {
        return Err(AppError::InvalidInput("limit must be at least 1".to_string()));
    }

    // Reads tolerate a missing signal; the feed is built without upvotes
    if let Err(e) = ensure_signal_loaded(state, user_id).await {
        tracing::warn!(error = %e, user_id = %user_id, "Failed to load persisted signal");
    }
    let (scored, source) = fetch_candidates(state, user_id, limit).await;

    let inner = state.inner.read().await;
    let signal = inner.signals.current(user_id);
    let items = inner
        .catalog
        .filter(options.query.as_deref(), options.genre.as_deref());

    let ranking = partition_and_rerank(&items, &scored, &signal, &state.policy);

    tracing::info!(
        user_id = %user_id,
        source = ?source,
        recommended = ranking.recommended_count,
        total = ranking.items.len(),
        upvotes = signal.len(),
        "Built feed"
    );

    Ok(Feed {
        user_id: user_id.to_string(),
        source,
        recommended_count: ranking.recommended_count,
        upvoted_item_ids: signal,
        items: ranking.items,
    })
}
