//! Hybrid reranking
//!
//! Blends the provider's base score with boosts derived from the user's upvotes:
//! a flat boost for upvoted items and a capped boost for sharing genres with them.
//! Everything here is pure and synchronous, so callers rerun it after every signal
//! change or candidate refresh.
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Genre, Item, ItemId, RankedItem, ScoredId},
};

pub const DEFAULT_UPVOTE_BOOST: f64 = 0.25;
pub const DEFAULT_GENRE_STEP: f64 = 0.05;
pub const DEFAULT_GENRE_CAP: f64 = 0.15;

/// Boost constants applied by [`rerank`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    upvote_boost: f64,
    genre_step: f64,
    genre_cap: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            upvote_boost: DEFAULT_UPVOTE_BOOST,
            genre_step: DEFAULT_GENRE_STEP,
            genre_cap: DEFAULT_GENRE_CAP,
        }
    }
}

impl ScoringPolicy {
    /// Creates a policy, rejecting negative or non-finite constants
    pub fn new(upvote_boost: f64, genre_step: f64, genre_cap: f64) -> AppResult<Self> {
        for (name, value) in [
            ("upvote_boost", upvote_boost),
            ("genre_step", genre_step),
            ("genre_cap", genre_cap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        Ok(Self {
            upvote_boost,
            genre_step,
            genre_cap,
        })
    }

    pub fn upvote_boost(&self) -> f64 {
        self.upvote_boost
    }

    pub fn genre_step(&self) -> f64 {
        self.genre_step
    }

    pub fn genre_cap(&self) -> f64 {
        self.genre_cap
    }

    /// Genre boost for a given overlap count, saturating at the cap
    pub fn genre_boost(&self, overlap: usize) -> f64 {
        (overlap as f64 * self.genre_step).min(self.genre_cap)
    }
}

/// Reranks one candidate list against the user's upvoted ids
///
/// With an empty signal the provider order is returned untouched and every boost
/// is zero. Otherwise candidates are sorted by blended score, descending; the sort
/// is stable so ties keep their input order.
pub fn rerank(
    candidates: Vec<Candidate>,
    signal: &BTreeSet<ItemId>,
    policy: &ScoringPolicy,
) -> Vec<RankedItem> {
    if signal.is_empty() {
        return candidates
            .into_iter()
            .map(|candidate| RankedItem::from_candidate(candidate, 0.0, 0.0))
            .collect();
    }

    let affinity = affinity_genres(&candidates, signal);

    let mut ranked: Vec<RankedItem> = candidates
        .into_iter()
        .map(|candidate| {
            let upvote_boost = if signal.contains(&candidate.id()) {
                policy.upvote_boost
            } else {
                0.0
            };
            let overlap = candidate
                .item
                .genres
                .iter()
                .filter(|genre| affinity.contains(*genre))
                .count();
            let genre_boost = policy.genre_boost(overlap);
            RankedItem::from_candidate(candidate, upvote_boost, genre_boost)
        })
        .collect();

    // `sort_by` is stable; blended scores are always finite
    ranked.sort_by(|a, b| b.blended_score.total_cmp(&a.blended_score));
    ranked
}

/// Union of genres across the upvoted candidates visible in this pass
fn affinity_genres(candidates: &[Candidate], signal: &BTreeSet<ItemId>) -> HashSet<Genre> {
    candidates
        .iter()
        .filter(|candidate| signal.contains(&candidate.id()))
        .flat_map(|candidate| candidate.item.genres.iter().cloned())
        .collect()
}

/// Result of [`partition_and_rerank`]
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedRanking {
    /// Recommended partition first, then the rest of the catalog
    pub items: Vec<RankedItem>,
    /// Number of leading items that came from the provider's recommendations
    pub recommended_count: usize,
}

/// Splits the catalog into provider-recommended items and the remainder, reranks
/// each partition independently and concatenates them, recommended first
///
/// Recommended items keep provider order and scores going into the rerank. The
/// remainder keeps catalog order and has no base score. Provider ids missing from
/// the catalog are dropped and repeated ids keep their first occurrence.
pub fn partition_and_rerank(
    catalog: &[Item],
    provider_scores: &[ScoredId],
    signal: &BTreeSet<ItemId>,
    policy: &ScoringPolicy,
) -> PartitionedRanking {
    let by_id: HashMap<ItemId, &Item> = catalog.iter().map(|item| (item.id, item)).collect();

    let mut recommended_ids = HashSet::with_capacity(provider_scores.len());
    let mut recommended = Vec::with_capacity(provider_scores.len());
    for scored in provider_scores {
        let Some(item) = by_id.get(&scored.item_id) else {
            continue;
        };
        if recommended_ids.insert(scored.item_id) {
            recommended.push(Candidate::new((*item).clone(), scored.score));
        }
    }

    let dropped = provider_scores.len() - recommended.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Ignored provider ids that are duplicated or outside the catalog");
    }

    let other: Vec<Candidate> = catalog
        .iter()
        .filter(|item| !recommended_ids.contains(&item.id))
        .map(|item| Candidate::new(item.clone(), None))
        .collect();

    let recommended_count = recommended.len();
    let mut items = rerank(recommended, signal, policy);
    items.extend(rerank(other, signal, policy));

    PartitionedRanking {
        items,
        recommended_count,
    }
}
