use serde::{Deserialize, Serialize};

mod item;
mod ranking;
mod signal;

pub use item::{Genre, Item, ItemId, GENRE_VOCABULARY, UNKNOWN_GENRE};
pub use ranking::{Candidate, RankedItem, ScoredId};
pub use signal::{Interaction, Rating, Signal, UserId};

// ============================================================================
// Ranking Provider API Types
// ============================================================================

/// Request body for the provider's `rank` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RankRequest<'a> {
    pub user_id: &'a str,
    pub limit: usize,
}

/// Raw response from the provider's `rank` endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankResponse {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub scores: Option<Vec<f64>>,
}

/// Base score given to every id when the provider omits scores
pub const DEFAULT_PROVIDER_SCORE: f64 = 1.0;

impl RankResponse {
    /// Converts the raw response into scored ids in provider order
    ///
    /// Ids that are not integers are skipped. Without a `scores` array every id
    /// scores [`DEFAULT_PROVIDER_SCORE`]; with a short one the uncovered ids carry
    /// no score.
    pub fn into_scored_ids(self) -> Vec<ScoredId> {
        let RankResponse { ids, scores } = self;

        ids.into_iter()
            .enumerate()
            .filter_map(|(index, raw_id)| {
                let item_id = match raw_id.parse::<ItemId>() {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::warn!(id = %raw_id, "Skipping non-numeric item id from provider");
                        return None;
                    }
                };
                let score = match &scores {
                    Some(scores) => scores.get(index).copied(),
                    None => Some(DEFAULT_PROVIDER_SCORE),
                };
                Some(ScoredId { item_id, score })
            })
            .collect()
    }
}

/// Raw model description from the provider
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub status: Option<String>,
}

/// Readiness of the remote ranking model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelStatus {
    NotSetup,
    Training,
    Ready,
    Error,
}

impl From<&ModelInfo> for ModelStatus {
    fn from(info: &ModelInfo) -> Self {
        match info.status.as_deref() {
            Some("ACTIVE") => ModelStatus::Ready,
            Some("TRAINING") => ModelStatus::Training,
            _ => ModelStatus::Error,
        }
    }
}
