use serde::{Deserialize, Serialize};

use super::{Genre, Item, ItemId};

/// An item paired with the base relevance score of one ranking pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    #[serde(flatten)]
    pub item: Item,
    /// Provider-defined scale; missing scores rank as 0
    #[serde(default)]
    pub base_score: Option<f64>,
}

impl Candidate {
    pub fn new(item: Item, base_score: Option<f64>) -> Self {
        Self { item, base_score }
    }

    pub fn id(&self) -> ItemId {
        self.item.id
    }

    /// Base score with missing or non-finite values treated as 0
    pub fn normalized_score(&self) -> f64 {
        match self.base_score {
            Some(score) if score.is_finite() => score,
            _ => 0.0,
        }
    }
}

/// Output record of a reranking pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedItem {
    pub id: ItemId,
    pub title: String,
    pub genres: Vec<Genre>,
    pub release_year: Option<i32>,
    pub base_score: f64,
    pub upvote_boost: f64,
    pub genre_boost: f64,
    /// Always `base_score + upvote_boost + genre_boost`
    pub blended_score: f64,
}

impl RankedItem {
    pub(crate) fn from_candidate(candidate: Candidate, upvote_boost: f64, genre_boost: f64) -> Self {
        let base_score = candidate.normalized_score();
        let Item {
            id,
            title,
            genres,
            release_year,
        } = candidate.item;

        Self {
            id,
            title,
            genres,
            release_year,
            base_score,
            upvote_boost,
            genre_boost,
            blended_score: base_score + upvote_boost + genre_boost,
        }
    }
}

/// A single provider ranking entry after id parsing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredId {
    pub item_id: ItemId,
    pub score: Option<f64>,
}
