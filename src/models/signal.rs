use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ItemId;

/// Identifier of the user a signal set belongs to
pub type UserId = String;

/// One user's explicit preference state
///
/// Serialized with the upvoted ids as a sorted array, which is the form the
/// persistence layer stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signal {
    pub user_id: UserId,
    #[serde(default)]
    pub upvoted_item_ids: BTreeSet<ItemId>,
}

impl Signal {
    /// Creates an empty signal for a user
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            upvoted_item_ids: BTreeSet::new(),
        }
    }

    pub fn is_upvoted(&self, item_id: ItemId) -> bool {
        self.upvoted_item_ids.contains(&item_id)
    }
}

/// Rating sent to the interaction sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Rating {
    /// Upvote retracted (0)
    Retracted,
    /// Upvoted (5)
    Upvoted,
}

impl Rating {
    pub fn from_endorsed(endorsed: bool) -> Self {
        if endorsed {
            Rating::Upvoted
        } else {
            Rating::Retracted
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Retracted => 0,
            Rating::Upvoted => 5,
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rating::Retracted),
            5 => Ok(Rating::Upvoted),
            other => Err(format!("rating must be 0 or 5, got {}", other)),
        }
    }
}

/// Interaction event delivered to the remote dataset
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Interaction {
    pub user_id: UserId,
    /// Sent as a string, matching the provider's id type
    pub item_id: String,
    pub rating: Rating,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Interaction {
    pub fn new(user_id: impl Into<UserId>, item_id: ItemId, endorsed: bool) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.to_string(),
            rating: Rating::from_endorsed(endorsed),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
