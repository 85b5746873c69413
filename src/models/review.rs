use serde::{Deserialize, Serialize};

use super::{FilmId, ReviewId, UserId};

/// Review row as kept by the entity store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub review_id: ReviewId,
    pub film_id: FilmId,
    pub user_id: UserId,
    pub content: String,
    pub is_positive: bool,
}

/// A review with its usefulness score computed from like/dislike rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: ReviewId,
    pub film_id: FilmId,
    pub user_id: UserId,
    pub content: String,
    pub is_positive: bool,
    pub useful: i64,
}

impl Review {
    pub fn from_record(record: ReviewRecord, useful: i64) -> Self {
        Self {
            review_id: record.review_id,
            film_id: record.film_id,
            user_id: record.user_id,
            content: record.content,
            is_positive: record.is_positive,
            useful,
        }
    }
}

/// Incoming review for create and update
///
/// Film and user ids of 0 mean "not provided".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    #[serde(default)]
    pub review_id: Option<ReviewId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_positive: Option<bool>,
    #[serde(default)]
    pub film_id: FilmId,
    #[serde(default)]
    pub user_id: UserId,
}

/// Net usefulness: one point per like row, minus one per dislike row
pub fn useful_score(reactions: &[bool]) -> i64 {
    reactions
        .iter()
        .map(|&is_like| if is_like { 1 } else { -1 })
        .sum()
}
