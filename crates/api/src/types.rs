use chrono::{DateTime, Utc};
use serde::Deserialize;

use cftrack_core::rank::{LEGENDARY_GRANDMASTER, UNRATED};
use cftrack_core::{RatingHistoryEntry, UserSnapshot};

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

/// Every Codeforces response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub comment: Option<String>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub handle: String,
    pub rating: Option<i64>,
    pub rank: Option<String>,
    #[serde(rename = "maxRating")]
    pub max_rating: Option<i64>,
    #[serde(rename = "maxRank")]
    pub max_rank: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingChange {
    #[serde(rename = "contestId")]
    pub contest_id: Option<i64>,
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "ratingUpdateTimeSeconds")]
    pub rating_update_time_seconds: i64,
    #[serde(rename = "oldRating")]
    pub old_rating: i64,
    #[serde(rename = "newRating")]
    pub new_rating: i64,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl User {
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> UserSnapshot {
        let rank = self.rank.unwrap_or_else(|| UNRATED.to_string());
        let max_rating = self.max_rating.unwrap_or(0);
        let mut max_rank = self.max_rank.unwrap_or_else(|| UNRATED.to_string());

        // Some accounts come back with maxRank set to their own handle.
        if max_rank == self.handle {
            max_rank = if max_rating >= 3000 {
                LEGENDARY_GRANDMASTER.to_string()
            } else {
                rank.clone()
            };
        }

        UserSnapshot {
            rating: self.rating.unwrap_or(0),
            rank,
            max_rating,
            max_rank,
            last_updated: fetched_at,
            handle: self.handle,
        }
    }
}

impl From<RatingChange> for RatingHistoryEntry {
    fn from(change: RatingChange) -> Self {
        RatingHistoryEntry {
            contest_id: change.contest_id,
            contest_name: change.contest_name,
            rating_update_time: change.rating_update_time_seconds,
            old_rating: change.old_rating,
            new_rating: change.new_rating,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
