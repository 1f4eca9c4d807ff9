//! Snapshot comparison engine.
//!
//! Compares a fresh fetch against the stored snapshot, per handle:
//! - rating change (zero for handles seen for the first time)
//! - rank transition by position in the rank order

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::rank::rank_index;
use crate::snapshot::UserSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTransition {
    Unchanged,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub handle: String,
    pub rating: i64,
    pub rating_change: i64,
    pub rank: String,
    pub rank_transition: RankTransition,
    pub max_rating: i64,
    pub last_updated: DateTime<Utc>,
}

pub fn rank_transition(current: &str, previous: Option<&str>) -> RankTransition {
    let Some(previous) = previous else {
        return RankTransition::Unchanged;
    };
    let (cur, prev) = (rank_index(current), rank_index(previous));
    if cur > prev {
        RankTransition::Up
    } else if cur < prev {
        RankTransition::Down
    } else {
        RankTransition::Unchanged
    }
}

/// One result per snapshot in `current`, highest rating first. Equal
/// ratings keep the order of `current`.
pub fn diff(
    current: &[UserSnapshot],
    previous: &BTreeMap<String, UserSnapshot>,
) -> Vec<DiffResult> {
    let mut results: Vec<DiffResult> = current
        .iter()
        .map(|cur| {
            let prev = previous.get(&cur.handle);
            DiffResult {
                handle: cur.handle.clone(),
                rating: cur.rating,
                rating_change: prev.map_or(0, |p| cur.rating - p.rating),
                rank: cur.rank.clone(),
                rank_transition: rank_transition(&cur.rank, prev.map(|p| p.rank.as_str())),
                max_rating: cur.max_rating,
                last_updated: cur.last_updated,
            }
        })
        .collect();

    // sort_by is stable, ties keep input order
    results.sort_by(|a, b| b.rating.cmp(&a.rating));
    results
}
