//! Point-in-time ratings from a contest-by-contest rating history.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::rank::rank_for_rating;

/// 90 days. A nearest contest further away than this is not a match.
pub const DEFAULT_TOLERANCE_SECS: i64 = 7_776_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingHistoryEntry {
    pub contest_id: Option<i64>,
    pub contest_name: Option<String>,
    pub rating_update_time: i64,
    pub old_rating: i64,
    pub new_rating: i64,
}

impl RatingHistoryEntry {
    pub fn rank(&self) -> &'static str {
        rank_for_rating(self.new_rating)
    }

    pub fn contest_date(&self) -> String {
        DateTime::<Utc>::from_timestamp(self.rating_update_time, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalPoint {
    pub year: i32,
    pub entry: Option<RatingHistoryEntry>,
}

/// Entry closest in time to `target`, first one wins on ties.
pub fn nearest(
    history: &[RatingHistoryEntry],
    target: i64,
    tolerance_secs: i64,
) -> Option<&RatingHistoryEntry> {
    let mut best: Option<(&RatingHistoryEntry, i64)> = None;
    for entry in history {
        let distance = (entry.rating_update_time - target).abs();
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((entry, distance)),
        }
    }
    best.filter(|(_, d)| *d <= tolerance_secs)
        .map(|(entry, _)| entry)
}

/// Midnight UTC of the given calendar date, as unix seconds.
pub fn target_timestamp(year: i32, month: u32, day: u32) -> Result<i64> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow::anyhow!("invalid date: {year}-{month:02}-{day:02}"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid time for {date}"))?;
    Ok(midnight.and_utc().timestamp())
}

/// Resolve the rating nearest to `month`/`day` for each year, in order.
pub fn resolve_years(
    history: &[RatingHistoryEntry],
    years: &[i32],
    month: u32,
    day: u32,
    tolerance_secs: i64,
) -> Result<Vec<HistoricalPoint>> {
    years
        .iter()
        .map(|&year| {
            let target = target_timestamp(year, month, day)?;
            Ok(HistoricalPoint {
                year,
                entry: nearest(history, target, tolerance_secs).cloned(),
            })
        })
        .collect()
}
