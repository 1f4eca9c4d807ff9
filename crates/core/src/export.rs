//! CSV views of the snapshot store and of historical ratings.

use std::io::Write;

use anyhow::Result;
use csv::Writer;

use crate::history::HistoricalPoint;
use crate::rank::title_case;
use crate::snapshot::{SnapshotStore, UserSnapshot};

pub const SNAPSHOT_HEADER: [&str; 6] = [
    "Handle",
    "Rating",
    "Rank",
    "Max Rating",
    "Max Rank",
    "Last Updated",
];

/// Store entries, highest rating first.
pub fn ranked(store: &SnapshotStore) -> Vec<&UserSnapshot> {
    let mut rows: Vec<&UserSnapshot> = store.entries.values().collect();
    rows.sort_by(|a, b| b.rating.cmp(&a.rating));
    rows
}

/// Returns the number of data rows written.
pub fn write_snapshots<W: Write>(out: W, store: &SnapshotStore) -> Result<usize> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(SNAPSHOT_HEADER)?;

    let rows = ranked(store);
    for snap in &rows {
        writer.write_record([
            snap.handle.clone(),
            snap.rating.to_string(),
            snap.rank.clone(),
            snap.max_rating.to_string(),
            snap.max_rank.clone(),
            snap.last_updated.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(rows.len())
}

pub fn history_header(years: &[i32]) -> Vec<String> {
    let mut header = vec!["Handle".to_string()];
    for year in years {
        header.push(format!("{year} Rating"));
        header.push(format!("{year} Rank"));
        header.push(format!("{year} Contest Date"));
    }
    header
}

/// One row per handle. A handle without points gets blank cells for every year.
pub fn write_history<W: Write>(
    out: W,
    years: &[i32],
    rows: &[(String, Vec<HistoricalPoint>)],
) -> Result<usize> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(history_header(years))?;

    for (handle, points) in rows {
        let mut record = vec![handle.clone()];
        for year in years {
            match points
                .iter()
                .find(|p| p.year == *year)
                .and_then(|p| p.entry.as_ref())
            {
                Some(entry) => {
                    record.push(entry.new_rating.to_string());
                    record.push(title_case(entry.rank()));
                    record.push(entry.contest_date());
                }
                None => record.extend([String::new(), String::new(), String::new()]),
            }
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RatingHistoryEntry;
    use chrono::{TimeZone, Utc};

    fn snap(handle: &str, rating: i64) -> UserSnapshot {
        UserSnapshot {
            handle: handle.to_string(),
            rating,
            rank: "expert".to_string(),
            max_rating: rating + 50,
            max_rank: "candidate master".to_string(),
            last_updated: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn snapshot_csv_sorted_by_rating() {
        let mut store = SnapshotStore::new();
        store.merge([snap("low", 1650), snap("high", 1880)]);

        let mut buf = Vec::new();
        let count = write_snapshots(&mut buf, &store).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(count, 2);
        assert_eq!(lines[0], "Handle,Rating,Rank,Max Rating,Max Rank,Last Updated");
        assert_eq!(lines[1], "high,1880,expert,1930,candidate master,2024-05-01T08:00:00+00:00");
        assert!(lines[2].starts_with("low,1650,"));
    }

    #[test]
    fn history_csv_blank_cells_when_unmatched() {
        let points = vec![
            HistoricalPoint {
                year: 2023,
                entry: Some(RatingHistoryEntry {
                    contest_id: Some(1800),
                    contest_name: None,
                    rating_update_time: 1_678_838_400,
                    old_rating: 2050,
                    new_rating: 2110,
                }),
            },
            HistoricalPoint {
                year: 2024,
                entry: None,
            },
        ];
        let rows = vec![
            ("alice".to_string(), points),
            ("ghost".to_string(), Vec::new()),
        ];

        let mut buf = Vec::new();
        write_history(&mut buf, &[2023, 2024], &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Handle,2023 Rating,2023 Rank,2023 Contest Date,2024 Rating,2024 Rank,2024 Contest Date"
        );
        assert_eq!(lines[1], "alice,2110,Master,2023-03-15,,,");
        assert_eq!(lines[2], "ghost,,,,,,");
    }
}
