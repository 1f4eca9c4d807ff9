use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::{info, warn};

use cftrack_core::history::{self, HistoricalPoint, RatingHistoryEntry};
use cftrack_core::{export, handles};

use crate::config::AppConfig;
use crate::progress;
use crate::render::{self, Theme};

const DEFAULT_CSV: &str = "historical_codeforces_ranks.csv";

#[derive(Args)]
pub struct HistoryArgs {
    /// Handles to look up (default: the handles file)
    handles: Vec<String>,

    /// Target years, comma separated
    #[arg(long, value_delimiter = ',')]
    years: Option<Vec<i32>>,

    /// Target month (1-12)
    #[arg(long)]
    month: Option<u32>,

    /// Target day of month
    #[arg(long)]
    day: Option<u32>,

    /// Maximum distance in days between the target date and a contest
    #[arg(long)]
    tolerance_days: Option<i64>,

    /// Write CSV instead of printing a table
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_CSV)]
    csv: Option<PathBuf>,
}

pub async fn run(args: HistoryArgs, config: &AppConfig, theme: &Theme) -> Result<()> {
    let handles = if args.handles.is_empty() {
        handles::load(&config.files.handles)?
    } else {
        args.handles.iter().map(|h| h.trim().to_string()).collect()
    };
    let handles = handles::dedup(handles.into_iter().filter(|h| !h.is_empty()));
    if handles.is_empty() {
        println!(
            "No handles provided. Add handles to {} or pass them as arguments.",
            config.files.handles.display()
        );
        return Ok(());
    }

    let years = args.years.unwrap_or_else(|| config.history.years.clone());
    let month = args.month.unwrap_or(config.history.month);
    let day = args.day.unwrap_or(config.history.day);
    let tolerance =
        tolerance_secs(args.tolerance_days.unwrap_or(config.history.tolerance_days))?;
    for year in &years {
        history::target_timestamp(*year, month, day)?;
    }

    let client = config.client();
    let delay = config.request_delay();
    let pb = progress::create_progress(handles.len() as u64, "handles");
    let mut rows: Vec<(String, Vec<HistoricalPoint>)> = Vec::new();

    for (i, handle) in handles.iter().enumerate() {
        pb.set_message(handle.clone());
        let points = match client.user_rating(handle).await {
            Ok(changes) => {
                let entries: Vec<RatingHistoryEntry> =
                    changes.into_iter().map(Into::into).collect();
                if entries.is_empty() {
                    info!(handle = %handle, "no rated contests");
                }
                history::resolve_years(&entries, &years, month, day, tolerance)?
            }
            Err(e) => {
                warn!(handle = %handle, error = %e, "failed to fetch rating history");
                Vec::new()
            }
        };
        rows.push((handle.clone(), points));
        pb.inc(1);

        if i + 1 < handles.len() {
            tokio::time::sleep(delay).await;
        }
    }
    pb.finish_with_message("done");

    match args.csv {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            export::write_history(file, &years, &rows)?;
            println!("Historical data exported to {}", path.display());
            println!("Total handles processed: {}", rows.len());
        }
        None => {
            println!();
            println!(
                "{}",
                theme.heading.apply_to(format!(
                    "Historical Codeforces ratings nearest to {month:02}-{day:02}:"
                ))
            );
            println!("{}", render::history_table(theme, &years, &rows));
        }
    }
    Ok(())
}

fn tolerance_secs(days: i64) -> Result<i64> {
    if days < 0 {
        bail!("tolerance must not be negative, got {days} days");
    }
    match days.checked_mul(86_400) {
        Some(secs) => Ok(secs),
        None => bail!("tolerance of {days} days is too large"),
    }
}
