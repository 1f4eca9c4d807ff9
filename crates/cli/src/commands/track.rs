use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use tracing::info;

use cftrack_api::{ChunkedFetcher, FetchOptions, UserInfoSource};
use cftrack_core::{DiffResult, SnapshotStore, diff, handles};

use crate::config::AppConfig;
use crate::progress;
use crate::render::{self, Theme};

#[derive(Args)]
pub struct TrackArgs {
    /// Handles file (default: from config)
    #[arg(long)]
    handles: Option<PathBuf>,

    /// Snapshot file (default: from config)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Show changes without saving the new snapshot
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug)]
pub struct TrackReport {
    pub results: Vec<DiffResult>,
    pub unresolved: Vec<String>,
    pub saved: bool,
}

pub async fn run(args: TrackArgs, config: &AppConfig, theme: &Theme) -> Result<()> {
    let handles_path = args.handles.unwrap_or_else(|| config.files.handles.clone());
    let data_path = args.data.unwrap_or_else(|| config.files.data.clone());

    let handles = handles::dedup(handles::load(&handles_path)?);
    if handles.is_empty() {
        println!(
            "No handles found in {}. Add some handles and try again.",
            handles_path.display()
        );
        return Ok(());
    }

    let client = config.client();
    if !client.is_signed() {
        info!("No API credentials configured, using unauthenticated requests");
    }

    let spinner = progress::create_spinner(&format!(
        "Fetching {} handles from Codeforces...",
        handles.len()
    ));
    let report = refresh(
        &client,
        config.fetch_options(),
        &handles,
        &data_path,
        args.dry_run,
    )
    .await;
    spinner.finish_and_clear();

    let Some(report) = report? else {
        println!("Failed to fetch data from the Codeforces API. Please try again later.");
        return Ok(());
    };

    println!("Fetched {} of {} handles", report.results.len(), handles.len());
    if !report.unresolved.is_empty() {
        println!("Could not resolve: {}", report.unresolved.join(", "));
    }

    println!();
    println!("{}", theme.heading.apply_to("Results:"));
    println!("{}", render::diff_table(theme, &report.results));

    if report.saved {
        println!("\nData saved to {}", data_path.display());
    } else {
        println!("\nDry run, {} not updated.", data_path.display());
    }
    Ok(())
}

/// Fetch `handles`, diff against the store at `data_path` and, unless
/// `dry_run`, merge and save. `None` when nothing was fetched; the store
/// file is then left as it was.
pub async fn refresh<S: UserInfoSource + ?Sized>(
    source: &S,
    options: FetchOptions,
    handles: &[String],
    data_path: &Path,
    dry_run: bool,
) -> Result<Option<TrackReport>> {
    if handles.is_empty() {
        return Ok(None);
    }

    let mut store = SnapshotStore::load(data_path)?;
    let outcome = ChunkedFetcher::new(source, options).fetch(handles).await;
    if outcome.snapshots.is_empty() {
        return Ok(None);
    }

    let results = diff(&outcome.snapshots, &store.entries);
    if !dry_run {
        store.merge(outcome.snapshots);
        store.save(data_path)?;
    }

    Ok(Some(TrackReport {
        results,
        unresolved: outcome.unresolved,
        saved: !dry_run,
    }))
}
