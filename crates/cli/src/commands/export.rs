use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cftrack_core::{SnapshotStore, export};

use crate::config::AppConfig;

#[derive(Args)]
pub struct ExportArgs {
    /// CSV file to write
    #[arg(short, long, default_value = "codeforces_ranks.csv")]
    output: PathBuf,

    /// Snapshot file (default: from config)
    #[arg(long)]
    data: Option<PathBuf>,
}

pub async fn run(args: ExportArgs, config: &AppConfig) -> Result<()> {
    let data_path = args.data.unwrap_or_else(|| config.files.data.clone());
    if !data_path.exists() {
        println!(
            "{} not found. Run `cftrack track` first.",
            data_path.display()
        );
        return Ok(());
    }

    let store = SnapshotStore::load(&data_path)?;
    if store.is_empty() {
        println!("No user data found.");
        return Ok(());
    }

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let count = export::write_snapshots(file, &store)?;

    println!("Data exported to {}", args.output.display());
    println!("Total records: {count}");
    Ok(())
}
