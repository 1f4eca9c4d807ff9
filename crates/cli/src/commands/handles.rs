use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use cftrack_api::ChunkedFetcher;
use cftrack_core::handles;

use crate::config::AppConfig;
use crate::progress;

#[derive(Args)]
pub struct HandlesArgs {
    /// Handles file (default: from config)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    action: HandlesAction,
}

#[derive(Subcommand)]
enum HandlesAction {
    /// Print the handles in the file
    List,
    /// Append handles without checking them
    Add {
        /// Handles to add (default: read from stdin, one per line)
        handles: Vec<String>,
    },
    /// Append only handles that exist on Codeforces
    Validate {
        /// Handles to check (default: read from stdin, one per line)
        handles: Vec<String>,
    },
}

pub async fn run(args: HandlesArgs, config: &AppConfig) -> Result<()> {
    let path = args.file.unwrap_or_else(|| config.files.handles.clone());
    match args.action {
        HandlesAction::List => {
            let list = handles::load(&path)?;
            if list.is_empty() {
                println!("No handles in {}.", path.display());
            } else {
                for handle in &list {
                    println!("{handle}");
                }
                println!("\nTotal: {}", list.len());
            }
        }
        HandlesAction::Add { handles: candidates } => {
            let Some((existing, new)) = collect_new(&path, candidates)? else {
                return Ok(());
            };
            handles::append(&path, &new)?;
            println!("Added {} new handles to {}.", new.len(), path.display());
            println!("Total handles in file: {}", existing.len() + new.len());
        }
        HandlesAction::Validate { handles: candidates } => {
            let Some((existing, new)) = collect_new(&path, candidates)? else {
                return Ok(());
            };
            validate(&path, config, existing, new).await?;
        }
    }
    Ok(())
}

/// Existing roster plus the candidates not already in it, or `None` when
/// there is nothing to do.
fn collect_new(path: &Path, from_args: Vec<String>) -> Result<Option<(Vec<String>, Vec<String>)>> {
    let candidates = if from_args.is_empty() {
        read_stdin()?
    } else {
        from_args
    };
    let candidates: Vec<String> = candidates
        .iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();
    if candidates.is_empty() {
        println!("No handles provided.");
        return Ok(None);
    }

    let existing = handles::load(path)?;
    let new = handles::new_handles(&candidates, &existing);
    if new.is_empty() {
        println!("All handles already exist in the file. No changes made.");
        return Ok(None);
    }
    Ok(Some((existing, new)))
}

fn read_stdin() -> Result<Vec<String>> {
    println!("Enter Codeforces handles (one per line). Press Ctrl+D when done:");
    let lines = std::io::stdin().lock().lines().collect::<std::io::Result<Vec<_>>>()?;
    Ok(lines)
}

async fn validate(
    path: &Path,
    config: &AppConfig,
    existing: Vec<String>,
    candidates: Vec<String>,
) -> Result<()> {
    let client = config.client();
    let spinner = progress::create_spinner(&format!("Validating {} handles...", candidates.len()));
    let outcome = ChunkedFetcher::new(&client, config.fetch_options())
        .fetch(&candidates)
        .await;
    spinner.finish_and_clear();

    // user.info matches case-insensitively and answers with the canonical handle
    let resolved: Vec<String> = candidates
        .iter()
        .filter_map(|h| outcome.get(h).map(|s| s.handle.clone()))
        .collect();
    let valid = handles::new_handles(&resolved, &existing);
    let invalid: Vec<&String> = candidates
        .iter()
        .filter(|h| !resolved.iter().any(|r| r.eq_ignore_ascii_case(h)))
        .collect();

    if valid.is_empty() {
        println!("\nNo valid handles found.");
    } else {
        println!("\nValid handles ({}):", valid.len());
        for handle in &valid {
            println!("  ✓ {handle}");
        }
        handles::append(path, &valid)?;
        println!("\nAdded {} new handles to {}.", valid.len(), path.display());
    }

    if !invalid.is_empty() {
        println!("\nInvalid handles ({}):", invalid.len());
        for handle in &invalid {
            println!("  ✗ {handle}");
        }
    }

    println!("\nTotal handles in file: {}", existing.len() + valid.len());
    Ok(())
}
