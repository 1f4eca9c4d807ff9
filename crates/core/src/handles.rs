use std::collections::HashSet;
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

const HEADER: &str = "# Add Codeforces handles below (one per line)\n";

/// Read the roster, skipping blank lines and `#` comments.
///
/// A missing file is created with a comment header and yields no handles.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "handles file not found, creating an empty one");
            std::fs::write(path, HEADER)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Vec::new())
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

pub fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Drop repeated handles, keeping the first occurrence.
pub fn dedup(handles: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    handles
        .into_iter()
        .filter(|h| seen.insert(h.clone()))
        .collect()
}

/// Candidates not already in `existing`, deduplicated.
pub fn new_handles(candidates: &[String], existing: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    dedup(
        candidates
            .iter()
            .filter(|h| !existing.contains(h.as_str()))
            .cloned(),
    )
}

pub fn append(path: impl AsRef<Path>, handles: &[String]) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for handle in handles {
        writeln!(file, "{handle}")?;
    }
    info!(path = %path.display(), added = handles.len(), "handles appended");
    Ok(())
}
