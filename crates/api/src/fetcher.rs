//! Chunked `user.info` fetching with per-handle fallback.
//!
//! Handles go out in batches small enough to keep the URL under the
//! provider's limit. A batch that fails because of a single unknown handle
//! is retried without it; any other failure falls back to one request per
//! handle. Nothing here is fatal: handles that never resolve are reported
//! in [`FetchOutcome::unresolved`].

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use cftrack_core::UserSnapshot;
use cftrack_core::handles::dedup;

use crate::client::UserInfoSource;
use crate::error::ApiError;
use crate::types::User;

pub const DEFAULT_CHUNK_SIZE: usize = 20;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub chunk_size: usize,
    /// Pause after every request.
    pub delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delay: DEFAULT_DELAY,
        }
    }
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Resolved users, in the order their handles were requested.
    pub snapshots: Vec<UserSnapshot>,
    pub unresolved: Vec<String>,
}

impl FetchOutcome {
    /// Case-insensitive lookup, as `user.info` answers with the canonical handle.
    pub fn get(&self, handle: &str) -> Option<&UserSnapshot> {
        self.snapshots
            .iter()
            .find(|s| s.handle.eq_ignore_ascii_case(handle))
    }
}

/// Contiguous chunks of at most `chunk_size` handles (minimum 1).
pub fn chunks(handles: &[String], chunk_size: usize) -> impl Iterator<Item = &[String]> {
    handles.chunks(chunk_size.max(1))
}

pub struct ChunkedFetcher<'a, S: UserInfoSource + ?Sized> {
    source: &'a S,
    options: FetchOptions,
}

impl<'a, S: UserInfoSource + ?Sized> ChunkedFetcher<'a, S> {
    pub fn new(source: &'a S, options: FetchOptions) -> Self {
        Self { source, options }
    }

    pub async fn fetch(&self, handles: &[String]) -> FetchOutcome {
        let handles = dedup(handles.iter().cloned());
        let chunk_size = self.options.chunk_size.max(1);
        let mut outcome = FetchOutcome::default();

        info!(handles = handles.len(), chunk_size, "fetching user info");
        for (i, chunk) in chunks(&handles, chunk_size).enumerate() {
            let first = i * chunk_size + 1;
            debug!(
                from = first,
                to = first + chunk.len() - 1,
                total = handles.len(),
                "processing chunk"
            );
            self.fetch_chunk(chunk, &mut outcome).await;
        }

        info!(
            resolved = outcome.snapshots.len(),
            unresolved = outcome.unresolved.len(),
            "fetch complete"
        );
        outcome
    }

    async fn fetch_chunk(&self, chunk: &[String], outcome: &mut FetchOutcome) {
        let mut pending: Vec<String> = chunk.to_vec();

        while !pending.is_empty() {
            let result = self.request(&pending).await;
            match result {
                Ok(users) => {
                    self.record(&pending, users, outcome);
                    return;
                }
                Err(e) => {
                    let named = e
                        .missing_handle()
                        .and_then(|h| pending.iter().position(|p| p == h));
                    match named {
                        Some(idx) => {
                            let invalid = pending.remove(idx);
                            warn!(handle = %invalid, "handle not found, retrying rest of chunk");
                            outcome.unresolved.push(invalid);
                        }
                        None => {
                            warn!(error = %e, handles = pending.len(), "batch failed, checking handles one by one");
                            self.fetch_individually(&pending, outcome).await;
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn fetch_individually(&self, handles: &[String], outcome: &mut FetchOutcome) {
        for handle in handles {
            let requested = std::slice::from_ref(handle);
            match self.request(requested).await {
                Ok(users) => self.record(requested, users, outcome),
                Err(e) => {
                    warn!(handle = %handle, error = %e, "handle could not be resolved");
                    outcome.unresolved.push(handle.clone());
                }
            }
        }
    }

    async fn request(&self, handles: &[String]) -> Result<Vec<User>, ApiError> {
        let result = self.source.user_info(handles).await;
        tokio::time::sleep(self.options.delay).await;
        result
    }

    /// Store the returned users in request order. Requested handles the
    /// response left out are unresolved.
    fn record(&self, requested: &[String], users: Vec<User>, outcome: &mut FetchOutcome) {
        let now = Utc::now();
        let mut users: Vec<Option<User>> = users.into_iter().map(Some).collect();
        for handle in requested {
            let found = users
                .iter_mut()
                .find(|u| matches!(u, Some(user) if user.handle.eq_ignore_ascii_case(handle)))
                .and_then(Option::take);
            match found {
                Some(user) => outcome.snapshots.push(user.into_snapshot(now)),
                None => {
                    warn!(handle = %handle, "no user returned");
                    outcome.unresolved.push(handle.clone());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory stand-in for the API.
    #[derive(Default)]
    struct FakeSource {
        known: HashSet<String>,
        /// Batches larger than one handle fail with an undecodable response.
        break_batches: bool,
        /// Report only the first unknown handle, like the real API.
        name_missing: bool,
        /// Known handles the batch response leaves out.
        omit: HashSet<String>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeSource {
        fn with_known(handles: &[&str]) -> Self {
            Self {
                known: handles.iter().map(|h| h.to_string()).collect(),
                name_missing: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserInfoSource for FakeSource {
        async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, ApiError> {
            self.calls.lock().unwrap().push(handles.to_vec());

            if self.break_batches && handles.len() > 1 {
                let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
                return Err(ApiError::Decode(err));
            }
            if let Some(missing) = handles.iter().find(|h| !self.known.contains(*h)) {
                let comment = if self.name_missing {
                    format!("handles: User with handle {missing} not found")
                } else {
                    "handles: something went wrong".to_string()
                };
                return Err(ApiError::Failed { comment });
            }
            Ok(handles
                .iter()
                .filter(|h| !self.omit.contains(*h))
                .enumerate()
                .map(|(i, h)| User {
                    handle: h.clone(),
                    rating: Some(1200 + i as i64 * 100),
                    rank: Some("pupil".to_string()),
                    max_rating: Some(1500),
                    max_rank: Some("specialist".to_string()),
                })
                .collect())
        }
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn options(chunk_size: usize) -> FetchOptions {
        FetchOptions {
            chunk_size,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn chunks_partition_input_in_order() {
        for len in 1..30 {
            let handles = names("h", len);
            for size in 1..=len + 2 {
                let parts: Vec<&[String]> = chunks(&handles, size).collect();
                assert!(parts.iter().all(|c| !c.is_empty() && c.len() <= size));
                let flat: Vec<String> = parts.concat();
                assert_eq!(flat, handles);
            }
        }
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let handles = names("h", 3);
        assert_eq!(chunks(&handles, 0).count(), 3);
    }

    #[tokio::test]
    async fn all_valid_one_request_per_chunk() {
        let handles = names("u", 45);
        let known: Vec<&str> = handles.iter().map(String::as_str).collect();
        let source = FakeSource::with_known(&known);

        let outcome = ChunkedFetcher::new(&source, options(20)).fetch(&handles).await;

        assert_eq!(outcome.snapshots.len(), 45);
        assert!(outcome.unresolved.is_empty());
        let sizes: Vec<usize> = source.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }

    #[tokio::test]
    async fn single_missing_handle_is_isolated() {
        let source = FakeSource::with_known(&["a", "b", "d"]);
        let handles = ["a", "b", "ghost", "d"].map(String::from);

        let outcome = ChunkedFetcher::new(&source, options(10)).fetch(&handles).await;

        let resolved: Vec<&str> = outcome.snapshots.iter().map(|s| s.handle.as_str()).collect();
        assert_eq!(resolved, vec!["a", "b", "d"]);
        assert_eq!(outcome.unresolved, vec!["ghost"]);
        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], vec!["a", "b", "d"]);
    }

    #[tokio::test]
    async fn several_missing_handles_are_peeled_off() {
        let source = FakeSource::with_known(&["a", "c"]);
        let handles = ["x", "a", "y", "c"].map(String::from);

        let outcome = ChunkedFetcher::new(&source, options(10)).fetch(&handles).await;

        assert_eq!(outcome.snapshots.len(), 2);
        assert_eq!(outcome.unresolved, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn unrecognised_error_falls_back_per_handle() {
        let mut source = FakeSource::with_known(&["a", "b"]);
        source.name_missing = false;
        let handles = ["a", "zz", "b"].map(String::from);

        let outcome = ChunkedFetcher::new(&source, options(10)).fetch(&handles).await;

        assert_eq!(outcome.snapshots.len(), 2);
        assert_eq!(outcome.unresolved, vec!["zz"]);
        // one batch, then one request per handle
        assert_eq!(source.calls().len(), 4);
    }

    #[tokio::test]
    async fn malformed_batch_still_yields_valid_subset() {
        let handles = names("s", 20);
        let known: Vec<&str> = handles
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != 0)
            .map(|(_, h)| h.as_str())
            .collect();
        let mut source = FakeSource::with_known(&known);
        source.break_batches = true;

        let outcome = ChunkedFetcher::new(&source, options(20)).fetch(&handles).await;

        assert_eq!(outcome.snapshots.len(), known.len());
        for handle in &known {
            let snap = outcome.get(handle).unwrap();
            assert_eq!(snap.rank, "pupil");
            assert_eq!(snap.max_rank, "specialist");
        }
        assert_eq!(outcome.unresolved.len(), 20 - known.len());
        assert_eq!(source.calls().len(), 21);
    }

    #[tokio::test]
    async fn duplicates_are_requested_once() {
        let source = FakeSource::with_known(&["a", "b"]);
        let handles = ["a", "b", "a"].map(String::from);

        let outcome = ChunkedFetcher::new(&source, options(10)).fetch(&handles).await;

        assert_eq!(outcome.snapshots.len(), 2);
        assert_eq!(source.calls()[0], vec!["a", "b"]);
    }

    #[tokio::test]
    async fn snapshots_follow_request_order() {
        let handles = ["zed", "mia", "amy", "bob"].map(String::from);
        let source = FakeSource::with_known(&["zed", "mia", "amy", "bob"]);

        let outcome = ChunkedFetcher::new(&source, options(3)).fetch(&handles).await;

        let order: Vec<&str> = outcome.snapshots.iter().map(|s| s.handle.as_str()).collect();
        assert_eq!(order, vec!["zed", "mia", "amy", "bob"]);
    }

    #[tokio::test]
    async fn handles_missing_from_response_are_unresolved() {
        let mut source = FakeSource::with_known(&["a", "b", "c"]);
        source.omit = ["b".to_string()].into_iter().collect();
        let handles = ["a", "b", "c"].map(String::from);

        let outcome = ChunkedFetcher::new(&source, options(10)).fetch(&handles).await;

        assert_eq!(outcome.snapshots.len(), 2);
        assert!(outcome.get("b").is_none());
        assert_eq!(outcome.unresolved, vec!["b"]);
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn canonical_handle_matches_request_case_insensitively() {
        struct Canonical;

        #[async_trait]
        impl UserInfoSource for Canonical {
            async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, ApiError> {
                Ok(handles
                    .iter()
                    .map(|h| User {
                        handle: h.to_uppercase(),
                        rating: Some(1500),
                        rank: Some("specialist".to_string()),
                        max_rating: Some(1500),
                        max_rank: Some("specialist".to_string()),
                    })
                    .collect())
            }
        }

        let handles = ["petr".to_string()];
        let outcome = ChunkedFetcher::new(&Canonical, options(10)).fetch(&handles).await;

        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.get("Petr").unwrap().handle, "PETR");
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let source = FakeSource::with_known(&[]);
        let outcome = ChunkedFetcher::new(&source, options(20)).fetch(&[]).await;
        assert!(outcome.snapshots.is_empty());
        assert!(source.calls().is_empty());
    }
}
