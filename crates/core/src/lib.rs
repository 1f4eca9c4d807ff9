pub mod diff;
pub mod export;
pub mod handles;
pub mod history;
pub mod rank;
pub mod snapshot;

pub use diff::{DiffResult, RankTransition, diff};
pub use history::{HistoricalPoint, RatingHistoryEntry};
pub use snapshot::{SnapshotStore, UserSnapshot};
