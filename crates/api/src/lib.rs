pub mod client;
pub mod error;
pub mod fetcher;
pub mod signer;
pub mod types;

pub use client::{ClientConfig, CodeforcesClient, UserInfoSource};
pub use error::ApiError;
pub use fetcher::{ChunkedFetcher, FetchOptions, FetchOutcome};
pub use signer::Signer;
