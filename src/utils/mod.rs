//! Utility modules supporting the digest pipeline.
//!
//! - [`HttpClient`]: shared reqwest client with bounded timeouts
//! - [`with_retry`]: execute an operation with retry on transient errors
//! - [`deduplicate_records`]: drop near-duplicate snippets before packing
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use research_digest::sources::SourceError;
//! use research_digest::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::default().max_attempts(2);
//! let data = with_retry(config, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod dedup;
mod http;
mod retry;

pub use dedup::{deduplicate_records, find_duplicates, DEFAULT_DEDUP_THRESHOLD};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use retry::{fetch_retry_config, with_retry, RetryConfig, TransientError};
