//! # Research Digest
//!
//! Summarizes a topic from two kinds of sources: organic web search snippets
//! and recent arXiv abstracts.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (SourceRecord, Diagnostic, SummaryResult)
//! - [`sources`]: Web and paper search clients behind the `SourceClient` trait
//! - [`context`]: Word-budgeted packing of records into summarizer input
//! - [`summarizer`]: Model handle, input ceiling and the summarization call
//! - [`pipeline`]: Orchestration of one query, end to end
//! - [`utils`]: HTTP client, retry and deduplication
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering for the CLI

pub mod config;
pub mod context;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod summarizer;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use context::{ContextBuffer, ContextBuilder, SourceGroup};
pub use models::{Diagnostic, SourceKind, SourceRecord, SummaryFailure, SummaryResult};
pub use pipeline::{DigestReport, Outcome, Pipeline};
pub use sources::{SourceClient, SourceRegistry};
pub use summarizer::Summarizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
