//! Core data models for fetched records, diagnostics and summaries.

mod diagnostic;
mod record;
mod summary;

pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, LengthUnit};
pub use record::{RecordBuilder, SourceKind, SourceRecord};
pub use summary::{SummaryFailure, SummaryResult};
