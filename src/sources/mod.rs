//! Source clients that fetch records about a topic from external providers.
//!
//! This module defines the [`SourceClient`] trait that every provider
//! implements. Two families exist:
//!
//! - [`WebSearchClient`]: organic web search snippets, backed by either
//!   Serper or SerpAPI (see [`WebProvider`])
//! - [`ArxivClient`]: recent arXiv abstracts for the topic
//!
//! Clients never fail the caller. [`SourceClient::search`] returns a typed
//! [`SourceError`]; the provided [`SourceClient::fetch`] turns any error into a
//! diagnostic on the shared [`Diagnostics`] channel and an empty result, so a
//! dead provider only means fewer records.
//!
//! # Runtime Configuration
//!
//! - `SERPER_API_KEY` - key for the Serper web provider
//! - `SERPAPI_API_KEY` - key for the SerpAPI web provider
//!
//! A missing key is reported as [`DiagnosticKind::CredentialsMissing`], which
//! is distinct from a search that simply found nothing.

mod arxiv;
mod registry;
mod web;

pub mod mock;

pub use arxiv::ArxivClient;
pub use mock::MockSource;
pub use registry::SourceRegistry;
pub use web::{WebProvider, WebSearchClient};

use async_trait::async_trait;

use crate::models::{DiagnosticKind, Diagnostics, SourceKind, SourceRecord};

/// Records returned by one provider call, plus reasons for any records that
/// had to be skipped while parsing.
#[derive(Debug, Clone, Default)]
pub struct SourceResponse {
    pub records: Vec<SourceRecord>,
    pub skipped: Vec<String>,
}

impl SourceResponse {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            skipped: Vec::new(),
        }
    }

    /// Note a record that was dropped during parsing
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skipped.push(reason.into());
    }
}

/// A provider of records for a topic.
///
/// Implementors provide [`search`](SourceClient::search); callers use
/// [`fetch`](SourceClient::fetch), which never fails.
#[async_trait]
pub trait SourceClient: Send + Sync + std::fmt::Debug {
    /// Short identifier of the provider (e.g. "serper", "arxiv")
    fn id(&self) -> &str;

    /// Kind of records this client yields
    fn kind(&self) -> SourceKind;

    /// Query the provider for up to `max_results` records about `topic`
    async fn search(&self, topic: &str, max_results: usize)
        -> Result<SourceResponse, SourceError>;

    /// Fetch usable records, reporting every problem as a diagnostic.
    async fn fetch(
        &self,
        topic: &str,
        max_results: usize,
        diagnostics: &Diagnostics,
    ) -> Vec<SourceRecord> {
        match self.search(topic, max_results).await {
            Ok(response) => {
                for reason in response.skipped {
                    diagnostics.report(self.id(), DiagnosticKind::Parse(reason));
                }
                let records: Vec<SourceRecord> = response
                    .records
                    .into_iter()
                    .filter(SourceRecord::is_usable)
                    .take(max_results)
                    .collect();
                tracing::debug!("{} returned {} records for {:?}", self.id(), records.len(), topic);
                records
            }
            Err(err) => {
                diagnostics.report(self.id(), err.diagnostic_kind());
                Vec::new()
            }
        }
    }
}

/// Errors that can occur when talking to a provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The provider needs an API key that is not configured
    #[error("API key is not configured")]
    CredentialsMissing,

    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The provider answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Map the error onto the diagnostic taxonomy
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            SourceError::CredentialsMissing => DiagnosticKind::CredentialsMissing,
            SourceError::Parse(msg) => DiagnosticKind::Parse(msg.clone()),
            other => DiagnosticKind::Transport(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry credentials (SerpAPI's api_key)
        let err = err.without_url();
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_kind_mapping() {
        assert_eq!(
            SourceError::CredentialsMissing.diagnostic_kind(),
            DiagnosticKind::CredentialsMissing
        );
        assert_eq!(
            SourceError::Parse("bad xml".into()).diagnostic_kind(),
            DiagnosticKind::Parse("bad xml".into())
        );
        assert!(matches!(
            SourceError::Timeout("20s".into()).diagnostic_kind(),
            DiagnosticKind::Transport(_)
        ));
        assert!(matches!(
            SourceError::Api {
                status: 500,
                message: "boom".into()
            }
            .diagnostic_kind(),
            DiagnosticKind::Transport(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_filters_unusable_and_reports_skips() {
        let source = MockSource::new("mock", SourceKind::Web);
        let mut response = SourceResponse::new(vec![
            SourceRecord::new(SourceKind::Web, "mock", "kept", "some text"),
            SourceRecord::new(SourceKind::Web, "mock", "blank", "   "),
        ]);
        response.skip("item 3: missing snippet");
        source.set_response(Ok(response));

        let diagnostics = Diagnostics::new();
        let records = source.fetch("topic", 10, &diagnostics).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "kept");
        assert!(diagnostics.any_from("mock", |k| matches!(k, DiagnosticKind::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_swallows_errors() {
        let source = MockSource::new("mock", SourceKind::Paper);
        source.set_response(Err(SourceError::Network("connection reset".into())));

        let diagnostics = Diagnostics::new();
        let records = source.fetch("topic", 3, &diagnostics).await;

        assert!(records.is_empty());
        assert!(diagnostics.any_from("mock", |k| matches!(k, DiagnosticKind::Transport(_))));
    }
}
