//! arXiv paper source implementation.

use async_trait::async_trait;
use feed_rs::parser;
use std::sync::Arc;

use crate::models::{RecordBuilder, SourceKind, SourceRecord};
use crate::sources::{SourceClient, SourceError, SourceResponse};
use crate::utils::{fetch_retry_config, with_retry, HttpClient, RetryConfig};

/// Base URL for arXiv API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// arXiv's hard cap on results per request
const ARXIV_MAX_RESULTS: usize = 200;

/// Id prefix of the pseudo-entries arXiv returns for malformed queries
const ARXIV_ERROR_ID_PREFIX: &str = "http://arxiv.org/api/errors";

/// arXiv paper source
///
/// Queries the Atom API for the most recently submitted papers matching the
/// topic and returns their abstracts.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl ArxivClient {
    /// Create a new arXiv client
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
            retry: fetch_retry_config(true),
        }
    }

    /// Point the client at a different endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build a full-text search query: every term must appear somewhere
    fn build_search_query(topic: &str) -> String {
        let terms: Vec<String> = topic
            .split_whitespace()
            .map(|t| format!("all:{}", t))
            .collect();

        if terms.is_empty() {
            "all:*".to_string()
        } else {
            terms.join(" AND ")
        }
    }

    fn build_url(&self, topic: &str, max_results: usize) -> String {
        format!(
            "{}?search_query={}&sortBy=submittedDate&sortOrder=descending&start=0&max_results={}",
            self.base_url,
            urlencoding::encode(&Self::build_search_query(topic)),
            max_results.min(ARXIV_MAX_RESULTS)
        )
    }

    /// Parse an arXiv Atom feed entry into a record.
    ///
    /// Missing metadata degrades to empty values; only a missing abstract
    /// makes the entry unusable.
    fn parse_entry(entry: &feed_rs::model::Entry) -> Result<SourceRecord, String> {
        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| collapse_whitespace(&s.content))
            .unwrap_or_default();

        if entry.id.starts_with(ARXIV_ERROR_ID_PREFIX) {
            return Err(format!("arXiv rejected the query: {}", abstract_text));
        }

        if abstract_text.is_empty() {
            return Err(format!("entry {} has no abstract", entry.id));
        }

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let authors = entry
            .authors
            .iter()
            .map(|a| collapse_whitespace(&a.name))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();

        let published_at = entry.published.or(entry.updated).map(|d| d.date_naive());

        Ok(
            RecordBuilder::new(SourceKind::Paper, "arxiv", title, abstract_text)
                .url(entry.id.clone())
                .published_at(published_at)
                .authors(authors)
                .build(),
        )
    }

    /// Parse a whole feed body
    fn parse_feed(bytes: &[u8]) -> Result<SourceResponse, SourceError> {
        let feed = parser::parse(bytes)
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let mut response = SourceResponse::default();
        for entry in &feed.entries {
            match Self::parse_entry(entry) {
                Ok(record) => response.records.push(record),
                Err(reason) => response.skip(reason),
            }
        }
        Ok(response)
    }
}

/// Collapse runs of whitespace (arXiv wraps abstracts at ~80 columns)
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl SourceClient for ArxivClient {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Paper
    }

    async fn search(&self, topic: &str, max_results: usize) -> Result<SourceResponse, SourceError> {
        if max_results == 0 || topic.trim().is_empty() {
            return Ok(SourceResponse::default());
        }

        let url = self.build_url(topic, max_results);
        tracing::debug!("arXiv query: {}", url);

        let client = Arc::clone(&self.client);

        // Execute search with retry logic for transient errors
        let bytes = with_retry(self.retry, || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move {
                let response = client
                    .get(&url)
                    .header("Accept", "application/atom+xml")
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(SourceError::Api {
                        status: response.status().as_u16(),
                        message: format!("arXiv API returned status: {}", response.status()),
                    });
                }

                Ok(response.bytes().await?)
            }
        })
        .await?;

        Self::parse_feed(bytes.as_ref())
    }
}
