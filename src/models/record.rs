//! Normalized record shape shared by every source.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of source produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Paper,
}

impl SourceKind {
    /// Returns the display name of the source kind
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Web => "Web",
            SourceKind::Paper => "Paper",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single unit of fetched content, normalized across providers.
///
/// `body` holds the text that is fed to summarization: the organic snippet for
/// web results, the abstract for papers. Everything else is display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Kind of source that produced this record
    pub source_kind: SourceKind,

    /// Provider id (e.g. "serper", "arxiv")
    pub provider: String,

    /// Title, possibly empty
    pub title: String,

    /// Snippet or abstract
    pub body: String,

    /// Link to the original page or paper
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Publication date (papers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDate>,

    /// Author names in byline order (papers only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
}

impl SourceRecord {
    /// Create a record with the required fields
    pub fn new(
        source_kind: SourceKind,
        provider: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_kind,
            provider: provider.into(),
            title: title.into(),
            body: body.into(),
            url: None,
            published_at: None,
            authors: Vec::new(),
        }
    }

    /// Whether the record carries any text worth summarizing
    pub fn is_usable(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Whether this record came from a web provider
    pub fn is_web(&self) -> bool {
        self.source_kind == SourceKind::Web
    }

    /// Returns the publication year, if known
    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.published_at.map(|d| d.year())
    }
}

/// Builder for constructing SourceRecord objects
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: SourceRecord,
}

impl RecordBuilder {
    /// Create a new builder with required fields
    pub fn new(
        source_kind: SourceKind,
        provider: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            record: SourceRecord::new(source_kind, provider, title, body),
        }
    }

    /// Set the url; empty strings are ignored
    pub fn url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.trim().is_empty() {
            self.record.url = Some(url);
        }
        self
    }

    /// Set the publication date
    pub fn published_at(mut self, date: Option<NaiveDate>) -> Self {
        self.record.published_at = date;
        self
    }

    /// Set authors
    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.record.authors = authors;
        self
    }

    /// Build the SourceRecord
    pub fn build(self) -> SourceRecord {
        self.record
    }
}
