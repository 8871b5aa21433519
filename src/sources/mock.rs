//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{SourceKind, SourceRecord};
use crate::sources::{SourceClient, SourceError, SourceResponse};

/// A mock source that returns a predefined response and counts calls.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    kind: SourceKind,
    response: Mutex<Option<Result<SourceResponse, SourceError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a new mock source that returns no records.
    pub fn new(id: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            response: Mutex::new(None),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock source that returns the given records.
    pub fn with_records(id: impl Into<String>, kind: SourceKind, records: Vec<SourceRecord>) -> Self {
        let source = Self::new(id, kind);
        source.set_response(Ok(SourceResponse::new(records)));
        source
    }

    /// Create a mock source that always fails with `error`.
    pub fn failing(id: impl Into<String>, kind: SourceKind, error: SourceError) -> Self {
        let source = Self::new(id, kind);
        source.set_response(Err(error));
        source
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the response to return.
    pub fn set_response(&self, response: Result<SourceResponse, SourceError>) {
        let mut guard = self.response.lock().unwrap();
        *guard = Some(response);
    }

    /// Number of times `search` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(&self, _topic: &str, _max_results: usize) -> Result<SourceResponse, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let guard = self.response.lock().unwrap();
        match &*guard {
            Some(response) => response.clone(),
            None => Ok(SourceResponse::default()),
        }
    }
}

/// Helper function to create a record with a body of `words` words.
pub fn make_record(kind: SourceKind, title: &str, words: usize) -> SourceRecord {
    let body = (0..words)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ");
    SourceRecord::new(kind, "mock", title, body)
}
