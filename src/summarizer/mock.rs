//! Mock summarization model for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{LengthBounds, SummarizerError, SummaryModel};

/// A mock model that returns a fixed reply and records every call.
#[derive(Debug)]
pub struct MockModel {
    reply: Result<String, SummarizerError>,
    delay: Option<Duration>,
    concurrency_safe: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    inputs: Mutex<Vec<String>>,
    last_bounds: Mutex<Option<LengthBounds>>,
}

impl MockModel {
    fn with_reply(reply: Result<String, SummarizerError>) -> Self {
        Self {
            reply,
            delay: None,
            concurrency_safe: false,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            last_bounds: Mutex::new(None),
        }
    }

    /// Create a model that always returns `summary`.
    pub fn replying(summary: impl Into<String>) -> Self {
        Self::with_reply(Ok(summary.into()))
    }

    /// Create a model whose inference always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Err(SummarizerError::Inference(message.into())))
    }

    /// Wait this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Declare the model safe to call concurrently.
    pub fn concurrent(mut self) -> Self {
        self.concurrency_safe = true;
        self
    }

    /// Number of times `generate` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `generate` calls seen.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every input the model received, in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    /// Bounds passed to the most recent call.
    pub fn last_bounds(&self) -> Option<LengthBounds> {
        *self.last_bounds.lock().unwrap()
    }
}

#[async_trait]
impl SummaryModel for MockModel {
    fn id(&self) -> &str {
        "mock"
    }

    fn concurrency_safe(&self) -> bool {
        self.concurrency_safe
    }

    async fn generate(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.inputs.lock().unwrap().push(text.to_string());
        *self.last_bounds.lock().unwrap() = Some(bounds);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reply.clone()
    }
}
