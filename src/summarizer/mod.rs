//! Abstractive summarization over the packed context.
//!
//! The model itself is an external capability behind the [`SummaryModel`]
//! trait. [`Summarizer`] wraps it with the rules every call must follow:
//!
//! - empty or whitespace-only input never reaches the model
//! - a model that failed to load is reported as unavailable, every time,
//!   without trying to load it again
//! - input longer than the model ceiling is prefix-truncated and the
//!   truncation is reported as a diagnostic
//! - calls on one model handle are serialized unless the model says it is
//!   safe to call concurrently
//!
//! The model handle is loaded lazily and at most once; see [`ModelHandle`].

mod huggingface;
mod limit;

pub mod mock;

pub use huggingface::HuggingFaceModel;
pub use limit::{InputLimit, LimitedInput};
pub use mock::MockModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

use crate::config::SummarizerConfig;
use crate::models::{DiagnosticKind, Diagnostics, SummaryFailure, SummaryResult};

/// Requested summary length, in model tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min_length: usize,
    pub max_length: usize,
}

impl LengthBounds {
    /// Create bounds; `min_length` is clamped to `max_length`
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length: min_length.min(max_length),
            max_length,
        }
    }

    pub fn from_config(config: &SummarizerConfig) -> Self {
        Self::new(config.min_length, config.max_length)
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self::new(30, 150)
    }
}

/// Errors raised by a summarization backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum SummarizerError {
    /// The model could not be loaded or configured
    #[error("model initialization failed: {0}")]
    Init(String),

    /// The model was invoked and failed
    #[error("{0}")]
    Inference(String),
}

/// An abstractive summarization model
#[async_trait]
pub trait SummaryModel: Send + Sync + fmt::Debug {
    /// Model identifier, for logs
    fn id(&self) -> &str;

    /// Whether the model may be invoked from several tasks at once
    fn concurrency_safe(&self) -> bool {
        false
    }

    /// Summarize `text` within `bounds`
    async fn generate(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizerError>;
}

type ModelLoader = dyn Fn() -> Result<Arc<dyn SummaryModel>, SummarizerError> + Send + Sync;

/// Lazily loaded, read-only model handle.
///
/// The loader runs at most once. Its outcome, success or failure, is kept for
/// the lifetime of the handle, so a broken model is not reloaded per query.
pub struct ModelHandle {
    loader: Box<ModelLoader>,
    model: OnceLock<Result<Arc<dyn SummaryModel>, String>>,
    gate: Mutex<()>,
}

static SHARED_MODEL: OnceLock<Arc<ModelHandle>> = OnceLock::new();

impl ModelHandle {
    /// Create a handle that loads the model on first use
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SummaryModel>, SummarizerError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            model: OnceLock::new(),
            gate: Mutex::new(()),
        }
    }

    /// Create a handle around an already loaded model
    pub fn ready(model: Arc<dyn SummaryModel>) -> Self {
        let handle = Self::new(|| Err(SummarizerError::Init("loader not used".to_string())));
        let _ = handle.model.set(Ok(model));
        handle
    }

    /// The process-wide handle. The first caller's loader wins; later
    /// loaders are ignored.
    pub fn shared<F>(loader: F) -> Arc<ModelHandle>
    where
        F: Fn() -> Result<Arc<dyn SummaryModel>, SummarizerError> + Send + Sync + 'static,
    {
        Arc::clone(SHARED_MODEL.get_or_init(|| Arc::new(ModelHandle::new(loader))))
    }

    /// The loaded model, loading it if this is the first call
    pub fn get(&self) -> Result<&Arc<dyn SummaryModel>, &str> {
        self.model
            .get_or_init(|| match (self.loader)() {
                Ok(model) => {
                    tracing::info!("Summarization model {} ready", model.id());
                    Ok(model)
                }
                Err(e) => {
                    tracing::error!("Summarization model failed to load: {}", e);
                    Err(e.to_string())
                }
            })
            .as_ref()
            .map_err(String::as_str)
    }

    /// Whether loading has been attempted
    pub fn is_initialized(&self) -> bool {
        self.model.get().is_some()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model.get())
            .finish_non_exhaustive()
    }
}

/// Summarization front end enforcing input rules
#[derive(Debug, Clone)]
pub struct Summarizer {
    model: Arc<ModelHandle>,
    limit: InputLimit,
}

impl Summarizer {
    pub fn new(model: Arc<ModelHandle>, limit: InputLimit) -> Self {
        Self { model, limit }
    }

    /// Build a summarizer whose limit follows `config`
    pub fn from_config(model: Arc<ModelHandle>, config: &SummarizerConfig) -> Self {
        Self::new(model, InputLimit::from_config(config))
    }

    /// Summarize `text`.
    ///
    /// Never panics or returns an error; every failure is a
    /// [`SummaryResult::Failed`] variant.
    pub async fn summarize(
        &self,
        text: &str,
        bounds: LengthBounds,
        diagnostics: &Diagnostics,
    ) -> SummaryResult {
        if text.trim().is_empty() {
            return SummaryFailure::EmptyInput.into();
        }

        let model = match self.model.get() {
            Ok(model) => model,
            Err(reason) => return SummaryFailure::ModelUnavailable(reason.to_string()).into(),
        };

        let input = self.limit.apply(text);
        if input.was_truncated() {
            diagnostics.report(
                "summarizer",
                DiagnosticKind::Truncated {
                    from: input.original,
                    to: input.kept,
                    unit: input.unit,
                },
            );
        }
        if input.text.trim().is_empty() {
            return SummaryFailure::EmptyInput.into();
        }

        let _guard = if model.concurrency_safe() {
            None
        } else {
            Some(self.model.gate.lock().await)
        };

        tracing::debug!(
            "Summarizing {} {} with {}",
            input.kept,
            input.unit,
            model.id()
        );

        match model.generate(&input.text, bounds).await {
            Ok(summary) if summary.trim().is_empty() => SummaryFailure::InferenceError(
                "model returned an empty summary".to_string(),
            )
            .into(),
            Ok(summary) => SummaryResult::Ok(summary.trim().to_string()),
            Err(e) => SummaryFailure::InferenceError(e.to_string()).into(),
        }
    }
}
