//! Summarization outcome.

use serde::{Deserialize, Serialize};

/// Why no summary was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SummaryFailure {
    /// The model backend never came up
    #[error("summarization model unavailable: {0}")]
    ModelUnavailable(String),

    /// There was nothing to summarize
    #[error("no input to summarize")]
    EmptyInput,

    /// The model was invoked and failed
    #[error("summarization failed: {0}")]
    InferenceError(String),
}

/// Result of one summarization attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum SummaryResult {
    Ok(String),
    Failed(SummaryFailure),
}

impl SummaryResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, SummaryResult::Ok(_))
    }

    /// The summary text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            SummaryResult::Ok(text) => Some(text),
            SummaryResult::Failed(_) => None,
        }
    }

    /// The failure reason, if any
    pub fn failure(&self) -> Option<&SummaryFailure> {
        match self {
            SummaryResult::Ok(_) => None,
            SummaryResult::Failed(reason) => Some(reason),
        }
    }
}

impl From<SummaryFailure> for SummaryResult {
    fn from(reason: SummaryFailure) -> Self {
        SummaryResult::Failed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ok = SummaryResult::Ok("short".to_string());
        assert!(ok.is_ok());
        assert_eq!(ok.text(), Some("short"));
        assert!(ok.failure().is_none());

        let failed: SummaryResult = SummaryFailure::EmptyInput.into();
        assert!(!failed.is_ok());
        assert_eq!(failed.failure(), Some(&SummaryFailure::EmptyInput));
    }

    #[test]
    fn test_serialize_failure() {
        let failed = SummaryResult::Failed(SummaryFailure::InferenceError("oom".to_string()));
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["value"]["reason"], "inference_error");
        assert_eq!(value["value"]["detail"], "oom");
    }
}
