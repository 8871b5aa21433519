//! Summarization through the Hugging Face Inference API.
//!
//! The default model is `facebook/bart-large-cnn`, a seq2seq model tuned for
//! news summarization. Requests are deterministic (`do_sample: false`) and ask
//! the endpoint to wait for a cold model rather than fail fast.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{LengthBounds, SummarizerError, SummaryModel};
use crate::config::SummarizerConfig;
use crate::utils::HttpClient;

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

/// Remote summarization model
#[derive(Debug, Clone)]
pub struct HuggingFaceModel {
    client: HttpClient,
    model: String,
    url: String,
    token: Option<String>,
}

impl HuggingFaceModel {
    /// Create a model client for `model` served at `endpoint`
    pub fn new(
        endpoint: &str,
        model: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizerError> {
        if model.trim().is_empty() {
            return Err(SummarizerError::Init("no model configured".to_string()));
        }

        let url = format!("{}/models/{}", endpoint.trim_end_matches('/'), model.trim());
        url::Url::parse(&url)
            .map_err(|e| SummarizerError::Init(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let client = HttpClient::with_timeout(timeout)
            .map_err(|e| SummarizerError::Init(e.to_string()))?;

        Ok(Self {
            client,
            model: model.trim().to_string(),
            url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Create from the summarizer section of the configuration
    pub fn from_config(
        config: &SummarizerConfig,
        token: Option<String>,
    ) -> Result<Self, SummarizerError> {
        Self::new(
            &config.endpoint,
            &config.model,
            token,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Pull the summary out of a successful response body
fn parse_summary(body: &Value) -> Result<String, SummarizerError> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        return Err(SummarizerError::Inference(err.to_string()));
    }

    let outputs: Vec<SummaryOutput> = serde_json::from_value(body.clone())
        .map_err(|e| SummarizerError::Inference(format!("unexpected response: {}", e)))?;

    outputs
        .into_iter()
        .next()
        .map(|o| o.summary_text)
        .ok_or_else(|| SummarizerError::Inference("model returned no summary".to_string()))
}

#[async_trait]
impl SummaryModel for HuggingFaceModel {
    fn id(&self) -> &str {
        &self.model
    }

    /// Each call is an independent HTTP request.
    fn concurrency_safe(&self) -> bool {
        true
    }

    async fn generate(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizerError> {
        let payload = json!({
            "inputs": text,
            "parameters": {
                "min_length": bounds.min_length,
                "max_length": bounds.max_length,
                "do_sample": false,
            },
            "options": { "wait_for_model": true },
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SummarizerError::Inference(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(SummarizerError::Inference(format!("invalid response: {}", e)))
            }
            Err(_) => Value::Null,
        };

        if !status.is_success() {
            let detail = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("no detail");
            return Err(SummarizerError::Inference(format!(
                "{} returned status {}: {}",
                self.model, status, detail
            )));
        }

        parse_summary(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(server_url: &str, token: Option<&str>) -> HuggingFaceModel {
        HuggingFaceModel::new(
            server_url,
            "facebook/bart-large-cnn",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let m = model("https://api-inference.huggingface.co/", None);
        assert_eq!(
            m.url(),
            "https://api-inference.huggingface.co/models/facebook/bart-large-cnn"
        );
        assert_eq!(m.id(), "facebook/bart-large-cnn");
    }

    #[test]
    fn test_invalid_configuration() {
        let blank = HuggingFaceModel::new("https://example.com", " ", None, Duration::from_secs(1));
        assert!(matches!(blank, Err(SummarizerError::Init(_))));

        let bad = HuggingFaceModel::new("not a url", "m", None, Duration::from_secs(1));
        assert!(matches!(bad, Err(SummarizerError::Init(_))));
    }

    #[test]
    fn test_parse_summary() {
        let ok = json!([{"summary_text": "Short."}]);
        assert_eq!(parse_summary(&ok).unwrap(), "Short.");

        let err = json!({"error": "Model is overloaded"});
        assert!(matches!(parse_summary(&err), Err(SummarizerError::Inference(m)) if m == "Model is overloaded"));

        assert!(parse_summary(&json!([])).is_err());
        assert!(parse_summary(&json!({"unexpected": true})).is_err());
    }

    #[tokio::test]
    async fn test_generate_with_mockito() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/facebook/bart-large-cnn")
            .match_header("authorization", "Bearer hf_test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "inputs": "Long text about qubits.",
                "parameters": {"min_length": 10, "max_length": 40, "do_sample": false}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"summary_text":"Qubits, briefly."}]"#)
            .create_async()
            .await;

        let m = model(&server.url(), Some("hf_test"));
        let summary = m
            .generate("Long text about qubits.", LengthBounds::new(10, 40))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(summary, "Qubits, briefly.");
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/facebook/bart-large-cnn")
            .with_status(503)
            .with_body(r#"{"error":"Model facebook/bart-large-cnn is currently loading"}"#)
            .create_async()
            .await;

        let m = model(&server.url(), None);
        let err = m.generate("text", LengthBounds::default()).await.unwrap_err();

        match err {
            SummarizerError::Inference(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("currently loading"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
