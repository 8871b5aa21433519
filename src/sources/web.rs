//! Web search source backed by a Google results API.
//!
//! Two interchangeable providers are supported, selected by configuration:
//! [Serper](https://serper.dev) and [SerpAPI](https://serpapi.com). Both return
//! a list of organic results shaped like `{title, link, snippet, source}`; only
//! the request shape and the name of the list differ.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{RecordBuilder, SourceKind};
use crate::sources::{SourceClient, SourceError, SourceResponse};
use crate::utils::{fetch_retry_config, with_retry, HttpClient, RetryConfig};

/// Serper search endpoint
const SERPER_API_URL: &str = "https://google.serper.dev/search";
/// SerpAPI search endpoint
const SERPAPI_API_URL: &str = "https://serpapi.com/search.json";

/// Which web search API to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebProvider {
    #[default]
    Serper,
    SerpApi,
}

impl WebProvider {
    pub fn id(&self) -> &'static str {
        match self {
            WebProvider::Serper => "serper",
            WebProvider::SerpApi => "serpapi",
        }
    }

    /// Environment variable holding this provider's key
    pub fn key_var(&self) -> &'static str {
        match self {
            WebProvider::Serper => "SERPER_API_KEY",
            WebProvider::SerpApi => "SERPAPI_API_KEY",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            WebProvider::Serper => SERPER_API_URL,
            WebProvider::SerpApi => SERPAPI_API_URL,
        }
    }

    /// Name of the organic results list in the response body
    fn results_field(&self) -> &'static str {
        match self {
            WebProvider::Serper => "organic",
            WebProvider::SerpApi => "organic_results",
        }
    }
}

impl fmt::Display for WebProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for WebProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serper" => Ok(WebProvider::Serper),
            "serpapi" => Ok(WebProvider::SerpApi),
            other => Err(format!("unknown web provider '{}'", other)),
        }
    }
}

/// One organic result, as returned by either provider
#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Web search source
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    client: Arc<HttpClient>,
    provider: WebProvider,
    api_key: Option<String>,
    base_url: String,
    retry: RetryConfig,
}

impl WebSearchClient {
    /// Create a client for `provider`; a missing key is reported at fetch time
    pub fn new(provider: WebProvider, api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::new()?),
            provider,
            api_key,
        ))
    }

    /// Create with a custom HTTP client
    pub fn with_client(
        client: Arc<HttpClient>,
        provider: WebProvider,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            provider,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: provider.default_base_url().to_string(),
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

    async fn request(&self, api_key: &str, topic: &str, num: usize) -> Result<Value, SourceError> {
        let request = match self.provider {
            WebProvider::Serper => self
                .client
                .post(&self.base_url)
                .header("X-API-KEY", api_key)
                .json(&serde_json::json!({ "q": topic, "num": num })),
            WebProvider::SerpApi => {
                let url = format!(
                    "{}?engine=google&q={}&num={}&api_key={}",
                    self.base_url,
                    urlencoding::encode(topic),
                    num,
                    urlencoding::encode(api_key)
                );
                self.client.get(&url)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: format!(
                    "{} returned status {}: {}",
                    self.provider,
                    status,
                    error_message(&body)
                ),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Turn a response body into records, skipping items that do not decode.
    fn parse_results(&self, body: &Value) -> Result<SourceResponse, SourceError> {
        let items: &[Value] = match body.get(self.provider.results_field()) {
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => {
                return Err(SourceError::Parse(format!(
                    "'{}' is not a list",
                    self.provider.results_field()
                )))
            }
            None => {
                if let Some(err) = body.get("error").and_then(Value::as_str) {
                    return Err(SourceError::Api {
                        status: 200,
                        message: err.to_string(),
                    });
                }
                &[]
            }
        };

        let mut response = SourceResponse::default();
        for (position, item) in items.iter().enumerate() {
            let organic: OrganicResult = match serde_json::from_value(item.clone()) {
                Ok(organic) => organic,
                Err(e) => {
                    response.skip(format!("result {}: {}", position + 1, e));
                    continue;
                }
            };

            let snippet = organic.snippet.unwrap_or_default();
            if snippet.trim().is_empty() {
                tracing::debug!("{}: result {} has no snippet", self.provider, position + 1);
                continue;
            }

            response.records.push(
                RecordBuilder::new(
                    SourceKind::Web,
                    self.provider.id(),
                    organic.title.unwrap_or_default().trim(),
                    snippet.trim(),
                )
                .url(organic.link.unwrap_or_default())
                .build(),
            );
        }

        Ok(response)
    }
}

/// Best-effort extraction of an error message from a provider error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl SourceClient for WebSearchClient {
    fn id(&self) -> &str {
        self.provider.id()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    async fn search(&self, topic: &str, max_results: usize) -> Result<SourceResponse, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::CredentialsMissing)?;

        if max_results == 0 {
            return Ok(SourceResponse::default());
        }

        tracing::debug!("{} search for {:?} (num={})", self.provider, topic, max_results);

        let body = with_retry(self.retry, || self.request(api_key, topic, max_results)).await?;
        let mut response = self.parse_results(&body)?;
        response.records.truncate(max_results);
        Ok(response)
    }
}
