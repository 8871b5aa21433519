//! Builds the configured pair of source clients.

use std::sync::Arc;

use super::{ArxivClient, SourceClient, SourceError, WebSearchClient};
use crate::config::Config;
use crate::utils::{fetch_retry_config, HttpClient};

/// The web and paper clients used for a query, chosen by configuration
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    web: Arc<dyn SourceClient>,
    papers: Arc<dyn SourceClient>,
}

impl SourceRegistry {
    /// Create a registry from explicit clients
    pub fn new(web: Arc<dyn SourceClient>, papers: Arc<dyn SourceClient>) -> Self {
        Self { web, papers }
    }

    /// Create the clients described by `config`.
    ///
    /// Both clients share one HTTP client carrying the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let http = Arc::new(HttpClient::with_timeout(config.search.timeout())?);
        let retry = fetch_retry_config(config.search.retry);
        let provider = config.search.web_provider;

        let web = WebSearchClient::with_client(
            Arc::clone(&http),
            provider,
            config.api_keys.web_key(provider),
        )
        .with_retry(retry);

        let papers = ArxivClient::with_client(http).with_retry(retry);

        tracing::debug!("Using web provider {} and arXiv", provider);

        Ok(Self::new(Arc::new(web), Arc::new(papers)))
    }

    /// The web search client
    pub fn web(&self) -> &Arc<dyn SourceClient> {
        &self.web
    }

    /// The paper search client
    pub fn papers(&self) -> &Arc<dyn SourceClient> {
        &self.papers
    }

    /// Both clients, web first
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn SourceClient>> {
        [&self.web, &self.papers].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use crate::sources::WebProvider;

    #[test]
    fn test_registry_from_default_config() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();

        assert_eq!(registry.web().id(), "serper");
        assert_eq!(registry.web().kind(), SourceKind::Web);
        assert_eq!(registry.papers().id(), "arxiv");
        assert_eq!(registry.papers().kind(), SourceKind::Paper);
        assert_eq!(registry.all().count(), 2);
    }

    #[test]
    fn test_registry_selects_provider() {
        let mut config = Config::default();
        config.search.web_provider = WebProvider::SerpApi;

        let registry = SourceRegistry::from_config(&config).unwrap();
        assert_eq!(registry.web().id(), "serpapi");
    }
}
