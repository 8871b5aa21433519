//! Configuration management.
//!
//! Configuration comes from three layers, later ones winning:
//!
//! 1. Built-in defaults (API keys default to the provider environment
//!    variables `SERPER_API_KEY`, `SERPAPI_API_KEY` and `HF_API_TOKEN`)
//! 2. A TOML file (`--config`, `./research-digest.toml` or
//!    `<config dir>/research-digest/config.toml`)
//! 3. `RESEARCH_DIGEST_*` environment variables, with `__` separating
//!    sections (e.g. `RESEARCH_DIGEST_CONTEXT__WORD_BUDGET=900`)
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! serper = "your-serper-key"
//! huggingface = "hf_..."
//!
//! [search]
//! web_provider = "serper"   # or "serpapi"
//! web_results = 5
//! paper_results = 3
//! timeout_secs = 20
//! retry = true
//!
//! [context]
//! word_budget = 700
//! dedup_threshold = 0.97
//!
//! [summarizer]
//! model = "facebook/bart-large-cnn"
//! endpoint = "https://api-inference.huggingface.co"
//! min_length = 30
//! max_length = 150
//! max_input_tokens = 1024
//! max_input_chars = 1024
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::WebProvider;

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "research-digest.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for the external providers
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Source fetching settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Context packing settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Summarization settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Serper API key
    #[serde(default = "serper_key_from_env")]
    pub serper: Option<String>,

    /// SerpAPI API key
    #[serde(default = "serpapi_key_from_env")]
    pub serpapi: Option<String>,

    /// Hugging Face API token (optional, raises rate limits)
    #[serde(default = "huggingface_token_from_env")]
    pub huggingface: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            serper: serper_key_from_env(),
            serpapi: serpapi_key_from_env(),
            huggingface: huggingface_token_from_env(),
        }
    }
}

impl ApiKeys {
    /// Key for the given web provider, if configured and non-blank
    pub fn web_key(&self, provider: WebProvider) -> Option<String> {
        let key = match provider {
            WebProvider::Serper => &self.serper,
            WebProvider::SerpApi => &self.serpapi,
        };
        key.clone().filter(|k| !k.trim().is_empty())
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn serper_key_from_env() -> Option<String> {
    env_non_empty("SERPER_API_KEY")
}

fn serpapi_key_from_env() -> Option<String> {
    env_non_empty("SERPAPI_API_KEY")
}

fn huggingface_token_from_env() -> Option<String> {
    env_non_empty("HF_API_TOKEN")
}

/// Source fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Which web search API to use
    #[serde(default)]
    pub web_provider: WebProvider,

    /// Organic results requested from the web provider
    #[serde(default = "default_web_results")]
    pub web_results: usize,

    /// Papers requested from arXiv
    #[serde(default = "default_paper_results")]
    pub paper_results: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry once on transient network failures
    #[serde(default = "default_true")]
    pub retry: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            web_provider: WebProvider::default(),
            web_results: default_web_results(),
            paper_results: default_paper_results(),
            timeout_secs: default_timeout_secs(),
            retry: true,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_web_results() -> usize {
    5
}

fn default_paper_results() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_true() -> bool {
    true
}

/// Context packing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum number of words handed to the summarizer
    #[serde(default = "default_word_budget")]
    pub word_budget: usize,

    /// Similarity above which web snippets count as duplicates (0 disables)
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            word_budget: default_word_budget(),
            dedup_threshold: default_dedup_threshold(),
        }
    }
}

fn default_word_budget() -> usize {
    700
}

fn default_dedup_threshold() -> f64 {
    crate::utils::DEFAULT_DEDUP_THRESHOLD
}

/// Summarization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Model identifier on the inference endpoint
    #[serde(default = "default_model")]
    pub model: String,

    /// Inference API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Minimum summary length in model tokens
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Maximum summary length in model tokens
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Input ceiling when a tokenizer is available
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// Input ceiling when falling back to character counting
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Inference request timeout in seconds
    #[serde(default = "default_inference_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            min_length: default_min_length(),
            max_length: default_max_length(),
            max_input_tokens: default_max_input_tokens(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_inference_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "facebook/bart-large-cnn".to_string()
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_min_length() -> usize {
    30
}

fn default_max_length() -> usize {
    150
}

fn default_max_input_tokens() -> usize {
    1024
}

fn default_max_input_chars() -> usize {
    1024
}

fn default_inference_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Copy with every configured key masked, for display
    pub fn redacted(&self) -> Config {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "********".to_string());
        let mut config = self.clone();
        config.api_keys = ApiKeys {
            serper: mask(&self.api_keys.serper),
            serpapi: mask(&self.api_keys.serpapi),
            huggingface: mask(&self.api_keys.huggingface),
        };
        config
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("RESEARCH_DIGEST")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let loaded: Config = settings.try_deserialize()?;
    if loaded.summarizer.max_input_tokens == 0 || loaded.summarizer.max_input_chars == 0 {
        return Err(config::ConfigError::Message(
            "summarizer input ceiling must be greater than zero".to_string(),
        ));
    }
    Ok(loaded)
}

/// Look for a configuration file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("research-digest").join("config.toml"))
        .filter(|path| path.is_file())
}
