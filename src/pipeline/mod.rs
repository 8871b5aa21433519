//! End-to-end handling of one topic query.
//!
//! [`Pipeline::run`] fetches web snippets and paper abstracts concurrently,
//! packs them into a bounded context with web results first, and summarizes
//! that context. Every stage degrades instead of failing, so a report is
//! always produced; what went wrong along the way is listed in its
//! diagnostics.

use serde::Serialize;
use std::fmt;

use crate::config::Config;
use crate::context::{ContextBuffer, ContextBuilder, SourceGroup};
use crate::models::{
    Diagnostic, DiagnosticKind, Diagnostics, SourceKind, SourceRecord, SummaryFailure,
    SummaryResult,
};
use crate::sources::SourceRegistry;
use crate::summarizer::{LengthBounds, Summarizer};
use crate::utils::deduplicate_records;

/// Tunables for a query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineSettings {
    pub web_results: usize,
    pub paper_results: usize,
    pub word_budget: usize,
    /// Web snippet similarity treated as duplicate; 0 disables
    pub dedup_threshold: f64,
    pub bounds: LengthBounds,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            web_results: config.search.web_results,
            paper_results: config.search.paper_results,
            word_budget: config.context.word_budget,
            dedup_threshold: config.context.dedup_threshold,
            bounds: LengthBounds::from_config(&config.summarizer),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// How a query ended, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A summary was produced
    Summarized,
    /// The sources had nothing to say about the topic
    NoInformation,
    /// The model could not be loaded
    SummarizerUnavailable,
    /// Every source request failed, or the model failed at inference
    RequestFailed,
}

impl Outcome {
    /// Message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Summarized => "Summary generated.",
            Outcome::NoInformation => "No relevant information was found.",
            Outcome::SummarizerUnavailable => "Summarization model is not available.",
            Outcome::RequestFailed => {
                "Summary generation failed. Please try a different topic or check for issues."
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything produced for one topic
#[derive(Debug, Clone, Serialize)]
pub struct DigestReport {
    pub topic: String,
    pub web: Vec<SourceRecord>,
    pub papers: Vec<SourceRecord>,
    pub context: ContextBuffer,
    pub summary: SummaryResult,
    pub diagnostics: Vec<Diagnostic>,
    /// Sources whose request did not complete
    pub failed_sources: Vec<String>,
    /// Number of sources queried
    pub sources_queried: usize,
}

impl DigestReport {
    fn empty(topic: &str, budget: usize) -> Self {
        Self {
            topic: topic.to_string(),
            web: Vec::new(),
            papers: Vec::new(),
            context: ContextBuilder::new().build(&[], budget),
            summary: SummaryFailure::EmptyInput.into(),
            diagnostics: Vec::new(),
            failed_sources: Vec::new(),
            sources_queried: 0,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match &self.summary {
            SummaryResult::Ok(_) => Outcome::Summarized,
            SummaryResult::Failed(SummaryFailure::ModelUnavailable(_)) => {
                Outcome::SummarizerUnavailable
            }
            SummaryResult::Failed(SummaryFailure::InferenceError(_)) => Outcome::RequestFailed,
            SummaryResult::Failed(SummaryFailure::EmptyInput) => {
                if self.sources_queried > 0 && self.failed_sources.len() == self.sources_queried {
                    Outcome::RequestFailed
                } else {
                    Outcome::NoInformation
                }
            }
        }
    }

    /// Total records fetched across both sources
    pub fn record_count(&self) -> usize {
        self.web.len() + self.papers.len()
    }
}

/// Query orchestrator
#[derive(Debug, Clone)]
pub struct Pipeline {
    sources: SourceRegistry,
    builder: ContextBuilder,
    summarizer: Summarizer,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(sources: SourceRegistry, summarizer: Summarizer, settings: PipelineSettings) -> Self {
        Self {
            sources,
            builder: ContextBuilder::new(),
            summarizer,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PipelineSettings {
        &mut self.settings
    }

    /// Run one query
    pub async fn run(&self, topic: &str) -> DigestReport {
        let topic = topic.trim();
        if topic.is_empty() {
            tracing::debug!("Blank topic, nothing to fetch");
            return DigestReport::empty(topic, self.settings.word_budget);
        }

        let diagnostics = Diagnostics::new();
        let web_client = self.sources.web();
        let paper_client = self.sources.papers();

        let (web, papers) = tokio::join!(
            web_client.fetch(topic, self.settings.web_results, &diagnostics),
            paper_client.fetch(topic, self.settings.paper_results, &diagnostics),
        );
        tracing::debug!(
            "Fetched {} web and {} paper records for {:?}",
            web.len(),
            papers.len(),
            topic
        );

        // Near-duplicate snippets only waste context words; the report keeps them all
        let packed_web = deduplicate_records(web.clone(), self.settings.dedup_threshold);

        let context = self.builder.build(
            &[
                SourceGroup::new(SourceKind::Web, &packed_web),
                SourceGroup::new(SourceKind::Paper, &papers),
            ],
            self.settings.word_budget,
        );

        let summary = if context.is_empty() {
            SummaryFailure::EmptyInput.into()
        } else {
            self.summarizer
                .summarize(&context.text(), self.settings.bounds, &diagnostics)
                .await
        };

        if let SummaryResult::Failed(failure) = &summary {
            tracing::info!("No summary for {:?}: {}", topic, failure);
        }

        let failed_sources = self
            .sources
            .all()
            .filter(|client| {
                diagnostics.any_from(client.id(), |kind| {
                    matches!(
                        kind,
                        DiagnosticKind::Transport(_) | DiagnosticKind::CredentialsMissing
                    )
                })
            })
            .map(|client| client.id().to_string())
            .collect();

        DigestReport {
            topic: topic.to_string(),
            web,
            papers,
            context,
            summary,
            diagnostics: diagnostics.snapshot(),
            failed_sources,
            sources_queried: self.sources.all().count(),
        }
    }
}
