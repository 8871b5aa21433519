//! Integration tests for Research Digest
//!
//! These tests run the full pipeline with real provider clients pointed at
//! local mock servers.

use research_digest::config::Config;
use research_digest::models::{DiagnosticKind, SourceKind, SummaryFailure, SummaryResult};
use research_digest::pipeline::{Outcome, Pipeline, PipelineSettings};
use research_digest::sources::{ArxivClient, SourceRegistry, WebProvider, WebSearchClient};
use research_digest::summarizer::{
    HuggingFaceModel, InputLimit, MockModel, ModelHandle, Summarizer, SummaryModel,
};
use research_digest::utils::{HttpClient, RetryConfig};
use std::sync::Arc;
use std::time::Duration;

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-03-02T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2403.01234v1</id>
    <title>Fault-Tolerant Quantum Computing with Surface Codes</title>
    <summary>We analyse logical error rates of surface codes under circuit-level noise.</summary>
    <published>2024-03-01T10:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2402.05678v1</id>
    <title>Variational Algorithms on Near-Term Devices</title>
    <summary>We benchmark variational eigensolvers on superconducting hardware.</summary>
    <published>2024-02-14T10:00:00Z</published>
    <author><name>Alan Turing</name></author>
  </entry>
</feed>"#;

const SERPER_BODY: &str = r#"{"organic":[
  {"title":"Quantum computing - Wikipedia","link":"https://en.wikipedia.org/wiki/Quantum_computing","snippet":"A quantum computer exploits superposition and entanglement."},
  {"title":"What is quantum computing?","link":"https://example.com/qc","snippet":"Qubits can represent zero and one at the same time."}
]}"#;

fn http() -> Arc<HttpClient> {
    Arc::new(HttpClient::with_timeout(Duration::from_secs(5)).unwrap())
}

fn web_client(base_url: &str, key: Option<&str>) -> WebSearchClient {
    WebSearchClient::with_client(http(), WebProvider::Serper, key.map(str::to_string))
        .with_base_url(base_url)
        .with_retry(RetryConfig::none())
}

fn arxiv_client(base_url: &str) -> ArxivClient {
    ArxivClient::with_client(http())
        .with_base_url(base_url)
        .with_retry(RetryConfig::none())
}

fn pipeline(web: WebSearchClient, papers: ArxivClient, model: Arc<dyn SummaryModel>) -> Pipeline {
    Pipeline::new(
        SourceRegistry::new(Arc::new(web), Arc::new(papers)),
        Summarizer::new(Arc::new(ModelHandle::ready(model)), InputLimit::Chars(4000)),
        PipelineSettings::default(),
    )
}

#[tokio::test]
async fn test_full_pipeline_against_mock_servers() {
    let mut server = mockito::Server::new_async().await;

    let serper = server
        .mock("POST", "/search")
        .match_header("x-api-key", "serper-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SERPER_BODY)
        .create_async()
        .await;
    let arxiv = server
        .mock("GET", "/api/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(ARXIV_FEED)
        .create_async()
        .await;
    let inference = server
        .mock("POST", "/models/facebook/bart-large-cnn")
        .match_body(mockito::Matcher::Regex("superposition".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"summary_text":"Quantum computers use qubits and error correction."}]"#)
        .create_async()
        .await;

    let model = HuggingFaceModel::new(
        &server.url(),
        "facebook/bart-large-cnn",
        None,
        Duration::from_secs(5),
    )
    .unwrap();
    let p = pipeline(
        web_client(&format!("{}/search", server.url()), Some("serper-key")),
        arxiv_client(&format!("{}/api/query", server.url())),
        Arc::new(model),
    );

    let report = p.run("quantum computing").await;

    serper.assert_async().await;
    arxiv.assert_async().await;
    inference.assert_async().await;

    assert_eq!(report.web.len(), 2);
    assert_eq!(report.papers.len(), 2);
    assert_eq!(report.context.count_of(SourceKind::Web), 2);
    assert_eq!(report.context.count_of(SourceKind::Paper), 2);
    assert_eq!(report.context.sections()[0].source_kind, SourceKind::Web);
    assert_eq!(
        report.summary,
        SummaryResult::Ok("Quantum computers use qubits and error correction.".to_string())
    );
    assert_eq!(report.outcome(), Outcome::Summarized);
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn test_missing_web_key_still_uses_papers() {
    let mut server = mockito::Server::new_async().await;
    let arxiv = server
        .mock("GET", "/api/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(ARXIV_FEED)
        .create_async()
        .await;

    let model = Arc::new(MockModel::replying("Papers only."));
    let p = pipeline(
        web_client(&format!("{}/search", server.url()), None),
        arxiv_client(&format!("{}/api/query", server.url())),
        model.clone(),
    );

    let report = p.run("quantum computing").await;

    arxiv.assert_async().await;
    assert!(report.web.is_empty());
    assert_eq!(report.papers.len(), 2);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.origin == "serper" && d.kind == DiagnosticKind::CredentialsMissing));
    assert_eq!(report.summary.text(), Some("Papers only."));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_empty_results_are_no_information() {
    let mut server = mockito::Server::new_async().await;
    let _serper = server
        .mock("POST", "/search")
        .with_status(200)
        .with_body(r#"{"organic":[]}"#)
        .create_async()
        .await;
    let _arxiv = server
        .mock("GET", "/api/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-03-02T00:00:00Z</updated>
</feed>"#,
        )
        .create_async()
        .await;

    let model = Arc::new(MockModel::replying("never"));
    let p = pipeline(
        web_client(&format!("{}/search", server.url()), Some("key")),
        arxiv_client(&format!("{}/api/query", server.url())),
        model.clone(),
    );

    let report = p.run("xqzv plorb").await;

    assert_eq!(report.summary, SummaryResult::Failed(SummaryFailure::EmptyInput));
    assert_eq!(report.outcome(), Outcome::NoInformation);
    assert!(report.diagnostics.is_empty());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_inference_failure_keeps_records() {
    let mut server = mockito::Server::new_async().await;
    let _serper = server
        .mock("POST", "/search")
        .with_status(200)
        .with_body(SERPER_BODY)
        .create_async()
        .await;
    let _arxiv = server
        .mock("GET", "/api/query")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let _inference = server
        .mock("POST", "/models/facebook/bart-large-cnn")
        .with_status(500)
        .with_body(r#"{"error":"CUDA out of memory"}"#)
        .create_async()
        .await;

    let model = HuggingFaceModel::new(
        &server.url(),
        "facebook/bart-large-cnn",
        None,
        Duration::from_secs(5),
    )
    .unwrap();
    let p = pipeline(
        web_client(&format!("{}/search", server.url()), Some("key")),
        arxiv_client(&format!("{}/api/query", server.url())),
        Arc::new(model),
    );

    let report = p.run("quantum computing").await;

    assert_eq!(report.web.len(), 2);
    assert!(report.papers.is_empty());
    assert_eq!(report.failed_sources, vec!["arxiv".to_string()]);
    match &report.summary {
        SummaryResult::Failed(SummaryFailure::InferenceError(detail)) => {
            assert!(detail.contains("CUDA out of memory"));
        }
        other => panic!("unexpected summary: {:?}", other),
    }
    assert_eq!(report.outcome(), Outcome::RequestFailed);
}

#[tokio::test]
async fn test_registry_from_config_without_keys() {
    let mut config = Config::default();
    config.api_keys.serper = None;
    config.api_keys.serpapi = None;

    let registry = SourceRegistry::from_config(&config).unwrap();
    let diagnostics = research_digest::models::Diagnostics::new();
    let records = registry.web().fetch("quantum computing", 5, &diagnostics).await;

    assert!(records.is_empty());
    assert!(diagnostics.any_from("serper", |k| *k == DiagnosticKind::CredentialsMissing));
}

#[test]
fn test_default_settings() {
    let settings = PipelineSettings::default();
    assert_eq!(settings.word_budget, 700);
    assert_eq!(settings.web_results, 5);
    assert_eq!(settings.paper_results, 3);
    assert_eq!(settings.bounds.min_length, 30);
    assert_eq!(settings.bounds.max_length, 150);
}
