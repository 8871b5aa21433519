use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use research_digest::config::{find_config_file, load_config, Config};
use research_digest::pipeline::{Pipeline, PipelineSettings};
use research_digest::sources::SourceRegistry;
use research_digest::summarizer::{HuggingFaceModel, ModelHandle, Summarizer, SummaryModel};
use research_digest::ui;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Digest - Summarize a topic from web search snippets and recent arXiv abstracts
#[derive(Parser, Debug)]
#[command(name = "research-digest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Summarize a topic from web search snippets and recent arXiv abstracts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (text if TTY, JSON otherwise)
    Auto,
    /// Human-readable text
    Text,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch sources for a topic and summarize them
    #[command(alias = "s")]
    Summarize {
        /// Topic to research
        topic: String,

        /// Number of web results to request
        #[arg(long)]
        web_results: Option<usize>,

        /// Number of arXiv papers to request
        #[arg(long)]
        paper_results: Option<usize>,

        /// Word budget for the text handed to the summarizer
        #[arg(long)]
        budget: Option<usize>,

        /// Also print the fetched records
        #[arg(long)]
        show_sources: bool,
    },

    /// Print the effective configuration as TOML
    #[command(alias = "c")]
    Config,
}

fn init_tracing(cli: &Cli) {
    let log_level = match cli.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let level = if cli.quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("research_digest={}", level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    if let Some(config_path) = path {
        return load_config(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    match find_config_file() {
        Some(config_path) => {
            tracing::info!("Using config file: {}", config_path.display());
            load_config(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Resolve `Auto` against whether stdout is a terminal
fn effective_format(format: OutputFormat, stdout_is_terminal: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto if stdout_is_terminal => OutputFormat::Text,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let registry = SourceRegistry::from_config(config).context("Failed to set up sources")?;

    let summarizer_config = config.summarizer.clone();
    let token = config.api_keys.huggingface.clone();
    let model = ModelHandle::shared(move || {
        HuggingFaceModel::from_config(&summarizer_config, token.clone())
            .map(|m| Arc::new(m) as Arc<dyn SummaryModel>)
    });

    Ok(Pipeline::new(
        registry,
        Summarizer::from_config(model, &config.summarizer),
        PipelineSettings::from_config(config),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = resolve_config(cli.config.as_ref())?;

    match &cli.command {
        Commands::Config => {
            print!("{}", config.redacted().to_toml()?);
        }
        Commands::Summarize {
            topic,
            web_results,
            paper_results,
            budget,
            show_sources,
        } => {
            if let Some(n) = web_results {
                config.search.web_results = *n;
            }
            if let Some(n) = paper_results {
                config.search.paper_results = *n;
            }
            if let Some(words) = budget {
                config.context.word_budget = *words;
            }

            let pipeline = build_pipeline(&config)?;
            let format = effective_format(cli.output, std::io::stdout().is_terminal());

            let spinner = if cli.quiet || format == OutputFormat::Json || !ui::is_terminal() {
                ui::Spinner::hidden()
            } else {
                ui::Spinner::new(&format!("Researching \"{}\"...", topic))
            };
            let report = pipeline.run(topic).await;
            spinner.finish_and_clear();

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Text | OutputFormat::Auto => {
                    ui::print_report(&report, *show_sources);
                }
            }
        }
    }

    Ok(())
}
