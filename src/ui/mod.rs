//! CLI UI utilities for terminal output.
//!
//! Colored status lines, a spinner for the fetch/summarize wait, and the text
//! rendering of a [`DigestReport`].

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;
use unicode_width::UnicodeWidthChar;

use crate::models::{Diagnostic, SourceRecord};
use crate::pipeline::{DigestReport, Outcome};

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon for a record provider.
pub fn source_icon(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "arxiv" => "📝",
        "serper" | "serpapi" | "web" => "🌐",
        _ => "📄",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg.yellow()),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Status used to announce an outcome
pub fn outcome_status(outcome: Outcome) -> Status {
    match outcome {
        Outcome::Summarized => Status::Success,
        Outcome::NoInformation => Status::Warning,
        Outcome::SummarizerUnavailable | Outcome::RequestFailed => Status::Error,
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(terminal_width().min(80)).dimmed());
}

/// Display width of `text` in terminal columns
fn display_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(1)).sum()
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    if display_width(text) <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(1);
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        truncated.push(c);
    }

    if truncated.is_empty() {
        return "...".to_string();
    }

    format!("{}...", truncated.trim_end())
}

/// Wrap text into lines no wider than `width` columns.
///
/// Words wider than a whole line are placed on a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let w = display_width(word);
        if line_width > 0 && line_width + 1 + w > width {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        if line_width > 0 {
            line.push(' ');
            line_width += 1;
        }
        line.push_str(word);
        line_width += w;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// One-line heading for a record: icon, title and year
pub fn record_heading(record: &SourceRecord, width: usize) -> String {
    let title = if record.title.trim().is_empty() {
        "(untitled)"
    } else {
        record.title.trim()
    };
    let heading = match record.year() {
        Some(year) => format!("{} ({})", title, year),
        None => title.to_string(),
    };
    format!(
        "{} {}",
        source_icon(&record.provider),
        truncate_with_ellipsis(&heading, width.saturating_sub(3))
    )
}

/// Print a fetched record.
pub fn print_record(record: &SourceRecord, width: usize) {
    println!("{}", record_heading(record, width).bold());
    if !record.authors.is_empty() {
        println!(
            "   {}",
            truncate_with_ellipsis(&record.authors.join(", "), width.saturating_sub(3)).dimmed()
        );
    }
    for line in wrap_text(&record.body, width.saturating_sub(3)).iter().take(4) {
        println!("   {}", line);
    }
    if let Some(url) = &record.url {
        println!("   {}", truncate_with_ellipsis(url, width.saturating_sub(3)).blue());
    }
}

/// Print a diagnostic as a warning line.
pub fn print_diagnostic(diagnostic: &Diagnostic) {
    print_status(Status::Warning, &diagnostic.to_string());
}

/// Print a report in human-readable form.
pub fn print_report(report: &DigestReport, show_sources: bool) {
    let width = terminal_width().min(100);
    let outcome = report.outcome();

    if let Some(summary) = report.summary.text() {
        print_section(&format!("Summary: {}", report.topic));
        for line in wrap_text(summary, width) {
            println!("{}", line);
        }
        println!();
    }

    print_status(outcome_status(outcome), outcome.message());
    if let Some(failure) = report.summary.failure() {
        tracing::debug!("Summary failure: {}", failure);
    }

    println!(
        "{}",
        format!(
            "{} web results, {} papers, {} of {} words used",
            report.web.len(),
            report.papers.len(),
            report.context.word_count(),
            report.context.budget()
        )
        .dimmed()
    );

    if !report.diagnostics.is_empty() {
        print_section("Warnings");
        for diagnostic in &report.diagnostics {
            print_diagnostic(diagnostic);
        }
    }

    if show_sources && report.record_count() > 0 {
        print_section("Sources");
        for record in report.web.iter().chain(report.papers.iter()) {
            print_record(record, width);
            println!();
        }
    }
}

/// Loading spinner shown while a query runs.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for piped output.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Remove the spinner from the terminal.
    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
