//! Packing fetched records into one bounded block of text.
//!
//! [`ContextBuilder::build`] walks the source groups in the order given and,
//! inside each group, the records in provider order. Every record is rendered
//! into a section and appended only while the running word count stays under
//! the budget. A section that does not fit is dropped whole and scanning goes
//! on, so one long abstract never blocks a shorter snippet that comes after it.
//!
//! Group order is the priority order: with a tight budget, earlier groups keep
//! their content and later groups lose theirs.

use serde::Serialize;

use crate::models::{SourceKind, SourceRecord};

/// Records from one source, in the order that source returned them
#[derive(Debug, Clone, Copy)]
pub struct SourceGroup<'a> {
    pub label: SourceKind,
    pub records: &'a [SourceRecord],
}

impl<'a> SourceGroup<'a> {
    pub fn new(label: SourceKind, records: &'a [SourceRecord]) -> Self {
        Self { label, records }
    }
}

/// One rendered record inside the buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSection {
    pub source_kind: SourceKind,
    pub text: String,
    pub word_count: usize,
}

/// Text accumulated for summarization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextBuffer {
    sections: Vec<ContextSection>,
    word_count: usize,
    budget: usize,
    skipped: usize,
}

impl ContextBuffer {
    fn new(budget: usize) -> Self {
        Self {
            sections: Vec::new(),
            word_count: 0,
            budget,
            skipped: 0,
        }
    }

    /// Append `section` if it keeps the buffer under budget
    fn try_push(&mut self, section: ContextSection) -> bool {
        if self.word_count + section.word_count < self.budget {
            self.word_count += section.word_count;
            self.sections.push(section);
            true
        } else {
            self.skipped += 1;
            false
        }
    }

    pub fn sections(&self) -> &[ContextSection] {
        &self.sections
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Records dropped because they did not fit
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of sections contributed by `kind`
    pub fn count_of(&self, kind: SourceKind) -> usize {
        self.sections
            .iter()
            .filter(|s| s.source_kind == kind)
            .count()
    }

    /// Sections joined by blank lines
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Greedy first-fit packer
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Pack `groups` into a buffer of fewer than `budget` words
    pub fn build(&self, groups: &[SourceGroup<'_>], budget: usize) -> ContextBuffer {
        let mut buffer = ContextBuffer::new(budget);

        for group in groups {
            for record in group.records.iter().filter(|r| r.is_usable()) {
                let text = render_section(record);
                let section = ContextSection {
                    source_kind: group.label,
                    word_count: count_words(&text),
                    text,
                };
                if !buffer.try_push(section) {
                    tracing::debug!(
                        "Skipping {} record {:?}: does not fit in {} remaining words",
                        group.label,
                        record.title,
                        budget.saturating_sub(buffer.word_count())
                    );
                }
            }
        }

        tracing::debug!(
            "Built context: {} sections, {} words, {} skipped",
            buffer.sections.len(),
            buffer.word_count,
            buffer.skipped
        );
        buffer
    }
}

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Render a record as a section of plain text.
///
/// Layout: title line, metadata line (papers: authors and date), body, then a
/// `Source:` line. Empty parts are left out entirely.
pub fn render_section(record: &SourceRecord) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(4);

    let title = record.title.trim();
    if !title.is_empty() {
        lines.push(title.to_string());
    }

    if record.source_kind == SourceKind::Paper {
        let authors = record.authors.join(", ");
        let date = record
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string());
        match (authors.is_empty(), date) {
            (false, Some(date)) => lines.push(format!("{} ({})", authors, date)),
            (false, None) => lines.push(authors),
            (true, Some(date)) => lines.push(format!("({})", date)),
            (true, None) => {}
        }
    }

    lines.push(record.body.trim().to_string());

    if let Some(url) = record.url.as_deref().filter(|u| !u.trim().is_empty()) {
        lines.push(format!("Source: {}", url.trim()));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;
    use crate::sources::mock::make_record;
    use chrono::NaiveDate;

    #[test]
    fn test_all_groups_empty() {
        let buffer = ContextBuilder::new().build(
            &[
                SourceGroup::new(SourceKind::Web, &[]),
                SourceGroup::new(SourceKind::Paper, &[]),
            ],
            1000,
        );
        assert!(buffer.is_empty());
        assert_eq!(buffer.word_count(), 0);
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn test_quantum_computing_scenario() {
        // 5 snippets of 16 words = 80, 3 abstracts of 400/3 words = 133+133+134 = 400
        let web: Vec<_> = (0..5).map(|_| make_record(SourceKind::Web, "", 16)).collect();
        let papers = vec![
            make_record(SourceKind::Paper, "", 133),
            make_record(SourceKind::Paper, "", 133),
            make_record(SourceKind::Paper, "", 134),
        ];

        let buffer = ContextBuilder::new().build(
            &[
                SourceGroup::new(SourceKind::Web, &web),
                SourceGroup::new(SourceKind::Paper, &papers),
            ],
            1000,
        );

        assert_eq!(buffer.sections().len(), 8);
        assert_eq!(buffer.word_count(), 480);
        assert_eq!(buffer.skipped(), 0);
        let kinds: Vec<_> = buffer.sections().iter().map(|s| s.source_kind).collect();
        assert_eq!(&kinds[..5], &[SourceKind::Web; 5]);
        assert_eq!(&kinds[5..], &[SourceKind::Paper; 3]);
    }

    #[test]
    fn test_earlier_group_wins_when_tight() {
        let web = vec![make_record(SourceKind::Web, "", 60)];
        let papers = vec![make_record(SourceKind::Paper, "", 60)];

        let buffer = ContextBuilder::new().build(
            &[
                SourceGroup::new(SourceKind::Web, &web),
                SourceGroup::new(SourceKind::Paper, &papers),
            ],
            100,
        );

        assert_eq!(buffer.sections().len(), 1);
        assert_eq!(buffer.sections()[0].source_kind, SourceKind::Web);
        assert_eq!(buffer.skipped(), 1);
    }

    #[test]
    fn test_oversized_record_does_not_block_later_ones() {
        let web = vec![
            make_record(SourceKind::Web, "", 10),
            make_record(SourceKind::Web, "", 500),
            make_record(SourceKind::Web, "", 20),
        ];
        let papers = vec![make_record(SourceKind::Paper, "", 30)];

        let buffer = ContextBuilder::new().build(
            &[
                SourceGroup::new(SourceKind::Web, &web),
                SourceGroup::new(SourceKind::Paper, &papers),
            ],
            100,
        );

        assert_eq!(buffer.word_count(), 60);
        assert_eq!(buffer.count_of(SourceKind::Web), 2);
        assert_eq!(buffer.count_of(SourceKind::Paper), 1);
        assert_eq!(buffer.skipped(), 1);
    }

    #[test]
    fn test_word_count_never_reaches_budget() {
        let sizes = [7, 1, 13, 40, 2, 25, 9, 3, 60, 5];
        let records: Vec<_> = sizes
            .iter()
            .map(|&n| make_record(SourceKind::Web, "", n))
            .collect();

        for budget in [0, 1, 2, 8, 15, 50, 99, 165, 1000] {
            let buffer =
                ContextBuilder::new().build(&[SourceGroup::new(SourceKind::Web, &records)], budget);
            assert!(
                buffer.word_count() <= budget,
                "budget {} overflowed with {}",
                budget,
                buffer.word_count()
            );
            let sum: usize = buffer.sections().iter().map(|s| s.word_count).sum();
            assert_eq!(sum, buffer.word_count());
            assert_eq!(buffer.sections().len() + buffer.skipped(), records.len());
        }
    }

    #[test]
    fn test_exact_fit_is_rejected() {
        let web = vec![make_record(SourceKind::Web, "", 10)];
        let buffer = ContextBuilder::new().build(&[SourceGroup::new(SourceKind::Web, &web)], 10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_unusable_records_ignored() {
        let web = vec![SourceRecord::new(SourceKind::Web, "serper", "Title only", "  ")];
        let buffer = ContextBuilder::new().build(&[SourceGroup::new(SourceKind::Web, &web)], 100);
        assert!(buffer.is_empty());
        assert_eq!(buffer.skipped(), 0);
    }

    #[test]
    fn test_render_web_section() {
        let record = RecordBuilder::new(SourceKind::Web, "serper", "What is a qubit?", "A qubit is a two-state system.")
            .url("https://example.com/qubit")
            .build();
        assert_eq!(
            render_section(&record),
            "What is a qubit?\nA qubit is a two-state system.\nSource: https://example.com/qubit"
        );
    }

    #[test]
    fn test_render_paper_section() {
        let record = RecordBuilder::new(SourceKind::Paper, "arxiv", "Surface Codes", "We study codes.")
            .authors(vec!["A. Author".to_string(), "B. Author".to_string()])
            .published_at(NaiveDate::from_ymd_opt(2024, 3, 1))
            .build();
        assert_eq!(
            render_section(&record),
            "Surface Codes\nA. Author, B. Author (2024-03-01)\nWe study codes."
        );

        let bare = SourceRecord::new(SourceKind::Paper, "arxiv", "", "Only the abstract.");
        assert_eq!(render_section(&bare), "Only the abstract.");
    }

    #[test]
    fn test_text_joins_sections() {
        let web = vec![
            SourceRecord::new(SourceKind::Web, "serper", "", "first"),
            SourceRecord::new(SourceKind::Web, "serper", "", "second"),
        ];
        let buffer = ContextBuilder::new().build(&[SourceGroup::new(SourceKind::Web, &web)], 100);
        assert_eq!(buffer.text(), "first\n\nsecond");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  one\ttwo\nthree  "), 3);
    }
}
