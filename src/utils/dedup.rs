//! Near-duplicate removal for fetched records.
//!
//! Search providers often return the same snippet for several mirrors of one
//! page. Feeding those twice to the summarizer wastes budget, so records whose
//! body is almost identical to an earlier one are dropped.

use strsim::jaro_winkler;

use crate::models::SourceRecord;

/// Default similarity above which two bodies are considered the same
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.97;

/// Find indices of records that duplicate an earlier record
///
/// Returns pairs of `(duplicate, original)` indices in scan order.
pub fn find_duplicates(records: &[SourceRecord], threshold: f64) -> Vec<(usize, usize)> {
    let normalized: Vec<String> = records.iter().map(|r| normalize_text(&r.body)).collect();
    let mut duplicates = Vec::new();

    for j in 1..records.len() {
        let original = (0..j)
            .filter(|i| !duplicates.iter().any(|(dup, _)| dup == i))
            .find(|&i| are_duplicates(&normalized[i], &normalized[j], threshold));

        if let Some(i) = original {
            duplicates.push((j, i));
        }
    }

    duplicates
}

fn are_duplicates(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || jaro_winkler(a, b) >= threshold
}

/// Normalize text for comparison
fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove near-duplicate records, keeping the first occurrence.
///
/// A threshold of `0.0` or less disables deduplication.
pub fn deduplicate_records(records: Vec<SourceRecord>, threshold: f64) -> Vec<SourceRecord> {
    if threshold <= 0.0 || records.len() < 2 {
        return records;
    }

    let duplicates = find_duplicates(&records, threshold);
    if duplicates.is_empty() {
        return records;
    }

    tracing::debug!("Dropping {} near-duplicate records", duplicates.len());

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !duplicates.iter().any(|(dup, _)| dup == i))
        .map(|(_, record)| record)
        .collect()
}
