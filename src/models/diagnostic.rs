//! Side channel for non-fatal problems encountered while serving a query.
//!
//! Sources and the summarizer never fail the whole query. Instead they push a
//! [`Diagnostic`] into the shared [`Diagnostics`] collector and degrade to
//! fewer (or no) results. The presentation layer decides how to show them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An API key needed by the provider is not configured
    CredentialsMissing,

    /// Network, timeout or HTTP status failure
    Transport(String),

    /// The provider response (or one record of it) could not be parsed
    Parse(String),

    /// Summarizer input was cut down to the model ceiling
    Truncated {
        from: usize,
        to: usize,
        unit: LengthUnit,
    },
}

/// Unit used when measuring summarizer input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Tokens,
    Chars,
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthUnit::Tokens => f.write_str("tokens"),
            LengthUnit::Chars => f.write_str("characters"),
        }
    }
}

/// A single diagnostic event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Component that raised it ("serper", "arxiv", "summarizer", ...)
    pub origin: String,

    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(origin: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            origin: origin.into(),
            kind,
        }
    }

    /// Whether the diagnostic means a request did not complete
    pub fn is_failure(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Transport(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::CredentialsMissing => {
                write!(f, "{}: API key is not configured", self.origin)
            }
            DiagnosticKind::Transport(msg) => write!(f, "{}: request failed: {}", self.origin, msg),
            DiagnosticKind::Parse(msg) => write!(f, "{}: unreadable response: {}", self.origin, msg),
            DiagnosticKind::Truncated { from, to, unit } => write!(
                f,
                "{}: input truncated from {} to {} {}",
                self.origin, from, to, unit
            ),
        }
    }
}

/// Thread-safe collector shared by every stage of one query.
///
/// Cloning is cheap and all clones write to the same list.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn emit(&self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }

    /// Shorthand for `emit(Diagnostic::new(origin, kind))`
    pub fn report(&self, origin: &str, kind: DiagnosticKind) {
        self.emit(Diagnostic::new(origin, kind));
    }

    /// Copy of everything recorded so far, in emission order
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Whether any diagnostic from `origin` matches `predicate`
    pub fn any_from(&self, origin: &str, predicate: impl Fn(&DiagnosticKind) -> bool) -> bool {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .any(|d| d.origin == origin && predicate(&d.kind))
            })
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_events() {
        let diagnostics = Diagnostics::new();
        let clone = diagnostics.clone();
        clone.report("serper", DiagnosticKind::CredentialsMissing);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.any_from("serper", |k| *k == DiagnosticKind::CredentialsMissing));
        assert!(!diagnostics.any_from("arxiv", |_| true));
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::new(
            "summarizer",
            DiagnosticKind::Truncated {
                from: 2000,
                to: 1024,
                unit: LengthUnit::Tokens,
            },
        );
        assert_eq!(
            d.to_string(),
            "summarizer: input truncated from 2000 to 1024 tokens"
        );
        assert!(!d.is_failure());
        assert!(Diagnostic::new("arxiv", DiagnosticKind::Transport("timeout".into())).is_failure());
    }

    #[test]
    fn test_serialize_shape() {
        let d = Diagnostic::new("serpapi", DiagnosticKind::CredentialsMissing);
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["origin"], "serpapi");
        assert_eq!(value["kind"], "credentials_missing");
    }
}
