//! Input ceiling for the summarization model.
//!
//! Seq2seq summarizers have a hard maximum input length. When a BPE tokenizer
//! can be loaded the ceiling is measured in tokens; otherwise the cruder
//! character count is used. Either way, over-long input keeps its prefix.

use std::borrow::Cow;
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

use crate::config::SummarizerConfig;
use crate::models::LengthUnit;

static TOKENIZER: OnceLock<Option<CoreBPE>> = OnceLock::new();

/// Process-wide tokenizer, loaded on first use
fn tokenizer() -> Option<&'static CoreBPE> {
    TOKENIZER
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!("Tokenizer unavailable, limiting input by characters: {}", e);
                None
            }
        })
        .as_ref()
}

/// Maximum model input, in tokens or characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLimit {
    Tokens(usize),
    Chars(usize),
}

/// Input after the ceiling was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedInput<'a> {
    pub text: Cow<'a, str>,
    /// Length of the original input, in the limit's unit
    pub original: usize,
    /// Length kept, in the limit's unit
    pub kept: usize,
    pub unit: LengthUnit,
}

impl LimitedInput<'_> {
    pub fn was_truncated(&self) -> bool {
        self.kept < self.original
    }
}

impl InputLimit {
    /// Token ceiling if a tokenizer loads, character ceiling otherwise
    pub fn from_config(config: &SummarizerConfig) -> Self {
        if tokenizer().is_some() {
            InputLimit::Tokens(config.max_input_tokens)
        } else {
            InputLimit::Chars(config.max_input_chars)
        }
    }

    pub fn unit(&self) -> LengthUnit {
        match self {
            InputLimit::Tokens(_) => LengthUnit::Tokens,
            InputLimit::Chars(_) => LengthUnit::Chars,
        }
    }

    /// Cut `text` down to the ceiling, keeping its prefix.
    ///
    /// Same input always yields the same output.
    pub fn apply<'a>(&self, text: &'a str) -> LimitedInput<'a> {
        match *self {
            InputLimit::Chars(max) => truncate_chars(text, max),
            InputLimit::Tokens(max) => match tokenizer() {
                Some(bpe) => truncate_tokens(bpe, text, max)
                    .unwrap_or_else(|| truncate_chars(text, max.saturating_mul(4))),
                None => truncate_chars(text, max.saturating_mul(4)),
            },
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> LimitedInput<'_> {
    let original = text.chars().count();
    if original <= max {
        return LimitedInput {
            text: Cow::Borrowed(text),
            original,
            kept: original,
            unit: LengthUnit::Chars,
        };
    }

    LimitedInput {
        text: Cow::Owned(text.chars().take(max).collect()),
        original,
        kept: max,
        unit: LengthUnit::Chars,
    }
}

/// Token prefix truncation. A cut can land inside a multi-byte character, in
/// which case the prefix is shortened a few tokens until it decodes.
fn truncate_tokens<'a>(bpe: &CoreBPE, text: &'a str, max: usize) -> Option<LimitedInput<'a>> {
    let tokens = bpe.encode_ordinary(text);
    let original = tokens.len();
    if original <= max {
        return Some(LimitedInput {
            text: Cow::Borrowed(text),
            original,
            kept: original,
            unit: LengthUnit::Tokens,
        });
    }

    (max.saturating_sub(4)..=max).rev().find_map(|end| {
        bpe.decode(tokens[..end].to_vec())
            .ok()
            .map(|prefix| LimitedInput {
                text: Cow::Owned(prefix),
                original,
                kept: end,
                unit: LengthUnit::Tokens,
            })
    })
}
