//! Keyword scanner for responses without any parseable JSON.
//!
//! Only `core_style` and `memo` are derived here. Everything else is left
//! absent for the repairer to default.

use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

use crate::{
    config::HeuristicConfig,
    schema::{ListField, MEMO_KEY},
    value::RawCandidate,
};

/// Key-value separators, in the order they are tried.
const SEPARATORS: [char; 2] = [':', '：'];

/// Appended to a memo cut at the length cap.
const ELLIPSIS: &str = "...";

/// Derives a best-effort candidate from free text.
///
/// # Examples
///
/// ```
/// use styleparse::parser::FreeTextExtractor;
///
/// let extractor = FreeTextExtractor::default();
/// let candidate = extractor.extract("Style: Nordic, Minimal\nLots of light.");
/// assert_eq!(candidate.fields["core_style"], serde_json::json!(["Nordic", "Minimal"]));
/// ```
#[derive(Debug, Clone)]
pub struct FreeTextExtractor {
    config: HeuristicConfig,
    /// Lowercased, NFC-normalized keywords.
    keywords: Vec<String>,
}

impl Default for FreeTextExtractor {
    fn default() -> Self {
        Self::new(HeuristicConfig::default())
    }
}

impl FreeTextExtractor {
    /// Creates a scanner with the given settings.
    pub fn new(config: HeuristicConfig) -> Self {
        let keywords = config
            .keywords
            .iter()
            .map(|k| normalize(k.trim()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { config, keywords }
    }

    /// Scans `text` line by line. Always returns a candidate.
    pub fn extract(&self, text: &str) -> RawCandidate {
        let mut fields = Map::new();

        let styles = self.scan_styles(text);
        if !styles.is_empty() {
            tracing::debug!(tokens = styles.len(), "Found style tokens in free text");
            fields.insert(
                ListField::CoreStyle.key().to_string(),
                Value::Array(styles.into_iter().map(Value::String).collect()),
            );
        }

        fields.insert(MEMO_KEY.to_string(), Value::String(self.memo(text)));

        RawCandidate::scanned(fields)
    }

    /// Collects style tokens from keyword lines that carry a separator.
    fn scan_styles(&self, text: &str) -> Vec<String> {
        let mut styles = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let normalized = normalize(line);
            if !self.keywords.iter().any(|k| normalized.contains(k.as_str())) {
                continue;
            }

            let Some(value) = split_value(line) else {
                continue;
            };

            styles.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .take(self.config.max_tokens_per_line)
                    .map(str::to_string),
            );
        }

        styles
    }

    /// Quotes the text when it is long enough, else the completion memo.
    fn memo(&self, text: &str) -> String {
        let len = text.chars().count();
        if len <= self.config.memo_min_chars {
            return self.config.completion_memo.clone();
        }

        let mut memo: String = text.chars().take(self.config.memo_max_chars).collect();
        if len > self.config.memo_max_chars {
            memo.push_str(ELLIPSIS);
        }
        memo
    }
}

/// Returns the part after the first separator, trying `:` before `：`.
fn split_value(line: &str) -> Option<&str> {
    SEPARATORS
        .iter()
        .find_map(|sep| line.split_once(*sep))
        .map(|(_, value)| value)
}

fn normalize(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}
