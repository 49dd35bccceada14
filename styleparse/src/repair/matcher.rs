//! Fuzzy lookup of schema keys in model-produced objects.
//!
//! Models drift from the requested key spelling (`coreStyle`, `Core Style`,
//! `KEY-ELEMENTS`). Matching is tried in this order:
//! 1. Exact key
//! 2. Declared aliases (exact)
//! 3. Canonical form: accents folded, separators dropped, lowercased
//!
//! Step 3 never claims a key that is itself an exact schema key.

use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

use crate::schema::{ListField, CONFIDENCE_KEY, MEMO_ALIASES, MEMO_KEY};

/// Finds one schema field in an object.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    /// Canonical key of the field.
    pub expected: &'static str,
    /// Alternate keys accepted verbatim.
    pub aliases: &'static [&'static str],
}

impl FieldMatcher {
    /// Creates a matcher without aliases.
    pub const fn new(expected: &'static str) -> Self {
        Self {
            expected,
            aliases: &[],
        }
    }

    /// Adds verbatim aliases.
    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Looks the field up in `obj`, returning the key actually used and its value.
    ///
    /// # Examples
    /// ```
    /// use styleparse::repair::matcher::FieldMatcher;
    /// use serde_json::json;
    ///
    /// let value = json!({"coreStyle": ["Nordic"]});
    /// let obj = value.as_object().unwrap();
    /// let (key, _) = FieldMatcher::new("core_style").find_in_object(obj).unwrap();
    /// assert_eq!(key, "coreStyle");
    /// ```
    pub fn find_in_object<'a>(
        &self,
        obj: &'a Map<String, Value>,
    ) -> Option<(&'a String, &'a Value)> {
        if let Some(found) = obj.iter().find(|(k, _)| k.as_str() == self.expected) {
            return Some(found);
        }

        for alias in self.aliases {
            if let Some(found) = obj.iter().find(|(k, _)| k.as_str() == *alias) {
                return Some(found);
            }
        }

        let expected = canonical_key(self.expected);
        obj.iter()
            .filter(|(k, _)| !is_schema_key(k))
            .find(|(k, _)| canonical_key(k) == expected)
    }
}

/// Returns true if `key` is spelled exactly like a schema key or alias.
fn is_schema_key(key: &str) -> bool {
    key == CONFIDENCE_KEY
        || key == MEMO_KEY
        || MEMO_ALIASES.contains(&key)
        || ListField::ALL.iter().any(|f| f.key() == key)
}

/// Folds a key to lowercase alphanumerics with accents removed.
///
/// # Examples
/// ```
/// use styleparse::repair::matcher::canonical_key;
///
/// assert_eq!(canonical_key("Core-Style"), "corestyle");
/// assert_eq!(canonical_key("coreStyle"), "corestyle");
/// assert_eq!(canonical_key("mémo"), "memo");
/// ```
pub fn canonical_key(key: &str) -> String {
    remove_accents(key)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Removes combining marks and common ligatures (é → e, ß → ss).
pub fn remove_accents(s: &str) -> String {
    let s = s
        .replace('ß', "ss")
        .replace('æ', "ae")
        .replace('Æ', "AE")
        .replace('ø', "o")
        .replace('Ø', "O")
        .replace('œ', "oe")
        .replace('Œ', "OE");

    s.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}
