//! A single, immutable log entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use nebula_wf_core::{ExecutionId, LogEntryId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::LogCategory;
use crate::level::LogLevel;

/// Opaque structured context attached to a log entry.
pub type LogContext = HashMap<String, Value>;

/// A structured, category-tagged log record (`spec.md` §3 — `LogEntry`).
///
/// Immutable once constructed; `context` follows the key conventions in
/// `spec.md` §4.3 depending on `category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique id, assigned by the logger.
    pub id: LogEntryId,
    /// The execution this entry belongs to.
    #[serde(rename = "executionId")]
    pub execution_id: ExecutionId,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Which of the closed set of categories this entry belongs to.
    pub category: LogCategory,
    /// Human-readable message.
    pub message: String,
    /// Structured, category-specific context.
    #[serde(default)]
    pub context: LogContext,
}

/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis marker if truncated. Operates on `char` boundaries so it never
/// panics on multi-byte UTF-8 input.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push('\u{2026}');
    truncated
}

/// Render a JSON value as a truncated, human-readable preview string.
///
/// Used for the `*Preview` context keys on `NODE_INPUT`/`NODE_OUTPUT`
/// entries (`spec.md` §4.3 — truncated to 100 chars per value).
#[must_use]
pub fn preview(value: &Value, max_chars: usize) -> String {
    truncate(&value.to_string(), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 100), "hello");
    }

    #[test]
    fn truncate_long_string_adds_ellipsis() {
        let s = "a".repeat(150);
        let t = truncate(&s, 100);
        assert_eq!(t.chars().count(), 101);
        assert!(t.ends_with('\u{2026}'));
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        let s = "é".repeat(150);
        let t = truncate(&s, 100);
        assert_eq!(t.chars().count(), 101);
    }

    #[test]
    fn preview_renders_json() {
        let v = serde_json::json!({"a": 1});
        assert_eq!(preview(&v, 100), "{\"a\":1}");
    }
}
