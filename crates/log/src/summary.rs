//! Execution log summaries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::level::LogLevel;

/// Aggregate counts over one execution's log buffer, returned by
/// [`crate::logger::ExecutionLogger::summary`] (`spec.md` §4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionLogSummary {
    /// Number of entries per severity.
    pub counts_by_level: HashMap<LogLevel, usize>,
    /// Number of `NODE_END` entries.
    pub node_count: usize,
    /// Wall-clock duration between `EXECUTION_START` and `EXECUTION_END`,
    /// in milliseconds, if both are present.
    pub duration_ms: Option<i64>,
    /// `true` if an `EXECUTION_END` entry recorded success.
    pub success: Option<bool>,
}
