//! Runtime configuration (`spec.md` §6).

use serde::{Deserialize, Serialize};

use nebula_wf_log::LogLevel;

/// Recognized runtime options for the execution engine.
///
/// `max_parallel`, `retry_attempts`, and `retry_delay_ms` are advisory
/// hints surfaced to executors via the execution context; the engine
/// itself does not enforce them (`spec.md` §6, §5 "Timeouts").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// `execution.defaultTimeout`, milliseconds. Advisory only.
    pub default_timeout_ms: u64,
    /// `execution.maxParallel`. Advisory only — the engine imposes no cap
    /// on fan-out width.
    pub max_parallel: usize,
    /// `execution.retryAttempts`. Advisory only.
    pub retry_attempts: u32,
    /// `execution.retryDelay`, milliseconds. Advisory only.
    pub retry_delay_ms: u64,
    /// `execution.logLevel`, applied to the console sink.
    pub log_level: LogLevel,
    /// `plugins.directory`.
    pub plugins_directory: Option<String>,
    /// `plugins.enabled`.
    pub plugins_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            max_parallel: 10,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            log_level: LogLevel::Info,
            plugins_directory: None,
            plugins_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.default_timeout_ms, 30_000);
        assert_eq!(cfg.max_parallel, 10);
        assert_eq!(cfg.retry_attempts, 3);
        assert_eq!(cfg.retry_delay_ms, 1_000);
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert!(!cfg.plugins_enabled);
    }

    #[test]
    fn serde_roundtrip_uses_camel_case() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        assert!(json.get("defaultTimeoutMs").is_some());
        assert!(json.get("maxParallel").is_some());
        let back: EngineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.default_timeout_ms, cfg.default_timeout_ms);
    }
}
