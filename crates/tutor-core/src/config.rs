//! The configuration surface from spec §6, loaded once at startup from an
//! optional TOML file, with every field individually defaulted and
//! overridable from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCoreConfig {
    pub tool_deadline_ms: u64,
    pub inactivity_ms: u64,
    pub tick_ms: u64,
    pub executor_concurrency_cap: usize,
    pub executor_queue_cap: usize,
    pub history_retained: usize,
    pub persistence_enabled: bool,
    pub transport_reconnect_grace_ms: u64,

    /// Threshold for the `error_identified ∧ confidence ≥ threshold` rule
    /// (spec §4.5 / §9 open question b).
    pub diagnosis_known_threshold: f64,

    /// Keywords that make the Session treat a `GuidingStudent`/remediation
    /// reply as "ready to retry" without a `classify_intent` round trip.
    pub readiness_keywords: Vec<String>,
}

impl Default for SessionCoreConfig {
    fn default() -> Self {
        Self {
            tool_deadline_ms: 30_000,
            inactivity_ms: 30 * 60 * 1000,
            tick_ms: 30_000,
            executor_concurrency_cap: 16,
            executor_queue_cap: 64,
            history_retained: 200,
            persistence_enabled: true,
            transport_reconnect_grace_ms: 60_000,
            diagnosis_known_threshold: 0.5,
            readiness_keywords: vec![
                "ok".into(),
                "okay".into(),
                "got it".into(),
                "i see".into(),
                "ready".into(),
                "understand".into(),
                "yes".into(),
            ],
        }
    }
}

impl SessionCoreConfig {
    /// Loads a config file if present, applying documented defaults to any
    /// field the file omits; falls back to all-defaults if the file is
    /// absent. Environment variables of the form `SESSION_CORE_<FIELD>`
    /// override individual scalar fields for containerized deployment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => toml::from_str(&text)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u64("SESSION_CORE_TOOL_DEADLINE_MS") {
            self.tool_deadline_ms = v;
        }
        if let Some(v) = env_u64("SESSION_CORE_INACTIVITY_MS") {
            self.inactivity_ms = v;
        }
        if let Some(v) = env_u64("SESSION_CORE_TICK_MS") {
            self.tick_ms = v;
        }
        if let Some(v) = std::env::var("SESSION_CORE_EXECUTOR_CONCURRENCY_CAP")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.executor_concurrency_cap = v;
        }
        if let Some(v) = std::env::var("SESSION_CORE_PERSISTENCE_ENABLED")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.persistence_enabled = v;
        }
        if let Some(v) = std::env::var("SESSION_CORE_DIAGNOSIS_KNOWN_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.diagnosis_known_threshold = v;
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let config = SessionCoreConfig::default();
        assert!(config.tool_deadline_ms > 0);
        assert!(config.executor_concurrency_cap > 0);
        assert!((0.0..=1.0).contains(&config.diagnosis_known_threshold));
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_absent() {
        let config = SessionCoreConfig::load("/nonexistent/path/session-core.toml").unwrap();
        assert_eq!(config.tool_deadline_ms, SessionCoreConfig::default().tool_deadline_ms);
    }

    #[test]
    fn load_applies_partial_overrides_from_file() {
        let dir = std::env::temp_dir().join(format!("session-core-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "tool_deadline_ms = 5000\n").unwrap();

        let config = SessionCoreConfig::load(&path).unwrap();
        assert_eq!(config.tool_deadline_ms, 5000);
        assert_eq!(config.tick_ms, SessionCoreConfig::default().tick_ms);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
