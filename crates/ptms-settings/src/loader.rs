//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`PtmsSettings::default()`]
//! 2. If `~/.ptms/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `PTMS_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{PtmsSettings, StorageMode};

/// Data and config directory (`~/.ptms`).
pub fn ptms_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".ptms")
}

/// Resolve the path to the settings file (`~/.ptms/settings.json`).
pub fn settings_path() -> PathBuf {
    ptms_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<PtmsSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or an invalid merged value
/// is an error.
pub fn load_settings_from_path(path: &Path) -> Result<PtmsSettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file(path: &Path) -> Result<PtmsSettings> {
    let defaults = serde_json::to_value(PtmsSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `PTMS_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut PtmsSettings) {
    apply_overrides_from(settings, &|name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`. Invalid values are ignored with a
/// warning.
pub fn apply_overrides_from(settings: &mut PtmsSettings, lookup: &dyn Fn(&str) -> Option<String>) {
    let env = Env(lookup);

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("PTMS_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u64_in("PTMS_PORT", 1, 65_535).or_else(|| env.u64_in("PORT", 1, 65_535)) {
        settings.server.port = u16::try_from(v).unwrap_or(settings.server.port);
    }
    if let Some(v) = env.string("PTMS_STORAGE_DIR") {
        settings.server.storage_dir = v;
    }

    // ── Storage ─────────────────────────────────────────────────────
    if let Some(v) = env.string("PTMS_STORAGE_MODE") {
        match StorageMode::parse(&v) {
            Some(mode) => settings.storage.mode = mode,
            None => warn!(key = "PTMS_STORAGE_MODE", value = %v, "unknown storage mode, ignoring"),
        }
    }
    if let Some(v) = env.string("PTMS_API_URL") {
        settings.storage.api_url = v;
    }
    if let Some(v) = env.u64_in("PTMS_STORAGE_TIMEOUT_MS", 100, 600_000) {
        settings.storage.timeout_ms = v;
    }

    // ── Timer / logging ─────────────────────────────────────────────
    if let Some(v) = env.u64_in("PTMS_TICK_INTERVAL_MS", 50, 60_000) {
        settings.timer.tick_interval_ms = v;
    }
    if let Some(v) = env.string("PTMS_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("PTMS_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64_in(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> PtmsSettings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut settings = PtmsSettings::default();
        apply_overrides_from(&mut settings, &|name| vars.get(name).cloned());
        settings
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 3000, "host": "127.0.0.1"}});
        let source = serde_json::json!({"server": {"port": 4000}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 4000);
        assert_eq!(merged["server"]["host"], "127.0.0.1");
    }

    #[test]
    fn merge_array_replace() {
        let merged = deep_merge(
            serde_json::json!({"items": [1, 2, 3]}),
            serde_json::json!({"items": [4]}),
        );
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let merged = deep_merge(
            serde_json::json!({"a": {"nested": true}}),
            serde_json::json!({"a": 42}),
        );
        assert_eq!(merged["a"], 42);
    }

    // ── load_file ───────────────────────────────────────────────────

    #[test]
    fn missing_file_returns_defaults() {
        let settings = load_file(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, PtmsSettings::default());
    }

    #[test]
    fn partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 4000}, "storage": {"mode": "remote", "timeoutMs": 2000}}"#,
        )
        .unwrap();

        let settings = load_file(&path).unwrap();
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.storage.mode, StorageMode::Remote);
        assert_eq!(settings.storage.timeout_ms, 2000);
        assert_eq!(settings.storage.api_url, "http://localhost:3000/api");
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();
        assert!(matches!(load_file(&path), Err(SettingsError::Json(_))));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let s = overrides(&[
            ("PTMS_HOST", "0.0.0.0"),
            ("PTMS_PORT", "8081"),
            ("PTMS_STORAGE_MODE", "LOCAL"),
            ("PTMS_STORAGE_TIMEOUT_MS", "1500"),
            ("PTMS_TICK_INTERVAL_MS", "250"),
            ("PTMS_LOG_JSON", "yes"),
        ]);
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.server.port, 8081);
        assert_eq!(s.storage.mode, StorageMode::Local);
        assert_eq!(s.storage.timeout_ms, 1500);
        assert_eq!(s.timer.tick_interval_ms, 250);
        assert!(s.logging.json);
    }

    #[test]
    fn port_falls_back_to_plain_port() {
        assert_eq!(overrides(&[("PORT", "5000")]).server.port, 5000);
        assert_eq!(
            overrides(&[("PORT", "5000"), ("PTMS_PORT", "6000")]).server.port,
            6000
        );
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let s = overrides(&[
            ("PTMS_PORT", "0"),
            ("PTMS_STORAGE_MODE", "s3"),
            ("PTMS_LOG_JSON", "maybe"),
            ("PTMS_HOST", ""),
        ]);
        assert_eq!(s, PtmsSettings::default());
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in ["true", "1", "yes", "ON"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in ["false", "0", "no", "Off"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("1000", 1000, 600_000), Some(1000));
        assert_eq!(parse_u64_range("500", 1000, 600_000), None);
        assert_eq!(parse_u64_range("abc", 1000, 600_000), None);
    }
}
