//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! JSON file only needs the keys it changes.

mod server;
mod storage;

pub use server::*;
pub use storage::*;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "port": 4000 },
///   "storage": { "mode": "remote", "apiUrl": "http://nas.local:3000/api" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PtmsSettings {
    /// File server settings.
    pub server: ServerSettings,
    /// Which persistence backend the CLI uses.
    pub storage: StorageSettings,
    /// Active-timer refresh.
    pub timer: TimerSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl PtmsSettings {
    /// Resolve a configured path: absolute paths are kept, relative ones
    /// are joined onto `home`.
    pub fn resolve_path(home: &Path, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            home.join(path)
        }
    }

    /// Directory the file server and file backend keep collections in.
    pub fn storage_dir(&self, home: &Path) -> PathBuf {
        Self::resolve_path(home, &self.server.storage_dir)
    }

    /// Directory of the offline cache used in remote mode.
    pub fn cache_dir(&self, home: &Path) -> PathBuf {
        Self::resolve_path(home, &self.storage.cache_dir)
    }

    /// Reject values that would only fail later, at first use.
    pub fn validate(&self) -> Result<()> {
        let url = &self.storage.api_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidValue(format!(
                "storage.apiUrl must be an http(s) URL, got {url:?}"
            )));
        }
        if self.timer.tick_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "timer.tickIntervalMs must be positive".into(),
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "server.bodyLimitBytes must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = PtmsSettings::default();
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.port, 3000);
        assert_eq!(s.server.body_limit_bytes, 50 * 1024 * 1024);
        assert_eq!(s.storage.mode, StorageMode::File);
        assert_eq!(s.storage.api_url, "http://localhost:3000/api");
        assert_eq!(s.storage.timeout_ms, 5000);
        assert_eq!(s.timer.tick_interval_ms, 1000);
        assert_eq!(s.logging.level, "info");
        assert!(!s.logging.json);
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(PtmsSettings::default()).unwrap();
        assert_eq!(json["server"]["storageDir"], "storage");
        assert_eq!(json["storage"]["mode"], "file");
        assert_eq!(json["timer"]["tickIntervalMs"], 1000);
    }

    #[test]
    fn paths_resolve_against_home() {
        let home = Path::new("/home/u/.ptms");
        let mut s = PtmsSettings::default();
        assert_eq!(s.storage_dir(home), home.join("storage"));
        s.server.storage_dir = "/srv/tms".into();
        assert_eq!(s.storage_dir(home), PathBuf::from("/srv/tms"));
        assert_eq!(s.cache_dir(home), home.join("cache"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(PtmsSettings::default().validate().is_ok());
        let mut s = PtmsSettings::default();
        s.storage.api_url = "localhost:3000".into();
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
        let mut s = PtmsSettings::default();
        s.timer.tick_interval_ms = 0;
        assert!(s.validate().is_err());
    }
}
