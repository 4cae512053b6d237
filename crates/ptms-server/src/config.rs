//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ptms_settings::PtmsSettings;

/// Configuration for the file server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (`0` picks a free port).
    pub port: u16,
    /// Directory holding the collection files.
    pub storage_dir: PathBuf,
    /// Maximum JSON body size in bytes.
    pub body_limit_bytes: usize,
    /// How long in-flight requests get to finish on shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            storage_dir: PathBuf::from("storage"),
            body_limit_bytes: 50 * 1024 * 1024,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Build from loaded settings, resolving the storage directory against
    /// `home`.
    pub fn from_settings(settings: &PtmsSettings, home: &Path) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            storage_dir: settings.storage_dir(home),
            body_limit_bytes: settings.server.body_limit_bytes,
            shutdown_timeout: Duration::from_secs(settings.server.shutdown_timeout_secs),
        }
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_defaults() {
        let home = Path::new("/home/u/.ptms");
        let from_settings = ServerConfig::from_settings(&PtmsSettings::default(), home);
        let defaults = ServerConfig::default();
        assert_eq!(from_settings.host, defaults.host);
        assert_eq!(from_settings.port, defaults.port);
        assert_eq!(from_settings.body_limit_bytes, defaults.body_limit_bytes);
        assert_eq!(from_settings.shutdown_timeout, defaults.shutdown_timeout);
        assert_eq!(from_settings.storage_dir, home.join("storage"));
    }

    #[test]
    fn bind_addr() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
    }
}
