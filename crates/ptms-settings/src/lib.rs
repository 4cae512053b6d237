//! # ptms-settings
//!
//! Layered settings for Project-TMS.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** ([`PtmsSettings::default()`])
//! 2. **User file**: `~/.ptms/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `PTMS_*` overrides (highest priority)
//!
//! The process-wide copy behind [`get_settings`] is for the binary's edges;
//! stores and the server take their configuration as explicit arguments.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, ptms_home, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<PtmsSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.ptms/settings.json` with env var
/// overrides, falling back to compiled defaults if loading fails.
pub fn get_settings() -> &'static PtmsSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: PtmsSettings) -> std::result::Result<(), PtmsSettings> {
    SETTINGS.set(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_under_ptms_home() {
        assert!(settings_path().ends_with(".ptms/settings.json"));
        assert_eq!(settings_path().parent(), Some(ptms_home().as_path()));
    }

    #[test]
    fn init_then_get() {
        let mut custom = PtmsSettings::default();
        custom.server.port = 4321;
        // another test in this binary may have initialized it first
        if init_settings(custom).is_ok() {
            assert_eq!(get_settings().server.port, 4321);
        }
    }
}
