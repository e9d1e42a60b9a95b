//! Configuration loading and management.

use std::path::{Path, PathBuf};

use alog_core::DEFAULT_WINDOW_MINUTES;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum gap in minutes between two kept events of the same person.
    pub dedup_window_minutes: i64,

    /// Offset from UTC, in minutes, used for calendar days and hour buckets.
    pub utc_offset_minutes: i32,

    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,

    /// Whether distributions count deduplicated visits rather than raw detections.
    pub dedup_before_aggregating: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dedup_window_minutes: DEFAULT_WINDOW_MINUTES,
            utc_offset_minutes: 0,
            export_dir: PathBuf::from("."),
            dedup_before_aggregating: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ALOG_*)
        figment = figment.merge(Env::prefixed("ALOG_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for alog.
///
/// On Linux: `~/.config/alog`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("alog"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use figment::Jail;

    #[test]
    fn test_dirs_config_path_ends_with_alog() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "alog");
    }

    #[test]
    fn test_default_config_uses_thirty_minute_window() {
        let config = Config::default();
        assert_eq!(config.dedup_window_minutes, 30);
        assert_eq!(config.utc_offset_minutes, 0);
        assert!(config.dedup_before_aggregating);
    }

    #[test]
    fn test_config_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "alog.toml",
                "dedup_window_minutes = 15\nutc_offset_minutes = 330\n",
            )?;
            jail.set_env("ALOG_DEDUP_WINDOW_MINUTES", "45");

            let config = Config::load_from(Some(Path::new("alog.toml")))?;
            assert_eq!(config.dedup_window_minutes, 45);
            assert_eq!(config.utc_offset_minutes, 330);
            assert_eq!(config.export_dir, PathBuf::from("."));
            Ok(())
        });
    }
}
