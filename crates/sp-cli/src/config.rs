//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sp_core::{ClockTime, DayWindow, PlannerConfig, RetryPolicy, SlotRules};

/// Where subjects and schedules are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local SQLite database.
    #[default]
    Local,
    /// Hosted study planner API.
    Remote,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    pub backend: Backend,

    /// Base URL of the hosted API, e.g. `https://planner.example.com`.
    pub api_url: Option<String>,

    /// Bearer token for the hosted API.
    pub api_token: Option<String>,

    /// Start of the daily study window.
    pub day_start: ClockTime,

    /// End of the daily study window.
    pub day_end: ClockTime,

    /// Attempts per subject save before giving up.
    pub save_attempts: u32,

    /// Pause between save attempts.
    pub retry_delay_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("backend", &self.backend)
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("day_start", &self.day_start)
            .field("day_end", &self.day_end)
            .field("save_attempts", &self.save_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let window = DayWindow::default();
        let retry = RetryPolicy::default();
        Self {
            database_path: data_dir.join("sp.db"),
            backend: Backend::Local,
            api_url: None,
            api_token: None,
            day_start: window.start(),
            day_end: window.end(),
            save_attempts: retry.max_attempts,
            retry_delay_ms: u64::try_from(retry.delay.as_millis()).unwrap_or(u64::MAX),
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

        // Load from environment variables (SP_*)
        figment = figment.merge(Env::prefixed("SP_"));

        figment.extract()
    }

    /// Planner settings for the configured study window.
    pub fn planner_config(&self) -> anyhow::Result<PlannerConfig> {
        let window = DayWindow::new(self.day_start, self.day_end)
            .context("day_start must be before day_end")?;
        Ok(PlannerConfig {
            window,
            slots: SlotRules::default(),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.save_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Returns the platform-specific config directory for sp.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sp"))
}

/// Returns the platform-specific data directory for sp.
///
/// On Linux: `~/.local/share/sp`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("sp"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_sp() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "sp");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("sp.db"));
        assert_eq!(config.backend, Backend::Local);
        assert_eq!(config.day_start.to_string(), "08:00");
        assert_eq!(config.day_end.to_string(), "20:00");
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/tmp/planner.db"
backend = "remote"
api_url = "http://localhost:5000"
api_token = "secret"
day_start = "09:30"
day_end = "17:00"
save_attempts = 5
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/planner.db"));
        assert_eq!(config.backend, Backend::Remote);
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.save_attempts, 5);
        assert_eq!(config.retry_delay_ms, 1000);

        let planner = config.planner_config().unwrap();
        assert_eq!(planner.window.minutes(), 450);
    }

    #[test]
    fn test_load_rejects_bad_clock_time() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"day_start = "8 o'clock""#).unwrap();
        assert!(Config::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let config = Config {
            day_start: "18:00".parse().unwrap(),
            day_end: "09:00".parse().unwrap(),
            ..Config::default()
        };
        assert!(config.planner_config().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config {
            api_token: Some("secret-token".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
