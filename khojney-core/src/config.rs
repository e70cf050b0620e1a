//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/khojney/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/khojney/` (~/.config/khojney/)
//! - Data: `$XDG_DATA_HOME/khojney/` (~/.local/share/khojney/)
//! - State/Logs: `$XDG_STATE_HOME/khojney/` (~/.local/state/khojney/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Admin analytics report settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Personal dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Leaderboard settings
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Quiz play settings
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Admin analytics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Length of the default report range, ending today
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,

    /// Number of hardest/easiest questions to report
    #[serde(default = "default_top_questions")]
    pub top_questions: usize,

    /// Number of leaderboard rows shown in the report
    #[serde(default = "default_report_leaderboard_limit")]
    pub leaderboard_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_range_days: default_range_days(),
            top_questions: default_top_questions(),
            leaderboard_limit: default_report_leaderboard_limit(),
        }
    }
}

fn default_range_days() -> u32 {
    30
}

fn default_top_questions() -> usize {
    5
}

fn default_report_leaderboard_limit() -> usize {
    10
}

/// Personal dashboard configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Quiz history page size
    #[serde(default = "default_attempts_per_page")]
    pub attempts_per_page: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            attempts_per_page: default_attempts_per_page(),
        }
    }
}

fn default_attempts_per_page() -> usize {
    5
}

/// Leaderboard configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LeaderboardConfig {
    /// Maximum rows listed per leaderboard view
    #[serde(default = "default_leaderboard_limit")]
    pub limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: default_leaderboard_limit(),
        }
    }
}

fn default_leaderboard_limit() -> usize {
    100
}

/// Quiz play configuration
#[derive(Debug, Deserialize, Clone)]
pub struct QuizConfig {
    /// Questions per quiz when the caller gives no limit
    #[serde(default = "default_question_limit")]
    pub default_question_limit: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            default_question_limit: default_question_limit(),
        }
    }
}

fn default_question_limit() -> usize {
    10
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make reports meaningless
    pub fn validate(&self) -> Result<()> {
        if self.analytics.default_range_days == 0 {
            return Err(Error::Config(
                "analytics.default_range_days must be at least 1".to_string(),
            ));
        }
        if self.dashboard.attempts_per_page == 0 {
            return Err(Error::Config(
                "dashboard.attempts_per_page must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/khojney/config.toml` (~/.config/khojney/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("khojney").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("khojney")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("khojney")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/khojney/data.db` (~/.local/share/khojney/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("khojney.log")
    }
}
