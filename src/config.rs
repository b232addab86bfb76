//! # Configuration Management

//! This module handles the configuration loading and management for the shipment board.
//! It leverages the `config` crate to provide a flexible and structured way to define and access configuration settings from various sources, including:

//! * YAML configuration files (default.yaml, development.yaml, production.yaml)
//! * Environment variables

//! The core of this module is the `Settings` struct, which encapsulates all the configuration settings required by the application.

use serde::Deserialize;
use config::{Config, Environment, File};
use std::{env, fmt};
use std::path::PathBuf;
use chrono::Weekday;
use secrecy::Secret;
use log::debug;
use crate::errors::BoardError;
use crate::models::{GridLayout, ViewMode};
use crate::projection::DEFAULT_TOP_N;

/// Represents the complete set of configuration settings for the shipment board.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Settings for reaching the shipment REST backend
    pub backend: BackendSettings,
    /// Layout and behaviour of the scheduling board
    #[serde(default)]
    pub board: BoardSettings,
    /// Settings for application logging
    pub logging: LoggingSettings,
}

/// Holds the settings needed to talk to the shipment backend
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the API, e.g. `https://dash.example.com`
    pub base_url: String,
    /// Path of the shipments collection
    #[serde(default = "default_shipments_path")]
    pub shipments_path: String,
    /// Path of the reschedule endpoint
    #[serde(default = "default_reschedule_path")]
    pub reschedule_path: String,
    /// Bearer token sent with every request
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub api_token: Option<Secret<String>>,
    /// Request timeout in milliseconds; the transport default applies when absent
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

/// Holds the layout and behaviour settings of the scheduling board
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoardSettings {
    /// View shown at start-up
    pub default_view: ViewMode,
    /// First day of the week in month and week grids
    pub week_start: Weekday,
    /// First hour bucket of the week and day grids
    pub first_hour: u32,
    /// Last hour bucket of the week and day grids (inclusive)
    pub last_hour: u32,
    /// Cards shown per month-view day before the overflow badge
    pub month_visible: usize,
    /// Cards shown per hour bucket before the overflow badge
    pub hour_visible: usize,
    /// Roles allowed to drag shipments
    pub drag_roles: Vec<String>,
    /// Role of the operator running this board
    pub operator_role: Option<String>,
    /// Whether a confirmed reschedule triggers a full refresh
    pub resync_on_success: bool,
    /// Interval (in seconds) between background refreshes
    pub refresh_interval_secs: u64,
    /// Length of the courier and supplier leaderboards
    pub top_n: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        let layout = GridLayout::default();
        Self {
            default_view: ViewMode::Month,
            week_start: layout.week_start,
            first_hour: layout.first_hour,
            last_hour: layout.last_hour,
            month_visible: layout.month_visible,
            hour_visible: layout.hour_visible,
            drag_roles: vec!["admin".to_string(), "location".to_string()],
            operator_role: None,
            resync_on_success: true,
            refresh_interval_secs: 60,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl BoardSettings {
    pub fn grid_layout(&self) -> GridLayout {
        GridLayout {
            week_start: self.week_start,
            first_hour: self.first_hour,
            last_hour: self.last_hour,
            month_visible: self.month_visible,
            hour_visible: self.hour_visible,
        }
    }

    /// Whether an operator holding `role` may drag shipments.
    pub fn can_drag(&self, role: Option<&str>) -> bool {
        role.is_some_and(|r| self.drag_roles.iter().any(|allowed| allowed.eq_ignore_ascii_case(r)))
    }
}

/// Holds the configuration settings for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// The logging level (e.g., "info", "debug", "error")
    pub level: String,
    /// The name of the log file (optional)
    pub file: Option<String>,
    /// The directory path where log files will be stored (optional)
    pub path: Option<PathBuf>,
}

fn default_shipments_path() -> String {
    "/api/shipment/getAll".to_string()
}

fn default_reschedule_path() -> String {
    "/api/shipment/update-delivery-date".to_string()
}

/// # Settings Initialization
impl Settings {
    /// Loads and constructs the application settings from various configuration sources.
    ///
    /// This function reads configuration settings from the following sources, in order of precedence:
    ///
    /// 1. `default.yaml`: Contains default settings for the application
    /// 2. Environment-specific YAML file (e.g., `development.yaml` or `production.yaml`) based on the `RUN_MODE` environment variable
    /// 3. Environment variables prefixed with `APP` (e.g., `APP__BACKEND__BASE_URL`)
    ///
    /// The `CONFIG_DIR` environment variable can be used to specify the directory where the YAML configuration files are located (defaults to "src/config").
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)`: If the settings were loaded and constructed successfully
    /// * `Err(BoardError)`: If there was an error during the loading or construction process
    pub fn new() -> Result<Self, BoardError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "src/config".into());
        debug!("Run Mode: {:?}, Config Dir: {:?}", run_mode, config_dir);

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut s: Self = s.try_deserialize::<Settings>()
            .map_err(BoardError::from)?;

        if let Some(ref mut path) = s.logging.path {
            *path = env::current_dir()?.join(path.clone());
        }

        if s.board.first_hour > s.board.last_hour || s.board.last_hour > 23 {
            return Err(BoardError::ConfigError(format!(
                "invalid hour range {}..={}", s.board.first_hour, s.board.last_hour
            )));
        }

        Ok(s)
    }
}

/// Deserializes an optional secret string from configuration into a `Secret<String>`
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
    where
        D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.is_empty()).map(Secret::new))
}

impl fmt::Display for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackendSettings {{ base_url: {}, shipments_path: {}, reschedule_path: {}, api_token: {}, request_timeout_ms: {:?} }}",
            self.base_url,
            self.shipments_path,
            self.reschedule_path,
            if self.api_token.is_some() { "[REDACTED]" } else { "none" },
            self.request_timeout_ms
        )
    }
}
