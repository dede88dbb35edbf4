use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::models::DirectionSelection;
use crate::services::filter::FilterOptions;

pub const URL_ARRIVALS: &str = "https://www.airport.gdansk.pl/loty/tablica-przylotow-p1.html";
pub const URL_DEPARTURES: &str = "https://www.airport.gdansk.pl/loty/tablica-odlotow-p2.html";

pub const DEFAULT_SCAN_INTERVAL: u64 = 5;
pub const DEFAULT_MAX_FLIGHTS: usize = 20;
pub const DEFAULT_TIME_WINDOW: u32 = 24;
pub const DEFAULT_HIDE_LANDED: bool = false;
pub const DEFAULT_HIDE_CANCELLED: bool = true;

pub const MIN_SCAN_INTERVAL: u64 = 2;
pub const MAX_SCAN_INTERVAL: u64 = 60;
pub const MIN_MAX_FLIGHTS: usize = 5;
pub const MAX_MAX_FLIGHTS: usize = 50;
pub const MIN_TIME_WINDOW: u32 = 1;
pub const MAX_TIME_WINDOW: u32 = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub boards: Vec<BoardConfig>,
}

/// One independently polled flight board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    #[serde(default)]
    pub direction: DirectionSelection,
    /// Minutes between polls, 2-60
    #[serde(default = "default_scan_interval")]
    pub scan_interval_minutes: u64,
    #[serde(default = "default_arrivals_url")]
    pub arrivals_url: String,
    #[serde(default = "default_departures_url")]
    pub departures_url: String,
    #[serde(default)]
    pub options: BoardOptions,
}

/// User options of a board. List options are comma separated strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardOptions {
    pub max_flights: usize,
    pub time_window_hours: u32,
    pub hide_landed: bool,
    pub hide_cancelled: bool,
    pub airlines_filter: String,
    pub destinations_filter: String,
    pub events_enabled: bool,
    pub events_all_flights: bool,
    pub tracked_flights: String,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            max_flights: DEFAULT_MAX_FLIGHTS,
            time_window_hours: DEFAULT_TIME_WINDOW,
            hide_landed: DEFAULT_HIDE_LANDED,
            hide_cancelled: DEFAULT_HIDE_CANCELLED,
            airlines_filter: String::new(),
            destinations_filter: String::new(),
            events_enabled: false,
            events_all_flights: false,
            tracked_flights: String::new(),
        }
    }
}

impl BoardOptions {
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            hide_landed: self.hide_landed,
            hide_cancelled: self.hide_cancelled,
            airlines: split_list(&self.airlines_filter)
                .map(|a| a.to_uppercase())
                .collect(),
            destinations: split_list(&self.destinations_filter)
                .map(|d| d.to_lowercase())
                .collect(),
            time_window_hours: self.time_window_hours,
            max_flights: self.max_flights,
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL
}

fn default_arrivals_url() -> String {
    URL_ARRIVALS.to_string()
}

fn default_departures_url() -> String {
    URL_DEPARTURES.to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for board in &self.boards {
            if board.name.trim().is_empty() {
                return Err(ConfigError::Invalid("board name must not be empty".to_string()));
            }
            if !names.insert(board.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate board name {:?}", board.name)));
            }
            check_range(
                &board.name,
                "scan_interval_minutes",
                board.scan_interval_minutes,
                MIN_SCAN_INTERVAL,
                MAX_SCAN_INTERVAL,
            )?;
            check_range(
                &board.name,
                "max_flights",
                board.options.max_flights,
                MIN_MAX_FLIGHTS,
                MAX_MAX_FLIGHTS,
            )?;
            check_range(
                &board.name,
                "time_window_hours",
                board.options.time_window_hours,
                MIN_TIME_WINDOW,
                MAX_TIME_WINDOW,
            )?;
        }
        Ok(())
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(
    board: &str,
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid(format!(
            "{board}: {field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Loaded configuration plus where to write it back
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: Mutex<Config>,
}

impl ConfigStore {
    pub fn new(config: Config, path: Option<PathBuf>) -> Self {
        Self {
            path,
            config: Mutex::new(config),
        }
    }

    pub fn config(&self) -> Config {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store a board's tracked flights option and write the file, if any
    pub fn set_tracked_flights(&self, board: &str, tracked: String) -> Result<(), ConfigError> {
        self.set_tracked_flights_many(&[(board, tracked)])
    }

    /// Store several boards' tracked flights options in one write.
    ///
    /// Nothing changes, in memory or on disk, unless every board exists and
    /// the file was written.
    pub fn set_tracked_flights_many(&self, updates: &[(&str, String)]) -> Result<(), ConfigError> {
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = config.clone();

        for (board, tracked) in updates {
            let entry = updated
                .boards
                .iter_mut()
                .find(|b| b.name == *board)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown board {board:?}")))?;
            entry.options.tracked_flights = tracked.clone();
        }

        if let Some(path) = &self.path {
            updated.save(path)?;
        }
        *config = updated;
        Ok(())
    }
}
