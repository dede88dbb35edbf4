use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{info, warn};

use crate::config::{ConfigError, ConfigStore};
use crate::sync::BoardHandle;

fn flight_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z0-9]{2}\s?[0-9]{1,4}[A-Z]?$").expect("flight number pattern is valid")
    })
}

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Invalid flight number: {0:?}")]
    InvalidFlightNumber(String),
    #[error("Failed to persist tracked flights: {0}")]
    Persist(#[from] ConfigError),
}

/// Flight numbers a board fires events for, kept uppercase and sorted.
///
/// Each board owns its own set; clones share it.
#[derive(Debug, Clone, Default)]
pub struct TrackedFlights {
    flights: Arc<RwLock<BTreeSet<String>>>,
}

impl TrackedFlights {
    /// Build from a comma separated option value, e.g. "W6 1706, lo3827"
    pub fn from_option(value: &str) -> Self {
        let flights = value
            .split(',')
            .map(|f| f.trim().to_uppercase())
            .filter(|f| !f.is_empty())
            .collect();
        Self {
            flights: Arc::new(RwLock::new(flights)),
        }
    }

    pub fn contains(&self, flight_number: &str) -> bool {
        self.read().contains(&flight_number.to_uppercase())
    }

    /// Returns false if the flight was already tracked
    pub fn insert(&self, flight_number: String) -> bool {
        self.write().insert(flight_number)
    }

    /// Returns false if the flight was not tracked
    pub fn remove(&self, flight_number: &str) -> bool {
        self.write().remove(flight_number)
    }

    /// Copy of the current set
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.read().clone()
    }

    /// Swap in a whole new set
    pub fn replace(&self, flights: BTreeSet<String>) {
        *self.write() = flights;
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.read().iter().cloned().collect()
    }

    /// The set as stored in configuration: sorted and ", " separated
    pub fn to_option(&self) -> String {
        join(&self.read())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeSet<String>> {
        self.flights.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeSet<String>> {
        self.flights.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Trim and uppercase a flight number and check it looks like one
/// ("W6 1706", "LO3827", "FR 12A")
pub fn validate_flight_number(input: &str) -> Result<String, TrackingError> {
    let normalized = input.trim().to_uppercase();
    if flight_number_pattern().is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(TrackingError::InvalidFlightNumber(input.to_string()))
    }
}

/// Start tracking a flight on every board and persist the new sets
pub fn track_flight(
    boards: &[Arc<BoardHandle>],
    store: &ConfigStore,
    input: &str,
) -> Result<String, TrackingError> {
    let flight_number = validate_flight_number(input)?;
    update_boards(boards, store, &flight_number, |set| {
        set.insert(flight_number.clone());
    })?;
    info!(flight_number = %flight_number, boards = boards.len(), "Added flight to tracking");
    Ok(flight_number)
}

/// Stop tracking a flight on every board and persist the new sets
pub fn untrack_flight(
    boards: &[Arc<BoardHandle>],
    store: &ConfigStore,
    input: &str,
) -> Result<String, TrackingError> {
    let flight_number = validate_flight_number(input)?;
    update_boards(boards, store, &flight_number, |set| {
        set.remove(&flight_number);
    })?;
    info!(flight_number = %flight_number, boards = boards.len(), "Removed flight from tracking");
    Ok(flight_number)
}

/// Compute every board's new set, persist them in one write, then apply them.
/// A failed write leaves all boards as they were.
fn update_boards(
    boards: &[Arc<BoardHandle>],
    store: &ConfigStore,
    flight_number: &str,
    change: impl Fn(&mut BTreeSet<String>),
) -> Result<(), TrackingError> {
    if boards.is_empty() {
        warn!(flight_number, "No flight boards configured");
        return Ok(());
    }

    let updated: Vec<BTreeSet<String>> = boards
        .iter()
        .map(|board| {
            let mut set = board.tracked.snapshot();
            change(&mut set);
            set
        })
        .collect();

    let options: Vec<(&str, String)> = boards
        .iter()
        .zip(&updated)
        .map(|(board, set)| (board.name.as_str(), join(set)))
        .collect();
    store.set_tracked_flights_many(&options)?;

    for (board, set) in boards.iter().zip(updated) {
        board.tracked.replace(set);
    }
    Ok(())
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
