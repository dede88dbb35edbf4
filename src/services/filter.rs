use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;
use tracing::debug;

use crate::models::{Flight, FlightStatus};
use crate::services::time::parse_clock;

/// Flights scheduled more than this far in the past are read as tomorrow's
const ROLLOVER_HOURS: i64 = 12;

/// Which flights a board shows
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub hide_landed: bool,
    pub hide_cancelled: bool,
    /// Uppercase airline names; empty means any airline
    pub airlines: HashSet<String>,
    /// Lowercase substrings of origin/destination; empty means anywhere
    pub destinations: Vec<String>,
    pub time_window_hours: u32,
    pub max_flights: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            hide_landed: false,
            hide_cancelled: true,
            airlines: HashSet::new(),
            destinations: Vec::new(),
            time_window_hours: 24,
            max_flights: 20,
        }
    }
}

/// Apply `options` to `flights`, sorted by scheduled time and capped at
/// `max_flights`. `now` is the local wall-clock time.
pub fn filter(flights: &[Flight], options: &FilterOptions, now: NaiveDateTime) -> Vec<Flight> {
    let mut filtered: Vec<Flight> = flights
        .iter()
        .filter(|flight| keep(flight, options, now))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
    filtered.truncate(options.max_flights);
    filtered
}

fn keep(flight: &Flight, options: &FilterOptions, now: NaiveDateTime) -> bool {
    if options.hide_landed
        && matches!(flight.status, FlightStatus::Landed | FlightStatus::Departed)
    {
        return false;
    }

    if options.hide_cancelled && flight.status == FlightStatus::Cancelled {
        return false;
    }

    if !options.airlines.is_empty() && !options.airlines.contains(&flight.airline.to_uppercase()) {
        return false;
    }

    if !options.destinations.is_empty() {
        let location = flight.location().to_lowercase();
        if !options.destinations.iter().any(|d| location.contains(d.as_str())) {
            return false;
        }
    }

    within_window(flight, options.time_window_hours, now)
}

fn within_window(flight: &Flight, window_hours: u32, now: NaiveDateTime) -> bool {
    let Some(scheduled) = parse_clock(&flight.scheduled_time) else {
        debug!(
            flight_number = %flight.flight_number,
            scheduled_time = %flight.scheduled_time,
            "Could not filter by time for flight"
        );
        return true;
    };

    let mut flight_time = now.date().and_time(scheduled);
    if flight_time < now - Duration::hours(ROLLOVER_HOURS) {
        flight_time += Duration::days(1);
    }

    let diff = (flight_time - now).num_seconds().abs();
    diff <= i64::from(window_hours) * 3600
}

/// Earliest flight that has not landed, departed or been cancelled,
/// ordered by expected time where known
pub fn next_flight(flights: &[Flight]) -> Option<Flight> {
    flights
        .iter()
        .filter(|f| !f.status.is_finished())
        .min_by(|a, b| {
            let a_time = a.expected_time.as_deref().unwrap_or(&a.scheduled_time);
            let b_time = b.expected_time.as_deref().unwrap_or(&b.scheduled_time);
            a_time.cmp(b_time)
        })
        .cloned()
}
