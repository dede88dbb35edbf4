use std::collections::HashMap;

use crate::models::{Flight, FlightKey, FlightStatus};

/// A status and/or delay change observed for one flight between two polls
#[derive(Debug, Clone, PartialEq)]
pub struct FlightStateChange {
    pub flight: Flight,
    pub old_status: FlightStatus,
    pub new_status: FlightStatus,
    pub delay_changed: bool,
    pub old_delay: Option<i64>,
    pub new_delay: Option<i64>,
}

impl FlightStateChange {
    pub fn status_changed(&self) -> bool {
        self.old_status != self.new_status
    }
}

/// Remembers (status, delay) per flight from the previous poll
#[derive(Debug, Default)]
pub struct StateTracker {
    states: HashMap<FlightKey, (FlightStatus, Option<i64>)>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flights remembered from the last poll
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Compare `flights` with the previous poll and remember them for the next.
    ///
    /// First sightings produce no change. Flights missing from `flights` are
    /// forgotten without a change.
    pub fn detect_changes(&mut self, flights: &[Flight]) -> Vec<FlightStateChange> {
        let mut changes = Vec::new();
        let mut new_states = HashMap::with_capacity(flights.len());

        for flight in flights {
            let key = flight.key();

            if let Some(&(old_status, old_delay)) = self.states.get(&key) {
                let delay_changed = old_delay != flight.delay_minutes;
                if old_status != flight.status || delay_changed {
                    changes.push(FlightStateChange {
                        flight: flight.clone(),
                        old_status,
                        new_status: flight.status,
                        delay_changed,
                        old_delay,
                        new_delay: flight.delay_minutes,
                    });
                }
            }

            new_states.insert(key, (flight.status, flight.delay_minutes));
        }

        self.states = new_states;
        changes
    }
}
