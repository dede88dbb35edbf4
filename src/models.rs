use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leg of a flight as seen from the airport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Arrival,
    Departure,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Arrival => "arrival",
            Direction::Departure => "departure",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pages a board polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DirectionSelection {
    Arrivals,
    Departures,
    #[default]
    Both,
}

impl DirectionSelection {
    pub fn includes(&self, direction: Direction) -> bool {
        match self {
            DirectionSelection::Arrivals => direction == Direction::Arrival,
            DirectionSelection::Departures => direction == Direction::Departure,
            DirectionSelection::Both => true,
        }
    }
}

/// Normalized operational state of a flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Landed,
    Departed,
    Expected,
    Delayed,
    Cancelled,
    Boarding,
    GateClosed,
    FinalCall,
    CheckIn,
    Gate,
    Unknown,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Landed => "landed",
            FlightStatus::Departed => "departed",
            FlightStatus::Expected => "expected",
            FlightStatus::Delayed => "delayed",
            FlightStatus::Cancelled => "cancelled",
            FlightStatus::Boarding => "boarding",
            FlightStatus::GateClosed => "gate_closed",
            FlightStatus::FinalCall => "final_call",
            FlightStatus::CheckIn => "check_in",
            FlightStatus::Gate => "gate",
            FlightStatus::Unknown => "unknown",
        }
    }

    /// Landed, departed or cancelled flights are no longer "upcoming"
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            FlightStatus::Landed | FlightStatus::Departed | FlightStatus::Cancelled
        )
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the flight board.
///
/// Exactly one of `origin` / `destination` is set, matching `direction`.
/// Use [`Flight::new`] to keep that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flight {
    /// Scheduled wall-clock time, "HH:MM"
    pub scheduled_time: String,
    pub expected_time: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub airline: String,
    /// e.g. "W6 1706"
    pub flight_number: String,
    pub status: FlightStatus,
    /// Derived from scheduled/expected time, not read from the page
    pub delay_minutes: Option<i64>,
    pub direction: Direction,
}

impl Flight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        scheduled_time: impl Into<String>,
        expected_time: Option<String>,
        location: impl Into<String>,
        airline: impl Into<String>,
        flight_number: impl Into<String>,
        status: FlightStatus,
        delay_minutes: Option<i64>,
    ) -> Self {
        let location = location.into();
        let (origin, destination) = match direction {
            Direction::Arrival => (Some(location), None),
            Direction::Departure => (None, Some(location)),
        };

        Flight {
            scheduled_time: scheduled_time.into(),
            expected_time,
            origin,
            destination,
            airline: airline.into(),
            flight_number: flight_number.into(),
            status,
            delay_minutes,
            direction,
        }
    }

    pub fn key(&self) -> FlightKey {
        FlightKey {
            flight_number: self.flight_number.clone(),
            scheduled_time: self.scheduled_time.clone(),
            direction: self.direction,
        }
    }

    /// Origin for arrivals, destination for departures
    pub fn location(&self) -> &str {
        self.destination
            .as_deref()
            .or(self.origin.as_deref())
            .unwrap_or("")
    }
}

/// Identity of a flight across polls: flight number + scheduled time + direction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlightKey {
    pub flight_number: String,
    pub scheduled_time: String,
    pub direction: Direction,
}

impl std::fmt::Display for FlightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.flight_number, self.scheduled_time, self.direction
        )
    }
}

/// Whether a snapshot came from the last poll or was served from cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Cache,
}

/// Result of one successful poll, as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoardSnapshot {
    pub arrivals: Vec<Flight>,
    pub departures: Vec<Flight>,
    pub next_arrival: Option<Flight>,
    pub next_departure: Option<Flight>,
    /// Local time of the last successful fetch
    pub last_updated: NaiveDateTime,
    pub data_source: DataSource,
    pub cache_age_seconds: i64,
    pub cache_age_minutes: i64,
}

impl BoardSnapshot {
    pub fn flights(&self, direction: Direction) -> &[Flight] {
        match direction {
            Direction::Arrival => &self.arrivals,
            Direction::Departure => &self.departures,
        }
    }

    pub fn next_flight(&self, direction: Direction) -> Option<&Flight> {
        match direction {
            Direction::Arrival => self.next_arrival.as_ref(),
            Direction::Departure => self.next_departure.as_ref(),
        }
    }
}
