use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;
use utoipa::ToSchema;

use crate::models::{Direction, Flight, FlightStatus};

pub const EVENT_FLIGHT_LANDED: &str = "gdansk_airport_flight_landed";
pub const EVENT_FLIGHT_DEPARTED: &str = "gdansk_airport_flight_departed";
pub const EVENT_FLIGHT_CANCELLED: &str = "gdansk_airport_flight_cancelled";
pub const EVENT_FLIGHT_BOARDING: &str = "gdansk_airport_flight_boarding";
pub const EVENT_FLIGHT_GATE_CLOSED: &str = "gdansk_airport_flight_gate_closed";
pub const EVENT_FLIGHT_FINAL_CALL: &str = "gdansk_airport_flight_final_call";
pub const EVENT_FLIGHT_STATUS_CHANGED: &str = "gdansk_airport_flight_status_changed";

/// Kinds of flight events the board emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Landed,
    Departed,
    Cancelled,
    Boarding,
    GateClosed,
    FinalCall,
    StatusChanged,
}

impl EventKind {
    /// Status-specific event for a new status, if that status has one
    pub fn for_status(status: FlightStatus) -> Option<Self> {
        match status {
            FlightStatus::Landed => Some(EventKind::Landed),
            FlightStatus::Departed => Some(EventKind::Departed),
            FlightStatus::Cancelled => Some(EventKind::Cancelled),
            FlightStatus::Boarding => Some(EventKind::Boarding),
            FlightStatus::GateClosed => Some(EventKind::GateClosed),
            FlightStatus::FinalCall => Some(EventKind::FinalCall),
            FlightStatus::Delayed
            | FlightStatus::Expected
            | FlightStatus::CheckIn
            | FlightStatus::Gate
            | FlightStatus::Unknown => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::Landed => EVENT_FLIGHT_LANDED,
            EventKind::Departed => EVENT_FLIGHT_DEPARTED,
            EventKind::Cancelled => EVENT_FLIGHT_CANCELLED,
            EventKind::Boarding => EVENT_FLIGHT_BOARDING,
            EventKind::GateClosed => EVENT_FLIGHT_GATE_CLOSED,
            EventKind::FinalCall => EVENT_FLIGHT_FINAL_CALL,
            EventKind::StatusChanged => EVENT_FLIGHT_STATUS_CHANGED,
        }
    }
}

/// Event data; optional fields are left out when the flight has no value
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EventPayload {
    pub flight_number: String,
    pub airline: String,
    pub scheduled_time: String,
    pub status: FlightStatus,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<FlightStatus>,
}

impl EventPayload {
    pub fn new(flight: &Flight, old_status: Option<FlightStatus>) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Self {
            flight_number: flight.flight_number.clone(),
            airline: flight.airline.clone(),
            scheduled_time: flight.scheduled_time.clone(),
            status: flight.status,
            direction: flight.direction,
            expected_time: non_empty(&flight.expected_time),
            delay_minutes: flight.delay_minutes,
            origin: non_empty(&flight.origin),
            destination: non_empty(&flight.destination),
            old_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FlightEvent {
    pub kind: EventKind,
    pub event_type: String,
    pub data: EventPayload,
}

impl FlightEvent {
    pub fn new(kind: EventKind, flight: &Flight, old_status: Option<FlightStatus>) -> Self {
        Self {
            kind,
            event_type: kind.event_type().to_string(),
            data: EventPayload::new(flight, old_status),
        }
    }
}

/// Receiver of emitted flight events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: FlightEvent);
}

/// Logs every event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: FlightEvent) {
        info!(
            event_type = %event.event_type,
            flight_number = %event.data.flight_number,
            status = %event.data.status,
            "Fired event"
        );
    }
}

/// Bounded buffer of the most recent events, oldest first
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Arc<Mutex<VecDeque<FlightEvent>>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn recent(&self) -> Vec<FlightEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().cloned().collect()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: FlightEvent) {
        TracingEventSink.emit(event.clone());

        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> Flight {
        Flight::new(
            Direction::Arrival,
            "10:00",
            Some("10:30".to_string()),
            "Barcelona",
            "WIZZ AIR",
            "W6 1706",
            FlightStatus::Landed,
            Some(30),
        )
    }

    #[test]
    fn status_mapping() {
        assert_eq!(EventKind::for_status(FlightStatus::Landed), Some(EventKind::Landed));
        assert_eq!(EventKind::for_status(FlightStatus::FinalCall), Some(EventKind::FinalCall));
        assert_eq!(EventKind::for_status(FlightStatus::Delayed), None);
        assert_eq!(EventKind::for_status(FlightStatus::CheckIn), None);
        assert_eq!(EventKind::for_status(FlightStatus::Unknown), None);
    }

    #[test]
    fn payload_skips_absent_fields() {
        let event = FlightEvent::new(EventKind::Landed, &flight(), None);
        let json = serde_json::to_value(&event).unwrap();
        let data = json["data"].as_object().unwrap();

        assert_eq!(json["event_type"], EVENT_FLIGHT_LANDED);
        assert_eq!(data["origin"], "Barcelona");
        assert_eq!(data["delay_minutes"], 30);
        assert!(!data.contains_key("destination"));
        assert!(!data.contains_key("old_status"));
    }

    #[test]
    fn payload_carries_old_status() {
        let event = FlightEvent::new(
            EventKind::StatusChanged,
            &flight(),
            Some(FlightStatus::Expected),
        );
        assert_eq!(event.data.old_status, Some(FlightStatus::Expected));
        assert_eq!(event.event_type, EVENT_FLIGHT_STATUS_CHANGED);
    }

    #[test]
    fn log_keeps_most_recent() {
        let log = EventLog::new(2);
        for status in [FlightStatus::Boarding, FlightStatus::GateClosed, FlightStatus::Departed] {
            log.emit(FlightEvent::new(EventKind::StatusChanged, &flight(), Some(status)));
        }

        let recent = log.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].data.old_status, Some(FlightStatus::GateClosed));
        assert_eq!(recent[1].data.old_status, Some(FlightStatus::Departed));
    }
}
