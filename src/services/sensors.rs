use serde::Serialize;
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use crate::models::{BoardSnapshot, Direction, DirectionSelection};

/// Sensors a board exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Number of shown arrivals
    Arrivals,
    /// Number of shown departures
    Departures,
    /// Scheduled time of the next arrival
    NextArrival,
    /// Scheduled time of the next departure
    NextDeparture,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Arrivals,
        SensorKind::Departures,
        SensorKind::NextArrival,
        SensorKind::NextDeparture,
    ];

    fn direction(&self) -> Direction {
        match self {
            SensorKind::Arrivals | SensorKind::NextArrival => Direction::Arrival,
            SensorKind::Departures | SensorKind::NextDeparture => Direction::Departure,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::Arrivals => "arrivals",
            SensorKind::Departures => "departures",
            SensorKind::NextArrival => "next_arrival",
            SensorKind::NextDeparture => "next_departure",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKind::Arrivals | SensorKind::Departures => Some("flights"),
            SensorKind::NextArrival | SensorKind::NextDeparture => None,
        }
    }

    pub fn applies_to(&self, selection: DirectionSelection) -> bool {
        selection.includes(self.direction())
    }

    pub fn value(&self, snapshot: &BoardSnapshot) -> Value {
        let direction = self.direction();
        match self {
            SensorKind::Arrivals | SensorKind::Departures => {
                json!(snapshot.flights(direction).len())
            }
            SensorKind::NextArrival | SensorKind::NextDeparture => snapshot
                .next_flight(direction)
                .map(|f| Value::String(f.scheduled_time.clone()))
                .unwrap_or(Value::Null),
        }
    }

    pub fn attributes(&self, snapshot: &BoardSnapshot) -> Map<String, Value> {
        let direction = self.direction();
        match self {
            SensorKind::Arrivals | SensorKind::Departures => {
                let mut attrs = Map::new();
                attrs.insert("flights".into(), json!(snapshot.flights(direction)));
                attrs.insert(
                    "last_updated".into(),
                    json!(snapshot.last_updated.format("%Y-%m-%dT%H:%M:%S").to_string()),
                );
                attrs.insert("next_flight".into(), json!(snapshot.next_flight(direction)));
                attrs.insert("data_source".into(), json!(snapshot.data_source));
                attrs.insert("cache_age_seconds".into(), json!(snapshot.cache_age_seconds));
                attrs.insert("cache_age_minutes".into(), json!(snapshot.cache_age_minutes));
                attrs
            }
            SensorKind::NextArrival | SensorKind::NextDeparture => {
                match snapshot.next_flight(direction).map(serde_json::to_value) {
                    Some(Ok(Value::Object(map))) => map,
                    _ => Map::new(),
                }
            }
        }
    }
}

/// Current state of one sensor
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub key: String,
    pub available: bool,
    #[schema(value_type = Object)]
    pub value: Value,
    pub unit: Option<String>,
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
}

/// Readings of every sensor that applies to `selection`.
///
/// Without a snapshot all sensors read unavailable with null values.
pub fn readings(
    selection: DirectionSelection,
    snapshot: Option<&BoardSnapshot>,
    last_update_success: bool,
) -> Vec<SensorReading> {
    SensorKind::ALL
        .iter()
        .filter(|kind| kind.applies_to(selection))
        .map(|kind| SensorReading {
            kind: *kind,
            key: kind.key().to_string(),
            available: last_update_success && snapshot.is_some(),
            value: snapshot.map(|s| kind.value(s)).unwrap_or(Value::Null),
            unit: kind.unit().map(str::to_string),
            attributes: snapshot.map(|s| kind.attributes(s)).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataSource, Flight, FlightStatus};
    use chrono::NaiveDate;

    fn snapshot() -> BoardSnapshot {
        let arrival = Flight::new(
            Direction::Arrival,
            "10:00",
            None,
            "Barcelona",
            "WIZZ AIR",
            "W6 1706",
            FlightStatus::Expected,
            None,
        );
        BoardSnapshot {
            arrivals: vec![arrival.clone()],
            departures: Vec::new(),
            next_arrival: Some(arrival),
            next_departure: None,
            last_updated: NaiveDate::from_ymd_opt(2026, 3, 14)
                .unwrap()
                .and_hms_opt(9, 55, 0)
                .unwrap(),
            data_source: DataSource::Live,
            cache_age_seconds: 0,
            cache_age_minutes: 0,
        }
    }

    #[test]
    fn sensors_follow_direction_selection() {
        let arrivals: Vec<SensorKind> = SensorKind::ALL
            .into_iter()
            .filter(|k| k.applies_to(DirectionSelection::Arrivals))
            .collect();
        assert_eq!(arrivals, [SensorKind::Arrivals, SensorKind::NextArrival]);
        assert!(SensorKind::ALL
            .iter()
            .all(|k| k.applies_to(DirectionSelection::Both)));
    }

    #[test]
    fn count_sensor_values_and_attributes() {
        let snap = snapshot();
        assert_eq!(SensorKind::Arrivals.value(&snap), json!(1));
        assert_eq!(SensorKind::Departures.value(&snap), json!(0));

        let attrs = SensorKind::Arrivals.attributes(&snap);
        assert_eq!(attrs["flights"][0]["flight_number"], "W6 1706");
        assert_eq!(attrs["last_updated"], "2026-03-14T09:55:00");
        assert_eq!(attrs["data_source"], "live");
        assert_eq!(attrs["next_flight"]["origin"], "Barcelona");
        assert!(SensorKind::Departures.attributes(&snap)["next_flight"].is_null());
    }

    #[test]
    fn next_flight_sensor() {
        let snap = snapshot();
        assert_eq!(SensorKind::NextArrival.value(&snap), json!("10:00"));
        assert_eq!(SensorKind::NextArrival.attributes(&snap)["airline"], "WIZZ AIR");
        assert_eq!(SensorKind::NextDeparture.value(&snap), Value::Null);
        assert!(SensorKind::NextDeparture.attributes(&snap).is_empty());
    }

    #[test]
    fn readings_without_data_are_unavailable() {
        let out = readings(DirectionSelection::Departures, None, false);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| !r.available && r.value.is_null()));

        let snap = snapshot();
        let out = readings(DirectionSelection::Both, Some(&snap), true);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|r| r.available));
        assert_eq!(out[0].unit.as_deref(), Some("flights"));
    }
}
