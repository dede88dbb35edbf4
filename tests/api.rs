// tests/api.rs
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use gdansk_flightboard::api::{self, AppState};
use gdansk_flightboard::config::{Config, ConfigStore};
use gdansk_flightboard::models::{
    BoardSnapshot, DataSource, Direction, DirectionSelection, Flight, FlightStatus,
};
use gdansk_flightboard::services::tracking::TrackedFlights;
use gdansk_flightboard::sync::{BoardHandle, PollOutcome};

const CONFIG: &str = r#"
boards:
  - name: arrivals
    direction: arrivals
  - name: departures
    direction: departures
    options:
      tracked_flights: "LO 3827"
"#;

struct Fixture {
    app: Router,
    boards: Vec<Arc<BoardHandle>>,
    path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    let config = Config::from_yaml(CONFIG).unwrap();
    config.save(&path).unwrap();

    let boards: Vec<Arc<BoardHandle>> = config
        .boards
        .iter()
        .map(|b| {
            Arc::new(BoardHandle::new(
                &b.name,
                b.direction,
                TrackedFlights::from_option(&b.options.tracked_flights),
            ))
        })
        .collect();

    let store = Arc::new(ConfigStore::new(config, Some(path.clone())));
    let app = api::app(AppState::new(boards.clone(), store));

    Fixture {
        app,
        boards,
        path,
        _dir: dir,
    }
}

fn snapshot() -> BoardSnapshot {
    let flight = Flight::new(
        Direction::Arrival,
        "10:00",
        Some("10:20".to_string()),
        "Barcelona",
        "WIZZ AIR",
        "W6 1706",
        FlightStatus::Delayed,
        Some(20),
    );
    BoardSnapshot {
        arrivals: vec![flight.clone()],
        departures: Vec::new(),
        next_arrival: Some(flight),
        next_departure: None,
        last_updated: NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
        data_source: DataSource::Live,
        cache_age_seconds: 0,
        cache_age_minutes: 0,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn lists_boards() {
    let fx = fixture();
    let (status, json) = send(&fx.app, "GET", "/api/boards", None).await;

    assert_eq!(status, StatusCode::OK);
    let boards = json["boards"].as_array().unwrap();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0]["name"], "arrivals");
    assert_eq!(boards[0]["available"], false);
    assert_eq!(boards[1]["tracked_flights"][0], "LO 3827");
}

#[tokio::test]
async fn board_without_data_is_unavailable() {
    let fx = fixture();
    let (status, _) = send(&fx.app, "GET", "/api/boards/arrivals", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, json) = send(&fx.app, "GET", "/api/boards/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn serves_published_snapshot_and_sensors() {
    let fx = fixture();
    fx.boards[0].publish(Ok(PollOutcome::Live(snapshot()))).await;

    let (status, json) = send(&fx.app, "GET", "/api/boards/arrivals", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["arrivals"][0]["flight_number"], "W6 1706");
    assert_eq!(json["data_source"], "live");

    let (status, json) = send(&fx.app, "GET", "/api/boards/arrivals/sensors", None).await;
    assert_eq!(status, StatusCode::OK);
    let sensors = json["sensors"].as_array().unwrap();
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0]["key"], "arrivals");
    assert_eq!(sensors[0]["value"], 1);
    assert_eq!(sensors[0]["available"], true);
    assert_eq!(sensors[1]["key"], "next_arrival");
    assert_eq!(sensors[1]["value"], "10:00");
    assert_eq!(sensors[1]["attributes"]["delay_minutes"], 20);

    let (status, json) = send(&fx.app, "GET", "/api/boards/arrivals/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn track_and_untrack_update_every_board_and_the_file() {
    let fx = fixture();

    let body = serde_json::json!({ "flight_number": " w6 1706 " });
    let (status, json) = send(&fx.app, "POST", "/api/tracked", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["flight_number"], "W6 1706");
    assert!(fx.boards.iter().all(|b| b.tracked.contains("W6 1706")));

    let saved = Config::load(&fx.path).unwrap();
    assert_eq!(saved.boards[0].options.tracked_flights, "W6 1706");
    assert_eq!(saved.boards[1].options.tracked_flights, "LO 3827, W6 1706");

    let (status, _) = send(&fx.app, "DELETE", "/api/tracked/W6%201706", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!fx.boards[1].tracked.contains("W6 1706"));

    let saved = Config::load(&fx.path).unwrap();
    assert_eq!(saved.boards[0].options.tracked_flights, "");
    assert_eq!(saved.boards[1].options.tracked_flights, "LO 3827");
}

#[tokio::test]
async fn invalid_flight_number_is_rejected_without_changes() {
    let fx = fixture();

    let body = serde_json::json!({ "flight_number": "not a flight" });
    let (status, json) = send(&fx.app, "POST", "/api/tracked", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("not a flight"));

    assert!(fx.boards[0].tracked.to_vec().is_empty());
    assert_eq!(fx.boards[1].tracked.to_vec(), ["LO 3827"]);
}

#[tokio::test]
async fn serves_openapi_document() {
    let fx = fixture();
    let (status, json) = send(&fx.app, "GET", "/api/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/boards/{name}"].is_object());
    assert!(json["paths"]["/api/tracked"]["post"].is_object());
}

#[tokio::test]
async fn direction_selection_limits_sensors() {
    let fx = fixture();
    assert_eq!(fx.boards[1].direction, DirectionSelection::Departures);

    let (_, json) = send(&fx.app, "GET", "/api/boards/departures/sensors", None).await;
    let keys: Vec<&str> = json["sensors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, ["departures", "next_departure"]);
}
