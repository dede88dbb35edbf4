use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::{unavailable, ApiError, AppState, ErrorResponse};
use crate::models::{BoardSnapshot, DataSource, DirectionSelection};
use crate::services::events::FlightEvent;
use crate::services::sensors::{self, SensorReading};

#[derive(Debug, Serialize, ToSchema)]
pub struct BoardSummary {
    pub name: String,
    pub direction: DirectionSelection,
    pub available: bool,
    pub data_source: Option<DataSource>,
    pub arrivals: usize,
    pub departures: usize,
    pub tracked_flights: Vec<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BoardListResponse {
    pub boards: Vec<BoardSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorListResponse {
    pub board: String,
    pub sensors: Vec<SensorReading>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    pub board: String,
    /// Oldest first
    pub events: Vec<FlightEvent>,
}

/// List all configured boards
#[utoipa::path(
    get,
    path = "/api/boards",
    responses(
        (status = 200, description = "List of all boards", body = BoardListResponse)
    ),
    tag = "boards"
)]
pub async fn list_boards(State(state): State<AppState>) -> Json<BoardListResponse> {
    let mut boards = Vec::with_capacity(state.boards.len());

    for handle in state.boards.iter() {
        let board = handle.state.read().await;
        let snapshot = board.snapshot.as_ref();
        boards.push(BoardSummary {
            name: handle.name.clone(),
            direction: handle.direction,
            available: board.last_update_success && snapshot.is_some(),
            data_source: snapshot.map(|s| s.data_source),
            arrivals: snapshot.map_or(0, |s| s.arrivals.len()),
            departures: snapshot.map_or(0, |s| s.departures.len()),
            tracked_flights: handle.tracked.to_vec(),
            last_error: board.last_error.clone(),
        });
    }

    Json(BoardListResponse { boards })
}

/// Get the current snapshot of a board
#[utoipa::path(
    get,
    path = "/api/boards/{name}",
    params(
        ("name" = String, Path, description = "Board name")
    ),
    responses(
        (status = 200, description = "Current flights", body = BoardSnapshot),
        (status = 404, description = "Board not found", body = ErrorResponse),
        (status = 503, description = "No data fetched yet", body = ErrorResponse)
    ),
    tag = "boards"
)]
pub async fn get_board(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<BoardSnapshot>, ApiError> {
    let handle = state.board(&name)?;
    let board = handle.state.read().await;

    board
        .snapshot
        .clone()
        .map(Json)
        .ok_or_else(|| unavailable(format!("No flight data for board {name:?} yet")))
}

/// Get the sensor readings of a board
#[utoipa::path(
    get,
    path = "/api/boards/{name}/sensors",
    params(
        ("name" = String, Path, description = "Board name")
    ),
    responses(
        (
            status = 200,
            description = "Sensors for the board's directions",
            body = SensorListResponse
        ),
        (status = 404, description = "Board not found", body = ErrorResponse)
    ),
    tag = "boards"
)]
pub async fn get_sensors(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SensorListResponse>, ApiError> {
    let handle = state.board(&name)?;
    let board = handle.state.read().await;

    Ok(Json(SensorListResponse {
        board: handle.name.clone(),
        sensors: sensors::readings(
            handle.direction,
            board.snapshot.as_ref(),
            board.last_update_success,
        ),
    }))
}

/// Get the most recent events fired by a board
#[utoipa::path(
    get,
    path = "/api/boards/{name}/events",
    params(
        ("name" = String, Path, description = "Board name")
    ),
    responses(
        (status = 200, description = "Recent events", body = EventListResponse),
        (status = 404, description = "Board not found", body = ErrorResponse)
    ),
    tag = "boards"
)]
pub async fn get_events(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<EventListResponse>, ApiError> {
    let handle = state.board(&name)?;

    Ok(Json(EventListResponse {
        board: handle.name.clone(),
        events: handle.events.recent(),
    }))
}
