use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::{bad_request, internal_error, ApiError, AppState, ErrorResponse};
use crate::services::tracking::{self, TrackingError};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackRequest {
    /// e.g. "W6 1706"
    pub flight_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    /// Normalized flight number
    pub flight_number: String,
    /// Boards the change was applied to
    pub boards: Vec<String>,
}

fn map_error(err: TrackingError) -> ApiError {
    match err {
        TrackingError::InvalidFlightNumber(_) => bad_request(err.to_string()),
        TrackingError::Persist(e) => internal_error(e),
    }
}

fn response(state: &AppState, flight_number: String) -> Json<TrackResponse> {
    Json(TrackResponse {
        flight_number,
        boards: state.boards.iter().map(|b| b.name.clone()).collect(),
    })
}

/// Start firing events for a flight on every board
#[utoipa::path(
    post,
    path = "/api/tracked",
    request_body = TrackRequest,
    responses(
        (status = 200, description = "Flight is tracked", body = TrackResponse),
        (status = 400, description = "Invalid flight number", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "tracked"
)]
pub async fn track_flight(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    let flight_number = tracking::track_flight(&state.boards, &state.store, &request.flight_number)
        .map_err(map_error)?;
    Ok(response(&state, flight_number))
}

/// Stop firing events for a flight on every board
#[utoipa::path(
    delete,
    path = "/api/tracked/{flight_number}",
    params(
        ("flight_number" = String, Path, description = "Flight number, e.g. W6 1706")
    ),
    responses(
        (status = 200, description = "Flight is no longer tracked", body = TrackResponse),
        (status = 400, description = "Invalid flight number", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "tracked"
)]
pub async fn untrack_flight(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
) -> Result<Json<TrackResponse>, ApiError> {
    let flight_number = tracking::untrack_flight(&state.boards, &state.store, &flight_number)
        .map_err(map_error)?;
    Ok(response(&state, flight_number))
}
