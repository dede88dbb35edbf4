use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn respond(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Helper to log error and return generic internal server error
pub fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    error!("Internal error: {}", err);
    respond(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    respond(StatusCode::NOT_FOUND, message)
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    respond(StatusCode::BAD_REQUEST, message)
}

pub fn unavailable(message: impl Into<String>) -> ApiError {
    respond(StatusCode::SERVICE_UNAVAILABLE, message)
}
