pub mod boards;
pub mod error;
pub mod tracked;

pub use error::{bad_request, internal_error, not_found, unavailable, ApiError, ErrorResponse};

use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::ConfigStore;
use crate::sync::BoardHandle;

#[derive(OpenApi)]
#[openapi(
    info(title = "Gdańsk Airport flight board API"),
    tags(
        (name = "boards", description = "Flight boards, sensors and events"),
        (name = "tracked", description = "Flights that fire events")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<Vec<Arc<BoardHandle>>>,
    pub store: Arc<ConfigStore>,
}

impl AppState {
    pub fn new(boards: Vec<Arc<BoardHandle>>, store: Arc<ConfigStore>) -> Self {
        Self {
            boards: Arc::new(boards),
            store,
        }
    }

    pub fn board(&self, name: &str) -> Result<&Arc<BoardHandle>, ApiError> {
        self.boards
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| not_found(format!("Board {name:?} not found")))
    }
}

/// Full application with CORS, request tracing and the OpenAPI document
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(boards::list::list_boards))
        .routes(routes!(boards::list::get_board))
        .routes(routes!(boards::list::get_sensors))
        .routes(routes!(boards::list::get_events))
        .routes(routes!(tracked::update::track_flight))
        .routes(routes!(tracked::update::untrack_flight))
        .with_state(state)
        .split_for_parts();

    router
        .route(
            "/api/openapi.json",
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
