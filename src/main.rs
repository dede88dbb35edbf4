use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gdansk_flightboard::api::{self, AppState};
use gdansk_flightboard::config::{BoardConfig, Config, ConfigStore};
use gdansk_flightboard::providers::airport::AirportClient;
use gdansk_flightboard::services::tracking::TrackedFlights;
use gdansk_flightboard::sync::{self, BoardHandle, CoordinatorSettings, UpdateCoordinator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gdansk_flightboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = PathBuf::from(
        std::env::var("FLIGHTBOARD_CONFIG").unwrap_or_else(|_| "config.yaml".to_string()),
    );
    info!(path = %config_path.display(), "Loading configuration");
    let config = Config::load(&config_path)?;
    info!(boards = config.boards.len(), "Loaded configuration");

    let mut boards = Vec::with_capacity(config.boards.len());
    for board in &config.boards {
        let handle = start_board(board)?;
        boards.push(handle);
    }

    let bind_address = config.bind_address.clone();
    let store = Arc::new(ConfigStore::new(config, Some(config_path)));
    let app = api::app(AppState::new(boards, store));

    info!(address = %bind_address, "Starting flight board API server");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the coordinator of one board and spawn its sync loop
fn start_board(board: &BoardConfig) -> Result<Arc<BoardHandle>, reqwest::Error> {
    let client = AirportClient::new(&board.arrivals_url, &board.departures_url)?;
    let tracked = TrackedFlights::from_option(&board.options.tracked_flights);
    let handle = Arc::new(BoardHandle::new(&board.name, board.direction, tracked.clone()));

    let settings = CoordinatorSettings {
        selection: board.direction,
        filter: board.options.filter_options(),
        events_enabled: board.options.events_enabled,
        events_all_flights: board.options.events_all_flights,
    };
    let coordinator = UpdateCoordinator::new(
        &board.name,
        client,
        settings,
        tracked,
        Arc::new(handle.events.clone()),
    );

    let interval = Duration::from_secs(board.scan_interval_minutes * 60);
    tokio::spawn(sync::run_board(handle.clone(), coordinator, interval));

    Ok(handle)
}
