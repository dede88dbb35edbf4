use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{URL_ARRIVALS, URL_DEPARTURES};
use crate::models::{Direction, Flight};
use crate::services::parser::parse_page;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
);

/// Something that can hand out the raw board page for a direction
pub trait BoardSource: Send + Sync {
    fn fetch_page(
        &self,
        direction: Direction,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP client for the airport's flight board pages
#[derive(Debug, Clone)]
pub struct AirportClient {
    client: reqwest::Client,
    arrivals_url: String,
    departures_url: String,
}

impl AirportClient {
    pub fn new(
        arrivals_url: impl Into<String>,
        departures_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            arrivals_url: arrivals_url.into(),
            departures_url: departures_url.into(),
        })
    }

    /// Client for the default Gdańsk board pages
    pub fn gdansk() -> Result<Self, reqwest::Error> {
        Self::new(URL_ARRIVALS, URL_DEPARTURES)
    }

    pub fn url(&self, direction: Direction) -> &str {
        match direction {
            Direction::Arrival => &self.arrivals_url,
            Direction::Departure => &self.departures_url,
        }
    }
}

impl BoardSource for AirportClient {
    async fn fetch_page(&self, direction: Direction) -> Result<String, FetchError> {
        let url = self.url(direction);
        debug!(%direction, url, "Fetching board page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(direction, e))?;

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(direction, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Timeout fetching {direction} board")]
    Timeout { direction: Direction },
    #[error("Network error fetching {direction} board: {message}")]
    Transport { direction: Direction, message: String },
    #[error("Unexpected error fetching {direction} board: {message}")]
    Unexpected { direction: Direction, message: String },
}

impl FetchError {
    pub fn from_reqwest(direction: Direction, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { direction }
        } else if err.is_connect() || err.is_request() || err.is_status() || err.is_body() {
            FetchError::Transport {
                direction,
                message: err.to_string(),
            }
        } else {
            FetchError::Unexpected {
                direction,
                message: err.to_string(),
            }
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            FetchError::Timeout { direction }
            | FetchError::Transport { direction, .. }
            | FetchError::Unexpected { direction, .. } => *direction,
        }
    }
}

/// Parsed, unfiltered flights of one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedFlights {
    pub arrivals: Vec<Flight>,
    pub departures: Vec<Flight>,
}

impl FetchedFlights {
    /// Both directions combined, arrivals first
    pub fn all(&self) -> Vec<Flight> {
        self.arrivals
            .iter()
            .chain(self.departures.iter())
            .cloned()
            .collect()
    }
}

/// Fetches and parses the requested directions concurrently
#[derive(Debug)]
pub struct AggregateFetcher<S> {
    source: S,
}

impl<S: BoardSource> AggregateFetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// A failed direction yields an empty list while the other is kept.
    /// Only when every requested direction fails is the first error returned.
    pub async fn fetch_all(
        &self,
        want_arrivals: bool,
        want_departures: bool,
    ) -> Result<FetchedFlights, FetchError> {
        let (arrivals, departures) = futures::future::join(
            self.fetch_direction(Direction::Arrival, want_arrivals),
            self.fetch_direction(Direction::Departure, want_departures),
        )
        .await;

        match (arrivals, departures) {
            (Err(e), Err(_)) => Err(e),
            (Err(e), Ok(_)) if !want_departures => Err(e),
            (Ok(_), Err(e)) if !want_arrivals => Err(e),
            (arrivals, departures) => Ok(FetchedFlights {
                arrivals: arrivals.unwrap_or_default(),
                departures: departures.unwrap_or_default(),
            }),
        }
    }

    async fn fetch_direction(
        &self,
        direction: Direction,
        wanted: bool,
    ) -> Result<Vec<Flight>, FetchError> {
        if !wanted {
            return Ok(Vec::new());
        }

        match self.source.fetch_page(direction).await {
            Ok(markup) => {
                let flights = parse_page(&markup, direction);
                info!(%direction, count = flights.len(), "Fetched flights");
                Ok(flights)
            }
            Err(e) => {
                error!(%direction, error = %e, "Failed to fetch flights");
                Err(e)
            }
        }
    }
}
