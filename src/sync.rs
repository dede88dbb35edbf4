use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::models::{BoardSnapshot, DataSource, Direction, DirectionSelection};
use crate::providers::airport::{AggregateFetcher, BoardSource, FetchError, FetchedFlights};
use crate::services::events::{EventKind, EventLog, EventSink, FlightEvent};
use crate::services::filter::{self, FilterOptions};
use crate::services::state_tracker::{FlightStateChange, StateTracker};
use crate::services::tracking::TrackedFlights;

/// Cached snapshots older than this are not served
pub const CACHE_MAX_AGE_SECONDS: i64 = 60 * 60;

/// Number of recent events kept per board
pub const EVENT_LOG_CAPACITY: usize = 100;

/// Per-board settings the coordinator applies on every poll
#[derive(Debug, Clone, Default)]
pub struct CoordinatorSettings {
    pub selection: DirectionSelection,
    pub filter: FilterOptions,
    pub events_enabled: bool,
    pub events_all_flights: bool,
}

/// Result of a poll that produced data
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Freshly fetched and processed
    Live(BoardSnapshot),
    /// The fetch failed and the last snapshot is still fresh enough
    CacheFallback {
        snapshot: BoardSnapshot,
        cause: SyncError,
    },
}

impl PollOutcome {
    pub fn snapshot(&self) -> &BoardSnapshot {
        match self {
            PollOutcome::Live(snapshot) | PollOutcome::CacheFallback { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> BoardSnapshot {
        match self {
            PollOutcome::Live(snapshot) | PollOutcome::CacheFallback { snapshot, .. } => snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Why no cached snapshot could stand in for a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Absent,
    Stale { age_seconds: i64 },
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheState::Absent => f.write_str("no cached data"),
            CacheState::Stale { age_seconds } => {
                write!(f, "cached data is {} minutes old", age_seconds / 60)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Update failed ({cache}): {cause}")]
pub struct UpdateFailed {
    pub cause: SyncError,
    pub cache: CacheState,
}

/// Runs the fetch, change detection, filter and cache steps of one board
pub struct UpdateCoordinator<S> {
    name: String,
    fetcher: AggregateFetcher<S>,
    settings: CoordinatorSettings,
    tracked: TrackedFlights,
    tracker: StateTracker,
    sink: Arc<dyn EventSink>,
    cache: Option<BoardSnapshot>,
}

impl<S: BoardSource> UpdateCoordinator<S> {
    pub fn new(
        name: impl Into<String>,
        source: S,
        settings: CoordinatorSettings,
        tracked: TrackedFlights,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name: name.into(),
            fetcher: AggregateFetcher::new(source),
            settings,
            tracked,
            tracker: StateTracker::new(),
            sink,
            cache: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last snapshot assembled from live data
    pub fn cached(&self) -> Option<&BoardSnapshot> {
        self.cache.as_ref()
    }

    pub async fn poll(&mut self) -> Result<PollOutcome, UpdateFailed> {
        self.poll_at(Local::now().naive_local()).await
    }

    /// Poll with an explicit local wall-clock time.
    ///
    /// The fetch is the only await point, so dropping this future leaves
    /// the cached snapshot and tracked state untouched.
    pub async fn poll_at(&mut self, now: NaiveDateTime) -> Result<PollOutcome, UpdateFailed> {
        let selection = self.settings.selection;
        let fetched = self
            .fetcher
            .fetch_all(
                selection.includes(Direction::Arrival),
                selection.includes(Direction::Departure),
            )
            .await;

        match fetched {
            Ok(flights) => Ok(PollOutcome::Live(self.process(flights, now))),
            Err(e) => self.fall_back(SyncError::Fetch(e), now),
        }
    }

    fn process(&mut self, fetched: FetchedFlights, now: NaiveDateTime) -> BoardSnapshot {
        let changes = self.tracker.detect_changes(&fetched.all());
        self.emit_events(&changes);

        let options = &self.settings.filter;
        let arrivals = filter::filter(&fetched.arrivals, options, now);
        let departures = filter::filter(&fetched.departures, options, now);

        let snapshot = BoardSnapshot {
            next_arrival: filter::next_flight(&arrivals),
            next_departure: filter::next_flight(&departures),
            arrivals,
            departures,
            last_updated: now,
            data_source: DataSource::Live,
            cache_age_seconds: 0,
            cache_age_minutes: 0,
        };

        info!(
            board = %self.name,
            arrivals = snapshot.arrivals.len(),
            departures = snapshot.departures.len(),
            changes = changes.len(),
            "Updated flight board"
        );

        self.cache = Some(snapshot.clone());
        snapshot
    }

    fn fall_back(
        &self,
        cause: SyncError,
        now: NaiveDateTime,
    ) -> Result<PollOutcome, UpdateFailed> {
        let Some(cached) = &self.cache else {
            error!(
                board = %self.name,
                error = %cause,
                "Update failed and no cached data available"
            );
            return Err(UpdateFailed {
                cause,
                cache: CacheState::Absent,
            });
        };

        let age_seconds = (now - cached.last_updated).num_seconds().max(0);
        if age_seconds >= CACHE_MAX_AGE_SECONDS {
            error!(
                board = %self.name,
                error = %cause,
                age_seconds,
                "Update failed and cached data is too old"
            );
            return Err(UpdateFailed {
                cause,
                cache: CacheState::Stale { age_seconds },
            });
        }

        let mut snapshot = cached.clone();
        snapshot.data_source = DataSource::Cache;
        snapshot.cache_age_seconds = age_seconds;
        snapshot.cache_age_minutes = age_seconds / 60;

        warn!(
            board = %self.name,
            error = %cause,
            cache_age_minutes = snapshot.cache_age_minutes,
            "Using cached data"
        );
        Ok(PollOutcome::CacheFallback { snapshot, cause })
    }

    fn emit_events(&self, changes: &[FlightStateChange]) {
        if !self.settings.events_enabled {
            return;
        }

        for change in changes {
            let flight = &change.flight;
            if !self.settings.events_all_flights && !self.tracked.contains(&flight.flight_number) {
                continue;
            }

            if let Some(kind) = EventKind::for_status(change.new_status) {
                self.sink
                    .emit(FlightEvent::new(kind, flight, Some(change.old_status)));
            }
            if change.status_changed() {
                self.sink.emit(FlightEvent::new(
                    EventKind::StatusChanged,
                    flight,
                    Some(change.old_status),
                ));
            }
        }
    }
}

/// What the HTTP layer sees of a board
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BoardState {
    pub snapshot: Option<BoardSnapshot>,
    pub last_update_success: bool,
    pub last_error: Option<String>,
}

/// Shared handle to one board: its published state, tracked flights and events
#[derive(Debug)]
pub struct BoardHandle {
    pub name: String,
    pub direction: DirectionSelection,
    pub tracked: TrackedFlights,
    pub state: Arc<RwLock<BoardState>>,
    pub events: EventLog,
}

impl BoardHandle {
    pub fn new(
        name: impl Into<String>,
        direction: DirectionSelection,
        tracked: TrackedFlights,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            tracked,
            state: Arc::new(RwLock::new(BoardState::default())),
            events: EventLog::new(EVENT_LOG_CAPACITY),
        }
    }

    /// Store the result of a poll. A failure keeps the previous snapshot.
    pub async fn publish(&self, result: Result<PollOutcome, UpdateFailed>) {
        let mut state = self.state.write().await;
        match result {
            Ok(PollOutcome::Live(snapshot)) => {
                state.snapshot = Some(snapshot);
                state.last_update_success = true;
                state.last_error = None;
            }
            Ok(PollOutcome::CacheFallback { snapshot, cause }) => {
                state.snapshot = Some(snapshot);
                state.last_update_success = true;
                state.last_error = Some(cause.to_string());
            }
            Err(e) => {
                state.last_update_success = false;
                state.last_error = Some(e.to_string());
            }
        }
    }
}

/// Poll a board forever on a fixed interval, starting immediately
pub async fn run_board<S: BoardSource>(
    handle: Arc<BoardHandle>,
    mut coordinator: UpdateCoordinator<S>,
    scan_interval: Duration,
) {
    info!(board = %handle.name, interval_secs = scan_interval.as_secs(), "Starting board sync");

    let mut interval = tokio::time::interval(scan_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let result = coordinator.poll().await;
        handle.publish(result).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlightStatus;
    use crate::services::events::{EVENT_FLIGHT_BOARDING, EVENT_FLIGHT_STATUS_CHANGED};
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::sync::Mutex;

    /// Serves whatever page is currently set; `None` fails with a timeout
    #[derive(Clone, Default)]
    struct ScriptedSource {
        page: Arc<Mutex<Option<String>>>,
    }

    impl ScriptedSource {
        fn set(&self, page: Option<&str>) {
            *self.page.lock().unwrap() = page.map(str::to_string);
        }
    }

    impl BoardSource for ScriptedSource {
        async fn fetch_page(&self, direction: Direction) -> Result<String, FetchError> {
            self.page
                .lock()
                .unwrap()
                .clone()
                .ok_or(FetchError::Timeout { direction })
        }
    }

    fn page(status: &str) -> String {
        format!(
            r#"<div class="table__element">
                <div class="table__time">10:00</div>
                <div class="table__airport">Barcelona</div>
                <div class="table__company">WIZZ AIR</div>
                <div class="table__flight">W6 1706</div>
                <div class="table__status">{status}</div>
            </div>"#
        )
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn coordinator(
        settings: CoordinatorSettings,
        tracked: TrackedFlights,
    ) -> (UpdateCoordinator<ScriptedSource>, ScriptedSource, EventLog) {
        let source = ScriptedSource::default();
        let log = EventLog::new(10);
        let coordinator = UpdateCoordinator::new(
            "test",
            source.clone(),
            settings,
            tracked,
            Arc::new(log.clone()),
        );
        (coordinator, source, log)
    }

    fn arrivals_only() -> CoordinatorSettings {
        CoordinatorSettings {
            selection: DirectionSelection::Arrivals,
            ..CoordinatorSettings::default()
        }
    }

    #[tokio::test]
    async fn live_poll_builds_snapshot() {
        let (mut coord, source, _) = coordinator(arrivals_only(), TrackedFlights::default());
        source.set(Some(&page("OCZEKIWANY")));

        let outcome = coord.poll_at(at(9, 0)).await.unwrap();
        let PollOutcome::Live(snapshot) = outcome else {
            panic!("expected live data");
        };
        assert_eq!(snapshot.data_source, DataSource::Live);
        assert_eq!(snapshot.arrivals.len(), 1);
        assert!(snapshot.departures.is_empty());
        assert_eq!(snapshot.next_arrival.as_ref().unwrap().flight_number, "W6 1706");
        assert_eq!(snapshot.last_updated, at(9, 0));
        assert_eq!(coord.cached(), Some(&snapshot));
    }

    #[tokio::test]
    async fn failure_without_cache_is_hard_error() {
        let (mut coord, _, _) = coordinator(arrivals_only(), TrackedFlights::default());

        let err = coord.poll_at(at(9, 0)).await.unwrap_err();
        assert_eq!(err.cache, CacheState::Absent);
        assert!(matches!(err.cause, SyncError::Fetch(FetchError::Timeout { .. })));
    }

    #[tokio::test]
    async fn failure_with_fresh_cache_falls_back() {
        let (mut coord, source, _) = coordinator(arrivals_only(), TrackedFlights::default());
        source.set(Some(&page("OCZEKIWANY")));
        coord.poll_at(at(9, 0)).await.unwrap();

        source.set(None);
        let outcome = coord.poll_at(at(9, 25)).await.unwrap();
        let PollOutcome::CacheFallback { snapshot, .. } = outcome else {
            panic!("expected cache fallback");
        };
        assert_eq!(snapshot.data_source, DataSource::Cache);
        assert_eq!(snapshot.cache_age_seconds, 25 * 60);
        assert_eq!(snapshot.cache_age_minutes, 25);
        assert_eq!(snapshot.arrivals.len(), 1);

        // The cache itself stays tagged live
        assert_eq!(coord.cached().unwrap().data_source, DataSource::Live);
    }

    #[tokio::test]
    async fn failure_with_stale_cache_is_hard_error() {
        let (mut coord, source, _) = coordinator(arrivals_only(), TrackedFlights::default());
        source.set(Some(&page("OCZEKIWANY")));
        coord.poll_at(at(9, 0)).await.unwrap();

        source.set(None);
        let err = coord.poll_at(at(10, 0)).await.unwrap_err();
        assert_eq!(err.cache, CacheState::Stale { age_seconds: 3600 });
    }

    #[tokio::test]
    async fn clock_going_backwards_gives_zero_age() {
        let (mut coord, source, _) = coordinator(arrivals_only(), TrackedFlights::default());
        source.set(Some(&page("OCZEKIWANY")));
        coord.poll_at(at(9, 0)).await.unwrap();

        source.set(None);
        let earlier = at(9, 0) - ChronoDuration::minutes(5);
        let outcome = coord.poll_at(earlier).await.unwrap();
        assert_eq!(outcome.snapshot().cache_age_seconds, 0);
    }

    #[tokio::test]
    async fn events_fire_for_tracked_flights_only() {
        let settings = CoordinatorSettings {
            events_enabled: true,
            ..arrivals_only()
        };
        let (mut coord, source, log) =
            coordinator(settings, TrackedFlights::from_option("LO 3827"));
        source.set(Some(&page("OCZEKIWANY")));
        coord.poll_at(at(9, 0)).await.unwrap();
        source.set(Some(&page("BOARDING")));
        coord.poll_at(at(9, 5)).await.unwrap();
        assert!(log.recent().is_empty());

        let tracked = TrackedFlights::from_option("w6 1706");
        let settings = CoordinatorSettings {
            events_enabled: true,
            ..arrivals_only()
        };
        let (mut coord, source, log) = coordinator(settings, tracked);
        source.set(Some(&page("OCZEKIWANY")));
        coord.poll_at(at(9, 0)).await.unwrap();
        assert!(log.recent().is_empty());

        source.set(Some(&page("BOARDING")));
        coord.poll_at(at(9, 5)).await.unwrap();
        let events = log.recent();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EVENT_FLIGHT_BOARDING);
        assert_eq!(events[1].event_type, EVENT_FLIGHT_STATUS_CHANGED);
        assert_eq!(events[1].data.old_status, Some(FlightStatus::Expected));
    }

    #[tokio::test]
    async fn disabled_events_still_track_state() {
        let (mut coord, source, log) = coordinator(arrivals_only(), TrackedFlights::default());
        source.set(Some(&page("OCZEKIWANY")));
        coord.poll_at(at(9, 0)).await.unwrap();
        source.set(Some(&page("WYLĄDOWAŁ")));
        coord.poll_at(at(9, 5)).await.unwrap();

        assert!(log.recent().is_empty());
        assert_eq!(coord.tracker.len(), 1);
    }

    #[tokio::test]
    async fn publish_keeps_snapshot_on_failure() {
        let handle = BoardHandle::new("test", DirectionSelection::Both, TrackedFlights::default());
        let (mut coord, source, _) = coordinator(arrivals_only(), TrackedFlights::default());

        source.set(Some(&page("OCZEKIWANY")));
        handle.publish(coord.poll_at(at(9, 0)).await).await;
        source.set(None);
        handle.publish(coord.poll_at(at(11, 0)).await).await;

        let state = handle.state.read().await;
        assert!(!state.last_update_success);
        assert!(state.last_error.is_some());
        assert_eq!(state.snapshot.as_ref().unwrap().arrivals.len(), 1);
    }
}
