/// Flight board page parser
///
/// The airport renders each board as a list of row containers:
///
/// ```html
/// <div class="table__element">
///   <div class="table__time">22:50</div>
///   <div class="table__time table__time_expected">23:32</div>
///   <div class="table__airport">Barcelona</div>
///   <div class="table__company">WIZZ AIR</div>
///   <div class="table__flight">W6 1706</div>
///   <div class="table__status">OPÓŹNIONY 23:32</div>
/// </div>
/// ```
///
/// Scheduled time, airport and flight number are required; a row missing
/// any of them is skipped. Airline and status may be absent.
use tracing::{debug, warn};

use crate::models::{Direction, Flight, FlightStatus};
use crate::services::html::{self, Element};
use crate::services::{status, time};

const ROW_CLASS: &str = "table__element";
const TIME_CLASS: &str = "table__time";
const EXPECTED_TIME_CLASS: &str = "table__time_expected";
const AIRPORT_CLASS: &str = "table__airport";
const AIRLINE_CLASS: &str = "table__company";
const FLIGHT_CLASS: &str = "table__flight";
const STATUS_CLASS: &str = "table__status";

/// Parse a whole board page. Never fails; unusable rows are dropped.
pub fn parse_page(markup: &str, direction: Direction) -> Vec<Flight> {
    let rows = html::find_all(markup, "div", ROW_CLASS);
    if rows.is_empty() {
        warn!(%direction, "No flight elements found in HTML");
        return Vec::new();
    }

    let total = rows.len();
    let flights: Vec<Flight> = rows
        .iter()
        .filter_map(|row| parse_fragment(row, direction))
        .collect();

    if flights.is_empty() {
        warn!(%direction, rows = total, "No parsable flight rows found in HTML");
    } else {
        debug!(
            %direction,
            count = flights.len(),
            skipped = total - flights.len(),
            "Parsed flights"
        );
    }

    flights
}

/// Parse one row container into a flight, or `None` if it is not a usable row
pub fn parse_fragment(row: &Element<'_>, direction: Direction) -> Option<Flight> {
    // The first time cell must be the scheduled one; a row that only has an
    // expected-time cell is not a flight row.
    let time_cell = row.find("div", TIME_CLASS)?;
    if time_cell.has_class(EXPECTED_TIME_CLASS) {
        debug!(%direction, "Skipping row without scheduled time cell");
        return None;
    }
    let scheduled_time = required_text(time_cell, "scheduled time", direction)?;

    let location = required_text(row.find("div", AIRPORT_CLASS)?, "airport", direction)?;
    let flight_number = required_text(row.find("div", FLIGHT_CLASS)?, "flight number", direction)?;

    let airline = row
        .find("div", AIRLINE_CLASS)
        .map(|cell| cell.text())
        .unwrap_or_default();

    let status_text = row
        .find("div", STATUS_CLASS)
        .map(|cell| cell.text())
        .unwrap_or_default();
    let status = status::normalize(&status_text);

    let expected_time = row
        .find("div", EXPECTED_TIME_CLASS)
        .map(|cell| cell.text())
        .filter(|text| time::parse_clock(text).is_some())
        .or_else(|| {
            if status == FlightStatus::Delayed {
                time::extract_time_token(&status_text)
            } else {
                None
            }
        });

    let delay_minutes = time::delay_minutes(&scheduled_time, expected_time.as_deref());

    Some(Flight::new(
        direction,
        scheduled_time,
        expected_time,
        location,
        airline,
        flight_number,
        status,
        delay_minutes,
    ))
}

fn required_text(cell: Element<'_>, field: &str, direction: Direction) -> Option<String> {
    let text = cell.text();
    if text.is_empty() {
        debug!(%direction, field, "Skipping row with empty required field");
        return None;
    }
    Some(text)
}
