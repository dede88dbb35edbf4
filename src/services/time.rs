use chrono::{NaiveTime, Timelike};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const MINUTES_PER_DAY: i64 = 24 * 60;

fn time_token() -> &'static Regex {
    static TIME_TOKEN: OnceLock<Regex> = OnceLock::new();
    TIME_TOKEN.get_or_init(|| {
        Regex::new(r"\b([0-9]{1,2}:[0-9]{2})\b").expect("time token pattern is valid")
    })
}

/// Parse an "HH:MM" wall-clock string
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Minutes from `scheduled` to `expected`, both "HH:MM".
///
/// An expected time earlier on the clock than the scheduled one is taken to
/// be on the following day, so "23:50" -> "00:20" is a 30 minute delay.
/// Returns `None` if either side is missing or unparsable.
pub fn delay_minutes(scheduled: &str, expected: Option<&str>) -> Option<i64> {
    let expected = expected.filter(|e| !e.is_empty())?;
    if scheduled.is_empty() {
        return None;
    }

    let (Some(scheduled_at), Some(expected_at)) = (parse_clock(scheduled), parse_clock(expected))
    else {
        debug!(scheduled, expected, "Could not calculate delay");
        return None;
    };

    let scheduled_minutes = minutes_of_day(scheduled_at);
    let mut expected_minutes = minutes_of_day(expected_at);
    if expected_minutes < scheduled_minutes {
        expected_minutes += MINUTES_PER_DAY;
    }

    Some(expected_minutes - scheduled_minutes)
}

/// First "H:MM" / "HH:MM" token in free text, e.g. the time in "OPÓŹNIONY 00:32"
pub fn extract_time_token(text: &str) -> Option<String> {
    time_token()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}
