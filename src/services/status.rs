use crate::models::FlightStatus;

/// Board labels and the status they map to, in lookup order.
///
/// Each label appears with and without Polish diacritics since the page
/// uses both. Prefix matching walks this table top to bottom, so a shorter
/// label listed first wins over a longer one ("ODPRAWA" before "ODPRAWA OD").
const STATUS_LABELS: &[(&str, FlightStatus)] = &[
    // Arrivals
    ("WYLĄDOWAŁ", FlightStatus::Landed),
    ("WYLADOWAL", FlightStatus::Landed),
    ("OCZEKIWANY", FlightStatus::Expected),
    ("OPÓŹNIONY", FlightStatus::Delayed),
    ("OPOZNIONY", FlightStatus::Delayed),
    ("ODWOŁANY", FlightStatus::Cancelled),
    ("ODWOLANY", FlightStatus::Cancelled),
    // Departures
    ("WYSTARTOWAŁ", FlightStatus::Departed),
    ("WYSTARTOWAL", FlightStatus::Departed),
    ("BOARDING", FlightStatus::Boarding),
    ("GATE ZAMKNIĘTY", FlightStatus::GateClosed),
    ("GATE ZAMKNIETY", FlightStatus::GateClosed),
    ("OSTATNIE WEZWANIE", FlightStatus::FinalCall),
    ("ODPRAWA", FlightStatus::CheckIn),
    ("ODPRAWA OD", FlightStatus::CheckIn),
    ("DO WYJSCIA", FlightStatus::Gate),
    ("DO WYJŚCIA", FlightStatus::Gate),
];

/// Map a raw status label from the board to a [`FlightStatus`].
///
/// Labels may carry trailing details such as "OPÓŹNIONY 00:32"; those match
/// by prefix. Anything unrecognised, including an empty label, is
/// [`FlightStatus::Unknown`].
pub fn normalize(raw: &str) -> FlightStatus {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty() {
        return FlightStatus::Unknown;
    }

    if let Some((_, status)) = STATUS_LABELS
        .iter()
        .find(|(label, _)| *label == normalized)
    {
        return *status;
    }

    STATUS_LABELS
        .iter()
        .find(|(label, _)| normalized.starts_with(label))
        .map(|(_, status)| *status)
        .unwrap_or(FlightStatus::Unknown)
}
