//! Overlay text for annotated screenshots.

use chrono::{DateTime, Months, Utc};

use crate::location::LocationSnapshot;

/// Years between the real calendar and the in-game one.
pub const GAME_YEAR_OFFSET: u32 = 1286;

/// Timestamp layout on the overlay.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Placeholder for names the journal has not reported yet.
const UNKNOWN: &str = "UNKNOWN";

/// Placeholder for absent readings.
const NO_READING: &str = "-";

/// Format `now` in the in-game calendar.
///
/// February 29th maps to February 28th when the in-game year is not a leap year.
#[must_use]
pub fn game_timestamp(now: DateTime<Utc>) -> String {
    now.checked_add_months(Months::new(GAME_YEAR_OFFSET * 12))
        .unwrap_or(now)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Planet name as shown on the overlay.
///
/// Bodies are usually named after their system ("Sol 3"); the redundant
/// system prefix is dropped so only the designation ("3") remains.
#[must_use]
pub fn planet_label(system: &str, planet: &str) -> String {
    let stripped = match planet.strip_prefix(system) {
        Some(rest) if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() => {
            rest.trim()
        }
        _ => planet,
    };
    stripped.to_uppercase()
}

/// Build the multi-line overlay text for a snapshot.
///
/// Surface readings add two lines (body data, then coordinates) when the
/// status reports an ambient temperature. On-foot states without one, such as
/// riding a taxi, keep the three-line form.
#[must_use]
pub fn overlay_text(snapshot: &LocationSnapshot, now: DateTime<Utc>) -> String {
    let system = snapshot.star_system.as_deref().unwrap_or(UNKNOWN);
    let planet = snapshot
        .planet
        .as_deref()
        .map_or_else(|| UNKNOWN.to_string(), |planet| planet_label(system, planet));

    let mut lines = vec![
        game_timestamp(now),
        format!("SYSTEM: {}", system.to_uppercase()),
        format!("PLANET: {planet}"),
    ];

    if snapshot.temperature().is_some() {
        lines.push(format!(
            "RADIUS: {} | TEMP: {} | GRAV: {}",
            reading(snapshot.planet_radius.map(|r| r / 1000.0), 0, " km"),
            reading(snapshot.temperature(), 1, " K"),
            reading(snapshot.gravity(), 2, " g"),
        ));
        lines.push(format!(
            "LAT: {} | LON: {} | ALT: {}",
            reading(snapshot.latitude, 4, ""),
            reading(snapshot.longitude, 4, ""),
            reading(snapshot.altitude, 0, " m"),
        ));
    }

    lines.join("\n")
}

fn reading(value: Option<f64>, precision: usize, unit: &str) -> String {
    value.map_or_else(
        || NO_READING.to_string(),
        |v| format!("{v:.precision$}{unit}"),
    )
}
