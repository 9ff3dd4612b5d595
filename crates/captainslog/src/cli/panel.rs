//! Plain-text rendering of a location snapshot.

use crate::flags::{NO_FLAGS, SEPARATOR};
use crate::location::LocationSnapshot;

/// Width of the right-aligned label column.
const LABEL_WIDTH: usize = 12;

/// Rule width used when the terminal width is unknown.
pub const DEFAULT_WIDTH: usize = 80;

/// Render `snapshot` as a panel framed by `=` rules of `width` characters.
///
/// Only fields with a value are listed. Flags follow, one per line.
#[must_use]
pub fn render(snapshot: &LocationSnapshot, width: usize) -> String {
    let rule = "=".repeat(width);
    let mut lines = vec![rule.clone()];

    lines.extend(
        fields(snapshot)
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| format!("{label:>LABEL_WIDTH$}: {v}"))),
    );

    lines.push(String::new());
    lines.push("Flags:".to_string());
    if snapshot.decoded_flags.is_empty() {
        lines.push(format!("  {NO_FLAGS}"));
    }
    lines.extend(
        snapshot
            .decoded_flags
            .split(SEPARATOR)
            .filter(|f| !f.is_empty())
            .map(|flag| format!("  {flag}")),
    );

    lines.push(rule);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn fields(snapshot: &LocationSnapshot) -> [(&'static str, Option<String>); 15] {
    let text = |v: &Option<String>| v.clone();
    let number = |v: Option<f64>| v.map(|n| n.to_string());

    [
        ("StarSystem", text(&snapshot.star_system)),
        ("Planet", text(&snapshot.planet)),
        ("Station", text(&snapshot.station)),
        ("StationType", text(&snapshot.station_type)),
        ("BodyName", text(&snapshot.body_name)),
        ("PlanetRadius", number(snapshot.planet_radius)),
        ("Temperature", number(snapshot.temperature())),
        ("Gravity", number(snapshot.gravity())),
        ("Latitude", number(snapshot.latitude)),
        ("Longitude", number(snapshot.longitude)),
        ("Heading", number(snapshot.heading)),
        ("Altitude", number(snapshot.altitude)),
        ("LegalState", text(&snapshot.legal_state)),
        ("Oxygen", number(snapshot.oxygen())),
        ("Health", number(snapshot.health())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> LocationSnapshot {
        LocationSnapshot {
            star_system: Some("Sol".to_string()),
            planet: Some("Sol 3".to_string()),
            latitude: Some(12.5),
            legal_state: Some("Clean".to_string()),
            decoded_flags: "Landing Gear Down | Shields Up".to_string(),
            ..LocationSnapshot::default()
        }
    }

    #[test]
    fn test_render_aligns_labels() {
        let panel = render(&snapshot(), 20);
        let lines: Vec<&str> = panel.lines().collect();

        assert_eq!(lines[0], "=".repeat(20));
        assert_eq!(lines[1], "  StarSystem: Sol");
        assert_eq!(lines[2], "      Planet: Sol 3");
        assert_eq!(lines[3], "    Latitude: 12.5");
        assert_eq!(lines[4], "  LegalState: Clean");
        assert_eq!(lines.last().copied(), Some("=".repeat(20).as_str()));
    }

    #[test]
    fn test_render_skips_absent_fields() {
        let panel = render(&snapshot(), DEFAULT_WIDTH);
        assert!(!panel.contains("Station"));
        assert!(!panel.contains("Temperature"));
    }

    #[test]
    fn test_render_flags_one_per_line() {
        let panel = render(&snapshot(), DEFAULT_WIDTH);
        assert!(panel.contains("\nFlags:\n  Landing Gear Down\n  Shields Up\n"));
    }

    #[test]
    fn test_render_empty_flags() {
        let mut snapshot = snapshot();
        snapshot.decoded_flags = String::new();
        let panel = render(&snapshot, 4);
        assert!(panel.ends_with("\nFlags:\n  None\n====\n"));
    }

    #[test]
    fn test_render_no_flags() {
        let mut snapshot = snapshot();
        snapshot.decoded_flags = NO_FLAGS.to_string();
        let panel = render(&snapshot, DEFAULT_WIDTH);
        assert!(panel.contains("Flags:\n  None\n"));
    }
}
