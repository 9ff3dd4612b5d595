//! Decoding of the packed status flag words.
//!
//! `Status.json` carries two bitfields, `Flags` (32 bits) and `Flags2`
//! (20 meaningful bits). Each set bit maps to a fixed label; the decoded
//! form lists the labels of all set bits in ascending bit order.

/// Labels for `Flags`, indexed by bit position.
pub const FLAG_BITS: [&str; 32] = [
    "Docked on a landing pad",
    "Landed on planet surface",
    "Landing Gear Down",
    "Shields Up",
    "Supercruise",
    "FlightAssist Off",
    "Hardpoints Deployed",
    "In Wing",
    "Lights On",
    "Cargo Scoop Deployed",
    "Silent Running",
    "Scooping Fuel",
    "SRV Handbrake",
    "SRV using Turret view",
    "SRV Turret retracted (close to ship)",
    "SRV DriveAssist",
    "FSD MassLocked",
    "FSD Charging",
    "FSD Cooldown",
    "Low Fuel (< 25%)",
    "Over Heating (> 100%)",
    "Has Lat and Long",
    "Is In Danger",
    "Being Interdicted",
    "In MainShip",
    "In Fighter",
    "In SRV",
    "HUD in Analysis mode",
    "Night Vision",
    "Altitude from Average radius",
    "FSD Jump",
    "SRV HighBeam",
];

/// Labels for `Flags2`, indexed by bit position.
pub const FLAG2_BITS: [&str; 20] = [
    "On Foot",
    "In Taxi or dropship/shuttle",
    "In Multicrew (someone else's ship)",
    "On Foot In Station",
    "On Foot On Planet",
    "Aim Down Sight",
    "Low Oxygen",
    "Low Health",
    "Cold",
    "Hot",
    "Very Cold",
    "Very Hot",
    "Glide Mode",
    "On Foot In Hangar",
    "On Foot Social Space",
    "On Foot Exterior",
    "Breathable Atmosphere",
    "Telepresence Multicrew",
    "Physical Multicrew",
    "FSD hyperdrive charging",
];

/// Separator between labels in the decoded string.
pub const SEPARATOR: &str = " | ";

/// Decoded form when no bit is set.
pub const NO_FLAGS: &str = "None";

/// Labels of the set bits of both words, `Flags` first, each in ascending bit order.
///
/// Bits of `flags2` above the table range are ignored.
pub fn set_labels(flags: u32, flags2: u32) -> impl Iterator<Item = &'static str> {
    labels_for(flags, &FLAG_BITS).chain(labels_for(flags2, &FLAG2_BITS))
}

fn labels_for(word: u32, table: &'static [&'static str]) -> impl Iterator<Item = &'static str> {
    table
        .iter()
        .enumerate()
        .filter(move |(bit, _)| word & (1 << bit) != 0)
        .map(|(_, label)| *label)
}

/// Decode both flag words into one pipe-separated string.
///
/// Returns `"None"` when no known bit is set.
#[must_use]
pub fn decode_flags(flags: u32, flags2: u32) -> String {
    let decoded = set_labels(flags, flags2).collect::<Vec<_>>().join(SEPARATOR);
    if decoded.is_empty() {
        NO_FLAGS.to_string()
    } else {
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        assert_eq!(decode_flags(0, 0), "None");
    }

    #[test]
    fn test_single_flag() {
        assert_eq!(decode_flags(1 << 3, 0), "Shields Up");
        assert_eq!(decode_flags(0, 1), "On Foot");
    }

    #[test]
    fn test_ascending_bit_order() {
        // Docked, Landing Gear Down, Shields Up, Has Lat and Long
        let flags = (1 << 21) | (1 << 3) | (1 << 2) | 1;
        assert_eq!(
            decode_flags(flags, 0),
            "Docked on a landing pad | Landing Gear Down | Shields Up | Has Lat and Long"
        );
    }

    #[test]
    fn test_flags_before_flags2() {
        let decoded = decode_flags(1 << 31, (1 << 16) | 1);
        assert_eq!(decoded, "SRV HighBeam | On Foot | Breathable Atmosphere");
    }

    #[test]
    fn test_only_flags2() {
        assert_eq!(decode_flags(0, 1 << 19), "FSD hyperdrive charging");
    }

    #[test]
    fn test_all_bits_set() {
        let decoded = decode_flags(u32::MAX, u32::MAX);
        let labels: Vec<&str> = decoded.split(SEPARATOR).collect();

        assert_eq!(labels.len(), 52);
        assert_eq!(labels[0], FLAG_BITS[0]);
        assert_eq!(labels[31], FLAG_BITS[31]);
        assert_eq!(labels[32], FLAG2_BITS[0]);
        assert_eq!(labels[51], FLAG2_BITS[19]);
    }

    #[test]
    fn test_flags2_high_bits_ignored() {
        assert_eq!(decode_flags(0, 1 << 20), "None");
        assert_eq!(decode_flags(0, 0xFFF0_0000 | 1), "On Foot");
    }

    #[test]
    fn test_set_labels_order_matches_tables() {
        let labels: Vec<&str> = set_labels(0b101, 0b10).collect();
        assert_eq!(
            labels,
            vec![FLAG_BITS[0], FLAG_BITS[2], FLAG2_BITS[1]]
        );
    }
}
