// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Aviation primitives: beacon codes, special-purpose codes, flight rules,
//! and consolidated wake turbulence (CWT) categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 12-bit transponder beacon code, displayed and entered in octal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Squawk(pub u16);

/// Beacon-code parsing failure.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid beacon code: {0}")]
pub struct SquawkError(pub String);

impl Squawk {
    /// The VFR code, 1200 octal.
    pub const VFR: Squawk = Squawk(0o1200);

    /// Parse a 4-digit octal beacon code.
    pub fn parse(s: &str) -> Result<Self, SquawkError> {
        if s.len() != 4 || !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(SquawkError(s.to_string()));
        }
        u16::from_str_radix(s, 8)
            .map(Squawk)
            .map_err(|_| SquawkError(s.to_string()))
    }

    /// Parse a 2-digit octal beacon bank (block select).
    pub fn parse_bank(s: &str) -> Result<Self, SquawkError> {
        if s.len() != 2 || !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(SquawkError(s.to_string()));
        }
        u16::from_str_radix(s, 8)
            .map(Squawk)
            .map_err(|_| SquawkError(s.to_string()))
    }

    /// True for standard special-purpose codes (emergency, hijack, etc.).
    #[must_use]
    pub fn is_spc(self) -> bool {
        spc_for_code(self).is_some()
    }
}

impl fmt::Display for Squawk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Standard special-purpose code identifiers, two characters each.
const STANDARD_SPCS: [(u16, &str); 5] = [
    (0o7400, "LL"), // lost link
    (0o7500, "HJ"), // hijack / unlawful interference
    (0o7600, "RF"), // radio failure
    (0o7700, "EM"), // emergency
    (0o7777, "MI"), // military intercept
];

/// Returns the two-letter SPC identifier for a standard special-purpose code.
#[must_use]
pub fn spc_for_code(code: Squawk) -> Option<&'static str> {
    STANDARD_SPCS
        .iter()
        .find(|(c, _)| *c == code.0)
        .map(|(_, id)| *id)
}

/// True if `id` names a standard SPC ("EM", "HJ", ...).
#[must_use]
pub fn is_standard_spc(id: &str) -> bool {
    STANDARD_SPCS.iter().any(|(_, s)| *s == id)
}

/// Flight rules from the flight plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightRules {
    #[default]
    Ifr,
    Vfr,
}

impl FlightRules {
    /// Single-character suffix used in datablock field 5.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            FlightRules::Ifr => "",
            FlightRules::Vfr => "V",
        }
    }
}

/// Flight category relative to the terminal area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOfFlight {
    #[default]
    Arrival,
    Departure,
    Overflight,
}

/// Transponder operating mode as seen by the sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransponderMode {
    /// Not replying.
    Standby,
    /// Mode A: beacon code only, no altitude.
    On,
    /// Mode C: beacon code plus pressure altitude.
    #[default]
    Altitude,
}

/// Consolidated wake turbulence category, "A" (super) through "I" (light).
///
/// The approach separation matrix is indexed (leader, trailer); a zero entry
/// means no CWT-specific minimum applies and the facility lateral minimum
/// governs instead.
#[must_use]
pub fn cwt_approach_separation(front: &str, back: &str) -> f64 {
    let idx = |c: &str| -> Option<usize> {
        match c {
            "A" => Some(0),
            "B" => Some(1),
            "C" => Some(2),
            "D" => Some(3),
            "E" => Some(4),
            "F" => Some(5),
            "G" => Some(6),
            "H" => Some(7),
            "I" => Some(8),
            _ => None,
        }
    };
    // Rows: leader A..I, columns: trailer A..I. NM on final.
    const SEP: [[f64; 9]; 9] = [
        [0.0, 5.0, 6.0, 6.0, 7.0, 7.0, 7.0, 8.0, 8.0], // A
        [0.0, 3.0, 4.0, 4.0, 5.0, 5.0, 5.0, 5.0, 6.0], // B
        [0.0, 0.0, 0.0, 0.0, 3.5, 3.5, 3.5, 5.0, 5.0], // C
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0], // D
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0], // E
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0], // F
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], // G
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], // H
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], // I
    ];
    match (idx(front), idx(back)) {
        (Some(f), Some(b)) => SEP[f][b],
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squawk_octal_round_trip() {
        let sq = Squawk::parse("1200").unwrap();
        assert_eq!(sq, Squawk::VFR);
        assert_eq!(sq.to_string(), "1200");
        assert_eq!(Squawk::parse("0477").unwrap().0, 0o0477);
        assert!(Squawk::parse("1280").is_err());
        assert!(Squawk::parse("12").is_err());
        assert!(Squawk::parse_bank("04").is_ok());
    }

    #[test]
    fn spc_codes() {
        assert_eq!(spc_for_code(Squawk(0o7700)), Some("EM"));
        assert_eq!(spc_for_code(Squawk(0o7500)), Some("HJ"));
        assert!(Squawk(0o7600).is_spc());
        assert!(!Squawk::VFR.is_spc());
        assert!(is_standard_spc("RF"));
        assert!(!is_standard_spc("ZZ"));
    }

    #[test]
    fn cwt_matrix() {
        // Super leader requires 8 NM behind for lights
        assert!((cwt_approach_separation("A", "I") - 8.0).abs() < 1e-9);
        // D behind D has no CWT minimum; facility minimum governs
        assert!((cwt_approach_separation("D", "D")).abs() < 1e-9);
        assert!((cwt_approach_separation("?", "D")).abs() < 1e-9);
    }
}
