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

//! Look-up rules shared by the command handlers: aircraft, controllers,
//! beacon codes, scratchpads, and quick-look positions.

use sim_state::{CardinalOrdinal, Controller, Squawk, Track, World};

use crate::datablock::TRIANGLE;
use crate::errors::ScopeError;
use crate::prefs::QuickLookPosition;

/// Scratchpad contents that can never be entered.
const RESERVED_SCRATCHPADS: [&str; 6] = ["NAT", "CST", "AMB", "RDR", "ADB", "XXX"];

/// Numpad digit to leader direction. With `flip` set the keypad reads in
/// phone layout, so the top and bottom rows swap; `5` stays reserved.
#[must_use]
pub fn numpad_direction(c: char, flip: bool) -> Option<CardinalOrdinal> {
    let dir = CardinalOrdinal::from_numpad(c)?;
    if !flip {
        return Some(dir);
    }
    Some(match dir {
        CardinalOrdinal::North => CardinalOrdinal::South,
        CardinalOrdinal::NorthEast => CardinalOrdinal::SouthEast,
        CardinalOrdinal::SouthEast => CardinalOrdinal::NorthEast,
        CardinalOrdinal::South => CardinalOrdinal::North,
        CardinalOrdinal::SouthWest => CardinalOrdinal::NorthWest,
        CardinalOrdinal::NorthWest => CardinalOrdinal::SouthWest,
        d @ (CardinalOrdinal::East | CardinalOrdinal::West) => d,
    })
}

/// Find a track by ADSB callsign, ACID, 4-digit octal squawk, or numeric
/// TAB list index, in that order.
pub fn find_track<'a>(world: &'a World, s: &str) -> Result<&'a Track, ScopeError> {
    if let Some(trk) = world.tracks.get(s) {
        return Ok(trk);
    }
    if let Some(trk) = world
        .tracks
        .values()
        .find(|trk| trk.flight_plan.as_ref().is_some_and(|fp| fp.acid == s))
    {
        return Ok(trk);
    }

    if s.len() == 4 {
        if let Ok(code) = Squawk::parse(s) {
            let mut matches = world.tracks.values().filter(|trk| trk.squawk == code);
            if let Some(trk) = matches.next() {
                if matches.next().is_some() {
                    return Err(ScopeError::AmbiguousAcid);
                }
                return Ok(trk);
            }
        }
    }

    Err(ScopeError::NoTrack)
}

/// Find a flight plan by ACID, squawk, or TAB list index; searches both
/// associated and unassociated plans.
pub fn find_acid(world: &World, s: &str) -> Result<String, ScopeError> {
    if let Some(trk) = world
        .tracks
        .values()
        .find(|trk| trk.flight_plan.as_ref().is_some_and(|fp| fp.acid == s))
    {
        return trk
            .flight_plan
            .as_ref()
            .map(|fp| fp.acid.clone())
            .ok_or(ScopeError::NoFlight);
    }
    if let Some(fp) = world.unassociated_plan(s) {
        return Ok(fp.acid.clone());
    }

    if s.len() == 4 {
        if let Ok(code) = Squawk::parse(s) {
            let mut matches = world
                .tracks
                .values()
                .filter_map(|trk| trk.flight_plan.as_ref())
                .filter(|fp| fp.assigned_squawk == code);
            if let Some(fp) = matches.next() {
                if matches.next().is_some() {
                    return Err(ScopeError::AmbiguousAcid);
                }
                return Ok(fp.acid.clone());
            }
        }
    }

    if let Ok(index) = s.parse::<i32>() {
        if let Some(fp) = world
            .unassociated_flight_plans
            .iter()
            .find(|fp| fp.list_index == Some(index))
        {
            return Ok(fp.acid.clone());
        }
    }

    Err(ScopeError::NoFlight)
}

/// Resolve a controller id.
///
/// A leading triangle means "by facility identifier". A single character
/// resolves within the user's facility (matching the last character of a
/// same-facility TCP); two characters match a TCP exactly; anything left
/// falls through to ERAM facilities.
pub fn find_controller<'a>(
    world: &'a World,
    user_tcp: &str,
    s: &str,
) -> Result<&'a Controller, ScopeError> {
    if s.is_empty() {
        return Err(ScopeError::IllegalPosition);
    }

    if let Some(rest) = s.strip_prefix(TRIANGLE) {
        return world
            .controllers
            .values()
            .find(|c| c.facility_identifier == rest)
            .ok_or(ScopeError::IllegalPosition);
    }

    let user_facility = world
        .controllers
        .get(user_tcp)
        .map(|c| c.facility_identifier.clone())
        .unwrap_or_default();

    if s.chars().count() == 1 {
        return world
            .controllers
            .values()
            .filter(|c| c.facility_identifier == user_facility && !c.eram_facility)
            .find(|c| c.tcp.ends_with(s))
            .ok_or(ScopeError::IllegalPosition);
    }

    if let Some(ctrl) = world.controllers.get(s) {
        return Ok(ctrl);
    }
    world
        .controllers
        .values()
        .find(|c| c.eram_facility && c.tcp == s)
        .ok_or(ScopeError::IllegalPosition)
}

/// Validate a 2-digit bank or 4-digit beacon code.
pub fn parse_beacon(s: &str) -> Result<Squawk, ScopeError> {
    match s.len() {
        2 => Squawk::parse_bank(s).map_err(|_| ScopeError::IllegalCode),
        4 => Squawk::parse(s).map_err(|_| ScopeError::IllegalCode),
        _ => Err(ScopeError::IllegalCode),
    }
}

fn scratchpad_char_ok(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '/' | '*') || c == TRIANGLE
}

/// Validate scratchpad contents.
///
/// Only `A-Z 0-9 . / *` and the triangle are allowed; a primary scratchpad
/// cannot be 3 digits or duplicate a TCP id; the first three characters
/// cannot spell a reserved word; 4 characters require facility adaptation.
pub fn validate_scratchpad(
    world: &World,
    s: &str,
    primary: bool,
) -> Result<(), ScopeError> {
    let max = if world.facility_adaptation.allow_long_scratchpad {
        4
    } else {
        3
    };
    if s.chars().count() > max || !s.chars().all(scratchpad_char_ok) {
        return Err(ScopeError::IllegalScratchpad);
    }
    if primary {
        if s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ScopeError::IllegalScratchpad);
        }
        if world.controllers.contains_key(s) {
            return Err(ScopeError::IllegalScratchpad);
        }
    }
    let head: String = s.chars().take(3).collect();
    if RESERVED_SCRATCHPADS.contains(&head.as_str()) {
        return Err(ScopeError::IllegalScratchpad);
    }
    Ok(())
}

/// Parse a quick-look position entry, e.g. `1J` or `4P+`.
pub fn parse_quick_look(
    world: &World,
    user_tcp: &str,
    s: &str,
) -> Result<QuickLookPosition, ScopeError> {
    let (id, plus) = match s.strip_suffix('+') {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    let ctrl = find_controller(world, user_tcp, id)?;
    if ctrl.tcp == user_tcp {
        return Err(ScopeError::IllegalPosition);
    }
    Ok(QuickLookPosition {
        id: ctrl.tcp.clone(),
        plus,
    })
}
