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

//! The closed set of operator-visible error codes and the remap from
//! simulator errors onto it.

use log::error;
use sim_state::SimError;
use thiserror::Error;

/// Operator-visible STARS error codes, rendered verbatim in the preview area.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    #[error("AMB ACID")]
    AmbiguousAcid,
    #[error("BCN MISMATCH")]
    BeaconMismatch,
    #[error("CAPACITY")]
    Capacity,
    #[error("CAPACITY - BCN")]
    CapacityBeacon,
    #[error("FORMAT")]
    CommandFormat,
    #[error("DUP NEW ID")]
    DuplicateAcid,
    #[error("DUP BCN")]
    DuplicateBeacon,
    #[error("DUP CMD")]
    DuplicateCommand,
    #[error("ILL ACID")]
    IllegalAcid,
    #[error("ACTYPE NOT ADAPTED")]
    IllegalAcType,
    #[error("ILL ATIS")]
    IllegalAtis,
    #[error("ILL AIRPORT")]
    IllegalAirport,
    #[error("ILL CODE")]
    IllegalCode,
    #[error("ILL COLOR")]
    IllegalColor,
    #[error("ILL FIX")]
    IllegalFix,
    #[error("ILL FLIGHT")]
    IllegalFlight,
    #[error("ILL FUNC")]
    IllegalFunction,
    #[error("ILL FUNC - ALERT ACTIVE")]
    IllegalFunctionAlertActive,
    #[error("ILL GEO ID")]
    IllegalGeoId,
    #[error("ILL GEO LOC")]
    IllegalGeoLoc,
    #[error("ILL LINE")]
    IllegalLine,
    #[error("ILL MAP")]
    IllegalMap,
    #[error("ILL PARAM")]
    IllegalParam,
    #[error("ILL POS")]
    IllegalPosition,
    #[error("ILL PREFSET")]
    IllegalPrefset,
    #[error("ILL RANGE")]
    IllegalRange,
    #[error("ILL REGION")]
    IllegalRegion,
    #[error("ILL RPC")]
    IllegalRpc, // CRDA runway pair config
    #[error("ILL RWY")]
    IllegalRunway,
    #[error("ILL SCR")]
    IllegalScratchpad,
    #[error("ILL SECTOR")]
    IllegalSector,
    #[error("ILL TEXT")]
    IllegalText,
    #[error("ILL TRK")]
    IllegalTrack,
    #[error("ILL VALUE")]
    IllegalValue,
    #[error("MULTIPLE FLIGHT")]
    MultipleFlight,
    #[error("NO FLIGHT")]
    NoFlight,
    #[error("NO TRK")]
    NoTrack,
    #[error("RANGE LIMIT")]
    RangeLimit,
}

impl ScopeError {
    /// Remap a simulator-level error onto the display-code set.
    ///
    /// Anything without a specific mapping degrades to `FORMAT` and is logged
    /// as a programmer error.
    #[must_use]
    pub fn from_sim(e: &SimError) -> Self {
        match e {
            SimError::NoMatchingFlight => Self::NoFlight,
            SimError::DuplicateAcid => Self::DuplicateAcid,
            SimError::DuplicateBeacon => Self::DuplicateBeacon,
            SimError::BeaconMismatch => Self::BeaconMismatch,
            SimError::IllegalAcid => Self::IllegalAcid,
            SimError::IllegalAcType => Self::IllegalAcType,
            SimError::IllegalBeaconCode => Self::IllegalCode,
            SimError::IllegalScratchpad => Self::IllegalScratchpad,
            SimError::IllegalFunction => Self::IllegalFunction,
            SimError::TrackIsActive
            | SimError::TrackIsNotActive
            | SimError::TrackIsBeingHandedOff
            | SimError::NotBeingHandedOffToMe
            | SimError::NotPointedOutToMe
            | SimError::NotPointedOutByMe
            | SimError::OtherControllerHasTrack => Self::IllegalTrack,
            SimError::UnknownController => Self::IllegalPosition,
            SimError::UnknownAircraftType => Self::IllegalParam,
            SimError::InvalidAltitude => Self::IllegalValue,
            SimError::InvalidCommandSyntax => {
                error!("{e}: unexpected syntax error from simulator");
                Self::CommandFormat
            }
            SimError::NoMoreListIndices => Self::Capacity,
            SimError::AircraftAlreadyReleased => Self::DuplicateCommand,
            SimError::NoMoreAvailableSquawkCodes => Self::CapacityBeacon,
        }
    }
}

impl From<SimError> for ScopeError {
    fn from(e: SimError) -> Self {
        Self::from_sim(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings_are_exact() {
        assert_eq!(ScopeError::CommandFormat.to_string(), "FORMAT");
        assert_eq!(ScopeError::IllegalScratchpad.to_string(), "ILL SCR");
        assert_eq!(ScopeError::CapacityBeacon.to_string(), "CAPACITY - BCN");
        assert_eq!(
            ScopeError::IllegalFunctionAlertActive.to_string(),
            "ILL FUNC - ALERT ACTIVE"
        );
        assert_eq!(ScopeError::DuplicateAcid.to_string(), "DUP NEW ID");
    }

    #[test]
    fn sim_error_remap() {
        assert_eq!(
            ScopeError::from_sim(&SimError::NoMatchingFlight),
            ScopeError::NoFlight
        );
        assert_eq!(
            ScopeError::from_sim(&SimError::OtherControllerHasTrack),
            ScopeError::IllegalTrack
        );
        assert_eq!(
            ScopeError::from_sim(&SimError::NoMoreAvailableSquawkCodes),
            ScopeError::CapacityBeacon
        );
    }
}
