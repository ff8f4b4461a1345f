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

//! Fire-and-forget command surface to the simulator.
//!
//! The scope issues commands and displays any synchronous rejection; it keeps
//! no pending-RPC state. Hosts implement [`SimConnection`] over whatever
//! transport they have.

use thiserror::Error;

use crate::aviation::Squawk;
use crate::world::{Acid, CardinalOrdinal, FlightPlan, Tcp};

/// Errors a simulator may return for a command.
///
/// The scope remaps these onto its closed display-code set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("no matching flight")]
    NoMatchingFlight,
    #[error("duplicate ACID")]
    DuplicateAcid,
    #[error("duplicate beacon code")]
    DuplicateBeacon,
    #[error("beacon code mismatch")]
    BeaconMismatch,
    #[error("illegal ACID")]
    IllegalAcid,
    #[error("aircraft type not adapted")]
    IllegalAcType,
    #[error("illegal beacon code")]
    IllegalBeaconCode,
    #[error("illegal scratchpad")]
    IllegalScratchpad,
    #[error("illegal function")]
    IllegalFunction,
    #[error("track is active")]
    TrackIsActive,
    #[error("track is not active")]
    TrackIsNotActive,
    #[error("track is being handed off")]
    TrackIsBeingHandedOff,
    #[error("not being handed off to this position")]
    NotBeingHandedOffToMe,
    #[error("not pointed out to this position")]
    NotPointedOutToMe,
    #[error("not pointed out by this position")]
    NotPointedOutByMe,
    #[error("another controller owns the track")]
    OtherControllerHasTrack,
    #[error("unknown controller")]
    UnknownController,
    #[error("unknown aircraft type")]
    UnknownAircraftType,
    #[error("invalid altitude")]
    InvalidAltitude,
    #[error("invalid command syntax")]
    InvalidCommandSyntax,
    #[error("no more list indices")]
    NoMoreListIndices,
    #[error("aircraft already released")]
    AircraftAlreadyReleased,
    #[error("no more beacon codes available")]
    NoMoreAvailableSquawkCodes,
}

/// Partial flight-plan amendment; unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct FlightPlanSpecifier {
    pub acid: Option<Acid>,
    pub squawk: Option<Squawk>,
    pub squawk_automatic: bool,
    pub scratchpad: Option<String>,
    pub secondary_scratchpad: Option<String>,
    pub aircraft_type: Option<String>,
    pub requested_altitude: Option<i32>,
    pub pilot_reported_altitude: Option<i32>,
    pub rules_vfr: Option<bool>,
    pub tracking_controller: Option<Tcp>,
    pub global_leader_line_direction: Option<Option<CardinalOrdinal>>,
    pub disable_ca: Option<bool>,
    pub disable_msaw: Option<bool>,
    pub mci_suppressed_code: Option<Squawk>,
    pub quick_flight_plan: bool,
}

/// Commands the scope issues to the simulator.
///
/// All methods apply immediately or return a [`SimError`]; the scope displays
/// the remapped code and never retries.
pub trait SimConnection {
    fn initiate_track(&mut self, acid: &str, callsign: &str) -> Result<(), SimError>;
    fn drop_track(&mut self, acid: &str) -> Result<(), SimError>;
    fn accept_handoff(&mut self, acid: &str) -> Result<(), SimError>;
    fn handoff_track(&mut self, acid: &str, to: &str) -> Result<(), SimError>;
    fn cancel_handoff(&mut self, acid: &str) -> Result<(), SimError>;
    fn redirect_handoff(&mut self, acid: &str, to: &str) -> Result<(), SimError>;
    fn accept_redirected_handoff(&mut self, acid: &str) -> Result<(), SimError>;
    fn point_out(&mut self, acid: &str, to: &str) -> Result<(), SimError>;
    fn acknowledge_point_out(&mut self, acid: &str) -> Result<(), SimError>;
    fn recall_point_out(&mut self, acid: &str) -> Result<(), SimError>;
    fn reject_point_out(&mut self, acid: &str) -> Result<(), SimError>;
    fn force_ql(&mut self, acid: &str, to: &str) -> Result<(), SimError>;
    fn set_global_leader_line(
        &mut self,
        acid: &str,
        dir: Option<CardinalOrdinal>,
    ) -> Result<(), SimError>;
    fn set_temporary_altitude(&mut self, acid: &str, alt: i32) -> Result<(), SimError>;
    fn toggle_spc_override(&mut self, acid: &str, spc: &str) -> Result<(), SimError>;
    fn create_flight_plan(&mut self, spec: FlightPlanSpecifier) -> Result<FlightPlan, SimError>;
    fn modify_flight_plan(
        &mut self,
        acid: &str,
        spec: FlightPlanSpecifier,
    ) -> Result<FlightPlan, SimError>;
    fn delete_flight_plan(&mut self, acid: &str) -> Result<(), SimError>;
    fn associate_flight_plan(&mut self, callsign: &str, acid: &str) -> Result<(), SimError>;
    fn activate_flight_plan(
        &mut self,
        callsign: &str,
        acid: &str,
        spec: Option<FlightPlanSpecifier>,
    ) -> Result<(), SimError>;
}
