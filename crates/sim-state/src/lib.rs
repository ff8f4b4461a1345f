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

//! Simulator-facing data model for the starscope radar display core.
//!
//! This library defines the contract between a host simulator and the scope:
//!
//! - **Math layer**: lat-long positions, NM projection, heading math,
//!   polygon containment
//! - **Aviation layer**: beacon codes, SPCs, flight rules, CWT categories
//! - **World layer**: per-frame snapshot types (tracks, flight plans,
//!   controllers, adaptation, volumes)
//! - **Event layer**: typed event stream applied in delivery order
//! - **Command layer**: fire-and-forget command trait plus the simulator
//!   error vocabulary
//!
//! The scope core (the `starscope` crate) consumes these types; hosts build
//! the snapshot and implement [`SimConnection`] over their transport.

pub mod aviation;
pub mod command;
pub mod events;
pub mod math;
pub mod world;

pub use aviation::{
    cwt_approach_separation, is_standard_spc, spc_for_code, FlightRules, Squawk, SquawkError,
    TransponderMode, TypeOfFlight,
};
pub use command::{FlightPlanSpecifier, SimConnection, SimError};
pub use events::{Event, EventKind};
pub use math::{
    heading_difference, heading_vector, normalize_heading, point_in_polygon, ray_intersection,
    LatLong, NM_PER_LATITUDE,
};
pub use world::{
    Acid, AdsbCallsign, Airport, AirspaceAwareness, AirspaceVolume, AtpaVolume, CardinalOrdinal,
    Controller, CoordinationList, FacilityAdaptation, FdbAdaptation, FlightPlan, GhostTrack, Mva,
    PdbAdaptation, RadarSite, RedirectedHandoff, RestrictionArea, Scratchpad1Adaptation, Tcp,
    Track, World,
};
