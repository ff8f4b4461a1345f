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

//! The per-frame world snapshot the host hands to the scope: controllers,
//! tracks with nested flight plans, airports, radar sites, MVA polygons, and
//! facility adaptation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aviation::{FlightRules, Squawk, TransponderMode, TypeOfFlight};
use crate::math::{point_in_polygon, LatLong};

/// Terminal control position identifier (what the operator signs on as).
pub type Tcp = String;
/// Flight-plan aircraft identifier.
pub type Acid = String;
/// Surveillance-derived callsign; always present for a live track.
pub type AdsbCallsign = String;

/// A signed-on control position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub callsign: String,
    pub tcp: Tcp,
    /// Single-character facility id; empty for the user's own facility.
    pub facility_identifier: String,
    pub eram_facility: bool,
    pub position: Option<LatLong>,
    pub default_airport: String,
}

impl Controller {
    /// Display id: facility identifier prefix plus TCP.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}{}", self.facility_identifier, self.tcp)
    }
}

/// Redirected-handoff bookkeeping on a flight plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectedHandoff {
    pub redirected_to: Tcp,
    pub original_owner: Tcp,
    /// Ordered list of controllers the handoff has passed through.
    pub redirectors: Vec<Tcp>,
}

impl RedirectedHandoff {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.redirected_to.is_empty()
    }

    #[must_use]
    pub fn last_redirector(&self) -> Option<&Tcp> {
        self.redirectors.last()
    }
}

/// A STARS flight plan, attached to a track (associated) or floating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub acid: Acid,
    pub assigned_squawk: Squawk,
    pub tracking_controller: Tcp,
    pub controlling_controller: Tcp,
    pub handoff_track_controller: Tcp,
    pub redirected_handoff: RedirectedHandoff,
    pub scratchpad: String,
    pub secondary_scratchpad: String,
    pub aircraft_type: String,
    pub cwt_category: String,
    pub rules: FlightRules,
    pub type_of_flight: TypeOfFlight,
    pub entry_fix: String,
    pub exit_fix: String,
    pub requested_altitude: i32,
    pub assigned_altitude: i32,
    pub temp_altitude: i32,
    pub pilot_reported_altitude: i32,
    pub disable_ca: bool,
    pub disable_msaw: bool,
    pub inhibit_mode_c_altitude_display: bool,
    /// Two-letter SPC id forced onto the datablock by the controller.
    pub spc_override: String,
    pub mci_suppressed_code: Squawk,
    pub suspended: bool,
    pub coast_suspend_index: i32,
    pub global_leader_line_direction: Option<CardinalOrdinal>,
    pub rnav: bool,
    pub hold_state: bool,
    pub quick_flight_plan: bool,
    pub rnav_equipped_suffix: String,
    /// TAB-list index assigned at creation, if any.
    pub list_index: Option<i32>,
    /// Airport the plan is working, for tower and coordination lists.
    pub airport: String,
}

/// Eight leader-line directions; numpad 8 is north.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardinalOrdinal {
    #[default]
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CardinalOrdinal {
    /// Numpad digit to direction; `5` is reserved for "clear override".
    #[must_use]
    pub fn from_numpad(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::SouthWest),
            '2' => Some(Self::South),
            '3' => Some(Self::SouthEast),
            '4' => Some(Self::West),
            '6' => Some(Self::East),
            '7' => Some(Self::NorthWest),
            '8' => Some(Self::North),
            '9' => Some(Self::NorthEast),
            _ => None,
        }
    }

    /// Unit offset in screen-style coordinates (y up).
    #[must_use]
    pub fn vector(self) -> [f64; 2] {
        let d = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            Self::North => [0.0, 1.0],
            Self::NorthEast => [d, d],
            Self::East => [1.0, 0.0],
            Self::SouthEast => [d, -d],
            Self::South => [0.0, -1.0],
            Self::SouthWest => [-d, -d],
            Self::West => [-1.0, 0.0],
            Self::NorthWest => [-d, d],
        }
    }
}

/// One surveillance observation delivered in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub adsb_callsign: AdsbCallsign,
    pub location: LatLong,
    /// Pressure altitude in feet; valid only in mode C.
    pub transponder_altitude: i32,
    pub groundspeed: f64,
    pub true_heading: f64,
    pub squawk: Squawk,
    pub ident: bool,
    pub mode: TransponderMode,
    /// Fused tracks carry no usable transponder altitude.
    pub missing_altitude: bool,
    pub flight_plan: Option<FlightPlan>,
    /// Plan-only track with no surveillance support.
    pub unsupported_db: bool,
    /// Tentative (single-sensor, unconfirmed) track.
    pub tentative: bool,
}

impl Track {
    #[must_use]
    pub fn is_associated(&self) -> bool {
        self.flight_plan.is_some()
    }

    #[must_use]
    pub fn is_unassociated(&self) -> bool {
        self.flight_plan.is_none()
    }

    /// Altitude for separation and filter math: pilot-reported when present,
    /// else the transponder altitude.
    #[must_use]
    pub fn separation_altitude(&self) -> i32 {
        match &self.flight_plan {
            Some(fp) if fp.pilot_reported_altitude != 0 => fp.pilot_reported_altitude,
            _ => self.transponder_altitude,
        }
    }
}

/// CRDA-projected ghost of a track on the paired runway centerline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhostTrack {
    pub adsb_callsign: AdsbCallsign,
    pub position: LatLong,
    pub groundspeed: f64,
    pub true_heading: f64,
    /// Index of the CRDA runway pair that produced this ghost.
    pub runway_pair_index: usize,
}

/// ATPA approach volume anchored at a runway threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtpaVolume {
    pub id: String,
    pub runway: String,
    pub threshold: LatLong,
    /// True heading of the final approach course, toward the threshold.
    pub heading: f64,
    pub max_heading_deviation: f64,
    pub floor: i32,
    pub ceiling: i32,
    /// Volume length along the final in NM.
    pub length: f64,
    /// Lateral half-width in NM.
    pub width: f64,
    /// Scratchpads monitored but never warned or alerted.
    pub filtered_scratchpads: Vec<String>,
    /// Scratchpads excluded from the volume entirely.
    pub excluded_scratchpads: Vec<String>,
    pub enable_25nm_approach: bool,
    pub dist_25nm_approach: f64,
}

impl AtpaVolume {
    /// Is the track inside the volume and tracking the final course?
    #[must_use]
    pub fn inside(&self, p: LatLong, alt: i32, hdg: f64, nm_per_longitude: f64) -> bool {
        if alt < self.floor || alt > self.ceiling {
            return false;
        }
        if crate::math::heading_difference(hdg, self.heading) > self.max_heading_deviation {
            return false;
        }
        let d = p.distance_nm(self.threshold, nm_per_longitude);
        if d > self.length {
            return false;
        }
        self.centerline_offset(p, nm_per_longitude).abs() <= self.width
    }

    /// Signed lateral offset from the extended centerline in NM.
    #[must_use]
    pub fn centerline_offset(&self, p: LatLong, nm_per_longitude: f64) -> f64 {
        let t = self.threshold.to_nm(nm_per_longitude);
        let q = p.to_nm(nm_per_longitude);
        // Perpendicular to the final approach course
        let dir = crate::math::heading_vector(self.heading);
        (q[0] - t[0]) * dir[1] - (q[1] - t[1]) * dir[0]
    }

    /// On-centerline test for the 2.5 NM reduced minimum.
    #[must_use]
    pub fn on_extended_centerline(&self, p: LatLong, max_offset: f64, nm_per_longitude: f64) -> bool {
        self.centerline_offset(p, nm_per_longitude).abs() <= max_offset
    }
}

/// Minimum vectoring altitude polygon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mva {
    /// Minimum limit in feet.
    pub minimum_limit: i32,
    pub exterior: Vec<LatLong>,
}

impl Mva {
    #[must_use]
    pub fn inside(&self, p: LatLong) -> bool {
        point_in_polygon(p, &self.exterior)
    }
}

/// A floor/ceiling-bounded polygonal volume (CA inhibit areas).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirspaceVolume {
    pub id: String,
    pub floor: i32,
    pub ceiling: i32,
    pub polygon: Vec<LatLong>,
}

impl AirspaceVolume {
    #[must_use]
    pub fn inside(&self, p: LatLong, alt: i32) -> bool {
        alt >= self.floor && alt <= self.ceiling && point_in_polygon(p, &self.polygon)
    }
}

/// A radar site available from the site menu.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadarSite {
    pub char_id: String,
    pub position: LatLong,
    pub primary_range: i32,
    pub secondary_range: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String,
    pub location: LatLong,
    /// 1-based tower list slot, 0 if not on a tower list.
    pub tower_list_index: usize,
    pub omit_arrival_scratchpad: bool,
    pub atpa_volumes: Vec<AtpaVolume>,
}

/// ARTCC airspace-awareness handoff rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirspaceAwareness {
    pub fixes: Vec<String>,
    pub altitude_range: [i32; 2],
    pub receiving_controller: Tcp,
    pub aircraft_engine_types: Vec<String>,
}

/// An adapted coordination list definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinationList {
    pub name: String,
    pub id: String,
    pub airports: Vec<String>,
    pub yellow_entries: bool,
}

/// A displayed restriction area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestrictionArea {
    pub title: String,
    pub text: [String; 2],
    pub position: LatLong,
    pub hidden: bool,
}

/// Partial-datablock adaptation sub-options.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PdbAdaptation {
    pub show_scratchpad2: bool,
    pub hide_groundspeed: bool,
    pub show_aircraft_type: bool,
    pub split_gs_and_cwt: bool,
}

/// Full-datablock adaptation sub-options.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FdbAdaptation {
    /// Place assigned altitude and secondary scratchpad on line 3.
    pub scratchpad2_on_line3: bool,
}

/// Scratchpad-1 fallback content when the plan carries no scratchpad.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Scratchpad1Adaptation {
    pub display_exit_fix: bool,
    pub display_exit_fix1: bool,
    pub display_exit_gate: bool,
    pub display_alt_exit_gate: bool,
}

/// Facility adaptation: site-specific behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityAdaptation {
    pub allow_long_scratchpad: bool,
    pub keep_ldb: bool,
    pub full_ldb_seconds: i64,
    pub beacon_code_display_seconds: i64,
    pub handoff_accept_flash_seconds: i64,
    pub ho_sector_display_seconds: i64,
    pub pdb: PdbAdaptation,
    pub fdb: FdbAdaptation,
    pub scratchpad1: Scratchpad1Adaptation,
    /// Adapted (non-standard) special-purpose code ids.
    pub custom_spcs: Vec<String>,
    pub coordination_lists: Vec<CoordinationList>,
    pub airspace_awareness: Vec<AirspaceAwareness>,
    pub inhibit_ca_volumes: Vec<AirspaceVolume>,
    pub video_map_names: Vec<String>,
}

impl Default for FacilityAdaptation {
    fn default() -> Self {
        Self {
            allow_long_scratchpad: false,
            keep_ldb: false,
            full_ldb_seconds: 5,
            beacon_code_display_seconds: 15,
            handoff_accept_flash_seconds: 5,
            ho_sector_display_seconds: 8,
            pdb: PdbAdaptation::default(),
            fdb: FdbAdaptation::default(),
            scratchpad1: Scratchpad1Adaptation::default(),
            custom_spcs: Vec::new(),
            coordination_lists: Vec::new(),
            airspace_awareness: Vec::new(),
            inhibit_ca_volumes: Vec::new(),
            video_map_names: Vec::new(),
        }
    }
}

/// Snapshot of the simulator world, rebuilt by the host every frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub controllers: HashMap<Tcp, Controller>,
    pub tracks: HashMap<AdsbCallsign, Track>,
    pub unassociated_flight_plans: Vec<FlightPlan>,
    pub airports: HashMap<String, Airport>,
    pub arrival_airports: Vec<String>,
    pub radar_sites: HashMap<String, RadarSite>,
    pub mvas: Vec<Mva>,
    pub restriction_areas: Vec<RestrictionArea>,
    pub metar: HashMap<String, String>,
    pub altimeters: HashMap<String, f64>,
    pub facility_adaptation: FacilityAdaptation,
    /// NM per degree of longitude at this scenario's latitude.
    pub nm_per_longitude: f64,
    pub magnetic_variation: f64,
    pub sim_time: DateTime<Utc>,
    /// True when the multi-sensor fused tracker is selected.
    pub fused_radar_mode: bool,
}

impl World {
    /// Look up an associated track by flight-plan ACID.
    #[must_use]
    pub fn track_by_acid(&self, acid: &str) -> Option<&Track> {
        self.tracks
            .values()
            .find(|t| t.flight_plan.as_ref().is_some_and(|fp| fp.acid == acid))
    }

    /// Look up a floating flight plan by ACID.
    #[must_use]
    pub fn unassociated_plan(&self, acid: &str) -> Option<&FlightPlan> {
        self.unassociated_flight_plans.iter().find(|fp| fp.acid == acid)
    }
}
