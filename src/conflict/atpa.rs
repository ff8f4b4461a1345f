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

//! ATPA: in-trail separation monitoring on final approach.
//!
//! Tracks inside each approach volume are ordered by distance to the
//! threshold; adjacent pairs get a CWT-derived minimum and a 45 second
//! forward model at 1 Hz with the trailing aircraft decelerating toward its
//! landing speed inside 5 NM.

use sim_state::{cwt_approach_separation, AtpaVolume, Track, World};

use super::LATERAL_MINIMUM;
use crate::track::{AtpaStatus, TrackTable};

/// Forward-model horizon in seconds
const MODEL_SECONDS: usize = 45;
/// Projected losses inside this many seconds alert rather than warn
const ALERT_SECONDS: usize = 24;
/// Reduced separation on 2.5 NM approaches
const REDUCED_MINIMUM: f64 = 2.5;
/// Default landing speed for the deceleration model, knots
const LANDING_SPEED: f64 = 120.0;
/// Lateral tolerance for the extended-centerline test, NM
const CENTERLINE_TOLERANCE: f64 = 0.2;

/// Constant-course point-mass model used for the in-trail projection.
#[derive(Debug, Clone, Copy)]
struct ModeledAircraft {
    position: [f64; 2],
    groundspeed: f64,
    /// Unit direction of travel in NM coordinates.
    direction: [f64; 2],
    threshold: [f64; 2],
}

impl ModeledAircraft {
    fn new(trk: &Track, vol: &AtpaVolume, nm_per_longitude: f64) -> Self {
        let position = trk.location.to_nm(nm_per_longitude);
        let threshold = vol.threshold.to_nm(nm_per_longitude);
        let dx = threshold[0] - position[0];
        let dy = threshold[1] - position[1];
        let len = (dx * dx + dy * dy).sqrt().max(1e-6);
        Self {
            position,
            groundspeed: trk.groundspeed,
            direction: [dx / len, dy / len],
            threshold,
        }
    }

    fn distance_to_threshold(&self) -> f64 {
        let dx = self.threshold[0] - self.position[0];
        let dy = self.threshold[1] - self.position[1];
        (dx * dx + dy * dy).sqrt()
    }

    /// Advance one second, decelerating linearly toward the landing speed
    /// between 5 and 2 NM from the threshold.
    fn step(&mut self) {
        let d = self.distance_to_threshold();
        let gs = if d >= 5.0 {
            self.groundspeed
        } else if d <= 2.0 {
            LANDING_SPEED.min(self.groundspeed)
        } else {
            let t = (5.0 - d) / 3.0;
            self.groundspeed + t * (LANDING_SPEED.min(self.groundspeed) - self.groundspeed)
        };
        let nm = gs / 3600.0;
        self.position[0] += nm * self.direction[0];
        self.position[1] += nm * self.direction[1];
    }

    fn distance_to(&self, other: &ModeledAircraft) -> f64 {
        let dx = self.position[0] - other.position[0];
        let dy = self.position[1] - other.position[1];
        (dx * dx + dy * dy).sqrt()
    }
}

fn scratchpad_matches(trk: &Track, list: &[String]) -> bool {
    trk.flight_plan.as_ref().is_some_and(|fp| {
        list.iter()
            .any(|sp| *sp == fp.scratchpad || *sp == fp.secondary_scratchpad)
    })
}

/// Recompute ATPA state for every volume. Per-track ATPA fields are zeroed
/// first; aircraft in no volume end the tick Unset. Monitoring always runs;
/// the cone and in-trail display preferences only gate what gets drawn.
pub fn update_atpa(table: &mut TrackTable, world: &World) {
    for state in table.states.values_mut() {
        state.intrail_distance = 0.0;
        state.minimum_mit = 0.0;
        state.atpa_status = AtpaStatus::Unset;
        state.atpa_lead_callsign = None;
    }
    let nm = world.nm_per_longitude;
    for volume in world.airports.values().flat_map(|ap| &ap.atpa_volumes) {
        let mut inside: Vec<&Track> = world
            .tracks
            .values()
            .filter(|t| t.is_associated())
            .filter(|t| !scratchpad_matches(t, &volume.excluded_scratchpads))
            .filter(|t| {
                let hdg = table
                    .state(&t.adsb_callsign)
                    .and_then(|s| s.heading(nm))
                    .unwrap_or(t.true_heading);
                volume.inside(t.location, t.separation_altitude(), hdg, nm)
            })
            .collect();
        inside.sort_by(|a, b| {
            let da = a.location.distance_nm(volume.threshold, nm);
            let db = b.location.distance_nm(volume.threshold, nm);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

        for pair in inside.windows(2) {
            let (front, back) = (pair[0], pair[1]);
            let in_trail = front.location.distance_nm(back.location, nm);

            let front_cwt = front.flight_plan.as_ref().map_or("", |fp| &fp.cwt_category);
            let back_cwt = back.flight_plan.as_ref().map_or("", |fp| &fp.cwt_category);
            let cwt = cwt_approach_separation(front_cwt, back_cwt);
            let mut minimum = if cwt > 0.0 { cwt } else { LATERAL_MINIMUM };
            if minimum <= LATERAL_MINIMUM
                && volume.enable_25nm_approach
                && front.location.distance_nm(volume.threshold, nm) < volume.dist_25nm_approach
                && volume.on_extended_centerline(front.location, CENTERLINE_TOLERANCE, nm)
                && volume.on_extended_centerline(back.location, CENTERLINE_TOLERANCE, nm)
            {
                minimum = REDUCED_MINIMUM;
            }

            let status = if scratchpad_matches(back, &volume.filtered_scratchpads) {
                // Filtered aircraft are monitored but never warned or alerted
                AtpaStatus::Monitor
            } else {
                project_status(front, back, volume, minimum, nm)
            };

            if let Some(state) = table.states.get_mut(&back.adsb_callsign) {
                state.intrail_distance = in_trail;
                state.minimum_mit = minimum;
                state.atpa_status = status;
                state.atpa_lead_callsign = Some(front.adsb_callsign.clone());
            }
        }

        // The leader of the string is monitored with no pair data
        if let Some(front) = inside.first() {
            if let Some(state) = table.states.get_mut(&front.adsb_callsign) {
                if state.atpa_status == AtpaStatus::Unset {
                    state.atpa_status = AtpaStatus::Monitor;
                }
            }
        }
    }
}

fn project_status(
    front: &Track,
    back: &Track,
    volume: &AtpaVolume,
    minimum: f64,
    nm_per_longitude: f64,
) -> AtpaStatus {
    let mut lead = ModeledAircraft::new(front, volume, nm_per_longitude);
    let mut trail = ModeledAircraft::new(back, volume, nm_per_longitude);
    for second in 1..=MODEL_SECONDS {
        lead.step();
        trail.step();
        if trail.distance_to(&lead) < minimum {
            return if second <= ALERT_SECONDS {
                AtpaStatus::Alert
            } else {
                AtpaStatus::Warning
            };
        }
    }
    AtpaStatus::Monitor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sim_state::{Airport, FlightPlan, LatLong, TransponderMode};

    use crate::prefs::Preferences;

    fn volume() -> AtpaVolume {
        AtpaVolume {
            id: "JFK31R".to_string(),
            runway: "31R".to_string(),
            threshold: LatLong::new(-73.0, 40.0),
            heading: 310.0,
            max_heading_deviation: 90.0,
            floor: 0,
            ceiling: 15000,
            length: 20.0,
            width: 2.0,
            enable_25nm_approach: true,
            dist_25nm_approach: 10.0,
            ..Default::default()
        }
    }

    fn arrival(cs: &str, dist: f64, gs: f64, cwt: &str, vol: &AtpaVolume, nm: f64) -> Track {
        Track {
            adsb_callsign: cs.to_string(),
            location: vol.threshold.offset(130.0, dist, nm),
            transponder_altitude: 3000,
            groundspeed: gs,
            true_heading: 310.0,
            mode: TransponderMode::Altitude,
            flight_plan: Some(FlightPlan {
                acid: cs.to_string(),
                cwt_category: cwt.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn seed_world(trailing_gap: f64, trailing_gs: f64) -> (World, AtpaVolume) {
        let vol = volume();
        let nm = 46.0;
        let mut world = World {
            sim_time: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            nm_per_longitude: nm,
            fused_radar_mode: true,
            ..Default::default()
        };
        world.airports.insert(
            "KJFK".to_string(),
            Airport {
                icao: "KJFK".to_string(),
                location: vol.threshold,
                atpa_volumes: vec![vol.clone()],
                ..Default::default()
            },
        );
        world.tracks.insert(
            "LEAD".to_string(),
            arrival("LEAD", 6.0, 140.0, "D", &vol, nm),
        );
        world.tracks.insert(
            "TRAIL".to_string(),
            arrival("TRAIL", 6.0 + trailing_gap, trailing_gs, "D", &vol, nm),
        );
        (world, vol)
    }

    #[test]
    fn overtaking_trailer_gets_warning() {
        // Lead at 6 NM and 140 kt, trailer 2.8 NM behind at 170 kt, 2.5 NM
        // reduced minimum in effect. The 30 kt overtake plus the lead's
        // deceleration inside 5 NM drops the gap below 2.5 NM between 25 and
        // 45 seconds out.
        let (world, _) = seed_world(2.8, 170.0);
        let mut table = TrackTable::new();
        table.update_tracks(&world, &Preferences::default());
        update_atpa(&mut table, &world);

        let state = table.states.get("TRAIL").unwrap();
        assert_eq!(state.atpa_status, AtpaStatus::Warning);
        assert!((state.minimum_mit - 2.5).abs() < 1e-9);
        assert_eq!(state.atpa_lead_callsign.as_deref(), Some("LEAD"));
        assert!((state.intrail_distance - 2.8).abs() < 0.05);

        let lead = table.states.get("LEAD").unwrap();
        assert_eq!(lead.atpa_status, AtpaStatus::Monitor);
    }

    #[test]
    fn tight_pair_alerts() {
        let (world, _) = seed_world(2.6, 180.0);
        let mut table = TrackTable::new();
        table.update_tracks(&world, &Preferences::default());
        update_atpa(&mut table, &world);
        assert_eq!(
            table.states.get("TRAIL").unwrap().atpa_status,
            AtpaStatus::Alert
        );
    }

    #[test]
    fn stable_spacing_monitors() {
        let (world, _) = seed_world(4.0, 140.0);
        let mut table = TrackTable::new();
        table.update_tracks(&world, &Preferences::default());
        update_atpa(&mut table, &world);
        assert_eq!(
            table.states.get("TRAIL").unwrap().atpa_status,
            AtpaStatus::Monitor
        );
    }

    #[test]
    fn excluded_scratchpad_skips_volume() {
        let (mut world, mut vol) = seed_world(3.5, 170.0);
        vol.excluded_scratchpads = vec!["VIS".to_string()];
        world.airports.get_mut("KJFK").unwrap().atpa_volumes = vec![vol];
        world
            .tracks
            .get_mut("TRAIL")
            .unwrap()
            .flight_plan
            .as_mut()
            .unwrap()
            .scratchpad = "VIS".to_string();
        let mut table = TrackTable::new();
        table.update_tracks(&world, &Preferences::default());
        update_atpa(&mut table, &world);
        assert_eq!(
            table.states.get("TRAIL").unwrap().atpa_status,
            AtpaStatus::Unset
        );
    }

    #[test]
    fn filtered_scratchpad_monitors_without_warnings() {
        let (mut world, mut vol) = seed_world(3.5, 170.0);
        vol.filtered_scratchpads = vec!["RNV".to_string()];
        world.airports.get_mut("KJFK").unwrap().atpa_volumes = vec![vol];
        world
            .tracks
            .get_mut("TRAIL")
            .unwrap()
            .flight_plan
            .as_mut()
            .unwrap()
            .scratchpad = "RNV".to_string();
        let mut table = TrackTable::new();
        table.update_tracks(&world, &Preferences::default());
        update_atpa(&mut table, &world);
        let state = table.states.get("TRAIL").unwrap();
        assert_eq!(state.atpa_status, AtpaStatus::Monitor);
        assert!(state.minimum_mit > 0.0);
        assert_eq!(state.atpa_lead_callsign.as_deref(), Some("LEAD"));
    }
}
