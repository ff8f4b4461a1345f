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

//! Conflict alert (associated pairs) and mode-C intruder (associated against
//! unassociated) detection.
//!
//! Pairs persist until the predicate fails or an endpoint vanishes; first
//! detection order is preserved for stable alert-list sorting.

use chrono::{DateTime, Duration, Utc};
use sim_state::{
    heading_difference, heading_vector, ray_intersection, AdsbCallsign, Track, TransponderMode,
    World,
};

use super::{
    ALERT_AUDIO_SECONDS, LATERAL_MINIMUM, MCI_LATERAL_MINIMUM, MCI_VERTICAL_MINIMUM,
    VERTICAL_MINIMUM,
};
use crate::draw::AudioAlert;
use crate::prefs::Preferences;
use crate::track::TrackTable;

/// Minimum heading difference for the diverging exemption, degrees
const DIVERGING_HEADING_DIFFERENCE: f64 = 15.0;

/// One detected CA or MCI pair.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub callsigns: [AdsbCallsign; 2],
    pub acknowledged: bool,
    /// Wall-clock first detection, for alert-list ordering.
    pub start: DateTime<Utc>,
    pub sound_end: DateTime<Utc>,
}

/// Are the two tracks diverging?
///
/// Intersect the heading rays in NM coordinates: no intersection means not
/// diverging; an intersection ahead of either aircraft means not diverging;
/// otherwise diverging iff the heading difference is at least 15 degrees.
#[must_use]
pub fn diverging(a: &Track, ha: f64, b: &Track, hb: f64, nm_per_longitude: f64) -> bool {
    let pa = a.location.to_nm(nm_per_longitude);
    let pb = b.location.to_nm(nm_per_longitude);
    match ray_intersection(pa, heading_vector(ha), pb, heading_vector(hb)) {
        None => false,
        Some((_, t, s)) => {
            if t > 0.0 || s > 0.0 {
                false
            } else {
                heading_difference(ha, hb) >= DIVERGING_HEADING_DIFFERENCE
            }
        }
    }
}

/// Holds the persistent CA and MCI pair lists.
#[derive(Debug, Default)]
pub struct ConflictMonitor {
    pub ca: Vec<Conflict>,
    pub mci: Vec<Conflict>,
}

impl ConflictMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The unacknowledged-or-not CA pair containing `callsign`, if any.
    #[must_use]
    pub fn ca_for(&self, callsign: &str) -> Option<&Conflict> {
        self.ca.iter().find(|c| c.callsigns.iter().any(|cs| cs == callsign))
    }

    #[must_use]
    pub fn mci_for(&self, callsign: &str) -> Option<&Conflict> {
        self.mci.iter().find(|c| c.callsigns.iter().any(|cs| cs == callsign))
    }

    /// Acknowledge every CA pair containing `callsign`.
    pub fn acknowledge_ca(&mut self, callsign: &str) {
        for c in &mut self.ca {
            if c.callsigns.iter().any(|cs| cs == callsign) {
                c.acknowledged = true;
            }
        }
    }

    pub fn acknowledge_mci(&mut self, callsign: &str) {
        for c in &mut self.mci {
            if c.callsigns.iter().any(|cs| cs == callsign) {
                c.acknowledged = true;
            }
        }
    }

    /// Recompute both pair lists against the current snapshot.
    pub fn update(
        &mut self,
        table: &TrackTable,
        world: &World,
        prefs: &Preferences,
        now: DateTime<Utc>,
        audio: &mut Vec<AudioAlert>,
    ) {
        let heading = |trk: &Track| -> f64 {
            table
                .state(&trk.adsb_callsign)
                .and_then(|s| s.heading(world.nm_per_longitude))
                .unwrap_or(trk.true_heading)
        };

        let ca_predicate = |a: &Track, b: &Track| -> bool {
            let (Some(fa), Some(fb)) = (&a.flight_plan, &b.flight_plan) else {
                return false;
            };
            if fa.disable_ca || fb.disable_ca {
                return false;
            }
            if !mode_c(a) || !mode_c(b) {
                return false;
            }
            if in_same_atpa_volume(a, b, world) {
                return false;
            }
            if in_inhibit_volume(a, world) || in_inhibit_volume(b, world) {
                return false;
            }
            let lateral = a.location.distance_nm(b.location, world.nm_per_longitude);
            if lateral > LATERAL_MINIMUM {
                return false;
            }
            if (a.separation_altitude() - b.separation_altitude()).abs() > VERTICAL_MINIMUM - 5 {
                return false;
            }
            !diverging(a, heading(a), b, heading(b), world.nm_per_longitude)
        };

        let mci_predicate = |a: &Track, b: &Track| -> bool {
            let Some(fa) = &a.flight_plan else { return false };
            if b.is_associated() {
                return false;
            }
            if fa.inhibit_mode_c_altitude_display {
                return false;
            }
            if fa.mci_suppressed_code == b.squawk {
                return false;
            }
            if !mode_c(a) || !mode_c(b) {
                return false;
            }
            if in_inhibit_volume(a, world) || in_inhibit_volume(b, world) {
                return false;
            }
            let lateral = a.location.distance_nm(b.location, world.nm_per_longitude);
            if lateral > MCI_LATERAL_MINIMUM {
                return false;
            }
            if (a.separation_altitude() - b.separation_altitude()).abs() > MCI_VERTICAL_MINIMUM - 5
            {
                return false;
            }
            !diverging(a, heading(a), b, heading(b), world.nm_per_longitude)
        };

        let ca_audio = prefs.common.audio.conflict_alert && !prefs.common.disable_ca_warnings;
        Self::update_pairs(
            &mut self.ca,
            world,
            now,
            |a, b| a.is_associated() && b.is_associated() && ca_predicate(a, b),
            ca_audio.then_some(AudioAlert::ConflictAlert),
            audio,
        );

        let mci_audio = prefs.common.audio.mode_c_intruder && !prefs.common.disable_mci_warnings;
        Self::update_pairs(
            &mut self.mci,
            world,
            now,
            mci_predicate,
            mci_audio.then_some(AudioAlert::ModeCIntruder),
            audio,
        );
    }

    fn update_pairs(
        pairs: &mut Vec<Conflict>,
        world: &World,
        now: DateTime<Utc>,
        predicate: impl Fn(&Track, &Track) -> bool,
        alert: Option<AudioAlert>,
        audio: &mut Vec<AudioAlert>,
    ) {
        // Retain pairs still in conflict, preserving first-detection order
        pairs.retain(|c| {
            let (Some(a), Some(b)) = (
                world.tracks.get(&c.callsigns[0]),
                world.tracks.get(&c.callsigns[1]),
            ) else {
                return false;
            };
            predicate(a, b) || predicate(b, a)
        });

        // Scan for new pairs, ordered by callsign so each is seen once
        let mut callsigns: Vec<&AdsbCallsign> = world.tracks.keys().collect();
        callsigns.sort();
        for (i, ca) in callsigns.iter().enumerate() {
            for cb in &callsigns[i + 1..] {
                if pairs.iter().any(|c| {
                    (c.callsigns[0] == **ca && c.callsigns[1] == **cb)
                        || (c.callsigns[0] == **cb && c.callsigns[1] == **ca)
                }) {
                    continue;
                }
                let (a, b) = (&world.tracks[*ca], &world.tracks[*cb]);
                if predicate(a, b) || predicate(b, a) {
                    pairs.push(Conflict {
                        callsigns: [(*ca).clone(), (*cb).clone()],
                        acknowledged: false,
                        start: now,
                        sound_end: now + Duration::seconds(ALERT_AUDIO_SECONDS),
                    });
                    if let Some(alert) = alert {
                        audio.push(alert);
                    }
                }
            }
        }
    }
}

fn mode_c(t: &Track) -> bool {
    t.mode == TransponderMode::Altitude && !t.missing_altitude
}

fn in_inhibit_volume(t: &Track, world: &World) -> bool {
    world
        .facility_adaptation
        .inhibit_ca_volumes
        .iter()
        .any(|v| v.inside(t.location, t.separation_altitude()))
}

fn in_same_atpa_volume(a: &Track, b: &Track, world: &World) -> bool {
    let nm = world.nm_per_longitude;
    world.airports.values().flat_map(|ap| &ap.atpa_volumes).any(|v| {
        v.inside(a.location, a.separation_altitude(), a.true_heading, nm)
            && v.inside(b.location, b.separation_altitude(), b.true_heading, nm)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sim_state::{FlightPlan, LatLong, Squawk};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn associated(cs: &str, loc: LatLong, alt: i32, hdg: f64) -> Track {
        Track {
            adsb_callsign: cs.to_string(),
            location: loc,
            transponder_altitude: alt,
            true_heading: hdg,
            groundspeed: 250.0,
            mode: TransponderMode::Altitude,
            flight_plan: Some(FlightPlan {
                acid: cs.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn seed_world() -> World {
        // The CA seed geometry: 0.04 degrees of longitude apart at the same
        // altitude, closing head-on.
        let mut world = World {
            sim_time: t0(),
            nm_per_longitude: 51.26,
            fused_radar_mode: true,
            ..Default::default()
        };
        world.tracks.insert(
            "AAL1".to_string(),
            associated("AAL1", LatLong::new(-73.0, 40.0), 5000, 90.0),
        );
        world.tracks.insert(
            "UAL2".to_string(),
            associated("UAL2", LatLong::new(-73.04, 40.0), 5000, 270.0),
        );
        world
    }

    #[test]
    fn head_on_pair_conflicts() {
        let world = seed_world();
        let table = TrackTable::new();
        let mut monitor = ConflictMonitor::new();
        let mut audio = Vec::new();
        monitor.update(&table, &world, &Preferences::default(), t0(), &mut audio);
        assert_eq!(monitor.ca.len(), 1);
        assert!(!monitor.ca[0].acknowledged);
        assert!(audio.contains(&AudioAlert::ConflictAlert));

        // Pair persists and keeps its start time on the next tick
        let start = monitor.ca[0].start;
        audio.clear();
        monitor.update(
            &table,
            &world,
            &Preferences::default(),
            t0() + Duration::seconds(1),
            &mut audio,
        );
        assert_eq!(monitor.ca.len(), 1);
        assert_eq!(monitor.ca[0].start, start);
        assert!(audio.is_empty());
    }

    #[test]
    fn disable_ca_suppresses_pair() {
        let mut world = seed_world();
        world
            .tracks
            .get_mut("AAL1")
            .unwrap()
            .flight_plan
            .as_mut()
            .unwrap()
            .disable_ca = true;
        let mut monitor = ConflictMonitor::new();
        let mut audio = Vec::new();
        monitor.update(
            &TrackTable::new(),
            &world,
            &Preferences::default(),
            t0(),
            &mut audio,
        );
        assert!(monitor.ca.is_empty());
    }

    #[test]
    fn vertical_separation_clears_pair() {
        let mut world = seed_world();
        let table = TrackTable::new();
        let mut monitor = ConflictMonitor::new();
        let mut audio = Vec::new();
        monitor.update(&table, &world, &Preferences::default(), t0(), &mut audio);
        assert_eq!(monitor.ca.len(), 1);

        world.tracks.get_mut("AAL1").unwrap().transponder_altitude = 6000;
        monitor.update(&table, &world, &Preferences::default(), t0(), &mut audio);
        assert!(monitor.ca.is_empty());
    }

    #[test]
    fn diverging_tracks_are_exempt() {
        // Courses opened up after passing: the ray intersection lies behind
        // both aircraft and the heading difference is well over 15 degrees.
        let a = associated("A", LatLong::new(-73.0, 40.0), 5000, 135.0);
        let b = associated("B", LatLong::new(-73.02, 40.0), 5000, 225.0);
        assert!(diverging(&a, 135.0, &b, 225.0, 51.26));
        // Head-on closing traffic is not diverging
        assert!(!diverging(&a, 270.0, &b, 90.0, 51.26));

        let mut world = seed_world();
        world.tracks.get_mut("AAL1").unwrap().true_heading = 135.0;
        world.tracks.get_mut("UAL2").unwrap().true_heading = 225.0;
        let mut monitor = ConflictMonitor::new();
        let mut audio = Vec::new();
        monitor.update(
            &TrackTable::new(),
            &world,
            &Preferences::default(),
            t0(),
            &mut audio,
        );
        assert!(monitor.ca.is_empty());
    }

    #[test]
    fn mci_pairs_unassociated_intruder() {
        let mut world = World {
            sim_time: t0(),
            nm_per_longitude: 51.26,
            fused_radar_mode: true,
            ..Default::default()
        };
        world.tracks.insert(
            "AAL1".to_string(),
            associated("AAL1", LatLong::new(-73.0, 40.0), 5000, 90.0),
        );
        world.tracks.insert(
            "VFR1".to_string(),
            Track {
                adsb_callsign: "VFR1".to_string(),
                location: LatLong::new(-73.01, 40.0),
                transponder_altitude: 5200,
                true_heading: 270.0,
                squawk: Squawk::VFR,
                mode: TransponderMode::Altitude,
                ..Default::default()
            },
        );
        let mut monitor = ConflictMonitor::new();
        let mut audio = Vec::new();
        monitor.update(
            &TrackTable::new(),
            &world,
            &Preferences::default(),
            t0(),
            &mut audio,
        );
        assert_eq!(monitor.mci.len(), 1);
        assert!(audio.contains(&AudioAlert::ModeCIntruder));

        // Suppressing the intruder's code clears it
        world
            .tracks
            .get_mut("AAL1")
            .unwrap()
            .flight_plan
            .as_mut()
            .unwrap()
            .mci_suppressed_code = Squawk::VFR;
        monitor.update(
            &TrackTable::new(),
            &world,
            &Preferences::default(),
            t0(),
            &mut audio,
        );
        assert!(monitor.mci.is_empty());
    }

    #[test]
    fn acknowledgment_marks_all_pairs_for_callsign() {
        let world = seed_world();
        let mut monitor = ConflictMonitor::new();
        let mut audio = Vec::new();
        monitor.update(
            &TrackTable::new(),
            &world,
            &Preferences::default(),
            t0(),
            &mut audio,
        );
        monitor.acknowledge_ca("AAL1");
        assert!(monitor.ca[0].acknowledged);
    }
}
