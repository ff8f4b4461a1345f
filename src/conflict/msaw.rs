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

//! Minimum safe altitude warning against the TRACON's MVA polygons.

use chrono::{DateTime, Duration, Utc};
use sim_state::{TransponderMode, World};

use super::ALERT_AUDIO_SECONDS;
use crate::draw::AudioAlert;
use crate::prefs::Preferences;
use crate::track::TrackTable;

/// Evaluate every associated mode-C track against the MVA polygons.
///
/// A rising edge clears the acknowledgment and opens a 5 second audio
/// window; a falling edge clears the per-aircraft inhibit flag.
pub fn update_msaw(
    table: &mut TrackTable,
    world: &World,
    prefs: &Preferences,
    now: DateTime<Utc>,
    audio: &mut Vec<AudioAlert>,
) {
    for (callsign, trk) in &world.tracks {
        let Some(fp) = &trk.flight_plan else { continue };
        let Some(state) = table.states.get_mut(callsign) else {
            continue;
        };

        if fp.inhibit_mode_c_altitude_display || trk.mode != TransponderMode::Altitude {
            if state.msaw {
                state.msaw = false;
                state.inhibit_msaw = false;
            }
            continue;
        }

        let alt = trk.separation_altitude();
        let low = world
            .mvas
            .iter()
            .any(|mva| alt < mva.minimum_limit && mva.inside(trk.location));

        if low && !state.msaw {
            state.msaw = true;
            state.msaw_acknowledged = false;
            state.msaw_sound_end = Some(now + Duration::seconds(ALERT_AUDIO_SECONDS));
            if prefs.common.audio.msaw && !prefs.common.disable_msaw && !fp.disable_msaw {
                audio.push(AudioAlert::Msaw);
            }
        } else if !low && state.msaw {
            state.msaw = false;
            state.inhibit_msaw = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sim_state::{FlightPlan, LatLong, Mva, Track};

    fn world_with_mva() -> World {
        let mut world = World {
            sim_time: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            nm_per_longitude: 46.0,
            fused_radar_mode: true,
            ..Default::default()
        };
        world.mvas.push(Mva {
            minimum_limit: 3000,
            exterior: vec![
                LatLong::new(-74.0, 39.0),
                LatLong::new(-72.0, 39.0),
                LatLong::new(-72.0, 41.0),
                LatLong::new(-74.0, 41.0),
            ],
        });
        world.tracks.insert(
            "N1".to_string(),
            Track {
                adsb_callsign: "N1".to_string(),
                location: LatLong::new(-73.0, 40.0),
                transponder_altitude: 2500,
                mode: TransponderMode::Altitude,
                flight_plan: Some(FlightPlan {
                    acid: "N1".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        world
    }

    #[test]
    fn msaw_rising_and_falling_edges() {
        let mut world = world_with_mva();
        let mut table = TrackTable::new();
        let prefs = Preferences::default();
        table.update_tracks(&world, &prefs);

        let now = world.sim_time;
        let mut audio = Vec::new();
        update_msaw(&mut table, &world, &prefs, now, &mut audio);
        let state = table.states.get("N1").unwrap();
        assert!(state.msaw);
        assert!(!state.msaw_acknowledged);
        assert!(audio.contains(&AudioAlert::Msaw));

        // Acknowledge, then climb above the limit: latch falls, inhibit clears
        table.states.get_mut("N1").unwrap().inhibit_msaw = true;
        world.tracks.get_mut("N1").unwrap().transponder_altitude = 3500;
        audio.clear();
        update_msaw(&mut table, &world, &prefs, now, &mut audio);
        let state = table.states.get("N1").unwrap();
        assert!(!state.msaw);
        assert!(!state.inhibit_msaw);
        assert!(audio.is_empty());
    }

    #[test]
    fn msaw_skips_mode_c_inhibited_plans() {
        let mut world = world_with_mva();
        world
            .tracks
            .get_mut("N1")
            .unwrap()
            .flight_plan
            .as_mut()
            .unwrap()
            .inhibit_mode_c_altitude_display = true;
        let mut table = TrackTable::new();
        let prefs = Preferences::default();
        table.update_tracks(&world, &prefs);
        let mut audio = Vec::new();
        update_msaw(&mut table, &world, &prefs, world.sim_time, &mut audio);
        assert!(!table.states.get("N1").unwrap().msaw);
    }
}
