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

//! Per-aircraft display state and the event/track update pipeline.
//!
//! [`TrackState`] mirrors and augments the simulator's view of one aircraft
//! with display-only state: flash windows, acknowledgment flags, per-aircraft
//! display overrides, and the radar history ring. [`TrackTable`] owns one
//! entry per live sensor callsign and applies simulator events in delivery
//! order before conflict detection runs.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use log::debug;
use sim_state::{
    AdsbCallsign, CardinalOrdinal, Event, EventKind, FacilityAdaptation, LatLong, Squawk,
    TransponderMode, World,
};

use crate::draw::AudioAlert;
use crate::prefs::Preferences;

/// Seconds without a sensor update before a track is considered lost
pub const LOST_TRACK_SECONDS: i64 = 30;

/// History ring capacity per aircraft
pub const HISTORY_TRACK_CAPACITY: usize = 10;

/// Mode-C climb/descent rate beyond which the report is unreasonable (fpm)
pub const UNREASONABLE_FPM: f64 = 8400.0;

/// Consecutive in-bounds samples required to clear the unreasonable latch
const UNREASONABLE_RECOVERY_SAMPLES: u32 = 5;

/// Seconds a point-out or UN indicator flashes after the remote action
const PO_FLASH_SECONDS: i64 = 5;

/// Seconds the RD indicator persists after a redirected handoff accept
const RD_INDICATOR_SECONDS: i64 = 30;

/// One radar observation retained by the scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadarObservation {
    pub position: LatLong,
    pub altitude: i32,
    pub groundspeed: f64,
    pub heading: f64,
    pub mode: TransponderMode,
    pub time: DateTime<Utc>,
}

/// ATPA monitor status for the trailing aircraft of a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AtpaStatus {
    #[default]
    Unset,
    Monitor,
    Warning,
    Alert,
}

/// Ghost display handling for CRDA-projected tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GhostState {
    #[default]
    Regular,
    Suppressed,
    Forced,
}

/// Display-only state the scope keeps per live aircraft.
#[derive(Debug, Clone, Default)]
pub struct TrackState {
    pub track: RadarObservation,
    pub previous_track: Option<RadarObservation>,
    pub track_time: DateTime<Utc>,

    pub history: [RadarObservation; HISTORY_TRACK_CAPACITY],
    pub history_count: usize,
    pub history_index: usize,
    pub last_history_time: DateTime<Utc>,

    pub is_selected: bool,
    pub display_fdb: bool,
    pub full_ldb_end: Option<DateTime<Utc>>,

    // Alert acknowledgment
    pub msaw: bool,
    pub msaw_acknowledged: bool,
    pub inhibit_msaw: bool,
    pub msaw_sound_end: Option<DateTime<Utc>>,
    pub spc_acknowledged: bool,
    pub spc_sound_end: Option<DateTime<Utc>>,
    pub ca_acknowledged: bool,
    pub mci_acknowledged: bool,
    pub db_acknowledged: Option<Squawk>,
    pub duplicate_beacon: bool,
    pub datablock_alert: bool,

    // Flash windows, absolute wall-clock deadlines
    pub po_flash_end: Option<DateTime<Utc>>,
    pub un_flash_end: Option<DateTime<Utc>>,
    pub if_flashing: bool,
    pub outbound_handoff_accepted: bool,
    pub outbound_handoff_flash_end: Option<DateTime<Utc>>,
    pub rd_indicator_end: Option<DateTime<Utc>>,
    pub accepted_handoff_sector: String,
    pub accepted_handoff_display_end: Option<DateTime<Utc>>,
    pub suspended_show_altitude_end: Option<DateTime<Utc>>,
    pub force_actype_display_end: Option<DateTime<Utc>>,

    pub point_out_acknowledged: bool,
    pub force_ql: bool,

    // Per-aircraft display overrides
    pub leader_line_direction: Option<CardinalOrdinal>,
    pub use_global_leader_line: bool,
    pub global_leader_line_direction: Option<CardinalOrdinal>,
    pub jring_radius: f32,
    pub cone_length: f32,
    pub display_tpa_size: Option<bool>,
    pub display_atpa_warn_alert: Option<bool>,
    pub display_atpa_monitor: Option<bool>,
    pub display_atpa_in_trail_dist: Option<bool>,
    pub display_requested_altitude: Option<bool>,
    pub inhibit_actype_display: bool,
    pub cleared_scratchpad_alternate: bool,

    // ATPA
    pub intrail_distance: f64,
    pub minimum_mit: f64,
    pub atpa_status: AtpaStatus,
    pub atpa_lead_callsign: Option<AdsbCallsign>,

    // CRDA ghost handling
    pub ghost_partial_datablock: bool,
    pub ghost_state: GhostState,

    // Unreasonable mode C
    pub unreasonable_mode_c: bool,
    pub consecutive_normal_tracks: u32,

    /// Set once the track has entered our airspace filter bands.
    pub entered_airspace: bool,
    pub first_seen: DateTime<Utc>,
    pub first_radar_track: Option<DateTime<Utc>>,
}

impl TrackState {
    /// Has the sensor stopped reporting for more than the lost threshold?
    #[must_use]
    pub fn lost_track(&self, now: DateTime<Utc>) -> bool {
        self.first_radar_track.is_some()
            && now.signed_duration_since(self.track_time) > Duration::seconds(LOST_TRACK_SECONDS)
    }

    /// Track heading from the last two observations; undefined before the
    /// second update.
    #[must_use]
    pub fn heading(&self, nm_per_longitude: f64) -> Option<f64> {
        let prev = self.previous_track?;
        if prev.position == self.track.position {
            return None;
        }
        Some(prev.position.heading_to(self.track.position, nm_per_longitude))
    }

    /// History entries, oldest first.
    pub fn history_tracks(&self) -> impl Iterator<Item = &RadarObservation> {
        let n = self.history_count.min(HISTORY_TRACK_CAPACITY);
        let start = if self.history_count <= HISTORY_TRACK_CAPACITY {
            0
        } else {
            self.history_index
        };
        (0..n).map(move |i| &self.history[(start + i) % HISTORY_TRACK_CAPACITY])
    }

    fn ingest(&mut self, obs: RadarObservation, history_rate: f32) {
        if self.first_radar_track.is_none() {
            self.first_radar_track = Some(obs.time);
        } else {
            self.previous_track = Some(self.track);
        }

        // Unreasonable mode C: rate magnitude beyond the threshold latches;
        // five consecutive in-bounds samples clear it.
        if let Some(prev) = self.previous_track {
            let dt = obs.time.signed_duration_since(prev.time).num_milliseconds() as f64 / 1000.0;
            if dt > 0.0 && obs.mode == TransponderMode::Altitude && prev.mode == TransponderMode::Altitude
            {
                let fpm = f64::from(obs.altitude - prev.altitude) / dt * 60.0;
                if fpm.abs() > UNREASONABLE_FPM {
                    self.unreasonable_mode_c = true;
                    self.consecutive_normal_tracks = 0;
                } else if self.unreasonable_mode_c {
                    self.consecutive_normal_tracks += 1;
                    if self.consecutive_normal_tracks >= UNREASONABLE_RECOVERY_SAMPLES {
                        self.unreasonable_mode_c = false;
                        self.consecutive_normal_tracks = 0;
                    }
                }
            }
        }

        self.track = obs;
        self.track_time = obs.time;

        if history_rate > 0.0
            && obs
                .time
                .signed_duration_since(self.last_history_time)
                .num_milliseconds() as f32
                / 1000.0
                >= history_rate
        {
            self.history[self.history_index] = obs;
            self.history_index = (self.history_index + 1) % HISTORY_TRACK_CAPACITY;
            self.history_count += 1;
            self.last_history_time = obs.time;
        }
    }
}

/// The from/to pair of an active point-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointOutControllers {
    pub from: String,
    pub to: String,
}

/// Owns the per-aircraft state table plus the point-out bookkeeping.
#[derive(Debug, Default)]
pub struct TrackTable {
    pub states: HashMap<AdsbCallsign, TrackState>,
    /// ACID to from/to controllers for point-outs in flight.
    pub point_outs: HashMap<String, PointOutControllers>,
    pub rejected_point_outs: HashSet<String>,
    /// ACIDs another controller has force-quick-looked to us.
    pub force_ql_acids: HashSet<String>,
    /// Outbound point-out history per ACID, most recent first.
    pub outbound_point_out_history: HashMap<String, Vec<String>>,
    last_track_update: DateTime<Utc>,
}

impl TrackTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, callsign: &str) -> Option<&TrackState> {
        self.states.get(callsign)
    }

    pub fn state_mut(&mut self, callsign: &str) -> Option<&mut TrackState> {
        self.states.get_mut(callsign)
    }

    /// State for an associated track looked up by ACID.
    pub fn state_for_acid<'a>(&'a mut self, world: &World, acid: &str) -> Option<&'a mut TrackState> {
        let callsign = world.track_by_acid(acid)?.adsb_callsign.clone();
        self.states.get_mut(&callsign)
    }

    /// Apply one frame's worth of simulator events, in delivery order.
    pub fn process_events(
        &mut self,
        events: &[Event],
        world: &World,
        user_tcp: &str,
        now: DateTime<Utc>,
        adaptation: &FacilityAdaptation,
        audio: &mut Vec<AudioAlert>,
    ) {
        for ev in events {
            match ev.kind {
                EventKind::PointOut => {
                    self.point_outs.insert(
                        ev.acid.clone(),
                        PointOutControllers {
                            from: ev.from_controller.clone(),
                            to: ev.to_controller.clone(),
                        },
                    );
                    self.rejected_point_outs.remove(&ev.acid);
                    if ev.from_controller == user_tcp {
                        self.outbound_point_out_history
                            .entry(ev.acid.clone())
                            .or_default()
                            .insert(0, ev.to_controller.clone());
                    }
                }
                EventKind::AcknowledgedPointOut => {
                    self.point_outs.remove(&ev.acid);
                    if let Some(state) = self.state_for_acid(world, &ev.acid) {
                        if ev.to_controller == user_tcp {
                            state.point_out_acknowledged = true;
                        } else {
                            // They acknowledged ours; flash PO
                            state.po_flash_end = Some(now + Duration::seconds(PO_FLASH_SECONDS));
                        }
                    }
                }
                EventKind::RecalledPointOut => {
                    self.point_outs.remove(&ev.acid);
                }
                EventKind::RejectedPointOut => {
                    self.point_outs.remove(&ev.acid);
                    if ev.from_controller == user_tcp {
                        self.rejected_point_outs.insert(ev.acid.clone());
                        if let Some(state) = self.state_for_acid(world, &ev.acid) {
                            state.un_flash_end = Some(now + Duration::seconds(PO_FLASH_SECONDS));
                        }
                    }
                }
                EventKind::FlightPlanAssociated => {
                    let quick = world
                        .track_by_acid(&ev.acid)
                        .and_then(|t| t.flight_plan.as_ref())
                        .is_some_and(|fp| fp.quick_flight_plan);
                    let ours = world
                        .track_by_acid(&ev.acid)
                        .and_then(|t| t.flight_plan.as_ref())
                        .is_some_and(|fp| fp.tracking_controller == user_tcp);
                    if let Some(state) = self.state_for_acid(world, &ev.acid) {
                        if ours {
                            state.display_fdb = true;
                        }
                        if quick {
                            state.datablock_alert = true;
                        }
                    }
                }
                EventKind::OfferedHandoff => {
                    if ev.to_controller == user_tcp {
                        audio.push(AudioAlert::InboundHandoff);
                    }
                }
                EventKind::AcceptedHandoff | EventKind::AcceptedRedirectedHandoff => {
                    let redirected = ev.kind == EventKind::AcceptedRedirectedHandoff;
                    let flash = Duration::seconds(adaptation.handoff_accept_flash_seconds);
                    let sector_display = Duration::seconds(adaptation.ho_sector_display_seconds);
                    let outbound = ev.from_controller == user_tcp && ev.to_controller != user_tcp;
                    if let Some(state) = self.state_for_acid(world, &ev.acid) {
                        if outbound {
                            audio.push(AudioAlert::HandoffAccepted);
                            state.outbound_handoff_accepted = true;
                            state.outbound_handoff_flash_end = Some(now + flash);
                            state.display_fdb = true;
                            if redirected {
                                state.rd_indicator_end =
                                    Some(now + Duration::seconds(RD_INDICATOR_SECONDS));
                            }
                        }
                        state.accepted_handoff_sector = ev.to_controller.clone();
                        state.accepted_handoff_display_end = Some(now + sector_display);
                    }
                }
                EventKind::SetGlobalLeaderLine => {
                    let dir = world
                        .track_by_acid(&ev.acid)
                        .and_then(|t| t.flight_plan.as_ref())
                        .and_then(|fp| fp.global_leader_line_direction);
                    if let Some(state) = self.state_for_acid(world, &ev.acid) {
                        state.global_leader_line_direction = dir;
                        state.use_global_leader_line = dir.is_some();
                    }
                }
                EventKind::ForceQl => {
                    if ev.to_controller == user_tcp {
                        self.force_ql_acids.insert(ev.acid.clone());
                    }
                }
                EventKind::TransferRejected => {
                    if let Some(state) = self.state_for_acid(world, &ev.acid) {
                        state.if_flashing = true;
                    }
                }
                EventKind::TransferAccepted => {
                    if let Some(state) = self.state_for_acid(world, &ev.acid) {
                        state.if_flashing = false;
                    }
                }
                EventKind::Ident => {}
            }
        }
    }

    /// Radar tick: 1 s of sim time in fused mode, 5 s otherwise.
    #[must_use]
    pub fn track_update_due(&self, world: &World) -> bool {
        let period = if world.fused_radar_mode { 1 } else { 5 };
        world
            .sim_time
            .signed_duration_since(self.last_track_update)
            .num_seconds()
            >= period
    }

    /// Ingest the current snapshot's observations, create states lazily, and
    /// drop states for callsigns the simulator no longer reports.
    pub fn update_tracks(&mut self, world: &World, prefs: &Preferences) {
        self.states
            .retain(|callsign, _| world.tracks.contains_key(callsign));
        self.point_outs
            .retain(|acid, _| world.track_by_acid(acid).is_some() || world.unassociated_plan(acid).is_some());

        if !self.track_update_due(world) {
            return;
        }
        self.last_track_update = world.sim_time;

        for (callsign, trk) in &world.tracks {
            let state = self.states.entry(callsign.clone()).or_insert_with(|| {
                debug!("{callsign}: new track state");
                TrackState {
                    first_seen: world.sim_time,
                    ..Default::default()
                }
            });
            state.ingest(
                RadarObservation {
                    position: trk.location,
                    altitude: trk.transponder_altitude,
                    groundspeed: trk.groundspeed,
                    heading: trk.true_heading,
                    mode: trk.mode,
                    time: world.sim_time,
                },
                prefs.common.radar_track_history_rate,
            );
        }

        self.update_duplicate_beacons(world);
    }

    /// Group mode-C tracks by squawk; members of a >1 group show a flashing
    /// DB indicator until acknowledged. VFR and SPC codes are skipped.
    fn update_duplicate_beacons(&mut self, world: &World) {
        let mut by_code: HashMap<Squawk, usize> = HashMap::new();
        for trk in world.tracks.values() {
            if trk.mode == TransponderMode::Standby
                || trk.squawk == Squawk::VFR
                || trk.squawk.is_spc()
            {
                continue;
            }
            *by_code.entry(trk.squawk).or_insert(0) += 1;
        }
        for (callsign, trk) in &world.tracks {
            if let Some(state) = self.states.get_mut(callsign) {
                let dup = by_code.get(&trk.squawk).copied().unwrap_or(0) > 1
                    && trk.mode != TransponderMode::Standby
                    && trk.squawk != Squawk::VFR
                    && !trk.squawk.is_spc();
                state.duplicate_beacon = dup;
                if !dup {
                    state.db_acknowledged = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sim_state::Track;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn obs(time: DateTime<Utc>, altitude: i32) -> RadarObservation {
        RadarObservation {
            position: LatLong::new(-73.0, 40.0),
            altitude,
            groundspeed: 250.0,
            heading: 90.0,
            mode: TransponderMode::Altitude,
            time,
        }
    }

    #[test]
    fn lost_track_threshold_is_thirty_seconds() {
        let mut state = TrackState::default();
        state.ingest(obs(t0(), 5000), 0.0);
        assert!(!state.lost_track(t0() + Duration::seconds(30)));
        assert!(state.lost_track(t0() + Duration::seconds(31)));
    }

    #[test]
    fn previous_track_set_after_second_update() {
        let mut state = TrackState::default();
        state.ingest(obs(t0(), 5000), 0.0);
        assert!(state.previous_track.is_none());
        state.ingest(obs(t0() + Duration::seconds(5), 5100), 0.0);
        assert!(state.previous_track.is_some());
    }

    #[test]
    fn history_ring_holds_min_of_updates_and_capacity() {
        let mut state = TrackState::default();
        for i in 0..4 {
            state.ingest(obs(t0() + Duration::seconds(5 * i), 5000), 4.5);
        }
        assert_eq!(state.history_tracks().count(), 4);

        for i in 4..25 {
            state.ingest(obs(t0() + Duration::seconds(5 * i), 5000 + i as i32), 4.5);
        }
        let newest = state.history_tracks().last().unwrap();
        assert_eq!(state.history_tracks().count(), HISTORY_TRACK_CAPACITY);
        assert_eq!(newest.altitude, 5024);
    }

    #[test]
    fn history_respects_rate() {
        let mut state = TrackState::default();
        state.ingest(obs(t0(), 5000), 4.5);
        // One second later: below the 4.5 s history rate, no new entry
        state.ingest(obs(t0() + Duration::seconds(1), 5100), 4.5);
        assert_eq!(state.history_tracks().count(), 1);
        state.ingest(obs(t0() + Duration::seconds(5), 5200), 4.5);
        assert_eq!(state.history_tracks().count(), 2);
    }

    #[test]
    fn unreasonable_mode_c_latch_and_recovery() {
        let mut state = TrackState::default();
        state.ingest(obs(t0(), 5000), 0.0);
        // 200 ft in one second is 12000 fpm
        state.ingest(obs(t0() + Duration::seconds(1), 5200), 0.0);
        assert!(state.unreasonable_mode_c);

        // Four in-bounds samples: still latched
        for i in 0..4 {
            state.ingest(obs(t0() + Duration::seconds(2 + i), 5200 + 10 * i as i32), 0.0);
            assert!(state.unreasonable_mode_c);
        }
        // Fifth clears it
        state.ingest(obs(t0() + Duration::seconds(6), 5250), 0.0);
        assert!(!state.unreasonable_mode_c);
    }

    #[test]
    fn events_update_point_out_tables() {
        let mut table = TrackTable::new();
        let mut world = World {
            sim_time: t0(),
            nm_per_longitude: 46.0,
            fused_radar_mode: true,
            ..Default::default()
        };
        world.tracks.insert(
            "N123AB".to_string(),
            Track {
                adsb_callsign: "N123AB".to_string(),
                flight_plan: Some(sim_state::FlightPlan {
                    acid: "N123AB".to_string(),
                    tracking_controller: "2A".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        table.update_tracks(&world, &Preferences::default());

        let mut audio = Vec::new();
        let ev = Event::new(EventKind::PointOut, "N123AB").from("2A").to("1J");
        table.process_events(
            &[ev],
            &world,
            "1J",
            t0(),
            &FacilityAdaptation::default(),
            &mut audio,
        );
        assert_eq!(
            table.point_outs.get("N123AB"),
            Some(&PointOutControllers {
                from: "2A".to_string(),
                to: "1J".to_string()
            })
        );

        let ack = Event::new(EventKind::AcknowledgedPointOut, "N123AB")
            .from("2A")
            .to("1J");
        table.process_events(
            &[ack],
            &world,
            "1J",
            t0(),
            &FacilityAdaptation::default(),
            &mut audio,
        );
        assert!(table.point_outs.is_empty());
        assert!(table.states.get("N123AB").unwrap().point_out_acknowledged);
    }

    #[test]
    fn accepted_handoff_from_us_flashes_and_forces_fdb() {
        let mut table = TrackTable::new();
        let mut world = World {
            sim_time: t0(),
            fused_radar_mode: true,
            ..Default::default()
        };
        world.tracks.insert(
            "DAL200".to_string(),
            Track {
                adsb_callsign: "DAL200".to_string(),
                flight_plan: Some(sim_state::FlightPlan {
                    acid: "DAL200".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        table.update_tracks(&world, &Preferences::default());

        let mut audio = Vec::new();
        let ev = Event::new(EventKind::AcceptedHandoff, "DAL200").from("1J").to("2A");
        table.process_events(
            &[ev],
            &world,
            "1J",
            t0(),
            &FacilityAdaptation::default(),
            &mut audio,
        );
        let state = table.states.get("DAL200").unwrap();
        assert!(state.outbound_handoff_accepted);
        assert!(state.display_fdb);
        assert_eq!(state.accepted_handoff_sector, "2A");
        assert!(audio.contains(&AudioAlert::HandoffAccepted));
    }

    #[test]
    fn duplicate_beacons_skip_vfr_and_spc() {
        let mut table = TrackTable::new();
        let mut world = World {
            sim_time: t0(),
            fused_radar_mode: true,
            ..Default::default()
        };
        for (cs, code) in [
            ("A1", 0o2345),
            ("A2", 0o2345),
            ("V1", 0o1200),
            ("V2", 0o1200),
        ] {
            world.tracks.insert(
                cs.to_string(),
                Track {
                    adsb_callsign: cs.to_string(),
                    squawk: Squawk(code),
                    ..Default::default()
                },
            );
        }
        table.update_tracks(&world, &Preferences::default());
        assert!(table.states.get("A1").unwrap().duplicate_beacon);
        assert!(table.states.get("A2").unwrap().duplicate_beacon);
        assert!(!table.states.get("V1").unwrap().duplicate_beacon);
    }
}
