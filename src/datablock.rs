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

//! Datablock composition: variant selection, field content, multiplexing,
//! color, brightness, and visibility.
//!
//! A datablock is a small fixed layout of text fields, some of which carry
//! several time-sliced variants. Cycle 0 lasts two seconds and later cycles
//! 1.5 seconds; the active cycle derives from the wall clock so every
//! datablock on the scope flips in unison.

use chrono::{DateTime, Utc};
use sim_state::{spc_for_code, is_standard_spc, Squawk, Track, TransponderMode, World};

use crate::conflict::ConflictMonitor;
use crate::draw::{
    Rgb, ALERT_COLOR, ATPA_ALERT_COLOR, ATPA_MONITOR_COLOR, ATPA_WARNING_COLOR, SELECTED_COLOR,
    TEXT_ALERT_COLOR, TEXT_WARNING_COLOR, TRACKED_COLOR, UNTRACKED_COLOR,
};
use crate::prefs::Preferences;
use crate::track::{AtpaStatus, TrackState, TrackTable};

/// The triangle glyph used for facility prefixes and inhibit markers.
pub const TRIANGLE: char = '\u{25b3}';

/// Which datablock shape a track renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatablockType {
    Limited,
    Partial,
    Full,
    Suspended,
    Ghost,
}

/// Color class of a datablock, a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Selected,
    Untracked,
    Tracked,
    Alert,
}

/// One run of datablock text with optional color override and flash flag.
#[derive(Debug, Clone, PartialEq)]
pub struct DbText {
    pub text: String,
    /// None inherits the datablock base color.
    pub color: Option<Rgb>,
    pub flashing: bool,
}

impl DbText {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            flashing: false,
        }
    }

    #[must_use]
    pub fn colored(text: impl Into<String>, color: Rgb) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            flashing: false,
        }
    }

    #[must_use]
    pub fn flashing(mut self) -> Self {
        self.flashing = true;
        self
    }
}

/// A composed datablock: lines of text runs plus the multiplex bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Datablock {
    pub db_type: DatablockType,
    /// Field 0 alert annotations, drawn above the block.
    pub alerts: Vec<DbText>,
    pub lines: Vec<Vec<DbText>>,
    pub cycles: usize,
    pub active_cycle: usize,
}

/// Inputs the scope precomputes per track before composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatablockFlags {
    pub beaconator: bool,
    pub displayed_beacon_match: bool,
    pub inbound_point_out: bool,
    pub quick_looked: bool,
    pub quick_looked_plus: bool,
    pub force_ql: bool,
    pub dwelled: bool,
}

/// Half-second counter from the wall clock; flash phases key off parity.
#[must_use]
pub fn half_seconds(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis() / 500
}

/// Multiplex cycle selection. Cycle 0 spans 4 half-seconds, later cycles 3.
#[must_use]
pub fn active_cycle(num_cycles: usize, now: DateTime<Utc>) -> usize {
    if num_cycles <= 1 {
        return 0;
    }
    let full = 4 + 3 * (num_cycles as i64 - 1);
    let mut hs = half_seconds(now).rem_euclid(full);
    if hs < 4 {
        return 0;
    }
    hs -= 4;
    1 + (hs / 3) as usize
}

/// Select the datablock shape for a track.
#[must_use]
pub fn datablock_type(
    trk: &Track,
    state: &TrackState,
    prefs: &Preferences,
    table: &TrackTable,
    conflicts: &ConflictMonitor,
    user_tcp: &str,
    now: DateTime<Utc>,
    flags: DatablockFlags,
) -> DatablockType {
    let Some(fp) = &trk.flight_plan else {
        return DatablockType::Limited;
    };
    if fp.suspended {
        return DatablockType::Suspended;
    }
    if flags.beaconator || flags.displayed_beacon_match {
        return DatablockType::Full;
    }
    let redirected_to_us = fp.redirected_handoff.redirected_to == user_tcp;
    let original_owner_us = fp.redirected_handoff.is_active()
        && fp.redirected_handoff.original_owner == user_tcp;
    if fp.tracking_controller == user_tcp
        || fp.handoff_track_controller == user_tcp
        || state.display_fdb
        || has_active_alerts(trk, state, conflicts)
        || flags.inbound_point_out
        || state.point_out_acknowledged
        || state.force_ql
        || table.force_ql_acids.contains(&fp.acid)
        || redirected_to_us
        || original_owner_us
        || (prefs.common.overflight_full_datablocks
            && fp.type_of_flight == sim_state::TypeOfFlight::Overflight)
        || flags.quick_looked
        || (state.outbound_handoff_accepted
            && state
                .outbound_handoff_flash_end
                .is_some_and(|end| now < end))
    {
        return DatablockType::Full;
    }
    DatablockType::Partial
}

fn has_active_alerts(trk: &Track, state: &TrackState, conflicts: &ConflictMonitor) -> bool {
    if state.msaw && !state.msaw_acknowledged {
        return true;
    }
    if trk.squawk.is_spc() && !state.spc_acknowledged {
        return true;
    }
    if conflicts
        .ca_for(&trk.adsb_callsign)
        .is_some_and(|c| !c.acknowledged)
    {
        return true;
    }
    if conflicts
        .mci_for(&trk.adsb_callsign)
        .is_some_and(|c| !c.acknowledged)
    {
        return true;
    }
    false
}

/// Color class and brightness for a track's datablock.
///
/// The returned brightness is 0-100; a forced FDB flashes by halving its
/// brightness on even half-seconds.
#[must_use]
pub fn datablock_color_brightness(
    trk: &Track,
    state: &TrackState,
    prefs: &Preferences,
    table: &TrackTable,
    user_tcp: &str,
    now: DateTime<Utc>,
    flags: DatablockFlags,
    db_type: DatablockType,
) -> (ColorClass, Rgb, u8) {
    let fp = trk.flight_plan.as_ref();

    let force_fdb = state.display_fdb
        || flags.displayed_beacon_match
        || (state.outbound_handoff_accepted
            && state
                .outbound_handoff_flash_end
                .is_some_and(|end| now < end));

    let class = if state.is_selected {
        ColorClass::Selected
    } else if fp.is_none() {
        ColorClass::Untracked
    } else if flags.force_ql
        || table
            .force_ql_acids
            .contains(fp.map_or("", |fp| fp.acid.as_str()))
        || state.point_out_acknowledged
        || flags.inbound_point_out
        || state.datablock_alert
    {
        ColorClass::Alert
    } else if fp.is_some_and(|fp| {
        fp.tracking_controller == user_tcp
            || fp.redirected_handoff.redirected_to == user_tcp
            || fp.handoff_track_controller == user_tcp
    }) || state.outbound_handoff_accepted
        || (prefs.quick_look_all && prefs.quick_look_all_is_plus)
        || flags.quick_looked_plus
    {
        ColorClass::Tracked
    } else {
        ColorClass::Untracked
    };

    let color = match class {
        ColorClass::Selected => SELECTED_COLOR,
        ColorClass::Untracked => UNTRACKED_COLOR,
        ColorClass::Tracked => TRACKED_COLOR,
        ColorClass::Alert => ALERT_COLOR,
    };

    let mut brightness = if flags.dwelled {
        100
    } else if force_fdb || db_type == DatablockType::Full && fp.is_some_and(|fp| fp.tracking_controller == user_tcp) {
        prefs.common.brightness.full_datablocks
    } else if db_type == DatablockType::Partial || db_type == DatablockType::Limited {
        prefs.common.brightness.limited_datablocks
    } else if db_type == DatablockType::Full {
        prefs.common.brightness.other_tracks
    } else {
        prefs.common.brightness.full_datablocks
    };

    if force_fdb && !flags.dwelled && half_seconds(now) % 2 == 0 {
        brightness /= 2;
    }

    (class, color, brightness)
}

/// Altitude field: hundreds of feet, three digits.
///
/// Unreasonable mode C renders "XXX", negative altitudes "N" plus two
/// digits, mode-C-inhibited plans "***", and standby transponders "RDR"
/// while the extended window is open.
#[must_use]
pub fn format_altitude(trk: &Track, state: &TrackState, now: DateTime<Utc>) -> String {
    if state.unreasonable_mode_c {
        return "XXX".to_string();
    }
    if trk
        .flight_plan
        .as_ref()
        .is_some_and(|fp| fp.inhibit_mode_c_altitude_display)
    {
        return "***".to_string();
    }
    match trk.mode {
        TransponderMode::Standby => {
            if state.full_ldb_end.is_some_and(|end| now < end) {
                "RDR".to_string()
            } else {
                String::new()
            }
        }
        TransponderMode::On => String::new(),
        TransponderMode::Altitude => {
            let alt = trk.separation_altitude();
            if alt < 0 {
                format!("N{:02}", (-alt + 50) / 100)
            } else {
                format!("{:03}", (alt + 50) / 100)
            }
        }
    }
}

/// Groundspeed field: tens of knots, two digits.
#[must_use]
pub fn format_groundspeed(gs: f64) -> String {
    format!("{:02}", ((gs as i32) + 5) / 10)
}

/// Handoff id shown beside the altitude: the single-character TCP digit for
/// intrafacility handoffs, the facility id for interfacility ones.
#[must_use]
pub fn handoff_id(trk: &Track, world: &World) -> String {
    let Some(fp) = &trk.flight_plan else {
        return String::new();
    };
    let ho = if fp.redirected_handoff.is_active() {
        &fp.redirected_handoff.redirected_to
    } else {
        &fp.handoff_track_controller
    };
    if ho.is_empty() {
        return String::new();
    }
    match world.controllers.get(ho) {
        Some(ctrl) if !ctrl.facility_identifier.is_empty() => ctrl.facility_identifier.clone(),
        Some(ctrl) => ctrl.tcp.chars().skip(1).take(1).collect(),
        None => ho.clone(),
    }
}

/// Scratchpad 1, with the adapted exit-fix fallback when blank.
#[must_use]
pub fn scratchpad1(trk: &Track, world: &World) -> String {
    let Some(fp) = &trk.flight_plan else {
        return String::new();
    };
    if !fp.scratchpad.is_empty() {
        return fp.scratchpad.clone();
    }
    let sp1 = &world.facility_adaptation.scratchpad1;
    if (sp1.display_exit_fix || sp1.display_exit_fix1 || sp1.display_exit_gate
        || sp1.display_alt_exit_gate)
        && !fp.exit_fix.is_empty()
    {
        return fp.exit_fix.chars().take(3).collect();
    }
    String::new()
}

/// Field 0 alert annotations for a track.
#[must_use]
pub fn datablock_alerts(
    trk: &Track,
    state: &TrackState,
    world: &World,
    conflicts: &ConflictMonitor,
) -> Vec<DbText> {
    let mut alerts = Vec::new();

    let ca = conflicts.ca_for(&trk.adsb_callsign);
    let mci = conflicts.mci_for(&trk.adsb_callsign);
    if let Some(c) = ca.or(mci) {
        let mut t = DbText::colored("CA", TEXT_ALERT_COLOR);
        if !c.acknowledged {
            t = t.flashing();
        }
        alerts.push(t);
    }

    if let Some(spc) = spc_for_code(trk.squawk) {
        let mut t = DbText::colored(spc, TEXT_ALERT_COLOR);
        if !state.spc_acknowledged {
            t = t.flashing();
        }
        alerts.push(t);
    }

    if state.msaw && !state.inhibit_msaw {
        let mut t = DbText::colored("LA", TEXT_ALERT_COLOR);
        if !state.msaw_acknowledged {
            t = t.flashing();
        }
        alerts.push(t);
    }

    if let Some(fp) = &trk.flight_plan {
        if !fp.spc_override.is_empty() {
            let color = if is_standard_spc(&fp.spc_override) {
                TEXT_ALERT_COLOR
            } else {
                TEXT_WARNING_COLOR
            };
            alerts.push(DbText::colored(fp.spc_override.clone(), color));
        }
    }

    if world.fused_radar_mode && trk.missing_altitude && trk.is_associated() {
        alerts.push(DbText::plain("ISR"));
    }

    alerts
}

/// Compose the datablock for one track.
#[allow(clippy::too_many_arguments, reason = "composition reads the whole frame state")]
#[must_use]
pub fn compose(
    trk: &Track,
    state: &TrackState,
    prefs: &Preferences,
    world: &World,
    table: &TrackTable,
    conflicts: &ConflictMonitor,
    user_tcp: &str,
    now: DateTime<Utc>,
    flags: DatablockFlags,
) -> Datablock {
    let db_type = datablock_type(trk, state, prefs, table, conflicts, user_tcp, now, flags);
    match db_type {
        DatablockType::Limited => compose_limited(trk, state, world, conflicts, now, flags),
        DatablockType::Partial => compose_partial(trk, state, world, conflicts, now),
        DatablockType::Full | DatablockType::Ghost => {
            compose_full(trk, state, prefs, world, table, conflicts, user_tcp, now, flags)
        }
        DatablockType::Suspended => compose_suspended(trk, state, world, conflicts, now),
    }
}

fn compose_limited(
    trk: &Track,
    state: &TrackState,
    world: &World,
    conflicts: &ConflictMonitor,
    now: DateTime<Utc>,
    flags: DatablockFlags,
) -> Datablock {
    let extended = state.full_ldb_end.is_some_and(|end| now < end);
    let mut line1 = Vec::new();
    let mut code = trk.squawk.to_string();
    if trk.ident {
        code.push_str(" ID");
    }
    let mut beacon = DbText::plain(code);
    if trk.ident {
        beacon.flashing = true;
    }
    if flags.displayed_beacon_match {
        beacon.color = Some(TEXT_WARNING_COLOR);
        beacon.flashing = true;
    }
    line1.push(beacon);

    let mut line2 = vec![DbText::plain(format_altitude(trk, state, now))];
    if extended {
        line2.push(DbText::plain(format_groundspeed(trk.groundspeed)));
    }

    let mut lines = vec![line1, line2];
    if extended || flags.beaconator {
        lines.push(vec![DbText::plain(trk.adsb_callsign.clone())]);
    }

    Datablock {
        db_type: DatablockType::Limited,
        alerts: datablock_alerts(trk, state, world, conflicts),
        lines,
        cycles: 1,
        active_cycle: 0,
    }
}

fn compose_suspended(
    trk: &Track,
    state: &TrackState,
    world: &World,
    conflicts: &ConflictMonitor,
    now: DateTime<Utc>,
) -> Datablock {
    let fp = trk.flight_plan.as_ref();
    let index = fp.map_or(0, |fp| fp.coast_suspend_index);
    let mut line2 = vec![DbText::plain(format!("SP{index}"))];
    if state.suspended_show_altitude_end.is_some_and(|end| now < end) {
        line2.push(DbText::plain(format_altitude(trk, state, now)));
    }
    Datablock {
        db_type: DatablockType::Suspended,
        alerts: datablock_alerts(trk, state, world, conflicts),
        lines: vec![
            vec![DbText::plain(fp.map_or(String::new(), |fp| fp.acid.clone()))],
            line2,
        ],
        cycles: 1,
        active_cycle: 0,
    }
}

#[allow(clippy::too_many_arguments, reason = "composition reads the whole frame state")]
fn compose_partial(
    trk: &Track,
    state: &TrackState,
    world: &World,
    conflicts: &ConflictMonitor,
    now: DateTime<Utc>,
) -> Datablock {
    let fp = trk.flight_plan.as_ref();
    let pdb = &world.facility_adaptation.pdb;

    // Time-sliced first field: altitude, then scratchpads when adapted
    let alt = format_altitude(trk, state, now);
    let ho = handoff_id(trk, world);
    let pilot_reported = fp.is_some_and(|fp| fp.pilot_reported_altitude != 0);
    let mut slices: Vec<String> = Vec::new();
    slices.push(format!(
        "{alt}{}",
        if pilot_reported { "*" } else { &ho }
    ));
    let sp1 = scratchpad1(trk, world);
    if !sp1.is_empty() {
        slices.push(sp1);
    }
    if pdb.show_scratchpad2 {
        if let Some(fp) = fp {
            if !fp.secondary_scratchpad.is_empty() {
                slices.push(format!("{}+", fp.secondary_scratchpad));
            }
        }
    }

    let cycles = slices.len().max(1);
    let cycle = active_cycle(cycles, now);

    let mut line2 = vec![DbText::plain(slices[cycle.min(slices.len() - 1)].clone())];

    if !pdb.hide_groundspeed {
        let mut f3 = format_groundspeed(trk.groundspeed);
        if let Some(fp) = fp {
            f3.push_str(fp.rules.suffix());
            if pdb.split_gs_and_cwt {
                f3.push(' ');
            }
            f3.push_str(&fp.cwt_category);
        }
        line2.push(DbText::plain(f3));
    }
    if pdb.show_aircraft_type && cycle == 1 {
        if let Some(fp) = fp {
            line2.push(DbText::plain(fp.aircraft_type.clone()));
        }
    }
    if trk.ident {
        line2.push(DbText::plain("ID").flashing());
    }

    Datablock {
        db_type: DatablockType::Partial,
        alerts: datablock_alerts(trk, state, world, conflicts),
        lines: vec![Vec::new(), line2],
        cycles,
        active_cycle: cycle,
    }
}

#[allow(clippy::too_many_arguments, reason = "composition reads the whole frame state")]
fn compose_full(
    trk: &Track,
    state: &TrackState,
    prefs: &Preferences,
    world: &World,
    table: &TrackTable,
    conflicts: &ConflictMonitor,
    user_tcp: &str,
    now: DateTime<Utc>,
    flags: DatablockFlags,
) -> Datablock {
    let fp = trk.flight_plan.as_ref();
    let fa = &world.facility_adaptation;

    // Field 1: ACID, or the squawk under the beaconator
    let field1 = if flags.beaconator {
        trk.squawk.to_string()
    } else {
        fp.map_or_else(|| trk.adsb_callsign.clone(), |fp| fp.acid.clone())
    };

    // Field 2 inhibit markers
    let field2 = match fp {
        Some(fp) if state.inhibit_msaw && fp.disable_ca => "+".to_string(),
        Some(_) if state.inhibit_msaw => "*".to_string(),
        Some(fp) if fp.disable_ca || fp.mci_suppressed_code != Squawk::default() => {
            TRIANGLE.to_string()
        }
        _ => String::new(),
    };

    // Field 8: point-out and redirect indicators
    let mut field8 = DbText::plain("");
    let acid = fp.map_or("", |fp| fp.acid.as_str());
    if table
        .point_outs
        .get(acid)
        .is_some_and(|po| po.to == user_tcp)
    {
        field8 = DbText::plain("PO");
    } else if state.po_flash_end.is_some_and(|end| now < end) {
        field8 = DbText::plain("PO").flashing();
    } else if state.un_flash_end.is_some_and(|end| now < end) {
        field8 = DbText::plain("UN").flashing();
    } else if state.rd_indicator_end.is_some_and(|end| now < end) {
        field8 = DbText::plain("RD");
    }

    // Fields 3/4 multiplex: altitude + handoff id, sp1, handoff TCP / sp2
    let alt = format_altitude(trk, state, now);
    let ho = handoff_id(trk, world);
    let pilot_reported = fp.is_some_and(|fp| fp.pilot_reported_altitude != 0);
    let mut f34: Vec<String> = vec![format!(
        "{alt}{}",
        if pilot_reported { "*" } else { &ho }
    )];
    let sp1 = scratchpad1(trk, world);
    if !sp1.is_empty() {
        f34.push(format!("{sp1}{ho}"));
    }
    if let Some(fp) = fp {
        let sector_visible = state
            .accepted_handoff_display_end
            .is_some_and(|end| now < end);
        if !fp.handoff_track_controller.is_empty() && fp.handoff_track_controller != user_tcp {
            f34.push(fp.handoff_track_controller.clone());
        } else if sector_visible && !state.accepted_handoff_sector.is_empty() {
            f34.push(state.accepted_handoff_sector.clone());
        } else if !fa.fdb.scratchpad2_on_line3 && !fp.secondary_scratchpad.is_empty() {
            f34.push(format!("{}+", fp.secondary_scratchpad));
        }
    }

    // Field 5 multiplex: groundspeed+rules+CWT, then type / requested alt
    let mut f5: Vec<DbText> = Vec::new();
    if state.if_flashing {
        f5.push(DbText::plain("IF").flashing());
    } else if fp.is_some_and(|fp| fp.hold_state) {
        let cwt = fp.map_or(String::new(), |fp| fp.cwt_category.clone());
        f5.push(DbText::plain(format!("HL{cwt}")));
    } else {
        let mut gs = format_groundspeed(trk.groundspeed);
        if let Some(fp) = fp {
            gs.push_str(fp.rules.suffix());
            gs.push_str(&fp.cwt_category);
        }
        f5.push(DbText::plain(gs));
    }
    let show_type = fp.is_some()
        && !trk.ident
        && (!state.inhibit_actype_display
            || state.force_actype_display_end.is_some_and(|end| now < end));
    if show_type {
        if let Some(fp) = fp {
            let rnav = if fp.rnav { "^" } else { "" };
            f5.push(DbText::plain(format!("{}{rnav}", fp.aircraft_type)));
        }
    }
    let show_requested = state
        .display_requested_altitude
        .unwrap_or(prefs.common.display_requested_altitude);
    if show_requested {
        if let Some(fp) = fp {
            if fp.requested_altitude != 0 {
                f5.push(DbText::plain(format!("R{:03}", fp.requested_altitude / 100)));
            }
        }
    }
    if trk.ident {
        f5.push(DbText::plain("ID").flashing());
    }

    // Field 6: ATPA in-trail distance, duplicate beacon, or beacon mismatch
    let mut f6: Vec<DbText> = Vec::new();
    let show_tpa = state.display_tpa_size.unwrap_or(prefs.common.display_tpa_size);
    if show_tpa && state.jring_radius > 0.0 {
        f6.push(DbText::plain(format!("*TPA {:.1}", state.jring_radius)));
    }
    if state.atpa_status != AtpaStatus::Unset
        && state
            .display_atpa_in_trail_dist
            .unwrap_or(prefs.common.display_atpa_in_trail_dist)
        && state.intrail_distance > 0.0
    {
        let color = match state.atpa_status {
            AtpaStatus::Alert => ATPA_ALERT_COLOR,
            AtpaStatus::Warning => ATPA_WARNING_COLOR,
            _ => ATPA_MONITOR_COLOR,
        };
        f6.push(DbText::colored(
            format!("{:.2}", state.intrail_distance),
            color,
        ));
    }
    if state.duplicate_beacon && state.db_acknowledged != Some(trk.squawk) {
        f6.push(DbText::plain("DB").flashing());
    } else if let Some(fp) = fp {
        if fp.assigned_squawk != trk.squawk && fp.assigned_squawk != Squawk::default() {
            f6.push(DbText::plain(trk.squawk.to_string()));
        }
    }

    // Field 7: assigned altitude and/or assigned beacon
    let mut f7: Vec<DbText> = Vec::new();
    if let Some(fp) = fp {
        if fp.assigned_altitude != 0 {
            f7.push(DbText::plain(format!("A{:03}", fp.assigned_altitude / 100)));
        }
        if fp.assigned_squawk != trk.squawk && fp.assigned_squawk != Squawk::default() {
            f7.push(DbText::plain(fp.assigned_squawk.to_string()).flashing());
        }
    }

    let cycles = f34.len().max(f5.len()).max(f6.len().max(1)).max(f7.len().max(1));
    let cycle = active_cycle(cycles, now);

    let pick = |v: &[DbText], cycle: usize| -> Option<DbText> {
        if v.is_empty() {
            None
        } else {
            Some(v[cycle.min(v.len() - 1)].clone())
        }
    };

    let mut line1 = vec![field8, DbText::plain(field1)];
    if !field2.is_empty() {
        line1.push(DbText::plain(field2));
    }
    let f34_text = DbText::plain(f34[cycle.min(f34.len() - 1)].clone());
    let mut line2 = vec![f34_text];
    if let Some(t) = pick(&f5, cycle) {
        line2.push(t);
    }
    if let Some(t) = pick(&f6, cycle) {
        line2.push(t);
    }
    if let Some(t) = pick(&f7, cycle) {
        line2.push(t);
    }

    let mut lines = vec![line1, line2];
    if fa.fdb.scratchpad2_on_line3 {
        if let Some(fp) = fp {
            if !fp.secondary_scratchpad.is_empty() || fp.assigned_altitude != 0 {
                lines.push(vec![DbText::plain(format!(
                    "{}+{}",
                    fp.secondary_scratchpad,
                    if fp.assigned_altitude != 0 {
                        format!(" A{:03}", fp.assigned_altitude / 100)
                    } else {
                        String::new()
                    }
                ))]);
            }
        }
    }

    Datablock {
        db_type: DatablockType::Full,
        alerts: datablock_alerts(trk, state, world, conflicts),
        lines,
        cycles,
        active_cycle: cycle,
    }
}

/// Is the track's datablock drawn at all this frame?
#[must_use]
pub fn datablock_visible(
    trk: &Track,
    state: &TrackState,
    prefs: &Preferences,
    table: &TrackTable,
    user_tcp: &str,
    now: DateTime<Utc>,
    flags: DatablockFlags,
) -> bool {
    if state.lost_track(now) {
        return false;
    }
    if trk.unsupported_db {
        return true;
    }
    if flags.displayed_beacon_match {
        return true;
    }
    if let Some(fp) = &trk.flight_plan {
        if fp.tracking_controller == user_tcp
            || fp.controlling_controller == user_tcp
            || fp.handoff_track_controller == user_tcp
            || fp.redirected_handoff.is_active()
            || table.point_outs.contains_key(&fp.acid)
            || trk.squawk.is_spc()
            || !fp.spc_override.is_empty()
            || flags.quick_looked
            || state.force_ql
        {
            return true;
        }
        let [lo, hi] = prefs.altitude_filters.associated;
        let alt = trk.separation_altitude();
        (lo..=hi).contains(&alt)
    } else {
        if trk.tentative {
            return false;
        }
        if trk.mode == TransponderMode::Standby && !state.full_ldb_end.is_some_and(|end| now < end)
        {
            return false;
        }
        if trk.squawk.is_spc() {
            return true;
        }
        let [lo, hi] = prefs.altitude_filters.unassociated;
        (lo..=hi).contains(&trk.transponder_altitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sim_state::FlightPlan;

    fn t0() -> DateTime<Utc> {
        // Even half-second boundary so flash phase is deterministic
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn mode_c_track(cs: &str, alt: i32) -> Track {
        Track {
            adsb_callsign: cs.to_string(),
            transponder_altitude: alt,
            groundspeed: 250.0,
            mode: TransponderMode::Altitude,
            squawk: Squawk(0o2345),
            ..Default::default()
        }
    }

    fn owned(cs: &str, tcp: &str) -> Track {
        let mut t = mode_c_track(cs, 5000);
        t.flight_plan = Some(FlightPlan {
            acid: cs.to_string(),
            tracking_controller: tcp.to_string(),
            ..Default::default()
        });
        t
    }

    #[test]
    fn altitude_boundaries() {
        let state = TrackState::default();
        let mut trk = mode_c_track("N1", 0);
        assert_eq!(format_altitude(&trk, &state, t0()), "000");
        trk.transponder_altitude = 99_950;
        assert_eq!(format_altitude(&trk, &state, t0()), "1000");
        trk.transponder_altitude = -500;
        assert_eq!(format_altitude(&trk, &state, t0()), "N06");
        trk.transponder_altitude = 5000;

        let mut latched = TrackState {
            unreasonable_mode_c: true,
            ..Default::default()
        };
        assert_eq!(format_altitude(&trk, &latched, t0()), "XXX");
        latched.unreasonable_mode_c = false;

        trk.flight_plan = Some(FlightPlan {
            inhibit_mode_c_altitude_display: true,
            ..Default::default()
        });
        assert_eq!(format_altitude(&trk, &latched, t0()), "***");
    }

    #[test]
    fn standby_shows_rdr_only_in_extended_window() {
        let mut trk = mode_c_track("N1", 5000);
        trk.mode = TransponderMode::Standby;
        let mut state = TrackState::default();
        assert_eq!(format_altitude(&trk, &state, t0()), "");
        state.full_ldb_end = Some(t0() + Duration::seconds(5));
        assert_eq!(format_altitude(&trk, &state, t0()), "RDR");
        assert_eq!(
            format_altitude(&trk, &state, t0() + Duration::seconds(6)),
            ""
        );
    }

    #[test]
    fn groundspeed_rounds_to_tens() {
        assert_eq!(format_groundspeed(140.0), "14");
        assert_eq!(format_groundspeed(146.0), "15");
        assert_eq!(format_groundspeed(5.0), "01");
    }

    #[test]
    fn unassociated_gets_limited() {
        let trk = mode_c_track("N1", 5000);
        let db = datablock_type(
            &trk,
            &TrackState::default(),
            &Preferences::default(),
            &TrackTable::new(),
            &ConflictMonitor::new(),
            "1J",
            t0(),
            DatablockFlags::default(),
        );
        assert_eq!(db, DatablockType::Limited);
    }

    #[test]
    fn owned_gets_full_other_gets_partial() {
        let trk = owned("AAL1", "1J");
        let table = TrackTable::new();
        let conflicts = ConflictMonitor::new();
        let prefs = Preferences::default();
        assert_eq!(
            datablock_type(
                &trk,
                &TrackState::default(),
                &prefs,
                &table,
                &conflicts,
                "1J",
                t0(),
                DatablockFlags::default()
            ),
            DatablockType::Full
        );
        assert_eq!(
            datablock_type(
                &trk,
                &TrackState::default(),
                &prefs,
                &table,
                &conflicts,
                "4M",
                t0(),
                DatablockFlags::default()
            ),
            DatablockType::Partial
        );
    }

    #[test]
    fn suspended_plan_gets_sdb() {
        let mut trk = owned("AAL1", "1J");
        trk.flight_plan.as_mut().unwrap().suspended = true;
        assert_eq!(
            datablock_type(
                &trk,
                &TrackState::default(),
                &Preferences::default(),
                &TrackTable::new(),
                &ConflictMonitor::new(),
                "1J",
                t0(),
                DatablockFlags::default()
            ),
            DatablockType::Suspended
        );
    }

    #[test]
    fn multiplex_cycle_progression() {
        // One cycle: always 0
        assert_eq!(active_cycle(1, t0()), 0);
        // Three cycles: full period 10 half-seconds; 0 for hs 0-3, 1 for
        // 4-6, 2 for 7-9
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let hs = |n: i64| base + Duration::milliseconds(500 * n);
        let period = 10;
        let offset = half_seconds(base).rem_euclid(period);
        let at = |n: i64| active_cycle(3, hs((n - offset).rem_euclid(period) + period));
        assert_eq!(at(0), 0);
        assert_eq!(at(3), 0);
        assert_eq!(at(4), 1);
        assert_eq!(at(6), 1);
        assert_eq!(at(7), 2);
        assert_eq!(at(9), 2);
    }

    #[test]
    fn color_classes() {
        let prefs = Preferences::default();
        let table = TrackTable::new();
        let trk = owned("AAL1", "1J");

        let (class, _, _) = datablock_color_brightness(
            &trk,
            &TrackState::default(),
            &prefs,
            &table,
            "1J",
            t0(),
            DatablockFlags::default(),
            DatablockType::Full,
        );
        assert_eq!(class, ColorClass::Tracked);

        let (class, _, _) = datablock_color_brightness(
            &trk,
            &TrackState::default(),
            &prefs,
            &table,
            "4M",
            t0(),
            DatablockFlags::default(),
            DatablockType::Partial,
        );
        assert_eq!(class, ColorClass::Untracked);

        let selected = TrackState {
            is_selected: true,
            ..Default::default()
        };
        let (class, _, _) = datablock_color_brightness(
            &trk,
            &selected,
            &prefs,
            &table,
            "4M",
            t0(),
            DatablockFlags::default(),
            DatablockType::Partial,
        );
        assert_eq!(class, ColorClass::Selected);

        let po = TrackState {
            point_out_acknowledged: true,
            ..Default::default()
        };
        let (class, _, _) = datablock_color_brightness(
            &trk,
            &po,
            &prefs,
            &table,
            "4M",
            t0(),
            DatablockFlags::default(),
            DatablockType::Full,
        );
        assert_eq!(class, ColorClass::Alert);
    }

    #[test]
    fn dwell_forces_full_brightness() {
        let prefs = Preferences::default();
        let (_, _, brightness) = datablock_color_brightness(
            &owned("AAL1", "1J"),
            &TrackState::default(),
            &prefs,
            &TrackTable::new(),
            "1J",
            t0(),
            DatablockFlags {
                dwelled: true,
                ..Default::default()
            },
            DatablockType::Full,
        );
        assert_eq!(brightness, 100);
    }

    #[test]
    fn ca_alert_flashes_until_acknowledged() {
        use crate::conflict::Conflict;
        let mut conflicts = ConflictMonitor::new();
        conflicts.ca.push(Conflict {
            callsigns: ["AAL1".to_string(), "UAL2".to_string()],
            acknowledged: false,
            start: t0(),
            sound_end: t0(),
        });
        let trk = owned("AAL1", "1J");
        let world = World::default();
        let alerts = datablock_alerts(&trk, &TrackState::default(), &world, &conflicts);
        assert_eq!(alerts[0].text, "CA");
        assert!(alerts[0].flashing);
        assert_eq!(alerts[0].color, Some(TEXT_ALERT_COLOR));

        conflicts.acknowledge_ca("AAL1");
        let alerts = datablock_alerts(&trk, &TrackState::default(), &world, &conflicts);
        assert!(!alerts[0].flashing);
    }

    #[test]
    fn spc_and_msaw_alerts() {
        let mut trk = owned("AAL1", "1J");
        trk.squawk = Squawk(0o7700);
        let state = TrackState {
            msaw: true,
            ..Default::default()
        };
        let alerts = datablock_alerts(
            &trk,
            &state,
            &World::default(),
            &ConflictMonitor::new(),
        );
        let texts: Vec<&str> = alerts.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["EM", "LA"]);
    }

    #[test]
    fn visibility_filters() {
        let prefs = Preferences::default();
        let table = TrackTable::new();

        // Lost track never draws
        let trk = owned("AAL1", "4M");
        let mut lost = TrackState::default();
        lost.first_radar_track = Some(t0() - Duration::seconds(60));
        lost.track_time = t0() - Duration::seconds(60);
        assert!(!datablock_visible(
            &trk,
            &lost,
            &prefs,
            &table,
            "1J",
            t0(),
            DatablockFlags::default()
        ));

        // Associated track outside the filter band is hidden unless owned
        let mut prefs2 = Preferences::default();
        prefs2.altitude_filters.associated = [100, 4000];
        assert!(!datablock_visible(
            &trk,
            &TrackState::default(),
            &prefs2,
            &table,
            "1J",
            t0(),
            DatablockFlags::default()
        ));
        let ours = owned("AAL1", "1J");
        assert!(datablock_visible(
            &ours,
            &TrackState::default(),
            &prefs2,
            &table,
            "1J",
            t0(),
            DatablockFlags::default()
        ));

        // Tentative unassociated tracks are suppressed
        let mut tentative = mode_c_track("N1", 5000);
        tentative.tentative = true;
        assert!(!datablock_visible(
            &tentative,
            &TrackState::default(),
            &prefs,
            &table,
            "1J",
            t0(),
            DatablockFlags::default()
        ));
    }

    #[test]
    fn full_datablock_carries_handoff_and_scratchpad_cycles() {
        let mut world = World::default();
        world.controllers.insert(
            "4M".to_string(),
            sim_state::Controller {
                tcp: "4M".to_string(),
                ..Default::default()
            },
        );
        let mut trk = owned("AAL1", "1J");
        {
            let fp = trk.flight_plan.as_mut().unwrap();
            fp.scratchpad = "GDM".to_string();
            fp.handoff_track_controller = "4M".to_string();
        }
        let db = compose(
            &trk,
            &TrackState::default(),
            &Preferences::default(),
            &world,
            &TrackTable::new(),
            &ConflictMonitor::new(),
            "1J",
            t0(),
            DatablockFlags::default(),
        );
        assert_eq!(db.db_type, DatablockType::Full);
        assert!(db.cycles >= 2);
        assert_eq!(db.lines[0][1].text, "AAL1");
    }

    #[test]
    fn duplicate_beacon_shows_flashing_db() {
        let trk = owned("AAL1", "1J");
        let state = TrackState {
            duplicate_beacon: true,
            ..Default::default()
        };
        let db = compose(
            &trk,
            &state,
            &Preferences::default(),
            &World::default(),
            &TrackTable::new(),
            &ConflictMonitor::new(),
            "1J",
            t0(),
            DatablockFlags::default(),
        );
        let has_db = db
            .lines
            .iter()
            .flatten()
            .any(|t| t.text == "DB" && t.flashing);
        assert!(has_db);
    }
}
