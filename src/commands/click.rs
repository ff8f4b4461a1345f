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

//! Track click dispatch: pending click handlers, mode-aware actions, and
//! the ordered acknowledgment cascade on a bare slew.

use chrono::Duration;
use sim_state::{FlightPlanSpecifier, LatLong};

use super::{lookup, CommandContext, CommandMode, CommandProcessor, CommandStatus, PendingClick, RblEndpoint};
use crate::errors::ScopeError;

/// Mouse button of a scope click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickButton {
    Left,
    Middle,
}

fn endpoint_position(ctx: &CommandContext, ep: &RblEndpoint) -> Option<LatLong> {
    match ep {
        RblEndpoint::Aircraft(callsign) => ctx.world.tracks.get(callsign).map(|t| t.location),
        RblEndpoint::Point(p) => Some(*p),
    }
}

/// Handle a click on the scope at `location`, optionally over an aircraft.
pub fn scope_click(
    proc: &mut CommandProcessor,
    ctx: &mut CommandContext,
    location: LatLong,
    callsign: Option<&str>,
    button: ClickButton,
) -> Result<CommandStatus, ScopeError> {
    // Pending handlers consume the click regardless of what is under it
    match std::mem::take(&mut proc.pending_click) {
        PendingClick::RblSecond(first) => {
            let second = callsign.map_or(RblEndpoint::Point(location), |cs| {
                RblEndpoint::Aircraft(cs.to_string())
            });
            let p0 = endpoint_position(ctx, &first).ok_or(ScopeError::NoTrack)?;
            let p1 = endpoint_position(ctx, &second).ok_or(ScopeError::NoTrack)?;
            let nm = ctx.world.nm_per_longitude;
            let brg = p0.heading_to(p1, nm) + ctx.world.magnetic_variation;
            let dist = p0.distance_nm(p1, nm);
            proc.rbls.push((first, second));
            return Ok(CommandStatus::output(format!(
                "{:03.0}/{dist:.2}",
                (brg + 360.0) % 360.0
            )));
        }
        PendingClick::MinSepSecond(first) => {
            let Some(second) = callsign else {
                return Err(ScopeError::NoTrack);
            };
            let a = ctx.world.tracks.get(&first).ok_or(ScopeError::NoTrack)?;
            let b = ctx.world.tracks.get(second).ok_or(ScopeError::NoTrack)?;
            let dist = a
                .location
                .distance_nm(b.location, ctx.world.nm_per_longitude);
            return Ok(CommandStatus::output(format!("{dist:.2}NM")));
        }
        PendingClick::None => {}
    }

    // `*T` arms a range-bearing line; the click supplies the first endpoint
    if proc.preview == "*T" && button == ClickButton::Left {
        let first = callsign.map_or(RblEndpoint::Point(location), |cs| {
            RblEndpoint::Aircraft(cs.to_string())
        });
        proc.pending_click = PendingClick::RblSecond(first);
        return Ok(CommandStatus::cleared());
    }

    let Some(callsign) = callsign else {
        return Ok(CommandStatus::default());
    };

    track_click(proc, ctx, callsign, button)
}

/// Dispatch a click on an aircraft according to the current mode.
pub fn track_click(
    proc: &mut CommandProcessor,
    ctx: &mut CommandContext,
    callsign: &str,
    button: ClickButton,
) -> Result<CommandStatus, ScopeError> {
    if button == ClickButton::Middle {
        let selected = ctx
            .table
            .states
            .get(callsign)
            .is_some_and(|s| s.is_selected);
        for (cs, state) in &mut ctx.table.states {
            state.is_selected = cs == callsign && !selected;
        }
        return Ok(CommandStatus::cleared());
    }

    let trk = ctx.world.tracks.get(callsign).ok_or(ScopeError::NoTrack)?;
    let acid = trk
        .flight_plan
        .as_ref()
        .map(|fp| fp.acid.clone())
        .unwrap_or_default();

    match proc.mode {
        CommandMode::InitiateControl => {
            let target = if acid.is_empty() { callsign } else { &acid };
            ctx.sim
                .initiate_track(target, callsign)
                .map_err(ScopeError::from)?;
            if let Some(state) = ctx.table.states.get_mut(callsign) {
                state.display_fdb = true;
            }
            Ok(CommandStatus::cleared())
        }
        CommandMode::TerminateControl => {
            if acid.is_empty() {
                return Err(ScopeError::NoFlight);
            }
            ctx.sim.drop_track(&acid).map_err(ScopeError::from)?;
            if let Some(state) = ctx.table.states.get_mut(callsign) {
                state.display_fdb = false;
            }
            Ok(CommandStatus::cleared())
        }
        CommandMode::Handoff => {
            if acid.is_empty() {
                return Err(ScopeError::NoFlight);
            }
            if proc.preview.is_empty() {
                ctx.sim.accept_handoff(&acid).map_err(ScopeError::from)?;
                if let Some(state) = ctx.table.states.get_mut(callsign) {
                    state.display_fdb = true;
                    state.outbound_handoff_accepted = false;
                    state.outbound_handoff_flash_end = None;
                }
            } else {
                let id = proc.preview.clone();
                let ctrl = lookup::find_controller(ctx.world, ctx.user_tcp, &id)?;
                let to = ctrl.tcp.clone();
                ctx.sim.handoff_track(&acid, &to).map_err(ScopeError::from)?;
            }
            Ok(CommandStatus::cleared())
        }
        CommandMode::Min => {
            proc.pending_click = PendingClick::MinSepSecond(callsign.to_string());
            Ok(CommandStatus::cleared())
        }
        CommandMode::MultiFunc => multi_func_click(proc, ctx, callsign, &acid),
        CommandMode::None => none_mode_click(proc, ctx, callsign, &acid),
        _ => Err(ScopeError::IllegalFunction),
    }
}

fn multi_func_click(
    proc: &mut CommandProcessor,
    ctx: &mut CommandContext,
    callsign: &str,
    acid: &str,
) -> Result<CommandStatus, ScopeError> {
    let preview = proc.preview.clone();
    match proc.multi_func_prefix {
        Some('L') => {
            let c = preview.chars().next().ok_or(ScopeError::CommandFormat)?;
            if preview.chars().count() != 1 {
                return Err(ScopeError::CommandFormat);
            }
            let state = ctx
                .table
                .states
                .get_mut(callsign)
                .ok_or(ScopeError::NoTrack)?;
            if c == '5' {
                state.leader_line_direction = None;
            } else {
                let dir = lookup::numpad_direction(c, ctx.prefs.common.flip_numeric_keypad)
                    .ok_or(ScopeError::CommandFormat)?;
                state.leader_line_direction = Some(dir);
            }
            Ok(CommandStatus::cleared())
        }
        Some('Y') => {
            if acid.is_empty() {
                return Err(ScopeError::NoFlight);
            }
            if preview.len() == 3 && preview.chars().all(|c| c.is_ascii_digit()) {
                let hundreds: i32 = preview.parse().map_err(|_| ScopeError::IllegalValue)?;
                let spec = FlightPlanSpecifier {
                    pilot_reported_altitude: Some(hundreds * 100),
                    ..Default::default()
                };
                ctx.sim.modify_flight_plan(acid, spec).map_err(ScopeError::from)?;
                return Ok(CommandStatus::cleared());
            }
            let (text, secondary) = match preview.strip_prefix('+') {
                Some(rest) => (rest, true),
                None => (preview.as_str(), false),
            };
            lookup::validate_scratchpad(ctx.world, text, !secondary)?;
            let spec = if secondary {
                FlightPlanSpecifier {
                    secondary_scratchpad: Some(text.to_string()),
                    ..Default::default()
                }
            } else {
                FlightPlanSpecifier {
                    scratchpad: Some(text.to_string()),
                    ..Default::default()
                }
            };
            ctx.sim.modify_flight_plan(acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        Some('O') => {
            let history = ctx
                .table
                .outbound_point_out_history
                .get(acid)
                .filter(|tcps| !tcps.is_empty())
                .map_or_else(|| "PO NONE".to_string(), |tcps| tcps.join(" "));
            Ok(CommandStatus::output(history))
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

fn none_mode_click(
    proc: &mut CommandProcessor,
    ctx: &mut CommandContext,
    callsign: &str,
    acid: &str,
) -> Result<CommandStatus, ScopeError> {
    let preview = proc.preview.clone();
    if preview.is_empty() {
        return slew_cascade(proc, ctx, callsign, acid);
    }

    // Single numpad digit: per-aircraft leader override
    if preview.chars().count() == 1 {
        if let Some(c) = preview.chars().next() {
            if c.is_ascii_digit() {
                let state = ctx
                    .table
                    .states
                    .get_mut(callsign)
                    .ok_or(ScopeError::NoTrack)?;
                if c == '5' {
                    state.leader_line_direction = None;
                } else {
                    let dir = lookup::numpad_direction(c, ctx.prefs.common.flip_numeric_keypad)
                        .ok_or(ScopeError::CommandFormat)?;
                    state.leader_line_direction = Some(dir);
                }
                return Ok(CommandStatus::cleared());
            }
        }
    }

    // `*J(radius)`: J-ring on the clicked track; `*J` clears it
    if let Some(rest) = preview.strip_prefix("*J") {
        let radius = if rest.is_empty() {
            0.0
        } else {
            let r: f32 = rest.parse().map_err(|_| ScopeError::IllegalValue)?;
            if !(1.0..=30.0).contains(&r) {
                return Err(ScopeError::IllegalValue);
            }
            r
        };
        let state = ctx
            .table
            .states
            .get_mut(callsign)
            .ok_or(ScopeError::NoTrack)?;
        state.jring_radius = radius;
        return Ok(CommandStatus::cleared());
    }

    // Controller id: point out the clicked aircraft
    if let Ok(ctrl) = lookup::find_controller(ctx.world, ctx.user_tcp, &preview) {
        if acid.is_empty() {
            return Err(ScopeError::NoFlight);
        }
        let to = ctrl.tcp.clone();
        // The event echo records the outbound history entry
        ctx.sim.point_out(acid, &to).map_err(ScopeError::from)?;
        return Ok(CommandStatus::cleared());
    }

    // Scratchpad entry by slew
    if lookup::validate_scratchpad(ctx.world, &preview, true).is_ok() {
        if acid.is_empty() {
            return Err(ScopeError::NoFlight);
        }
        let spec = FlightPlanSpecifier {
            scratchpad: Some(preview),
            ..Default::default()
        };
        ctx.sim.modify_flight_plan(acid, spec).map_err(ScopeError::from)?;
        return Ok(CommandStatus::cleared());
    }

    Err(ScopeError::CommandFormat)
}

/// The ordered acknowledgment cascade for a bare slew in None mode.
fn slew_cascade(
    proc: &mut CommandProcessor,
    ctx: &mut CommandContext,
    callsign: &str,
    acid: &str,
) -> Result<CommandStatus, ScopeError> {
    let trk = ctx.world.tracks.get(callsign).ok_or(ScopeError::NoTrack)?;
    let fp = trk.flight_plan.as_ref();

    if let Some(fp) = fp {
        if fp.redirected_handoff.redirected_to == ctx.user_tcp {
            ctx.sim
                .accept_redirected_handoff(acid)
                .map_err(ScopeError::from)?;
            return Ok(CommandStatus::cleared());
        }
        if fp.handoff_track_controller == ctx.user_tcp {
            ctx.sim.accept_handoff(acid).map_err(ScopeError::from)?;
            if let Some(state) = ctx.table.states.get_mut(callsign) {
                state.display_fdb = true;
                state.outbound_handoff_accepted = false;
                state.outbound_handoff_flash_end = None;
            }
            return Ok(CommandStatus::cleared());
        }
    }

    if ctx.table.force_ql_acids.remove(acid) {
        if let Some(state) = ctx.table.states.get_mut(callsign) {
            state.force_ql = false;
        }
        return Ok(CommandStatus::cleared());
    }
    if let Some(state) = ctx.table.states.get_mut(callsign) {
        if state.force_ql {
            state.force_ql = false;
            return Ok(CommandStatus::cleared());
        }
    }

    let has_ca = ctx
        .conflicts
        .ca_for(callsign)
        .is_some_and(|c| !c.acknowledged);
    if has_ca {
        ctx.conflicts.acknowledge_ca(callsign);
        return Ok(CommandStatus::cleared());
    }
    let has_mci = ctx
        .conflicts
        .mci_for(callsign)
        .is_some_and(|c| !c.acknowledged);
    if has_mci {
        ctx.conflicts.acknowledge_mci(callsign);
        return Ok(CommandStatus::cleared());
    }

    if let Some(state) = ctx.table.states.get_mut(callsign) {
        if state.msaw && !state.msaw_acknowledged {
            state.msaw_acknowledged = true;
            return Ok(CommandStatus::cleared());
        }
        if trk.squawk.is_spc() && !state.spc_acknowledged {
            state.spc_acknowledged = true;
            return Ok(CommandStatus::cleared());
        }
    }

    if ctx
        .table
        .point_outs
        .get(acid)
        .is_some_and(|po| po.to == ctx.user_tcp)
    {
        ctx.sim
            .acknowledge_point_out(acid)
            .map_err(ScopeError::from)?;
        ctx.table.point_outs.remove(acid);
        if let Some(state) = ctx.table.states.get_mut(callsign) {
            state.point_out_acknowledged = true;
        }
        return Ok(CommandStatus::cleared());
    }

    if let Some(fp) = fp {
        if fp.tracking_controller == ctx.user_tcp && !fp.handoff_track_controller.is_empty() {
            ctx.sim.cancel_handoff(acid).map_err(ScopeError::from)?;
            return Ok(CommandStatus::cleared());
        }
    }

    if let Some(state) = ctx.table.states.get_mut(callsign) {
        if state.outbound_handoff_accepted {
            state.outbound_handoff_accepted = false;
            state.outbound_handoff_flash_end = None;
            return Ok(CommandStatus::cleared());
        }
        if state.if_flashing {
            state.if_flashing = false;
            return Ok(CommandStatus::cleared());
        }
        if state.duplicate_beacon && state.db_acknowledged != Some(trk.squawk) {
            state.db_acknowledged = Some(trk.squawk);
            return Ok(CommandStatus::cleared());
        }
        if state.datablock_alert {
            state.datablock_alert = false;
            return Ok(CommandStatus::cleared());
        }
    }

    // Nothing to acknowledge: toggle the datablock variant
    let owned = fp.is_some_and(|fp| fp.tracking_controller == ctx.user_tcp);
    let window = Duration::seconds(ctx.world.facility_adaptation.full_ldb_seconds);
    if let Some(state) = ctx.table.states.get_mut(callsign) {
        if fp.is_some() {
            state.display_fdb = !state.display_fdb;
        } else {
            state.full_ldb_end = Some(ctx.now + window);
        }
    }
    if owned {
        if let Some(fp) = fp {
            proc.preview = format!("{} {}", fp.acid, fp.assigned_squawk);
        }
    }
    Ok(CommandStatus::cleared())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Harness;
    use crate::commands::CommandProcessor;
    use sim_state::{CardinalOrdinal, Squawk};

    #[test]
    fn accept_handoff_by_click_seed() {
        let mut h = Harness::new();
        {
            let fp = h
                .world
                .tracks
                .get_mut("AAL1")
                .unwrap()
                .flight_plan
                .as_mut()
                .unwrap();
            fp.tracking_controller = "4M".to_string();
            fp.handoff_track_controller = "1J".to_string();
        }

        let mut proc = CommandProcessor::new();
        let status = track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert!(status.output.is_empty());
        assert!(h.sim.calls.contains(&"accept_handoff AAL1".to_string()));
        let state = h.table.states.get("AAL1").unwrap();
        assert!(state.display_fdb);
        assert!(!state.outbound_handoff_accepted);
    }

    #[test]
    fn cascade_acknowledges_msaw_before_variant_toggle() {
        let mut h = Harness::new();
        h.table.states.get_mut("AAL1").unwrap().msaw = true;

        let mut proc = CommandProcessor::new();
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert!(h.table.states.get("AAL1").unwrap().msaw_acknowledged);

        // Second slew has nothing left to acknowledge: writes the slew line
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert!(proc.preview.starts_with("AAL1"));
    }

    #[test]
    fn unassociated_slew_opens_extended_ldb() {
        let mut h = Harness::new();
        let mut proc = CommandProcessor::new();
        track_click(&mut proc, &mut h.ctx(), "N123AB", ClickButton::Left).unwrap();
        assert!(h.table.states.get("N123AB").unwrap().full_ldb_end.is_some());
    }

    #[test]
    fn middle_click_selects_exclusively() {
        let mut h = Harness::new();
        let mut proc = CommandProcessor::new();
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Middle).unwrap();
        assert!(h.table.states.get("AAL1").unwrap().is_selected);
        track_click(&mut proc, &mut h.ctx(), "N123AB", ClickButton::Middle).unwrap();
        assert!(!h.table.states.get("AAL1").unwrap().is_selected);
        assert!(h.table.states.get("N123AB").unwrap().is_selected);
    }

    #[test]
    fn leader_digit_click_sets_override() {
        let mut h = Harness::new();
        let mut proc = CommandProcessor::new();
        proc.input_char('9');
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert_eq!(
            h.table.states.get("AAL1").unwrap().leader_line_direction,
            Some(CardinalOrdinal::NorthEast)
        );
    }

    #[test]
    fn leader_digit_click_honors_keypad_flip() {
        let mut h = Harness::new();
        h.prefs.common.flip_numeric_keypad = true;
        let mut proc = CommandProcessor::new();
        proc.input_char('9');
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert_eq!(
            h.table.states.get("AAL1").unwrap().leader_line_direction,
            Some(CardinalOrdinal::SouthEast)
        );
    }

    #[test]
    fn controller_id_click_points_out() {
        let mut h = Harness::new();
        let mut proc = CommandProcessor::new();
        proc.input_char('4');
        proc.input_char('M');
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert!(h.sim.calls.contains(&"point_out AAL1 4M".to_string()));
    }

    #[test]
    fn jring_entry_by_click() {
        let mut h = Harness::new();
        let mut proc = CommandProcessor::new();
        for c in "*J10".chars() {
            proc.input_char(c);
        }
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert!((h.table.states.get("AAL1").unwrap().jring_radius - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn min_sep_pair_reports_distance() {
        let mut h = Harness::new();
        h.world.tracks.get_mut("AAL1").unwrap().location = sim_state::LatLong::new(-73.0, 40.0);
        h.world.tracks.get_mut("N123AB").unwrap().location =
            sim_state::LatLong::new(-73.0, 40.1);
        let mut proc = CommandProcessor::new();
        proc.set_mode(crate::commands::CommandMode::Min);
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        let status = scope_click(
            &mut proc,
            &mut h.ctx(),
            sim_state::LatLong::new(-73.0, 40.1),
            Some("N123AB"),
            ClickButton::Left,
        )
        .unwrap();
        assert_eq!(status.output, "6.00NM");
    }

    #[test]
    fn duplicate_beacon_acknowledged_by_slew() {
        let mut h = Harness::new();
        {
            let state = h.table.states.get_mut("AAL1").unwrap();
            state.duplicate_beacon = true;
        }
        let mut proc = CommandProcessor::new();
        track_click(&mut proc, &mut h.ctx(), "AAL1", ClickButton::Left).unwrap();
        assert_eq!(
            h.table.states.get("AAL1").unwrap().db_acknowledged,
            Some(Squawk(0o2345))
        );
    }
}
