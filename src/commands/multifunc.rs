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

//! Multifunction-key sub-grammars, one per prefix character.

use sim_state::FlightPlanSpecifier;

use super::{lookup, CommandContext, CommandProcessor, CommandStatus};
use crate::errors::ScopeError;
use crate::prefs::DwellMode;

/// Dispatch a multifunction command by its captured prefix.
pub fn execute(
    ctx: &mut CommandContext,
    proc: &mut CommandProcessor,
    prefix: char,
    cmd: &str,
) -> Result<CommandStatus, ScopeError> {
    match prefix {
        'B' => beacon_toggle(ctx, cmd),
        'D' => dwell(ctx, cmd),
        'E' => requested_altitude(ctx, cmd),
        'F' => altitude_filters(ctx, cmd),
        'I' => msaw_inhibit(ctx, cmd),
        'L' => leader_lines(ctx, cmd),
        'N' => gi_text(proc, cmd),
        'O' => pointout_history(ctx, cmd),
        'P' => ptl_length(ctx, cmd),
        'Q' => quick_look(ctx, cmd),
        'R' => history_rate(ctx, cmd),
        'S' => crda(ctx, cmd),
        'T' => list_visibility(ctx, cmd),
        'V' => atpa_cones(ctx, cmd),
        'Y' => scratchpad(ctx, cmd),
        'Z' => audio_toggle(ctx, cmd),
        _ => Err(ScopeError::IllegalFunction),
    }
}

/// `B(code)`: toggle a 2-digit bank or 4-digit code in the selected set.
fn beacon_toggle(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let code = lookup::parse_beacon(cmd)?;
    let set = &mut ctx.prefs.selected_beacons;
    if let Some(i) = set.iter().position(|c| *c == code) {
        set.remove(i);
    } else {
        set.push(code);
    }
    Ok(CommandStatus::cleared())
}

/// `DE` / `DI` / `DL`: dwell mode on, off, lock.
fn dwell(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    ctx.prefs.common.dwell_mode = match cmd {
        "E" => DwellMode::On,
        "I" => DwellMode::Off,
        "L" => DwellMode::Lock,
        _ => return Err(ScopeError::CommandFormat),
    };
    Ok(CommandStatus::cleared())
}

/// `EE` / `EI` globally, `E (acid)` per aircraft: requested altitude display.
fn requested_altitude(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    match cmd {
        "E" => {
            ctx.prefs.common.display_requested_altitude = true;
            return Ok(CommandStatus::cleared());
        }
        "I" => {
            ctx.prefs.common.display_requested_altitude = false;
            return Ok(CommandStatus::cleared());
        }
        _ => {}
    }
    let trk = lookup::find_track(ctx.world, cmd)?;
    let callsign = trk.adsb_callsign.clone();
    let global = ctx.prefs.common.display_requested_altitude;
    if let Some(state) = ctx.table.states.get_mut(&callsign) {
        let cur = state.display_requested_altitude.unwrap_or(global);
        state.display_requested_altitude = Some(!cur);
    }
    Ok(CommandStatus::cleared())
}

fn parse_filter_band(cmd: &str) -> Result<[i32; 2], ScopeError> {
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    let [lo, hi] = tokens.as_slice() else {
        return Err(ScopeError::CommandFormat);
    };
    if lo.len() != 3 || hi.len() != 3 {
        return Err(ScopeError::CommandFormat);
    }
    let lo: i32 = lo.parse().map_err(|_| ScopeError::CommandFormat)?;
    let hi: i32 = hi.parse().map_err(|_| ScopeError::CommandFormat)?;
    if lo >= hi {
        return Err(ScopeError::IllegalValue);
    }
    Ok([lo * 100, hi * 100])
}

/// `F lll hhh` unassociated band; `FA lll hhh` associated band.
fn altitude_filters(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    if let Some(rest) = cmd.strip_prefix('A') {
        ctx.prefs.altitude_filters.associated = parse_filter_band(rest.trim_start())?;
    } else {
        ctx.prefs.altitude_filters.unassociated = parse_filter_band(cmd)?;
    }
    Ok(CommandStatus::cleared())
}

/// `I (acid)`: toggle the plan's MSAW processing.
fn msaw_inhibit(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let trk = lookup::find_track(ctx.world, cmd)?;
    let fp = trk.flight_plan.as_ref().ok_or(ScopeError::NoFlight)?;
    let spec = FlightPlanSpecifier {
        disable_msaw: Some(!fp.disable_msaw),
        ..Default::default()
    };
    let acid = fp.acid.clone();
    ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
    Ok(CommandStatus::cleared())
}

/// `L(1-9)`: own leader direction; `L(1-9) (acid)`: per-aircraft override,
/// with `5` clearing it; `L(tcp) (1-9)`: per-controller direction.
fn leader_lines(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    match tokens.as_slice() {
        [d] if d.len() == 1 => {
            let c = d.chars().next().ok_or(ScopeError::CommandFormat)?;
            let dir = lookup::numpad_direction(c, ctx.prefs.common.flip_numeric_keypad)
                .ok_or(ScopeError::CommandFormat)?;
            ctx.prefs.common.leader_line_direction = dir;
            Ok(CommandStatus::cleared())
        }
        [d, target] if d.len() == 1 => {
            let c = d.chars().next().ok_or(ScopeError::CommandFormat)?;
            let trk = lookup::find_track(ctx.world, target)?;
            let callsign = trk.adsb_callsign.clone();
            let state = ctx
                .table
                .states
                .get_mut(&callsign)
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
        [id, d] if d.len() == 1 => {
            let c = d.chars().next().ok_or(ScopeError::CommandFormat)?;
            let dir = lookup::numpad_direction(c, ctx.prefs.common.flip_numeric_keypad)
                .ok_or(ScopeError::CommandFormat)?;
            let ctrl = lookup::find_controller(ctx.world, ctx.user_tcp, id)?;
            ctx.prefs
                .common
                .controller_leader_line_directions
                .insert(ctrl.tcp.clone(), dir);
            Ok(CommandStatus::cleared())
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

/// `N(1-9) text`: set a general-information text line; empty text clears.
fn gi_text(proc: &mut CommandProcessor, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let mut chars = cmd.chars();
    let line = chars
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or(ScopeError::IllegalLine)?;
    if !(1..=9).contains(&line) {
        return Err(ScopeError::IllegalLine);
    }
    let text = chars.as_str().trim_start();
    proc.gi_text[line as usize - 1] = text.to_string();
    Ok(CommandStatus::cleared())
}

/// `O (acid)`: show where the aircraft has been pointed out.
fn pointout_history(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let acid = lookup::find_acid(ctx.world, cmd)?;
    let history = ctx
        .table
        .outbound_point_out_history
        .get(&acid)
        .filter(|tcps| !tcps.is_empty())
        .map_or_else(|| "PO NONE".to_string(), |tcps| tcps.join(" "));
    Ok(CommandStatus::output(history))
}

/// `P(len)`: predicted track line length in minutes, 0 to 20, 0.5 steps.
fn ptl_length(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let len: f32 = cmd.parse().map_err(|_| ScopeError::CommandFormat)?;
    if !(0.0..=20.0).contains(&len) {
        return Err(ScopeError::IllegalValue);
    }
    ctx.prefs.common.ptl_length = (len * 2.0).round() / 2.0;
    Ok(CommandStatus::cleared())
}

/// `Q(pos)[+]`: toggle a quick-look position.
fn quick_look(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let ql = lookup::parse_quick_look(ctx.world, ctx.user_tcp, cmd.trim())?;
    let set = &mut ctx.prefs.quick_look_positions;
    if let Some(i) = set.iter().position(|q| q.id == ql.id && q.plus == ql.plus) {
        set.remove(i);
    } else {
        set.retain(|q| q.id != ql.id);
        set.push(ql);
    }
    Ok(CommandStatus::cleared())
}

/// `R(rate)`: history-track update rate in seconds, 0.1-second granularity.
fn history_rate(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let rate: f32 = cmd.parse().map_err(|_| ScopeError::CommandFormat)?;
    if !(0.0..=99.9).contains(&rate) {
        return Err(ScopeError::IllegalValue);
    }
    ctx.prefs.common.radar_track_history_rate = (rate * 10.0).round() / 10.0;
    Ok(CommandStatus::cleared())
}

/// CRDA runway-pair configuration: `S(idx)` followed by
/// `E`/`I` (enable), `S`/`T` (stagger/tie), `L(dir)` (ghost leader),
/// `C` (course lines), `Q` (qualification regions). Forms naming a single
/// runway of the pair are rejected with `ILL RWY`.
fn crda(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    // `(idx) (1|2)E/I` addresses one runway on its own; both runways of a
    // pair enable and inhibit together.
    if let Some((_, rwy)) = cmd.split_once(' ') {
        let mut it = rwy.chars();
        if matches!(it.next(), Some('1' | '2'))
            && matches!(it.next(), Some('E' | 'I'))
            && it.next().is_none()
        {
            return Err(ScopeError::IllegalRunway);
        }
        return Err(ScopeError::IllegalRpc);
    }
    let digits: String = cmd.chars().take_while(char::is_ascii_digit).collect();
    let rest = &cmd[digits.len()..];
    let index: usize = digits.parse().map_err(|_| ScopeError::IllegalRpc)?;
    let flip = ctx.prefs.common.flip_numeric_keypad;
    let pair = ctx
        .prefs
        .crda_runway_pair_state
        .get_mut(index.checked_sub(1).ok_or(ScopeError::IllegalRpc)?)
        .ok_or(ScopeError::IllegalRpc)?;

    match rest {
        "E" => pair.enabled = true,
        "I" => pair.enabled = false,
        "S" => pair.mode = crate::prefs::CrdaMode::Stagger,
        "T" => pair.mode = crate::prefs::CrdaMode::Tie,
        "C" => {
            for rs in &mut pair.runway_state {
                rs.draw_course_lines = !rs.draw_course_lines;
            }
        }
        "Q" => {
            for rs in &mut pair.runway_state {
                rs.draw_qualification_region = !rs.draw_qualification_region;
            }
        }
        _ => {
            let Some(d) = rest.strip_prefix('L') else {
                return Err(ScopeError::IllegalRpc);
            };
            let c = d.chars().next().ok_or(ScopeError::IllegalRpc)?;
            if d.chars().count() != 1 {
                return Err(ScopeError::IllegalRpc);
            }
            let dir = lookup::numpad_direction(c, flip);
            if dir.is_none() && c != '5' {
                return Err(ScopeError::IllegalRpc);
            }
            for rs in &mut pair.runway_state {
                rs.leader_direction = dir;
            }
        }
    }
    Ok(CommandStatus::cleared())
}

/// `T(1-3)E/I`: tower list visibility; `T(1-3)(n)`: line count;
/// `T(id)E/I`: coordination list visibility.
fn list_visibility(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    if let Some(first) = cmd.chars().next() {
        if let Some(index) = first.to_digit(10) {
            if !(1..=3).contains(&index) {
                return Err(ScopeError::IllegalLine);
            }
            let tl = &mut ctx.prefs.common.tower_lists[index as usize - 1];
            let rest = &cmd[1..];
            return match rest {
                "E" => {
                    tl.visible = true;
                    Ok(CommandStatus::cleared())
                }
                "I" => {
                    tl.visible = false;
                    Ok(CommandStatus::cleared())
                }
                _ => {
                    let n: usize = rest.parse().map_err(|_| ScopeError::IllegalLine)?;
                    if !(1..=99).contains(&n) {
                        return Err(ScopeError::IllegalLine);
                    }
                    tl.lines = n;
                    Ok(CommandStatus::cleared())
                }
            };
        }
    }

    let (id, enable) = match (cmd.strip_suffix('E'), cmd.strip_suffix('I')) {
        (Some(id), _) => (id, true),
        (None, Some(id)) => (id, false),
        (None, None) => return Err(ScopeError::CommandFormat),
    };
    let known = ctx
        .world
        .facility_adaptation
        .coordination_lists
        .iter()
        .any(|cl| cl.id == id);
    if !known {
        return Err(ScopeError::IllegalLine);
    }
    ctx.prefs
        .common
        .coordination_lists
        .entry(id.to_string())
        .or_default()
        .visible = enable;
    Ok(CommandStatus::cleared())
}

/// `VE`/`VI` globally, `V (acid) E/I` per aircraft: ATPA cone display.
fn atpa_cones(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    match cmd {
        "E" => {
            ctx.prefs.common.display_atpa_warning_alert_cones = true;
            return Ok(CommandStatus::cleared());
        }
        "I" => {
            ctx.prefs.common.display_atpa_warning_alert_cones = false;
            return Ok(CommandStatus::cleared());
        }
        _ => {}
    }
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    let [target, flag] = tokens.as_slice() else {
        return Err(ScopeError::CommandFormat);
    };
    let enable = match *flag {
        "E" => true,
        "I" => false,
        _ => return Err(ScopeError::CommandFormat),
    };
    let trk = lookup::find_track(ctx.world, target)?;
    let callsign = trk.adsb_callsign.clone();
    let state = ctx
        .table
        .states
        .get_mut(&callsign)
        .ok_or(ScopeError::NoTrack)?;
    state.display_atpa_warn_alert = Some(enable);
    Ok(CommandStatus::cleared())
}

/// `Y (acid) (sp)`: set the scratchpad; `+` prefix targets the secondary;
/// three digits set the pilot-reported altitude; a bare acid clears both
/// the primary scratchpad and the pilot-reported altitude.
fn scratchpad(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    match tokens.as_slice() {
        [target] => {
            let acid = lookup::find_acid(ctx.world, target)?;
            let spec = FlightPlanSpecifier {
                scratchpad: Some(String::new()),
                pilot_reported_altitude: Some(0),
                ..Default::default()
            };
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        [target, entry] if entry.len() == 3 && entry.chars().all(|c| c.is_ascii_digit()) => {
            let acid = lookup::find_acid(ctx.world, target)?;
            let hundreds: i32 = entry.parse().map_err(|_| ScopeError::IllegalValue)?;
            let spec = FlightPlanSpecifier {
                pilot_reported_altitude: Some(hundreds * 100),
                ..Default::default()
            };
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        [target, entry] => {
            let acid = lookup::find_acid(ctx.world, target)?;
            let (text, secondary) = match entry.strip_prefix('+') {
                Some(rest) => (rest, true),
                None => (*entry, false),
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
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

/// `ZE` / `ZI`: command-error sound on or off.
fn audio_toggle(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    match cmd {
        "E" => ctx.prefs.common.audio.command_error = true,
        "I" => ctx.prefs.common.audio.command_error = false,
        _ => return Err(ScopeError::CommandFormat),
    }
    Ok(CommandStatus::cleared())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Harness;
    use crate::commands::{CommandMode, CommandProcessor};
    use crate::prefs::CrdaRunwayPairState;
    use sim_state::{CardinalOrdinal, Squawk};

    fn run(h: &mut Harness, prefix: char, cmd: &str) -> CommandStatus {
        let mut proc = CommandProcessor::new();
        proc.set_mode(CommandMode::MultiFunc);
        proc.input_char(prefix);
        for c in cmd.chars() {
            proc.input_char(c);
        }
        proc.enter(&mut h.ctx())
    }

    #[test]
    fn beacon_toggle_round_trips() {
        let mut h = Harness::new();
        assert_eq!(run(&mut h, 'B', "2345").err, None);
        assert_eq!(h.prefs.selected_beacons, vec![Squawk(0o2345)]);
        assert_eq!(run(&mut h, 'B', "2345").err, None);
        assert!(h.prefs.selected_beacons.is_empty());
        assert_eq!(run(&mut h, 'B', "89").err, Some(ScopeError::IllegalCode));
    }

    #[test]
    fn dwell_modes() {
        let mut h = Harness::new();
        run(&mut h, 'D', "E");
        assert_eq!(h.prefs.common.dwell_mode, DwellMode::On);
        run(&mut h, 'D', "L");
        assert_eq!(h.prefs.common.dwell_mode, DwellMode::Lock);
        run(&mut h, 'D', "I");
        assert_eq!(h.prefs.common.dwell_mode, DwellMode::Off);
    }

    #[test]
    fn altitude_filter_entry() {
        let mut h = Harness::new();
        assert_eq!(run(&mut h, 'F', "010 100").err, None);
        assert_eq!(h.prefs.altitude_filters.unassociated, [1000, 10000]);
        assert_eq!(run(&mut h, 'F', "A050 230").err, None);
        assert_eq!(h.prefs.altitude_filters.associated, [5000, 23000]);
        assert_eq!(
            run(&mut h, 'F', "100 010").err,
            Some(ScopeError::IllegalValue)
        );
    }

    #[test]
    fn leader_direction_grammar() {
        let mut h = Harness::new();
        assert_eq!(run(&mut h, 'L', "9").err, None);
        assert_eq!(
            h.prefs.common.leader_line_direction,
            CardinalOrdinal::NorthEast
        );

        assert_eq!(run(&mut h, 'L', "1 AAL1").err, None);
        assert_eq!(
            h.table.states.get("AAL1").unwrap().leader_line_direction,
            Some(CardinalOrdinal::SouthWest)
        );
        assert_eq!(run(&mut h, 'L', "5 AAL1").err, None);
        assert_eq!(
            h.table.states.get("AAL1").unwrap().leader_line_direction,
            None
        );

        assert_eq!(run(&mut h, 'L', "4M 8").err, None);
        assert_eq!(
            h.prefs.common.controller_leader_line_directions.get("4M"),
            Some(&CardinalOrdinal::North)
        );
    }

    #[test]
    fn flipped_keypad_mirrors_leader_directions() {
        let mut h = Harness::new();
        h.prefs.common.flip_numeric_keypad = true;

        assert_eq!(run(&mut h, 'L', "8").err, None);
        assert_eq!(h.prefs.common.leader_line_direction, CardinalOrdinal::South);

        assert_eq!(run(&mut h, 'L', "3 AAL1").err, None);
        assert_eq!(
            h.table.states.get("AAL1").unwrap().leader_line_direction,
            Some(CardinalOrdinal::NorthEast)
        );

        // East and west sit on the keypad's middle row and do not move.
        assert_eq!(run(&mut h, 'L', "4M 6").err, None);
        assert_eq!(
            h.prefs.common.controller_leader_line_directions.get("4M"),
            Some(&CardinalOrdinal::East)
        );
    }

    #[test]
    fn scratchpad_reserved_word_rejected() {
        let mut h = Harness::new();
        let status = run(&mut h, 'Y', "AAL1 NAT");
        assert_eq!(status.err, Some(ScopeError::IllegalScratchpad));
        assert!(!h.sim.calls.iter().any(|c| c.starts_with("modify_flight_plan")));

        let status = run(&mut h, 'Y', "AAL1 GDM");
        assert_eq!(status.err, None);
        assert!(h
            .sim
            .calls
            .iter()
            .any(|c| c.contains("sp=Some(\"GDM\")")));
    }

    #[test]
    fn secondary_scratchpad_uses_plus() {
        let mut h = Harness::new();
        let status = run(&mut h, 'Y', "AAL1 +E2");
        assert_eq!(status.err, None);
        assert!(h.sim.calls.iter().any(|c| c.contains("sp2=Some(\"E2\")")));
    }

    #[test]
    fn crda_pair_configuration() {
        let mut h = Harness::new();
        h.prefs.crda_runway_pair_state.push(CrdaRunwayPairState::default());
        assert_eq!(run(&mut h, 'S', "1E").err, None);
        assert!(h.prefs.crda_runway_pair_state[0].enabled);
        assert_eq!(run(&mut h, 'S', "1T").err, None);
        assert_eq!(
            h.prefs.crda_runway_pair_state[0].mode,
            crate::prefs::CrdaMode::Tie
        );
        assert_eq!(run(&mut h, 'S', "2E").err, Some(ScopeError::IllegalRpc));
    }

    #[test]
    fn crda_single_runway_toggle_rejected() {
        let mut h = Harness::new();
        h.prefs.crda_runway_pair_state.push(CrdaRunwayPairState::default());
        assert_eq!(
            run(&mut h, 'S', "1 1E").err,
            Some(ScopeError::IllegalRunway)
        );
        assert_eq!(
            run(&mut h, 'S', "1 2I").err,
            Some(ScopeError::IllegalRunway)
        );
        assert!(!h.prefs.crda_runway_pair_state[0].enabled);
        assert_eq!(run(&mut h, 'S', "1 X").err, Some(ScopeError::IllegalRpc));
    }

    #[test]
    fn history_rate_granularity() {
        let mut h = Harness::new();
        assert_eq!(run(&mut h, 'R', "4.57").err, None);
        assert!((h.prefs.common.radar_track_history_rate - 4.6).abs() < 1e-6);
    }

    #[test]
    fn tower_list_controls() {
        let mut h = Harness::new();
        assert_eq!(run(&mut h, 'T', "1I").err, None);
        assert!(!h.prefs.common.tower_lists[0].visible);
        assert_eq!(run(&mut h, 'T', "112").err, None);
        assert_eq!(h.prefs.common.tower_lists[0].lines, 12);
        assert_eq!(run(&mut h, 'T', "4E").err, Some(ScopeError::IllegalLine));
    }
}
