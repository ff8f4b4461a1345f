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

//! Modal command interpreter: keystroke accumulation, mode dispatch, and
//! the prefix-free command grammars.
//!
//! Keyboard input accumulates into a preview string; Enter hands the text
//! to the active mode's handler, which returns `{clear, output}` or one of
//! the closed error codes. Errors leave the preview intact and play the
//! command-error sound.

pub mod click;
pub mod lookup;
pub mod multifunc;

pub use click::ClickButton;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use sim_state::{FlightPlanSpecifier, LatLong, SimConnection, Squawk, World};

use crate::conflict::ConflictMonitor;
use crate::datablock::TRIANGLE;
use crate::draw::AudioAlert;
use crate::errors::ScopeError;
use crate::prefs::{PreferenceStore, Preferences};
use crate::track::TrackTable;

/// Maximum preview length in characters.
pub const PREVIEW_CAPACITY: usize = 32;

/// Default MCI suppression code when none is given.
pub const DEFAULT_MCI_SUPPRESSED_CODE: Squawk = Squawk(0o0477);

/// Active input mode, set by function keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandMode {
    #[default]
    None,
    InitiateControl,
    TerminateControl,
    Handoff,
    VfrPlan,
    MultiFunc,
    FlightData,
    CollisionAlert,
    Min,
    SavePrefAs,
    Maps,
    Ldr,
    RangeRings,
    Range,
    SiteMenu,
    TargetGen,
}

/// Result of a dispatched command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStatus {
    /// Reset the preview on success.
    pub clear: bool,
    pub output: String,
    pub err: Option<ScopeError>,
}

impl CommandStatus {
    fn cleared() -> Self {
        Self {
            clear: true,
            ..Default::default()
        }
    }

    fn output(text: impl Into<String>) -> Self {
        Self {
            clear: true,
            output: text.into(),
            err: None,
        }
    }
}

/// One endpoint of a range/bearing line.
#[derive(Debug, Clone, PartialEq)]
pub enum RblEndpoint {
    Aircraft(String),
    Point(LatLong),
}

/// A click waiting on a second input.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PendingClick {
    #[default]
    None,
    /// Second endpoint of a range/bearing line.
    RblSecond(RblEndpoint),
    /// Second aircraft of a min-separation query.
    MinSepSecond(String),
}

/// Everything a command handler may touch for one dispatch.
pub struct CommandContext<'a> {
    pub world: &'a World,
    pub table: &'a mut TrackTable,
    pub conflicts: &'a mut ConflictMonitor,
    pub prefs: &'a mut Preferences,
    pub store: &'a mut PreferenceStore,
    pub sim: &'a mut dyn SimConnection,
    pub user_tcp: &'a str,
    pub now: DateTime<Utc>,
    pub audio: &'a mut Vec<AudioAlert>,
}

/// Keyboard state machine and mode dispatcher.
#[derive(Debug, Clone, Default)]
pub struct CommandProcessor {
    pub mode: CommandMode,
    /// Captured first character in MultiFunc mode.
    pub multi_func_prefix: Option<char>,
    pub preview: String,
    /// Beacon code highlighted by `**(code)`, until the deadline passes.
    pub displayed_beacon: Option<(Squawk, DateTime<Utc>)>,
    pub pending_click: PendingClick,
    pub rbls: Vec<(RblEndpoint, RblEndpoint)>,
    /// General information text lines, edited with the N prefix.
    pub gi_text: [String; 9],
}

impl CommandProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a mode, resetting the multifunction prefix.
    pub fn set_mode(&mut self, mode: CommandMode) {
        self.mode = mode;
        self.multi_func_prefix = None;
    }

    /// Ingest one printable character. Back-tick becomes the triangle; in
    /// MultiFunc mode the first character is captured as the prefix.
    pub fn input_char(&mut self, c: char) {
        let c = if c == '`' { TRIANGLE } else { c.to_ascii_uppercase() };
        if self.mode == CommandMode::MultiFunc && self.multi_func_prefix.is_none() {
            self.multi_func_prefix = Some(c);
            return;
        }
        if self.preview.chars().count() < PREVIEW_CAPACITY {
            self.preview.push(c);
        }
    }

    /// Remove one rune; with an empty preview, drop the prefix instead.
    pub fn backspace(&mut self) {
        if self.preview.pop().is_none() {
            self.multi_func_prefix = None;
        }
    }

    /// Clear mode, preview, prefix, and any pending click state.
    pub fn escape(&mut self) {
        self.mode = CommandMode::None;
        self.multi_func_prefix = None;
        self.preview.clear();
        self.pending_click = PendingClick::None;
    }

    /// Is the `**(code)` highlight window open for this squawk? A 2-digit
    /// bank entry matches every code in the bank.
    #[must_use]
    pub fn beacon_displayed(&self, squawk: Squawk, now: DateTime<Utc>) -> bool {
        let Some((code, end)) = self.displayed_beacon else {
            return false;
        };
        if now >= end {
            return false;
        }
        if code.0 < 0o100 {
            squawk.0 >> 6 == code.0
        } else {
            squawk == code
        }
    }

    /// Dispatch the preview to the active mode's handler.
    pub fn enter(&mut self, ctx: &mut CommandContext) -> CommandStatus {
        let cmd = self.preview.clone();
        let result = match self.mode {
            CommandMode::None => self.execute_none(ctx, &cmd),
            CommandMode::InitiateControl => execute_initiate(ctx, &cmd),
            CommandMode::TerminateControl => execute_terminate(ctx, &cmd),
            CommandMode::Handoff => execute_handoff(ctx, &cmd),
            CommandMode::VfrPlan => execute_vfr_plan(ctx, &cmd),
            CommandMode::MultiFunc => {
                let Some(prefix) = self.multi_func_prefix else {
                    return CommandStatus::cleared();
                };
                multifunc::execute(ctx, self, prefix, &cmd)
            }
            CommandMode::FlightData => execute_flight_data(ctx, &cmd),
            CommandMode::CollisionAlert => execute_collision_alert(ctx, &cmd),
            CommandMode::Min => {
                if cmd.is_empty() {
                    Ok(CommandStatus::cleared())
                } else {
                    Err(ScopeError::CommandFormat)
                }
            }
            CommandMode::SavePrefAs => execute_save_prefs(ctx, &cmd),
            CommandMode::Maps => execute_maps(ctx, &cmd),
            CommandMode::Ldr => execute_ldr(ctx, &cmd),
            CommandMode::RangeRings => execute_range_rings(ctx, &cmd),
            CommandMode::Range => execute_range(ctx, &cmd),
            CommandMode::SiteMenu => execute_site(ctx, &cmd),
            CommandMode::TargetGen => Ok(CommandStatus::cleared()),
        };
        match result {
            Ok(status) => {
                if status.clear {
                    self.preview.clear();
                    if self.mode != CommandMode::MultiFunc {
                        self.mode = CommandMode::None;
                    }
                    self.multi_func_prefix = None;
                }
                status
            }
            Err(err) => {
                debug!("command {cmd:?} rejected: {err}");
                if ctx.prefs.common.audio.command_error {
                    ctx.audio.push(AudioAlert::CommandError);
                }
                CommandStatus {
                    clear: false,
                    output: String::new(),
                    err: Some(err),
                }
            }
        }
    }

    /// Commands available without a mode.
    fn execute_none(
        &mut self,
        ctx: &mut CommandContext,
        cmd: &str,
    ) -> Result<CommandStatus, ScopeError> {
        if cmd.is_empty() {
            return Ok(CommandStatus::cleared());
        }

        if let Some(rest) = cmd.strip_prefix("**") {
            return self.execute_double_star(ctx, rest);
        }
        if let Some(rest) = cmd.strip_prefix('*') {
            return self.execute_star(ctx, rest);
        }

        match cmd {
            "ALL" | "ALL+" => {
                let plus = cmd.ends_with('+');
                if ctx.prefs.quick_look_all && ctx.prefs.quick_look_all_is_plus == plus {
                    ctx.prefs.quick_look_all = false;
                    ctx.prefs.quick_look_all_is_plus = false;
                } else {
                    ctx.prefs.quick_look_all = true;
                    ctx.prefs.quick_look_all_is_plus = plus;
                }
                Ok(CommandStatus::cleared())
            }
            _ => {
                // Quick-look position entries, space separated
                let entries: Vec<&str> = cmd.split_ascii_whitespace().collect();
                if !entries.is_empty()
                    && entries
                        .iter()
                        .all(|e| lookup::parse_quick_look(ctx.world, ctx.user_tcp, e).is_ok())
                {
                    for e in entries {
                        let ql = lookup::parse_quick_look(ctx.world, ctx.user_tcp, e)?;
                        if let Some(i) =
                            ctx.prefs.quick_look_positions.iter().position(|q| q.id == ql.id)
                        {
                            if ctx.prefs.quick_look_positions[i].plus == ql.plus {
                                ctx.prefs.quick_look_positions.remove(i);
                            } else {
                                ctx.prefs.quick_look_positions[i].plus = ql.plus;
                            }
                        } else {
                            ctx.prefs.quick_look_positions.push(ql);
                        }
                    }
                    return Ok(CommandStatus::cleared());
                }
                Err(ScopeError::CommandFormat)
            }
        }
    }

    /// `*` commands: display toggles, RBL management, quick flight plans.
    fn execute_star(
        &mut self,
        ctx: &mut CommandContext,
        rest: &str,
    ) -> Result<CommandStatus, ScopeError> {
        match rest {
            "AE" | "AI" => {
                ctx.prefs.common.display_atpa_warning_alert_cones = rest == "AE";
                return Ok(CommandStatus::cleared());
            }
            "BE" | "BI" => {
                ctx.prefs.common.display_atpa_monitor_cones = rest == "BE";
                return Ok(CommandStatus::cleared());
            }
            "DE" | "DI" => {
                ctx.prefs.common.display_atpa_in_trail_dist = rest == "DE";
                return Ok(CommandStatus::cleared());
            }
            "D+E" => {
                ctx.prefs.common.display_tpa_size = true;
                return Ok(CommandStatus::output("TPA SIZE ON"));
            }
            "D+I" => {
                ctx.prefs.common.display_tpa_size = false;
                return Ok(CommandStatus::output("TPA SIZE OFF"));
            }
            "T" => {
                self.rbls.clear();
                self.pending_click = PendingClick::None;
                return Ok(CommandStatus::cleared());
            }
            _ => {}
        }

        if let Some(n) = rest.strip_prefix('T') {
            let i: usize = n.parse().map_err(|_| ScopeError::IllegalLine)?;
            if i == 0 || i > self.rbls.len() {
                return Err(ScopeError::IllegalLine);
            }
            self.rbls.remove(i - 1);
            return Ok(CommandStatus::cleared());
        }

        // Quick flight plan: 4-digit beacon plus a rules letter
        if rest.len() == 5 {
            let (code, kind) = rest.split_at(4);
            let squawk = Squawk::parse(code).map_err(|_| ScopeError::IllegalCode)?;
            let vfr = match kind {
                "V" | "P" => true,
                "E" => false,
                _ => return Err(ScopeError::CommandFormat),
            };
            let spec = FlightPlanSpecifier {
                squawk: Some(squawk),
                rules_vfr: Some(vfr),
                quick_flight_plan: true,
                ..Default::default()
            };
            let fp = ctx.sim.create_flight_plan(spec).map_err(ScopeError::from)?;
            return Ok(CommandStatus::output(fp.acid));
        }

        Err(ScopeError::CommandFormat)
    }

    /// `**` commands: global acknowledgments, beacon display, force QL.
    fn execute_double_star(
        &mut self,
        ctx: &mut CommandContext,
        rest: &str,
    ) -> Result<CommandStatus, ScopeError> {
        match rest {
            "J" => {
                for state in ctx.table.states.values_mut() {
                    state.jring_radius = 0.0;
                    state.cone_length = 0.0;
                }
                return Ok(CommandStatus::cleared());
            }
            "P" => {
                for state in ctx.table.states.values_mut() {
                    state.leader_line_direction = None;
                }
                return Ok(CommandStatus::cleared());
            }
            "ALL" => {
                // Force QL of all our tracks to every other local position
                let recipients: Vec<String> = ctx
                    .world
                    .controllers
                    .values()
                    .filter(|c| !c.eram_facility && c.tcp != ctx.user_tcp)
                    .map(|c| c.tcp.clone())
                    .collect();
                let acids: Vec<String> = ctx
                    .world
                    .tracks
                    .values()
                    .filter_map(|trk| trk.flight_plan.as_ref())
                    .filter(|fp| fp.tracking_controller == ctx.user_tcp)
                    .map(|fp| fp.acid.clone())
                    .collect();
                for acid in &acids {
                    for tcp in &recipients {
                        ctx.sim.force_ql(acid, tcp).map_err(ScopeError::from)?;
                    }
                }
                return Ok(CommandStatus::cleared());
            }
            _ => {}
        }

        if rest.len() == 2 || rest.len() == 4 {
            if let Ok(code) = lookup::parse_beacon(rest) {
                let window =
                    Duration::seconds(ctx.world.facility_adaptation.beacon_code_display_seconds);
                self.displayed_beacon = Some((code, ctx.now + window));
                return Ok(CommandStatus::cleared());
            }
        }

        // `** ACID TCP...`: force QL of one aircraft to specific positions
        let tokens: Vec<&str> = rest.split_ascii_whitespace().collect();
        if tokens.len() >= 2 {
            let acid = lookup::find_acid(ctx.world, tokens[0])?;
            for id in &tokens[1..] {
                let ctrl = lookup::find_controller(ctx.world, ctx.user_tcp, id)?;
                ctx.sim.force_ql(&acid, &ctrl.tcp).map_err(ScopeError::from)?;
            }
            return Ok(CommandStatus::cleared());
        }

        Err(ScopeError::CommandFormat)
    }
}

fn execute_initiate(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    match tokens.as_slice() {
        [target] => {
            let trk = lookup::find_track(ctx.world, target)?;
            let acid = trk
                .flight_plan
                .as_ref()
                .map_or_else(|| trk.adsb_callsign.clone(), |fp| fp.acid.clone());
            let callsign = trk.adsb_callsign.clone();
            ctx.sim.initiate_track(&acid, &callsign).map_err(ScopeError::from)?;
            if let Some(state) = ctx.table.states.get_mut(&callsign) {
                state.display_fdb = true;
            }
            Ok(CommandStatus::cleared())
        }
        [target, acid] => {
            let trk = lookup::find_track(ctx.world, target)?;
            let callsign = trk.adsb_callsign.clone();
            ctx.sim.initiate_track(acid, &callsign).map_err(ScopeError::from)?;
            if let Some(state) = ctx.table.states.get_mut(&callsign) {
                state.display_fdb = true;
            }
            Ok(CommandStatus::cleared())
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

fn execute_terminate(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let trk = lookup::find_track(ctx.world, cmd)?;
    let fp = trk.flight_plan.as_ref().ok_or(ScopeError::NoFlight)?;
    let (acid, callsign) = (fp.acid.clone(), trk.adsb_callsign.clone());
    ctx.sim.drop_track(&acid).map_err(ScopeError::from)?;
    if let Some(state) = ctx.table.states.get_mut(&callsign) {
        state.display_fdb = false;
    }
    Ok(CommandStatus::cleared())
}

/// Flip a preference toggle, reporting `NO CHANGE` when already set.
fn set_toggle(flag: &mut bool, value: bool) -> CommandStatus {
    if *flag == value {
        CommandStatus::output("NO CHANGE")
    } else {
        *flag = value;
        CommandStatus::cleared()
    }
}

fn execute_handoff(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let prefs = &mut ctx.prefs.common;
    match cmd {
        "CE" => return Ok(set_toggle(&mut prefs.automatic_handoff_acceptance, true)),
        "CI" => return Ok(set_toggle(&mut prefs.automatic_handoff_acceptance, false)),
        "CTE" => return Ok(set_toggle(&mut prefs.automatic_handoff_takeover, true)),
        "CTI" => return Ok(set_toggle(&mut prefs.automatic_handoff_takeover, false)),
        "CXE" => return Ok(set_toggle(&mut prefs.automatic_handoff_cancellation, true)),
        "CXI" => return Ok(set_toggle(&mut prefs.automatic_handoff_cancellation, false)),
        _ => {}
    }

    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    match tokens.as_slice() {
        [id, target] => {
            let ctrl = lookup::find_controller(ctx.world, ctx.user_tcp, id)?;
            let acid = lookup::find_acid(ctx.world, target)?;
            let to = ctrl.tcp.clone();
            ctx.sim.handoff_track(&acid, &to).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

fn execute_vfr_plan(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    let (acid, actype) = match tokens.as_slice() {
        [acid] => (*acid, None),
        [acid, actype] => (*acid, Some((*actype).to_string())),
        _ => return Err(ScopeError::CommandFormat),
    };
    if acid.is_empty() || !acid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ScopeError::IllegalAcid);
    }
    let spec = FlightPlanSpecifier {
        acid: Some(acid.to_string()),
        aircraft_type: actype,
        rules_vfr: Some(true),
        squawk_automatic: true,
        quick_flight_plan: true,
        ..Default::default()
    };
    let fp = ctx.sim.create_flight_plan(spec).map_err(ScopeError::from)?;
    Ok(CommandStatus::output(format!("{} {}", fp.acid, fp.assigned_squawk)))
}

fn execute_flight_data(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    match tokens.as_slice() {
        [target, "*"] => {
            let acid = lookup::find_acid(ctx.world, target)?;
            let spec = FlightPlanSpecifier {
                squawk_automatic: true,
                ..Default::default()
            };
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        [target, code] => {
            let acid = lookup::find_acid(ctx.world, target)?;
            let squawk = Squawk::parse(code).map_err(|_| ScopeError::IllegalCode)?;
            let spec = FlightPlanSpecifier {
                squawk: Some(squawk),
                ..Default::default()
            };
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

fn execute_collision_alert(
    ctx: &mut CommandContext,
    cmd: &str,
) -> Result<CommandStatus, ScopeError> {
    match cmd {
        "AI" => {
            return Ok(set_toggle(&mut ctx.prefs.common.disable_ca_warnings, true));
        }
        "AE" => {
            return Ok(set_toggle(&mut ctx.prefs.common.disable_ca_warnings, false));
        }
        "MI" => {
            return Ok(set_toggle(&mut ctx.prefs.common.disable_mci_warnings, true));
        }
        "ME" => {
            return Ok(set_toggle(&mut ctx.prefs.common.disable_mci_warnings, false));
        }
        _ => {}
    }

    let tokens: Vec<&str> = cmd.split_ascii_whitespace().collect();
    match tokens.as_slice() {
        ["K", target] => {
            let trk = lookup::find_track(ctx.world, target)?;
            let fp = trk.flight_plan.as_ref().ok_or(ScopeError::NoFlight)?;
            // DisableCA and MCI suppression are mutually exclusive
            let spec = FlightPlanSpecifier {
                disable_ca: Some(!fp.disable_ca),
                mci_suppressed_code: Some(Squawk::default()),
                ..Default::default()
            };
            let acid = fp.acid.clone();
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        ["M", target] | ["M", target, _] => {
            let code = if tokens.len() == 3 {
                Squawk::parse(tokens[2]).map_err(|_| ScopeError::IllegalCode)?
            } else {
                DEFAULT_MCI_SUPPRESSED_CODE
            };
            let trk = lookup::find_track(ctx.world, target)?;
            let fp = trk.flight_plan.as_ref().ok_or(ScopeError::NoFlight)?;
            // Entering the code a second time clears the suppression
            let new = if fp.mci_suppressed_code == code {
                Squawk::default()
            } else {
                code
            };
            let spec = FlightPlanSpecifier {
                mci_suppressed_code: Some(new),
                disable_ca: Some(false),
                ..Default::default()
            };
            let acid = fp.acid.clone();
            ctx.sim.modify_flight_plan(&acid, spec).map_err(ScopeError::from)?;
            Ok(CommandStatus::cleared())
        }
        _ => Err(ScopeError::CommandFormat),
    }
}

fn execute_save_prefs(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    if cmd.is_empty() || cmd.len() > 7 {
        return Err(ScopeError::IllegalPrefset);
    }
    ctx.store.save_as(cmd, ctx.prefs.clone());
    Ok(CommandStatus::cleared())
}

fn execute_maps(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    if cmd == "A" {
        ctx.prefs.visible_video_maps.clear();
        return Ok(CommandStatus::cleared());
    }
    let index: usize = cmd.parse().map_err(|_| ScopeError::IllegalMap)?;
    let name = ctx
        .world
        .facility_adaptation
        .video_map_names
        .get(index.checked_sub(1).ok_or(ScopeError::IllegalMap)?)
        .ok_or(ScopeError::IllegalMap)?;
    if let Some(i) = ctx.prefs.visible_video_maps.iter().position(|n| n == name) {
        ctx.prefs.visible_video_maps.remove(i);
    } else {
        ctx.prefs.visible_video_maps.push(name.clone());
    }
    Ok(CommandStatus::cleared())
}

fn execute_ldr(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let n: u8 = cmd.parse().map_err(|_| ScopeError::IllegalValue)?;
    if n > 7 {
        return Err(ScopeError::IllegalValue);
    }
    ctx.prefs.common.leader_line_length = n;
    Ok(CommandStatus::cleared())
}

fn execute_range_rings(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let n: i32 = cmd.parse().map_err(|_| ScopeError::IllegalValue)?;
    if ![2, 5, 10, 20].contains(&n) {
        return Err(ScopeError::IllegalValue);
    }
    ctx.prefs.range_ring_radius = n;
    Ok(CommandStatus::cleared())
}

fn execute_range(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    let n: i32 = cmd.parse().map_err(|_| ScopeError::CommandFormat)?;
    if !(6..=256).contains(&n) {
        return Err(ScopeError::RangeLimit);
    }
    ctx.prefs.range = n as f32;
    Ok(CommandStatus::cleared())
}

fn execute_site(ctx: &mut CommandContext, cmd: &str) -> Result<CommandStatus, ScopeError> {
    if cmd == "F" {
        ctx.prefs.radar_site_id = None;
        return Ok(CommandStatus::cleared());
    }
    if ctx.world.radar_sites.contains_key(cmd) {
        ctx.prefs.radar_site_id = Some(cmd.to_string());
        return Ok(CommandStatus::cleared());
    }
    Err(ScopeError::IllegalValue)
}
