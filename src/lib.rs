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

//! STARS terminal radar scope core.
//!
//! This crate holds the display-side logic of a terminal radar position:
//! the keyboard command interpreter, per-track display state, the MSAW,
//! CA, MCI, and ATPA conflict engines, datablock composition, and the
//! system lists. The host owns the [`sim_state::World`] snapshot and the
//! window; each frame it feeds events into a [`Scope`], lets it update,
//! and rasterizes the resulting [`DrawList`].

pub mod commands;
pub mod conflict;
pub mod datablock;
pub mod draw;
pub mod errors;
pub mod leader;
pub mod lists;
pub mod prefs;
pub mod track;

use chrono::{DateTime, Utc};
use sim_state::{Event, LatLong, SimConnection, Squawk, Track, World};

pub use commands::{ClickButton, CommandContext, CommandMode, CommandProcessor, CommandStatus};
pub use conflict::ConflictMonitor;
pub use draw::{AudioAlert, DrawCommand, DrawList, FontClass, Rgb};
pub use errors::ScopeError;
pub use prefs::{PreferenceStore, Preferences};
pub use track::{TrackState, TrackTable};

use crate::datablock::{DatablockFlags, DatablockType};
use crate::prefs::DwellMode;

/// Cell advance for datablock text runs, in pixels.
const CHAR_WIDTH: f32 = 8.0;
/// Vertical advance between datablock lines, in pixels.
const LINE_HEIGHT: f32 = 12.0;
const DATABLOCK_FONT_SIZE: u8 = 11;
const LIST_FONT_SIZE: u8 = 11;
/// Gap between the leader tip and the first datablock character.
const LEADER_TEXT_GAP: f32 = 4.0;
/// History dots draw at this brightness.
const HISTORY_BRIGHTNESS: u8 = 40;
/// Window-space anchor of the preview area.
const PREVIEW_POSITION: [f32; 2] = [0.02, 0.82];
/// Window-space anchor of the general information text.
const GI_TEXT_POSITION: [f32; 2] = [0.35, 0.02];

/// One controller's radar scope: input state, display state, and the
/// per-frame outputs.
#[derive(Debug)]
pub struct Scope {
    pub user_tcp: String,
    pub prefs: Preferences,
    pub store: PreferenceStore,
    pub table: TrackTable,
    pub conflicts: ConflictMonitor,
    pub processor: CommandProcessor,
    pub draw_list: DrawList,
    /// Sounds to start this frame; cleared at the top of every update.
    pub audio: Vec<AudioAlert>,
    dwell_target: Option<String>,
}

impl Scope {
    #[must_use]
    pub fn new(user_tcp: impl Into<String>) -> Self {
        Self {
            user_tcp: user_tcp.into(),
            prefs: Preferences::default(),
            store: PreferenceStore::default(),
            table: TrackTable::new(),
            conflicts: ConflictMonitor::new(),
            processor: CommandProcessor::new(),
            draw_list: DrawList::new(),
            audio: Vec::new(),
            dwell_target: None,
        }
    }

    /// Ingest one frame: simulator events, then the radar-tick pipeline
    /// when a track update is due.
    pub fn update(&mut self, world: &World, events: &[Event], now: DateTime<Utc>) {
        self.audio.clear();
        self.table.process_events(
            events,
            world,
            &self.user_tcp,
            now,
            &world.facility_adaptation,
            &mut self.audio,
        );
        if self.table.track_update_due(world) {
            self.table.update_tracks(world, &self.prefs);
            conflict::update_msaw(&mut self.table, world, &self.prefs, now, &mut self.audio);
            self.conflicts
                .update(&self.table, world, &self.prefs, now, &mut self.audio);
            conflict::update_atpa(&mut self.table, world);
        }
    }

    pub fn key_char(&mut self, c: char) {
        self.processor.input_char(c);
    }

    pub fn key_backspace(&mut self) {
        self.processor.backspace();
    }

    pub fn key_escape(&mut self) {
        self.processor.escape();
    }

    pub fn set_mode(&mut self, mode: CommandMode) {
        self.processor.set_mode(mode);
    }

    /// Execute the preview contents.
    pub fn enter(
        &mut self,
        world: &World,
        sim: &mut dyn SimConnection,
        now: DateTime<Utc>,
    ) -> CommandStatus {
        let mut ctx = CommandContext {
            world,
            table: &mut self.table,
            conflicts: &mut self.conflicts,
            prefs: &mut self.prefs,
            store: &mut self.store,
            sim,
            user_tcp: &self.user_tcp,
            now,
            audio: &mut self.audio,
        };
        self.processor.enter(&mut ctx)
    }

    /// Dispatch a scope click, optionally over an aircraft.
    pub fn click(
        &mut self,
        world: &World,
        sim: &mut dyn SimConnection,
        now: DateTime<Utc>,
        location: LatLong,
        callsign: Option<&str>,
        button: ClickButton,
    ) -> CommandStatus {
        let mut ctx = CommandContext {
            world,
            table: &mut self.table,
            conflicts: &mut self.conflicts,
            prefs: &mut self.prefs,
            store: &mut self.store,
            sim,
            user_tcp: &self.user_tcp,
            now,
            audio: &mut self.audio,
        };
        match commands::click::scope_click(&mut self.processor, &mut ctx, location, callsign, button)
        {
            Ok(status) => {
                if status.clear {
                    self.processor.preview.clear();
                    if self.processor.mode != CommandMode::MultiFunc {
                        self.processor.mode = CommandMode::None;
                    }
                    self.processor.multi_func_prefix = None;
                }
                status
            }
            Err(err) => {
                log::debug!("click rejected: {err}");
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

    /// Report the aircraft under the cursor. Lock mode keeps the last
    /// dwelled aircraft when the cursor leaves all tracks.
    pub fn set_dwell_target(&mut self, callsign: Option<&str>) {
        match (callsign, self.prefs.common.dwell_mode) {
            (Some(cs), DwellMode::On | DwellMode::Lock) => {
                self.dwell_target = Some(cs.to_string());
            }
            (None, DwellMode::Lock) => {}
            _ => self.dwell_target = None,
        }
    }

    fn beacon_selected(&self, squawk: Squawk) -> bool {
        self.prefs.selected_beacons.iter().any(|code| {
            if code.0 < 0o100 {
                squawk.0 >> 6 == code.0
            } else {
                *code == squawk
            }
        })
    }

    fn datablock_flags(&self, trk: &Track, now: DateTime<Utc>) -> DatablockFlags {
        let fp = trk.flight_plan.as_ref();
        let acid = fp.map_or("", |fp| fp.acid.as_str());
        let tracked_by = fp.map_or("", |fp| fp.tracking_controller.as_str());

        let (quick_looked, quick_looked_plus) = if tracked_by.is_empty()
            || tracked_by == self.user_tcp
        {
            (false, false)
        } else if self.prefs.quick_look_all {
            (true, self.prefs.quick_look_all_is_plus)
        } else {
            match self
                .prefs
                .quick_look_positions
                .iter()
                .find(|ql| ql.id == tracked_by)
            {
                Some(ql) => (true, ql.plus),
                None => (false, false),
            }
        };

        let state_force_ql = self
            .table
            .state(&trk.adsb_callsign)
            .is_some_and(|s| s.force_ql);

        DatablockFlags {
            beaconator: self.beacon_selected(trk.squawk),
            displayed_beacon_match: self.processor.beacon_displayed(trk.squawk, now),
            inbound_point_out: self
                .table
                .point_outs
                .get(acid)
                .is_some_and(|po| po.to == self.user_tcp),
            quick_looked,
            quick_looked_plus,
            force_ql: state_force_ql || self.table.force_ql_acids.contains(acid),
            dwelled: self.prefs.common.dwell_mode != DwellMode::Off
                && self.dwell_target.as_deref() == Some(&trk.adsb_callsign),
        }
    }

    /// Rebuild the draw list for this frame. Datablocks draw in LDB, PDB,
    /// SDB, FDB order so fuller blocks overlay lesser ones; the dwelled
    /// aircraft draws last of all.
    pub fn render(&mut self, world: &World, now: DateTime<Utc>) {
        self.draw_list.reset();

        let mut visible: Vec<(&String, &Track, DatablockFlags, datablock::Datablock)> =
            Vec::new();
        for (callsign, trk) in &world.tracks {
            let Some(state) = self.table.state(callsign) else {
                continue;
            };
            let flags = self.datablock_flags(trk, now);
            if !datablock::datablock_visible(
                trk,
                state,
                &self.prefs,
                &self.table,
                &self.user_tcp,
                now,
                flags,
            ) {
                continue;
            }
            let db = datablock::compose(
                trk,
                state,
                &self.prefs,
                world,
                &self.table,
                &self.conflicts,
                &self.user_tcp,
                now,
                flags,
            );
            visible.push((callsign, trk, flags, db));
        }

        let rank = |flags: DatablockFlags, db_type: DatablockType| -> u8 {
            if flags.dwelled {
                return 5;
            }
            match db_type {
                DatablockType::Limited => 0,
                DatablockType::Partial => 1,
                DatablockType::Suspended => 2,
                DatablockType::Ghost => 3,
                DatablockType::Full => 4,
            }
        };
        visible.sort_by(|a, b| {
            rank(a.2, a.3.db_type)
                .cmp(&rank(b.2, b.3.db_type))
                .then_with(|| a.0.cmp(b.0))
        });

        for (callsign, trk, flags, db) in visible {
            if let Some(state) = self.table.state(callsign) {
                Self::draw_track(
                    &mut self.draw_list,
                    &self.prefs,
                    &self.table,
                    &self.user_tcp,
                    trk,
                    state,
                    flags,
                    &db,
                    world,
                    now,
                );
            }
        }

        self.draw_rbls(world);
        self.draw_lists(world, now);
    }

    #[allow(clippy::too_many_arguments, reason = "drawing reads the whole frame state")]
    #[allow(clippy::too_many_lines, reason = "one pass over the full block layout")]
    fn draw_track(
        draw_list: &mut DrawList,
        prefs: &Preferences,
        table: &TrackTable,
        user_tcp: &str,
        trk: &Track,
        state: &TrackState,
        flags: DatablockFlags,
        db: &datablock::Datablock,
        world: &World,
        now: DateTime<Utc>,
    ) {
        let (_, base_color, brightness) = datablock::datablock_color_brightness(
            trk, state, prefs, table, user_tcp, now, flags, db.db_type,
        );
        let color = base_color.scale(brightness);

        // History trail, most recent entries first
        let wanted = usize::from(prefs.common.radar_track_history);
        if wanted > 0 {
            let hist: Vec<&track::RadarObservation> = state.history_tracks().collect();
            for obs in hist.iter().rev().take(wanted) {
                draw_list.add_text(
                    obs.position,
                    [0.0, 0.0],
                    "\u{b7}",
                    base_color.scale(HISTORY_BRIGHTNESS),
                    FontClass::PositionSymbol,
                    DATABLOCK_FONT_SIZE,
                );
            }
        }

        // Position symbol at the radar position
        draw_list.add_text(
            trk.location,
            [0.0, 0.0],
            position_symbol(trk),
            color,
            FontClass::PositionSymbol,
            DATABLOCK_FONT_SIZE,
        );

        // Predicted track line
        let own = trk
            .flight_plan
            .as_ref()
            .is_some_and(|fp| fp.tracking_controller == user_tcp);
        if prefs.common.ptl_length > 0.0
            && (prefs.common.ptl_all || (prefs.common.ptl_own && own))
        {
            let heading = state
                .heading(world.nm_per_longitude)
                .unwrap_or(trk.true_heading);
            let dist = trk.groundspeed * f64::from(prefs.common.ptl_length) / 60.0;
            if dist > 0.0 {
                let end = trk.location.offset(heading, dist, world.nm_per_longitude);
                draw_list.add_line(trk.location, end, color);
            }
        }

        if state.jring_radius > 0.0 {
            draw_list.add_circle(trk.location, state.jring_radius, color);
        }

        // Leader and block anchor; offsets are y-up like the direction vectors
        let dir = leader::leader_line_direction(trk, state, prefs, user_tcp);
        let v = dir.vector();
        #[allow(clippy::cast_possible_truncation, reason = "unit vector components")]
        let vector = [v[0] as f32, v[1] as f32];
        let length = if db.db_type == DatablockType::Full {
            leader::leader_line_length(prefs)
        } else {
            prefs::LEADER_LINE_LENGTHS[1]
        };
        if db.db_type == DatablockType::Full && length > 0.0 {
            draw_list.add_leader(
                trk.location,
                [vector[0] * length, vector[1] * length],
                color,
            );
        }
        let anchor = [
            vector[0] * (length + LEADER_TEXT_GAP),
            vector[1] * (length + LEADER_TEXT_GAP),
        ];

        let flash_dim = datablock::half_seconds(now) % 2 == 0;
        let mut draw_runs = |runs: &[datablock::DbText], offset: [f32; 2]| {
            let mut x = offset[0];
            for run in runs {
                let mut run_color = run.color.unwrap_or(color);
                if run.flashing && flash_dim {
                    run_color = run_color.halved();
                }
                draw_list.add_text(
                    trk.location,
                    [x, offset[1]],
                    run.text.clone(),
                    run_color,
                    FontClass::Datablock,
                    DATABLOCK_FONT_SIZE,
                );
                #[allow(clippy::cast_precision_loss, reason = "run lengths are tiny")]
                {
                    x += run.text.chars().count() as f32 * CHAR_WIDTH;
                }
            }
        };

        if !db.alerts.is_empty() {
            draw_runs(&db.alerts, [anchor[0], anchor[1] + LINE_HEIGHT]);
        }
        #[allow(clippy::cast_precision_loss, reason = "datablocks have at most four lines")]
        for (i, line) in db.lines.iter().enumerate() {
            draw_runs(line, [anchor[0], anchor[1] - i as f32 * LINE_HEIGHT]);
        }
    }

    fn draw_rbls(&mut self, world: &World) {
        for (index, (a, b)) in self.processor.rbls.iter().enumerate() {
            let pos = |ep: &commands::RblEndpoint| -> Option<LatLong> {
                match ep {
                    commands::RblEndpoint::Aircraft(cs) => {
                        world.tracks.get(cs).map(|t| t.location)
                    }
                    commands::RblEndpoint::Point(p) => Some(*p),
                }
            };
            let (Some(p0), Some(p1)) = (pos(a), pos(b)) else {
                continue;
            };
            self.draw_list.add_line(p0, p1, draw::TRACKED_COLOR);
            let nm = world.nm_per_longitude;
            let brg = (p0.heading_to(p1, nm) + world.magnetic_variation + 360.0) % 360.0;
            let label = format!("{:03.0}/{:.2}-{}", brg, p0.distance_nm(p1, nm), index + 1);
            self.draw_list.add_text(
                p1,
                [CHAR_WIDTH, 0.0],
                label,
                draw::TRACKED_COLOR,
                FontClass::Tool,
                LIST_FONT_SIZE,
            );
        }
    }

    fn draw_lists(&mut self, world: &World, _now: DateTime<Utc>) {
        let singles = [
            lists::ssa_list(world, &self.prefs, &self.user_tcp),
            lists::vfr_list(world, &self.table, &self.prefs),
            lists::tab_list(world, &self.prefs),
            lists::alert_list(world, &self.table, &self.conflicts, &self.prefs),
            lists::coast_suspend_list(world, &self.prefs),
            lists::video_map_list(world, &self.prefs),
            lists::restriction_area_list(world, &self.prefs),
            lists::crda_status_list(&self.prefs),
            lists::mci_suppression_list(world, &self.prefs),
            lists::sign_on_list(world, &self.prefs),
        ];
        let towers = lists::tower_lists(world, &self.prefs);
        let coords = lists::coordination_lists(world, &self.prefs);
        for list in singles
            .into_iter()
            .flatten()
            .chain(towers)
            .chain(coords)
        {
            let mut text = String::new();
            if !list.title.is_empty() {
                text.push_str(&list.title);
                text.push('\n');
            }
            text.push_str(&list.lines.join("\n"));
            self.draw_list.add_screen_text(
                list.position,
                text,
                draw::LIST_COLOR,
                FontClass::List,
                LIST_FONT_SIZE,
            );
        }

        let gi: Vec<&str> = self
            .processor
            .gi_text
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        if !gi.is_empty() {
            self.draw_list.add_screen_text(
                GI_TEXT_POSITION,
                gi.join("\n"),
                draw::LIST_COLOR,
                FontClass::List,
                LIST_FONT_SIZE,
            );
        }

        if !self.processor.preview.is_empty() {
            self.draw_list.add_screen_text(
                PREVIEW_POSITION,
                self.processor.preview.clone(),
                draw::TRACKED_COLOR,
                FontClass::Tool,
                LIST_FONT_SIZE,
            );
        }
    }
}

/// Symbol drawn at the radar position: the controlling position's key for
/// tracked aircraft, an asterisk otherwise.
fn position_symbol(trk: &Track) -> String {
    let Some(fp) = &trk.flight_plan else {
        return "*".to_string();
    };
    let owner = if fp.controlling_controller.is_empty() {
        &fp.tracking_controller
    } else {
        &fp.controlling_controller
    };
    match owner.chars().last() {
        Some(c) => c.to_string(),
        None => "*".to_string(),
    }
}
