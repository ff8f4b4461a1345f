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

//! Controller preference sets.
//!
//! Preferences split into TRACON-independent [`CommonPreferences`] and the
//! per-TRACON [`Preferences`] wrapper. Saved sets are stored in TOML with a
//! schema version; [`Preferences::upgrade`] migrates older sets stepwise, the
//! same way legacy configs are migrated elsewhere in this codebase.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sim_state::{CardinalOrdinal, LatLong, Squawk, Tcp};
use uuid::Uuid;

/// Current preference schema version
pub const CURRENT_PREFS_VERSION: u32 = 32;

/// Discrete leader-line lengths in pixels, indexed by the 0-7 preference
pub const LEADER_LINE_LENGTHS: [f32; 8] = [0.0, 17.0, 32.0, 47.0, 62.0, 77.0, 114.0, 152.0];

fn default_version() -> u32 {
    CURRENT_PREFS_VERSION
}

fn default_brightness() -> u8 {
    80
}

fn default_history_rate() -> f32 {
    4.5
}

fn default_true() -> bool {
    true
}

/// Normalized pane-relative position of a list, `[0,1]` in both axes.
pub type ListPosition = [f32; 2];

/// Placement and visibility for one system list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPrefs {
    pub position: ListPosition,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Displayed line budget; lists longer than this show a MORE indicator.
    #[serde(default = "default_list_lines")]
    pub lines: usize,
}

fn default_list_lines() -> usize {
    5
}

impl Default for ListPrefs {
    fn default() -> Self {
        Self {
            position: [0.02, 0.9],
            visible: true,
            lines: default_list_lines(),
        }
    }
}

/// SSA filter bits; `all` overrides the individual sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SsaFilter {
    pub all: bool,
    pub time: bool,
    pub altimeter: bool,
    pub status: bool,
    pub radar: bool,
    pub codes: bool,
    pub special_purpose_codes: bool,
    pub range: bool,
    pub altitude_filters: bool,
    pub air_port_weather: bool,
    pub quick_look_positions: bool,
    pub disabled_terminal: bool,
    pub active_crda_pairs: bool,
    pub text: bool,
}

impl Default for SsaFilter {
    fn default() -> Self {
        Self {
            all: true,
            time: true,
            altimeter: true,
            status: true,
            radar: false,
            codes: false,
            special_purpose_codes: false,
            range: false,
            altitude_filters: false,
            air_port_weather: false,
            quick_look_positions: false,
            disabled_terminal: false,
            active_crda_pairs: false,
            text: false,
        }
    }
}

/// Display brightness per element group, 0-100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrightnessSettings {
    pub dcb: u8,
    pub background_contrast: u8,
    pub video_group_a: u8,
    pub video_group_b: u8,
    pub full_datablocks: u8,
    pub lists: u8,
    pub positions: u8,
    pub limited_datablocks: u8,
    pub other_tracks: u8,
    pub lines: u8,
    pub range_rings: u8,
    pub compass: u8,
    pub beacon_symbols: u8,
    pub primary_symbols: u8,
    pub history: u8,
    pub weather: u8,
    pub wx_contrast: u8,
}

impl Default for BrightnessSettings {
    fn default() -> Self {
        Self {
            dcb: 60,
            background_contrast: 0,
            video_group_a: 50,
            video_group_b: 40,
            full_datablocks: default_brightness(),
            lists: default_brightness(),
            positions: default_brightness(),
            limited_datablocks: default_brightness(),
            other_tracks: default_brightness(),
            lines: 40,
            range_rings: 20,
            compass: 40,
            beacon_symbols: 55,
            primary_symbols: default_brightness(),
            history: 60,
            weather: 30,
            wx_contrast: 30,
        }
    }
}

impl BrightnessSettings {
    fn for_each_mut(&mut self, mut f: impl FnMut(&mut u8)) {
        for b in [
            &mut self.dcb,
            &mut self.background_contrast,
            &mut self.video_group_a,
            &mut self.video_group_b,
            &mut self.full_datablocks,
            &mut self.lists,
            &mut self.positions,
            &mut self.limited_datablocks,
            &mut self.other_tracks,
            &mut self.lines,
            &mut self.range_rings,
            &mut self.compass,
            &mut self.beacon_symbols,
            &mut self.primary_symbols,
            &mut self.history,
            &mut self.weather,
            &mut self.wx_contrast,
        ] {
            f(b);
        }
    }
}

/// Character size per element group, 0-5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharSizeSettings {
    pub datablocks: u8,
    pub lists: u8,
    pub tools: u8,
    pub position_symbols: u8,
}

impl Default for CharSizeSettings {
    fn default() -> Self {
        Self {
            datablocks: 1,
            lists: 1,
            tools: 1,
            position_symbols: 0,
        }
    }
}

/// Per-effect audio enables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioSettings {
    pub command_error: bool,
    pub inbound_handoff: bool,
    pub handoff_accepted: bool,
    pub conflict_alert: bool,
    pub mode_c_intruder: bool,
    pub msaw: bool,
    pub special_purpose_code: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            command_error: true,
            inbound_handoff: true,
            handoff_accepted: true,
            conflict_alert: true,
            mode_c_intruder: true,
            msaw: true,
            special_purpose_code: true,
        }
    }
}

/// Mouse-dwell promotion behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DwellMode {
    #[default]
    Off,
    On,
    /// Keep the last dwelled aircraft when the cursor leaves all tracks.
    Lock,
}

/// One quick-looked position; plus promotes its tracks to owned color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickLookPosition {
    pub id: Tcp,
    pub plus: bool,
}

impl std::fmt::Display for QuickLookPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.id, if self.plus { "+" } else { "" })
    }
}

/// Altitude filter bands in feet, `[low, high]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AltitudeFilters {
    pub unassociated: [i32; 2],
    pub associated: [i32; 2],
}

impl Default for AltitudeFilters {
    fn default() -> Self {
        Self {
            unassociated: [100, 60000],
            associated: [100, 60000],
        }
    }
}

/// Per-runway CRDA display state within a pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CrdaRunwayState {
    pub enabled: bool,
    pub draw_course_lines: bool,
    pub draw_qualification_region: bool,
    pub leader_direction: Option<CardinalOrdinal>,
}

/// CRDA pair operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrdaMode {
    #[default]
    Stagger,
    Tie,
}

impl CrdaMode {
    /// Single-letter form shown in the CRDA status list and SSA.
    #[must_use]
    pub fn letter(self) -> &'static str {
        match self {
            Self::Stagger => "S",
            Self::Tie => "T",
        }
    }
}

/// State for one adapted converging runway pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrdaRunwayPairState {
    pub enabled: bool,
    pub mode: CrdaMode,
    pub runway_state: [CrdaRunwayState; 2],
}

/// TRACON-independent preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommonPreferences {
    pub brightness: BrightnessSettings,
    pub char_size: CharSizeSettings,
    pub audio: AudioSettings,

    /// Index into [`LEADER_LINE_LENGTHS`], 0-7.
    pub leader_line_length: u8,
    pub leader_line_direction: CardinalOrdinal,
    /// Read numpad leader-direction entry in phone layout (top row south).
    pub flip_numeric_keypad: bool,
    /// Per-controller leader direction overrides.
    pub controller_leader_line_directions: HashMap<Tcp, CardinalOrdinal>,
    pub other_controller_leader_line_direction: Option<CardinalOrdinal>,
    pub unassociated_leader_line_direction: Option<CardinalOrdinal>,

    pub dwell_mode: DwellMode,
    pub overflight_full_datablocks: bool,
    pub automatic_fdb_offset: bool,
    pub display_requested_altitude: bool,

    pub display_tpa_size: bool,
    pub display_atpa_in_trail_dist: bool,
    pub display_atpa_warning_alert_cones: bool,
    pub display_atpa_monitor_cones: bool,

    pub ptl_length: f32,
    pub ptl_own: bool,
    pub ptl_all: bool,

    pub disable_ca_warnings: bool,
    pub disable_mci_warnings: bool,
    pub disable_msaw: bool,

    pub automatic_handoff_acceptance: bool,
    pub automatic_handoff_takeover: bool,
    pub automatic_handoff_cancellation: bool,

    pub radar_track_history: u8,
    pub radar_track_history_rate: f32,

    pub ssa_list: ListPrefs,
    pub ssa_filter: SsaFilter,
    pub vfr_list: ListPrefs,
    pub tab_list: ListPrefs,
    pub alert_list: ListPrefs,
    pub coast_list: ListPrefs,
    pub sign_on_list: ListPrefs,
    pub video_map_list: ListPrefs,
    pub crda_status_list: ListPrefs,
    pub mci_suppression_list: ListPrefs,
    pub restriction_area_list: ListPrefs,
    pub tower_lists: [ListPrefs; 3],
    pub coordination_lists: HashMap<String, ListPrefs>,
}

impl CommonPreferences {
    fn reset_defaults() -> Self {
        Self {
            leader_line_length: 1,
            leader_line_direction: CardinalOrdinal::North,
            radar_track_history: 5,
            radar_track_history_rate: default_history_rate(),
            ..Default::default()
        }
    }
}

/// Per-TRACON preferences plus the common block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    pub common: CommonPreferences,

    pub center: LatLong,
    pub user_center: LatLong,
    pub use_user_center: bool,
    /// Display radius in NM.
    pub range: f32,
    pub range_ring_radius: i32,
    pub range_rings_user_center: bool,

    pub altitude_filters: AltitudeFilters,
    /// Beacon codes and banks selected with the B multifunction prefix.
    pub selected_beacons: Vec<Squawk>,
    pub visible_video_maps: Vec<String>,
    pub crda_runway_pair_state: Vec<CrdaRunwayPairState>,

    pub quick_look_all: bool,
    pub quick_look_all_is_plus: bool,
    pub quick_look_positions: Vec<QuickLookPosition>,

    /// Selected radar site id; None means fused/multi-sensor mode.
    pub radar_site_id: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: CURRENT_PREFS_VERSION,
            common: CommonPreferences::reset_defaults(),
            center: LatLong::default(),
            user_center: LatLong::default(),
            use_user_center: false,
            range: 50.0,
            range_ring_radius: 5,
            range_rings_user_center: false,
            altitude_filters: AltitudeFilters::default(),
            selected_beacons: Vec::new(),
            visible_video_maps: Vec::new(),
            crda_runway_pair_state: Vec::new(),
            quick_look_all: false,
            quick_look_all_is_plus: false,
            quick_look_positions: Vec::new(),
            radar_site_id: None,
        }
    }
}

impl Preferences {
    /// Deep copy of the set; maps and vectors are not shared.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Clamp and normalize a set on activation.
    ///
    /// Range snaps to an integer in `[6, 256]`; PTL own/all are mutually
    /// exclusive; brightness values snap to multiples of 5.
    pub fn activate(&mut self) {
        self.range = self.range.round().clamp(6.0, 256.0);
        if self.common.ptl_all {
            self.common.ptl_own = false;
        }
        self.common.radar_track_history_rate = self.common.radar_track_history_rate.max(0.0);
        self.common
            .brightness
            .for_each_mut(|b| *b = ((u32::from(*b) + 2) / 5 * 5).min(100) as u8);
    }

    /// Migrate a saved set from an older schema version, step by step.
    pub fn upgrade(&mut self, from_version: u32) {
        if from_version < 8 {
            // Brightness moved to 5-step increments
            self.common
                .brightness
                .for_each_mut(|b| *b = ((u32::from(*b) + 2) / 5 * 5).min(100) as u8);
        }
        if from_version < 9 {
            self.common.ptl_length = self.common.ptl_length.clamp(0.0, 20.0);
        }
        if from_version < 12 {
            // DCB moved to the top of the pane; nudge lists below it
            for lp in self.list_prefs_mut() {
                lp.position[1] = lp.position[1].min(0.95);
            }
        }
        if from_version < 17 {
            for tl in &mut self.common.tower_lists {
                if tl.lines == 0 {
                    tl.lines = default_list_lines();
                }
            }
        }
        if from_version < 18 {
            // History rate gained 0.1 s granularity
            self.common.radar_track_history_rate =
                (self.common.radar_track_history_rate * 10.0).round() / 10.0;
        }
        if from_version < 21 {
            // Leader directions became per-TCP; old single-map entries were
            // keyed by sector id and cannot be carried over
            self.common.controller_leader_line_directions.clear();
        }
        if from_version < 23 {
            let af = &mut self.altitude_filters;
            af.unassociated[0] = af.unassociated[0].max(100);
            af.associated[0] = af.associated[0].max(100);
        }
        if from_version < 24 {
            for ps in &mut self.crda_runway_pair_state {
                ps.enabled = false;
            }
        }
        if from_version < 26 {
            self.common.audio.mode_c_intruder = true;
        }
        if from_version < 27 {
            self.quick_look_positions.dedup_by(|a, b| a.id == b.id);
        }
        if from_version < 29 {
            let cs = &mut self.common.char_size;
            cs.datablocks = cs.datablocks.min(5);
            cs.lists = cs.lists.min(5);
            cs.tools = cs.tools.min(5);
            cs.position_symbols = cs.position_symbols.min(5);
        }
        if from_version < 32 {
            self.range_ring_radius = match self.range_ring_radius {
                r if r <= 2 => 2,
                r if r <= 5 => 5,
                r if r <= 10 => 10,
                _ => 20,
            };
        }
        self.version = CURRENT_PREFS_VERSION;
    }

    fn list_prefs_mut(&mut self) -> impl Iterator<Item = &mut ListPrefs> {
        let c = &mut self.common;
        [
            &mut c.ssa_list,
            &mut c.vfr_list,
            &mut c.tab_list,
            &mut c.alert_list,
            &mut c.coast_list,
            &mut c.sign_on_list,
            &mut c.video_map_list,
            &mut c.crda_status_list,
            &mut c.mci_suppression_list,
            &mut c.restriction_area_list,
        ]
        .into_iter()
        .chain(c.tower_lists.iter_mut())
        .chain(c.coordination_lists.values_mut())
    }
}

/// One named, saved preference set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPreferences {
    /// Stable id, kept across renames.
    pub id: Uuid,
    pub name: String,
    pub prefs: Preferences,
}

/// On-disk store of saved preference sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceStore {
    pub sets: Vec<SavedPreferences>,
    pub selected: Option<Uuid>,
}

impl PreferenceStore {
    const APP: &'static str = "starscope";
    const FILE: &'static str = "prefs";

    /// Load the store, upgrading any stale sets in place.
    pub fn load() -> Result<Self, confy::ConfyError> {
        let mut store: PreferenceStore = confy::load(Self::APP, Self::FILE)?;
        for saved in &mut store.sets {
            let v = saved.prefs.version;
            if v < CURRENT_PREFS_VERSION {
                log::info!("upgrading preference set {:?} from version {v}", saved.name);
                saved.prefs.upgrade(v);
            }
        }
        Ok(store)
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(Self::APP, Self::FILE, self)
    }

    /// Save (or overwrite) a named set.
    pub fn save_as(&mut self, name: &str, prefs: Preferences) -> Uuid {
        if let Some(existing) = self.sets.iter_mut().find(|s| s.name == name) {
            existing.prefs = prefs;
            return existing.id;
        }
        let id = Uuid::new_v4();
        self.sets.push(SavedPreferences {
            id,
            name: name.to_string(),
            prefs,
        });
        id
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&SavedPreferences> {
        self.sets.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_is_structurally_equal() {
        let mut p = Preferences::default();
        p.common
            .controller_leader_line_directions
            .insert("1J".to_string(), CardinalOrdinal::East);
        p.selected_beacons.push(Squawk(0o1234));
        let d = p.duplicate();
        assert_eq!(p, d);
    }

    #[test]
    fn upgrade_from_current_is_identity() {
        let p = Preferences::default();
        let mut q = p.clone();
        q.upgrade(CURRENT_PREFS_VERSION);
        assert_eq!(p, q);
    }

    #[test]
    fn activate_clamps_and_snaps() {
        let mut p = Preferences::default();
        p.range = 3.4;
        p.common.ptl_all = true;
        p.common.ptl_own = true;
        p.common.brightness.lists = 63;
        p.activate();
        assert!((p.range - 6.0).abs() < f32::EPSILON);
        assert!(!p.common.ptl_own);
        assert_eq!(p.common.brightness.lists, 65);
    }

    #[test]
    fn upgrade_applies_stepwise() {
        let mut p = Preferences {
            version: 7,
            ..Default::default()
        };
        p.common.brightness.lists = 63;
        p.common.ptl_length = 40.0;
        p.altitude_filters.unassociated = [0, 60000];
        p.range_ring_radius = 7;
        p.upgrade(7);
        assert_eq!(p.common.brightness.lists, 65);
        assert!((p.common.ptl_length - 20.0).abs() < f32::EPSILON);
        assert_eq!(p.altitude_filters.unassociated[0], 100);
        assert_eq!(p.range_ring_radius, 10);
        assert_eq!(p.version, CURRENT_PREFS_VERSION);
    }

    #[test]
    fn saved_set_round_trips_and_tolerates_missing_fields() {
        let mut p = Preferences::default();
        p.quick_look_all = true;
        p.selected_beacons.push(Squawk(0o4601));
        let json = serde_json::to_string(&p).unwrap();
        let q: Preferences = serde_json::from_str(&json).unwrap();
        assert_eq!(p, q);

        // A set saved by an older build carries only the fields it knew about
        let old: Preferences = serde_json::from_str(r#"{"version": 7}"#).unwrap();
        assert_eq!(old.version, 7);
        assert!(old.common.ssa_list.visible);
    }

    #[test]
    fn store_save_as_reuses_id_by_name() {
        let mut store = PreferenceStore::default();
        let a = store.save_as("APPR", Preferences::default());
        let b = store.save_as("APPR", Preferences::default());
        assert_eq!(a, b);
        assert_eq!(store.sets.len(), 1);
        let c = store.save_as("FINAL", Preferences::default());
        assert_ne!(a, c);
    }
}
