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

//! System lists: fixed-schema text panels composed from the world snapshot.
//!
//! Each list renders a header, rows built from plan fields, and a
//! `MORE: k/n` indicator when the row count exceeds the list's line budget
//! (k rows hidden of n total). Ordering is explicit per list.

use chrono::{DateTime, Utc};
use sim_state::{FlightPlan, Squawk, TypeOfFlight, World};

use crate::conflict::ConflictMonitor;
use crate::prefs::{ListPosition, ListPrefs, Preferences};
use crate::track::TrackTable;

/// A composed text panel ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListText {
    pub title: String,
    pub lines: Vec<String>,
    pub position: ListPosition,
}

/// Apply the line budget, appending the overflow indicator.
fn truncate_lines(mut lines: Vec<String>, budget: usize) -> Vec<String> {
    let total = lines.len();
    if total > budget {
        lines.truncate(budget);
        lines.push(format!("MORE: {}/{}", total - budget, total));
    }
    lines
}

fn panel(title: &str, prefs: &ListPrefs, lines: Vec<String>) -> Option<ListText> {
    if !prefs.visible {
        return None;
    }
    Some(ListText {
        title: title.to_string(),
        lines: truncate_lines(lines, prefs.lines),
        position: prefs.position,
    })
}

/// Status/system area: time, altimeters, and the optional filter sections.
#[must_use]
pub fn ssa_list(world: &World, prefs: &Preferences, user_tcp: &str) -> Option<ListText> {
    let lp = &prefs.common.ssa_list;
    if !lp.visible {
        return None;
    }
    let filter = &prefs.common.ssa_filter;
    let mut lines = Vec::new();

    if filter.all || filter.time {
        lines.push(world.sim_time.format("%H%M %S").to_string());
    }
    if filter.all || filter.altimeter {
        let mut stations: Vec<_> = world.altimeters.iter().collect();
        stations.sort_by(|a, b| a.0.cmp(b.0));
        for (icao, altim) in stations {
            lines.push(format!("{} {:.2}", icao.trim_start_matches('K'), altim));
        }
    }
    if filter.all || filter.status {
        if prefs.common.disable_ca_warnings {
            lines.push("CA INHIBITED".to_string());
        }
        if prefs.common.disable_mci_warnings {
            lines.push("MCI INHIBITED".to_string());
        }
        if prefs.common.disable_msaw {
            lines.push("LA INHIBITED".to_string());
        }
    }
    if filter.all || filter.range {
        lines.push(format!("{}NM", prefs.range.round() as i32));
        if prefs.common.ptl_length > 0.0 {
            lines.push(format!("PTL: {:.1}", prefs.common.ptl_length));
        }
    }
    if filter.all || filter.altitude_filters {
        let af = &prefs.altitude_filters;
        lines.push(format!(
            "{:03} {:03} U",
            af.unassociated[0] / 100,
            af.unassociated[1] / 100
        ));
        lines.push(format!(
            "{:03} {:03} A",
            af.associated[0] / 100,
            af.associated[1] / 100
        ));
    }
    if (filter.all || filter.codes) && !prefs.selected_beacons.is_empty() {
        let codes: Vec<String> = prefs.selected_beacons.iter().map(Squawk::to_string).collect();
        lines.push(codes.join(" "));
    }
    if filter.all || filter.quick_look_positions {
        if prefs.quick_look_all {
            lines.push(if prefs.quick_look_all_is_plus {
                "QL: ALL+".to_string()
            } else {
                "QL: ALL".to_string()
            });
        } else if !prefs.quick_look_positions.is_empty() {
            let positions: Vec<String> = prefs
                .quick_look_positions
                .iter()
                .map(ToString::to_string)
                .collect();
            lines.push(format!("QL: {}", positions.join(" ")));
        }
    }
    if filter.all || filter.active_crda_pairs {
        for (i, pair) in prefs.crda_runway_pair_state.iter().enumerate() {
            if pair.enabled {
                lines.push(format!("{user_tcp} {} {}", i + 1, pair.mode.letter()));
            }
        }
    }

    // The SSA never truncates; the filter bits bound its height
    Some(ListText {
        title: String::new(),
        lines,
        position: lp.position,
    })
}

/// VFR list: associated VFR plans in first-radar-contact order.
#[must_use]
pub fn vfr_list(world: &World, table: &TrackTable, prefs: &Preferences) -> Option<ListText> {
    let mut rows: Vec<(DateTime<Utc>, i32, String)> = world
        .tracks
        .values()
        .filter_map(|trk| {
            let fp = trk.flight_plan.as_ref()?;
            if fp.rules != sim_state::FlightRules::Vfr {
                return None;
            }
            let index = fp.list_index?;
            let first_seen = table
                .states
                .get(&trk.adsb_callsign)
                .map_or(world.sim_time, |s| s.first_seen);
            Some((
                first_seen,
                index,
                format!("{index:2} {:<7} VFR", fp.acid),
            ))
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    panel(
        "VFR LIST",
        &prefs.common.vfr_list,
        rows.into_iter().map(|r| r.2).collect(),
    )
}

/// TAB list: unassociated flight plans, alphabetical by ACID.
#[must_use]
pub fn tab_list(world: &World, prefs: &Preferences) -> Option<ListText> {
    let mut plans: Vec<&FlightPlan> = world
        .unassociated_flight_plans
        .iter()
        .filter(|fp| !fp.suspended)
        .collect();
    plans.sort_by(|a, b| a.acid.cmp(&b.acid));
    let rows = plans
        .iter()
        .map(|fp| {
            let index = fp.list_index.map_or_else(String::new, |i| format!("{i:2}"));
            format!("{index} {:<7} {}", fp.acid, fp.assigned_squawk)
        })
        .collect();
    panel("FLIGHT PLAN", &prefs.common.tab_list, rows)
}

/// Unified alert list: CA and MCI pairs by first detection, then LA rows.
#[must_use]
pub fn alert_list(
    world: &World,
    table: &TrackTable,
    conflicts: &ConflictMonitor,
    prefs: &Preferences,
) -> Option<ListText> {
    let acid_of = |callsign: &str| -> String {
        world
            .tracks
            .get(callsign)
            .and_then(|trk| trk.flight_plan.as_ref())
            .map_or_else(|| callsign.to_string(), |fp| fp.acid.clone())
    };

    let mut pairs: Vec<(DateTime<Utc>, String)> = conflicts
        .ca
        .iter()
        .map(|c| {
            (
                c.start,
                format!("CA {:<7} {}", acid_of(&c.callsigns[0]), acid_of(&c.callsigns[1])),
            )
        })
        .chain(conflicts.mci.iter().map(|c| {
            (
                c.start,
                format!("CA {:<7} {}", acid_of(&c.callsigns[0]), acid_of(&c.callsigns[1])),
            )
        }))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut rows: Vec<String> = pairs.into_iter().map(|p| p.1).collect();

    let mut la: Vec<String> = table
        .states
        .iter()
        .filter(|(_, s)| s.msaw && !s.inhibit_msaw)
        .map(|(callsign, _)| format!("LA {}", acid_of(callsign)))
        .collect();
    la.sort();
    rows.extend(la);

    panel("LA/CA/MCI", &prefs.common.alert_list, rows)
}

/// Coast/suspend list, ordered by suspend index.
#[must_use]
pub fn coast_suspend_list(world: &World, prefs: &Preferences) -> Option<ListText> {
    let mut rows: Vec<(i32, String)> = world
        .tracks
        .values()
        .filter_map(|trk| trk.flight_plan.as_ref())
        .chain(world.unassociated_flight_plans.iter())
        .filter(|fp| fp.suspended)
        .map(|fp| {
            (
                fp.coast_suspend_index,
                format!("{:2} {:<7} {}", fp.coast_suspend_index, fp.acid, fp.assigned_squawk),
            )
        })
        .collect();
    rows.sort_by_key(|r| r.0);
    panel(
        "CST/SPN",
        &prefs.common.coast_list,
        rows.into_iter().map(|r| r.1).collect(),
    )
}

/// Video map list: adapted map names, visible ones flagged.
#[must_use]
pub fn video_map_list(world: &World, prefs: &Preferences) -> Option<ListText> {
    let rows = world
        .facility_adaptation
        .video_map_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let marker = if prefs.visible_video_maps.contains(name) {
                '>'
            } else {
                ' '
            };
            format!("{marker}{:2} {name}", i + 1)
        })
        .collect();
    panel("GEO MAPS", &prefs.common.video_map_list, rows)
}

/// Restriction area index list.
#[must_use]
pub fn restriction_area_list(world: &World, prefs: &Preferences) -> Option<ListText> {
    let rows = world
        .restriction_areas
        .iter()
        .enumerate()
        .map(|(i, ra)| {
            let marker = if ra.hidden { ' ' } else { '>' };
            format!("{marker}{:2} {}", i + 1, ra.title)
        })
        .collect();
    panel("RESTRICTIONS", &prefs.common.restriction_area_list, rows)
}

/// CRDA status: one row per adapted runway pair.
#[must_use]
pub fn crda_status_list(prefs: &Preferences) -> Option<ListText> {
    let rows = prefs
        .crda_runway_pair_state
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            let status = if pair.enabled { pair.mode.letter() } else { "D" };
            format!("{:2} {status}", i + 1)
        })
        .collect();
    panel("CRDA STATUS", &prefs.common.crda_status_list, rows)
}

/// MCI suppression list: plans carrying a suppressed intruder code.
#[must_use]
pub fn mci_suppression_list(world: &World, prefs: &Preferences) -> Option<ListText> {
    let mut rows: Vec<String> = world
        .tracks
        .values()
        .filter_map(|trk| trk.flight_plan.as_ref())
        .filter(|fp| fp.mci_suppressed_code != Squawk::default())
        .map(|fp| format!("{:<7} {}", fp.acid, fp.mci_suppressed_code))
        .collect();
    rows.sort();
    panel("MCI", &prefs.common.mci_suppression_list, rows)
}

/// Tower lists: the N nearest arrivals per adapted airport, closest first.
#[must_use]
pub fn tower_lists(world: &World, prefs: &Preferences) -> Vec<ListText> {
    let mut out = Vec::new();
    for airport in world.airports.values() {
        let index = airport.tower_list_index;
        if index == 0 || index > prefs.common.tower_lists.len() {
            continue;
        }
        let lp = &prefs.common.tower_lists[index - 1];
        if !lp.visible {
            continue;
        }
        let mut rows: Vec<(f64, String)> = world
            .tracks
            .values()
            .filter_map(|trk| {
                let fp = trk.flight_plan.as_ref()?;
                if fp.type_of_flight != TypeOfFlight::Arrival || fp.airport != airport.icao {
                    return None;
                }
                let dist = trk.location.distance_nm(airport.location, world.nm_per_longitude);
                let sp = if airport.omit_arrival_scratchpad {
                    String::new()
                } else {
                    format!(" {}", fp.scratchpad)
                };
                Some((dist, format!("{:<7} {}{sp}", fp.acid, fp.aircraft_type)))
            })
            .collect();
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        out.push(ListText {
            title: airport.icao.trim_start_matches('K').to_string(),
            lines: truncate_lines(rows.into_iter().map(|r| r.1).collect(), lp.lines),
            position: lp.position,
        });
    }
    out
}

/// Sign-on list: every controller currently on position.
#[must_use]
pub fn sign_on_list(world: &World, prefs: &Preferences) -> Option<ListText> {
    let mut rows: Vec<String> = world
        .controllers
        .values()
        .map(|ctrl| format!("{:<4} {}", ctrl.tcp, ctrl.callsign))
        .collect();
    rows.sort();
    panel("SIGN ON", &prefs.common.sign_on_list, rows)
}

/// Adapted coordination lists, keyed by list id.
#[must_use]
pub fn coordination_lists(world: &World, prefs: &Preferences) -> Vec<ListText> {
    let mut out = Vec::new();
    for cl in &world.facility_adaptation.coordination_lists {
        let Some(lp) = prefs.common.coordination_lists.get(&cl.id) else {
            continue;
        };
        if !lp.visible {
            continue;
        }
        let mut rows: Vec<(i32, String)> = world
            .tracks
            .values()
            .filter_map(|trk| trk.flight_plan.as_ref())
            .chain(world.unassociated_flight_plans.iter())
            .filter(|fp| cl.airports.contains(&fp.airport))
            .map(|fp| {
                (
                    fp.list_index.unwrap_or(i32::MAX),
                    format!("{:<7} {}", fp.acid, fp.assigned_squawk),
                )
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        out.push(ListText {
            title: cl.name.clone(),
            lines: truncate_lines(rows.into_iter().map(|r| r.1).collect(), lp.lines),
            position: lp.position,
        });
    }
    out
}
