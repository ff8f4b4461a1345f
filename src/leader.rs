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

//! Leader-line direction and length resolution.

use sim_state::{CardinalOrdinal, Track};

use crate::prefs::{Preferences, LEADER_LINE_LENGTHS};
use crate::track::TrackState;

/// Resolve the leader direction for a track.
///
/// Priority: suspended plans force north; the plan's global leader; the
/// per-aircraft override; our own preference for owned tracks and tracks
/// handed off to us; the per-controller map; the other-controller default;
/// the unassociated default; north.
#[must_use]
pub fn leader_line_direction(
    trk: &Track,
    state: &TrackState,
    prefs: &Preferences,
    user_tcp: &str,
) -> CardinalOrdinal {
    if trk.flight_plan.as_ref().is_some_and(|fp| fp.suspended) {
        return CardinalOrdinal::North;
    }
    if state.use_global_leader_line {
        if let Some(dir) = state.global_leader_line_direction {
            return dir;
        }
    }
    if let Some(dir) = state.leader_line_direction {
        return dir;
    }
    if let Some(fp) = &trk.flight_plan {
        if fp.tracking_controller == user_tcp || fp.handoff_track_controller == user_tcp {
            return prefs.common.leader_line_direction;
        }
        if let Some(dir) = prefs
            .common
            .controller_leader_line_directions
            .get(&fp.tracking_controller)
        {
            return *dir;
        }
        if let Some(dir) = prefs.common.other_controller_leader_line_direction {
            return dir;
        }
    } else if let Some(dir) = prefs.common.unassociated_leader_line_direction {
        return dir;
    }
    CardinalOrdinal::North
}

/// Leader length in pixels from the 0-7 preference.
#[must_use]
pub fn leader_line_length(prefs: &Preferences) -> f32 {
    LEADER_LINE_LENGTHS[usize::from(prefs.common.leader_line_length.min(7))]
}
