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

//! Outbound drawing and audio contract.
//!
//! The scope computes positions, colors, and strings; the host rasterizes.
//! Draw instructions accumulate into a [`DrawList`] that is reset at the
//! start of every frame and reused to avoid allocation churn.

use sim_state::LatLong;

/// Linear RGB color, 0-1 per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Scale by a 0-100 brightness value.
    #[must_use]
    pub fn scale(self, brightness: u8) -> Self {
        let s = f32::from(brightness.min(100)) / 100.0;
        Self::new(self.r * s, self.g * s, self.b * s)
    }

    /// Halve intensity; used for the dim phase of a flash.
    #[must_use]
    pub fn halved(self) -> Self {
        Self::new(self.r * 0.5, self.g * 0.5, self.b * 0.5)
    }
}

/// Tracked (owned or quick-looked) datablock text
pub const TRACKED_COLOR: Rgb = Rgb::new(1.0, 1.0, 1.0);
/// Unassociated / other-facility datablock text
pub const UNTRACKED_COLOR: Rgb = Rgb::new(0.1, 0.9, 0.1);
/// Middle-click selected aircraft
pub const SELECTED_COLOR: Rgb = Rgb::new(0.1, 0.9, 0.9);
/// Point-outs, force-QL, and datablock alerts
pub const ALERT_COLOR: Rgb = Rgb::new(1.0, 0.65, 0.0);
/// CA/MSAW/SPC alert text
pub const TEXT_ALERT_COLOR: Rgb = Rgb::new(1.0, 0.2, 0.2);
/// Cautions (adapted SPCs, ATPA warnings)
pub const TEXT_WARNING_COLOR: Rgb = Rgb::new(1.0, 1.0, 0.2);
/// System list text
pub const LIST_COLOR: Rgb = Rgb::new(0.1, 0.9, 0.1);
/// ATPA monitor cone and in-trail readout
pub const ATPA_MONITOR_COLOR: Rgb = Rgb::new(0.1, 0.9, 0.1);
/// ATPA warning in-trail readout
pub const ATPA_WARNING_COLOR: Rgb = Rgb::new(1.0, 1.0, 0.2);
/// ATPA alert in-trail readout
pub const ATPA_ALERT_COLOR: Rgb = Rgb::new(1.0, 0.2, 0.2);

/// Sound effects the host should play this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioAlert {
    CommandError,
    InboundHandoff,
    HandoffAccepted,
    ConflictAlert,
    ModeCIntruder,
    Msaw,
    SpecialPurposeCode,
    Test,
}

/// Font classes the host maps onto its atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontClass {
    Datablock,
    List,
    Tool,
    PositionSymbol,
}

/// A single drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        /// Anchor in lat-long; the host projects to window space.
        position: LatLong,
        /// Pixel offset from the projected anchor.
        offset: [f32; 2],
        text: String,
        color: Rgb,
        font: FontClass,
        size: u8,
    },
    Line {
        from: LatLong,
        to: LatLong,
        color: Rgb,
    },
    /// Circle of `radius` NM around a position (J-rings, range rings).
    Circle {
        center: LatLong,
        radius: f32,
        color: Rgb,
    },
    /// Leader line from a projected anchor to a pixel offset from it.
    Leader {
        position: LatLong,
        vector: [f32; 2],
        color: Rgb,
    },
    /// Text anchored in window space, 0-1 per axis (system lists, preview).
    ScreenText {
        position: [f32; 2],
        text: String,
        color: Rgb,
        font: FontClass,
        size: u8,
    },
}

/// Reusable per-frame instruction buffer.
#[derive(Debug, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear for the next frame, keeping capacity.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn add_text(
        &mut self,
        position: LatLong,
        offset: [f32; 2],
        text: impl Into<String>,
        color: Rgb,
        font: FontClass,
        size: u8,
    ) {
        self.commands.push(DrawCommand::Text {
            position,
            offset,
            text: text.into(),
            color,
            font,
            size,
        });
    }

    pub fn add_line(&mut self, from: LatLong, to: LatLong, color: Rgb) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    pub fn add_circle(&mut self, center: LatLong, radius: f32, color: Rgb) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    pub fn add_leader(&mut self, position: LatLong, vector: [f32; 2], color: Rgb) {
        self.commands.push(DrawCommand::Leader { position, vector, color });
    }

    pub fn add_screen_text(
        &mut self,
        position: [f32; 2],
        text: impl Into<String>,
        color: Rgb,
        font: FontClass,
        size: u8,
    ) {
        self.commands.push(DrawCommand::ScreenText {
            position,
            text: text.into(),
            color,
            font,
            size,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_scaling() {
        let c = TRACKED_COLOR.scale(80);
        assert!((c.r - 0.8).abs() < 1e-6);
        let dim = c.halved();
        assert!((dim.r - 0.4).abs() < 1e-6);
        // Out-of-range brightness clamps
        assert!((UNTRACKED_COLOR.scale(255).g - 0.9).abs() < 1e-6);
    }

    #[test]
    fn draw_list_reset_keeps_capacity() {
        let mut dl = DrawList::new();
        dl.add_line(LatLong::default(), LatLong::default(), LIST_COLOR);
        let cap = dl.commands.capacity();
        dl.reset();
        assert!(dl.commands.is_empty());
        assert_eq!(dl.commands.capacity(), cap);
    }
}
