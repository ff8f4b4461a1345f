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

//! Conflict engines: MSAW, CA, MCI, and ATPA in-trail monitoring.
//!
//! The engines run every radar tick in a fixed order (MSAW, CA, MCI, ATPA)
//! after event ingestion and before datablock composition.

mod atpa;
mod ca;
mod msaw;

pub use atpa::update_atpa;
pub use ca::{diverging, Conflict, ConflictMonitor};
pub use msaw::update_msaw;

/// Lateral CA minimum in NM
pub const LATERAL_MINIMUM: f64 = 3.0;
/// Vertical CA minimum in feet; the test uses minimum minus 5
pub const VERTICAL_MINIMUM: i32 = 1000;
/// Lateral MCI minimum in NM
pub const MCI_LATERAL_MINIMUM: f64 = 1.5;
/// Vertical MCI minimum in feet; the test uses minimum minus 5
pub const MCI_VERTICAL_MINIMUM: i32 = 500;
/// Seconds the CA/MCI/MSAW tone sounds after first detection
pub const ALERT_AUDIO_SECONDS: i64 = 5;
