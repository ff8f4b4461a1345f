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

//! Typed event stream from the simulator.
//!
//! Events are delivered as a monotonic sequence each frame; the scope applies
//! them in order before any conflict detection runs.

use serde::{Deserialize, Serialize};

use crate::world::{Acid, Tcp};

/// Discrete simulator event kinds the scope reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    PointOut,
    AcknowledgedPointOut,
    RecalledPointOut,
    RejectedPointOut,
    FlightPlanAssociated,
    OfferedHandoff,
    AcceptedHandoff,
    AcceptedRedirectedHandoff,
    SetGlobalLeaderLine,
    ForceQl,
    TransferRejected,
    TransferAccepted,
    Ident,
}

/// One event record: kind plus the ACID and TCPs it applies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub acid: Acid,
    pub from_controller: Tcp,
    pub to_controller: Tcp,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, acid: impl Into<Acid>) -> Self {
        Self {
            kind,
            acid: acid.into(),
            from_controller: Tcp::new(),
            to_controller: Tcp::new(),
        }
    }

    #[must_use]
    pub fn from(mut self, tcp: impl Into<Tcp>) -> Self {
        self.from_controller = tcp.into();
        self
    }

    #[must_use]
    pub fn to(mut self, tcp: impl Into<Tcp>) -> Self {
        self.to_controller = tcp.into();
        self
    }
}
