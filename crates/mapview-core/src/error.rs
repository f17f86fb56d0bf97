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

//! Error types for the map view core.
//!
//! None of these are fatal. The map view keeps consuming telemetry after any
//! of them and waits for the next full waypoint sync to restore consistency.

use thiserror::Error;

use crate::vehicle::VehicleId;

/// Errors raised by the waypoint store, fleet and synchronization controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    /// An index referred to a waypoint or proxy that no longer exists,
    /// usually a stale event racing a list change.
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A drag gesture on `index` while `dragging` holds the only drag session.
    #[error("waypoint {dragging} is being dragged, gesture on {index} refused")]
    DragInProgress { index: usize, dragging: usize },

    #[error("no active vehicle attached")]
    NoActiveVehicle,

    /// A waypoint already sits at exactly this latitude/longitude.
    #[error("waypoint already exists at ({lat}, {lon})")]
    DuplicateWaypointCoordinate { lat: f64, lon: f64 },

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

impl MapError {
    /// Whether the error is the expected outcome of an event racing a list change.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }
}
