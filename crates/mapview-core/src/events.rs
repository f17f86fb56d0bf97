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

//! Inputs to the map view: vehicle telemetry and operator gestures.

use chrono::{DateTime, Utc};

use crate::geo::Coordinate;
use crate::mission::Waypoint;
use crate::surface::GeometryId;
use crate::vehicle::{SystemType, VehicleId};

/// Telemetry from the vehicle link, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// Global position estimate.
    GlobalPosition {
        vehicle_id: VehicleId,
        /// Latitude in degrees (WGS84).
        latitude: f64,
        /// Longitude in degrees (WGS84).
        longitude: f64,
        /// Altitude above mean sea level in meters.
        altitude: f64,
        /// Vehicle timestamp in microseconds since the Unix epoch.
        timestamp_us: u64,
    },

    /// Attitude estimate. Only yaw is shown on the map.
    Attitude {
        vehicle_id: VehicleId,
        roll: f64,
        pitch: f64,
        /// Heading in degrees.
        yaw: f64,
        timestamp_us: u64,
    },

    /// The vehicle reported its complete mission.
    WaypointList {
        vehicle_id: VehicleId,
        waypoints: Vec<Waypoint>,
    },

    /// The vehicle reported one mission item.
    WaypointChanged {
        vehicle_id: VehicleId,
        waypoint: Waypoint,
    },

    Heartbeat {
        vehicle_id: VehicleId,
        system_type: SystemType,
    },
}

impl TelemetryEvent {
    #[must_use]
    pub fn vehicle_id(&self) -> VehicleId {
        match self {
            Self::GlobalPosition { vehicle_id, .. }
            | Self::Attitude { vehicle_id, .. }
            | Self::WaypointList { vehicle_id, .. }
            | Self::WaypointChanged { vehicle_id, .. }
            | Self::Heartbeat { vehicle_id, .. } => *vehicle_id,
        }
    }

    /// Vehicle timestamp as a UTC time, if the variant carries one.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::GlobalPosition { timestamp_us, .. } | Self::Attitude { timestamp_us, .. } => {
                i64::try_from(*timestamp_us)
                    .ok()
                    .and_then(DateTime::from_timestamp_micros)
            }
            _ => None,
        }
    }
}

/// Operator gestures delivered by the map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorInput {
    /// Click on empty map.
    MapClicked { coordinate: Coordinate },
    GeometryClicked { id: GeometryId },
    /// Pointer moved while holding a geometry.
    GeometryDragged { id: GeometryId, coordinate: Coordinate },
    /// Pointer released over the map.
    GeometryDragEnded { id: GeometryId, coordinate: Coordinate },
    /// Escape pressed or pointer left the map mid-drag.
    CancelDrag,
    /// Mouse wheel delta in eighths of a degree.
    Wheel { delta: i32 },
}
