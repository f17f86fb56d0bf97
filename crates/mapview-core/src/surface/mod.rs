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

//! Boundary to the map surface that owns tiles and rendering.
//!
//! The core never draws. It hands value geometries to a [`MapSurface`]
//! through the [`SurfaceAdapter`], which allocates ids, remembers what kind
//! of geometry each id names, gates redraws on visibility and coalesces
//! redraw regions during bulk updates.

mod adapter;
mod recording;

pub use adapter::SurfaceAdapter;
pub use recording::{RecordingSurface, SurfaceCommand};

use crate::geo::{BoundingBox, Coordinate};
use crate::vehicle::{Color, SystemType, VehicleId};

/// Handle for a geometry placed on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

impl std::fmt::Display for GeometryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Drawing layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Tracking,
    Waypoints,
    Camera,
}

/// Everything the core asks the surface to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Draggable marker for one waypoint, labelled with its index.
    WaypointIcon {
        index: usize,
        coordinate: Coordinate,
        color: Color,
        size: u32,
    },
    /// Polyline through all waypoints in order.
    WaypointPath { points: Vec<Coordinate>, color: Color },
    VehicleIcon {
        vehicle_id: VehicleId,
        coordinate: Coordinate,
        yaw: f64,
        color: Color,
        label: String,
        system_type: SystemType,
        selected: bool,
        size: u32,
    },
    Trail {
        vehicle_id: VehicleId,
        points: Vec<Coordinate>,
        color: Color,
    },
    /// Camera footprint circle; `radius` is in surface pixels.
    CameraBorder { center: Coordinate, radius: f64 },
}

/// Discriminant of a [`Geometry`], used to dispatch surface clicks and drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    WaypointIcon { index: usize },
    WaypointPath,
    VehicleIcon { vehicle_id: VehicleId },
    Trail { vehicle_id: VehicleId },
    CameraBorder,
}

impl Geometry {
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::WaypointIcon { index, .. } => GeometryKind::WaypointIcon { index: *index },
            Self::WaypointPath { .. } => GeometryKind::WaypointPath,
            Self::VehicleIcon { vehicle_id, .. } => GeometryKind::VehicleIcon {
                vehicle_id: *vehicle_id,
            },
            Self::Trail { vehicle_id, .. } => GeometryKind::Trail {
                vehicle_id: *vehicle_id,
            },
            Self::CameraBorder { .. } => GeometryKind::CameraBorder,
        }
    }

    /// Geographic extent, or `None` for an empty polyline.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Self::WaypointIcon { coordinate, .. } | Self::VehicleIcon { coordinate, .. } => {
                Some(BoundingBox::from_point(*coordinate))
            }
            Self::CameraBorder { center, .. } => Some(BoundingBox::from_point(*center)),
            Self::WaypointPath { points, .. } | Self::Trail { points, .. } => {
                BoundingBox::from_points(points.iter().copied())
            }
        }
    }
}

/// Commands accepted by the external map surface.
///
/// Regions are geographic; the surface pads them by its own icon extents
/// when converting to pixels.
pub trait MapSurface {
    fn add_geometry(&mut self, id: GeometryId, layer: Layer, geometry: &Geometry);

    /// Replace the geometry stored under `id`.
    fn update_geometry(&mut self, id: GeometryId, geometry: &Geometry);

    fn remove_geometry(&mut self, id: GeometryId);

    fn clear_geometries(&mut self, layer: Layer);

    /// Repaint the part of the view covering `region`.
    fn update_request(&mut self, region: &BoundingBox);

    fn update_request_full(&mut self);

    fn set_view(&mut self, center: Coordinate);

    fn set_zoom(&mut self, level: u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminant() {
        let icon = Geometry::WaypointIcon {
            index: 3,
            coordinate: Coordinate::new(47.0, 8.5),
            color: Color::UNATTACHED_PATH,
            size: 20,
        };
        assert_eq!(icon.kind(), GeometryKind::WaypointIcon { index: 3 });

        let trail = Geometry::Trail {
            vehicle_id: 2,
            points: Vec::new(),
            color: Color::UNATTACHED_PATH,
        };
        assert_eq!(trail.kind(), GeometryKind::Trail { vehicle_id: 2 });
        assert!(trail.bounding_box().is_none());
    }
}
