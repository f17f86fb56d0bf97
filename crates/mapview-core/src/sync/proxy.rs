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

use crate::geo::{Coordinate, ScreenPoint, WebMercator};
use crate::mission::Waypoint;
use crate::surface::GeometryId;

/// On-map representation of one waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProxy {
    pub index: usize,
    pub coordinate: Coordinate,
    /// World-pixel position at the controller's current zoom.
    pub screen: ScreenPoint,
    /// Draggable icon on the waypoint layer.
    pub icon: GeometryId,
    /// Vertex of this waypoint in the path polyline.
    pub segment: usize,
}

impl VisualProxy {
    pub(crate) fn place(&mut self, coordinate: Coordinate, zoom: u8) {
        self.coordinate = coordinate;
        self.screen = WebMercator::project(coordinate, zoom);
    }
}

/// A waypoint and its proxy, kept together so the two can never drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSlot {
    pub waypoint: Waypoint,
    pub proxy: VisualProxy,
}
