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

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A target position in a vehicle's flight plan.
///
/// Identity is `(vehicle, index)`: the index is the waypoint's position in
/// its store and shifts when the list is rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position in the ordered sequence.
    pub index: usize,
    pub coordinate: Coordinate,
    /// Altitude in meters.
    pub altitude: f64,
    /// Heading to hold at the waypoint in degrees.
    #[serde(default)]
    pub yaw: f64,
    /// Continue to the next waypoint without operator confirmation.
    pub auto_continue: bool,
}

impl Waypoint {
    #[must_use]
    pub fn new(index: usize, coordinate: Coordinate, altitude: f64) -> Self {
        Self {
            index,
            coordinate,
            altitude,
            yaw: 0.0,
            auto_continue: true,
        }
    }

    /// Exact latitude/longitude equality, used to reject duplicate clicks.
    #[must_use]
    #[allow(clippy::float_cmp, reason = "duplicate detection is exact by definition")]
    pub fn is_at(&self, coordinate: &Coordinate) -> bool {
        self.coordinate.lat == coordinate.lat && self.coordinate.lon == coordinate.lon
    }
}
