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

use crate::follow::DEFAULT_FOLLOW_INTERVAL_MS;
use crate::geo::Coordinate;
use crate::track::TrackConfig;

/// Configuration for a [`crate::MapView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewConfig {
    pub track: TrackConfig,
    /// Minimum ground time between follow re-centers.
    pub follow_interval_ms: u64,
    pub follow_enabled: bool,
    pub default_center: Coordinate,
    pub default_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Pixel size of waypoint icons.
    pub waypoint_icon_size: u32,
    /// Make the first vehicle heard from the active one.
    pub select_first_vehicle: bool,
    /// Buffer size of each waypoint store's notification channel.
    pub event_channel_capacity: usize,
    pub draw_camera_border: bool,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            follow_interval_ms: DEFAULT_FOLLOW_INTERVAL_MS,
            follow_enabled: false,
            default_center: Coordinate::new(47.376_889, 8.548_056),
            default_zoom: 16,
            min_zoom: 0,
            max_zoom: 17,
            waypoint_icon_size: 20,
            select_first_vehicle: true,
            event_channel_capacity: 256,
            draw_camera_border: false,
        }
    }
}
