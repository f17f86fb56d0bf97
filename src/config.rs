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

//! Application configuration management.
//!
//! Settings persist as TOML in the platform config directory. Every field
//! has a serde default so files written by older versions still load.

use mapview_core::{Coordinate, MapViewConfig, TrackConfig};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "gcs-mapview";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Re-center the map on the active vehicle
    #[serde(default)]
    pub follow_vehicle: bool,

    /// Minimum time between follow re-centers in milliseconds
    #[serde(default = "default_follow_interval_ms")]
    pub follow_interval_ms: u64,

    /// Draw a trail behind each vehicle
    #[serde(default)]
    pub show_trails: bool,

    /// Maximum points kept per trail
    #[serde(default = "default_max_trail_points")]
    pub max_trail_points: usize,

    /// Map center on startup
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    #[serde(default = "default_longitude")]
    pub default_longitude: f64,

    /// Map zoom on startup (0 - 17)
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,

    /// Draw the camera footprint circle at the view center
    #[serde(default)]
    pub show_camera_border: bool,

    /// Number of simulated vehicles in the demo feed
    #[serde(default = "default_sim_vehicles")]
    pub sim_vehicles: u32,

    /// Position reports per second per simulated vehicle
    #[serde(default = "default_sim_rate_hz")]
    pub sim_rate_hz: u32,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_follow_interval_ms() -> u64 {
    MapViewConfig::default().follow_interval_ms
}

fn default_max_trail_points() -> usize {
    TrackConfig::default().max_trail_points
}

fn default_latitude() -> f64 {
    MapViewConfig::default().default_center.lat
}

fn default_longitude() -> f64 {
    MapViewConfig::default().default_center.lon
}

fn default_zoom() -> u8 {
    MapViewConfig::default().default_zoom
}

fn default_sim_vehicles() -> u32 {
    2
}

fn default_sim_rate_hz() -> u32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            follow_vehicle: false,
            follow_interval_ms: default_follow_interval_ms(),
            show_trails: false,
            max_trail_points: default_max_trail_points(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            default_zoom: default_zoom(),
            show_camera_border: false,
            sim_vehicles: default_sim_vehicles(),
            sim_rate_hz: default_sim_rate_hz(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Map view settings derived from this configuration
    pub fn to_map_view_config(&self) -> MapViewConfig {
        let defaults = MapViewConfig::default();
        MapViewConfig {
            track: TrackConfig {
                trail_enabled: self.show_trails,
                max_trail_points: self.max_trail_points.max(1),
                ..defaults.track.clone()
            },
            follow_interval_ms: self.follow_interval_ms,
            follow_enabled: self.follow_vehicle,
            default_center: Coordinate::new(self.default_latitude, self.default_longitude),
            default_zoom: self.default_zoom,
            draw_camera_border: self.show_camera_border,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library() {
        let config = AppConfig::default().to_map_view_config();
        assert_eq!(config, MapViewConfig::default());
    }

    #[test]
    fn test_overrides_flow_into_map_config() {
        let app = AppConfig {
            follow_vehicle: true,
            show_trails: true,
            max_trail_points: 0,
            default_latitude: 46.0,
            default_longitude: 7.0,
            default_zoom: 12,
            ..Default::default()
        };
        let config = app.to_map_view_config();
        assert!(config.follow_enabled);
        assert!(config.track.trail_enabled);
        assert_eq!(config.track.max_trail_points, 1);
        assert_eq!(config.default_center, Coordinate::new(46.0, 7.0));
        assert_eq!(config.default_zoom, 12);
    }
}
