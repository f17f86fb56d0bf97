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

//! Geographic primitives.
//!
//! Coordinates are WGS84 degrees. Distances are meters unless the function
//! name says otherwise.

mod bounds;
mod mercator;

pub use bounds::BoundingBox;
pub use mercator::{ScreenPoint, WebMercator, TILE_SIZE};

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite and within WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance in meters (Haversine).
    #[must_use]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Initial bearing towards `other` in degrees (0-360, north = 0).
    #[must_use]
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Destination after travelling `distance_m` along a great circle.
    #[must_use]
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> Coordinate {
        let angular = distance_m / EARTH_RADIUS_METERS;
        let bearing = bearing_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        Coordinate::new(lat2.to_degrees(), (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0)
    }

    /// Flat-earth offset by bearing and range in nautical miles.
    ///
    /// One nautical mile is treated as one arc-minute on both axes, so this
    /// is only meaningful for short ranges near the equator. It matches the
    /// footprint math camera overlays have always used.
    #[must_use]
    pub fn offset_nm(&self, bearing_deg: f64, range_nm: f64) -> Coordinate {
        let bearing = bearing_deg.to_radians();
        Coordinate::new(
            self.lat + (range_nm / 60.0) * bearing.cos(),
            self.lon + (range_nm / 60.0) * bearing.sin(),
        )
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self::new(lat, lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zurich_to_bern() {
        // Zurich HB to Bern HB is roughly 95 km as the crow flies
        let zurich = Coordinate::new(47.3779, 8.5403);
        let bern = Coordinate::new(46.9490, 7.4391);
        let d = zurich.distance_to(&bern);
        assert!((d - 95_000.0).abs() < 2_000.0, "got {d}");
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((origin.bearing_to(&Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-6);
        assert!((origin.bearing_to(&Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-6);
        assert!((origin.bearing_to(&Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-6);
        assert!((origin.bearing_to(&Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_destination_matches_distance_and_bearing() {
        let start = Coordinate::new(47.376889, 8.548056);
        let end = start.destination(45.0, 1_000.0);
        assert!((start.distance_to(&end) - 1_000.0).abs() < 0.5);
        assert!((start.bearing_to(&end) - 45.0).abs() < 0.1);
    }

    #[test]
    fn test_offset_nm_sixty_miles_is_one_degree() {
        let start = Coordinate::new(10.0, 20.0);
        let north = start.offset_nm(0.0, 60.0);
        assert!((north.lat - 11.0).abs() < 1e-9);
        assert!((north.lon - 20.0).abs() < 1e-9);

        let east = start.offset_nm(90.0, 60.0);
        assert!((east.lat - 10.0).abs() < 1e-9);
        assert!((east.lon - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(47.0, 8.5).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }
}
