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

use super::Coordinate;

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Web Mercator latitude limit; the projection diverges at the poles.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Position in world pixels at a given zoom level (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Web Mercator projection utilities
#[derive(Debug, Clone, Copy)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to Web Mercator Y in tile units
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let n = 2_f64.powi(i32::from(zoom));
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert longitude to Web Mercator X in tile units
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert tile Y back to latitude
    #[must_use]
    pub fn y_to_lat(y: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// Convert tile X back to longitude
    #[must_use]
    pub fn x_to_lon(x: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        x / n * 360.0 - 180.0
    }

    /// Project a coordinate to world pixels.
    #[must_use]
    pub fn project(coordinate: Coordinate, zoom: u8) -> ScreenPoint {
        let size = f64::from(TILE_SIZE);
        ScreenPoint {
            x: Self::lon_to_x(coordinate.lon, zoom) * size,
            y: Self::lat_to_y(coordinate.lat, zoom) * size,
        }
    }

    /// Inverse of [`WebMercator::project`].
    #[must_use]
    pub fn unproject(point: ScreenPoint, zoom: u8) -> Coordinate {
        let size = f64::from(TILE_SIZE);
        Coordinate::new(
            Self::y_to_lat(point.y / size, zoom),
            Self::x_to_lon(point.x / size, zoom),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_world_center() {
        let p = WebMercator::project(Coordinate::new(0.0, 0.0), 0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_unproject() {
        let c = Coordinate::new(47.376889, 8.548056);
        let back = WebMercator::unproject(WebMercator::project(c, 16), 16);
        assert!((back.lat - c.lat).abs() < 1e-9);
        assert!((back.lon - c.lon).abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitude_is_clamped() {
        let p = WebMercator::project(Coordinate::new(90.0, 0.0), 1);
        assert!(p.y.is_finite());
        assert!(p.y.abs() < 1e-6);
    }
}
