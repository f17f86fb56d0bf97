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

use crate::error::MapError;
use crate::geo::Coordinate;

/// Wheel delta reported for one notch, in eighths of a degree.
const WHEEL_EIGHTHS_PER_DEGREE: i32 = 8;
const WHEEL_DEGREES_PER_STEP: i32 = 15;

/// Camera footprint radius per zoom level, in pixels.
const CAMERA_RADIUS_PER_ZOOM: f64 = 20.0;

/// Center and zoom of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub center: Coordinate,
    pub zoom: u8,
    /// Zoom-in steps requested past `max_zoom` by the last wheel gesture.
    pub detail_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl ViewState {
    #[must_use]
    pub fn new(center: Coordinate, zoom: u8, min_zoom: u8, max_zoom: u8) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        Self {
            center,
            zoom: zoom.clamp(min_zoom, max_zoom),
            detail_zoom: 0,
            min_zoom,
            max_zoom,
        }
    }

    /// Apply a mouse wheel delta. Returns the new zoom level.
    pub fn zoom_by_wheel(&mut self, delta: i32) -> u8 {
        let steps = delta / WHEEL_EIGHTHS_PER_DEGREE / WHEEL_DEGREES_PER_STEP;
        let requested = i32::from(self.zoom) + steps;
        self.zoom = self.clamp(requested);
        self.detail_zoom = u8::try_from((requested - i32::from(self.zoom)).max(0)).unwrap_or(u8::MAX);
        self.zoom
    }

    pub fn zoom_in(&mut self) -> u8 {
        self.set_zoom(i32::from(self.zoom) + 1)
    }

    pub fn zoom_out(&mut self) -> u8 {
        self.set_zoom(i32::from(self.zoom) - 1)
    }

    /// Set the zoom level, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: i32) -> u8 {
        self.zoom = self.clamp(zoom);
        self.detail_zoom = 0;
        self.zoom
    }

    /// Radius of the camera footprint circle at the current zoom.
    #[must_use]
    pub fn camera_radius(&self) -> f64 {
        CAMERA_RADIUS_PER_ZOOM * f64::from(self.zoom)
    }

    fn clamp(&self, zoom: i32) -> u8 {
        let clamped = zoom.clamp(i32::from(self.min_zoom), i32::from(self.max_zoom));
        u8::try_from(clamped).unwrap_or(self.max_zoom)
    }
}

/// Parse operator input of the form `"lat,lon"`.
pub fn parse_go_to(text: &str) -> Result<Coordinate, MapError> {
    let invalid = || MapError::InvalidCoordinate(text.to_string());
    let (lat, lon) = text.split_once(',').ok_or_else(invalid)?;
    if lon.contains(',') {
        return Err(invalid());
    }
    let lat = lat.trim().parse::<f64>().ok().ok_or_else(invalid)?;
    let lon = lon.trim().parse::<f64>().ok().ok_or_else(invalid)?;
    let coordinate = Coordinate::new(lat, lon);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewState {
        ViewState::new(Coordinate::new(47.376_889, 8.548_056), 16, 0, 17)
    }

    #[test]
    fn test_wheel_steps() {
        let mut v = view();
        // 120 eighths = 15 degrees = one step
        assert_eq!(v.zoom_by_wheel(-240), 14);
        assert_eq!(v.detail_zoom, 0);
        assert_eq!(v.zoom_by_wheel(119), 14);
    }

    #[test]
    fn test_wheel_past_max_records_detail_zoom() {
        let mut v = view();
        assert_eq!(v.zoom_by_wheel(480), 17);
        assert_eq!(v.detail_zoom, 3);
        v.zoom_by_wheel(-120);
        assert_eq!(v.detail_zoom, 0);
    }

    #[test]
    fn test_wheel_past_min_has_no_detail() {
        let mut v = ViewState::new(Coordinate::default(), 1, 0, 17);
        assert_eq!(v.zoom_by_wheel(-600), 0);
        assert_eq!(v.detail_zoom, 0);
    }

    #[test]
    fn test_zoom_buttons_clamp() {
        let mut v = view();
        assert_eq!(v.zoom_in(), 17);
        assert_eq!(v.zoom_in(), 17);
        assert_eq!(v.zoom_out(), 16);
    }

    #[test]
    fn test_parse_go_to() {
        assert_eq!(parse_go_to("47.1, 8.5"), Ok(Coordinate::new(47.1, 8.5)));
        assert!(matches!(parse_go_to("47.1"), Err(MapError::InvalidCoordinate(_))));
        assert!(parse_go_to("1,2,3").is_err());
        assert!(parse_go_to("north,8.5").is_err());
        assert!(parse_go_to("91,8.5").is_err());
    }

    #[test]
    fn test_camera_radius_scales_with_zoom() {
        let mut v = view();
        assert!((v.camera_radius() - 320.0).abs() < f64::EPSILON);
        v.zoom_out();
        assert!((v.camera_radius() - 300.0).abs() < f64::EPSILON);
    }
}
