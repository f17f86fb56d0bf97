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

//! Vehicle identity and the fleet registry.

mod fleet;

pub use fleet::{Fleet, VehicleEntry};

use serde::{Deserialize, Serialize};

/// System id reported by the vehicle.
pub type VehicleId = u32;

/// RGBA display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha set from a 0.0-1.0 fraction.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is clamped to 0-255 before the cast"
    )]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Default color for waypoints created without a vehicle attached.
    pub const UNATTACHED_PATH: Color = Color::rgb(0, 255, 0);
}

/// Colors handed out to vehicles in discovery order.
const PALETTE: [Color; 8] = [
    Color::rgb(55, 154, 195),
    Color::rgb(255, 150, 0),
    Color::rgb(150, 200, 0),
    Color::rgb(255, 50, 150),
    Color::rgb(150, 50, 255),
    Color::rgb(0, 200, 200),
    Color::rgb(230, 230, 60),
    Color::rgb(240, 240, 240),
];

/// Airframe class, used by the surface to pick an icon shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SystemType {
    #[default]
    Generic,
    FixedWing,
    Quadrotor,
    Helicopter,
    GroundRover,
    Airship,
}

/// A vehicle known to the ground station.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub color: Color,
    pub system_type: SystemType,
    pub is_selected: bool,
}

impl Vehicle {
    /// New unselected vehicle; `ordinal` picks its palette color.
    #[must_use]
    pub fn new(id: VehicleId, ordinal: usize) -> Self {
        Self {
            id,
            name: format!("MAV {id}"),
            color: PALETTE[ordinal % PALETTE.len()],
            system_type: SystemType::default(),
            is_selected: false,
        }
    }

    /// Color used for this vehicle's waypoint path.
    #[must_use]
    pub fn path_color(&self) -> Color {
        self.color.with_alpha(0.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_wraps() {
        let a = Vehicle::new(1, 0);
        let b = Vehicle::new(9, PALETTE.len());
        assert_eq!(a.color, b.color);
        assert_eq!(a.name, "MAV 1");
    }

    #[test]
    fn test_path_color_alpha() {
        let v = Vehicle::new(1, 0);
        assert_eq!(v.path_color().a, 153);
        assert_eq!(v.path_color().r, v.color.r);
    }
}
