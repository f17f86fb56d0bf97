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

//! Vehicle icons and trails.
//!
//! Each vehicle that reports a position gets one icon on the surface and,
//! when trails are enabled, a polyline of recent positions. Tracks change
//! only through telemetry; the operator never edits them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, Coordinate};
use crate::surface::{Geometry, GeometryId, Layer, MapSurface, SurfaceAdapter};
use crate::vehicle::{Color, SystemType, VehicleId};

/// A single trail sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailPoint {
    pub coordinate: Coordinate,
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Configuration for the track registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Record and draw a trail behind each vehicle.
    pub trail_enabled: bool,
    /// Oldest points are dropped beyond this length.
    pub max_trail_points: usize,
    /// Minimum movement in degrees before a new trail point is recorded.
    pub min_trail_spacing_deg: f64,
    /// Vehicle icon size in pixels.
    pub icon_size: u32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            trail_enabled: false,
            max_trail_points: 1000,
            min_trail_spacing_deg: 0.000_01, // ~1 meter
            icon_size: 50,
        }
    }
}

/// Position report for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFix {
    pub vehicle_id: VehicleId,
    pub coordinate: Coordinate,
    /// Altitude above mean sea level in meters.
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// How a vehicle's icon should look.
#[derive(Debug, Clone, Copy)]
pub struct IconStyle<'a> {
    pub color: Color,
    pub label: &'a str,
    pub system_type: SystemType,
}

/// Result of [`TrackRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackUpdate {
    Created,
    Moved,
}

/// Visual state for one vehicle.
#[derive(Debug, Clone)]
pub struct Track {
    pub vehicle_id: VehicleId,
    pub coordinate: Coordinate,
    pub altitude: f64,
    /// Heading in degrees.
    pub yaw: f64,
    pub color: Color,
    pub label: String,
    pub system_type: SystemType,
    pub selected: bool,
    pub trail: Vec<TrailPoint>,
    pub last_seen: DateTime<Utc>,
    icon: GeometryId,
    trail_id: Option<GeometryId>,
}

impl Track {
    #[must_use]
    pub fn icon_id(&self) -> GeometryId {
        self.icon
    }

    fn icon_geometry(&self, size: u32) -> Geometry {
        Geometry::VehicleIcon {
            vehicle_id: self.vehicle_id,
            coordinate: self.coordinate,
            yaw: self.yaw,
            color: self.color,
            label: self.label.clone(),
            system_type: self.system_type,
            selected: self.selected,
            size,
        }
    }

    fn trail_geometry(&self) -> Geometry {
        Geometry::Trail {
            vehicle_id: self.vehicle_id,
            points: self.trail.iter().map(|p| p.coordinate).collect(),
            color: self.color,
        }
    }

    /// Append to the trail if the vehicle moved far enough. Returns whether
    /// a point was added.
    fn push_trail(&mut self, fix: &PositionFix, config: &TrackConfig) -> bool {
        let should_add = self.trail.last().map_or(true, |last| {
            // Fast Euclidean approximation, fine at trail-spacing scales
            let distance = ((fix.coordinate.lat - last.coordinate.lat).powi(2)
                + (fix.coordinate.lon - last.coordinate.lon).powi(2))
            .sqrt();
            distance > config.min_trail_spacing_deg
        });

        if should_add {
            self.trail.push(TrailPoint {
                coordinate: fix.coordinate,
                altitude: fix.altitude,
                timestamp: fix.timestamp,
            });
            if self.trail.len() > config.max_trail_points {
                let excess = self.trail.len() - config.max_trail_points;
                self.trail.drain(..excess);
            }
        }
        should_add
    }
}

/// Registry of vehicle icons and trails, keyed by vehicle id.
pub struct TrackRegistry {
    tracks: HashMap<VehicleId, Track>,
    config: TrackConfig,
}

impl std::fmt::Debug for TrackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackRegistry")
            .field("track_count", &self.tracks.len())
            .field("trail_enabled", &self.config.trail_enabled)
            .finish()
    }
}

impl TrackRegistry {
    #[must_use]
    pub fn new(config: TrackConfig) -> Self {
        Self {
            tracks: HashMap::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn set_trail_enabled(&mut self, enabled: bool) {
        self.config.trail_enabled = enabled;
    }

    /// Create the vehicle's icon on first sighting, otherwise move it and
    /// extend the trail.
    pub fn upsert<S: MapSurface>(
        &mut self,
        fix: &PositionFix,
        style: &IconStyle<'_>,
        surface: &mut SurfaceAdapter<S>,
    ) -> TrackUpdate {
        let size = self.config.icon_size;

        let Some(track) = self.tracks.get_mut(&fix.vehicle_id) else {
            let mut track = Track {
                vehicle_id: fix.vehicle_id,
                coordinate: fix.coordinate,
                altitude: fix.altitude,
                yaw: 0.0,
                color: style.color,
                label: style.label.to_string(),
                system_type: style.system_type,
                selected: false,
                trail: Vec::new(),
                last_seen: fix.timestamp,
                icon: GeometryId(0),
                trail_id: None,
            };
            debug!("Adding icon for vehicle {}", fix.vehicle_id);
            track.icon = surface.add(Layer::Waypoints, &track.icon_geometry(size));
            if self.config.trail_enabled && track.push_trail(fix, &self.config) {
                track.trail_id = Some(surface.add(Layer::Tracking, &track.trail_geometry()));
            }
            surface.request_update(BoundingBox::from_point(fix.coordinate));
            self.tracks.insert(fix.vehicle_id, track);
            return TrackUpdate::Created;
        };

        let previous = track.coordinate;
        track.coordinate = fix.coordinate;
        track.altitude = fix.altitude;
        track.last_seen = fix.timestamp;
        track.color = style.color;
        track.system_type = style.system_type;
        if track.label != style.label {
            track.label = style.label.to_string();
        }
        surface.update(track.icon, &track.icon_geometry(size));

        if self.config.trail_enabled && track.push_trail(fix, &self.config) {
            let geometry = track.trail_geometry();
            if let Some(id) = track.trail_id {
                surface.update(id, &geometry);
            } else {
                track.trail_id = Some(surface.add(Layer::Tracking, &geometry));
            }
        }

        let mut region = BoundingBox::from_point(previous);
        region.extend(fix.coordinate);
        surface.request_update(region);
        TrackUpdate::Moved
    }

    /// Rotate the vehicle icon. Returns `false` for an unknown vehicle.
    pub fn set_yaw<S: MapSurface>(
        &mut self,
        vehicle_id: VehicleId,
        yaw: f64,
        surface: &mut SurfaceAdapter<S>,
    ) -> bool {
        let size = self.config.icon_size;
        let Some(track) = self.tracks.get_mut(&vehicle_id) else {
            return false;
        };
        track.yaw = yaw;
        surface.update(track.icon, &track.icon_geometry(size));
        surface.request_update(BoundingBox::from_point(track.coordinate));
        true
    }

    /// Toggle the selection highlight. Returns `false` for an unknown vehicle.
    pub fn set_selected<S: MapSurface>(
        &mut self,
        vehicle_id: VehicleId,
        selected: bool,
        surface: &mut SurfaceAdapter<S>,
    ) -> bool {
        let size = self.config.icon_size;
        let Some(track) = self.tracks.get_mut(&vehicle_id) else {
            return false;
        };
        if track.selected != selected {
            track.selected = selected;
            surface.update(track.icon, &track.icon_geometry(size));
            surface.request_update(BoundingBox::from_point(track.coordinate));
        }
        true
    }

    /// Highlight exactly one vehicle (or none).
    pub fn select_only<S: MapSurface>(
        &mut self,
        vehicle_id: Option<VehicleId>,
        surface: &mut SurfaceAdapter<S>,
    ) {
        let ids: Vec<_> = self.tracks.keys().copied().collect();
        for id in ids {
            self.set_selected(id, Some(id) == vehicle_id, surface);
        }
    }

    /// Empty every trail and repaint the whole view.
    pub fn clear_trails<S: MapSurface>(&mut self, surface: &mut SurfaceAdapter<S>) {
        for track in self.tracks.values_mut() {
            track.trail.clear();
            if let Some(id) = track.trail_id {
                surface.update(id, &track.trail_geometry());
            }
        }
        surface.request_update_full();
    }

    #[must_use]
    pub fn get(&self, vehicle_id: VehicleId) -> Option<&Track> {
        self.tracks.get(&vehicle_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn fix(vehicle_id: VehicleId, lat: f64, lon: f64) -> PositionFix {
        PositionFix {
            vehicle_id,
            coordinate: Coordinate::new(lat, lon),
            altitude: 500.0,
            timestamp: Utc::now(),
        }
    }

    fn style() -> IconStyle<'static> {
        IconStyle {
            color: Color::rgb(255, 0, 0),
            label: "1",
            system_type: SystemType::Quadrotor,
        }
    }

    #[test]
    fn test_upsert_creates_then_moves() {
        let mut surface = SurfaceAdapter::new(RecordingSurface::default());
        let mut registry = TrackRegistry::new(TrackConfig::default());

        assert_eq!(registry.upsert(&fix(1, 47.0, 8.5), &style(), &mut surface), TrackUpdate::Created);
        assert_eq!(registry.upsert(&fix(1, 47.1, 8.5), &style(), &mut surface), TrackUpdate::Moved);

        assert_eq!(registry.len(), 1);
        let track = registry.get(1).unwrap();
        assert_eq!(track.coordinate, Coordinate::new(47.1, 8.5));
        assert!(track.trail.is_empty(), "trail is off by default");
        assert_eq!(surface.surface().on_layer(Layer::Waypoints).len(), 1);
        assert!(surface.surface().on_layer(Layer::Tracking).is_empty());

        let last = *surface.surface().update_requests().last().unwrap();
        assert!(last.contains(&Coordinate::new(47.0, 8.5)));
        assert!(last.contains(&Coordinate::new(47.1, 8.5)));
    }

    #[test]
    fn test_trail_spacing_and_cap() {
        let mut surface = SurfaceAdapter::new(RecordingSurface::default());
        let mut registry = TrackRegistry::new(TrackConfig {
            trail_enabled: true,
            max_trail_points: 3,
            ..Default::default()
        });

        registry.upsert(&fix(1, 47.0, 8.5), &style(), &mut surface);
        // Below the spacing threshold: not recorded
        registry.upsert(&fix(1, 47.000_001, 8.5), &style(), &mut surface);
        assert_eq!(registry.get(1).unwrap().trail.len(), 1);

        for i in 1..=4 {
            registry.upsert(&fix(1, 47.0 + f64::from(i) * 0.01, 8.5), &style(), &mut surface);
        }
        let trail = &registry.get(1).unwrap().trail;
        assert_eq!(trail.len(), 3);
        assert!((trail[0].coordinate.lat - 47.02).abs() < 1e-9);
        assert_eq!(surface.surface().on_layer(Layer::Tracking).len(), 1);
    }

    #[test]
    fn test_yaw_and_selection_are_visual_only() {
        let mut surface = SurfaceAdapter::new(RecordingSurface::default());
        let mut registry = TrackRegistry::new(TrackConfig::default());
        registry.upsert(&fix(1, 47.0, 8.5), &style(), &mut surface);
        registry.upsert(&fix(2, 47.0, 8.6), &style(), &mut surface);

        assert!(registry.set_yaw(1, 90.0, &mut surface));
        assert!(!registry.set_yaw(9, 90.0, &mut surface));
        registry.select_only(Some(2), &mut surface);

        assert!((registry.get(1).unwrap().yaw - 90.0).abs() < f64::EPSILON);
        assert!(!registry.get(1).unwrap().selected);
        assert!(registry.get(2).unwrap().selected);

        let icon = surface.surface().geometry(registry.get(2).unwrap().icon_id()).unwrap();
        assert!(matches!(icon, Geometry::VehicleIcon { selected: true, .. }));
    }

    #[test]
    fn test_clear_trails() {
        let mut surface = SurfaceAdapter::new(RecordingSurface::default());
        let mut registry = TrackRegistry::new(TrackConfig {
            trail_enabled: true,
            ..Default::default()
        });
        registry.upsert(&fix(1, 47.0, 8.5), &style(), &mut surface);
        registry.upsert(&fix(1, 47.1, 8.5), &style(), &mut surface);

        registry.clear_trails(&mut surface);
        assert!(registry.get(1).unwrap().trail.is_empty());
        assert!(matches!(
            surface.surface().on_layer(Layer::Tracking)[0],
            Geometry::Trail { points, .. } if points.is_empty()
        ));
    }
}
