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

//! The map view: one controller loop owning every piece of map state.
//!
//! Telemetry and operator input are fed in through
//! [`MapView::handle_telemetry`] and [`MapView::handle_input`]. Waypoint
//! store notifications for the active vehicle are drained by
//! [`MapView::pump`], which both handlers call before returning.

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::MapViewConfig;
use crate::error::MapError;
use crate::events::{OperatorInput, TelemetryEvent};
use crate::follow::{FollowLimiter, GroundClock, SystemClock};
use crate::geo::Coordinate;
use crate::mission::{Waypoint, WaypointEvent};
use crate::surface::{Geometry, GeometryId, GeometryKind, Layer, MapSurface, SurfaceAdapter};
use crate::sync::{ActiveVehicle, SyncController};
use crate::track::{IconStyle, PositionFix, TrackRegistry, TrackUpdate};
use crate::vehicle::{Fleet, VehicleId};
use crate::view::{parse_go_to, ViewState};

/// Map view state and the logic that keeps it in step with the fleet.
#[derive(Debug)]
pub struct MapView<S, C = SystemClock> {
    config: MapViewConfig,
    surface: SurfaceAdapter<S>,
    fleet: Fleet,
    sync: SyncController,
    tracks: TrackRegistry,
    follow: FollowLimiter,
    view: ViewState,
    clock: C,
    subscription: Option<(VehicleId, broadcast::Receiver<WaypointEvent>)>,
    camera_border: bool,
}

impl<S: MapSurface> MapView<S, SystemClock> {
    pub fn new(surface: S, config: MapViewConfig) -> Self {
        Self::with_clock(surface, config, SystemClock)
    }
}

impl<S: MapSurface, C: GroundClock> MapView<S, C> {
    /// Create a map view using `clock` for follow rate limiting.
    pub fn with_clock(surface: S, config: MapViewConfig, clock: C) -> Self {
        let view = ViewState::new(
            config.default_center,
            config.default_zoom,
            config.min_zoom,
            config.max_zoom,
        );
        let mut surface = SurfaceAdapter::new(surface);
        surface.set_zoom(view.zoom);
        surface.set_view(view.center);

        let mut map = Self {
            fleet: Fleet::new(config.event_channel_capacity),
            sync: SyncController::new(None, config.waypoint_icon_size, view.zoom),
            tracks: TrackRegistry::new(config.track.clone()),
            follow: FollowLimiter::new(config.follow_interval_ms, config.follow_enabled),
            camera_border: config.draw_camera_border,
            surface,
            view,
            clock,
            subscription: None,
            config,
        };
        map.draw_camera_border();
        map
    }

    /// Apply one telemetry event.
    pub fn handle_telemetry(&mut self, event: TelemetryEvent) {
        let vehicle_id = event.vehicle_id();
        let (_, created) = self.fleet.get_or_insert(vehicle_id);
        if created && self.config.select_first_vehicle && self.fleet.selected_id().is_none() {
            if let Err(e) = self.select_vehicle(vehicle_id) {
                warn!("Could not select vehicle {}: {}", vehicle_id, e);
            }
        }

        let timestamp = event.timestamp();
        match event {
            TelemetryEvent::GlobalPosition {
                latitude,
                longitude,
                altitude,
                ..
            } => {
                let coordinate = Coordinate::new(latitude, longitude);
                if !coordinate.is_valid() {
                    debug!("Dropping invalid position {} for vehicle {}", coordinate, vehicle_id);
                    return;
                }
                let fix = PositionFix {
                    vehicle_id,
                    coordinate,
                    altitude,
                    timestamp: timestamp.unwrap_or_else(Utc::now),
                };
                self.on_position(&fix);
            }
            TelemetryEvent::Attitude { yaw, .. } => {
                self.tracks.set_yaw(vehicle_id, yaw, &mut self.surface);
            }
            TelemetryEvent::WaypointList { waypoints, .. } => {
                if let Some(store) = self.fleet.store_mut(vehicle_id) {
                    debug!("Vehicle {} reported {} waypoints", vehicle_id, waypoints.len());
                    store.replace_all(waypoints);
                }
            }
            TelemetryEvent::WaypointChanged { waypoint, .. } => {
                if let Some(store) = self.fleet.store_mut(vehicle_id) {
                    if let Err(e) = store.apply_reported(waypoint) {
                        debug!("Ignoring waypoint from vehicle {}: {}", vehicle_id, e);
                    }
                }
            }
            TelemetryEvent::Heartbeat { system_type, .. } => {
                if let Some(entry) = self.fleet.get_mut(vehicle_id) {
                    entry.vehicle.system_type = system_type;
                }
            }
        }

        self.pump();
    }

    /// Apply one operator gesture.
    pub fn handle_input(&mut self, input: OperatorInput) {
        match input {
            OperatorInput::MapClicked { coordinate } => {
                let store = self.sync.active().and_then(|a| self.fleet.store_mut(a.id));
                match self.sync.on_operator_click(coordinate, store, &mut self.surface) {
                    Ok(Some(index)) => debug!("Added waypoint {} at {}", index, coordinate),
                    Ok(None) => {}
                    Err(e) => info!("Waypoint not added: {}", e),
                }
            }
            OperatorInput::GeometryClicked { id } => match self.surface.kind_of(id) {
                Some(GeometryKind::VehicleIcon { vehicle_id }) => {
                    self.sync.on_geometry_clicked();
                    if let Err(e) = self.select_vehicle(vehicle_id) {
                        warn!("Could not select vehicle {}: {}", vehicle_id, e);
                    }
                }
                Some(_) => self.sync.on_geometry_clicked(),
                None => debug!("Click on unknown geometry {}", id),
            },
            OperatorInput::GeometryDragged { id, coordinate } => {
                if let Some(index) = self.waypoint_index(id) {
                    self.sync.on_operator_drag_move(index, coordinate, &mut self.surface);
                }
            }
            OperatorInput::GeometryDragEnded { id, coordinate } => {
                if let Some(index) = self.waypoint_index(id) {
                    let store = self.sync.active().and_then(|a| self.fleet.store_mut(a.id));
                    if let Err(e) =
                        self.sync
                            .on_operator_drag_end(index, coordinate, store, &mut self.surface)
                    {
                        debug!("Drag of waypoint {} kept locally: {}", index, e);
                    }
                }
            }
            OperatorInput::CancelDrag => {
                let store = self.sync.active().and_then(|a| self.fleet.store(a.id));
                self.sync.cancel_drag(store, &mut self.surface);
            }
            OperatorInput::Wheel { delta } => {
                self.zoom_by_wheel(delta);
            }
        }

        self.pump();
    }

    /// Drain pending notifications from the active vehicle's store.
    ///
    /// Returns how many notifications were applied. A lagged channel is
    /// answered with a full reconciliation.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let received = match self.subscription.as_mut() {
                Some((_, rx)) => rx.try_recv(),
                None => break,
            };
            match received {
                Ok(WaypointEvent::Changed { vehicle_id, index }) => {
                    let Some(store) = self.fleet.store(vehicle_id) else {
                        continue;
                    };
                    let Ok(waypoint) = store.get_at(index).cloned() else {
                        debug!("Waypoint {} of vehicle {} is gone", index, vehicle_id);
                        continue;
                    };
                    self.sync.on_remote_waypoint_changed(
                        vehicle_id,
                        &waypoint,
                        store,
                        false,
                        &mut self.surface,
                    );
                    applied += 1;
                }
                Ok(WaypointEvent::ListReplaced { vehicle_id }) => {
                    if let Some(store) = self.fleet.store(vehicle_id) {
                        self.sync
                            .on_remote_waypoint_list_changed(vehicle_id, store, &mut self.surface);
                    }
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Missed {} waypoint notifications, resynchronizing", skipped);
                    self.reconcile();
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    self.subscription = None;
                    break;
                }
            }
        }
        applied
    }

    /// Rebuild every waypoint proxy from the active vehicle's store.
    pub fn reconcile(&mut self) {
        let Some(active) = self.sync.active() else {
            return;
        };
        if let Some(store) = self.fleet.store(active.id) {
            self.sync
                .on_remote_waypoint_list_changed(active.id, store, &mut self.surface);
        }
    }

    /// Make `vehicle_id` the vehicle whose waypoints are shown and edited.
    pub fn select_vehicle(&mut self, vehicle_id: VehicleId) -> Result<(), MapError> {
        let vehicle = self.fleet.select(vehicle_id)?;
        let active = ActiveVehicle {
            id: vehicle.id,
            path_color: vehicle.path_color(),
        };
        let store = self
            .fleet
            .store(vehicle_id)
            .ok_or(MapError::UnknownVehicle(vehicle_id))?;

        self.subscription = Some((vehicle_id, store.subscribe()));
        self.surface.begin_batch();
        self.sync.on_vehicle_selected(active, store, &mut self.surface);
        self.tracks.select_only(Some(vehicle_id), &mut self.surface);
        self.surface.end_batch();
        Ok(())
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.surface.set_visible(visible);
    }

    pub fn set_follow(&mut self, enabled: bool) {
        self.follow.set_enabled(enabled);
    }

    pub fn set_create_path(&mut self, armed: bool) {
        self.sync.set_create_path(armed);
    }

    pub fn set_trails_enabled(&mut self, enabled: bool) {
        self.tracks.set_trail_enabled(enabled);
    }

    /// Center the view on operator-entered `"lat,lon"` text.
    pub fn go_to(&mut self, text: &str) -> Result<Coordinate, MapError> {
        let coordinate = parse_go_to(text)?;
        self.center_on(coordinate);
        Ok(coordinate)
    }

    pub fn center_on(&mut self, coordinate: Coordinate) {
        self.view.center = coordinate;
        self.surface.set_view(coordinate);
        self.draw_camera_border();
    }

    pub fn zoom_by_wheel(&mut self, delta: i32) -> u8 {
        let before = self.view.zoom;
        let zoom = self.view.zoom_by_wheel(delta);
        if zoom != before {
            self.apply_zoom();
        }
        zoom
    }

    pub fn zoom_in(&mut self) -> u8 {
        let zoom = self.view.zoom_in();
        self.apply_zoom();
        zoom
    }

    pub fn zoom_out(&mut self) -> u8 {
        let zoom = self.view.zoom_out();
        self.apply_zoom();
        zoom
    }

    /// Show or hide the camera footprint circle.
    pub fn set_camera_border(&mut self, enabled: bool) {
        self.camera_border = enabled;
        if enabled {
            self.draw_camera_border();
        } else if self.surface.clear_layer(Layer::Camera).is_some() {
            self.surface.request_update_full();
        }
    }

    /// Remove every waypoint of the active vehicle, on the map and in its store.
    pub fn clear_waypoints(&mut self) {
        self.sync.clear_waypoints(&mut self.surface);
        if let Some(store) = self.sync.active().and_then(|a| self.fleet.store_mut(a.id)) {
            store.clear();
        }
        self.pump();
    }

    pub fn clear_trails(&mut self) {
        self.tracks.clear_trails(&mut self.surface);
    }

    /// Waypoints edited on the map since the last call, ready to send to the
    /// active vehicle.
    pub fn take_pending_uploads(&mut self) -> Result<Vec<Waypoint>, MapError> {
        let active = self.sync.active().ok_or(MapError::NoActiveVehicle)?;
        self.fleet
            .store_mut(active.id)
            .map(crate::mission::WaypointStore::take_pending_uploads)
            .ok_or(MapError::NoActiveVehicle)
    }

    #[must_use]
    pub fn active_vehicle(&self) -> Option<VehicleId> {
        self.sync.active().map(|a| a.id)
    }

    #[must_use]
    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    #[must_use]
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Mutable fleet access, for edits that bypass telemetry. Call
    /// [`MapView::pump`] afterwards to apply the resulting notifications.
    pub fn fleet_mut(&mut self) -> &mut Fleet {
        &mut self.fleet
    }

    #[must_use]
    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    #[must_use]
    pub fn tracks(&self) -> &TrackRegistry {
        &self.tracks
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn surface(&self) -> &SurfaceAdapter<S> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceAdapter<S> {
        &mut self.surface
    }

    fn on_position(&mut self, fix: &PositionFix) {
        let vehicle_id = fix.vehicle_id;
        let Some(entry) = self.fleet.get(vehicle_id) else {
            return;
        };
        let label = entry.vehicle.id.to_string();
        let style = IconStyle {
            color: entry.vehicle.color,
            label: &label,
            system_type: entry.vehicle.system_type,
        };
        if self.tracks.upsert(fix, &style, &mut self.surface) == TrackUpdate::Created {
            let selected = self.fleet.selected_id() == Some(vehicle_id);
            self.tracks.set_selected(vehicle_id, selected, &mut self.surface);
        }

        let is_active = self.sync.is_active(vehicle_id);
        let now = self.clock.now_ms();
        if self.follow.on_position(is_active, self.surface.is_visible(), now) {
            self.center_on(fix.coordinate);
        }
    }

    fn waypoint_index(&self, id: GeometryId) -> Option<usize> {
        match self.surface.kind_of(id) {
            Some(GeometryKind::WaypointIcon { .. }) => self.sync.index_of_icon(id),
            Some(_) => None,
            None => {
                debug!("Drag on unknown geometry {}", id);
                None
            }
        }
    }

    fn apply_zoom(&mut self) {
        self.surface.set_zoom(self.view.zoom);
        self.sync.reproject(self.view.zoom);
        self.draw_camera_border();
    }

    fn draw_camera_border(&mut self) {
        if !self.camera_border {
            return;
        }
        self.surface.clear_layer(Layer::Camera);
        self.surface.add(
            Layer::Camera,
            &Geometry::CameraBorder {
                center: self.view.center,
                radius: self.view.camera_radius(),
            },
        );
        self.surface.request_update_full();
    }
}
