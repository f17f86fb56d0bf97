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

//! Reconciles the active vehicle's waypoint store with the proxies on the map.
//!
//! Two writers touch waypoint positions: telemetry (remote) and the operator
//! (local drags and clicks). The controller keeps one slot per waypoint,
//! index-aligned with the store, and resolves conflicts by gesture priority:
//! while the operator drags waypoint `i`, remote updates for `i` are dropped.
//! Stale indices are never errors here, they are skipped and the next full
//! list sync repairs whatever they would have changed.

use log::{debug, info, warn};

use crate::error::MapError;
use crate::geo::{BoundingBox, Coordinate, WebMercator};
use crate::mission::{Waypoint, WaypointStore};
use crate::surface::{Geometry, GeometryId, Layer, MapSurface, SurfaceAdapter};
use crate::vehicle::{Color, VehicleId};

use super::{DragSession, VisualProxy, WaypointSlot};

/// Altitude given to waypoints placed by clicking on the map.
const CLICK_WAYPOINT_ALTITUDE: f64 = 0.0;

/// The vehicle whose waypoints are being shown and edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveVehicle {
    pub id: VehicleId,
    pub path_color: Color,
}

/// What the operator's clicks do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Pan,
    /// Clicks on the map append waypoints.
    CreatePath,
}

/// What a mouse drag on the empty map does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Panning,
    /// Map is pinned so geometry clicks and drags can be handled.
    Editing,
}

/// Outcome of a remote waypoint update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteUpdate {
    /// One or more proxies were created to reach the index.
    Created,
    Updated,
    /// The operator is dragging this waypoint; the update was dropped.
    DeferredByDrag,
    /// Inactive vehicle or stale index.
    Ignored,
}

/// Keeps waypoint proxies congruent with the active vehicle's store.
#[derive(Debug)]
pub struct SyncController {
    active: Option<ActiveVehicle>,
    slots: Vec<WaypointSlot>,
    path: Option<GeometryId>,
    drag: Option<DragSession>,
    mode: InteractionMode,
    mouse_mode: MouseMode,
    icon_size: u32,
    zoom: u8,
}

impl SyncController {
    /// Create a controller attached to `active` (or to nothing).
    #[must_use]
    pub fn new(active: Option<ActiveVehicle>, icon_size: u32, zoom: u8) -> Self {
        Self {
            active,
            slots: Vec::new(),
            path: None,
            drag: None,
            mode: InteractionMode::default(),
            mouse_mode: MouseMode::default(),
            icon_size,
            zoom,
        }
    }

    /// Handle a notification that one waypoint of `vehicle_id` changed.
    pub fn on_remote_waypoint_changed<S: MapSurface>(
        &mut self,
        vehicle_id: VehicleId,
        waypoint: &Waypoint,
        store: &WaypointStore,
        suppress_redraw: bool,
        surface: &mut SurfaceAdapter<S>,
    ) -> RemoteUpdate {
        let (outcome, region) = self.apply_remote(vehicle_id, waypoint, store, surface);
        if matches!(outcome, RemoteUpdate::Created | RemoteUpdate::Updated) {
            self.sync_path(surface);
            if !suppress_redraw {
                if let Some(region) = region {
                    surface.request_update(region);
                }
            }
        }
        outcome
    }

    /// Rebuild every proxy from the store after the list was replaced.
    ///
    /// Returns the number of proxies afterwards, which equals the store's
    /// count whenever `vehicle_id` is the active vehicle.
    pub fn on_remote_waypoint_list_changed<S: MapSurface>(
        &mut self,
        vehicle_id: VehicleId,
        store: &WaypointStore,
        surface: &mut SurfaceAdapter<S>,
    ) -> usize {
        if !self.is_active(vehicle_id) {
            debug!("Ignoring waypoint list of inactive vehicle {}", vehicle_id);
            return self.slots.len();
        }

        if store.is_empty() {
            if let Some(region) = self.clear_proxies(surface) {
                surface.request_update(region);
            }
            return 0;
        }

        let before = self.extent();
        surface.begin_batch();

        for waypoint in store.list() {
            self.apply_remote(vehicle_id, waypoint, store, surface);
        }

        let surplus = self.slots.len().saturating_sub(store.count());
        for _ in 0..surplus {
            if let Some(slot) = self.slots.pop() {
                surface.remove(slot.proxy.icon);
            }
        }
        if self.drag.is_some_and(|d| d.index >= self.slots.len()) {
            debug!("Dropping drag session on truncated waypoint");
            self.drag = None;
        }
        self.sync_path(surface);

        if let Some(region) = BoundingBox::merge(before, self.extent()) {
            surface.request_update(region);
        }
        surface.end_batch();

        self.slots.len()
    }

    /// Append a waypoint where the operator clicked, if path creation is armed.
    ///
    /// Returns the new index, or `None` when not in path-creation mode. A
    /// click exactly on an existing waypoint's coordinate is rejected.
    pub fn on_operator_click<S: MapSurface>(
        &mut self,
        coordinate: Coordinate,
        store: Option<&mut WaypointStore>,
        surface: &mut SurfaceAdapter<S>,
    ) -> Result<Option<usize>, MapError> {
        if self.mode != InteractionMode::CreatePath {
            return Ok(None);
        }
        // Exact match only; two coincident waypoints can never be created
        // this way even when the operator wants them.
        if self.slots.iter().any(|slot| slot.waypoint.is_at(&coordinate)) {
            return Err(MapError::DuplicateWaypointCoordinate {
                lat: coordinate.lat,
                lon: coordinate.lon,
            });
        }

        let index = self.slots.len();
        let waypoint = Waypoint::new(index, coordinate, CLICK_WAYPOINT_ALTITUDE);
        let region = self.create_proxy(waypoint.clone(), surface);
        self.sync_path(surface);
        surface.request_update(region);

        if let Some(store) = store {
            if store.count() != index {
                warn!(
                    "Map shows {} waypoints but vehicle {} has {}; next sync will realign",
                    index,
                    store.vehicle_id(),
                    store.count()
                );
            }
            store.add_waypoint(waypoint);
        }

        Ok(Some(index))
    }

    /// Open a drag session on `index`.
    ///
    /// Refused while another waypoint is being dragged or for a stale index.
    pub fn on_operator_drag_start<S: MapSurface>(
        &mut self,
        index: usize,
        coordinate: Coordinate,
        surface: &mut SurfaceAdapter<S>,
    ) -> bool {
        if let Some(session) = self.drag {
            if !session.covers(index) {
                debug!("Drag on {} refused, {} is already being dragged", index, session.index);
                return false;
            }
        } else {
            let Some(slot) = self.slots.get(index) else {
                debug!("Drag start on stale waypoint index {}", index);
                return false;
            };
            self.drag = Some(DragSession::new(index, slot.proxy.coordinate));
            self.mouse_mode = MouseMode::Editing;
        }
        self.drag_to(index, coordinate, surface);
        true
    }

    /// Move the dragged proxy and the local waypoint copy.
    ///
    /// A move without a prior start opens the session implicitly.
    pub fn on_operator_drag_move<S: MapSurface>(
        &mut self,
        index: usize,
        coordinate: Coordinate,
        surface: &mut SurfaceAdapter<S>,
    ) -> bool {
        match self.drag {
            Some(session) if session.covers(index) => {
                self.drag_to(index, coordinate, surface);
                true
            }
            Some(_) => false,
            None => self.on_operator_drag_start(index, coordinate, surface),
        }
    }

    /// Finish the gesture: commit locally, push to the store, close the session.
    ///
    /// Returns [`MapError::DragInProgress`] when another waypoint holds the
    /// drag and [`MapError::IndexOutOfRange`] for a stale index. Returns
    /// [`MapError::NoActiveVehicle`] when no store is attached; the edit is
    /// still kept on the map.
    pub fn on_operator_drag_end<S: MapSurface>(
        &mut self,
        index: usize,
        coordinate: Coordinate,
        store: Option<&mut WaypointStore>,
        surface: &mut SurfaceAdapter<S>,
    ) -> Result<(), MapError> {
        if let Some(session) = self.drag.filter(|d| !d.covers(index)) {
            return Err(MapError::DragInProgress {
                index,
                dragging: session.index,
            });
        }
        if !self.on_operator_drag_move(index, coordinate, surface) {
            return Err(MapError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }

        let pushed = match store {
            Some(store) => store
                .set_at(index, coordinate)
                .and_then(|()| store.notify_of_change(index)),
            None => Err(MapError::NoActiveVehicle),
        };

        self.drag = None;
        // Path creation keeps the map pinned so the next click adds a waypoint
        if self.mode != InteractionMode::CreatePath {
            self.mouse_mode = MouseMode::Panning;
        }
        pushed
    }

    /// Abort the gesture and show the store's current value again.
    ///
    /// Remote updates dropped during the drag are picked up here. Without a
    /// store the waypoint goes back to where the drag started.
    pub fn cancel_drag<S: MapSurface>(
        &mut self,
        store: Option<&WaypointStore>,
        surface: &mut SurfaceAdapter<S>,
    ) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        if session.index < self.slots.len() {
            let restored = store.and_then(|s| s.get_at(session.index).ok()).cloned();
            let coordinate = match restored {
                Some(waypoint) => {
                    let coordinate = waypoint.coordinate;
                    self.slots[session.index].waypoint = waypoint;
                    coordinate
                }
                None => session.original,
            };
            let region = self.move_slot(session.index, coordinate, surface);
            self.sync_path(surface);
            surface.request_update(region);
        }
        if self.mode != InteractionMode::CreatePath {
            self.mouse_mode = MouseMode::Panning;
        }
        true
    }

    /// A geometry was clicked: stop panning so it can be dragged.
    pub fn on_geometry_clicked(&mut self) {
        self.mouse_mode = MouseMode::Editing;
    }

    /// Arm or disarm click-to-add path creation.
    pub fn set_create_path(&mut self, armed: bool) {
        if armed {
            self.mode = InteractionMode::CreatePath;
            self.mouse_mode = MouseMode::Editing;
        } else {
            self.mode = InteractionMode::Pan;
            self.mouse_mode = MouseMode::Panning;
        }
    }

    /// Switch to another vehicle and rebuild all proxies from its store.
    pub fn on_vehicle_selected<S: MapSurface>(
        &mut self,
        active: ActiveVehicle,
        store: &WaypointStore,
        surface: &mut SurfaceAdapter<S>,
    ) -> usize {
        info!("Map now editing waypoints of vehicle {}", active.id);
        surface.begin_batch();
        self.reset(Some(active), surface);
        let count = self.on_remote_waypoint_list_changed(active.id, store, surface);
        surface.end_batch();
        count
    }

    /// Detach from the current vehicle and attach to `active`, dropping all
    /// proxies and any drag in progress.
    pub fn reset<S: MapSurface>(
        &mut self,
        active: Option<ActiveVehicle>,
        surface: &mut SurfaceAdapter<S>,
    ) {
        if let Some(region) = self.clear_proxies(surface) {
            surface.request_update(region);
        }
        self.active = active;
        self.sync_path(surface);
    }

    /// Operator cleared the path: remove every proxy and leave creation mode.
    pub fn clear_waypoints<S: MapSurface>(&mut self, surface: &mut SurfaceAdapter<S>) {
        if let Some(region) = self.clear_proxies(surface) {
            surface.request_update(region);
        }
        if self.mode == InteractionMode::CreatePath {
            self.set_create_path(false);
        }
    }

    /// Recompute screen positions after a zoom change.
    pub fn reproject(&mut self, zoom: u8) {
        self.zoom = zoom;
        for slot in &mut self.slots {
            slot.proxy.screen = WebMercator::project(slot.proxy.coordinate, zoom);
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<ActiveVehicle> {
        self.active
    }

    #[must_use]
    pub fn is_active(&self, vehicle_id: VehicleId) -> bool {
        self.active.is_some_and(|a| a.id == vehicle_id)
    }

    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn slots(&self) -> &[WaypointSlot] {
        &self.slots
    }

    #[must_use]
    pub fn proxy(&self, index: usize) -> Option<&VisualProxy> {
        self.slots.get(index).map(|s| &s.proxy)
    }

    /// Proxy index for a waypoint icon, if `icon` belongs to this controller.
    #[must_use]
    pub fn index_of_icon(&self, icon: GeometryId) -> Option<usize> {
        self.slots.iter().position(|s| s.proxy.icon == icon)
    }

    #[must_use]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn mouse_mode(&self) -> MouseMode {
        self.mouse_mode
    }

    #[must_use]
    pub fn path_id(&self) -> Option<GeometryId> {
        self.path
    }

    /// Extent of all waypoints currently shown.
    #[must_use]
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.slots.iter().map(|s| s.proxy.coordinate))
    }

    fn path_color(&self) -> Color {
        self.active.map_or(Color::UNATTACHED_PATH, |a| a.path_color)
    }

    fn icon_geometry(&self, index: usize, coordinate: Coordinate) -> Geometry {
        Geometry::WaypointIcon {
            index,
            coordinate,
            color: self.path_color(),
            size: self.icon_size,
        }
    }

    fn path_geometry(&self) -> Geometry {
        Geometry::WaypointPath {
            points: self.slots.iter().map(|s| s.proxy.coordinate).collect(),
            color: self.path_color(),
        }
    }

    /// Apply one remote waypoint without touching the path or requesting a
    /// redraw. Returns the outcome and the region that changed.
    fn apply_remote<S: MapSurface>(
        &mut self,
        vehicle_id: VehicleId,
        waypoint: &Waypoint,
        store: &WaypointStore,
        surface: &mut SurfaceAdapter<S>,
    ) -> (RemoteUpdate, Option<BoundingBox>) {
        if !self.is_active(vehicle_id) {
            return (RemoteUpdate::Ignored, None);
        }
        let Some(index) = store.index_of(waypoint) else {
            debug!("Skipping stale waypoint {} of vehicle {}", waypoint.index, vehicle_id);
            return (RemoteUpdate::Ignored, None);
        };
        let current = match store.get_at(index) {
            Ok(wp) => wp.clone(),
            Err(e) => {
                debug!("Skipping waypoint update: {}", e);
                return (RemoteUpdate::Ignored, None);
            }
        };

        if index >= self.slots.len() {
            // Fill every missing slot up to `index` so proxy[i] stays waypoint[i]
            let mut region = None;
            for i in self.slots.len()..=index {
                let Ok(wp) = store.get_at(i) else {
                    break;
                };
                region = BoundingBox::merge(region, Some(self.create_proxy(wp.clone(), surface)));
            }
            return (RemoteUpdate::Created, region);
        }

        if self.drag.is_some_and(|d| d.covers(index)) {
            debug!("Waypoint {} is being dragged, dropping remote update", index);
            return (RemoteUpdate::DeferredByDrag, None);
        }

        let coordinate = current.coordinate;
        self.slots[index].waypoint = current;
        let region = self.move_slot(index, coordinate, surface);
        (RemoteUpdate::Updated, Some(region))
    }

    /// Append a slot for `waypoint`. Returns the region the new icon covers.
    fn create_proxy<S: MapSurface>(
        &mut self,
        mut waypoint: Waypoint,
        surface: &mut SurfaceAdapter<S>,
    ) -> BoundingBox {
        let index = self.slots.len();
        waypoint.index = index;
        let coordinate = waypoint.coordinate;
        let icon = surface.add(Layer::Waypoints, &self.icon_geometry(index, coordinate));
        self.slots.push(WaypointSlot {
            waypoint,
            proxy: VisualProxy {
                index,
                coordinate,
                screen: WebMercator::project(coordinate, self.zoom),
                icon,
                segment: index,
            },
        });
        let mut region = BoundingBox::from_point(coordinate);
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.slots.get(i)) {
            region.extend(prev.proxy.coordinate);
        }
        region
    }

    /// Move slot `index` and its icon. Returns the region covering the old
    /// and new position plus the neighbouring path vertices.
    fn move_slot<S: MapSurface>(
        &mut self,
        index: usize,
        coordinate: Coordinate,
        surface: &mut SurfaceAdapter<S>,
    ) -> BoundingBox {
        let zoom = self.zoom;
        let slot = &mut self.slots[index];
        let old = slot.proxy.coordinate;
        slot.waypoint.coordinate = coordinate;
        slot.proxy.place(coordinate, zoom);

        let icon = slot.proxy.icon;
        surface.update(icon, &self.icon_geometry(index, coordinate));

        let mut region = BoundingBox::from_point(old);
        region.extend(coordinate);
        for neighbour in [index.checked_sub(1), Some(index + 1)].into_iter().flatten() {
            if let Some(slot) = self.slots.get(neighbour) {
                region.extend(slot.proxy.coordinate);
            }
        }
        region
    }

    fn drag_to<S: MapSurface>(
        &mut self,
        index: usize,
        coordinate: Coordinate,
        surface: &mut SurfaceAdapter<S>,
    ) {
        if index >= self.slots.len() {
            self.drag = None;
            return;
        }
        if let Some(session) = self.drag.as_mut() {
            session.current = coordinate;
        }
        let region = self.move_slot(index, coordinate, surface);
        self.sync_path(surface);
        surface.request_update(region);
    }

    /// Push the current slot coordinates to the path polyline.
    fn sync_path<S: MapSurface>(&mut self, surface: &mut SurfaceAdapter<S>) {
        let geometry = self.path_geometry();
        match self.path {
            Some(id) => {
                surface.update(id, &geometry);
            }
            None if !self.slots.is_empty() => {
                self.path = Some(surface.add(Layer::Waypoints, &geometry));
            }
            None => {}
        }
    }

    /// Remove every proxy. Returns the region they covered.
    fn clear_proxies<S: MapSurface>(&mut self, surface: &mut SurfaceAdapter<S>) -> Option<BoundingBox> {
        let extent = self.extent();
        for slot in self.slots.drain(..) {
            surface.remove(slot.proxy.icon);
        }
        self.drag = None;
        self.sync_path(surface);
        extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceCommand};

    const VEHICLE: VehicleId = 7;

    fn active() -> ActiveVehicle {
        ActiveVehicle {
            id: VEHICLE,
            path_color: Color::rgb(55, 154, 195),
        }
    }

    fn setup() -> (SyncController, WaypointStore, SurfaceAdapter<RecordingSurface>) {
        (
            SyncController::new(Some(active()), 20, 16),
            WaypointStore::new(VEHICLE, 64),
            SurfaceAdapter::new(RecordingSurface::default()),
        )
    }

    fn fill(store: &mut WaypointStore, n: usize) {
        store.replace_all(
            (0..n)
                .map(|i| Waypoint::new(i, Coordinate::new(47.0 + i as f64 * 0.01, 8.5), 50.0))
                .collect(),
        );
    }

    #[test]
    fn test_list_changed_aligns_counts() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 4);
        assert_eq!(sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface), 4);
        assert_eq!(sync.proxy_count(), store.count());
        for (i, slot) in sync.slots().iter().enumerate() {
            assert_eq!(slot.proxy.index, i);
            assert_eq!(slot.waypoint.index, i);
            assert_eq!(slot.proxy.coordinate, store.list()[i].coordinate);
        }
    }

    #[test]
    fn test_list_changed_truncates_tail() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 5);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        let removed: Vec<_> = (2..5).map(|i| sync.proxy(i).unwrap().icon).collect();
        surface.surface_mut().take_commands();

        fill(&mut store, 2);
        assert_eq!(sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface), 2);
        assert_eq!(sync.proxy_count(), 2);

        let commands = surface.surface().commands();
        for id in removed {
            assert!(commands.contains(&SurfaceCommand::Remove(id)));
        }
        assert_eq!(surface.surface().update_requests().len(), 1);
    }

    #[test]
    fn test_list_changed_to_empty_clears() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 3);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        store.clear();
        assert_eq!(sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface), 0);
        assert!(surface.surface().on_layer(Layer::Waypoints).iter().all(|g| matches!(
            g,
            Geometry::WaypointPath { points, .. } if points.is_empty()
        )));
    }

    #[test]
    fn test_inactive_vehicle_ignored() {
        let (mut sync, _, mut surface) = setup();
        let mut other = WaypointStore::new(3, 8);
        fill(&mut other, 2);
        assert_eq!(sync.on_remote_waypoint_list_changed(3, &other, &mut surface), 0);
        let wp = other.get_at(0).unwrap().clone();
        assert_eq!(
            sync.on_remote_waypoint_changed(3, &wp, &other, false, &mut surface),
            RemoteUpdate::Ignored
        );
    }

    #[test]
    fn test_remote_change_fills_gaps() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 3);
        let last = store.get_at(2).unwrap().clone();
        assert_eq!(
            sync.on_remote_waypoint_changed(VEHICLE, &last, &store, false, &mut surface),
            RemoteUpdate::Created
        );
        assert_eq!(sync.proxy_count(), 3);
    }

    #[test]
    fn test_stale_index_is_noop() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        let stale = Waypoint::new(6, Coordinate::new(1.0, 1.0), 0.0);
        assert_eq!(
            sync.on_remote_waypoint_changed(VEHICLE, &stale, &store, false, &mut surface),
            RemoteUpdate::Ignored
        );
        assert_eq!(sync.proxy_count(), 0);
    }

    #[test]
    fn test_drag_excludes_remote_update() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 2);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        let dragged = Coordinate::new(46.5, 8.0);
        assert!(sync.on_operator_drag_start(0, dragged, &mut surface));

        store.set_at(0, Coordinate::new(48.0, 9.0)).unwrap();
        let wp = store.get_at(0).unwrap().clone();
        assert_eq!(
            sync.on_remote_waypoint_changed(VEHICLE, &wp, &store, false, &mut surface),
            RemoteUpdate::DeferredByDrag
        );
        assert_eq!(sync.proxy(0).unwrap().coordinate, dragged);

        // Other indices still follow telemetry
        store.set_at(1, Coordinate::new(48.5, 9.0)).unwrap();
        let other = store.get_at(1).unwrap().clone();
        assert_eq!(
            sync.on_remote_waypoint_changed(VEHICLE, &other, &store, false, &mut surface),
            RemoteUpdate::Updated
        );
        assert_eq!(sync.proxy(1).unwrap().coordinate, Coordinate::new(48.5, 9.0));

        sync.on_operator_drag_end(0, dragged, Some(&mut store), &mut surface).unwrap();
        assert!(sync.drag_session().is_none());
        assert_eq!(store.get_at(0).unwrap().coordinate, dragged);
    }

    #[test]
    fn test_single_drag_in_flight() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 2);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        assert!(sync.on_operator_drag_start(0, Coordinate::new(46.0, 8.0), &mut surface));
        assert!(!sync.on_operator_drag_start(1, Coordinate::new(46.0, 8.1), &mut surface));
        assert!(!sync.on_operator_drag_move(1, Coordinate::new(46.0, 8.1), &mut surface));
        assert_eq!(sync.drag_session().unwrap().index, 0);
    }

    #[test]
    fn test_drag_end_without_vehicle_keeps_local_edit() {
        let mut sync = SyncController::new(None, 20, 16);
        let mut surface = SurfaceAdapter::new(RecordingSurface::default());
        sync.set_create_path(true);
        sync.on_operator_click(Coordinate::new(47.0, 8.5), None, &mut surface).unwrap();

        let target = Coordinate::new(47.2, 8.4);
        let result = sync.on_operator_drag_end(0, target, None, &mut surface);
        assert_eq!(result, Err(MapError::NoActiveVehicle));
        assert_eq!(sync.slots()[0].waypoint.coordinate, target);
    }

    #[test]
    fn test_drag_end_keeps_pinned_in_create_mode() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        sync.set_create_path(true);
        sync.on_operator_drag_start(0, Coordinate::new(47.5, 8.5), &mut surface);
        sync.on_operator_drag_end(0, Coordinate::new(47.5, 8.5), Some(&mut store), &mut surface).unwrap();
        assert_eq!(sync.mouse_mode(), MouseMode::Editing);
        assert_eq!(sync.mode(), InteractionMode::CreatePath);

        sync.set_create_path(false);
        sync.on_geometry_clicked();
        sync.on_operator_drag_start(0, Coordinate::new(47.6, 8.5), &mut surface);
        sync.on_operator_drag_end(0, Coordinate::new(47.6, 8.5), Some(&mut store), &mut surface).unwrap();
        assert_eq!(sync.mouse_mode(), MouseMode::Panning);
    }

    #[test]
    fn test_cancel_drag_restores_original() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        let original = sync.proxy(0).unwrap().coordinate;

        sync.on_operator_drag_move(0, Coordinate::new(40.0, 7.0), &mut surface);
        assert!(sync.drag_session().unwrap().has_moved());
        assert!(sync.cancel_drag(Some(&store), &mut surface));

        assert_eq!(sync.proxy(0).unwrap().coordinate, original);
        assert_eq!(sync.slots()[0].waypoint.coordinate, original);
        assert_eq!(store.get_at(0).unwrap().coordinate, original);
        assert!(!sync.cancel_drag(Some(&store), &mut surface));
    }

    #[test]
    fn test_cancel_drag_takes_update_received_during_drag() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        sync.on_operator_drag_move(0, Coordinate::new(45.0, 7.0), &mut surface);
        store.set_at(0, Coordinate::new(48.0, 9.0)).unwrap();
        let wp = store.get_at(0).unwrap().clone();
        assert_eq!(
            sync.on_remote_waypoint_changed(VEHICLE, &wp, &store, false, &mut surface),
            RemoteUpdate::DeferredByDrag
        );

        assert!(sync.cancel_drag(Some(&store), &mut surface));
        let latest = store.get_at(0).unwrap().coordinate;
        assert_eq!(latest, Coordinate::new(48.0, 9.0));
        assert_eq!(sync.proxy(0).unwrap().coordinate, latest);
        assert_eq!(sync.slots()[0].waypoint.coordinate, latest);
    }

    #[test]
    fn test_cancel_drag_without_store_uses_drag_origin() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        let original = sync.proxy(0).unwrap().coordinate;

        sync.on_operator_drag_move(0, Coordinate::new(45.0, 7.0), &mut surface);
        assert!(sync.cancel_drag(None, &mut surface));
        assert_eq!(sync.proxy(0).unwrap().coordinate, original);
    }

    #[test]
    fn test_drag_end_on_other_index_is_refused() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 2);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        let untouched = store.get_at(1).unwrap().coordinate;
        sync.on_operator_drag_start(0, Coordinate::new(46.0, 8.0), &mut surface);
        let result = sync.on_operator_drag_end(1, Coordinate::new(46.0, 8.1), Some(&mut store), &mut surface);
        assert_eq!(result, Err(MapError::DragInProgress { index: 1, dragging: 0 }));
        assert_eq!(sync.drag_session().unwrap().index, 0);
        assert_eq!(store.get_at(1).unwrap().coordinate, untouched);
        assert_eq!(sync.proxy(1).unwrap().coordinate, untouched);
    }

    #[test]
    fn test_drag_end_on_stale_index() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        let result = sync.on_operator_drag_end(4, Coordinate::new(46.0, 8.0), Some(&mut store), &mut surface);
        assert_eq!(result, Err(MapError::IndexOutOfRange { index: 4, len: 1 }));
    }

    #[test]
    fn test_truncation_drops_drag_on_removed_waypoint() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 5);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        assert!(sync.on_operator_drag_start(3, Coordinate::new(46.0, 8.0), &mut surface));
        fill(&mut store, 2);
        assert_eq!(sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface), 2);
        assert!(sync.drag_session().is_none());
    }

    #[test]
    fn test_truncation_keeps_drag_below_new_length() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 5);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        let dragged = Coordinate::new(46.0, 8.0);
        assert!(sync.on_operator_drag_start(1, dragged, &mut surface));
        fill(&mut store, 2);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        assert_eq!(sync.drag_session().unwrap().index, 1);
        assert_eq!(sync.proxy(1).unwrap().coordinate, dragged);
    }

    #[test]
    fn test_click_requires_create_mode_and_dedups() {
        let (mut sync, mut store, mut surface) = setup();
        let c = Coordinate::new(47.0, 8.5);

        assert_eq!(sync.on_operator_click(c, Some(&mut store), &mut surface), Ok(None));

        sync.set_create_path(true);
        assert_eq!(sync.on_operator_click(c, Some(&mut store), &mut surface), Ok(Some(0)));
        assert!(matches!(
            sync.on_operator_click(c, Some(&mut store), &mut surface),
            Err(MapError::DuplicateWaypointCoordinate { .. })
        ));
        assert_eq!(store.count(), 1);
        assert_eq!(sync.proxy_count(), 1);
    }

    #[test]
    fn test_vehicle_switch_rebuilds() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 3);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);

        let mut other = WaypointStore::new(9, 8);
        fill(&mut other, 1);
        let next = ActiveVehicle {
            id: 9,
            path_color: Color::rgb(1, 2, 3),
        };
        assert_eq!(sync.on_vehicle_selected(next, &other, &mut surface), 1);
        assert!(sync.is_active(9));
        assert_eq!(surface.surface().on_layer(Layer::Waypoints).len(), 2); // icon + path

        // Old vehicle's notifications no longer apply
        assert_eq!(sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface), 1);
    }

    #[test]
    fn test_clear_waypoints_disarms_create_mode() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 2);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        sync.set_create_path(true);

        sync.clear_waypoints(&mut surface);
        assert_eq!(sync.proxy_count(), 0);
        assert_eq!(sync.mode(), InteractionMode::Pan);
        assert_eq!(sync.mouse_mode(), MouseMode::Panning);
    }

    #[test]
    fn test_reproject_updates_screen() {
        let (mut sync, mut store, mut surface) = setup();
        fill(&mut store, 1);
        sync.on_remote_waypoint_list_changed(VEHICLE, &store, &mut surface);
        let at16 = sync.proxy(0).unwrap().screen;
        sync.reproject(17);
        let at17 = sync.proxy(0).unwrap().screen;
        assert!((at17.x - at16.x * 2.0).abs() < 1e-6);
    }
}
