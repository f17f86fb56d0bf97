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

//! Per-vehicle ordered waypoint storage.
//!
//! The store is the single source of truth for a vehicle's flight plan. It
//! is not thread-safe by contract: every mutation happens on the map view's
//! controller loop. Consumers learn about mutations through
//! [`WaypointStore::subscribe`].

use std::collections::BTreeSet;

use log::debug;
use tokio::sync::broadcast;

use crate::error::MapError;
use crate::geo::Coordinate;
use crate::vehicle::VehicleId;

use super::Waypoint;

/// Change notification emitted by a [`WaypointStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointEvent {
    /// A single waypoint was added or modified.
    Changed { vehicle_id: VehicleId, index: usize },
    /// The list was replaced, truncated or cleared.
    ListReplaced { vehicle_id: VehicleId },
}

impl WaypointEvent {
    #[must_use]
    pub fn vehicle_id(&self) -> VehicleId {
        match self {
            Self::Changed { vehicle_id, .. } | Self::ListReplaced { vehicle_id } => *vehicle_id,
        }
    }
}

/// Ordered waypoint sequence for one vehicle.
pub struct WaypointStore {
    vehicle_id: VehicleId,
    waypoints: Vec<Waypoint>,
    pending_uploads: BTreeSet<usize>,
    event_tx: broadcast::Sender<WaypointEvent>,
}

impl std::fmt::Debug for WaypointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaypointStore")
            .field("vehicle_id", &self.vehicle_id)
            .field("count", &self.waypoints.len())
            .field("pending_uploads", &self.pending_uploads.len())
            .finish()
    }
}

impl WaypointStore {
    /// Create an empty store whose notification channel buffers `capacity` events.
    #[must_use]
    pub fn new(vehicle_id: VehicleId, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            vehicle_id,
            waypoints: Vec::new(),
            pending_uploads: BTreeSet::new(),
            event_tx,
        }
    }

    #[must_use]
    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WaypointEvent> {
        self.event_tx.subscribe()
    }

    /// Append a waypoint, assigning it the next index.
    pub fn add_waypoint(&mut self, mut waypoint: Waypoint) -> usize {
        let index = self.waypoints.len();
        waypoint.index = index;
        self.waypoints.push(waypoint);
        self.emit(WaypointEvent::Changed {
            vehicle_id: self.vehicle_id,
            index,
        });
        index
    }

    pub fn get_at(&self, index: usize) -> Result<&Waypoint, MapError> {
        self.waypoints.get(index).ok_or(MapError::IndexOutOfRange {
            index,
            len: self.waypoints.len(),
        })
    }

    /// Move the waypoint at `index`. Emits nothing; call
    /// [`WaypointStore::notify_of_change`] once the edit is final.
    pub fn set_at(&mut self, index: usize, coordinate: Coordinate) -> Result<(), MapError> {
        let len = self.waypoints.len();
        let waypoint = self
            .waypoints
            .get_mut(index)
            .ok_or(MapError::IndexOutOfRange { index, len })?;
        waypoint.coordinate = coordinate;
        Ok(())
    }

    /// Announce a finished edit and queue the waypoint for upload.
    pub fn notify_of_change(&mut self, index: usize) -> Result<(), MapError> {
        if index >= self.waypoints.len() {
            return Err(MapError::IndexOutOfRange {
                index,
                len: self.waypoints.len(),
            });
        }
        self.pending_uploads.insert(index);
        self.emit(WaypointEvent::Changed {
            vehicle_id: self.vehicle_id,
            index,
        });
        Ok(())
    }

    pub fn remove_last(&mut self) -> Option<Waypoint> {
        let removed = self.waypoints.pop()?;
        self.pending_uploads.remove(&removed.index);
        self.emit(WaypointEvent::ListReplaced {
            vehicle_id: self.vehicle_id,
        });
        Some(removed)
    }

    #[must_use]
    pub fn list(&self) -> &[Waypoint] {
        &self.waypoints
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.waypoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Current index of `waypoint`, or `None` if its index is stale.
    #[must_use]
    pub fn index_of(&self, waypoint: &Waypoint) -> Option<usize> {
        (waypoint.index < self.waypoints.len()).then_some(waypoint.index)
    }

    /// Replace the whole list with one reported by the vehicle.
    ///
    /// Indices are reassigned in order and the upload queue is dropped: the
    /// vehicle's list is authoritative.
    pub fn replace_all(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints
            .into_iter()
            .enumerate()
            .map(|(index, mut wp)| {
                wp.index = index;
                wp
            })
            .collect();
        self.pending_uploads.clear();
        self.emit(WaypointEvent::ListReplaced {
            vehicle_id: self.vehicle_id,
        });
    }

    /// Apply a single waypoint reported by the vehicle.
    ///
    /// Overwrites in range, appends when the index equals the current count,
    /// and rejects anything further out.
    pub fn apply_reported(&mut self, waypoint: Waypoint) -> Result<usize, MapError> {
        let len = self.waypoints.len();
        let index = waypoint.index;
        match index.cmp(&len) {
            std::cmp::Ordering::Less => {
                self.waypoints[index] = waypoint;
                self.emit(WaypointEvent::Changed {
                    vehicle_id: self.vehicle_id,
                    index,
                });
                Ok(index)
            }
            std::cmp::Ordering::Equal => Ok(self.add_waypoint(waypoint)),
            std::cmp::Ordering::Greater => Err(MapError::IndexOutOfRange { index, len }),
        }
    }

    pub fn clear(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }
        self.waypoints.clear();
        self.pending_uploads.clear();
        self.emit(WaypointEvent::ListReplaced {
            vehicle_id: self.vehicle_id,
        });
    }

    /// Drain the indices edited locally since the last upload.
    ///
    /// Uploads are fire-and-forget; nothing is re-queued on failure.
    pub fn take_pending_uploads(&mut self) -> Vec<Waypoint> {
        let indices = std::mem::take(&mut self.pending_uploads);
        indices
            .into_iter()
            .filter_map(|i| self.waypoints.get(i).cloned())
            .collect()
    }

    fn emit(&self, event: WaypointEvent) {
        // No receivers is normal before a map view attaches.
        if self.event_tx.send(event).is_err() {
            debug!("No subscribers for {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn wp(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(0, Coordinate::new(lat, lon), 10.0)
    }

    #[test]
    fn test_add_assigns_sequential_indices() {
        let mut store = WaypointStore::new(1, 16);
        assert_eq!(store.add_waypoint(wp(47.0, 8.5)), 0);
        assert_eq!(store.add_waypoint(wp(47.1, 8.5)), 1);
        assert_eq!(store.count(), 2);
        assert_eq!(store.get_at(1).unwrap().index, 1);
    }

    #[test]
    fn test_set_at_out_of_range() {
        let mut store = WaypointStore::new(1, 16);
        store.add_waypoint(wp(47.0, 8.5));
        let err = store.set_at(3, Coordinate::new(0.0, 0.0)).unwrap_err();
        assert_eq!(err, MapError::IndexOutOfRange { index: 3, len: 1 });
        assert!(err.is_stale());
    }

    #[test]
    fn test_set_at_is_silent_until_notified() {
        let mut store = WaypointStore::new(1, 16);
        store.add_waypoint(wp(47.0, 8.5));
        let mut rx = store.subscribe();

        store.set_at(0, Coordinate::new(47.2, 8.5)).unwrap();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        store.notify_of_change(0).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            WaypointEvent::Changed { vehicle_id: 1, index: 0 }
        );

        let uploads = store.take_pending_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].coordinate, Coordinate::new(47.2, 8.5));
        assert!(store.take_pending_uploads().is_empty());
    }

    #[test]
    fn test_remove_last_emits_list_replaced() {
        let mut store = WaypointStore::new(4, 16);
        store.add_waypoint(wp(47.0, 8.5));
        store.add_waypoint(wp(47.1, 8.5));
        let mut rx = store.subscribe();

        let removed = store.remove_last().unwrap();
        assert_eq!(removed.index, 1);
        assert_eq!(store.count(), 1);
        assert_eq!(rx.try_recv().unwrap(), WaypointEvent::ListReplaced { vehicle_id: 4 });
    }

    #[test]
    fn test_replace_all_reindexes() {
        let mut store = WaypointStore::new(1, 16);
        let mut a = wp(47.0, 8.5);
        a.index = 9;
        let mut b = wp(47.1, 8.5);
        b.index = 3;
        store.replace_all(vec![a, b]);
        assert_eq!(store.list()[0].index, 0);
        assert_eq!(store.list()[1].index, 1);
    }

    #[test]
    fn test_apply_reported() {
        let mut store = WaypointStore::new(1, 16);
        assert_eq!(store.apply_reported(wp(47.0, 8.5)).unwrap(), 0);

        let mut moved = wp(47.3, 8.5);
        moved.index = 0;
        assert_eq!(store.apply_reported(moved).unwrap(), 0);
        assert_eq!(store.get_at(0).unwrap().coordinate.lat, 47.3);

        let mut far = wp(47.4, 8.5);
        far.index = 5;
        assert!(store.apply_reported(far).is_err());
    }

    #[test]
    fn test_index_of_rejects_stale() {
        let mut store = WaypointStore::new(1, 16);
        store.add_waypoint(wp(47.0, 8.5));
        let mut stale = wp(47.0, 8.5);
        stale.index = 4;
        assert_eq!(store.index_of(&stale), None);
        assert_eq!(store.index_of(store.get_at(0).unwrap()), Some(0));
    }
}
