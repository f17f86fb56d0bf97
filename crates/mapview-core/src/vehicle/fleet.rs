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

use std::collections::HashMap;

use log::info;

use crate::error::MapError;
use crate::mission::WaypointStore;

use super::{Vehicle, VehicleId};

/// A vehicle together with the waypoint store it owns.
#[derive(Debug)]
pub struct VehicleEntry {
    pub vehicle: Vehicle,
    pub store: WaypointStore,
}

/// Registry of every vehicle seen so far.
///
/// Vehicles are created on the first telemetry message carrying an unseen
/// id and live for the rest of the process. At most one is selected.
pub struct Fleet {
    vehicles: HashMap<VehicleId, VehicleEntry>,
    selected: Option<VehicleId>,
    event_capacity: usize,
}

impl std::fmt::Debug for Fleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fleet")
            .field("vehicle_count", &self.vehicles.len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl Fleet {
    /// `event_capacity` sizes each vehicle's waypoint notification channel.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        Self {
            vehicles: HashMap::new(),
            selected: None,
            event_capacity,
        }
    }

    /// Look up a vehicle, creating it on first sighting.
    ///
    /// Returns the entry and whether it was just created.
    pub fn get_or_insert(&mut self, id: VehicleId) -> (&mut VehicleEntry, bool) {
        let ordinal = self.vehicles.len();
        let capacity = self.event_capacity;
        let mut created = false;
        let entry = self.vehicles.entry(id).or_insert_with(|| {
            info!("Discovered vehicle {}", id);
            created = true;
            VehicleEntry {
                vehicle: Vehicle::new(id, ordinal),
                store: WaypointStore::new(id, capacity),
            }
        });
        (entry, created)
    }

    #[must_use]
    pub fn get(&self, id: VehicleId) -> Option<&VehicleEntry> {
        self.vehicles.get(&id)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut VehicleEntry> {
        self.vehicles.get_mut(&id)
    }

    #[must_use]
    pub fn store(&self, id: VehicleId) -> Option<&WaypointStore> {
        self.vehicles.get(&id).map(|e| &e.store)
    }

    pub fn store_mut(&mut self, id: VehicleId) -> Option<&mut WaypointStore> {
        self.vehicles.get_mut(&id).map(|e| &mut e.store)
    }

    /// Mark `id` as the selected vehicle and clear the flag on all others.
    pub fn select(&mut self, id: VehicleId) -> Result<&Vehicle, MapError> {
        if !self.vehicles.contains_key(&id) {
            return Err(MapError::UnknownVehicle(id));
        }
        for entry in self.vehicles.values_mut() {
            entry.vehicle.is_selected = entry.vehicle.id == id;
        }
        self.selected = Some(id);
        info!("Selected vehicle {}", id);
        self.vehicles
            .get(&id)
            .map(|e| &e.vehicle)
            .ok_or(MapError::UnknownVehicle(id))
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<VehicleId> {
        self.selected
    }

    #[must_use]
    pub fn selected(&self) -> Option<&VehicleEntry> {
        self.selected.and_then(|id| self.vehicles.get(&id))
    }

    /// Vehicle ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<VehicleId> {
        let mut ids: Vec<_> = self.vehicles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_creates_once() {
        let mut fleet = Fleet::new(8);
        let (_, created) = fleet.get_or_insert(7);
        assert!(created);
        let (entry, created) = fleet.get_or_insert(7);
        assert!(!created);
        assert_eq!(entry.vehicle.id, 7);
        assert_eq!(entry.store.vehicle_id(), 7);
        assert_eq!(fleet.len(), 1);
    }

    #[test]
    fn test_distinct_colors_in_discovery_order() {
        let mut fleet = Fleet::new(8);
        fleet.get_or_insert(3);
        fleet.get_or_insert(1);
        let a = fleet.get(3).unwrap().vehicle.color;
        let b = fleet.get(1).unwrap().vehicle.color;
        assert_ne!(a, b);
    }

    #[test]
    fn test_select_is_exclusive() {
        let mut fleet = Fleet::new(8);
        fleet.get_or_insert(1);
        fleet.get_or_insert(2);

        fleet.select(1).unwrap();
        fleet.select(2).unwrap();

        assert_eq!(fleet.selected_id(), Some(2));
        assert!(!fleet.get(1).unwrap().vehicle.is_selected);
        assert!(fleet.get(2).unwrap().vehicle.is_selected);
    }

    #[test]
    fn test_select_unknown() {
        let mut fleet = Fleet::new(8);
        assert_eq!(fleet.select(42).unwrap_err(), MapError::UnknownVehicle(42));
        assert_eq!(fleet.selected_id(), None);
        assert_eq!(fleet.ids(), Vec::<VehicleId>::new());
    }
}
