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

use log::{debug, trace};
use mapview_core::{BoundingBox, Coordinate, Geometry, GeometryId, Layer, MapSurface};

/// Headless surface that logs every call and keeps simple counters.
#[derive(Debug, Default)]
pub struct LogSurface {
    layers: HashMap<GeometryId, Layer>,
    region_redraws: u64,
    full_redraws: u64,
    recenters: u64,
}

impl LogSurface {
    #[must_use]
    pub fn count_on(&self, layer: Layer) -> usize {
        self.layers.values().filter(|l| **l == layer).count()
    }

    #[must_use]
    pub fn region_redraws(&self) -> u64 {
        self.region_redraws
    }

    #[must_use]
    pub fn full_redraws(&self) -> u64 {
        self.full_redraws
    }

    #[must_use]
    pub fn recenters(&self) -> u64 {
        self.recenters
    }
}

impl MapSurface for LogSurface {
    fn add_geometry(&mut self, id: GeometryId, layer: Layer, geometry: &Geometry) {
        debug!("add {} on {:?}: {:?}", id, layer, geometry.kind());
        self.layers.insert(id, layer);
    }

    fn update_geometry(&mut self, id: GeometryId, geometry: &Geometry) {
        trace!("update {}: {:?}", id, geometry.kind());
    }

    fn remove_geometry(&mut self, id: GeometryId) {
        debug!("remove {}", id);
        self.layers.remove(&id);
    }

    fn clear_geometries(&mut self, layer: Layer) {
        debug!("clear {:?}", layer);
        self.layers.retain(|_, l| *l != layer);
    }

    fn update_request(&mut self, region: &BoundingBox) {
        trace!("redraw {:?}", region);
        self.region_redraws += 1;
    }

    fn update_request_full(&mut self) {
        trace!("redraw all");
        self.full_redraws += 1;
    }

    fn set_view(&mut self, center: Coordinate) {
        debug!("view centered on {}", center);
        self.recenters += 1;
    }

    fn set_zoom(&mut self, level: u8) {
        debug!("zoom {}", level);
    }
}
