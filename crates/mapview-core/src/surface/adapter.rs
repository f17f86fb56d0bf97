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

use log::debug;

use crate::geo::{BoundingBox, Coordinate};

use super::{Geometry, GeometryId, GeometryKind, Layer, MapSurface};

#[derive(Debug, Clone, Copy)]
struct Placed {
    layer: Layer,
    kind: GeometryKind,
    bbox: Option<BoundingBox>,
}

/// Wraps a [`MapSurface`] with id allocation, kind lookup and redraw batching.
///
/// Geometry commands always reach the surface. Redraw requests are dropped
/// while the view is hidden, and between [`SurfaceAdapter::begin_batch`] and
/// [`SurfaceAdapter::end_batch`] they are merged into a single region.
pub struct SurfaceAdapter<S> {
    surface: S,
    visible: bool,
    next_id: u64,
    placed: HashMap<GeometryId, Placed>,
    batch_depth: u32,
    pending: Option<BoundingBox>,
    pending_full: bool,
}

impl<S> std::fmt::Debug for SurfaceAdapter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceAdapter")
            .field("visible", &self.visible)
            .field("geometries", &self.placed.len())
            .field("batch_depth", &self.batch_depth)
            .finish_non_exhaustive()
    }
}

impl<S: MapSurface> SurfaceAdapter<S> {
    /// Wrap `surface`. The view starts visible.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            visible: true,
            next_id: 1,
            placed: HashMap::new(),
            batch_depth: 0,
            pending: None,
            pending_full: false,
        }
    }

    pub fn add(&mut self, layer: Layer, geometry: &Geometry) -> GeometryId {
        let id = GeometryId(self.next_id);
        self.next_id += 1;
        self.placed.insert(
            id,
            Placed {
                layer,
                kind: geometry.kind(),
                bbox: geometry.bounding_box(),
            },
        );
        self.surface.add_geometry(id, layer, geometry);
        id
    }

    /// Replace a geometry, returning the extent it had before.
    pub fn update(&mut self, id: GeometryId, geometry: &Geometry) -> Option<BoundingBox> {
        let Some(placed) = self.placed.get_mut(&id) else {
            debug!("Ignoring update for unknown geometry {}", id);
            return None;
        };
        let previous = placed.bbox;
        placed.kind = geometry.kind();
        placed.bbox = geometry.bounding_box();
        self.surface.update_geometry(id, geometry);
        previous
    }

    /// Remove a geometry, returning the extent it covered.
    pub fn remove(&mut self, id: GeometryId) -> Option<BoundingBox> {
        let placed = self.placed.remove(&id)?;
        self.surface.remove_geometry(id);
        placed.bbox
    }

    /// Remove every geometry on `layer`, returning their combined extent.
    pub fn clear_layer(&mut self, layer: Layer) -> Option<BoundingBox> {
        let mut extent = None;
        self.placed.retain(|_, placed| {
            if placed.layer == layer {
                extent = BoundingBox::merge(extent, placed.bbox);
                false
            } else {
                true
            }
        });
        self.surface.clear_geometries(layer);
        extent
    }

    #[must_use]
    pub fn kind_of(&self, id: GeometryId) -> Option<GeometryKind> {
        self.placed.get(&id).map(|p| p.kind)
    }

    #[must_use]
    pub fn bounding_box_of(&self, id: GeometryId) -> Option<BoundingBox> {
        self.placed.get(&id).and_then(|p| p.bbox)
    }

    #[must_use]
    pub fn contains(&self, id: GeometryId) -> bool {
        self.placed.contains_key(&id)
    }

    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.placed.len()
    }

    /// Ask for `region` to be repainted.
    pub fn request_update(&mut self, region: BoundingBox) {
        if self.batch_depth > 0 {
            self.pending = BoundingBox::merge(self.pending, Some(region));
        } else if self.visible {
            self.surface.update_request(&region);
        }
    }

    pub fn request_update_full(&mut self) {
        if self.batch_depth > 0 {
            self.pending_full = true;
        } else if self.visible {
            self.surface.update_request_full();
        }
    }

    /// Start collecting redraw requests. Batches nest.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch; the outermost close issues at most one redraw.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let pending = self.pending.take();
        if std::mem::take(&mut self.pending_full) {
            self.request_update_full();
        } else if let Some(region) = pending {
            self.request_update(region);
        }
    }

    pub fn set_view(&mut self, center: Coordinate) {
        self.surface.set_view(center);
    }

    pub fn set_zoom(&mut self, level: u8) {
        self.surface.set_zoom(level);
    }

    /// Showing a hidden view repaints everything skipped while it was hidden.
    pub fn set_visible(&mut self, visible: bool) {
        let shown = visible && !self.visible;
        self.visible = visible;
        if shown {
            self.request_update_full();
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_inner(self) -> S {
        self.surface
    }
}
