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

use std::collections::BTreeMap;

use crate::geo::{BoundingBox, Coordinate};

use super::{Geometry, GeometryId, Layer, MapSurface};

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Add(GeometryId, Layer),
    Update(GeometryId),
    Remove(GeometryId),
    Clear(Layer),
    UpdateRegion(BoundingBox),
    UpdateFull,
    SetView(Coordinate),
    SetZoom(u8),
}

/// In-memory surface that keeps the current scene and a log of every call.
///
/// Useful for headless runs and for asserting on redraw behavior.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    geometries: BTreeMap<GeometryId, (Layer, Geometry)>,
    commands: Vec<SurfaceCommand>,
}

impl RecordingSurface {
    #[must_use]
    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    /// Drain the command log, keeping the scene.
    pub fn take_commands(&mut self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Regions passed to `update_request`, in order.
    #[must_use]
    pub fn update_requests(&self) -> Vec<BoundingBox> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                SurfaceCommand::UpdateRegion(region) => Some(*region),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(&id).map(|(_, g)| g)
    }

    /// Geometries currently on `layer`, in id order.
    #[must_use]
    pub fn on_layer(&self, layer: Layer) -> Vec<&Geometry> {
        self.geometries
            .values()
            .filter(|(l, _)| *l == layer)
            .map(|(_, g)| g)
            .collect()
    }

    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Last center passed to `set_view`.
    #[must_use]
    pub fn last_view(&self) -> Option<Coordinate> {
        self.commands.iter().rev().find_map(|c| match c {
            SurfaceCommand::SetView(center) => Some(*center),
            _ => None,
        })
    }
}

impl MapSurface for RecordingSurface {
    fn add_geometry(&mut self, id: GeometryId, layer: Layer, geometry: &Geometry) {
        self.geometries.insert(id, (layer, geometry.clone()));
        self.commands.push(SurfaceCommand::Add(id, layer));
    }

    fn update_geometry(&mut self, id: GeometryId, geometry: &Geometry) {
        if let Some((_, existing)) = self.geometries.get_mut(&id) {
            *existing = geometry.clone();
        }
        self.commands.push(SurfaceCommand::Update(id));
    }

    fn remove_geometry(&mut self, id: GeometryId) {
        self.geometries.remove(&id);
        self.commands.push(SurfaceCommand::Remove(id));
    }

    fn clear_geometries(&mut self, layer: Layer) {
        self.geometries.retain(|_, (l, _)| *l != layer);
        self.commands.push(SurfaceCommand::Clear(layer));
    }

    fn update_request(&mut self, region: &BoundingBox) {
        self.commands.push(SurfaceCommand::UpdateRegion(*region));
    }

    fn update_request_full(&mut self) {
        self.commands.push(SurfaceCommand::UpdateFull);
    }

    fn set_view(&mut self, center: Coordinate) {
        self.commands.push(SurfaceCommand::SetView(center));
    }

    fn set_zoom(&mut self, level: u8) {
        self.commands.push(SurfaceCommand::SetZoom(level));
    }
}
