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

//! Waypoint and vehicle track model for a ground control station map view.
//!
//! The crate keeps what a map widget draws consistent with what the vehicles
//! report, while the operator edits the same waypoints by clicking and
//! dragging. It is organized in layers that can be used on their own:
//!
//! - **Mission layer**: [`WaypointStore`], the per-vehicle ordered waypoint
//!   list with change notifications
//! - **Vehicle layer**: [`Fleet`] of discovered vehicles and their stores
//! - **Surface layer**: [`MapSurface`], the drawing seam, wrapped by
//!   [`SurfaceAdapter`] for id allocation and redraw coalescing
//! - **Sync layer**: [`SyncController`], reconciling waypoint proxies on the
//!   map with the active vehicle's store
//! - **Track layer**: [`TrackRegistry`] of vehicle icons and trails
//!
//! [`MapView`] composes all of them behind a single controller loop.
//!
//! # Quick Start
//!
//! ```
//! use mapview_core::{
//!     Coordinate, MapView, MapViewConfig, OperatorInput, RecordingSurface, TelemetryEvent,
//!     Waypoint,
//! };
//!
//! let mut map = MapView::new(RecordingSurface::default(), MapViewConfig::default());
//!
//! // The first vehicle heard from becomes the active one
//! map.handle_telemetry(TelemetryEvent::WaypointList {
//!     vehicle_id: 7,
//!     waypoints: vec![Waypoint::new(0, Coordinate::new(47.0, 8.5), 50.0)],
//! });
//! assert_eq!(map.sync().proxy_count(), 1);
//!
//! // Operator appends a waypoint
//! map.set_create_path(true);
//! map.handle_input(OperatorInput::MapClicked {
//!     coordinate: Coordinate::new(47.1, 8.5),
//! });
//! assert_eq!(map.fleet().store(7).map(|s| s.count()), Some(2));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod follow;
pub mod geo;
pub mod map_view;
pub mod mission;
pub mod surface;
pub mod sync;
pub mod track;
pub mod vehicle;
pub mod view;

pub use config::MapViewConfig;
pub use error::MapError;
pub use events::{OperatorInput, TelemetryEvent};
pub use follow::{FollowLimiter, GroundClock, ManualClock, SystemClock};
pub use geo::{BoundingBox, Coordinate, ScreenPoint, WebMercator};
pub use map_view::MapView;
pub use mission::{Waypoint, WaypointEvent, WaypointStore};
pub use surface::{
    Geometry, GeometryId, GeometryKind, Layer, MapSurface, RecordingSurface, SurfaceAdapter,
    SurfaceCommand,
};
pub use sync::{ActiveVehicle, DragSession, InteractionMode, MouseMode, RemoteUpdate, SyncController};
pub use track::{TrackConfig, TrackRegistry};
pub use vehicle::{Color, Fleet, SystemType, Vehicle, VehicleId};
pub use view::ViewState;
