//! Bidirectional waypoint synchronization between a store and the map.

mod controller;
mod drag;
mod proxy;

pub use controller::{ActiveVehicle, InteractionMode, MouseMode, RemoteUpdate, SyncController};
pub use drag::DragSession;
pub use proxy::{VisualProxy, WaypointSlot};
