//! Flight plan data: waypoints and the per-vehicle store that owns them.

mod store;
mod waypoint;

pub use store::{WaypointEvent, WaypointStore};
pub use waypoint::Waypoint;
