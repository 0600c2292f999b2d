//! ECS Components для машин и waypoints
//!
//! Организация по доменам:
//! - car: идентичность и состояние машины (Car, CarId, CarState, CarTemplate)
//! - route: маршрут и движение (PathFollower, CarVelocity, WaypointId)
//! - waypoint: якоря сцены (Waypoint, WaypointContainer, WaypointTag)

pub mod car;
pub mod route;
pub mod waypoint;

// Re-exports для удобного импорта
pub use car::*;
pub use route::*;
pub use waypoint::*;
