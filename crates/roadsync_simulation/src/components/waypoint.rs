//! Waypoint маркеры сцены

use bevy::prelude::*;

/// Контейнер waypoints: прямые children с именем "waypoint*" = якоря маршрута
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WaypointContainer;

/// Tag "Waypoint" (fallback, если в контейнере нет подходящих children)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WaypointTag;

/// Помечает entity, найденную discovery (индекс в WaypointSet)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waypoint {
    pub index: usize,
}
