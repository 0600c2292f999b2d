//! Route construction: wire индексы → WaypointId

use crate::components::{CarId, WaypointId};
use crate::logger;
use crate::waypoints::WaypointSet;

/// Построить маршрут из route_indices сервера
///
/// - индекс вне диапазона (или отрицательный) → пропуск с warning
/// - waypoint уже есть в маршруте (в любой позиции) → пропуск
///
/// `[2, 5, 2, 7]` на 10 waypoints даёт `[2, 5, 7]`.
pub fn build_route(waypoints: &WaypointSet, car: CarId, indices: &[i64]) -> Vec<WaypointId> {
    let mut route: Vec<WaypointId> = Vec::with_capacity(indices.len());

    if indices.is_empty() {
        logger::log_warning(&format!("⚠️ Car {} has an empty route from the server", car));
        return route;
    }

    logger::log(&format!("🔍 Route received for car {}: {:?}", car, indices));

    for &index in indices {
        let Some(id) = waypoints.resolve(index) else {
            logger::log_warning(&format!(
                "⚠️ Waypoint index {} out of range for car {} (total waypoints: {})",
                index,
                car,
                waypoints.len()
            ));
            continue;
        };

        if route.contains(&id) {
            logger::log_warning(&format!(
                "⚠️ Waypoint index {} repeats in route of car {}, skipped",
                index, car
            ));
            continue;
        }

        route.push(id);
    }

    route
}
