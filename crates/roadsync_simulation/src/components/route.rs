//! Route компоненты: маршрут по waypoints, cursor, velocity

use bevy::prelude::*;

/// Ссылка на waypoint (индекс в WaypointSet, 0-based)
///
/// WaypointSet неизменяем после discovery, поэтому индекс stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointId(pub usize);

/// Маршрут машины + cursor
///
/// Инвариант: после первого непустого assign() маршрут больше не
/// пересчитывается poller'ом, даже если сервер пришлёт другие route_indices.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct PathFollower {
    route: Vec<WaypointId>,
    cursor: usize,
    has_teleported: bool,
    has_route: bool,
    /// Свежий маршрут: ещё не было ни одного шага движения после assign()
    fresh: bool,
}

impl PathFollower {
    #[cfg(test)]
    pub(crate) fn with_route(route: Vec<WaypointId>) -> Self {
        let mut follower = Self::default();
        follower.assign(route);
        follower
    }

    /// Заменить маршрут целиком: cursor → 0, teleport флаг сброшен
    ///
    /// Пустой маршрут не считается назначенным (has_route остаётся false).
    pub fn assign(&mut self, route: Vec<WaypointId>) {
        self.has_route = !route.is_empty();
        self.fresh = self.has_route;
        self.route = route;
        self.cursor = 0;
        self.has_teleported = false;
    }

    pub fn has_route(&self) -> bool {
        self.has_route
    }

    pub fn route(&self) -> &[WaypointId] {
        &self.route
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_teleported(&self) -> bool {
        self.has_teleported
    }

    /// Телепорт возможен только к первому waypoint свежего маршрута, один раз
    pub fn can_teleport(&self) -> bool {
        self.fresh && self.cursor == 0 && !self.has_teleported
    }

    /// Текущая цель (None если маршрут пуст или cursor за концом)
    pub fn current_target(&self) -> Option<WaypointId> {
        self.route.get(self.cursor).copied()
    }

    pub(crate) fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Первый шаг движения по маршруту: окно телепорта закрыто
    pub(crate) fn mark_started(&mut self) {
        self.fresh = false;
    }

    /// Маршрут пройден → начинаем заново с 0. Круг не делает маршрут свежим,
    /// поэтому возврат к первому waypoint телепорт не вызывает.
    pub(crate) fn restart_if_finished(&mut self) -> bool {
        if self.cursor >= self.route.len() {
            self.cursor = 0;
            return true;
        }
        false
    }

    pub(crate) fn mark_teleported(&mut self) {
        self.has_teleported = true;
        self.fresh = false;
    }
}

/// Линейная скорость машины (units/sec), интегрируется в Transform
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct CarVelocity(pub Vec3);
