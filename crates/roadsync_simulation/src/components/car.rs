//! Машина: stable server ID + состояние, которое приходит с сервера

use super::route::{CarVelocity, PathFollower};
use bevy::prelude::*;
use std::fmt;

/// ID машины на сервере симуляции (stable между poll'ами)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub i64);

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracked машина (создаётся poller'ом при первом появлении ID)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[require(CarState, PathFollower, CarVelocity)]
pub struct Car {
    pub id: CarId,
}

/// Состояние машины (задаётся сервером, не motion controller'ом)
///
/// WAITING записи poller отфильтровывает до controller'а, поэтому
/// через poll этот вариант сюда не попадает. Controller всё равно
/// держит позицию в Waiting (как в Refueling).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarState {
    #[default]
    Moving,
    Waiting,
    Refueling,
}

impl CarState {
    /// Wire строка → состояние. Неизвестные/отсутствующие значения = MOVING.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some("WAITING") => CarState::Waiting,
            Some("REFUELING") => CarState::Refueling,
            _ => CarState::Moving,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CarState::Moving => "MOVING",
            CarState::Waiting => "WAITING",
            CarState::Refueling => "REFUELING",
        }
    }

    /// Suspend position updates (Waiting + Refueling)
    pub fn holds_position(&self) -> bool {
        matches!(self, CarState::Waiting | CarState::Refueling)
    }
}

/// Шаблон spawn'а машины (аналог prefab)
///
/// Resource обязателен: без него poller не стартует.
#[derive(Resource, Debug, Clone)]
pub struct CarTemplate {
    pub name_prefix: String,
    pub scale: Vec3,
}

impl Default for CarTemplate {
    fn default() -> Self {
        Self {
            name_prefix: "Car_".to_string(),
            scale: Vec3::ONE,
        }
    }
}

impl CarTemplate {
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            ..default()
        }
    }

    pub fn entity_name(&self, id: CarId) -> String {
        format!("{}{}", self.name_prefix, id)
    }
}
