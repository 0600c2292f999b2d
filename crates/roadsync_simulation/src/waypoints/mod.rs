//! Waypoint Source: упорядоченный набор якорей маршрутов
//!
//! Discovery (один раз, PostStartup):
//! 1. Прямые children `WaypointContainer`, имя начинается с "waypoint"
//!    (case-insensitive), порядок children сохраняется
//! 2. Если пусто: все entity с `WaypointTag` (порядок spawn'а)
//!
//! Нет контейнера → WaypointSet не создаётся, poller не стартует.
//! Контейнер есть, якорей нет → пустой WaypointSet + error в лог.

use crate::components::{Waypoint, WaypointContainer, WaypointId, WaypointTag};
use crate::logger;
use bevy::prelude::*;

/// Якорь маршрута (позиция в world space, кешируется при discovery)
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub entity: Entity,
    pub name: String,
    pub position: Vec3,
}

/// Resource: упорядоченные waypoints (неизменяемы после discovery)
#[derive(Resource, Debug, Clone, Default)]
pub struct WaypointSet {
    anchors: Vec<Anchor>,
}

impl WaypointSet {
    pub fn from_anchors(anchors: Vec<Anchor>) -> Self {
        Self { anchors }
    }

    /// Удобно для тестов: анкеры без реальных entity
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let anchors = positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| Anchor {
                entity: Entity::PLACEHOLDER,
                name: format!("Waypoint_{i}"),
                position,
            })
            .collect();
        Self { anchors }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn get(&self, id: WaypointId) -> Option<&Anchor> {
        self.anchors.get(id.0)
    }

    pub fn position(&self, id: WaypointId) -> Option<Vec3> {
        self.get(id).map(|anchor| anchor.position)
    }

    /// Wire индекс (может быть отрицательным/за пределами) → WaypointId
    pub fn resolve(&self, index: i64) -> Option<WaypointId> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.anchors.len())
            .map(WaypointId)
    }
}

/// Имя якоря маршрута: "waypoint..." без учёта регистра
pub fn is_waypoint_name(name: &str) -> bool {
    name.to_lowercase().starts_with("waypoint")
}

/// World transform через цепочку ChildOf (без TransformPlugin/GlobalTransform)
pub fn world_transform(
    entity: Entity,
    transforms: &Query<(&Transform, Option<&ChildOf>)>,
) -> Option<Transform> {
    let (local, mut parent) = transforms.get(entity).ok()?;
    let mut result = *local;

    while let Some(child_of) = parent {
        let Ok((parent_transform, grandparent)) = transforms.get(child_of.parent()) else {
            break;
        };
        result = parent_transform.mul_transform(result);
        parent = grandparent;
    }

    Some(result)
}

/// System: собрать waypoints из сцены (PostStartup)
pub fn discover_waypoints(
    mut commands: Commands,
    containers: Query<(Entity, Option<&Children>), With<WaypointContainer>>,
    tagged: Query<Entity, With<WaypointTag>>,
    names: Query<&Name>,
    transforms: Query<(&Transform, Option<&ChildOf>)>,
) {
    let mut container_list: Vec<_> = containers.iter().collect();
    container_list.sort_by_key(|(entity, _)| *entity);

    let Some(&(container, children)) = container_list.first() else {
        logger::log_error("🚨 WaypointSource not found: no entity with WaypointContainer in the scene");
        return;
    };

    if container_list.len() > 1 {
        logger::log_warning(&format!(
            "⚠️ {} WaypointContainer entities found, using {:?}",
            container_list.len(),
            container
        ));
    }

    let name_of = |entity: Entity| -> String {
        names
            .get(entity)
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|_| format!("{entity:?}"))
    };

    let mut anchors = Vec::new();

    // 1. Прямые children контейнера
    if let Some(children) = children {
        let ordered: &[Entity] = children;
        for &child in ordered {
            let name = name_of(child);
            if !is_waypoint_name(&name) {
                logger::log(&format!("Object {} is not a waypoint (name does not start with 'Waypoint')", name));
                continue;
            }
            push_anchor(&mut anchors, child, name, &transforms);
        }
    }

    // 2. Fallback: tag registry
    if anchors.is_empty() {
        logger::log("No waypoint children under container, searching tagged entities...");

        let mut tagged_list: Vec<Entity> = tagged.iter().collect();
        tagged_list.sort();

        for entity in tagged_list {
            push_anchor(&mut anchors, entity, name_of(entity), &transforms);
        }
    }

    for (index, anchor) in anchors.iter().enumerate() {
        commands.entity(anchor.entity).insert(Waypoint { index });
    }

    if let Some(first) = anchors.first() {
        logger::log_info(&format!(
            "✅ Waypoints discovered: {} (first '{}' at {})",
            anchors.len(),
            first.name,
            first.position
        ));
    } else {
        logger::log_error("🚨 No waypoints detected: check container children names and 'Waypoint' tags");
    }

    commands.insert_resource(WaypointSet::from_anchors(anchors));
}

fn push_anchor(
    anchors: &mut Vec<Anchor>,
    entity: Entity,
    name: String,
    transforms: &Query<(&Transform, Option<&ChildOf>)>,
) {
    let Some(world) = world_transform(entity, transforms) else {
        logger::log_warning(&format!("⚠️ Waypoint {} has no Transform, skipped", name));
        return;
    };

    logger::log(&format!(
        "Waypoint {} found at {} (index: {})",
        name,
        world.translation,
        anchors.len()
    ));

    anchors.push(Anchor {
        entity,
        name,
        position: world.translation,
    });
}

#[cfg(test)]
mod waypoints_tests;
