//! Waypoint scene (RON) → Bevy hierarchy
//!
//! Формат `waypoints.ron`:
//! ```ron
//! (
//!   container: Some((name: "Waypoints", translation: (0.0, 0.0, 0.0), children: [
//!       (name: "Waypoint_0", translation: (0.0, 0.0, 0.0)),
//!       (name: "Waypoint_1", translation: (20.0, 0.0, 0.0)),
//!   ])),
//!   tagged: [ (name: "Pump", translation: (3.0, 0.0, 4.0)) ],
//! )
//! ```
//!
//! Children с именем не "waypoint*" тоже spawn'ятся: фильтрует discovery.

use crate::components::{WaypointContainer, WaypointTag};
use crate::error::SceneError;
use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaypointScene {
    #[serde(default)]
    pub container: Option<SceneContainer>,
    /// Entities с tag "Waypoint" вне контейнера (fallback discovery)
    #[serde(default)]
    pub tagged: Vec<SceneAnchor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneContainer {
    pub name: String,
    #[serde(default)]
    pub translation: (f32, f32, f32),
    /// Поворот контейнера вокруг Y (градусы), children наследуют
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub children: Vec<SceneAnchor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneAnchor {
    pub name: String,
    #[serde(default)]
    pub translation: (f32, f32, f32),
}

impl SceneAnchor {
    fn transform(&self) -> Transform {
        let (x, y, z) = self.translation;
        Transform::from_xyz(x, y, z)
    }
}

impl SceneContainer {
    fn transform(&self) -> Transform {
        let (x, y, z) = self.translation;
        Transform::from_xyz(x, y, z).with_rotation(Quat::from_rotation_y(self.yaw_degrees.to_radians()))
    }
}

impl WaypointScene {
    pub fn from_ron_str(input: &str) -> Result<Self, SceneError> {
        ron::from_str(input).map_err(|e| SceneError::Parse {
            path: "<inline>".into(),
            detail: e.to_string(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|e| SceneError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Сколько anchor entities будет создано (контейнер не считается)
    pub fn anchor_count(&self) -> usize {
        self.container.as_ref().map_or(0, |c| c.children.len()) + self.tagged.len()
    }
}

/// Spawn сцены через Commands. Возвращает entity контейнера (если он есть).
pub fn spawn_waypoint_scene(commands: &mut Commands, scene: &WaypointScene) -> Option<Entity> {
    let container = scene.container.as_ref().map(|container| {
        commands
            .spawn((
                WaypointContainer,
                Name::new(container.name.clone()),
                container.transform(),
            ))
            .with_children(|parent| {
                // Порядок children = порядок в файле
                for anchor in &container.children {
                    parent.spawn((Name::new(anchor.name.clone()), anchor.transform()));
                }
            })
            .id()
    });

    for anchor in &scene.tagged {
        commands.spawn((WaypointTag, Name::new(anchor.name.clone()), anchor.transform()));
    }

    container
}

/// То же для `World` (headless binary, тесты): commands применяются сразу
pub fn spawn_waypoint_scene_in_world(world: &mut World, scene: &WaypointScene) -> Option<Entity> {
    let container = {
        let mut commands = world.commands();
        spawn_waypoint_scene(&mut commands, scene)
    };
    world.flush();
    container
}
