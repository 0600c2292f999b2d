//! Orbit камера вокруг центра waypoints

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use roadsync_simulation::WaypointSet;

pub struct SceneCameraPlugin;

impl Plugin for SceneCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (focus_on_waypoints, orbit_controls, apply_orbit).chain(),
        );
    }
}

#[derive(Component)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    /// Фокус один раз переносится в центр WaypointSet после discovery
    pub auto_focused: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            distance: 80.0,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: std::f32::consts::FRAC_PI_4,
            sensitivity: 0.005,
            zoom_speed: 4.0,
            auto_focused: false,
        }
    }
}

fn focus_on_waypoints(waypoints: Option<Res<WaypointSet>>, mut cameras: Query<&mut OrbitCamera>) {
    let Some(waypoints) = waypoints else {
        return;
    };
    if waypoints.is_empty() {
        return;
    }

    let sum: Vec3 = waypoints.anchors().iter().map(|a| a.position).sum();
    let center = sum / waypoints.len() as f32;

    for mut camera in cameras.iter_mut().filter(|c| !c.auto_focused) {
        camera.focus = center;
        camera.auto_focused = true;
    }
}

/// ПКМ: вращение, колесо: zoom
fn orbit_controls(
    mut cameras: Query<&mut OrbitCamera>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut mouse_wheel: EventReader<MouseWheel>,
) {
    let Ok(mut camera) = cameras.single_mut() else {
        return;
    };

    let delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_buttons.pressed(MouseButton::Right) && delta != Vec2::ZERO {
        camera.yaw -= delta.x * camera.sensitivity;
        camera.pitch = (camera.pitch + delta.y * camera.sensitivity).clamp(0.1, std::f32::consts::FRAC_PI_2 - 0.05);
    }

    let scroll: f32 = mouse_wheel.read().map(|w| w.y).sum();
    if scroll != 0.0 {
        camera.distance = (camera.distance - scroll * camera.zoom_speed).clamp(5.0, 500.0);
    }
}

fn apply_orbit(mut cameras: Query<(&OrbitCamera, &mut Transform), Changed<OrbitCamera>>) {
    for (camera, mut transform) in cameras.iter_mut() {
        let offset = Quat::from_euler(EulerRot::YXZ, camera.yaw, -camera.pitch, 0.0) * Vec3::Z * camera.distance;
        *transform = Transform::from_translation(camera.focus + offset).looking_at(camera.focus, Vec3::Y);
    }
}
