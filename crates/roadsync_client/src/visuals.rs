//! Меши для машин и waypoints, созданных core
//!
//! Визуал вешается прямо на sim entity: despawn машины убирает и меш.

use bevy::prelude::*;
use roadsync_simulation::{Car, CarState, Waypoint, WaypointContainer};

pub struct TrafficVisualsPlugin;

impl Plugin for TrafficVisualsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_palette).add_systems(
            Update,
            (
                make_containers_visible,
                attach_waypoint_markers,
                attach_car_meshes,
                tint_cars_by_state,
            )
                .chain(),
        );
    }
}

/// Общие mesh/material handles (одни на все машины)
#[derive(Resource)]
struct TrafficPalette {
    car_mesh: Handle<Mesh>,
    waypoint_mesh: Handle<Mesh>,
    waypoint_material: Handle<StandardMaterial>,
    moving: Handle<StandardMaterial>,
    waiting: Handle<StandardMaterial>,
    refueling: Handle<StandardMaterial>,
}

impl TrafficPalette {
    fn material_for(&self, state: CarState) -> Handle<StandardMaterial> {
        match state {
            CarState::Moving => self.moving.clone(),
            CarState::Waiting => self.waiting.clone(),
            CarState::Refueling => self.refueling.clone(),
        }
    }
}

fn setup_palette(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut solid = |color: Color| {
        materials.add(StandardMaterial {
            base_color: color,
            ..default()
        })
    };

    let palette = TrafficPalette {
        // Длинная сторона по -Z (forward)
        car_mesh: meshes.add(Cuboid::new(1.8, 1.2, 4.0)),
        waypoint_mesh: meshes.add(Sphere::new(0.4)),
        waypoint_material: solid(Color::srgb(0.9, 0.9, 0.2)),
        moving: solid(Color::srgb(0.2, 0.6, 0.9)),
        waiting: solid(Color::srgb(0.5, 0.5, 0.5)),
        refueling: solid(Color::srgb(0.95, 0.45, 0.1)),
    };

    commands.insert_resource(palette);
}

/// Контейнер из сцены без Visibility → children не рендерятся корректно
fn make_containers_visible(
    mut commands: Commands,
    containers: Query<Entity, (Added<WaypointContainer>, Without<Visibility>)>,
) {
    for entity in containers.iter() {
        commands.entity(entity).insert(Visibility::default());
    }
}

fn attach_waypoint_markers(
    mut commands: Commands,
    palette: Res<TrafficPalette>,
    waypoints: Query<Entity, Added<Waypoint>>,
) {
    for entity in waypoints.iter() {
        commands.entity(entity).insert((
            Mesh3d(palette.waypoint_mesh.clone()),
            MeshMaterial3d(palette.waypoint_material.clone()),
        ));
    }
}

fn attach_car_meshes(
    mut commands: Commands,
    palette: Res<TrafficPalette>,
    cars: Query<(Entity, &Car, &CarState), Added<Car>>,
) {
    for (entity, car, state) in cars.iter() {
        commands.entity(entity).insert((
            Mesh3d(palette.car_mesh.clone()),
            MeshMaterial3d(palette.material_for(*state)),
        ));
        roadsync_simulation::log(&format!("Visual attached to car {}", car.id));
    }
}

fn tint_cars_by_state(
    palette: Res<TrafficPalette>,
    mut cars: Query<(&CarState, &mut MeshMaterial3d<StandardMaterial>), (With<Car>, Changed<CarState>)>,
) {
    for (state, mut material) in cars.iter_mut() {
        material.0 = palette.material_for(*state);
    }
}
