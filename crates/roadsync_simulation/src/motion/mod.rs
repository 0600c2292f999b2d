//! Car Motion Controller: движение машины по маршруту (FixedUpdate)
//!
//! Порядок одного тика (`step_motion`):
//! 1. Нет маршрута → no-op
//! 2. cursor за концом → cursor = 0 (маршрут по кругу), движения в этот тик нет
//! 3. Waiting/Refueling → держим позицию (velocity = 0)
//! 4. Поворот к цели (slerp), если direction длиннее heading_epsilon
//! 5. Первый шаг свежего маршрута, цель дальше teleport_threshold → snap один раз,
//!    иначе velocity сглаженно тянется к direction × speed. Круг по маршруту
//!    не телепортирует.
//! 6. distance < arrival_threshold → cursor + 1
//!
//! Интеграция velocity → translation: отдельная система (`integrate_car_velocity`).

use crate::components::{Car, CarState, CarVelocity, PathFollower};
use crate::config::MotionConfig;
use crate::logger;
use crate::waypoints::WaypointSet;
use bevy::prelude::*;

/// Что произошло за тик (для логов и тестов)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    NoRoute,
    /// Маршрут пройден, cursor сброшен в 0
    Restarted,
    Holding,
    /// WaypointSet не содержит цель (маршрут устарел относительно сцены)
    MissingWaypoint,
    Teleported,
    Moving { distance: f32, advanced: bool },
}

/// Один тик motion controller'а (pure, без ECS)
pub fn step_motion(
    follower: &mut PathFollower,
    state: CarState,
    transform: &mut Transform,
    velocity: &mut Vec3,
    waypoints: &WaypointSet,
    config: &MotionConfig,
    dt: f32,
) -> MotionStep {
    if !follower.has_route() || follower.route().is_empty() {
        return MotionStep::NoRoute;
    }

    if follower.restart_if_finished() {
        return MotionStep::Restarted;
    }

    if state.holds_position() {
        *velocity = Vec3::ZERO;
        return MotionStep::Holding;
    }

    let Some(target) = follower.current_target().and_then(|id| waypoints.position(id)) else {
        *velocity = Vec3::ZERO;
        return MotionStep::MissingWaypoint;
    };

    let offset = target - transform.translation;
    let distance = offset.length();
    let direction = offset.normalize_or_zero();

    // Плавный поворот к waypoint
    if direction.length() > config.heading_epsilon {
        let desired = Transform::IDENTITY.looking_to(direction, Vec3::Y).rotation;
        let t = (config.rotation_speed * dt).clamp(0.0, 1.0);
        transform.rotation = transform.rotation.slerp(desired, t);
    }

    if distance > config.teleport_threshold && follower.can_teleport() {
        transform.translation = target;
        *velocity = Vec3::ZERO;
        follower.mark_teleported();
        return MotionStep::Teleported;
    }

    follower.mark_started();

    // Exponential smoothing velocity (не мгновенный рывок)
    let desired_velocity = direction * config.speed;
    let blend = (config.velocity_blend * dt).clamp(0.0, 1.0);
    *velocity = velocity.lerp(desired_velocity, blend);

    let advanced = distance < config.arrival_threshold;
    if advanced {
        follower.advance();
    }

    MotionStep::Moving { distance, advanced }
}

/// translation += velocity × dt (Waiting/Refueling не двигаются)
pub fn integrate(transform: &mut Transform, velocity: Vec3, state: CarState, dt: f32) {
    if state.holds_position() {
        return;
    }
    transform.translation += velocity * dt;
}

/// System: motion controller для всех машин
pub fn follow_routes(
    mut cars: Query<(&Car, &CarState, &mut PathFollower, &mut Transform, &mut CarVelocity)>,
    waypoints: Option<Res<WaypointSet>>,
    config: Res<MotionConfig>,
    time: Res<Time<Fixed>>,
) {
    let Some(waypoints) = waypoints else {
        return;
    };
    let dt = time.delta_secs();

    for (car, state, mut follower, mut transform, mut velocity) in cars.iter_mut() {
        let step = step_motion(
            &mut follower,
            *state,
            &mut transform,
            &mut velocity.0,
            &waypoints,
            &config,
            dt,
        );

        match step {
            MotionStep::NoRoute => {
                logger::log(&format!("No waypoints assigned to car {}", car.id));
            }
            MotionStep::Restarted => {
                logger::log(&format!("Car {} reached the end of its route, looping", car.id));
            }
            MotionStep::MissingWaypoint => {
                logger::log_warning(&format!(
                    "⚠️ Car {} targets waypoint {:?} which is not in the WaypointSet",
                    car.id,
                    follower.current_target()
                ));
            }
            MotionStep::Teleported => {
                logger::log_info(&format!(
                    "Car {} teleported to {} to start its route",
                    car.id, transform.translation
                ));
            }
            MotionStep::Moving { advanced: true, .. } => {
                logger::log(&format!(
                    "Car {} advanced to waypoint {}/{}",
                    car.id,
                    follower.cursor(),
                    follower.route().len()
                ));
            }
            MotionStep::Holding | MotionStep::Moving { .. } => {}
        }
    }
}

/// System: velocity → Transform (после follow_routes)
pub fn integrate_car_velocity(
    mut cars: Query<(&CarVelocity, &CarState, &mut Transform), With<Car>>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (velocity, state, mut transform) in cars.iter_mut() {
        integrate(&mut transform, velocity.0, *state, dt);
    }
}
