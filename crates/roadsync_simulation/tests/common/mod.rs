//! Общие helpers для integration тестов: headless App с ручным временем

#![allow(dead_code)]

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use roadsync_simulation::*;
use std::time::Duration;

/// 5 waypoints по оси X через 20 единиц + один лишний child
pub const LINE_SCENE: &str = r#"
(
  container: Some((
    name: "Waypoints",
    children: [
      (name: "Waypoint_0", translation: (0.0, 0.0, 0.0)),
      (name: "Waypoint_1", translation: (20.0, 0.0, 0.0)),
      (name: "Waypoint_2", translation: (40.0, 0.0, 0.0)),
      (name: "StreetLamp", translation: (50.0, 0.0, 5.0)),
      (name: "Waypoint_3", translation: (60.0, 0.0, 0.0)),
      (name: "Waypoint_4", translation: (80.0, 0.0, 0.0)),
    ],
  )),
)
"#;

pub fn quiet_config() -> ClientConfig {
    ClientConfig {
        log_level: LogLevel::Warning,
        ..Default::default()
    }
}

/// App с ManualDuration: каждый `app.update()` = ровно один FixedUpdate тик
/// (кроме самого первого, где delta = 0).
pub fn sync_app(config: &ClientConfig, scene: &str) -> App {
    let mut app = create_headless_app(config);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / config.tick_hz,
    )));

    let scene = WaypointScene::from_ron_str(scene).expect("test scene must parse");
    spawn_waypoint_scene_in_world(app.world_mut(), &scene);
    app
}

/// Startup + PostStartup (discovery, start_poller)
pub fn boot(app: &mut App) {
    app.update();
}

pub fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Положить ответ в канал poller'а и применить его за один тик
pub fn deliver(app: &mut App, response: Result<Vec<CarRecord>, FeedError>) {
    let sender = app.world().resource::<PollChannel>().sender();
    sender.send(response).expect("poll channel is open");
    app.update();
}

pub fn record(id: i64, state: CarState, route_index: i64, route_indices: Vec<i64>) -> CarRecord {
    CarRecord {
        id,
        state: Some(state.as_str().to_string()),
        fuel: 100,
        route_index,
        route_indices,
        ..Default::default()
    }
}

pub fn moving(id: i64, route_index: i64, route: &[i64]) -> CarRecord {
    record(id, CarState::Moving, route_index, route.to_vec())
}

pub fn with_state(id: i64, state: CarState) -> CarRecord {
    record(id, state, 0, vec![0, 1, 2])
}

pub fn tracked_ids(app: &App) -> Vec<i64> {
    app.world()
        .resource::<CarRegistry>()
        .ids()
        .into_iter()
        .map(|id| id.0)
        .collect()
}

pub fn car_entity(app: &App, id: i64) -> Entity {
    app.world()
        .resource::<CarRegistry>()
        .get(CarId(id))
        .unwrap_or_else(|| panic!("car {id} is not tracked"))
}

/// Количество entity с компонентом Car (должно совпадать с registry)
pub fn car_count(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut query = world.query::<&Car>();
    query.iter(world).count()
}
