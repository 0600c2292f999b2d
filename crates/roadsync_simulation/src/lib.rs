//! RoadSync Simulation Core
//!
//! Headless ECS слой на Bevy 0.16: синхронизация машин с сервером симуляции.
//!
//! - Waypoint Source: упорядоченные якоря маршрутов из сцены (PostStartup)
//! - Simulation Poller: периодический GET snapshot'а, spawn/update/remove машин
//! - Car Motion Controller: движение по маршруту в FixedUpdate
//!
//! Presentation (меши, камера) живёт в `roadsync_client`.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

// Публичные модули
pub mod components;
pub mod config;
pub mod error;
pub mod feed;
pub mod logger;
pub mod motion;
pub mod scene;
pub mod schedules;
pub mod sync;
pub mod waypoints;
pub mod wire;

// Re-exports для удобства
pub use components::*;
pub use config::{ClientConfig, MotionConfig};
pub use error::{ConfigError, FeedError, SceneError};
pub use feed::{CarFeed, HttpCarFeed, ScriptedFeed, TrafficFeed};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};
pub use scene::{spawn_waypoint_scene, spawn_waypoint_scene_in_world, WaypointScene};
pub use schedules::{FixedTickCounter, PollUpdate};
pub use sync::{CarRegistry, PollChannel, PollClock, PollStats, SnapshotReport};
pub use waypoints::WaypointSet;
pub use wire::CarRecord;

use motion::{follow_routes, integrate_car_velocity};
use schedules::timer_systems::{increment_tick_counter, run_poll_update_timer};
use sync::{collect_poll_results, dispatch_poll_request, start_poller};
use waypoints::discover_waypoints;

/// Порядок внутри FixedUpdate: clock → sync (poll результаты) → motion
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrafficSet {
    Clock,
    Sync,
    Motion,
}

/// Главный plugin синхронизации (poller + motion)
///
/// Ожидает, что сцена (WaypointContainer), `CarTemplate` и `TrafficFeed`
/// появятся до PostStartup. Иначе poller не стартует.
pub struct TrafficSyncPlugin {
    pub config: ClientConfig,
}

impl TrafficSyncPlugin {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TrafficSyncPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep для motion + poll clock
            .insert_resource(Time::<Fixed>::from_hz(self.config.tick_hz))
            .insert_resource(self.config.motion)
            .insert_resource(PollClock::new(self.config.poll_interval_ticks()))
            .init_resource::<FixedTickCounter>()
            .init_resource::<CarRegistry>()
            .init_resource::<PollChannel>()
            .init_resource::<PollStats>();

        app.init_schedule(PollUpdate);

        app.configure_sets(
            FixedUpdate,
            (TrafficSet::Clock, TrafficSet::Sync, TrafficSet::Motion).chain(),
        );

        // Discovery → проверка prerequisites (commands применяются между ними)
        app.add_systems(PostStartup, (discover_waypoints, start_poller).chain());

        app.add_systems(
            FixedUpdate,
            (increment_tick_counter, run_poll_update_timer)
                .chain()
                .in_set(TrafficSet::Clock),
        )
        .add_systems(FixedUpdate, collect_poll_results.in_set(TrafficSet::Sync))
        .add_systems(
            FixedUpdate,
            (follow_routes, integrate_car_velocity)
                .chain()
                .in_set(TrafficSet::Motion),
        )
        .add_systems(PollUpdate, dispatch_poll_request);
    }
}

/// Создаёт minimal Bevy App для headless синхронизации
///
/// Feed и сцену добавляет вызывающий код (binary или тест).
pub fn create_headless_app(config: &ClientConfig) -> App {
    init_logger();
    set_log_level(config.log_level);

    let mut app = App::new();
    let frame = Duration::from_secs_f64(1.0 / config.tick_hz);

    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .add_plugins(TrafficSyncPlugin::new(config.clone()))
        .insert_resource(CarTemplate::new(config.car_name_prefix.clone()));

    app
}
