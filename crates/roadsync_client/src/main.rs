//! RoadSync client: окно с машинами, синхронизированными с сервером симуляции
//!
//! Usage: `roadsync_client [config.ron] [waypoints.ron]`

use bevy::prelude::*;
use roadsync_simulation::{
    log_error, log_info, log_warning, set_log_level, set_logger, spawn_waypoint_scene, CarTemplate, ClientConfig,
    ConfigError, HttpCarFeed, TrafficFeed, TrafficSyncPlugin, WaypointScene,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod camera;
mod logger;
mod visuals;

use camera::{OrbitCamera, SceneCameraPlugin};
use logger::{FileLogger, DEFAULT_LOG_PATH};
use visuals::TrafficVisualsPlugin;

const DEFAULT_CONFIG_PATH: &str = "config/roadsync.ron";
const DEFAULT_SCENE_PATH: &str = "config/waypoints.ron";

/// Нет файла → defaults. Битый файл → ошибка.
fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let config = if path.exists() {
        ClientConfig::load(path)?
    } else {
        log_warning(&format!("⚠️ Config {:?} not found, using defaults", path));
        ClientConfig::default()
    };

    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    set_logger(Box::new(FileLogger::new(DEFAULT_LOG_PATH)));

    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let config_path = args.next().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let scene_path = args.next().unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE_PATH));

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log_error(&format!("❌ {e}"));
            return ExitCode::FAILURE;
        }
    };
    set_log_level(config.log_level);

    // Без сцены приложение всё равно стартует: poller сам сообщит, что WaypointSource нет
    let scene = WaypointScene::load(&scene_path).unwrap_or_else(|e| {
        log_error(&format!("🚨 {e}"));
        WaypointScene::default()
    });

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "RoadSync".to_string(),
            resolution: (1280., 720.).into(),
            ..default()
        }),
        ..default()
    }))
    // Sync core (poller + motion)
    .add_plugins(TrafficSyncPlugin::new(config.clone()))
    // Presentation
    .add_plugins((TrafficVisualsPlugin, SceneCameraPlugin))
    .insert_resource(CarTemplate::new(config.car_name_prefix.clone()))
    .add_systems(Startup, (move |mut commands: Commands| {
        spawn_waypoint_scene(&mut commands, &scene);
    }, setup_world));

    match HttpCarFeed::new(config.server_url.clone()) {
        Ok(feed) => {
            app.insert_resource(TrafficFeed::new(feed));
        }
        Err(e) => log_error(&format!("🚨 HTTP client unavailable, poller will not start: {e}")),
    }

    log_info(&format!("Starting RoadSync client, polling {}", config.server_url));

    match app.run() {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(_) => ExitCode::FAILURE,
    }
}

/// Земля, свет, камера
fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(250.0)))),
        MeshMaterial3d(materials.add(Color::srgb(0.25, 0.3, 0.25))),
        Transform::from_xyz(0.0, -0.6, 0.0),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4)),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        affects_lightmapped_meshes: false,
    });

    commands.spawn((Camera3d::default(), Transform::default(), OrbitCamera::default()));
}
