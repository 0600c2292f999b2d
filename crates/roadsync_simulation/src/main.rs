//! Headless синхронизация RoadSync
//!
//! Usage: `roadsync_simulation [config.ron] [waypoints.ron] [--ticks N] [--replay snapshots.json]`
//!
//! `--replay` подменяет HTTP feed записанными snapshot'ами (offline прогон).
//!
//! Без `--ticks` крутит ScheduleRunner loop бесконечно.

use roadsync_simulation::{
    create_headless_app, log_error, log_info, spawn_waypoint_scene_in_world, CarRegistry, ClientConfig,
    ConfigError, HttpCarFeed, PollStats, ScriptedFeed, TrafficFeed, WaypointScene,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/roadsync.ron";
const DEFAULT_SCENE_PATH: &str = "config/waypoints.ron";

struct Args {
    config: Option<PathBuf>,
    scene: PathBuf,
    ticks: Option<u64>,
    replay: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut ticks = None;
    let mut replay = None;
    let mut raw = std::env::args().skip(1);

    while let Some(arg) = raw.next() {
        if arg == "--ticks" {
            let value = raw.next().ok_or("--ticks requires a value")?;
            ticks = Some(value.parse().map_err(|_| format!("invalid --ticks value: {value}"))?);
        } else if arg == "--replay" {
            replay = Some(PathBuf::from(raw.next().ok_or("--replay requires a path")?));
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    let mut positional = positional.into_iter();
    Ok(Args {
        config: positional.next(),
        scene: positional.next().unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE_PATH)),
        ticks,
        replay,
    })
}

/// Явный путь обязан читаться; путь по умолчанию может отсутствовать (→ defaults)
fn load_config(explicit: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let config = match explicit {
        Some(path) => ClientConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => ClientConfig::load(DEFAULT_CONFIG_PATH)?,
        None => ClientConfig::default(),
    };

    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn load_replay(path: &Path) -> Result<ScriptedFeed, String> {
    let body = std::fs::read_to_string(path).map_err(|e| format!("failed to read replay {:?}: {}", path, e))?;
    ScriptedFeed::from_json(&body).map_err(|e| format!("replay {:?}: {}", path, e))
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let scene = match WaypointScene::load(&args.scene) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = create_headless_app(&config);

    match args.replay.as_deref() {
        Some(path) => match load_replay(path) {
            Ok(feed) => {
                log_info(&format!("▶️ Replaying snapshots from {:?}", path));
                app.insert_resource(TrafficFeed::new(feed));
            }
            Err(e) => {
                eprintln!("❌ {e}");
                return ExitCode::FAILURE;
            }
        },
        None => match HttpCarFeed::new(config.server_url.clone()) {
            Ok(feed) => {
                app.insert_resource(TrafficFeed::new(feed));
            }
            Err(e) => log_error(&format!("🚨 HTTP client unavailable, poller will not start: {e}")),
        },
    }

    spawn_waypoint_scene_in_world(app.world_mut(), &scene);

    log_info(&format!(
        "Starting RoadSync headless sync ({} anchors in scene, poll every {} ms)",
        scene.anchor_count(),
        config.poll_interval_ms
    ));

    let Some(ticks) = args.ticks else {
        app.run();
        return ExitCode::SUCCESS;
    };

    let frame = Duration::from_secs_f64(1.0 / config.tick_hz);
    for tick in 0..ticks {
        app.update();

        if tick % 300 == 0 {
            let cars = app.world().resource::<CarRegistry>().len();
            let stats = app.world().resource::<PollStats>();
            log_info(&format!(
                "Tick {}: {} cars tracked, {} polls ok, {} failed",
                tick, cars, stats.polls_ok, stats.polls_failed
            ));
        }

        std::thread::sleep(frame);
    }

    log_info("Headless run complete");
    ExitCode::SUCCESS
}
