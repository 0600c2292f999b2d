//! Simulation Poller: синхронизация tracked машин с snapshot'ом сервера
//!
//! Flow одного цикла:
//! 1. PollUpdate → `dispatch_poll_request` запускает fetch на worker thread
//! 2. Worker → flume канал → `collect_poll_results` (FixedUpdate)
//! 3. `sync_snapshot`: spawn новых, update существующих, remove пропавших
//!
//! CarRegistry (id → Entity) меняет ТОЛЬКО poller. Motion систем читают
//! компоненты машин, но не создают и не удаляют их.

pub mod route;

pub use route::build_route;

use crate::components::{Car, CarId, CarState, CarTemplate, CarVelocity, PathFollower};
use crate::error::FeedError;
use crate::feed::{FeedResult, TrafficFeed};
use crate::logger;
use crate::schedules::FixedTickCounter;
use crate::waypoints::WaypointSet;
use crate::wire::CarRecord;
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

/// Registry: маппинг server CarId → ECS Entity
#[derive(Resource, Default, Debug)]
pub struct CarRegistry {
    cars: HashMap<CarId, Entity>,
}

impl CarRegistry {
    pub fn get(&self, id: CarId) -> Option<Entity> {
        self.cars.get(&id).copied()
    }

    pub fn contains(&self, id: CarId) -> bool {
        self.cars.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    /// Отсортированные ID (детерминированный порядок для логов/тестов)
    pub fn ids(&self) -> Vec<CarId> {
        let mut ids: Vec<CarId> = self.cars.keys().copied().collect();
        ids.sort();
        ids
    }

    fn insert(&mut self, id: CarId, entity: Entity) {
        self.cars.insert(id, entity);
    }

    fn remove_absent(&mut self, present: &HashSet<CarId>) -> Vec<(CarId, Entity)> {
        let mut removed: Vec<(CarId, Entity)> = self
            .cars
            .iter()
            .filter(|(id, _)| !present.contains(id))
            .map(|(id, entity)| (*id, *entity))
            .collect();
        removed.sort_by_key(|(id, _)| *id);

        for (id, _) in &removed {
            self.cars.remove(id);
        }
        removed
    }
}

/// Poll clock: deadline следующего poll + флаг "запрос в полёте"
#[derive(Resource, Debug, Clone)]
pub struct PollClock {
    /// false пока prerequisites не проверены (start_poller)
    pub enabled: bool,
    pub in_flight: bool,
    pub interval_ticks: u64,
    pub next_tick: u64,
}

impl PollClock {
    pub fn new(interval_ticks: u64) -> Self {
        Self {
            enabled: false,
            in_flight: false,
            interval_ticks: interval_ticks.max(1),
            next_tick: 0,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.enabled && !self.in_flight && tick >= self.next_tick
    }

    /// Ответ получен: ждём полный период от текущего тика
    pub fn complete(&mut self, tick: u64) {
        self.in_flight = false;
        self.next_tick = tick.wrapping_add(self.interval_ticks);
    }
}

/// Канал worker thread → ECS
#[derive(Resource, Clone)]
pub struct PollChannel {
    tx: flume::Sender<FeedResult>,
    rx: flume::Receiver<FeedResult>,
}

impl Default for PollChannel {
    fn default() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }
}

impl PollChannel {
    pub fn sender(&self) -> flume::Sender<FeedResult> {
        self.tx.clone()
    }
}

/// Итог применения одного snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub spawned: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped_waiting: usize,
    pub routes_assigned: usize,
}

/// Счётчики poll цикла
#[derive(Resource, Debug, Clone, Default)]
pub struct PollStats {
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub last_report: SnapshotReport,
}

type TrackedCars<'w, 's> = Query<'w, 's, (&'static mut CarState, &'static mut PathFollower), With<Car>>;

/// Применить snapshot сервера к registry + ECS
pub fn sync_snapshot(
    commands: &mut Commands,
    registry: &mut CarRegistry,
    waypoints: &WaypointSet,
    template: &CarTemplate,
    cars: &mut TrackedCars,
    records: &[CarRecord],
) -> SnapshotReport {
    let mut report = SnapshotReport::default();
    let mut spawned_now: HashSet<CarId> = HashSet::new();

    for record in records {
        let id = record.car_id();
        let state = record.car_state();

        logger::log(&format!(
            "🚗 Processing car {} - state: {} - fuel: {} - route index: {}",
            id,
            state.as_str(),
            record.fuel,
            record.route_index
        ));

        // WAITING: не создаём и не обновляем (и не удаляем: id считается присутствующим)
        if state == CarState::Waiting {
            logger::log(&format!("Car {} is WAITING, skipping create/update", id));
            report.skipped_waiting += 1;
            continue;
        }

        if spawned_now.contains(&id) {
            logger::log_warning(&format!("⚠️ Car {} appears twice in one snapshot, duplicate ignored", id));
            continue;
        }

        let tracked = registry.get(id).and_then(|entity| cars.get_mut(entity).ok());

        let Some((mut current_state, mut follower)) = tracked else {
            if registry.contains(id) {
                logger::log_warning(&format!("⚠️ Car {} entity vanished, respawning", id));
            }

            let entity = spawn_car(commands, waypoints, template, record, &mut report);
            registry.insert(id, entity);
            spawned_now.insert(id);
            report.spawned += 1;
            continue;
        };

        *current_state = state;
        report.updated += 1;

        if follower.has_route() {
            logger::log(&format!("Car {} already has a route, state updated only", id));
            continue;
        }

        if assign_route(&mut follower, waypoints, record) {
            report.routes_assigned += 1;
        }
    }

    // Удаляем машины, которых нет в ответе (WAITING id считаются присутствующими)
    let present: HashSet<CarId> = records.iter().map(CarRecord::car_id).collect();
    for (id, entity) in registry.remove_absent(&present) {
        logger::log_info(&format!("🗑️ Car {} left the simulation, removing {:?}", id, entity));
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.despawn();
        }
        report.removed += 1;
    }

    report
}

fn spawn_car(
    commands: &mut Commands,
    waypoints: &WaypointSet,
    template: &CarTemplate,
    record: &CarRecord,
    report: &mut SnapshotReport,
) -> Entity {
    let id = record.car_id();

    let spawn_position = match waypoints.resolve(record.route_index) {
        Some(waypoint) => waypoints.position(waypoint).unwrap_or(Vec3::ZERO),
        None => {
            if !waypoints.is_empty() {
                logger::log_warning(&format!(
                    "⚠️ Car {} route_index {} does not resolve, spawning at origin",
                    id, record.route_index
                ));
            }
            Vec3::ZERO
        }
    };

    let mut follower = PathFollower::default();
    if assign_route(&mut follower, waypoints, record) {
        report.routes_assigned += 1;
    }

    let name = template.entity_name(id);
    let entity = commands
        .spawn((
            Car { id },
            record.car_state(),
            follower,
            CarVelocity::default(),
            Transform::from_translation(spawn_position).with_scale(template.scale),
            Name::new(name.clone()),
        ))
        .id();

    logger::log_info(&format!("✅ Created {} at {} ({:?})", name, spawn_position, entity));
    entity
}

/// Назначить маршрут (если построился непустой). Возвращает true при назначении.
fn assign_route(follower: &mut PathFollower, waypoints: &WaypointSet, record: &CarRecord) -> bool {
    let id = record.car_id();
    let route = build_route(waypoints, id, &record.route_indices);

    logger::log(&format!("🔄 Car {} received {} waypoints from the server", id, route.len()));

    if route.is_empty() {
        logger::log_error(&format!(
            "🚨 Could not assign a valid route to car {}, will retry on next poll",
            id
        ));
        return false;
    }

    let len = route.len();
    follower.assign(route);
    logger::log(&format!("Route assigned to car {} with {} waypoints", id, len));
    true
}

/// System: проверить prerequisites и включить poll цикл (PostStartup)
///
/// Нет WaypointSet / CarTemplate / TrafficFeed → error, poller не стартует.
pub fn start_poller(
    waypoints: Option<Res<WaypointSet>>,
    template: Option<Res<CarTemplate>>,
    feed: Option<Res<TrafficFeed>>,
    mut clock: ResMut<PollClock>,
) {
    if waypoints.is_none() {
        logger::log_error("🚨 Poller not started: WaypointSource missing");
        return;
    }

    if template.is_none() {
        logger::log_error("🚨 Poller not started: CarTemplate is not configured");
        return;
    }

    let Some(feed) = feed else {
        logger::log_error("🚨 Poller not started: no TrafficFeed configured");
        return;
    };

    clock.enabled = true;
    logger::log_info(&format!(
        "📡 Poll loop started: {} every {} ticks",
        feed.0.describe(),
        clock.interval_ticks
    ));
}

/// System: запустить fetch на worker thread (PollUpdate)
pub fn dispatch_poll_request(
    feed: Option<Res<TrafficFeed>>,
    channel: Res<PollChannel>,
    counter: Res<FixedTickCounter>,
    mut clock: ResMut<PollClock>,
) {
    let Some(feed) = feed else {
        return;
    };

    let feed = feed.0.clone();
    let tx = channel.sender();

    let spawned = std::thread::Builder::new()
        .name("roadsync-poll".to_string())
        .spawn(move || {
            // Panic в feed не должен оставить clock.in_flight навсегда
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| feed.fetch()))
                .unwrap_or(Err(FeedError::Disconnected));
            let _ = tx.send(result);
        });

    match spawned {
        Ok(_) => clock.in_flight = true,
        Err(e) => {
            logger::log_error(&format!("❌ Failed to spawn poll worker: {}", e));
            clock.complete(counter.tick);
        }
    }
}

/// System: собрать ответы worker'а и применить (FixedUpdate, до motion)
pub fn collect_poll_results(
    mut commands: Commands,
    channel: Res<PollChannel>,
    counter: Res<FixedTickCounter>,
    mut clock: ResMut<PollClock>,
    mut registry: ResMut<CarRegistry>,
    mut stats: ResMut<PollStats>,
    waypoints: Option<Res<WaypointSet>>,
    template: Option<Res<CarTemplate>>,
    mut cars: TrackedCars,
) {
    let empty_waypoints = WaypointSet::default();
    let waypoints = waypoints.as_deref().unwrap_or(&empty_waypoints);
    let default_template = CarTemplate::default();
    let template = template.as_deref().unwrap_or(&default_template);

    // Один ответ за тик: spawn'ы из commands должны примениться до следующего snapshot'а
    if let Ok(result) = channel.rx.try_recv() {
        clock.complete(counter.tick);

        match result {
            Ok(records) => {
                logger::log(&format!("📥 Snapshot received: {} cars", records.len()));
                let report = sync_snapshot(
                    &mut commands,
                    &mut registry,
                    waypoints,
                    template,
                    &mut cars,
                    &records,
                );
                stats.polls_ok += 1;
                stats.last_report = report;
            }
            Err(e) => {
                // Нет retry/backoff: следующий цикл по расписанию
                logger::log_error(&format!("❌ Poll failed: {}", e));
                stats.polls_failed += 1;
            }
        }
    }
}
