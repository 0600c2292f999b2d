//! Simulation Poller integration tests
//!
//! Ответы кладём прямо в PollChannel (без HTTP и worker thread'ов),
//! чтобы каждый snapshot применялся в известный тик.
//!
//! Проверяем:
//! - spawn/update/remove по snapshot'у
//! - WAITING записи не создают и не удаляют машины
//! - маршрут назначается один раз
//! - prerequisites poller'а

mod common;

use bevy::prelude::*;
use common::*;
use roadsync_simulation::*;
use std::time::Duration;

#[test]
fn test_discovery_ignores_non_waypoint_children() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    let waypoints = app.world().resource::<WaypointSet>();
    assert_eq!(waypoints.len(), 5);
    let names: Vec<&str> = waypoints.anchors().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Waypoint_0", "Waypoint_1", "Waypoint_2", "Waypoint_3", "Waypoint_4"]);
}

#[test]
fn test_empty_response_yields_zero_cars() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 0, &[0, 1]), moving(2, 1, &[1, 2])]));
    assert_eq!(tracked_ids(&app), vec![1, 2]);

    deliver(&mut app, Ok(Vec::new()));

    assert!(tracked_ids(&app).is_empty());
    assert_eq!(car_count(&mut app), 0);
    assert_eq!(app.world().resource::<PollStats>().last_report.removed, 2);
}

#[test]
fn test_new_car_spawns_at_route_index_waypoint() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 2, &[0, 1, 2])]));

    assert_eq!(tracked_ids(&app), vec![1]);
    let entity = car_entity(&app, 1);
    let world = app.world();

    let follower = world.get::<PathFollower>(entity).unwrap();
    assert!(follower.has_route());
    assert_eq!(follower.route().len(), 3);
    assert_eq!(follower.cursor(), 0);

    // Spawn в waypoint[2] = (40, 0, 0), за один тик машина едва сдвинулась
    let transform = world.get::<Transform>(entity).unwrap();
    assert!(transform.translation.distance(Vec3::new(40.0, 0.0, 0.0)) < 0.1);

    assert_eq!(world.get::<Name>(entity).unwrap().as_str(), "Car_1");
    assert_eq!(*world.get::<CarState>(entity).unwrap(), CarState::Moving);
    assert_eq!(world.get::<Car>(entity).unwrap().id, CarId(1));
}

#[test]
fn test_unresolvable_route_index_spawns_at_origin() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 99, &[1, 2])]));

    let entity = car_entity(&app, 1);
    let transform = app.world().get::<Transform>(entity).unwrap();
    assert!(transform.translation.length() < 0.1);
}

#[test]
fn test_waiting_records_neither_create_nor_remove() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 0, &[0, 1, 2])]));
    let entity = car_entity(&app, 1);

    // 1 в WAITING (уже tracked), 2 в WAITING (не tracked)
    deliver(
        &mut app,
        Ok(vec![with_state(1, CarState::Waiting), with_state(2, CarState::Waiting)]),
    );

    assert_eq!(tracked_ids(&app), vec![1]);
    assert_eq!(car_entity(&app, 1), entity);
    // Состояние не обновлялось: WAITING запись пропущена целиком
    assert_eq!(*app.world().get::<CarState>(entity).unwrap(), CarState::Moving);

    let report = app.world().resource::<PollStats>().last_report;
    assert_eq!(report.skipped_waiting, 2);
    assert_eq!(report.spawned, 0);
    assert_eq!(report.removed, 0);
}

#[test]
fn test_absent_ids_are_removed() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(
        &mut app,
        Ok(vec![moving(1, 0, &[0, 1]), moving(2, 1, &[1, 2]), moving(3, 2, &[2, 3])]),
    );
    let first = car_entity(&app, 1);
    let third = car_entity(&app, 3);

    deliver(&mut app, Ok(vec![moving(2, 1, &[1, 2])]));

    assert_eq!(tracked_ids(&app), vec![2]);
    assert!(app.world().get_entity(first).is_err());
    assert!(app.world().get_entity(third).is_err());
    assert_eq!(car_count(&mut app), 1);
}

#[test]
fn test_route_is_assigned_once() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 2, &[0, 1, 2])]));
    let entity = car_entity(&app, 1);

    // Новый route_indices + REFUELING: обновится только state
    deliver(
        &mut app,
        Ok(vec![record(1, CarState::Refueling, 4, vec![4, 3])]),
    );

    let world = app.world();
    let follower = world.get::<PathFollower>(entity).unwrap();
    let route: Vec<usize> = follower.route().iter().map(|id| id.0).collect();
    assert_eq!(route, vec![0, 1, 2]);
    assert_eq!(*world.get::<CarState>(entity).unwrap(), CarState::Refueling);
    assert_eq!(world.resource::<PollStats>().last_report.routes_assigned, 0);
}

#[test]
fn test_empty_route_is_retried_on_next_poll() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 0, &[42, -3])]));
    let entity = car_entity(&app, 1);
    assert!(!app.world().get::<PathFollower>(entity).unwrap().has_route());

    deliver(&mut app, Ok(vec![moving(1, 0, &[3, 4])]));

    let follower = app.world().get::<PathFollower>(entity).unwrap();
    assert!(follower.has_route());
    assert_eq!(follower.current_target(), Some(WaypointId(3)));
}

#[test]
fn test_failed_poll_leaves_state_unchanged() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 0, &[0, 1])]));
    deliver(&mut app, Err(FeedError::Status(500)));
    deliver(&mut app, Err(FeedError::Decode(serde_json::from_str::<()>("{").unwrap_err())));

    assert_eq!(tracked_ids(&app), vec![1]);
    let stats = app.world().resource::<PollStats>();
    assert_eq!(stats.polls_ok, 1);
    assert_eq!(stats.polls_failed, 2);
}

#[test]
fn test_vanished_entity_is_respawned() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 0, &[0, 1])]));
    let old = car_entity(&app, 1);
    app.world_mut().despawn(old);

    deliver(&mut app, Ok(vec![moving(1, 0, &[0, 1])]));

    let new = car_entity(&app, 1);
    assert_ne!(old, new);
    assert!(app.world().get::<Car>(new).is_some());
}

#[test]
fn test_duplicate_id_in_snapshot_spawns_once() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(7, 0, &[0, 1]), moving(7, 3, &[3, 4])]));

    assert_eq!(tracked_ids(&app), vec![7]);
    assert_eq!(car_count(&mut app), 1);
}

#[test]
fn test_refueling_car_holds_position_in_app() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    deliver(&mut app, Ok(vec![moving(1, 1, &[2, 3])]));
    run_ticks(&mut app, 30);

    deliver(&mut app, Ok(vec![record(1, CarState::Refueling, 1, vec![2, 3])]));
    let entity = car_entity(&app, 1);
    let held = app.world().get::<Transform>(entity).unwrap().translation;

    run_ticks(&mut app, 60);

    let now = app.world().get::<Transform>(entity).unwrap().translation;
    assert_eq!(now, held);
    assert_eq!(app.world().get::<CarVelocity>(entity).unwrap().0, Vec3::ZERO);
}

#[test]
fn test_poller_requires_container() {
    let mut app = sync_app(&quiet_config(), "()");
    app.insert_resource(TrafficFeed::new(ScriptedFeed::new([])));
    boot(&mut app);

    assert!(app.world().get_resource::<WaypointSet>().is_none());
    assert!(!app.world().resource::<PollClock>().enabled);
}

#[test]
fn test_poller_requires_template() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    app.insert_resource(TrafficFeed::new(ScriptedFeed::new([])));
    app.world_mut().remove_resource::<CarTemplate>();
    boot(&mut app);

    assert!(!app.world().resource::<PollClock>().enabled);
}

#[test]
fn test_poller_requires_feed() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    assert!(!app.world().resource::<PollClock>().enabled);
}

#[test]
fn test_poller_starts_with_all_prerequisites() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    app.insert_resource(TrafficFeed::new(ScriptedFeed::new([])));
    boot(&mut app);

    assert!(app.world().resource::<PollClock>().enabled);
}

#[test]
fn test_two_queued_responses_apply_on_separate_ticks() {
    let mut app = sync_app(&quiet_config(), LINE_SCENE);
    boot(&mut app);

    let sender = app.world().resource::<PollChannel>().sender();
    sender.send(Ok(vec![moving(1, 0, &[0, 1])])).unwrap();
    sender.send(Ok(vec![moving(1, 0, &[0, 1]), moving(2, 1, &[1, 2])])).unwrap();

    app.update();
    assert_eq!(tracked_ids(&app), vec![1]);
    let first = car_entity(&app, 1);

    app.update();
    assert_eq!(tracked_ids(&app), vec![1, 2]);
    assert_eq!(car_entity(&app, 1), first);
    assert_eq!(car_count(&mut app), 2);
    assert_eq!(app.world().resource::<PollStats>().last_report.spawned, 1);
}

/// End-to-end: ScriptedFeed на worker thread'ах, ждём пока poll'ы пройдут
#[test]
fn test_scripted_feed_end_to_end() {
    let config = ClientConfig {
        poll_interval_ms: 50,
        ..quiet_config()
    };
    let mut app = sync_app(&config, LINE_SCENE);
    app.insert_resource(TrafficFeed::new(ScriptedFeed::new([
        Ok(vec![moving(1, 0, &[0, 1, 2]), moving(2, 4, &[4, 3])]),
        Err(FeedError::Status(503)),
        Ok(vec![moving(2, 4, &[4, 3])]),
    ])));
    boot(&mut app);

    let mut done = false;
    for _ in 0..5_000 {
        app.update();

        let stats = app.world().resource::<PollStats>();
        if stats.polls_ok >= 2 && stats.polls_failed >= 1 {
            done = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    assert!(done, "scripted polls did not complete");
    assert_eq!(tracked_ids(&app), vec![2]);
    assert_eq!(car_count(&mut app), 1);
}
