//! Tests for waypoint discovery.

use super::*;

fn discovery_app() -> App {
    let mut app = App::new();
    app.add_systems(PostStartup, discover_waypoints);
    app
}

fn spawn_container(app: &mut App, translation: Vec3, children: &[(&str, Vec3)]) -> Entity {
    let world = app.world_mut();
    let container = world
        .spawn((WaypointContainer, Name::new("Waypoints"), Transform::from_translation(translation)))
        .id();

    for (name, position) in children {
        world.spawn((Name::new(name.to_string()), Transform::from_translation(*position), ChildOf(container)));
    }

    container
}

#[test]
fn test_container_children_in_order_filtered_by_name() {
    let mut app = discovery_app();
    spawn_container(
        &mut app,
        Vec3::ZERO,
        &[
            ("Waypoint_0", Vec3::new(0.0, 0.0, 0.0)),
            ("Lamp", Vec3::new(50.0, 0.0, 0.0)),
            ("WAYPOINT_1", Vec3::new(10.0, 0.0, 0.0)),
            ("waypoint-2", Vec3::new(10.0, 0.0, 10.0)),
        ],
    );

    app.update();

    let set = app.world().resource::<WaypointSet>();
    let names: Vec<_> = set.anchors().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["Waypoint_0", "WAYPOINT_1", "waypoint-2"]);
    assert_eq!(set.position(WaypointId(1)), Some(Vec3::new(10.0, 0.0, 0.0)));
}

#[test]
fn test_child_positions_are_world_space() {
    let mut app = discovery_app();
    spawn_container(&mut app, Vec3::new(100.0, 0.0, -5.0), &[("Waypoint_0", Vec3::new(1.0, 2.0, 3.0))]);

    app.update();

    let set = app.world().resource::<WaypointSet>();
    assert_eq!(set.position(WaypointId(0)), Some(Vec3::new(101.0, 2.0, -2.0)));
}

#[test]
fn test_tag_fallback_when_no_named_children() {
    let mut app = discovery_app();
    spawn_container(&mut app, Vec3::ZERO, &[("Lamp", Vec3::ONE)]);

    let world = app.world_mut();
    let a = world.spawn((WaypointTag, Name::new("A"), Transform::from_xyz(1.0, 0.0, 0.0))).id();
    let b = world.spawn((WaypointTag, Name::new("B"), Transform::from_xyz(2.0, 0.0, 0.0))).id();

    app.update();

    let set = app.world().resource::<WaypointSet>();
    assert_eq!(set.len(), 2);
    assert_eq!(set.anchors()[0].entity, a);
    assert_eq!(set.anchors()[1].entity, b);
    assert_eq!(app.world().get::<Waypoint>(b), Some(&Waypoint { index: 1 }));
}

#[test]
fn test_tags_ignored_when_children_found() {
    let mut app = discovery_app();
    spawn_container(&mut app, Vec3::ZERO, &[("Waypoint_0", Vec3::ZERO)]);
    app.world_mut().spawn((WaypointTag, Transform::from_xyz(9.0, 0.0, 0.0)));

    app.update();

    assert_eq!(app.world().resource::<WaypointSet>().len(), 1);
}

#[test]
fn test_empty_container_gives_empty_set() {
    let mut app = discovery_app();
    spawn_container(&mut app, Vec3::ZERO, &[]);

    app.update();

    let set = app.world().resource::<WaypointSet>();
    assert!(set.is_empty());
    assert_eq!(set.resolve(0), None);
}

#[test]
fn test_missing_container_installs_nothing() {
    let mut app = discovery_app();
    app.world_mut().spawn((WaypointTag, Transform::default()));

    app.update();

    assert!(app.world().get_resource::<WaypointSet>().is_none());
}

#[test]
fn test_resolve_rejects_negative_and_out_of_range() {
    let set = WaypointSet::from_positions([Vec3::ZERO, Vec3::X, Vec3::Z]);
    assert_eq!(set.resolve(0), Some(WaypointId(0)));
    assert_eq!(set.resolve(2), Some(WaypointId(2)));
    assert_eq!(set.resolve(3), None);
    assert_eq!(set.resolve(-1), None);
}

#[test]
fn test_is_waypoint_name() {
    assert!(is_waypoint_name("Waypoint (3)"));
    assert!(is_waypoint_name("waypointA"));
    assert!(!is_waypoint_name("Way point"));
    assert!(!is_waypoint_name("StartWaypoint"));
}
