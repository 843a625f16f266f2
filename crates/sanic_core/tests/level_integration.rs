//! Integration tests for level loading and the per-tick update
//!
//! These drive a small level through `Level::update` the way the frame
//! driver does and check the cross-module behaviour: classification of
//! level shapes, hero landing and input routing, deferred actor removal and
//! the hero respawn.

use std::sync::Arc;

use sanic_core::{
    ActorState, CollisionTag, Level, LevelData, LevelLoadError, LevelSettings, ResourceRegistry, Vec2,
};
use sanic_input::{Button, Command, Edge, InputSource};
use sanic_physics::CollisionLayer;

const DT: f32 = 1.0 / 64.0;

/// 40x15 tiles of 32px: a floor along the bottom, a trap and stairs far to
/// the right of the hero, a lift and a zombie further still
const LEVEL: &str = r##"#![enable(implicit_some)]
(
    name: "test",
    width: 40,
    height: 15,
    tile_width: 32,
    tile_height: 32,
    palette: { '=': (0.3, 0.3, 0.3, 1.0) },
    tiles: [(name: "ground", rows: [
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "........................................",
        "========================================",
        "========================================",
    ])],
    object_groups: [
        (name: "Physics", objects: [
            Box(name: "floor", x: 0.0, y: 416.0, width: 1280.0, height: 64.0, shape: (friction: 1.0)),
            Box(name: "moving_lift", x: 900.0, y: 200.0, width: 96.0, height: 16.0, body: (static: false, mass: 5.0)),
        ]),
        (name: "Traps", objects: [
            Box(name: "spikes", x: 700.0, y: 400.0, width: 64.0, height: 16.0),
        ]),
        (name: "Stairs", objects: [
            Poly(name: "ramp", x: 500.0, y: 416.0, points: [(0.0, 0.0), (96.0, 0.0), (96.0, -64.0)]),
        ]),
        (name: "Spawns", objects: [
            Marker(kind: "sanic", x: 200.0, y: 300.0),
            Marker(kind: "zombie", x: 1200.0, y: 380.0),
        ]),
    ],
)
"##;

fn load(settings: LevelSettings) -> Level {
    let data = LevelData::from_ron(LEVEL).expect("test level parses");
    Level::load(&data, Arc::new(ResourceRegistry::default()), settings).expect("test level loads")
}

fn load_source(source: &str) -> Level {
    let data = LevelData::from_ron(source).expect("test level parses");
    Level::load(&data, Arc::new(ResourceRegistry::default()), LevelSettings::default()).expect("test level loads")
}

/// The test level with an extra object group before the spawns
fn with_group(group: &str) -> String {
    let spawns = "        (name: \"Spawns\"";
    LEVEL.replace(spawns, &format!("        {}\n{}", group, spawns))
}

/// The test level with a thin stairs step right under the hero spawn
fn with_step() -> String {
    LEVEL.replace(
        "Poly(name: \"ramp\"",
        "Box(name: \"step\", x: 150.0, y: 350.0, width: 100.0, height: 16.0),\n            Poly(name: \"ramp\"",
    )
}

fn tag_of(level: &Level, name: &str) -> Option<CollisionTag> {
    level
        .shape(name)
        .and_then(|key| level.space().get_shape(key))
        .and_then(|shape| CollisionTag::from_collision_type(shape.collision_type))
}

fn hero_y(level: &Level) -> f32 {
    level
        .hero_actor()
        .and_then(|hero| hero.position(level.space()))
        .map(|p| p.y)
        .expect("hero alive")
}

/// Update until the hero is gone; checks that the dying update also removed it
fn run_until_hero_dies(level: &mut Level, limit: usize) -> Vec<&'static str> {
    let mut cues = Vec::new();
    for _ in 0..limit {
        let before = level.actors().len();
        level.update(DT);
        cues.extend(level.drain_cues().iter().map(|c| c.name));
        if level.hero().is_none() {
            assert_eq!(before, 3);
            assert_eq!(level.actors().len(), 2, "the dead hero is removed in the same update");
            return cues;
        }
    }
    panic!("hero survived {} updates", limit);
}

fn press(level: &mut Level, button: Button, edge: Edge) {
    level.handle_command(&Command::new(InputSource::Keyboard, button, edge));
}

fn run(level: &mut Level, updates: usize) {
    for _ in 0..updates {
        level.update(DT);
    }
}

#[test]
fn test_load_spawns_actors() {
    let mut level = load(LevelSettings::default());

    assert!(level.hero().is_some());
    assert_eq!(level.hero_spawns(), 1);
    assert_eq!(level.hero_spawn_point(), Vec2::new(200.0, 180.0));
    // hero, zombie and the lift
    assert_eq!(level.actors().len(), 3);
    assert_eq!(level.actors().iter().filter(|(_, a)| a.is_zombie()).count(), 1);
    assert_eq!(level.map_size(), Vec2::new(1280.0, 480.0));

    let cues: Vec<&str> = level.drain_cues().iter().map(|c| c.name).collect();
    assert_eq!(cues, vec!["sanic-spawn"]);
    assert!(level.drain_cues().is_empty());

    let following = level.viewports().get(0).and_then(|v| v.following());
    assert_eq!(following, level.hero());
}

#[test]
fn test_level_shapes_are_classified() {
    let level = load(LevelSettings::default());
    let space = level.space();

    assert_eq!(tag_of(&level, "floor"), Some(CollisionTag::Geometry));
    assert_eq!(tag_of(&level, "spikes"), Some(CollisionTag::Trap));
    assert_eq!(tag_of(&level, "ramp"), Some(CollisionTag::Stairs));
    assert_eq!(tag_of(&level, "moving_lift"), Some(CollisionTag::Geometry));

    let ramp = level.shape("ramp").and_then(|key| space.get_shape(key)).expect("ramp");
    assert_eq!(ramp.layers, CollisionLayer::FEET);
}

#[test]
fn test_missing_hero_marker_fails() {
    let source = LEVEL.replace("Marker(kind: \"sanic\", x: 200.0, y: 300.0),", "");
    let data = LevelData::from_ron(&source).expect("level parses");
    let result = Level::load(&data, Arc::new(ResourceRegistry::default()), LevelSettings::default());
    assert!(matches!(result, Err(LevelLoadError::Invalid(_))));
}

#[test]
fn test_hero_lands_and_takes_input() {
    let mut level = load(LevelSettings::default());
    run(&mut level, 120);

    let floor_top = 64.0;
    let hero = level.hero_actor().expect("hero alive");
    assert!(hero.core.grounded(), "hero rests on the floor");
    assert!(hero.core.state.contains(ActorState::IDLE));
    let y = hero.position(level.space()).expect("hero body").y;
    assert!(y > floor_top && y < 180.0, "hero body at {}", y);

    press(&mut level, Button::P1Right, Edge::Down);
    let hero = level.hero_actor().expect("hero alive");
    assert!(hero.core.state.contains(ActorState::MOVE));
    assert_eq!(hero.core.motor_rate(level.space()), Some(30.0));

    press(&mut level, Button::P1Right, Edge::Up);
    let hero = level.hero_actor().expect("hero alive");
    assert_eq!(hero.core.motor_rate(level.space()), Some(0.0));
}

#[test]
fn test_stairs_latch_follows_up_button() {
    let mut level = load(LevelSettings::default());
    press(&mut level, Button::P1Up, Edge::Down);
    let wants = |level: &Level| level.hero_actor().and_then(|a| a.hero_state()).map(|h| h.wants_stairs);
    assert_eq!(wants(&level), Some(true));
    press(&mut level, Button::P1Up, Edge::Held);
    assert_eq!(wants(&level), Some(true));
    press(&mut level, Button::P1Up, Edge::Up);
    assert_eq!(wants(&level), Some(false));
}

#[test]
fn test_dead_zombie_is_removed_after_the_pass() {
    let mut level = load(LevelSettings::default());
    let zombie = level
        .actors()
        .iter()
        .find(|(_, a)| a.is_zombie())
        .map(|(id, _)| id)
        .expect("zombie spawned");
    let shapes = level.space().shape_count();
    let bodies = level.space().body_count();

    if let Some(actor) = level.actor_mut(zombie) {
        actor.core.alive = false;
    }
    level.update(DT);

    assert!(level.actors().get(zombie).is_none());
    assert_eq!(level.actors().len(), 2);
    // body hitbox, feet and sensor
    assert_eq!(level.space().shape_count(), shapes - 3);
    assert_eq!(level.space().body_count(), bodies - 2);
    assert!(level.hero().is_some(), "the hero is untouched");
}

#[test]
fn test_hero_respawns_once_after_delay() {
    let settings = LevelSettings {
        respawn_delay: 1.0,
        ..LevelSettings::default()
    };
    let mut level = load(settings);
    let first = level.hero().expect("initial hero");
    level.drain_cues();

    if let Some(actor) = level.actor_mut(first) {
        actor.core.alive = false;
    }
    level.update(DT);
    assert_eq!(level.hero(), None);
    assert!(level.actors().get(first).is_none());
    assert_eq!(level.viewports().get(0).and_then(|v| v.following()), None);

    // removed at 1/64 s; the delay runs out on the 65th update
    run(&mut level, 63);
    assert_eq!(level.hero(), None);
    assert_eq!(level.hero_spawns(), 1);

    run(&mut level, 1);
    let second = level.hero().expect("hero respawned");
    assert_ne!(second, first);
    assert_eq!(level.hero_spawns(), 2);
    assert_eq!(level.viewports().get(0).and_then(|v| v.following()), Some(second));
    assert!(level.drain_cues().iter().any(|c| c.name == "sanic-spawn"));

    run(&mut level, 128);
    assert_eq!(level.hero_spawns(), 2, "a living hero is never respawned");
    assert_eq!(level.hero(), Some(second));
}

#[test]
fn test_draw_lists_follow_viewports() {
    let mut level = load(LevelSettings::default());
    level.resize(sanic_core::Rect::new(0.0, 96.0, 640.0, 384.0));
    run(&mut level, 4);

    let lists = level.draw();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].viewport, sanic_core::Rect::new(0.0, 96.0, 640.0, 384.0));
    assert!(!lists[0].quads.is_empty(), "tiles and sprites are drawn");
}

#[test]
fn test_latched_hero_stands_on_stairs() {
    let mut level = load_source(&with_step());
    assert_eq!(tag_of(&level, "step"), Some(CollisionTag::Stairs));

    press(&mut level, Button::P1Up, Edge::Down);
    run(&mut level, 120);

    assert_eq!(tag_of(&level, "step"), Some(CollisionTag::Geometry));
    let hero = level.hero_actor().expect("hero alive");
    assert!(hero.core.grounded());
    assert_eq!(hero.hero_state().map(|h| h.on_stairs.len()), Some(1));
    let y = hero_y(&level);
    assert!(y > 150.0, "hero stands on the step at {}", y);
}

#[test]
fn test_unlatched_hero_falls_through_stairs() {
    let mut level = load_source(&with_step());
    run(&mut level, 120);

    assert_eq!(tag_of(&level, "step"), Some(CollisionTag::Stairs));
    let hero = level.hero_actor().expect("hero alive");
    assert!(hero.core.grounded(), "hero lands on the floor instead");
    assert_eq!(hero.hero_state().map(|h| h.on_stairs.len()), Some(0));
    let y = hero_y(&level);
    assert!(y < 120.0, "hero passed through the step to {}", y);
}

#[test]
fn test_leaving_stairs_restores_them() {
    let mut level = load_source(&with_step());
    press(&mut level, Button::P1Up, Edge::Down);
    run(&mut level, 120);
    assert_eq!(tag_of(&level, "step"), Some(CollisionTag::Geometry));

    press(&mut level, Button::P1Up, Edge::Up);
    press(&mut level, Button::P1Action1, Edge::Down);
    press(&mut level, Button::P1Action1, Edge::Up);
    run(&mut level, 8);
    assert_eq!(tag_of(&level, "step"), Some(CollisionTag::Stairs), "reverted once the feet left it");
    let hero = level.hero_actor().expect("hero alive");
    assert_eq!(hero.hero_state().map(|h| h.on_stairs.len()), Some(0));

    // without the latch the way down goes through the step
    run(&mut level, 180);
    assert_eq!(tag_of(&level, "step"), Some(CollisionTag::Stairs));
    let y = hero_y(&level);
    assert!(y < 120.0, "hero back on the floor at {}", y);
}

#[test]
fn test_jump_clears_grounded() {
    let mut level = load(LevelSettings::default());
    run(&mut level, 120);
    assert!(level.hero_actor().expect("hero alive").core.grounded());

    press(&mut level, Button::P1Action1, Edge::Down);
    run(&mut level, 8);
    let hero = level.hero_actor().expect("hero alive");
    assert!(!hero.core.grounded(), "last ground contact separated");
    assert_eq!(hero.core.contact_count(), 0);
}

#[test]
fn test_hero_dies_on_trap() {
    let source = LEVEL.replace(
        "Box(name: \"spikes\", x: 700.0, y: 400.0,",
        "Box(name: \"spikes\", x: 150.0, y: 400.0,",
    );
    let mut level = load_source(&source);
    let first = level.hero().expect("initial hero");
    level.drain_cues();

    let cues = run_until_hero_dies(&mut level, 120);
    assert!(cues.contains(&"die"));
    assert!(level.actors().get(first).is_none());
    assert_eq!(level.viewports().get(0).and_then(|v| v.following()), None);

    let shapes = level.space().shape_count();
    let bodies = level.space().body_count();
    run(&mut level, 64);
    assert_eq!(level.hero(), None);
    assert_eq!(level.actors().len(), 2);
    assert_eq!(level.space().shape_count(), shapes, "no second teardown");
    assert_eq!(level.space().body_count(), bodies);
    assert!(!level.drain_cues().iter().any(|c| c.name == "die"));
}

#[test]
fn test_hero_dies_on_boundary() {
    let source = with_group(
        "(name: \"Boundaries\", objects: [Box(name: \"pit\", x: 150.0, y: 400.0, width: 100.0, height: 16.0)]),",
    );
    let mut level = load_source(&source);
    assert_eq!(tag_of(&level, "pit"), Some(CollisionTag::Boundary));
    level.drain_cues();

    let cues = run_until_hero_dies(&mut level, 120);
    assert_eq!(cues.iter().filter(|c| **c == "die").count(), 1);
    let shapes = level.space().shape_count();
    run(&mut level, 16);
    assert_eq!(level.space().shape_count(), shapes);
}

#[test]
fn test_hero_dies_on_enemy_sensor() {
    let source = LEVEL.replace(
        "Marker(kind: \"zombie\", x: 1200.0, y: 380.0)",
        "Marker(kind: \"zombie\", x: 300.0, y: 380.0)",
    );
    let mut level = load_source(&source);
    level.drain_cues();

    let cues = run_until_hero_dies(&mut level, 600);
    assert!(cues.contains(&"die"));
    // the zombie is not hurt by the hero
    assert_eq!(level.actors().iter().filter(|(_, a)| a.is_zombie()).count(), 1);
}

#[test]
fn test_zombie_dies_on_trap() {
    let source = LEVEL.replace(
        "Marker(kind: \"zombie\", x: 1200.0, y: 380.0)",
        "Marker(kind: \"zombie\", x: 730.0, y: 380.0)",
    );
    let mut level = load_source(&source);
    let shapes = level.space().shape_count();
    level.drain_cues();

    run(&mut level, 30);
    assert_eq!(level.actors().iter().filter(|(_, a)| a.is_zombie()).count(), 0);
    assert_eq!(level.actors().len(), 2);
    // body hitbox, feet and sensor
    assert_eq!(level.space().shape_count(), shapes - 3);
    assert!(level.hero().is_some());
    assert!(level.drain_cues().iter().any(|c| c.name == "die"));
}

#[test]
fn test_zombie_dies_on_boundary() {
    let source = with_group(
        "(name: \"Boundaries\", objects: [Box(name: \"edge\", x: 1160.0, y: 400.0, width: 96.0, height: 16.0)]),",
    );
    let mut level = load_source(&source);

    run(&mut level, 30);
    assert_eq!(level.actors().iter().filter(|(_, a)| a.is_zombie()).count(), 0);
    assert_eq!(level.actors().len(), 2);
}
