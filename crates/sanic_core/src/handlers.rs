//! Collision callbacks between gameplay tags
//!
//! Callbacks are plain function pointers over [`Stage`]; actors are found
//! through the id stored in each shape's user data.

use sanic_physics::{Arbiter, CollisionHandler};

use crate::actor::{Actor, Behavior};
use crate::actor_set::ActorId;
use crate::stage::{Space, Stage};
use crate::tags::CollisionTag;

/// Contact normals steeper than this (in x) count as walls
const WALL_NORMAL: f32 = 0.7;

const HERO_HAZARDS: [CollisionTag; 3] = [CollisionTag::Boundary, CollisionTag::Trap, CollisionTag::Enemy];
const ENEMY_HAZARDS: [CollisionTag; 2] = [CollisionTag::Boundary, CollisionTag::Trap];

fn actor_mut(stage: &mut Stage, user_data: u64) -> Option<&mut Actor> {
    stage.actors.get_mut(ActorId::from_user_data(user_data))
}

/// Install the hero's handlers; replaces any previous registration
pub fn register_hero(space: &mut Space) {
    let hero = CollisionTag::Hero.collision_type();
    for hazard in HERO_HAZARDS {
        space.add_collision_handler(
            hero,
            hazard.collision_type(),
            CollisionHandler::new().with_pre_solve(hero_hazard),
        );
    }
    space.add_collision_handler(
        hero,
        CollisionTag::Geometry.collision_type(),
        CollisionHandler::new()
            .with_post_solve(hero_grounded)
            .with_separate(hero_ungrounded),
    );
    space.add_collision_handler(
        hero,
        CollisionTag::Stairs.collision_type(),
        CollisionHandler::new()
            .with_pre_solve(hero_stairs)
            .with_separate(hero_stairs_separate),
    );
}

pub fn unregister_hero(space: &mut Space) {
    let hero = CollisionTag::Hero.collision_type();
    for tag in HERO_HAZARDS.into_iter().chain([CollisionTag::Geometry, CollisionTag::Stairs]) {
        space.remove_collision_handler(hero, tag.collision_type());
    }
}

/// Install the enemy handlers once per space
pub fn register_enemy(space: &mut Space) {
    let enemy = CollisionTag::Enemy.collision_type();
    if space.has_collision_handler(enemy, CollisionTag::Trap.collision_type()) {
        return;
    }
    for hazard in ENEMY_HAZARDS {
        space.add_collision_handler(
            enemy,
            hazard.collision_type(),
            CollisionHandler::new().with_pre_solve(enemy_hazard),
        );
    }
    let geometry = CollisionTag::Geometry.collision_type();
    space.add_collision_handler(geometry, geometry, CollisionHandler::new().with_begin(zombie_wall));
}

fn hero_hazard(stage: &mut Stage, arb: &mut Arbiter) -> bool {
    let hazard = CollisionTag::from_collision_type(arb.type_b);
    match hazard {
        Some(CollisionTag::Trap) | Some(CollisionTag::Boundary) => {}
        Some(CollisionTag::Enemy) => {
            // a dying zombie's sensor is harmless
            let enemy_alive = stage
                .actors
                .get(ActorId::from_user_data(arb.user_data_b))
                .is_some_and(Actor::is_alive);
            if !enemy_alive {
                return true;
            }
        }
        _ => return true,
    }

    let Stage { actors, cues } = stage;
    if let Some(hero) = actors.get_mut(ActorId::from_user_data(arb.user_data_a)) {
        if hero.is_alive() {
            log::info!("Hero hit {:?}", hazard);
        }
        hero.core.mark_dead(cues);
    }
    false
}

fn hero_grounded(stage: &mut Stage, arb: &mut Arbiter) {
    if let Some(actor) = actor_mut(stage, arb.user_data_a) {
        actor.core.touch_ground(arb.shape_a, arb.shape_b);
        if let Some(hero) = actor.hero_state_mut() {
            hero.air_move = 0.0;
        }
    }
}

fn hero_ungrounded(stage: &mut Stage, arb: &mut Arbiter) {
    let Some(actor) = actor_mut(stage, arb.user_data_a) else {
        return;
    };
    actor.core.leave_ground(arb.shape_a, arb.shape_b);
    let Some(hero) = actor.hero_state_mut() else {
        return;
    };
    hero.air_move = 0.0;
    // converted stairs separate through the geometry handler
    if hero.leave_stairs(arb.shape_b) {
        arb.retag(arb.shape_b, CollisionTag::Stairs.collision_type());
        log::debug!("Left stairs {:?}", arb.shape_b);
    }
}

/// Stairs are only solid while the hero asks for them
fn hero_stairs(stage: &mut Stage, arb: &mut Arbiter) -> bool {
    let Some(hero) = actor_mut(stage, arb.user_data_a).and_then(Actor::hero_state_mut) else {
        return false;
    };
    if !hero.wants_stairs {
        return false;
    }

    let stairs = arb.shape_b;
    if !hero.on_stairs.contains(&stairs) {
        hero.on_stairs.push(stairs);
    }
    arb.retag(stairs, CollisionTag::Geometry.collision_type());
    log::debug!("Climbing stairs {:?}", stairs);
    true
}

fn hero_stairs_separate(stage: &mut Stage, arb: &mut Arbiter) {
    let Some(actor) = actor_mut(stage, arb.user_data_a) else {
        return;
    };
    actor.core.leave_ground(arb.shape_a, arb.shape_b);
    if let Some(hero) = actor.hero_state_mut() {
        hero.leave_stairs(arb.shape_b);
    }
}

fn enemy_hazard(stage: &mut Stage, arb: &mut Arbiter) -> bool {
    let Stage { actors, cues } = stage;
    if let Some(enemy) = actors.get_mut(ActorId::from_user_data(arb.user_data_a)) {
        if enemy.is_alive() {
            log::debug!("Enemy {:?} hit {:?}", enemy.id, CollisionTag::from_collision_type(arb.type_b));
        }
        enemy.core.mark_dead(cues);
    }
    false
}

/// Turn zombies around when they walk into a wall
fn zombie_wall(stage: &mut Stage, arb: &mut Arbiter) -> bool {
    if arb.normal.x.abs() < WALL_NORMAL {
        return true;
    }
    for user_data in [arb.user_data_a, arb.user_data_b] {
        if let Some(actor) = actor_mut(stage, user_data) {
            if let Behavior::Zombie(zombie) = &mut actor.behavior {
                actor.core.facing = actor.core.facing.reversed();
                zombie.turn();
            }
        }
    }
    true
}
