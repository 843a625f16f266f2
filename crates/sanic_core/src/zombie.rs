//! Zombie behaviour
//!
//! A zombie is an upright rig tagged as geometry, so the hero can stand on
//! it, with a slightly taller sensor box tagged as the enemy hazard. It walks
//! in its facing direction and turns around at walls.

use sanic_math::Vec2;
use sanic_physics::{Geometry, Shape, ShapeKey};

use crate::actor::{attach, build_upright, Actor, ActorContext, Behavior, BuildError, Facing, PhysicsActor, Tuning};
use crate::actor_set::ActorId;
use crate::handlers;
use crate::resources::ResourceRegistry;
use crate::sprite::Sprite;
use crate::stage::Space;
use crate::tags::CollisionTag;

pub const ZOMBIE_SIZE: Vec2 = Vec2::new(32.0, 47.0);
pub const SHEET: &str = "zombie";

/// Sensor height relative to the hitbox
const SENSOR_SCALE: f32 = 1.05;

#[derive(Debug)]
pub struct ZombieState {
    pub sensor: ShapeKey,
    /// Set by the wall handler, consumed by the next update
    turned: bool,
}

impl ZombieState {
    pub fn turn(&mut self) {
        self.turned = true;
    }

    pub fn has_turned(&self) -> bool {
        self.turned
    }
}

fn sensor_geometry(size: Vec2) -> Geometry {
    let hw = size.x * 0.5;
    let hh = size.y * SENSOR_SCALE * 0.5;
    Geometry::poly(
        &[
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ],
        Vec2::new(0.0, -(SENSOR_SCALE - 1.0) * size.y),
    )
}

/// Build a zombie with its body at `position`
pub fn build(
    space: &mut Space,
    id: ActorId,
    position: Vec2,
    tuning: Tuning,
    registry: &ResourceRegistry,
) -> Result<Actor, BuildError> {
    handlers::register_enemy(space);

    let mut core = build_upright(space, id, ZOMBIE_SIZE, position, CollisionTag::Geometry, tuning)?;
    core.facing = Facing::Left;

    let sensor = attach(
        space,
        Shape::new(core.body.body, sensor_geometry(ZOMBIE_SIZE))
            .with_collision_type(CollisionTag::Enemy.collision_type())
            .with_sensor(true)
            .with_user_data(id.to_user_data()),
    )?;

    let sprite = Sprite::animated(core.body.shape, registry.sheet_or_empty(SHEET), "walking");
    core.push_sprite(sprite, true);
    core.set_flip(true);

    log::debug!("Spawned zombie {:?} at ({:.0}, {:.0})", id, position.x, position.y);
    Ok(Actor::new(id, core, Behavior::Zombie(ZombieState { sensor, turned: false })))
}

/// Keep walking; restart the motor after a turn or when it has stalled
pub(crate) fn update(core: &mut PhysicsActor, zombie: &mut ZombieState, ctx: &mut ActorContext<'_>) {
    let stalled = core.motor_rate(ctx.space).is_some_and(|rate| rate == 0.0);
    if stalled || zombie.turned {
        zombie.turned = false;
        let facing = core.facing;
        core.accelerate(ctx.space, facing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_set::ActorSet;
    use crate::stage::SoundCue;

    fn tuning() -> Tuning {
        Tuning {
            move_power: 20000.0,
            move_speed: 6.0,
            brake_power: f32::INFINITY,
            jump_power: 3000.0,
            air_move_speed: 0.0,
        }
    }

    fn spawn(space: &mut Space) -> Actor {
        let mut ids: ActorSet<()> = ActorSet::new();
        let id = ids.add(());
        build(space, id, Vec2::new(200.0, 80.0), tuning(), &ResourceRegistry::default()).expect("zombie builds")
    }

    #[test]
    fn test_sensor_wraps_hitbox() {
        let mut space = Space::new();
        let zombie = spawn(&mut space);
        let Behavior::Zombie(state) = &zombie.behavior else {
            panic!("not a zombie");
        };
        let sensor = space.get_shape(state.sensor).expect("sensor");
        assert!(sensor.sensor);
        assert_eq!(sensor.collision_type, CollisionTag::Enemy.collision_type());

        let body = space.get_shape(zombie.core.body.shape).expect("body");
        assert_eq!(body.collision_type, CollisionTag::Geometry.collision_type());

        let bbox = space.shape_bounding_box(state.sensor).expect("bbox");
        assert!((bbox.width - 32.0).abs() < 1e-3);
        assert!((bbox.height - 47.0 * 1.05).abs() < 1e-3);
    }

    #[test]
    fn test_first_update_walks_left() {
        let mut space = Space::new();
        let mut zombie = spawn(&mut space);
        assert_eq!(zombie.core.facing, Facing::Left);
        assert_eq!(zombie.core.motor_rate(&space), Some(0.0));

        let mut cues: Vec<SoundCue> = Vec::new();
        let mut ctx = ActorContext {
            space: &mut space,
            cues: &mut cues,
        };
        zombie.update(0.01, &mut ctx);
        assert_eq!(zombie.core.motor_rate(&space), Some(-6.0));
    }

    #[test]
    fn test_turn_reverses_motor() {
        let mut space = Space::new();
        let mut zombie = spawn(&mut space);
        let mut cues: Vec<SoundCue> = Vec::new();
        {
            let mut ctx = ActorContext {
                space: &mut space,
                cues: &mut cues,
            };
            zombie.update(0.01, &mut ctx);
        }

        zombie.core.facing = zombie.core.facing.reversed();
        if let Behavior::Zombie(state) = &mut zombie.behavior {
            state.turn();
        }
        let mut ctx = ActorContext {
            space: &mut space,
            cues: &mut cues,
        };
        zombie.update(0.01, &mut ctx);
        assert_eq!(zombie.core.motor_rate(&space), Some(6.0));
        assert!(!zombie.sprites()[0].flip);
    }

    #[test]
    fn test_die_event_marks_dead() {
        let mut space = Space::new();
        let mut zombie = spawn(&mut space);
        let mut cues = Vec::new();
        let mut ctx = ActorContext {
            space: &mut space,
            cues: &mut cues,
        };
        zombie.process2(crate::actor::InternalEvent::Die, &mut ctx);
        assert!(!zombie.is_alive());
        assert_eq!(cues, vec![SoundCue::new("die")]);
    }
}
