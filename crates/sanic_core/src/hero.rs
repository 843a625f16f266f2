//! Hero behaviour
//!
//! The hero is an upright rig (hitbox body riding a motor-driven wheel) plus
//! two cosmetic legs. Input arrives through [`process`], physics-derived
//! facts through [`process2`], and [`update`] turns velocity into
//! slide/stop transitions every tick.
//!
//! Spinning swaps the hitbox for a tiny circle and hangs a heavy flywheel off
//! the body so the ball keeps its momentum. Leaving the spin rebuilds the
//! hitbox and re-seats the body on the feet analytically, so the feet never
//! move across the swap.

use std::collections::HashSet;

use sanic_input::{Button, Command, Edge};
use sanic_math::Vec2;
use sanic_physics::{
    Body, BodyKey, CollisionLayer, ConstraintKey, ConstraintKind, Geometry, PivotJoint, Shape, ShapeKey,
};

use crate::actor::{
    attach, build_upright, feet_to_body, hitbox_geometry, link, Actor, ActorContext, ActorState, Behavior,
    BodyPart, BuildError, Facing, InternalEvent, Leg, PhysicsActor, Tuning,
};
use crate::actor_set::ActorId;
use crate::handlers;
use crate::resources::ResourceRegistry;
use crate::sprite::Sprite;
use crate::stage::{SoundCue, Space};
use crate::tags::CollisionTag;

pub const HERO_SIZE: Vec2 = Vec2::new(50.0, 60.0);
pub const SHEET: &str = "sanic";
pub const LEG_SHEET: &str = "leg";

/// Horizontal speed that counts as running
pub const RUNNING_SPEED: f32 = 100.0;
/// Below this the hero is considered stopped
pub const MOVING_THRESHOLD: f32 = 0.15;
/// Speed that maps to full animation rate
pub const REFERENCE_SPEED: f32 = 700.0;
const ANIMATION_BASE: f32 = 0.35;
const ANIMATION_MAX: f32 = 1.2;

const SPIN_RADIUS: f32 = 1.0;
const FLYWHEEL_MASS: f32 = 20.0;
const FLYWHEEL_BOOST: f32 = 1.7;
const SPIN_FEET_FRICTION: f32 = 0.6;

const LEG_SIZE: Vec2 = Vec2::new(10.0, 30.0);
const LEG_MASS: f32 = 0.01;
const LEG_LIFT: f32 = 5.0;
const LEG_PIVOTS: [Vec2; 2] = [Vec2::new(-5.0, -10.0), Vec2::new(5.0, -10.0)];

#[derive(Debug, Clone, Copy)]
struct Flywheel {
    body: BodyKey,
    joint: ConstraintKey,
}

/// Hero-only state
#[derive(Debug)]
pub struct HeroState {
    /// Latched while UP is held
    pub wants_stairs: bool,
    /// Stairs shapes currently reclassified as geometry
    pub on_stairs: Vec<ShapeKey>,
    /// Air steering direction, -1, 0 or 1
    pub air_move: f32,
    pub jump_modifier: f32,
    /// Buttons whose DOWN/HELD edges are dropped until released
    ignore: HashSet<Button>,
    flywheel: Option<Flywheel>,
}

impl Default for HeroState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeroState {
    pub fn new() -> Self {
        Self {
            wants_stairs: false,
            on_stairs: Vec::new(),
            air_move: 0.0,
            jump_modifier: 1.0,
            ignore: HashSet::new(),
            flywheel: None,
        }
    }

    pub fn is_ignoring(&self, button: Button) -> bool {
        self.ignore.contains(&button)
    }

    pub fn is_spinning(&self) -> bool {
        self.flywheel.is_some()
    }

    /// Stop tracking a converted stairs shape; true if it was tracked
    pub fn leave_stairs(&mut self, shape: ShapeKey) -> bool {
        match self.on_stairs.iter().position(|s| *s == shape) {
            Some(index) => {
                self.on_stairs.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

/// Animation rate from horizontal speed
///
/// A zero reference speed yields the neutral multiplier.
pub fn animation_speed(speed: f32, reference: f32) -> f32 {
    if reference == 0.0 {
        return 1.0;
    }
    (speed / reference + ANIMATION_BASE).min(ANIMATION_MAX)
}

/// Build the hero with its body at `position`
pub fn build(
    space: &mut Space,
    id: ActorId,
    position: Vec2,
    tuning: Tuning,
    registry: &ResourceRegistry,
) -> Result<Actor, BuildError> {
    log::info!("Building hero at ({:.0}, {:.0})", position.x, position.y);
    handlers::register_hero(space);

    let mut core = build_upright(space, id, HERO_SIZE, position, CollisionTag::Hero, tuning)?;
    let feet = core
        .feet
        .ok_or_else(|| BuildError("hero rig has no feet".to_string()))?;
    let feet_position = core
        .feet_position(space)
        .ok_or_else(|| BuildError("hero feet body missing".to_string()))?;

    let leg_sheet = registry.sheet_or_empty(LEG_SHEET);
    for pivot in LEG_PIVOTS {
        let leg = space.add_body(Body::new(LEG_MASS, f32::INFINITY).with_position(feet_position + Vec2::new(0.0, LEG_LIFT)));
        let shape = attach(
            space,
            Shape::new(leg, Geometry::boxed(LEG_SIZE.x, LEG_SIZE.y))
                .with_layers(CollisionLayer::empty())
                .with_user_data(id.to_user_data()),
        )?;
        let joint = match (space.get_body(leg), space.get_body(feet.body)) {
            (Some(a), Some(b)) => PivotJoint::from_world_pivot(a, b, position + pivot),
            _ => return Err(BuildError("leg bodies missing".to_string())),
        };
        let joint = link(space, leg, feet.body, ConstraintKind::Pivot(joint))?;
        core.legs.push(Leg {
            part: BodyPart { body: leg, shape },
            joint,
        });
        core.push_sprite(Sprite::animated(shape, leg_sheet.clone(), "idle"), false);
    }

    let body_sprite = Sprite::animated(core.body.shape, registry.sheet_or_empty(SHEET), "idle");
    core.push_sprite(body_sprite, true);

    Ok(Actor::new(id, core, Behavior::Hero(HeroState::new())))
}

/// Player input
pub(crate) fn process(core: &mut PhysicsActor, hero: &mut HeroState, cmd: &Command, ctx: &mut ActorContext<'_>) {
    let button = cmd.button;

    // an ignored button stays ignored until its UP edge
    if cmd.edge == Edge::Up {
        hero.ignore.remove(&button);
    } else if hero.ignore.contains(&button) {
        return;
    }

    if button == Button::P1Up {
        match cmd.edge {
            Edge::Down => hero.wants_stairs = true,
            Edge::Up => hero.wants_stairs = false,
            Edge::Held => {}
        }
    }

    if cmd.is_pressed() {
        if core.grounded() {
            match button {
                Button::P1Left => {
                    core.facing = Facing::Left;
                    process2(core, hero, InternalEvent::Move, ctx);
                }
                Button::P1Right => {
                    core.facing = Facing::Right;
                    process2(core, hero, InternalEvent::Move, ctx);
                }
                Button::P1Down => {
                    hero.ignore.insert(Button::P1Down);
                    process2(core, hero, InternalEvent::Crouch, ctx);
                }
                Button::P1Action1 => {
                    hero.ignore.insert(Button::P1Action1);
                    process2(core, hero, InternalEvent::Jump, ctx);
                    if core.state.contains(ActorState::JUMPING) {
                        core.jump(ctx.space, hero.jump_modifier);
                    }
                }
                _ => {}
            }
        } else {
            match button {
                Button::P1Left => hero.air_move = -1.0,
                Button::P1Right => hero.air_move = 1.0,
                _ => {}
            }
        }
    } else {
        match button {
            Button::P1Left | Button::P1Right => process2(core, hero, InternalEvent::Brake, ctx),
            Button::P1Down if core.state.contains(ActorState::CROUCHING) => {
                core.state.remove(ActorState::CROUCHING);
                process2(core, hero, InternalEvent::Stop, ctx);
            }
            _ => {}
        }
    }
}

/// Internal state machine
pub(crate) fn process2(
    core: &mut PhysicsActor,
    hero: &mut HeroState,
    event: InternalEvent,
    ctx: &mut ActorContext<'_>,
) {
    let velocity = core.velocity(ctx.space).unwrap_or(Vec2::ZERO);
    let running = velocity.x.abs() >= RUNNING_SPEED;
    let grounded = core.grounded();

    log::trace!("hero {:?} in {:?}", event, core.state);

    match event {
        InternalEvent::Hurt => {
            core.play("hurt");
            ctx.cues.push(SoundCue::restarting("hurt"));
        }
        InternalEvent::Spin => {
            core.state.remove(ActorState::MOVE);
            if !core.state.contains(ActorState::SPIN) {
                make_ball(core, hero, ctx.space);
                core.state.insert(ActorState::SPIN);
                core.play("spinning");
            }
        }
        InternalEvent::Crouch => {
            if running {
                process2(core, hero, InternalEvent::Spin, ctx);
            } else if core.state.contains(ActorState::IDLE) {
                core.state.remove(ActorState::IDLE);
                core.state.insert(ActorState::CROUCHING);
                core.play("crouching");
            }
        }
        InternalEvent::Slide => {
            if core.state.contains(ActorState::IDLE) {
                core.state.remove(ActorState::IDLE);
                core.state.insert(ActorState::SLIDE);
                core.play("running");
            }
        }
        InternalEvent::Stop => {
            if core.state.contains(ActorState::SPIN) {
                core.state.remove(ActorState::SPIN);
                unmake_ball(core, hero, ctx.space);
            }
            core.state
                .remove(ActorState::MOVE | ActorState::BRAKE | ActorState::SLIDE | ActorState::CROUCHING);
            core.state.insert(ActorState::IDLE);
            core.play("idle");
            if let Some(feet) = core.feet.and_then(|f| ctx.space.get_body_mut(f.body)) {
                feet.angle = std::f32::consts::PI;
            }
        }
        InternalEvent::Brake => {
            core.state.insert(ActorState::BRAKE);
            core.brake(ctx.space);
        }
        InternalEvent::Move => {
            let facing = core.facing;
            if core.state.contains(ActorState::SPIN) {
                core.accelerate(ctx.space, facing);
            } else if grounded {
                if core.state.contains(ActorState::IDLE) {
                    core.state.remove(ActorState::IDLE);
                    core.state.insert(ActorState::MOVE);
                    core.play("running");
                }
                if core.state.intersects(ActorState::MOVE | ActorState::SLIDE) {
                    core.accelerate(ctx.space, facing);
                }
            }
        }
        InternalEvent::Jump => {
            if grounded {
                core.state.insert(ActorState::JUMPING);
                core.play("jumping");
            }
        }
        InternalEvent::Landed => {
            if core.state.contains(ActorState::JUMPING) {
                core.state.remove(ActorState::JUMPING);
                let next = if core.state.contains(ActorState::SPIN) {
                    "spinning"
                } else if velocity.x.abs() > MOVING_THRESHOLD {
                    "running"
                } else {
                    "idle"
                };
                core.play(next);
            }
        }
        InternalEvent::Fall | InternalEvent::Idle => {}
        InternalEvent::Die => core.mark_dead(ctx.cues),
    }
}

/// Per-tick velocity driven transitions
pub(crate) fn update(core: &mut PhysicsActor, hero: &mut HeroState, dt: f32, ctx: &mut ActorContext<'_>) {
    if let Some(event) = core.upright_tick(dt) {
        process2(core, hero, event, ctx);
    }

    if hero.air_move != 0.0 {
        let target = hero.air_move * core.tuning.air_move_speed;
        if let Some(body) = ctx.space.get_body_mut(core.body.body) {
            if body.velocity.x.abs() < target.abs() {
                body.velocity.x = target;
            }
        }
    }

    let speed = core.velocity(ctx.space).map(|v| v.x.abs()).unwrap_or(0.0);
    core.set_speed_modifier(animation_speed(speed, REFERENCE_SPEED));

    if speed > MOVING_THRESHOLD {
        process2(core, hero, InternalEvent::Slide, ctx);
    }
    if !core.state.contains(ActorState::IDLE) && speed < MOVING_THRESHOLD {
        process2(core, hero, InternalEvent::Stop, ctx);
    }
}

/// Hero-specific teardown; the shared rig is removed by the caller
pub(crate) fn teardown(hero: &mut HeroState, space: &mut Space) {
    drop_from_stairs(hero, space);
    handlers::unregister_hero(space);
    if let Some(flywheel) = hero.flywheel.take() {
        space.remove_body(flywheel.body);
    }
}

/// Give converted stairs shapes their tag back
fn drop_from_stairs(hero: &mut HeroState, space: &mut Space) {
    for stairs in hero.on_stairs.drain(..) {
        if let Some(shape) = space.get_shape_mut(stairs) {
            shape.collision_type = CollisionTag::Stairs.collision_type();
        }
    }
}

/// Swap the body shape, keeping every other shape property
fn swap_body_shape(core: &mut PhysicsActor, space: &mut Space, geometry: Geometry) -> bool {
    let old_key = core.body.shape;
    let Some(old) = space.get_shape(old_key).cloned() else {
        return false;
    };
    let Some(new_key) = space.add_shape(Shape { geometry, ..old }) else {
        return false;
    };
    space.remove_shape(old_key);
    core.body.shape = new_key;
    core.forget_shapes(&[old_key]);
    if let Some(sprite) = core.sprite_mut() {
        sprite.shape = new_key;
    }
    true
}

fn set_feet_friction(core: &PhysicsActor, space: &mut Space, friction: f32) {
    if let Some(shape) = core.feet.and_then(|f| space.get_shape_mut(f.shape)) {
        shape.material.friction = friction;
    }
}

fn make_ball(core: &mut PhysicsActor, hero: &mut HeroState, space: &mut Space) {
    if !swap_body_shape(core, space, Geometry::circle(SPIN_RADIUS, Vec2::ZERO)) {
        return;
    }
    set_feet_friction(core, space, SPIN_FEET_FRICTION);

    let Some((position, velocity)) = space.get_body(core.body.body).map(|b| (b.position, b.velocity)) else {
        return;
    };
    let weight = space.add_body(
        Body::new(FLYWHEEL_MASS, f32::INFINITY)
            .with_position(position)
            .with_velocity(velocity * FLYWHEEL_BOOST),
    );
    match link(space, weight, core.body.body, ConstraintKind::Pivot(PivotJoint::new(Vec2::ZERO, Vec2::ZERO))) {
        Ok(joint) => hero.flywheel = Some(Flywheel { body: weight, joint }),
        Err(err) => {
            log::warn!("{}", err);
            space.remove_body(weight);
        }
    }

    drop_from_stairs(hero, space);
}

fn unmake_ball(core: &mut PhysicsActor, hero: &mut HeroState, space: &mut Space) {
    swap_body_shape(core, space, hitbox_geometry(HERO_SIZE.x, HERO_SIZE.y));
    set_feet_friction(core, space, f32::INFINITY);

    // re-seat the body on the feet; the feet themselves stay put
    if let Some(feet) = core.feet {
        let radius = match space.get_shape(feet.shape).map(|s| &s.geometry) {
            Some(Geometry::Circle { radius, .. }) => Some(*radius),
            _ => None,
        };
        let feet_position = space.get_body(feet.body).map(|b| b.position);
        if let (Some(radius), Some(feet_position)) = (radius, feet_position) {
            if let Some(body) = space.get_body_mut(core.body.body) {
                body.position = feet_position + feet_to_body(radius);
            }
        }
    }

    if let Some(flywheel) = hero.flywheel.take() {
        space.remove_constraint(flywheel.joint);
        space.remove_body(flywheel.body);
    }
}
