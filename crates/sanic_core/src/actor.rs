//! Actor model
//!
//! An [`Actor`] is a physics-backed entity: a shared [`PhysicsActor`] record
//! (owned bodies, shapes, joints, sprites, state set) composed with a
//! per-archetype [`Behavior`]. Actors mutate physics state only from their
//! own `process`/`process2`/`update`/`kill` methods and contact callbacks.

use std::collections::HashSet;
use std::fmt;

use bitflags::bitflags;
use sanic_input::Command;
use sanic_math::Vec2;
use sanic_physics::{
    moment_for_circle, Body, BodyKey, CollisionLayer, Constraint, ConstraintKey, ConstraintKind, Geometry,
    PivotJoint, Shape, ShapeKey, SimpleMotor,
};
use serde::{Deserialize, Serialize};

use crate::actor_set::ActorId;
use crate::hero::{self, HeroState};
use crate::sprite::Sprite;
use crate::stage::{SoundCue, Space};
use crate::tags::CollisionTag;
use crate::zombie::{self, ZombieState};

/// Seconds between landed/fall checks
const DEBOUNCE_INTERVAL: f32 = 0.05;
/// Feet radius as a fraction of body width
const FEET_RADIUS_FACTOR: f32 = 0.45;
/// Feet centre sits this many feet radii below the body centre
const FEET_DROP_FACTOR: f32 = 0.7;
const BODY_MASS: f32 = 10.0;
const FEET_MASS: f32 = 2.0;

bitflags! {
    /// Concurrent behaviour states of an actor
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ActorState: u16 {
        const IDLE = 1 << 0;
        const MOVE = 1 << 1;
        const SLIDE = 1 << 2;
        const CROUCHING = 1 << 3;
        const SPIN = 1 << 4;
        const JUMPING = 1 << 5;
        const HURT = 1 << 6;
        const BRAKE = 1 << 7;
    }
}

/// Horizontal facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Internal events fed to `process2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalEvent {
    /// Wants to run, or air move
    Move,
    /// Pushed or sliding
    Slide,
    /// Came to a stop
    Stop,
    /// Wants to stop
    Brake,
    /// Touching solid ground
    Landed,
    /// Crouch if able, spin if running
    Crouch,
    Spin,
    Jump,
    Hurt,
    Fall,
    Idle,
    Die,
}

/// Movement tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Motor force limit while accelerating
    pub move_power: f32,
    /// Motor rate (rad/s) while accelerating
    pub move_speed: f32,
    /// Motor force limit while braking
    pub brake_power: f32,
    /// Jump impulse
    pub jump_power: f32,
    /// Minimum horizontal speed while steering in the air
    pub air_move_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            move_power: 1.0,
            move_speed: 1.0,
            brake_power: f32::INFINITY,
            jump_power: 1.0,
            air_move_speed: 0.0,
        }
    }
}

/// A body and the shape that represents it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPart {
    pub body: BodyKey,
    pub shape: ShapeKey,
}

/// Cosmetic body pinned to the feet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub part: BodyPart,
    pub joint: ConstraintKey,
}

/// Failure while allocating an actor's physics objects
#[derive(Debug, Clone, PartialEq)]
pub struct BuildError(pub String);

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor build failed: {}", self.0)
    }
}

impl std::error::Error for BuildError {}

/// Borrowed world state an actor works against
pub struct ActorContext<'a> {
    pub space: &'a mut Space,
    pub cues: &'a mut Vec<SoundCue>,
}

/// Physics handles and shared state of an actor
#[derive(Debug)]
pub struct PhysicsActor {
    pub alive: bool,
    pub state: ActorState,
    pub facing: Facing,
    pub tuning: Tuning,
    pub body: BodyPart,
    pub feet: Option<BodyPart>,
    pub motor: Option<ConstraintKey>,
    pub pivot: Option<ConstraintKey>,
    pub legs: Vec<Leg>,
    pub sprites: Vec<Sprite>,
    /// Index of the sprite tracking the primary body shape
    primary: usize,
    /// Active (own shape, geometry shape) contacts
    contacts: HashSet<(ShapeKey, ShapeKey)>,
    debounce: f32,
}

impl PhysicsActor {
    pub fn new(body: BodyPart, tuning: Tuning) -> Self {
        Self {
            alive: true,
            state: ActorState::empty(),
            facing: Facing::Right,
            tuning,
            body,
            feet: None,
            motor: None,
            pivot: None,
            legs: Vec::new(),
            sprites: Vec::new(),
            primary: 0,
            contacts: HashSet::new(),
            debounce: 0.0,
        }
    }

    /// Add a sprite; the one marked primary follows body shape swaps
    pub fn push_sprite(&mut self, sprite: Sprite, primary: bool) {
        if primary {
            self.primary = self.sprites.len();
        }
        self.sprites.push(sprite);
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprites.get(self.primary)
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        self.sprites.get_mut(self.primary)
    }

    /// Play an animation on the primary sprite
    pub fn play(&mut self, name: &str) {
        if let Some(sprite) = self.sprite_mut() {
            sprite.play(name);
        }
    }

    pub fn set_flip(&mut self, flip: bool) {
        for sprite in &mut self.sprites {
            sprite.flip = flip;
        }
    }

    pub fn set_speed_modifier(&mut self, modifier: f32) {
        for sprite in &mut self.sprites {
            sprite.speed_modifier = modifier;
        }
    }

    pub fn position(&self, space: &Space) -> Option<Vec2> {
        space.get_body(self.body.body).map(|b| b.position)
    }

    pub fn velocity(&self, space: &Space) -> Option<Vec2> {
        space.get_body(self.body.body).map(|b| b.velocity)
    }

    pub fn feet_position(&self, space: &Space) -> Option<Vec2> {
        let feet = self.feet?;
        space.get_body(feet.body).map(|b| b.position)
    }

    /// In contact with at least one geometry shape
    pub fn grounded(&self) -> bool {
        !self.contacts.is_empty()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn touch_ground(&mut self, own: ShapeKey, other: ShapeKey) {
        self.contacts.insert((own, other));
    }

    pub fn leave_ground(&mut self, own: ShapeKey, other: ShapeKey) {
        self.contacts.remove(&(own, other));
    }

    /// Drop contacts with shapes that were removed without a separate callback
    pub fn forget_shapes(&mut self, removed: &[ShapeKey]) {
        self.contacts
            .retain(|(own, other)| !removed.contains(own) && !removed.contains(other));
    }

    /// Mark dead; idempotent
    pub fn mark_dead(&mut self, cues: &mut Vec<SoundCue>) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.play("die");
        cues.push(SoundCue::new("die"));
    }

    /// Face a direction and drive the feet motor towards it
    pub fn accelerate(&mut self, space: &mut Space, direction: Facing) {
        if direction != self.facing {
            self.facing = direction;
        }
        self.set_flip(direction == Facing::Left);
        self.state.remove(ActorState::BRAKE);

        let rate = direction.sign() * self.tuning.move_speed;
        let power = self.tuning.move_power;
        if let Some(motor) = self.motor_mut(space) {
            motor.max_force = power;
            motor.rate = rate;
        }
    }

    pub fn brake(&mut self, space: &mut Space) {
        let power = self.tuning.brake_power;
        if let Some(motor) = self.motor_mut(space) {
            motor.rate = 0.0;
            motor.max_force = power;
        }
    }

    pub fn jump(&mut self, space: &mut Space, modifier: f32) {
        let impulse = Vec2::new(0.0, self.tuning.jump_power * modifier);
        if let Some(body) = space.get_body_mut(self.body.body) {
            body.apply_impulse(impulse);
        }
    }

    pub fn motor_rate(&self, space: &Space) -> Option<f32> {
        let key = self.motor?;
        space.get_constraint(key)?.as_motor().map(|m| m.rate)
    }

    fn motor_mut<'s>(&self, space: &'s mut Space) -> Option<&'s mut SimpleMotor> {
        let key = self.motor?;
        space.get_constraint_mut(key)?.as_motor_mut()
    }

    /// Move every owned body by the same offset
    pub fn translate(&mut self, space: &mut Space, delta: Vec2) {
        for key in self.body_keys() {
            if let Some(body) = space.get_body_mut(key) {
                body.translate(delta);
            }
        }
    }

    /// Debounced ground check shared by upright actors
    pub fn upright_tick(&mut self, dt: f32) -> Option<InternalEvent> {
        self.debounce += dt;
        if self.debounce <= DEBOUNCE_INTERVAL {
            return None;
        }
        self.debounce = 0.0;
        if self.grounded() {
            Some(InternalEvent::Landed)
        } else if !self.state.contains(ActorState::JUMPING) {
            Some(InternalEvent::Fall)
        } else {
            None
        }
    }

    pub fn update_sprites(&mut self, dt: f32) {
        for sprite in &mut self.sprites {
            sprite.update(dt);
        }
    }

    /// Every body this actor owns
    pub fn body_keys(&self) -> Vec<BodyKey> {
        let mut keys = vec![self.body.body];
        keys.extend(self.feet.map(|f| f.body));
        keys.extend(self.legs.iter().map(|l| l.part.body));
        keys
    }

    /// Remove every owned physics object, returning the removed shapes
    pub fn teardown(&mut self, space: &mut Space) -> Vec<ShapeKey> {
        let bodies = self.body_keys();
        let shapes: Vec<ShapeKey> = space
            .shapes()
            .filter(|(_, shape)| bodies.contains(&shape.body))
            .map(|(key, _)| key)
            .collect();

        for key in [self.motor.take(), self.pivot.take()].into_iter().flatten() {
            space.remove_constraint(key);
        }
        for leg in self.legs.drain(..) {
            space.remove_constraint(leg.joint);
        }
        for key in bodies {
            space.remove_body(key);
        }
        // shapes hung off the static body survive body removal
        for shape in &shapes {
            space.remove_shape(*shape);
        }
        self.contacts.clear();
        shapes
    }
}

/// Per-archetype behaviour
#[derive(Debug)]
pub enum Behavior {
    Hero(HeroState),
    Zombie(ZombieState),
    /// Moving platforms and other passive bodies
    Prop,
}

/// A physics-backed game entity
#[derive(Debug)]
pub struct Actor {
    pub id: ActorId,
    pub core: PhysicsActor,
    pub behavior: Behavior,
}

impl Actor {
    pub fn new(id: ActorId, core: PhysicsActor, behavior: Behavior) -> Self {
        Self { id, core, behavior }
    }

    pub fn is_alive(&self) -> bool {
        self.core.alive
    }

    pub fn is_hero(&self) -> bool {
        matches!(self.behavior, Behavior::Hero(_))
    }

    pub fn is_zombie(&self) -> bool {
        matches!(self.behavior, Behavior::Zombie(_))
    }

    pub fn hero_state(&self) -> Option<&HeroState> {
        match &self.behavior {
            Behavior::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    pub fn hero_state_mut(&mut self) -> Option<&mut HeroState> {
        match &mut self.behavior {
            Behavior::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    pub fn position(&self, space: &Space) -> Option<Vec2> {
        self.core.position(space)
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.core.sprites
    }

    /// Handle an input command
    pub fn process(&mut self, cmd: &Command, ctx: &mut ActorContext<'_>) {
        if let Behavior::Hero(hero) = &mut self.behavior {
            hero::process(&mut self.core, hero, cmd, ctx);
        }
    }

    /// Handle an internal event
    pub fn process2(&mut self, event: InternalEvent, ctx: &mut ActorContext<'_>) {
        match &mut self.behavior {
            Behavior::Hero(hero) => hero::process2(&mut self.core, hero, event, ctx),
            Behavior::Zombie(_) => {
                if event == InternalEvent::Die {
                    self.core.mark_dead(ctx.cues);
                }
            }
            Behavior::Prop => {}
        }
    }

    pub fn update(&mut self, dt: f32, ctx: &mut ActorContext<'_>) {
        match &mut self.behavior {
            Behavior::Hero(hero) => hero::update(&mut self.core, hero, dt, ctx),
            Behavior::Zombie(zombie) => zombie::update(&mut self.core, zombie, ctx),
            Behavior::Prop => {}
        }
    }

    /// Release every physics object this actor owns
    ///
    /// Returns the removed shapes so other actors can drop stale contacts.
    pub fn kill(&mut self, space: &mut Space) -> Vec<ShapeKey> {
        self.core.alive = false;
        match &mut self.behavior {
            Behavior::Hero(hero) => hero::teardown(hero, space),
            Behavior::Zombie(_) | Behavior::Prop => {}
        }
        self.core.teardown(space)
    }
}

/// Feet radius for a body of the given width
pub fn feet_radius(width: f32) -> f32 {
    width * FEET_RADIUS_FACTOR
}

/// Offset from the feet centre up to the body centre
pub fn feet_to_body(feet_radius: f32) -> Vec2 {
    Vec2::new(0.0, feet_radius * FEET_DROP_FACTOR)
}

/// Upright hitbox: flat top, square shoulders, pointed bottom for the wheel
pub fn hitbox_geometry(width: f32, height: f32) -> Geometry {
    let hw = width * 0.5;
    let hh = height * 0.5;
    Geometry::poly(
        &[
            Vec2::new(-hw, hh),
            Vec2::new(hw, hh),
            Vec2::new(hw, 0.0),
            Vec2::new(0.0, -hh),
            Vec2::new(-hw, 0.0),
        ],
        Vec2::ZERO,
    )
}

/// Add a shape, failing if its body has gone away
pub(crate) fn attach(space: &mut Space, shape: Shape) -> Result<ShapeKey, BuildError> {
    space
        .add_shape(shape)
        .ok_or_else(|| BuildError("shape body missing".to_string()))
}

pub(crate) fn link(space: &mut Space, a: BodyKey, b: BodyKey, kind: ConstraintKind) -> Result<ConstraintKey, BuildError> {
    space
        .add_constraint(Constraint::new(a, b, kind))
        .ok_or_else(|| BuildError("constraint body missing".to_string()))
}

/// Build the body + wheel-foot rig shared by upright actors
///
/// The body is placed at `position`, the feet below it, joined by a pivot
/// at the feet centre and a motor that drives the wheel.
pub(crate) fn build_upright(
    space: &mut Space,
    id: ActorId,
    size: Vec2,
    position: Vec2,
    tag: CollisionTag,
    tuning: Tuning,
) -> Result<PhysicsActor, BuildError> {
    let user_data = id.to_user_data();

    let body = space.add_body(Body::new(BODY_MASS, f32::INFINITY).with_position(position));
    let body_shape = attach(
        space,
        Shape::new(body, hitbox_geometry(size.x, size.y))
            .with_collision_type(tag.collision_type())
            .with_layers(CollisionLayer::BODY)
            .with_friction(1.0)
            .with_elasticity(0.0)
            .with_user_data(user_data),
    )?;

    let radius = feet_radius(size.x);
    let feet_position = position - feet_to_body(radius);
    let feet = space.add_body(
        Body::new(FEET_MASS, moment_for_circle(FEET_MASS, 0.0, radius, Vec2::ZERO)).with_position(feet_position),
    );
    let feet_shape = attach(
        space,
        Shape::new(feet, Geometry::circle(radius, Vec2::ZERO))
            .with_collision_type(tag.collision_type())
            .with_layers(CollisionLayer::FEET)
            .with_friction(f32::INFINITY)
            .with_elasticity(0.0)
            .with_user_data(user_data),
    )?;

    let motor = link(space, body, feet, ConstraintKind::Motor(SimpleMotor::new(0.0)))?;
    let pivot = match (space.get_body(body), space.get_body(feet)) {
        (Some(a), Some(b)) => PivotJoint::from_world_pivot(a, b, feet_position),
        _ => return Err(BuildError("upright bodies missing".to_string())),
    };
    let pivot = link(space, body, feet, ConstraintKind::Pivot(pivot))?;

    let mut core = PhysicsActor::new(BodyPart { body, shape: body_shape }, tuning);
    core.feet = Some(BodyPart { body: feet, shape: feet_shape });
    core.motor = Some(motor);
    core.pivot = Some(pivot);
    Ok(core)
}
