//! Level orchestration
//!
//! A [`Level`] owns the physics space, the actors living in it, the decoded
//! tile map and the viewports looking at it. [`Level::update`] advances
//! everything by one tick in a fixed order:
//!
//! 1. accumulate simulated time
//! 2. step physics `substeps` times
//! 3. respawn the hero once the respawn delay has passed
//! 4. move the cameras and advance sprite animations
//! 5. update every actor under the actor set lock, queueing the dead
//! 6. unlock and flush the queued additions and removals

use std::collections::HashMap;
use std::sync::Arc;

use sanic_input::Command;
use sanic_math::{Rect, Vec2};
use sanic_physics::{
    BodyKey, CollisionLayer, ConstraintKind, DampedSpring, GrooveJoint, PhysicsConfig, ShapeKey, VelocityMode,
};
use serde::{Deserialize, Serialize};

use crate::actor::{link, Actor, ActorContext, Behavior, BodyPart, BuildError, PhysicsActor, Tuning};
use crate::actor_set::{ActorId, ActorSet, Removal};
use crate::hero;
use crate::level_data::{LevelData, LevelLoadError};
use crate::resources::ResourceRegistry;
use crate::shape_loader::{load_shapes, LoadedShape};
use crate::sprite::Sprite;
use crate::stage::{SoundCue, Space, Stage};
use crate::tags::CollisionTag;
use crate::tilemap::TileMap;
use crate::viewport::{DrawList, Scene, ViewSettings, Viewport, ViewportGroup};
use crate::zombie;

/// Marker kind of the hero spawn point
pub const HERO_MARKER: &str = "sanic";
/// Marker kind of zombie spawn points
pub const ZOMBIE_MARKER: &str = "zombie";

/// Downward travel of a moving platform's groove
const PLATFORM_TRAVEL: f32 = 100.0;
const PLATFORM_STIFFNESS: f32 = 10_000.0;
const PLATFORM_DAMPING: f32 = 50.0;

/// Simulation tunables for one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub gravity: f32,
    /// Physics steps per level update
    pub substeps: u32,
    /// Seconds between the hero's removal and the respawn
    pub respawn_delay: f32,
    pub hero: Tuning,
    pub zombie: Tuning,
    pub view: ViewSettings,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            gravity: -1500.0,
            substeps: 3,
            respawn_delay: 5.0,
            hero: Tuning {
                move_power: 80_000.0,
                move_speed: 30.0,
                brake_power: 200_000.0,
                jump_power: 7_000.0,
                air_move_speed: 200.0,
            },
            zombie: Tuning {
                move_power: 20_000.0,
                move_speed: 6.0,
                brake_power: f32::INFINITY,
                jump_power: 3_000.0,
                air_move_speed: 0.0,
            },
            view: ViewSettings::default(),
        }
    }
}

/// How a loaded shape takes part in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectRole {
    Plain,
    Trap,
    Boundary,
    Stairs,
    Moving,
}

fn object_role(group: &str, name: &str) -> ObjectRole {
    let name = name.to_ascii_lowercase();
    if name.starts_with("moving") {
        return ObjectRole::Moving;
    }
    let is = |group_name: &str, prefix: &str| group.eq_ignore_ascii_case(group_name) || name.starts_with(prefix);
    if is("Traps", "trap") {
        ObjectRole::Trap
    } else if is("Boundaries", "boundary") {
        ObjectRole::Boundary
    } else if is("Stairs", "stairs") {
        ObjectRole::Stairs
    } else {
        ObjectRole::Plain
    }
}

/// A running level
pub struct Level {
    name: String,
    space: Space,
    stage: Stage,
    registry: Arc<ResourceRegistry>,
    settings: LevelSettings,
    tiles: TileMap,
    map_size: Vec2,
    viewports: ViewportGroup,
    /// Level shapes by object name
    named_shapes: HashMap<String, ShapeKey>,
    hero: Option<ActorId>,
    hero_spawn: Vec2,
    hero_spawns: u32,
    time: f32,
    death_time: f32,
}

impl Level {
    /// Build the space, decode every object and spawn the actors
    pub fn load(
        data: &LevelData,
        registry: Arc<ResourceRegistry>,
        settings: LevelSettings,
    ) -> Result<Self, LevelLoadError> {
        let hero_spawn = data
            .find_marker(HERO_MARKER)
            .map(|marker| data.to_world(marker.position.x, marker.position.y))
            .ok_or_else(|| LevelLoadError::Invalid(format!("level '{}' has no '{}' marker", data.name, HERO_MARKER)))?;

        let mut space = Space::with_config(PhysicsConfig::new(settings.gravity));
        let loaded = load_shapes(data, &mut space)?;
        let tiles = TileMap::from_level(data);
        let map_size = Vec2::new(data.pixel_width(), data.pixel_height());

        let mut viewports = ViewportGroup::new(Rect::new(0.0, 0.0, map_size.x, map_size.y));
        viewports
            .add(Viewport::new())
            .map_err(|err| LevelLoadError::Invalid(err.to_string()))?;

        let mut level = Self {
            name: data.name.clone(),
            space,
            stage: Stage::new(),
            registry,
            settings,
            tiles,
            map_size,
            viewports,
            named_shapes: HashMap::new(),
            hero: None,
            hero_spawn,
            hero_spawns: 0,
            time: 0.0,
            death_time: 0.0,
        };

        for shape in &loaded {
            level.classify(shape, data.platform_color)?;
        }

        for marker in data.markers().filter(|m| m.kind.eq_ignore_ascii_case(ZOMBIE_MARKER)) {
            let position = data.to_world(marker.position.x, marker.position.y);
            level.spawn_zombie(position)?;
        }

        level.new_hero()?;
        log::info!(
            "Level '{}' ready: {} shapes, {} actors",
            level.name,
            level.space.shape_count(),
            level.stage.actors.len()
        );
        Ok(level)
    }

    fn classify(&mut self, loaded: &LoadedShape, platform_color: [f32; 4]) -> Result<(), LevelLoadError> {
        if self.named_shapes.insert(loaded.name.clone(), loaded.shape).is_some() {
            log::warn!("Duplicate object name '{}'; lookups see the last one", loaded.name);
        }

        let role = object_role(&loaded.group, &loaded.name);
        let Some(shape) = self.space.get_shape_mut(loaded.shape) else {
            return Err(LevelLoadError::Invalid(format!("shape '{}' vanished", loaded.name)));
        };
        match role {
            ObjectRole::Plain => {}
            ObjectRole::Trap => shape.collision_type = CollisionTag::Trap.collision_type(),
            ObjectRole::Boundary => shape.collision_type = CollisionTag::Boundary.collision_type(),
            ObjectRole::Stairs => {
                shape.collision_type = CollisionTag::Stairs.collision_type();
                shape.layers = CollisionLayer::FEET;
            }
            ObjectRole::Moving => {
                if loaded.is_static {
                    return Err(LevelLoadError::Invalid(format!(
                        "moving platform '{}' must have a dynamic body",
                        loaded.name
                    )));
                }
                shape.collision_type = CollisionTag::Geometry.collision_type();
                shape.layers = CollisionLayer::ALL;
                self.build_platform(loaded.body, loaded.shape, platform_color)?;
            }
        }
        if role != ObjectRole::Plain {
            log::debug!("'{}' is {:?}", loaded.name, role);
        }
        Ok(())
    }

    /// Hang a dynamic shape on a vertical groove with a spring holding it up
    fn build_platform(&mut self, body: BodyKey, shape: ShapeKey, color: [f32; 4]) -> Result<ActorId, BuildError> {
        let Some(platform) = self.space.get_body_mut(body) else {
            return Err(BuildError("platform body missing".to_string()));
        };
        platform.velocity_mode = VelocityMode::IgnoreGravity;
        platform.moment = f32::INFINITY;
        let top = platform.position;
        let bottom = top - Vec2::new(0.0, PLATFORM_TRAVEL);

        let anchor = self.space.static_body();
        link(
            &mut self.space,
            anchor,
            body,
            ConstraintKind::Groove(GrooveJoint::new(top, bottom, Vec2::ZERO)),
        )?;
        link(
            &mut self.space,
            anchor,
            body,
            ConstraintKind::Spring(DampedSpring::new(
                bottom,
                Vec2::ZERO,
                PLATFORM_TRAVEL,
                PLATFORM_STIFFNESS,
                PLATFORM_DAMPING,
            )),
        )?;

        let space = &mut self.space;
        let id = self.stage.actors.add_with(|id| {
            if let Some(platform) = space.get_shape_mut(shape) {
                platform.user_data = id.to_user_data();
            }
            let mut core = PhysicsActor::new(BodyPart { body, shape }, Tuning::default());
            core.push_sprite(Sprite::solid(shape, color), true);
            Actor::new(id, core, Behavior::Prop)
        });
        Ok(id)
    }

    /// Build the hero at the spawn point, point the first camera at it and
    /// cue the spawn sound
    pub fn new_hero(&mut self) -> Result<ActorId, BuildError> {
        let space = &mut self.space;
        let registry = &self.registry;
        let (spawn, tuning) = (self.hero_spawn, self.settings.hero);
        let id = self
            .stage
            .actors
            .try_add_with(|id| hero::build(space, id, spawn, tuning, registry))?;

        self.hero = Some(id);
        self.hero_spawns += 1;
        if let Some(viewport) = self.viewports.get_mut(0) {
            viewport.follow(id);
        }
        self.stage.cues.push(SoundCue::restarting("sanic-spawn"));
        log::info!("Hero spawned (#{}) at {:.2}s", self.hero_spawns, self.time);
        Ok(id)
    }

    pub fn spawn_zombie(&mut self, position: Vec2) -> Result<ActorId, BuildError> {
        let space = &mut self.space;
        let registry = &self.registry;
        let tuning = self.settings.zombie;
        self.stage
            .actors
            .try_add_with(|id| zombie::build(space, id, position, tuning, registry))
    }

    /// Advance the level by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.time += dt;

        let substeps = self.settings.substeps.max(1);
        let step = dt / substeps as f32;
        for _ in 0..substeps {
            self.space.step(step, &mut self.stage);
        }

        if self.hero.is_none() && self.time - self.death_time >= self.settings.respawn_delay {
            if let Err(err) = self.new_hero() {
                log::error!("Hero respawn failed: {}", err);
            }
        }

        self.viewports.update(&self.stage.actors, &self.space, self.map_size);
        for id in self.stage.actors.ids() {
            if let Some(actor) = self.stage.actors.get_mut(id) {
                actor.core.update_sprites(dt);
            }
        }

        if !self.stage.actors.try_lock() {
            log::warn!("Actor set already locked; skipping actor update");
            return;
        }
        for id in self.stage.actors.ids() {
            let Stage { actors, cues } = &mut self.stage;
            let Some(actor) = actors.get_mut(id) else {
                continue;
            };
            if actor.is_alive() {
                let mut ctx = ActorContext {
                    space: &mut self.space,
                    cues,
                };
                actor.update(dt, &mut ctx);
            }
            if !actor.is_alive() {
                self.remove_actor(id);
            }
        }
        self.stage.actors.unlock();

        for actor in self.stage.actors.flush() {
            self.finish_removal(actor);
        }
    }

    /// Remove an actor now, or at the end of the current update pass
    pub fn remove_actor(&mut self, id: ActorId) {
        match self.stage.actors.remove(id) {
            Removal::Removed(actor) => self.finish_removal(actor),
            Removal::Deferred => log::debug!("Removal of {:?} deferred", id),
            Removal::Missing => {}
        }
    }

    fn finish_removal(&mut self, mut actor: Actor) {
        self.viewports.forget(actor.id);
        if self.hero == Some(actor.id) {
            self.hero = None;
            self.death_time = self.time;
            log::info!("Hero removed at {:.2}s", self.time);
        }
        let removed = actor.kill(&mut self.space);
        for id in self.stage.actors.ids() {
            if let Some(other) = self.stage.actors.get_mut(id) {
                other.core.forget_shapes(&removed);
            }
        }
    }

    /// Route an input command to the hero
    pub fn handle_command(&mut self, cmd: &Command) {
        let Some(id) = self.hero else {
            return;
        };
        let Stage { actors, cues } = &mut self.stage;
        if let Some(hero) = actors.get_mut(id).filter(|actor| actor.is_alive()) {
            let mut ctx = ActorContext {
                space: &mut self.space,
                cues,
            };
            hero.process(cmd, &mut ctx);
        }
    }

    /// Route the per-frame held commands to the hero
    pub fn handle_held(&mut self, cmds: &[Command]) {
        for cmd in cmds {
            self.handle_command(cmd);
        }
    }

    /// Take the sound cues queued since the last drain
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.stage.drain_cues()
    }

    /// Lay the viewports out over `bounds` (window pixels)
    pub fn resize(&mut self, bounds: Rect) {
        self.viewports.resize(bounds);
    }

    pub fn draw(&self) -> Vec<DrawList> {
        let scene = Scene {
            tiles: &self.tiles,
            actors: &self.stage.actors,
            space: &self.space,
            settings: &self.settings.view,
        };
        self.viewports.draw(&scene)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated seconds since load
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn hero(&self) -> Option<ActorId> {
        self.hero
    }

    pub fn hero_actor(&self) -> Option<&Actor> {
        self.hero.and_then(|id| self.stage.actors.get(id))
    }

    pub fn hero_actor_mut(&mut self) -> Option<&mut Actor> {
        self.hero.and_then(|id| self.stage.actors.get_mut(id))
    }

    /// How many times a hero has been built, the initial one included
    pub fn hero_spawns(&self) -> u32 {
        self.hero_spawns
    }

    pub fn hero_spawn_point(&self) -> Vec2 {
        self.hero_spawn
    }

    pub fn actors(&self) -> &ActorSet<Actor> {
        &self.stage.actors
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.stage.actors.get_mut(id)
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }

    /// A level shape by object name
    pub fn shape(&self, name: &str) -> Option<ShapeKey> {
        self.named_shapes.get(name).copied()
    }

    pub fn map_size(&self) -> Vec2 {
        self.map_size
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    pub fn viewports(&self) -> &ViewportGroup {
        &self.viewports
    }

    pub fn viewports_mut(&mut self) -> &mut ViewportGroup {
        &mut self.viewports
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }
}
