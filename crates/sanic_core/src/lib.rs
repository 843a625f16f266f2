//! Game core for Sanic Forever
//!
//! This crate turns a level file into a running simulation:
//!
//! - [`CollisionTag`] - Gameplay classification of physics shapes
//! - [`Actor`] - Hero, zombie and prop behaviour over a physics rig
//! - [`ActorSet`] - Actor storage with deferred add/remove while iterating
//! - [`Level`] - Owns the space and actors and runs the per-tick update
//! - [`LevelData`] - Serializable level description (tiles, objects, markers)
//! - [`ResourceRegistry`] - Sprite sheets and sound cue table
//! - [`Viewport`] - Cameras that produce screen-space draw lists

mod actor;
mod actor_set;
pub mod handlers;
pub mod hero;
mod level;
mod level_data;
mod resources;
pub mod shape_loader;
mod sprite;
mod stage;
mod tags;
mod tilemap;
mod viewport;
pub mod zombie;

pub use actor::{
    feet_radius, feet_to_body, hitbox_geometry, Actor, ActorContext, ActorState, Behavior, BodyPart, BuildError,
    Facing, InternalEvent, Leg, PhysicsActor, Tuning,
};
pub use actor_set::{ActorId, ActorSet, Removal};
pub use hero::HeroState;
pub use level::{Level, LevelSettings, HERO_MARKER, ZOMBIE_MARKER};
pub use level_data::{
    BodyConfig, LevelData, LevelLoadError, LevelObject, MarkerData, ObjectGroup, ShapeConfig, ShapeDefaults,
    ShapeTemplate, TileLayer,
};
pub use resources::{Animation, Frame, PlayMode, ResourceError, ResourceRegistry, SpriteSheet};
pub use sprite::{Sprite, SpritePlacement};
pub use stage::{SoundCue, Space, Stage};
pub use tags::CollisionTag;
pub use tilemap::{Tile, TileMap};
pub use viewport::{DrawList, Quad, Scene, ViewSettings, Viewport, ViewportError, ViewportGroup, CAMERA_LIFT};
pub use zombie::ZombieState;

// Re-export the math types for convenience
pub use sanic_math::{Rect, Vec2};
