//! 2D Physics simulation for Sanic Forever
//!
//! This crate provides a small rigid body backend modelled on the needs of a
//! physics platformer:
//! - Bodies with infinite mass/moment support and a gravity opt-out hook
//! - Circle, polygon and segment shapes with layers, sensors and collision types
//! - Pivot, groove, damped spring and simple motor constraints
//! - Begin / pre-solve / post-solve / separate callbacks keyed by collision type pairs

pub mod arbiter;
pub mod body;
pub mod collision;
pub mod joints;
pub mod material;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use arbiter::{Arbiter, CollisionHandler, FilterFn, NotifyFn};
pub use body::{Body, BodyKey, BodyType, VelocityMode};
pub use collision::{collide, CollisionLayer, ContactPoint, Manifold};
pub use joints::{Constraint, ConstraintKey, ConstraintKind, DampedSpring, GrooveJoint, PivotJoint, SimpleMotor};
pub use material::PhysicsMaterial;
pub use shapes::{
    area_for_poly, moment_for_box, moment_for_circle, moment_for_poly, moment_for_segment, CollisionType,
    Geometry, Hull, Shape, ShapeKey,
};
pub use world::{PhysicsConfig, PhysicsWorld};
