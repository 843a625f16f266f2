//! Rigid body types for 2D physics simulation

use sanic_math::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// Define generational key type for rigid bodies
new_key_type! {
    /// Key to a rigid body in the space
    ///
    /// Uses generational indexing so a key held by an actor that outlives its
    /// body returns None instead of pointing at whatever reused the slot.
    pub struct BodyKey;
}

/// How a body participates in the simulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Integrated, affected by forces and contacts
    #[default]
    Dynamic,
    /// Moves with its velocity but is never pushed
    Kinematic,
    /// Never moves
    Static,
}

/// Velocity integration hook
///
/// `IgnoreGravity` is used for moving platforms that hang from springs instead
/// of falling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityMode {
    #[default]
    Gravity,
    IgnoreGravity,
}

/// A 2D rigid body
///
/// Mass and moment may be `f32::INFINITY`; an infinite moment keeps the body
/// upright no matter what torque it receives.
#[derive(Clone, Debug)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rotation in radians, counter-clockwise
    pub angle: f32,
    pub angular_velocity: f32,
    pub mass: f32,
    pub moment: f32,
    pub body_type: BodyType,
    pub velocity_mode: VelocityMode,
    force: Vec2,
    torque: f32,
}

impl Body {
    /// Create a dynamic body
    pub fn new(mass: f32, moment: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            mass,
            moment,
            body_type: BodyType::Dynamic,
            velocity_mode: VelocityMode::Gravity,
            force: Vec2::ZERO,
            torque: 0.0,
        }
    }

    /// Create a static body that never moves
    pub fn new_static() -> Self {
        let mut body = Self::new(f32::INFINITY, f32::INFINITY);
        body.body_type = BodyType::Static;
        body
    }

    /// Create a kinematic body driven only by its velocity
    pub fn new_kinematic() -> Self {
        let mut body = Self::new(f32::INFINITY, f32::INFINITY);
        body.body_type = BodyType::Kinematic;
        body
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity_mode(mut self, mode: VelocityMode) -> Self {
        self.velocity_mode = mode;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    /// Inverse mass, zero for anything that cannot be pushed
    pub fn inv_mass(&self) -> f32 {
        if self.is_dynamic() && self.mass.is_finite() && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Inverse moment of inertia, zero for bodies that cannot rotate
    pub fn inv_moment(&self) -> f32 {
        if self.is_dynamic() && self.moment.is_finite() && self.moment > 0.0 {
            1.0 / self.moment
        } else {
            0.0
        }
    }

    /// Convert a body-local point to world coordinates
    pub fn local_to_world(&self, point: Vec2) -> Vec2 {
        self.position + point.rotated(self.angle)
    }

    /// Convert a world point to body-local coordinates
    pub fn world_to_local(&self, point: Vec2) -> Vec2 {
        (point - self.position).rotated(-self.angle)
    }

    /// Velocity of a point at world-space offset `r` from the centre of gravity
    pub fn velocity_at_offset(&self, r: Vec2) -> Vec2 {
        self.velocity + Vec2::cross_scalar(self.angular_velocity, r)
    }

    /// Apply an impulse through the centre of gravity
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.inv_mass();
    }

    /// Apply an impulse at a world-space offset from the centre of gravity
    pub fn apply_impulse_at(&mut self, impulse: Vec2, r: Vec2) {
        self.velocity += impulse * self.inv_mass();
        self.angular_velocity += r.cross(impulse) * self.inv_moment();
    }

    /// Accumulate a force for the next step
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Accumulate a torque for the next step
    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    /// Move the body without touching its velocity
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Integrate velocity over `dt`, consuming accumulated force and torque
    pub(crate) fn integrate_velocity(&mut self, gravity: Vec2, dt: f32) {
        if !self.is_dynamic() {
            return;
        }
        let g = match self.velocity_mode {
            VelocityMode::Gravity => gravity,
            VelocityMode::IgnoreGravity => Vec2::ZERO,
        };
        self.velocity += (g + self.force * self.inv_mass()) * dt;
        self.angular_velocity += self.torque * self.inv_moment() * dt;
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    pub(crate) fn integrate_position(&mut self, dt: f32) {
        if self.is_static() {
            return;
        }
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_static_body_has_no_inverse_mass() {
        let body = Body::new_static();
        assert!(body.is_static());
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_moment(), 0.0);
    }

    #[test]
    fn test_infinite_moment_never_rotates() {
        let mut body = Body::new(10.0, f32::INFINITY);
        body.apply_impulse_at(Vec2::new(0.0, 100.0), Vec2::new(5.0, 0.0));
        assert_eq!(body.angular_velocity, 0.0);
        assert!((body.velocity.y - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_local_world_round_trip() {
        let body = Body::new(1.0, 1.0)
            .with_position(Vec2::new(10.0, 5.0))
            .with_angle(std::f32::consts::FRAC_PI_2);

        let world = body.local_to_world(Vec2::new(1.0, 0.0));
        assert!((world.x - 10.0).abs() < EPSILON);
        assert!((world.y - 6.0).abs() < EPSILON);

        let local = body.world_to_local(world);
        assert!((local.x - 1.0).abs() < EPSILON);
        assert!(local.y.abs() < EPSILON);
    }

    #[test]
    fn test_ignore_gravity_mode() {
        let mut body = Body::new(1.0, 1.0).with_velocity_mode(VelocityMode::IgnoreGravity);
        body.integrate_velocity(Vec2::new(0.0, -100.0), 0.1);
        assert_eq!(body.velocity, Vec2::ZERO);

        let mut falling = Body::new(1.0, 1.0);
        falling.integrate_velocity(Vec2::new(0.0, -100.0), 0.1);
        assert!((falling.velocity.y + 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_force_is_consumed_by_integration() {
        let mut body = Body::new(2.0, 1.0);
        body.apply_force(Vec2::new(4.0, 0.0));
        body.integrate_velocity(Vec2::ZERO, 1.0);
        assert!((body.velocity.x - 2.0).abs() < EPSILON);
        body.integrate_velocity(Vec2::ZERO, 1.0);
        assert!((body.velocity.x - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_kinematic_body_moves_but_is_not_pushed() {
        let mut body = Body::new_kinematic().with_velocity(Vec2::new(1.0, 0.0));
        body.apply_impulse(Vec2::new(100.0, 0.0));
        body.integrate_position(1.0);
        assert_eq!(body.position, Vec2::new(1.0, 0.0));
    }
}
