//! Constraints between pairs of bodies
//!
//! Every joint is solved with sequential impulses. `pre_step` caches anchors
//! and effective masses, `apply_impulse` runs once per solver iteration.
//! Accumulated impulses restart from zero every step.

use sanic_math::Vec2;
use slotmap::new_key_type;

use crate::body::{Body, BodyKey};

new_key_type! {
    /// Key to a constraint in the space
    pub struct ConstraintKey;
}

/// Fraction of positional error corrected per step
const ERROR_BIAS: f32 = 0.2;

/// Pins an anchor on each body together
#[derive(Clone, Debug)]
pub struct PivotJoint {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub max_force: f32,
    r_a: Vec2,
    r_b: Vec2,
    k: Mat2,
    bias: Vec2,
    j_acc: Vec2,
}

impl PivotJoint {
    /// Pivot from body-local anchors
    pub fn new(anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self {
            anchor_a,
            anchor_b,
            max_force: f32::INFINITY,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            k: Mat2::ZERO,
            bias: Vec2::ZERO,
            j_acc: Vec2::ZERO,
        }
    }

    /// Pivot around a world-space point, measured from the bodies' current poses
    pub fn from_world_pivot(a: &Body, b: &Body, pivot: Vec2) -> Self {
        Self::new(a.world_to_local(pivot), b.world_to_local(pivot))
    }
}

/// Keeps an anchor on body B inside a groove segment on body A
#[derive(Clone, Debug)]
pub struct GrooveJoint {
    pub groove_a: Vec2,
    pub groove_b: Vec2,
    pub anchor_b: Vec2,
    pub max_force: f32,
    groove_normal: Vec2,
    clamp: f32,
    r_a: Vec2,
    r_b: Vec2,
    k: Mat2,
    bias: Vec2,
    j_acc: Vec2,
}

impl GrooveJoint {
    pub fn new(groove_a: Vec2, groove_b: Vec2, anchor_b: Vec2) -> Self {
        Self {
            groove_a,
            groove_b,
            anchor_b,
            max_force: f32::INFINITY,
            groove_normal: Vec2::ZERO,
            clamp: 0.0,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            k: Mat2::ZERO,
            bias: Vec2::ZERO,
            j_acc: Vec2::ZERO,
        }
    }
}

/// Spring with viscous damping between two anchors
#[derive(Clone, Debug)]
pub struct DampedSpring {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl DampedSpring {
    pub fn new(anchor_a: Vec2, anchor_b: Vec2, rest_length: f32, stiffness: f32, damping: f32) -> Self {
        Self {
            anchor_a,
            anchor_b,
            rest_length,
            stiffness,
            damping,
        }
    }
}

/// Drives the relative angular velocity of two bodies
///
/// Keeps `w_b - w_a == -rate`, so on a y-up world a wheel on body B with a
/// positive rate rolls towards +x.
#[derive(Clone, Debug)]
pub struct SimpleMotor {
    pub rate: f32,
    pub max_force: f32,
    i_mass: f32,
    j_max: f32,
    j_acc: f32,
}

impl SimpleMotor {
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            max_force: f32::INFINITY,
            i_mass: 0.0,
            j_max: 0.0,
            j_acc: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ConstraintKind {
    Pivot(PivotJoint),
    Groove(GrooveJoint),
    Spring(DampedSpring),
    Motor(SimpleMotor),
}

/// A constraint and the two bodies it links
#[derive(Clone, Debug)]
pub struct Constraint {
    pub body_a: BodyKey,
    pub body_b: BodyKey,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(body_a: BodyKey, body_b: BodyKey, kind: ConstraintKind) -> Self {
        Self { body_a, body_b, kind }
    }

    pub fn as_motor(&self) -> Option<&SimpleMotor> {
        match &self.kind {
            ConstraintKind::Motor(motor) => Some(motor),
            _ => None,
        }
    }

    pub fn as_motor_mut(&mut self) -> Option<&mut SimpleMotor> {
        match &mut self.kind {
            ConstraintKind::Motor(motor) => Some(motor),
            _ => None,
        }
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f32) {
        match &mut self.kind {
            ConstraintKind::Pivot(joint) => {
                joint.r_a = joint.anchor_a.rotated(a.angle);
                joint.r_b = joint.anchor_b.rotated(b.angle);
                joint.k = k_tensor(a, b, joint.r_a, joint.r_b);
                let delta = (b.position + joint.r_b) - (a.position + joint.r_a);
                joint.bias = delta * (-ERROR_BIAS / dt);
                joint.j_acc = Vec2::ZERO;
            }
            ConstraintKind::Groove(joint) => {
                let ta = a.local_to_world(joint.groove_a);
                let tb = a.local_to_world(joint.groove_b);
                let n = (tb - ta).perp().normalized();
                let d = ta.dot(n);
                joint.groove_normal = n;
                joint.r_b = joint.anchor_b.rotated(b.angle);

                let td = (b.position + joint.r_b).cross(n);
                if td <= ta.cross(n) {
                    joint.clamp = 1.0;
                    joint.r_a = ta - a.position;
                } else if td >= tb.cross(n) {
                    joint.clamp = -1.0;
                    joint.r_a = tb - a.position;
                } else {
                    joint.clamp = 0.0;
                    joint.r_a = n.perp() * -td + n * d - a.position;
                }

                joint.k = k_tensor(a, b, joint.r_a, joint.r_b);
                let delta = (b.position + joint.r_b) - (a.position + joint.r_a);
                joint.bias = delta * (-ERROR_BIAS / dt);
                joint.j_acc = Vec2::ZERO;
            }
            ConstraintKind::Spring(spring) => {
                // springs are explicit forces; nothing left to iterate
                let r_a = spring.anchor_a.rotated(a.angle);
                let r_b = spring.anchor_b.rotated(b.angle);
                let delta = (b.position + r_b) - (a.position + r_a);
                let dist = delta.length();
                if dist <= f32::EPSILON {
                    return;
                }
                let n = delta / dist;
                let vrn = n.dot(b.velocity_at_offset(r_b) - a.velocity_at_offset(r_a));
                let force = (spring.rest_length - dist) * spring.stiffness - spring.damping * vrn;
                let impulse = n * (force * dt);
                a.apply_impulse_at(-impulse, r_a);
                b.apply_impulse_at(impulse, r_b);
            }
            ConstraintKind::Motor(motor) => {
                let i_sum = a.inv_moment() + b.inv_moment();
                motor.i_mass = if i_sum > 0.0 { 1.0 / i_sum } else { 0.0 };
                motor.j_max = motor.max_force * dt;
                motor.j_acc = 0.0;
            }
        }
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, dt: f32) {
        match &mut self.kind {
            ConstraintKind::Pivot(joint) => {
                let vr = b.velocity_at_offset(joint.r_b) - a.velocity_at_offset(joint.r_a);
                let j = joint.k.transform(joint.bias - vr);
                let old = joint.j_acc;
                joint.j_acc = clamp_length(old + j, joint.max_force * dt);
                let j = joint.j_acc - old;
                a.apply_impulse_at(-j, joint.r_a);
                b.apply_impulse_at(j, joint.r_b);
            }
            ConstraintKind::Groove(joint) => {
                let vr = b.velocity_at_offset(joint.r_b) - a.velocity_at_offset(joint.r_a);
                let j = joint.k.transform(joint.bias - vr);
                let old = joint.j_acc;
                let wanted = old + j;
                let n = joint.groove_normal;
                // inside the groove only the normal component may push
                let constrained = if joint.clamp * wanted.cross(n) > 0.0 {
                    wanted
                } else {
                    n * wanted.dot(n)
                };
                joint.j_acc = clamp_length(constrained, joint.max_force * dt);
                let j = joint.j_acc - old;
                a.apply_impulse_at(-j, joint.r_a);
                b.apply_impulse_at(j, joint.r_b);
            }
            ConstraintKind::Spring(_) => {}
            ConstraintKind::Motor(motor) => {
                let wr = b.angular_velocity - a.angular_velocity + motor.rate;
                let j = -wr * motor.i_mass;
                let old = motor.j_acc;
                motor.j_acc = (old + j).clamp(-motor.j_max, motor.j_max);
                let j = motor.j_acc - old;
                a.angular_velocity -= j * a.inv_moment();
                b.angular_velocity += j * b.inv_moment();
            }
        }
    }
}

/// Symmetric 2x2 matrix, stored inverted once computed
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Mat2 {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
}

impl Mat2 {
    const ZERO: Self = Self { a: 0.0, b: 0.0, c: 0.0, d: 0.0 };

    fn transform(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }
}

/// Inverse effective mass of a point constraint
fn k_tensor(a: &Body, b: &Body, r_a: Vec2, r_b: Vec2) -> Mat2 {
    let m_sum = a.inv_mass() + b.inv_mass();
    let ia = a.inv_moment();
    let ib = b.inv_moment();

    let k11 = m_sum + ia * r_a.y * r_a.y + ib * r_b.y * r_b.y;
    let k12 = -ia * r_a.x * r_a.y - ib * r_b.x * r_b.y;
    let k22 = m_sum + ia * r_a.x * r_a.x + ib * r_b.x * r_b.x;

    let det = k11 * k22 - k12 * k12;
    if det.abs() <= f32::EPSILON {
        return Mat2::ZERO;
    }
    let inv = 1.0 / det;
    Mat2 {
        a: k22 * inv,
        b: -k12 * inv,
        c: -k12 * inv,
        d: k11 * inv,
    }
}

fn clamp_length(v: Vec2, max: f32) -> Vec2 {
    let len = v.length();
    if len > max {
        v * (max / len)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    const DT: f32 = 1.0 / 60.0;

    fn keys() -> (BodyKey, BodyKey) {
        (
            BodyKey::from(KeyData::from_ffi(1)),
            BodyKey::from(KeyData::from_ffi(2)),
        )
    }

    fn solve(constraint: &mut Constraint, a: &mut Body, b: &mut Body) {
        constraint.pre_step(a, b, DT);
        for _ in 0..10 {
            constraint.apply_impulse(a, b, DT);
        }
    }

    #[test]
    fn test_motor_drives_relative_rate() {
        let (ka, kb) = keys();
        let mut a = Body::new(10.0, f32::INFINITY);
        let mut b = Body::new(2.0, 100.0);
        let mut motor = Constraint::new(ka, kb, ConstraintKind::Motor(SimpleMotor::new(5.0)));

        solve(&mut motor, &mut a, &mut b);

        assert_eq!(a.angular_velocity, 0.0);
        assert!((b.angular_velocity + 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_motor_respects_max_force() {
        let (ka, kb) = keys();
        let mut a = Body::new(10.0, f32::INFINITY);
        let mut b = Body::new(2.0, 1.0);
        let mut m = SimpleMotor::new(100.0);
        m.max_force = 60.0;
        let mut motor = Constraint::new(ka, kb, ConstraintKind::Motor(m));

        solve(&mut motor, &mut a, &mut b);

        // impulse is capped at max_force * dt = 1.0
        assert!((b.angular_velocity + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_pivot_cancels_relative_velocity() {
        let (ka, kb) = keys();
        let mut a = Body::new(1.0, f32::INFINITY);
        let mut b = Body::new(1.0, f32::INFINITY).with_velocity(Vec2::new(10.0, 0.0));
        let mut pivot = Constraint::new(ka, kb, ConstraintKind::Pivot(PivotJoint::new(Vec2::ZERO, Vec2::ZERO)));

        solve(&mut pivot, &mut a, &mut b);

        assert!((a.velocity.x - 5.0).abs() < 1e-3);
        assert!((b.velocity.x - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_pivot_from_world_pivot() {
        let a = Body::new(1.0, 1.0).with_position(Vec2::new(0.0, 10.0));
        let b = Body::new(1.0, 1.0).with_position(Vec2::new(0.0, 0.0));
        let joint = PivotJoint::from_world_pivot(&a, &b, Vec2::new(0.0, 0.0));
        assert_eq!(joint.anchor_a, Vec2::new(0.0, -10.0));
        assert_eq!(joint.anchor_b, Vec2::ZERO);
    }

    #[test]
    fn test_groove_allows_sliding_along_groove() {
        let (ka, kb) = keys();
        let mut a = Body::new_static();
        let mut b = Body::new(1.0, f32::INFINITY)
            .with_position(Vec2::new(0.0, 50.0))
            .with_velocity(Vec2::new(3.0, -4.0));
        // vertical groove from y=100 down to y=0
        let groove = GrooveJoint::new(Vec2::new(0.0, 100.0), Vec2::new(0.0, 0.0), Vec2::ZERO);
        let mut joint = Constraint::new(ka, kb, ConstraintKind::Groove(groove));

        solve(&mut joint, &mut a, &mut b);

        assert!(b.velocity.x.abs() < 1e-3, "sideways motion is removed");
        assert!((b.velocity.y + 4.0).abs() < 1e-3, "motion along the groove is kept");
    }

    #[test]
    fn test_spring_pulls_towards_rest_length() {
        let (ka, kb) = keys();
        let mut a = Body::new_static();
        let mut b = Body::new(1.0, f32::INFINITY).with_position(Vec2::new(0.0, -150.0));
        let spring = DampedSpring::new(Vec2::ZERO, Vec2::ZERO, 100.0, 10.0, 0.0);
        let mut joint = Constraint::new(ka, kb, ConstraintKind::Spring(spring));

        joint.pre_step(&mut a, &mut b, DT);

        assert!(b.velocity.y > 0.0, "stretched spring pulls the body back up");
    }
}
