//! Collision shapes attached to bodies
//!
//! Geometry is stored in body-local coordinates and converted to a world
//! space [`Hull`] once per step for the narrow phase.

use sanic_math::{Rect, Vec2};
use slotmap::new_key_type;

use crate::body::{Body, BodyKey};
use crate::collision::CollisionLayer;
use crate::material::PhysicsMaterial;

new_key_type! {
    /// Key to a shape in the space
    pub struct ShapeKey;
}

/// Opaque tag used to route contacts to handlers
pub type CollisionType = u32;

/// Local shape geometry
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Circle { offset: Vec2, radius: f32 },
    /// Convex polygon, counter-clockwise, optionally rounded
    Poly { verts: Vec<Vec2>, radius: f32 },
    Segment { a: Vec2, b: Vec2, radius: f32 },
}

impl Geometry {
    pub fn circle(radius: f32, offset: Vec2) -> Self {
        Geometry::Circle { offset, radius }
    }

    /// Convex polygon from vertices plus an offset applied to every vertex
    ///
    /// Clockwise input is reversed so the stored winding is always
    /// counter-clockwise.
    pub fn poly(verts: &[Vec2], offset: Vec2) -> Self {
        let mut verts: Vec<Vec2> = verts.iter().map(|v| *v + offset).collect();
        if signed_area(&verts) < 0.0 {
            verts.reverse();
        }
        Geometry::Poly { verts, radius: 0.0 }
    }

    /// Box centred on the body
    pub fn boxed(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::poly(
            &[
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            Vec2::ZERO,
        )
    }

    pub fn segment(a: Vec2, b: Vec2, radius: f32) -> Self {
        Geometry::Segment { a, b, radius }
    }

    /// Transform into world space for the given body
    pub fn to_hull(&self, body: &Body) -> Hull {
        match self {
            Geometry::Circle { offset, radius } => Hull {
                points: vec![body.local_to_world(*offset)],
                radius: *radius,
            },
            Geometry::Poly { verts, radius } => Hull {
                points: verts.iter().map(|v| body.local_to_world(*v)).collect(),
                radius: *radius,
            },
            Geometry::Segment { a, b, radius } => Hull {
                points: vec![body.local_to_world(*a), body.local_to_world(*b)],
                radius: *radius,
            },
        }
    }
}

/// World-space convex point set inflated by a radius
///
/// One point is a circle, two points a capsule, three or more a (rounded)
/// counter-clockwise polygon.
#[derive(Clone, Debug)]
pub struct Hull {
    pub points: Vec<Vec2>,
    pub radius: f32,
}

impl Hull {
    pub fn bounding_box(&self) -> Rect {
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &self.points {
            min = min.min_components(*p);
            max = max.max_components(*p);
        }
        let r = Vec2::new(self.radius, self.radius);
        min -= r;
        max += r;
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Number of faces usable as separating axes
    pub(crate) fn face_count(&self) -> usize {
        if self.points.len() >= 2 {
            self.points.len()
        } else {
            0
        }
    }

    /// Face `i` as (start, end, outward normal)
    pub(crate) fn face(&self, i: usize) -> (Vec2, Vec2, Vec2) {
        let a = self.points[i];
        let b = self.points[(i + 1) % self.points.len()];
        (a, b, (b - a).rperp().normalized())
    }
}

/// A collision shape attached to a body
#[derive(Clone, Debug)]
pub struct Shape {
    pub body: BodyKey,
    pub geometry: Geometry,
    pub collision_type: CollisionType,
    pub material: PhysicsMaterial,
    /// Sensors report contacts but never push
    pub sensor: bool,
    pub layers: CollisionLayer,
    /// Free slot for the owner (actor ids)
    pub user_data: u64,
}

impl Shape {
    pub fn new(body: BodyKey, geometry: Geometry) -> Self {
        Self {
            body,
            geometry,
            collision_type: 0,
            material: PhysicsMaterial::default(),
            sensor: false,
            layers: CollisionLayer::ALL,
            user_data: 0,
        }
    }

    pub fn with_collision_type(mut self, collision_type: CollisionType) -> Self {
        self.collision_type = collision_type;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material.friction = friction;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.material.elasticity = elasticity;
        self
    }

    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_layers(mut self, layers: CollisionLayer) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }
}

/// Signed area of a polygon, positive for counter-clockwise winding
pub fn signed_area(verts: &[Vec2]) -> f32 {
    let n = verts.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += verts[i].cross(verts[(i + 1) % n]);
    }
    sum * 0.5
}

pub fn area_for_poly(verts: &[Vec2]) -> f32 {
    signed_area(verts).abs()
}

/// Moment of inertia of a hollow circle (inner radius 0 for a solid disc)
pub fn moment_for_circle(mass: f32, inner_radius: f32, outer_radius: f32, offset: Vec2) -> f32 {
    mass * (0.5 * (inner_radius * inner_radius + outer_radius * outer_radius) + offset.length_squared())
}

pub fn moment_for_box(mass: f32, width: f32, height: f32) -> f32 {
    mass * (width * width + height * height) / 12.0
}

pub fn moment_for_segment(mass: f32, a: Vec2, b: Vec2) -> f32 {
    let offset = (a + b) * 0.5;
    let length = a.distance(b);
    mass * (length * length / 12.0 + offset.length_squared())
}

pub fn moment_for_poly(mass: f32, verts: &[Vec2], offset: Vec2) -> f32 {
    let n = verts.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    for i in 0..n {
        let v1 = verts[i] + offset;
        let v2 = verts[(i + 1) % n] + offset;
        let a = v2.cross(v1);
        let b = v1.dot(v1) + v1.dot(v2) + v2.dot(v2);
        sum1 += a * b;
        sum2 += a;
    }
    if sum2 == 0.0 {
        return 0.0;
    }
    mass * sum1 / (6.0 * sum2)
}
