//! Collision detection for 2D shapes
//!
//! Narrow phase over [`Hull`]s using the separating axis test with rounded
//! radii. Also provides layer filtering.

use bitflags::bitflags;
use sanic_math::Vec2;

use crate::shapes::Hull;

bitflags! {
    /// Collision layers
    ///
    /// Two shapes can touch only if their layer masks share at least one bit.
    /// An empty mask never collides (decorative shapes).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionLayer: u32 {
        /// Upright body hitboxes
        const BODY = 1 << 0;
        /// Feet and anything feet stand on exclusively (stairs)
        const FEET = 1 << 1;
        /// All layers (collide with everything)
        const ALL = 0xFFFFFFFF;
    }
}

impl CollisionLayer {
    /// Check if two layer masks allow a collision
    pub fn collides_with(&self, other: &Self) -> bool {
        self.intersects(*other)
    }
}

/// Points of a manifold closer than this along the normal are kept together
const CONTACT_TOLERANCE: f32 = 0.5;

/// A single contact point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
    /// World-space contact point
    pub point: Vec2,
    /// Penetration depth (positive = overlapping)
    pub depth: f32,
}

/// Result of a narrow phase test
#[derive(Clone, Debug)]
pub struct Manifold {
    /// Contact normal pointing from the first hull to the second
    pub normal: Vec2,
    pub points: Vec<ContactPoint>,
}

impl Manifold {
    pub fn max_depth(&self) -> f32 {
        self.points.iter().map(|p| p.depth).fold(0.0, f32::max)
    }

    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

enum Axis {
    FaceA(usize),
    FaceB(usize),
    Vertex(Vec2),
}

/// Test two hulls for overlap
pub fn collide(a: &Hull, b: &Hull) -> Option<Manifold> {
    if a.points.is_empty() || b.points.is_empty() {
        return None;
    }
    if a.points.len() == 1 && b.points.len() == 1 {
        return circle_vs_circle(a.points[0], a.radius, b.points[0], b.radius);
    }

    let mut best_axis = None;
    let mut best_sep = f32::NEG_INFINITY;

    for i in 0..a.face_count() {
        let sep = face_separation(a, b, i);
        if sep > 0.0 {
            return None;
        }
        if sep > best_sep {
            best_sep = sep;
            best_axis = Some(Axis::FaceA(i));
        }
    }
    for j in 0..b.face_count() {
        let sep = face_separation(b, a, j);
        if sep > 0.0 {
            return None;
        }
        if sep > best_sep {
            best_sep = sep;
            best_axis = Some(Axis::FaceB(j));
        }
    }

    // a circle against a polygon also needs the axis towards the closest feature
    if a.points.len() == 1 {
        if let Some((n, sep)) = vertex_axis(a.points[0], a.radius, b) {
            if sep > 0.0 {
                return None;
            }
            if sep > best_sep {
                best_sep = sep;
                best_axis = Some(Axis::Vertex(n));
            }
        }
    }
    if b.points.len() == 1 {
        if let Some((n, sep)) = vertex_axis(b.points[0], b.radius, a) {
            if sep > 0.0 {
                return None;
            }
            if sep > best_sep {
                best_sep = sep;
                best_axis = Some(Axis::Vertex(-n));
            }
        }
    }

    let depth = -best_sep;
    match best_axis? {
        Axis::FaceA(i) => Some(face_contacts(a, b, i)),
        Axis::FaceB(j) => Some(face_contacts(b, a, j).flipped()),
        Axis::Vertex(n) => {
            // single contact halfway through the overlap
            let point = if a.points.len() == 1 {
                a.points[0] + n * (a.radius - depth * 0.5)
            } else {
                b.points[0] - n * (b.radius - depth * 0.5)
            };
            Some(Manifold {
                normal: n,
                points: vec![ContactPoint { point, depth }],
            })
        }
    }
}

fn circle_vs_circle(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> Option<Manifold> {
    let delta = pb - pa;
    let dist = delta.length();
    let depth = ra + rb - dist;
    if depth <= 0.0 {
        return None;
    }
    let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };
    let point = pa + normal * (ra - depth * 0.5);
    Some(Manifold {
        normal,
        points: vec![ContactPoint { point, depth }],
    })
}

/// Separation of `other` from face `i` of `reference`, negative when overlapping
fn face_separation(reference: &Hull, other: &Hull, i: usize) -> f32 {
    let (start, _, n) = reference.face(i);
    let min_other = other
        .points
        .iter()
        .map(|p| n.dot(*p))
        .fold(f32::INFINITY, f32::min);
    min_other - n.dot(start) - reference.radius - other.radius
}

/// Axis from a circle centre towards the closest point of a hull
///
/// Returns the normal pointing from the circle to the hull and the separation.
/// None when the centre lies inside the hull, where face axes already decide.
fn vertex_axis(center: Vec2, radius: f32, hull: &Hull) -> Option<(Vec2, f32)> {
    if contains_point(hull, center) {
        return None;
    }
    let closest = closest_point_on_hull(hull, center);
    let delta = closest - center;
    let dist = delta.length();
    if dist <= f32::EPSILON {
        return None;
    }
    Some((delta / dist, dist - radius - hull.radius))
}

/// Build contacts with face `i` of `reference` as the reference face
///
/// The returned normal points from `reference` to `incident`.
fn face_contacts(reference: &Hull, incident: &Hull, i: usize) -> Manifold {
    let (start, end, n) = reference.face(i);
    let face_height = n.dot(start) + reference.radius;

    let mut projections: Vec<(f32, Vec2)> = incident.points.iter().map(|p| (n.dot(*p), *p)).collect();
    projections.sort_by(|x, y| x.0.total_cmp(&y.0));
    let deepest = projections.first().map(|(d, _)| *d).unwrap_or(0.0);

    let edge = end - start;
    let edge_len = edge.length();
    let tangent = if edge_len > f32::EPSILON { edge / edge_len } else { n.perp() };

    let mut points = Vec::with_capacity(2);
    for (proj, p) in projections.iter().take(2) {
        if *proj > deepest + CONTACT_TOLERANCE {
            break;
        }
        let incident_height = proj - incident.radius;
        let depth = face_height - incident_height;
        if depth <= 0.0 {
            continue;
        }
        let s = tangent.dot(*p - start).clamp(0.0, edge_len);
        let base = start + tangent * s;
        let mid_height = (face_height + incident_height) * 0.5;
        points.push(ContactPoint {
            point: base + n * (mid_height - n.dot(start)),
            depth,
        });
    }

    Manifold { normal: n, points }
}

/// Point-in-polygon test; capsules and circles never contain points
pub fn contains_point(hull: &Hull, p: Vec2) -> bool {
    if hull.points.len() < 3 {
        return false;
    }
    (0..hull.face_count()).all(|i| {
        let (start, _, n) = hull.face(i);
        n.dot(p - start) <= 0.0
    })
}

/// Closest point on the hull's core outline (radius not applied)
pub fn closest_point_on_hull(hull: &Hull, p: Vec2) -> Vec2 {
    match hull.points.len() {
        0 => p,
        1 => hull.points[0],
        n => {
            let mut best = hull.points[0];
            let mut best_dist = f32::INFINITY;
            for i in 0..n {
                let q = closest_point_on_segment(hull.points[i], hull.points[(i + 1) % n], p);
                let d = (q - p).length_squared();
                if d < best_dist {
                    best_dist = d;
                    best = q;
                }
            }
            best
        }
    }
}

pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::shapes::Geometry;

    const EPSILON: f32 = 1e-4;

    fn hull_at(geometry: Geometry, position: Vec2) -> Hull {
        geometry.to_hull(&Body::new_static().with_position(position))
    }

    #[test]
    fn test_layers() {
        assert!(CollisionLayer::ALL.collides_with(&CollisionLayer::BODY));
        assert!(!CollisionLayer::BODY.collides_with(&CollisionLayer::FEET));
        assert!(!CollisionLayer::empty().collides_with(&CollisionLayer::ALL));
        let stairs = CollisionLayer::FEET;
        let platform = CollisionLayer::BODY | CollisionLayer::FEET;
        assert!(stairs.collides_with(&platform));
    }

    #[test]
    fn test_circle_vs_circle() {
        let a = hull_at(Geometry::circle(1.0, Vec2::ZERO), Vec2::ZERO);
        let b = hull_at(Geometry::circle(1.0, Vec2::ZERO), Vec2::new(1.5, 0.0));
        let m = collide(&a, &b).expect("circles overlap");
        assert!((m.normal.x - 1.0).abs() < EPSILON);
        assert!((m.points[0].depth - 0.5).abs() < EPSILON);

        let far = hull_at(Geometry::circle(1.0, Vec2::ZERO), Vec2::new(3.0, 0.0));
        assert!(collide(&a, &far).is_none());
    }

    #[test]
    fn test_circle_resting_on_box() {
        let ground = hull_at(Geometry::boxed(100.0, 10.0), Vec2::ZERO);
        let ball = hull_at(Geometry::circle(5.0, Vec2::ZERO), Vec2::new(0.0, 9.0));

        let m = collide(&ground, &ball).expect("ball touches ground");
        assert!((m.normal.y - 1.0).abs() < EPSILON, "normal points from ground to ball");
        assert!((m.points[0].depth - 1.0).abs() < EPSILON);

        let m = collide(&ball, &ground).expect("symmetric");
        assert!((m.normal.y + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_circle_near_box_corner() {
        let ground = hull_at(Geometry::boxed(10.0, 10.0), Vec2::ZERO);
        // diagonal from the (5, 5) corner, just out of reach
        let ball = hull_at(Geometry::circle(1.0, Vec2::ZERO), Vec2::new(5.8, 5.8));
        assert!(collide(&ground, &ball).is_none());

        let ball = hull_at(Geometry::circle(1.0, Vec2::ZERO), Vec2::new(5.5, 5.5));
        let m = collide(&ground, &ball).expect("corner contact");
        assert!(m.normal.x > 0.5 && m.normal.y > 0.5);
    }

    #[test]
    fn test_box_on_box_has_two_points() {
        let ground = hull_at(Geometry::boxed(100.0, 10.0), Vec2::ZERO);
        let crate_box = hull_at(Geometry::boxed(10.0, 10.0), Vec2::new(0.0, 9.5));

        let m = collide(&ground, &crate_box).expect("boxes overlap");
        assert!((m.normal.y - 1.0).abs() < EPSILON);
        assert_eq!(m.points.len(), 2);
        for p in &m.points {
            assert!((p.depth - 0.5).abs() < EPSILON);
            assert!(p.point.x.abs() <= 5.0 + EPSILON);
        }
    }

    #[test]
    fn test_separated_boxes() {
        let a = hull_at(Geometry::boxed(10.0, 10.0), Vec2::ZERO);
        let b = hull_at(Geometry::boxed(10.0, 10.0), Vec2::new(10.5, 0.0));
        assert!(collide(&a, &b).is_none());
    }

    #[test]
    fn test_segment_vs_circle() {
        let floor = hull_at(
            Geometry::segment(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 0.0),
            Vec2::ZERO,
        );
        let ball = hull_at(Geometry::circle(2.0, Vec2::ZERO), Vec2::new(3.0, 1.0));
        let m = collide(&floor, &ball).expect("ball on segment");
        assert!((m.normal.y - 1.0).abs() < EPSILON);
        assert!((m.max_depth() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_contains_point() {
        let hull = hull_at(Geometry::boxed(2.0, 2.0), Vec2::ZERO);
        assert!(contains_point(&hull, Vec2::new(0.5, 0.5)));
        assert!(!contains_point(&hull, Vec2::new(1.5, 0.5)));
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let q = closest_point_on_segment(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(-5.0, 3.0));
        assert_eq!(q, Vec2::ZERO);
        let q = closest_point_on_segment(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(4.0, 3.0));
        assert_eq!(q, Vec2::new(4.0, 0.0));
    }
}
