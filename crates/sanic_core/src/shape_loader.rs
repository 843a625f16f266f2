//! Turns level objects into physics shapes
//!
//! Properties resolve object value first, then the level's category default,
//! then the built-in default. Static objects hang off the space's static body
//! with vertices in world space; dynamic objects get a body of their own.

use sanic_math::Vec2;
use sanic_physics::shapes::signed_area;
use sanic_physics::{
    moment_for_box, moment_for_circle, moment_for_poly, moment_for_segment, Body, BodyKey, CollisionLayer,
    Geometry, PhysicsWorld, Shape, ShapeKey, VelocityMode,
};

use crate::level_data::{BodyConfig, LevelData, LevelLoadError, LevelObject, ShapeConfig, ShapeTemplate};
use crate::tags::CollisionTag;

/// Thickness of segments that do not set a radius
pub const DEFAULT_SEGMENT_RADIUS: f32 = 1.0;

/// A shape created from a level object
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedShape {
    /// Object name, `{group}_{n}` when unnamed, `_{i}` suffixed per part
    pub name: String,
    pub group: String,
    pub shape: ShapeKey,
    pub body: BodyKey,
    pub is_static: bool,
}

/// Fully resolved object properties
#[derive(Debug, Clone, Copy)]
struct Props {
    tag: CollisionTag,
    elasticity: f32,
    friction: f32,
    layers: CollisionLayer,
    sensor: bool,
    radius: f32,
    is_static: bool,
    mass: f32,
    moment: Option<f32>,
    angle: f32,
    offset: Vec2,
    velocity_mode: VelocityMode,
}

impl Props {
    fn resolve(shape: &ShapeConfig, body: &BodyConfig, template: &ShapeTemplate, default_radius: f32) -> Self {
        let shape = shape.or(&template.shape);
        let body = body.or(&template.body);
        Self {
            tag: shape.collision_type.unwrap_or_default(),
            elasticity: shape.elasticity.unwrap_or(0.0),
            friction: shape.friction.unwrap_or(0.0),
            layers: shape
                .layers
                .map_or(CollisionLayer::ALL, CollisionLayer::from_bits_truncate),
            sensor: shape.sensor.unwrap_or(false),
            radius: shape.radius.unwrap_or(default_radius),
            is_static: body.is_static.unwrap_or(true),
            mass: body.mass.unwrap_or(1.0),
            moment: body.moment,
            angle: body.angle.unwrap_or(0.0),
            offset: body.offset.map_or(Vec2::ZERO, Vec2::from),
            velocity_mode: body.velocity_mode.unwrap_or_default(),
        }
    }

    fn shape(&self, body: BodyKey, geometry: Geometry) -> Shape {
        Shape::new(body, geometry)
            .with_collision_type(self.tag.collision_type())
            .with_friction(self.friction)
            .with_elasticity(self.elasticity)
            .with_sensor(self.sensor)
            .with_layers(self.layers)
    }

    fn body(&self, position: Vec2, computed_moment: f32) -> Body {
        Body::new(self.mass, self.moment.unwrap_or(computed_moment))
            .with_position(position)
            .with_angle(self.angle)
            .with_velocity_mode(self.velocity_mode)
    }
}

/// Convex polygon with a rounding radius
fn rounded_poly(verts: &[Vec2], offset: Vec2, radius: f32) -> Geometry {
    match Geometry::poly(verts, offset) {
        Geometry::Poly { verts, .. } => Geometry::Poly { verts, radius },
        other => other,
    }
}

/// Whether a closed outline is convex (either winding)
pub fn is_convex(points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let n = points.len();
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let turn = (b - a).cross(c - b);
        if turn.abs() <= f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    true
}

fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    (b - a).cross(p - a) >= 0.0 && (c - b).cross(p - b) >= 0.0 && (a - c).cross(p - c) >= 0.0
}

/// Split a simple polygon into counter-clockwise triangles by ear clipping
pub fn triangulate(points: &[Vec2]) -> Result<Vec<[Vec2; 3]>, LevelLoadError> {
    if points.len() < 3 {
        return Err(LevelLoadError::Invalid(format!(
            "polygon needs 3 points, got {}",
            points.len()
        )));
    }
    let mut outline = points.to_vec();
    if signed_area(&outline) < 0.0 {
        outline.reverse();
    }

    let mut triangles = Vec::with_capacity(outline.len() - 2);
    while outline.len() > 3 {
        let n = outline.len();
        let ear = (0..n).find(|&i| {
            let prev = outline[(i + n - 1) % n];
            let cur = outline[i];
            let next = outline[(i + 1) % n];
            if (cur - prev).cross(next - cur) <= 0.0 {
                return false;
            }
            !outline.iter().enumerate().any(|(j, p)| {
                j != i && j != (i + n - 1) % n && j != (i + 1) % n && in_triangle(*p, prev, cur, next)
            })
        });
        let Some(i) = ear else {
            return Err(LevelLoadError::Invalid("polygon is self-intersecting or degenerate".to_string()));
        };
        triangles.push([outline[(i + n - 1) % n], outline[i], outline[(i + 1) % n]]);
        outline.remove(i);
    }
    triangles.push([outline[0], outline[1], outline[2]]);
    Ok(triangles)
}

/// Load every shape object of every group into the space
///
/// Markers are skipped. Objects are named in file order.
pub fn load_shapes<C>(level: &LevelData, space: &mut PhysicsWorld<C>) -> Result<Vec<LoadedShape>, LevelLoadError> {
    let mut loaded = Vec::new();
    for group in &level.object_groups {
        for (index, object) in group.objects.iter().enumerate() {
            if object.is_marker() {
                continue;
            }
            let name = object
                .name()
                .map_or_else(|| format!("{}_{}", group.name, index), str::to_string);
            let parts = load_object(level, space, object)?;
            let multi = parts.len() > 1;
            for (i, (shape, body, is_static)) in parts.into_iter().enumerate() {
                let part_name = if multi { format!("{}_{}", name, i) } else { name.clone() };
                log::debug!("Loaded shape {}", part_name);
                loaded.push(LoadedShape {
                    name: part_name,
                    group: group.name.clone(),
                    shape,
                    body,
                    is_static,
                });
            }
        }
    }
    log::info!("Loaded {} shapes from level '{}'", loaded.len(), level.name);
    Ok(loaded)
}

type Part = (ShapeKey, BodyKey, bool);

fn add_part<C>(space: &mut PhysicsWorld<C>, shape: Shape, is_static: bool) -> Result<Part, LevelLoadError> {
    let body = shape.body;
    space
        .add_shape(shape)
        .map(|key| (key, body, is_static))
        .ok_or_else(|| LevelLoadError::Invalid("shape body missing".to_string()))
}

fn load_object<C>(
    level: &LevelData,
    space: &mut PhysicsWorld<C>,
    object: &LevelObject,
) -> Result<Vec<Part>, LevelLoadError> {
    let defaults = &level.defaults;
    let map_height = level.pixel_height();
    let anchor = space.static_body();

    match object {
        LevelObject::Box {
            x,
            y,
            width,
            height,
            shape,
            body,
            ..
        } => {
            let props = Props::resolve(shape, body, &defaults.boxes, 0.0);
            if props.is_static {
                let top = map_height - y;
                let bottom = map_height - (y + height);
                let verts = [
                    Vec2::new(*x, top),
                    Vec2::new(*x, bottom),
                    Vec2::new(x + width, bottom),
                    Vec2::new(x + width, top),
                ];
                let geometry = rounded_poly(&verts, props.offset, props.radius);
                Ok(vec![add_part(space, props.shape(anchor, geometry), true)?])
            } else {
                let center = level.to_world(x + width * 0.5, y + height * 0.5);
                let moment = moment_for_box(props.mass, *width, *height);
                let body = space.add_body(props.body(center, moment));
                let hw = width * 0.5;
                let hh = height * 0.5;
                let verts = [
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ];
                let geometry = rounded_poly(&verts, props.offset, props.radius);
                Ok(vec![add_part(space, props.shape(body, geometry), false)?])
            }
        }
        LevelObject::Circle {
            x,
            y,
            width,
            height,
            shape,
            body,
            ..
        } => {
            if (width - height).abs() > f32::EPSILON {
                return Err(LevelLoadError::Invalid(format!(
                    "circles must be round, got {}x{}",
                    width, height
                )));
            }
            let props = Props::resolve(shape, body, &defaults.circle, 0.0);
            let radius = width * 0.5;
            let center = level.to_world(x + radius, y + radius);
            if props.is_static {
                let geometry = Geometry::circle(radius, center + props.offset);
                Ok(vec![add_part(space, props.shape(anchor, geometry), true)?])
            } else {
                let moment = moment_for_circle(props.mass, 0.0, radius, props.offset);
                let body = space.add_body(props.body(center, moment));
                let geometry = Geometry::circle(radius, props.offset);
                Ok(vec![add_part(space, props.shape(body, geometry), false)?])
            }
        }
        LevelObject::Poly {
            x,
            y,
            points,
            shape,
            body,
            ..
        } => {
            let props = Props::resolve(shape, body, &defaults.poly, 0.0);
            // outline relative to the object origin, y flipped
            let local: Vec<Vec2> = points.iter().map(|(px, py)| Vec2::new(*px, -*py)).collect();
            let pieces = if is_convex(&local) {
                vec![local.clone()]
            } else {
                triangulate(&local)?.into_iter().map(|t| t.to_vec()).collect()
            };
            let origin = level.to_world(*x, *y);

            if props.is_static {
                pieces
                    .iter()
                    .map(|piece| {
                        let world: Vec<Vec2> = piece.iter().map(|p| *p + origin).collect();
                        let geometry = rounded_poly(&world, props.offset, props.radius);
                        add_part(space, props.shape(anchor, geometry), true)
                    })
                    .collect()
            } else {
                let moment = moment_for_poly(props.mass, &local, props.offset);
                let body = space.add_body(props.body(origin, moment));
                pieces
                    .iter()
                    .map(|piece| {
                        let geometry = rounded_poly(piece, props.offset, props.radius);
                        add_part(space, props.shape(body, geometry), false)
                    })
                    .collect()
            }
        }
        LevelObject::Segment {
            x,
            y,
            points,
            shape,
            body,
            ..
        } => {
            let props = Props::resolve(shape, body, &defaults.segment, DEFAULT_SEGMENT_RADIUS);
            let (a, b) = match points.as_slice() {
                [a, b, ..] => (Vec2::new(a.0, -a.1), Vec2::new(b.0, -b.1)),
                _ => {
                    return Err(LevelLoadError::Invalid(format!(
                        "segment needs 2 points, got {}",
                        points.len()
                    )))
                }
            };
            let origin = level.to_world(*x, *y);
            if props.is_static {
                let geometry = Geometry::segment(a + origin, b + origin, props.radius);
                Ok(vec![add_part(space, props.shape(anchor, geometry), true)?])
            } else {
                let moment = moment_for_segment(props.mass, a, b);
                let body = space.add_body(props.body(origin, moment));
                let geometry = Geometry::segment(a, b, props.radius);
                Ok(vec![add_part(space, props.shape(body, geometry), false)?])
            }
        }
        LevelObject::Marker { .. } => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level_data::{ObjectGroup, ShapeDefaults};
    use std::collections::HashMap;

    const EPSILON: f32 = 1e-4;

    fn level(objects: Vec<LevelObject>) -> LevelData {
        LevelData {
            name: "test".to_string(),
            width: 10,
            height: 10,
            tile_width: 10,
            tile_height: 10,
            palette: HashMap::new(),
            tiles: Vec::new(),
            defaults: ShapeDefaults::default(),
            object_groups: vec![ObjectGroup {
                name: "Physics".to_string(),
                objects,
            }],
            platform_color: [1.0; 4],
        }
    }

    fn static_box(x: f32, y: f32, width: f32, height: f32) -> LevelObject {
        LevelObject::Box {
            name: None,
            x,
            y,
            width,
            height,
            shape: ShapeConfig::default(),
            body: BodyConfig::default(),
        }
    }

    #[test]
    fn test_convexity() {
        let square = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        assert!(is_convex(&square));
        let mut clockwise = square;
        clockwise.reverse();
        assert!(is_convex(&clockwise));

        let notch = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!(!is_convex(&notch));
    }

    #[test]
    fn test_triangulate_l_shape() {
        let l_shape = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let triangles = triangulate(&l_shape).expect("simple polygon");
        assert_eq!(triangles.len(), 4);
        let area: f32 = triangles.iter().map(|t| signed_area(t)).sum();
        assert!((area - 3.0).abs() < EPSILON, "area {}", area);
        assert!(triangles.iter().all(|t| signed_area(t) > 0.0));
    }

    #[test]
    fn test_static_box_is_flipped() {
        let level = level(vec![static_box(10.0, 20.0, 30.0, 40.0)]);
        let mut space: PhysicsWorld = PhysicsWorld::new();
        let shapes = load_shapes(&level, &mut space).expect("loads");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "Physics_0");
        assert!(shapes[0].is_static);
        assert_eq!(shapes[0].body, space.static_body());

        // map is 100 high: y 20..60 down becomes 80..40 up
        let bbox = space.shape_bounding_box(shapes[0].shape).expect("bbox");
        assert!((bbox.x - 10.0).abs() < EPSILON);
        assert!((bbox.y - 40.0).abs() < EPSILON);
        assert!((bbox.width - 30.0).abs() < EPSILON);
        assert!((bbox.height - 40.0).abs() < EPSILON);
    }

    #[test]
    fn test_builtin_and_category_defaults() {
        let mut level = level(vec![static_box(0.0, 0.0, 10.0, 10.0)]);
        let mut space: PhysicsWorld = PhysicsWorld::new();
        let shapes = load_shapes(&level, &mut space).expect("loads");
        let shape = space.get_shape(shapes[0].shape).expect("shape");
        assert_eq!(shape.material.friction, 0.0);
        assert_eq!(shape.layers, CollisionLayer::ALL);
        assert_eq!(shape.collision_type, CollisionTag::Geometry.collision_type());

        level.defaults.boxes.shape.friction = Some(0.7);
        level.defaults.boxes.shape.collision_type = Some(CollisionTag::Trap);
        let shapes = load_shapes(&level, &mut space).expect("loads");
        let shape = space.get_shape(shapes[0].shape).expect("shape");
        assert_eq!(shape.material.friction, 0.7);
        assert_eq!(shape.collision_type, CollisionTag::Trap.collision_type());
    }

    #[test]
    fn test_dynamic_box_gets_centered_body() {
        let object = LevelObject::Box {
            name: Some("moving_1".to_string()),
            x: 10.0,
            y: 10.0,
            width: 40.0,
            height: 20.0,
            shape: ShapeConfig::default(),
            body: BodyConfig {
                is_static: Some(false),
                mass: Some(5.0),
                ..BodyConfig::default()
            },
        };
        let level = level(vec![object]);
        let mut space: PhysicsWorld = PhysicsWorld::new();
        let shapes = load_shapes(&level, &mut space).expect("loads");
        assert_eq!(shapes[0].name, "moving_1");
        assert!(!shapes[0].is_static);
        let body = space.get_body(shapes[0].body).expect("body");
        assert_eq!(body.position, Vec2::new(30.0, 80.0));
        assert_eq!(body.mass, 5.0);
        assert!((body.moment - moment_for_box(5.0, 40.0, 20.0)).abs() < EPSILON);
    }

    #[test]
    fn test_circle_must_be_round() {
        let oval = LevelObject::Circle {
            name: None,
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 12.0,
            shape: ShapeConfig::default(),
            body: BodyConfig::default(),
        };
        let mut space: PhysicsWorld = PhysicsWorld::new();
        assert!(matches!(
            load_shapes(&level(vec![oval]), &mut space),
            Err(LevelLoadError::Invalid(_))
        ));
    }

    #[test]
    fn test_static_circle_centre() {
        let circle = LevelObject::Circle {
            name: None,
            x: 20.0,
            y: 30.0,
            width: 10.0,
            height: 10.0,
            shape: ShapeConfig::default(),
            body: BodyConfig::default(),
        };
        let mut space: PhysicsWorld = PhysicsWorld::new();
        let shapes = load_shapes(&level(vec![circle]), &mut space).expect("loads");
        let bbox = space.shape_bounding_box(shapes[0].shape).expect("bbox");
        assert!((bbox.center().x - 25.0).abs() < EPSILON);
        assert!((bbox.center().y - 65.0).abs() < EPSILON);
    }

    #[test]
    fn test_concave_poly_parts_are_suffixed() {
        let notch = LevelObject::Poly {
            name: Some("ramp".to_string()),
            x: 0.0,
            y: 50.0,
            points: vec![(0.0, 0.0), (20.0, 0.0), (20.0, -20.0), (10.0, -10.0), (0.0, -20.0)],
            shape: ShapeConfig::default(),
            body: BodyConfig::default(),
        };
        let mut space: PhysicsWorld = PhysicsWorld::new();
        let shapes = load_shapes(&level(vec![notch]), &mut space).expect("loads");
        assert_eq!(shapes.len(), 3);
        let names: Vec<&str> = shapes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ramp_0", "ramp_1", "ramp_2"]);
    }

    #[test]
    fn test_segment_default_radius_and_markers_skipped() {
        let segment = LevelObject::Segment {
            name: None,
            x: 0.0,
            y: 90.0,
            points: vec![(0.0, 0.0), (50.0, 0.0)],
            shape: ShapeConfig::default(),
            body: BodyConfig::default(),
        };
        let marker = LevelObject::Marker {
            name: None,
            kind: "sanic".to_string(),
            x: 0.0,
            y: 0.0,
        };
        let mut space: PhysicsWorld = PhysicsWorld::new();
        let shapes = load_shapes(&level(vec![marker, segment]), &mut space).expect("loads");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "Physics_1");
        let shape = space.get_shape(shapes[0].shape).expect("segment");
        assert!(matches!(shape.geometry, Geometry::Segment { radius, .. } if radius == DEFAULT_SEGMENT_RADIUS));
    }
}
