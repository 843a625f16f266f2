//! Physics world and simulation

use std::collections::{HashMap, HashSet};

use sanic_math::{Rect, Vec2};
use slotmap::SlotMap;

use crate::arbiter::{Arbiter, CollisionHandler};
use crate::body::{Body, BodyKey};
use crate::collision::{collide, ContactPoint, Manifold};
use crate::joints::{Constraint, ConstraintKey};
use crate::material::PhysicsMaterial;
use crate::shapes::{CollisionType, Hull, Shape, ShapeKey};

/// Fraction of penetration resolved per step
const BIAS_COEF: f32 = 0.2;
/// Penetration allowed before position correction kicks in
const SLOP: f32 = 0.5;
/// Cap on the correction velocity so deep overlaps do not explode
const MAX_BIAS: f32 = 300.0;
/// Approach speed below which contacts do not bounce
const BOUNCE_THRESHOLD: f32 = 1.0;

/// Configuration for the physics simulation
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    /// Gravity acceleration (applied to Y-axis, negative = down)
    pub gravity: f32,
    /// Solver iterations per step
    pub iterations: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -1500.0,
            iterations: 10,
        }
    }
}

impl PhysicsConfig {
    /// Create a new physics config with the given gravity
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PairState {
    /// A begin callback rejected the pair; skip it until it separates
    ignored: bool,
}

struct Candidate<'a> {
    key: ShapeKey,
    shape: &'a Shape,
    hull: Hull,
    bounds: Rect,
    dynamic: bool,
}

struct SolverContact {
    r_a: Vec2,
    r_b: Vec2,
    n_mass: f32,
    t_mass: f32,
    target: f32,
    jn_acc: f32,
    jt_acc: f32,
}

struct SolverPair<C> {
    arbiter: Arbiter,
    handler: Option<CollisionHandler<C>>,
    material: PhysicsMaterial,
    contacts: Vec<SolverContact>,
}

impl<C> SolverPair<C> {
    fn prepare(&mut self, a: &Body, b: &Body, dt: f32) {
        let n = self.arbiter.normal;
        let t = n.perp();
        let (ima, imb) = (a.inv_mass(), b.inv_mass());
        let (iia, iib) = (a.inv_moment(), b.inv_moment());
        let elasticity = self.material.elasticity;

        self.contacts = self
            .arbiter
            .contacts
            .iter()
            .filter_map(|c| {
                let r_a = c.point - a.position;
                let r_b = c.point - b.position;
                let rna = r_a.cross(n);
                let rnb = r_b.cross(n);
                let kn = ima + imb + iia * rna * rna + iib * rnb * rnb;
                if kn <= 0.0 {
                    return None;
                }
                let rta = r_a.cross(t);
                let rtb = r_b.cross(t);
                let kt = ima + imb + iia * rta * rta + iib * rtb * rtb;

                let vrn = n.dot(b.velocity_at_offset(r_b) - a.velocity_at_offset(r_a));
                let bounce = if vrn < -BOUNCE_THRESHOLD { -elasticity * vrn } else { 0.0 };
                let bias = ((BIAS_COEF / dt) * (c.depth - SLOP).max(0.0)).min(MAX_BIAS);

                Some(SolverContact {
                    r_a,
                    r_b,
                    n_mass: 1.0 / kn,
                    t_mass: if kt > 0.0 { 1.0 / kt } else { 0.0 },
                    target: bounce.max(bias),
                    jn_acc: 0.0,
                    jt_acc: 0.0,
                })
            })
            .collect();
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body) {
        let n = self.arbiter.normal;
        let t = n.perp();
        let friction = self.material.friction;

        for c in &mut self.contacts {
            let vr = b.velocity_at_offset(c.r_b) - a.velocity_at_offset(c.r_a);
            let jn = (c.target - n.dot(vr)) * c.n_mass;
            let old = c.jn_acc;
            c.jn_acc = (old + jn).max(0.0);
            let p = n * (c.jn_acc - old);
            a.apply_impulse_at(-p, c.r_a);
            b.apply_impulse_at(p, c.r_b);

            let vr = b.velocity_at_offset(c.r_b) - a.velocity_at_offset(c.r_a);
            let jt = -t.dot(vr) * c.t_mass;
            let max = if c.jn_acc > 0.0 { friction * c.jn_acc } else { 0.0 };
            let old = c.jt_acc;
            c.jt_acc = (old + jt).clamp(-max, max);
            let p = t * (c.jt_acc - old);
            a.apply_impulse_at(-p, c.r_a);
            b.apply_impulse_at(p, c.r_b);
        }
    }

    fn total_impulse(&self) -> Vec2 {
        let n = self.arbiter.normal;
        let t = n.perp();
        self.contacts
            .iter()
            .fold(Vec2::ZERO, |acc, c| acc + n * c.jn_acc + t * c.jt_acc)
    }
}

/// The physics world containing bodies, shapes, constraints and contact handlers
///
/// `C` is the context handed to collision callbacks during [`PhysicsWorld::step`].
pub struct PhysicsWorld<C = ()> {
    /// All bodies (using generational keys)
    bodies: SlotMap<BodyKey, Body>,
    shapes: SlotMap<ShapeKey, Shape>,
    constraints: SlotMap<ConstraintKey, Constraint>,
    /// Built-in body that level geometry hangs off
    static_body: BodyKey,
    handlers: HashMap<(CollisionType, CollisionType), CollisionHandler<C>>,
    /// Shape pairs touching as of the last step
    pairs: HashMap<(ShapeKey, ShapeKey), PairState>,
    /// Physics configuration
    pub config: PhysicsConfig,
}

impl<C> PhysicsWorld<C> {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        let mut bodies = SlotMap::with_key();
        let static_body = bodies.insert(Body::new_static());
        Self {
            bodies,
            shapes: SlotMap::with_key(),
            constraints: SlotMap::with_key(),
            static_body,
            handlers: HashMap::new(),
            pairs: HashMap::new(),
            config,
        }
    }

    /// The world's own static body
    pub fn static_body(&self) -> BodyKey {
        self.static_body
    }

    /// Add a body to the world and return its key
    pub fn add_body(&mut self, body: Body) -> BodyKey {
        self.bodies.insert(body)
    }

    /// Remove a body together with every shape and constraint attached to it
    ///
    /// The built-in static body cannot be removed.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        if key == self.static_body {
            return None;
        }
        let body = self.bodies.remove(key)?;

        let shapes: Vec<ShapeKey> = self
            .shapes
            .iter()
            .filter(|(_, s)| s.body == key)
            .map(|(k, _)| k)
            .collect();
        for shape in shapes {
            self.remove_shape(shape);
        }
        self.constraints
            .retain(|_, c| c.body_a != key && c.body_b != key);

        Some(body)
    }

    /// Get an immutable reference to a body by key
    pub fn get_body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Get a mutable reference to a body by key
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key)
    }

    /// Number of bodies, including the built-in static body
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body_keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.bodies.keys()
    }

    /// Attach a shape; fails if its body does not exist
    pub fn add_shape(&mut self, shape: Shape) -> Option<ShapeKey> {
        if !self.bodies.contains_key(shape.body) {
            return None;
        }
        Some(self.shapes.insert(shape))
    }

    /// Remove a shape
    ///
    /// Pairs involving the shape are dropped without a separate callback.
    pub fn remove_shape(&mut self, key: ShapeKey) -> Option<Shape> {
        let shape = self.shapes.remove(key)?;
        self.pairs.retain(|(a, b), _| *a != key && *b != key);
        Some(shape)
    }

    pub fn get_shape(&self, key: ShapeKey) -> Option<&Shape> {
        self.shapes.get(key)
    }

    pub fn get_shape_mut(&mut self, key: ShapeKey) -> Option<&mut Shape> {
        self.shapes.get_mut(key)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeKey, &Shape)> + '_ {
        self.shapes.iter()
    }

    /// World-space geometry of a shape
    pub fn shape_hull(&self, key: ShapeKey) -> Option<Hull> {
        let shape = self.shapes.get(key)?;
        let body = self.bodies.get(shape.body)?;
        Some(shape.geometry.to_hull(body))
    }

    /// World-space (y-up) bounding box of a shape
    pub fn shape_bounding_box(&self, key: ShapeKey) -> Option<Rect> {
        self.shape_hull(key).map(|h| h.bounding_box())
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Option<ConstraintKey> {
        if !self.bodies.contains_key(constraint.body_a) || !self.bodies.contains_key(constraint.body_b) {
            return None;
        }
        Some(self.constraints.insert(constraint))
    }

    pub fn remove_constraint(&mut self, key: ConstraintKey) -> Option<Constraint> {
        self.constraints.remove(key)
    }

    pub fn get_constraint(&self, key: ConstraintKey) -> Option<&Constraint> {
        self.constraints.get(key)
    }

    pub fn get_constraint_mut(&mut self, key: ConstraintKey) -> Option<&mut Constraint> {
        self.constraints.get_mut(key)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Register callbacks for a pair of collision types, replacing any existing ones
    ///
    /// The pair is unordered: arbiters are presented with shape A carrying `a`.
    pub fn add_collision_handler(&mut self, a: CollisionType, b: CollisionType, handler: CollisionHandler<C>) {
        self.handlers.remove(&(b, a));
        self.handlers.insert((a, b), handler);
    }

    /// Remove a handler; returns false if none was registered
    pub fn remove_collision_handler(&mut self, a: CollisionType, b: CollisionType) -> bool {
        self.handlers.remove(&(a, b)).is_some() || self.handlers.remove(&(b, a)).is_some()
    }

    pub fn has_collision_handler(&self, a: CollisionType, b: CollisionType) -> bool {
        self.handlers.contains_key(&(a, b)) || self.handlers.contains_key(&(b, a))
    }

    /// Number of shape pairs currently in contact
    pub fn contact_count(&self) -> usize {
        self.pairs.len()
    }

    /// Step the physics simulation forward by dt seconds
    ///
    /// This performs:
    /// 1. Velocity integration (gravity, accumulated forces)
    /// 2. Contact detection and begin/pre-solve callbacks
    /// 3. Sequential impulse solve of constraints and contacts
    /// 4. Position integration
    /// 5. Post-solve callbacks, then separate callbacks for pairs that stopped touching
    pub fn step(&mut self, dt: f32, ctx: &mut C) {
        if dt <= 0.0 {
            return;
        }
        let gravity = Vec2::new(0.0, self.config.gravity);

        // Phase 1: integrate velocities
        for body in self.bodies.values_mut() {
            body.integrate_velocity(gravity, dt);
        }

        // Phase 2: detect contacts and filter them through the handlers
        let candidates = self.detect();
        let mut touching = HashSet::with_capacity(candidates.len());
        let mut solving: Vec<SolverPair<C>> = Vec::new();

        for (ka, kb, manifold) in candidates {
            let key = pair_key(ka, kb);
            touching.insert(key);

            let first = !self.pairs.contains_key(&key);
            let ignored = self.pairs.entry(key).or_default().ignored;
            if ignored {
                continue;
            }

            let Some(arbiter) = self.make_arbiter(ka, kb, manifold.normal, manifold.points, first) else {
                continue;
            };
            let (mut arbiter, handler) = self.orient(arbiter);

            if first {
                if let Some(begin) = handler.and_then(|h| h.begin) {
                    let accepted = begin(ctx, &mut arbiter);
                    self.apply_retags(&mut arbiter);
                    if !accepted {
                        if let Some(state) = self.pairs.get_mut(&key) {
                            state.ignored = true;
                        }
                        continue;
                    }
                }
            }

            if let Some(pre_solve) = handler.and_then(|h| h.pre_solve) {
                let accepted = pre_solve(ctx, &mut arbiter);
                self.apply_retags(&mut arbiter);
                if !accepted {
                    continue;
                }
            }

            let (Some(sa), Some(sb)) = (self.shapes.get(ka), self.shapes.get(kb)) else {
                continue;
            };
            if sa.sensor || sb.sensor {
                continue;
            }
            let material = sa.material.combine(&sb.material);

            solving.push(SolverPair {
                arbiter,
                handler,
                material,
                contacts: Vec::new(),
            });
        }

        // Phase 3: solve
        for constraint in self.constraints.values_mut() {
            if let Some([a, b]) = self.bodies.get_disjoint_mut([constraint.body_a, constraint.body_b]) {
                constraint.pre_step(a, b, dt);
            }
        }
        for pair in solving.iter_mut() {
            if let Some([a, b]) = self.bodies.get_disjoint_mut([pair.arbiter.body_a, pair.arbiter.body_b]) {
                pair.prepare(a, b, dt);
            }
        }
        for _ in 0..self.config.iterations {
            for constraint in self.constraints.values_mut() {
                if let Some([a, b]) = self.bodies.get_disjoint_mut([constraint.body_a, constraint.body_b]) {
                    constraint.apply_impulse(a, b, dt);
                }
            }
            for pair in solving.iter_mut() {
                if let Some([a, b]) = self.bodies.get_disjoint_mut([pair.arbiter.body_a, pair.arbiter.body_b]) {
                    pair.apply_impulse(a, b);
                }
            }
        }

        // Phase 4: integrate positions
        for body in self.bodies.values_mut() {
            body.integrate_position(dt);
        }

        // Phase 5: notify
        for pair in solving.iter_mut() {
            pair.arbiter.total_impulse = pair.total_impulse();
            if let Some(post_solve) = pair.handler.and_then(|h| h.post_solve) {
                post_solve(ctx, &mut pair.arbiter);
                self.apply_retags(&mut pair.arbiter);
            }
        }

        let ended: Vec<(ShapeKey, ShapeKey)> = self
            .pairs
            .keys()
            .filter(|k| !touching.contains(*k))
            .copied()
            .collect();
        for key in ended {
            self.pairs.remove(&key);
            let Some(arbiter) = self.make_arbiter(key.0, key.1, Vec2::ZERO, Vec::new(), false) else {
                continue;
            };
            let (mut arbiter, handler) = self.orient(arbiter);
            if let Some(separate) = handler.and_then(|h| h.separate) {
                separate(ctx, &mut arbiter);
                self.apply_retags(&mut arbiter);
            }
        }
    }

    /// Brute-force broad phase followed by the narrow phase
    fn detect(&self) -> Vec<(ShapeKey, ShapeKey, Manifold)> {
        let candidates: Vec<Candidate<'_>> = self
            .shapes
            .iter()
            .filter_map(|(key, shape)| {
                let body = self.bodies.get(shape.body)?;
                let hull = shape.geometry.to_hull(body);
                let bounds = hull.bounding_box();
                Some(Candidate {
                    key,
                    shape,
                    hull,
                    bounds,
                    dynamic: body.is_dynamic(),
                })
            })
            .collect();

        let mut found = Vec::new();
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if !a.dynamic && !b.dynamic {
                    continue;
                }
                if a.shape.body == b.shape.body {
                    continue;
                }
                if !a.shape.layers.collides_with(&b.shape.layers) {
                    continue;
                }
                if !a.bounds.intersects(&b.bounds) {
                    continue;
                }
                if let Some(manifold) = collide(&a.hull, &b.hull) {
                    if !manifold.points.is_empty() {
                        found.push((a.key, b.key, manifold));
                    }
                }
            }
        }
        found
    }

    fn make_arbiter(
        &self,
        ka: ShapeKey,
        kb: ShapeKey,
        normal: Vec2,
        contacts: Vec<ContactPoint>,
        first: bool,
    ) -> Option<Arbiter> {
        let sa = self.shapes.get(ka)?;
        let sb = self.shapes.get(kb)?;
        Some(Arbiter::new(
            (ka, sa.body, sa.collision_type, sa.user_data),
            (kb, sb.body, sb.collision_type, sb.user_data),
            normal,
            contacts,
            first,
        ))
    }

    /// Find the handler for an arbiter and swap it to match the registered order
    fn orient(&self, arbiter: Arbiter) -> (Arbiter, Option<CollisionHandler<C>>) {
        if let Some(handler) = self.handlers.get(&(arbiter.type_a, arbiter.type_b)) {
            return (arbiter, Some(*handler));
        }
        if let Some(handler) = self.handlers.get(&(arbiter.type_b, arbiter.type_a)) {
            let handler = *handler;
            return (arbiter.swapped(), Some(handler));
        }
        (arbiter, None)
    }

    fn apply_retags(&mut self, arbiter: &mut Arbiter) {
        for (key, collision_type) in std::mem::take(&mut arbiter.retags) {
            if let Some(shape) = self.shapes.get_mut(key) {
                shape.collision_type = collision_type;
            }
            if key == arbiter.shape_a {
                arbiter.type_a = collision_type;
            } else if key == arbiter.shape_b {
                arbiter.type_b = collision_type;
            }
        }
    }
}

impl<C> Default for PhysicsWorld<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn pair_key(a: ShapeKey, b: ShapeKey) -> (ShapeKey, ShapeKey) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
