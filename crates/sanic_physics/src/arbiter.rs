//! Contact arbiters and tag-pair collision handlers

use sanic_math::Vec2;

use crate::body::BodyKey;
use crate::collision::ContactPoint;
use crate::shapes::{CollisionType, ShapeKey};

/// A touching pair of shapes as seen by a collision handler
///
/// Shape A always carries the first tag of the handler's registered pair.
#[derive(Clone, Debug)]
pub struct Arbiter {
    pub shape_a: ShapeKey,
    pub shape_b: ShapeKey,
    pub body_a: BodyKey,
    pub body_b: BodyKey,
    pub type_a: CollisionType,
    pub type_b: CollisionType,
    pub user_data_a: u64,
    pub user_data_b: u64,
    /// Points from shape A to shape B; zero in separate callbacks
    pub normal: Vec2,
    pub contacts: Vec<ContactPoint>,
    pub(crate) first_contact: bool,
    pub(crate) total_impulse: Vec2,
    pub(crate) retags: Vec<(ShapeKey, CollisionType)>,
}

impl Arbiter {
    pub(crate) fn new(
        (shape_a, body_a, type_a, user_data_a): (ShapeKey, BodyKey, CollisionType, u64),
        (shape_b, body_b, type_b, user_data_b): (ShapeKey, BodyKey, CollisionType, u64),
        normal: Vec2,
        contacts: Vec<ContactPoint>,
        first_contact: bool,
    ) -> Self {
        Self {
            shape_a,
            shape_b,
            body_a,
            body_b,
            type_a,
            type_b,
            user_data_a,
            user_data_b,
            normal,
            contacts,
            first_contact,
            total_impulse: Vec2::ZERO,
            retags: Vec::new(),
        }
    }

    /// Swap the A and B sides
    pub(crate) fn swapped(self) -> Self {
        Self {
            shape_a: self.shape_b,
            shape_b: self.shape_a,
            body_a: self.body_b,
            body_b: self.body_a,
            type_a: self.type_b,
            type_b: self.type_a,
            user_data_a: self.user_data_b,
            user_data_b: self.user_data_a,
            normal: -self.normal,
            ..self
        }
    }

    /// True during the first step the two shapes touch
    pub fn is_first_contact(&self) -> bool {
        self.first_contact
    }

    /// Impulse applied by the solver this step (post-solve only)
    pub fn total_impulse(&self) -> Vec2 {
        self.total_impulse
    }

    /// Change the collision type of a shape
    ///
    /// Applied as soon as the callback returns. Only the two shapes of this
    /// arbiter can be retagged; other keys are ignored.
    pub fn retag(&mut self, shape: ShapeKey, collision_type: CollisionType) {
        if shape != self.shape_a && shape != self.shape_b {
            return;
        }
        self.retags.push((shape, collision_type));
    }
}

/// Begin and pre-solve callbacks; returning false rejects the contact
pub type FilterFn<C> = fn(&mut C, &mut Arbiter) -> bool;
/// Post-solve and separate callbacks
pub type NotifyFn<C> = fn(&mut C, &mut Arbiter);

/// Callbacks for one pair of collision types
///
/// `C` is the context passed to [`crate::PhysicsWorld::step`], which lets the
/// callbacks reach game state the physics world does not own.
pub struct CollisionHandler<C> {
    pub begin: Option<FilterFn<C>>,
    pub pre_solve: Option<FilterFn<C>>,
    pub post_solve: Option<NotifyFn<C>>,
    pub separate: Option<NotifyFn<C>>,
}

impl<C> CollisionHandler<C> {
    pub fn new() -> Self {
        Self {
            begin: None,
            pre_solve: None,
            post_solve: None,
            separate: None,
        }
    }

    pub fn with_begin(mut self, f: FilterFn<C>) -> Self {
        self.begin = Some(f);
        self
    }

    pub fn with_pre_solve(mut self, f: FilterFn<C>) -> Self {
        self.pre_solve = Some(f);
        self
    }

    pub fn with_post_solve(mut self, f: NotifyFn<C>) -> Self {
        self.post_solve = Some(f);
        self
    }

    pub fn with_separate(mut self, f: NotifyFn<C>) -> Self {
        self.separate = Some(f);
        self
    }
}

impl<C> Default for CollisionHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for CollisionHandler<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CollisionHandler<C> {}

impl<C> std::fmt::Debug for CollisionHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionHandler")
            .field("begin", &self.begin.is_some())
            .field("pre_solve", &self.pre_solve.is_some())
            .field("post_solve", &self.post_solve.is_some())
            .field("separate", &self.separate.is_some())
            .finish()
    }
}
