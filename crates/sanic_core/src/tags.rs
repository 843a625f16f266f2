//! Collision taxonomy
//!
//! Every physics shape carries exactly one tag. Tag pairs are the only key
//! used to register contact handlers with the physics backend.

use sanic_physics::CollisionType;
use serde::{Deserialize, Serialize};

/// Closed set of collision categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum CollisionTag {
    /// Solid level geometry, moving platforms and enemy bodies
    #[default]
    Geometry = 0,
    Hero = 1,
    /// Enemy hazard sensors
    Enemy = 2,
    /// Leaving the level through one of these kills
    Boundary = 3,
    Trap = 4,
    /// Passable unless the hero asks to use them
    Stairs = 5,
}

impl CollisionTag {
    pub const ALL: [CollisionTag; 6] = [
        CollisionTag::Geometry,
        CollisionTag::Hero,
        CollisionTag::Enemy,
        CollisionTag::Boundary,
        CollisionTag::Trap,
        CollisionTag::Stairs,
    ];

    /// The backend collision type for this tag
    pub const fn collision_type(self) -> CollisionType {
        self as CollisionType
    }

    /// Map a backend collision type back onto the taxonomy
    pub fn from_collision_type(value: CollisionType) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.collision_type() == value)
    }
}

impl From<CollisionTag> for CollisionType {
    fn from(tag: CollisionTag) -> Self {
        tag.collision_type()
    }
}
