//! 2D Mathematics Library
//!
//! Value types shared by the physics backend, the actor simulation and the renderer.
//!
//! ## Core Types
//!
//! - [`Vec2`] - 2D vector, y axis pointing up in world space
//! - [`Rect`] - axis-aligned rectangle used for hitboxes, cameras and viewports

mod vec2;
pub mod rect;

pub use vec2::Vec2;
pub use rect::Rect;
