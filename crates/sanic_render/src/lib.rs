//! Rendering for Sanic Forever
//!
//! This crate draws the screen-space [`sanic_core::DrawList`]s produced by
//! the level's viewports.
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`pipeline::QuadPipeline`] - Instanced solid quads with per-viewport scissors

pub mod context;
pub mod pipeline;

pub use context::{RenderContext, RenderError};
pub use pipeline::{QuadInstance, QuadPipeline, ScreenUniforms};

// Re-export the draw list types for convenience
pub use sanic_core::{DrawList, Quad};
