//! Quad drawing pipeline
//!
//! Every [`sanic_core::DrawList`] becomes a run of instanced quads drawn
//! with the scissor set to its viewport.

mod quad_pipeline;
mod types;

pub use quad_pipeline::{scissor_rect, QuadPipeline};
pub use types::{QuadInstance, ScreenUniforms};
