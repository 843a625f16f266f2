//! GPU-compatible data types for the quad pipeline
//!
//! These types match the shader layouts exactly.

use bytemuck::{Pod, Zeroable};
use sanic_core::Quad;

/// One quad instance
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// Centre in logical screen pixels (y down)
    pub center: [f32; 2],
    pub size: [f32; 2],
    /// Radians, clockwise on screen
    pub angle: f32,
    pub color: [f32; 4],
}

impl From<&Quad> for QuadInstance {
    fn from(quad: &Quad) -> Self {
        Self {
            center: quad.center.to_array(),
            size: quad.size.to_array(),
            angle: quad.angle,
            color: quad.color,
        }
    }
}

/// Screen uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ScreenUniforms {
    /// Surface size in physical pixels
    pub size: [f32; 2],
    /// Physical pixels per logical pixel
    pub pixel_scale: f32,
    pub _padding: f32,
}

impl Default for ScreenUniforms {
    fn default() -> Self {
        Self {
            size: [1.0, 1.0],
            pixel_scale: 1.0,
            _padding: 0.0,
        }
    }
}
