//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context and surface
//! - The quad pipeline
//! - Frame rendering and lost-surface recovery

use std::sync::Arc;

use sanic_core::{DrawList, Rect};
use sanic_render::{QuadPipeline, RenderContext, RenderError};
use winit::window::Window;

use crate::config::DisplayConfig;

/// The part of the window the level is drawn into, in level pixels
///
/// The top `hud_fraction` of the window is left to the HUD.
pub fn level_area(width: u32, height: u32, display: &DisplayConfig) -> Rect {
    let scale = if display.pixel_scale > 0.0 { display.pixel_scale } else { 1.0 };
    let w = width as f32 / scale;
    let h = height as f32 / scale;
    let hud = h * display.hud_fraction.clamp(0.0, 1.0);
    Rect::new(0.0, hud, w, h - hud)
}

/// The HUD strip across the top of the window, in level pixels
pub fn hud_area(width: u32, height: u32, display: &DisplayConfig) -> Rect {
    let level = level_area(width, height, display);
    Rect::new(0.0, 0.0, level.width, level.y)
}

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    pipeline: QuadPipeline,
    display: DisplayConfig,
}

impl RenderSystem {
    /// Create render system from window and config
    pub fn new(window: Arc<Window>, display: DisplayConfig, vsync: bool) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::new(window, vsync))?;
        let pipeline = QuadPipeline::new(&context.device, context.config.format);
        Ok(Self {
            context,
            pipeline,
            display,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(winit::dpi::PhysicalSize::new(width, height));
    }

    /// Level rectangle for the current surface size
    pub fn level_area(&self) -> Rect {
        let (width, height) = self.size();
        level_area(width, height, &self.display)
    }

    /// HUD rectangle for the current surface size
    pub fn hud_area(&self) -> Rect {
        let (width, height) = self.size();
        hud_area(width, height, &self.display)
    }

    /// Render a single frame
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame(&mut self, lists: &[DrawList]) -> Result<(), RenderError> {
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => match RenderError::from(e) {
                RenderError::SurfaceLost => {
                    log::warn!("Surface lost, reconfiguring");
                    self.context.reconfigure();
                    return Ok(());
                }
                other => return Err(other),
            },
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.pipeline.prepare(
            &self.context.device,
            &self.context.queue,
            lists,
            self.size(),
            self.display.pixel_scale,
        );

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let bg = &self.display.background_color;
        self.pipeline.render(
            &mut encoder,
            &view,
            wgpu::Color {
                r: bg[0] as f64,
                g: bg[1] as f64,
                b: bg[2] as f64,
                a: bg[3] as f64,
            },
        );

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Get current surface size
    pub fn size(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }
}
