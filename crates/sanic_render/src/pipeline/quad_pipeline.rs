//! Instanced quad pipeline
//!
//! [`QuadPipeline::prepare`] packs every draw list into one instance buffer
//! and remembers which range belongs to which viewport; [`QuadPipeline::render`]
//! clears the target and replays those ranges with per-viewport scissors.

use std::ops::Range;

use sanic_core::DrawList;
use sanic_math::Rect;
use wgpu::util::DeviceExt;

use super::types::{QuadInstance, ScreenUniforms};

const INITIAL_CAPACITY: usize = 1024;
const VERTICES_PER_QUAD: u32 = 6;

/// Clip a logical-pixel rectangle to a physical target
///
/// Returns `(x, y, width, height)` in physical pixels, or `None` when nothing
/// of the rectangle is on the target.
pub fn scissor_rect(rect: Rect, pixel_scale: f32, target: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let (tw, th) = (target.0 as f32, target.1 as f32);
    let x0 = (rect.x * pixel_scale).floor().clamp(0.0, tw);
    let y0 = (rect.y * pixel_scale).floor().clamp(0.0, th);
    let x1 = ((rect.x + rect.width) * pixel_scale).ceil().clamp(0.0, tw);
    let y1 = ((rect.y + rect.height) * pixel_scale).ceil().clamp(0.0, th);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// A prepared viewport: its scissor and instance range
#[derive(Debug, Clone)]
struct Batch {
    scissor: (u32, u32, u32, u32),
    instances: Range<u32>,
}

/// Draws [`DrawList`]s as solid quads
pub struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    batches: Vec<Batch>,
}

impl QuadPipeline {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Quad Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/quad.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Self::instance_buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // the y flip in the shader reverses winding
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Uniform Buffer"),
            contents: bytemuck::bytes_of(&ScreenUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quad Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            instance_buffer: Self::create_instance_buffer(device, INITIAL_CAPACITY),
            capacity: INITIAL_CAPACITY,
            batches: Vec::new(),
        }
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quad Instance Buffer"),
            size: (capacity * std::mem::size_of::<QuadInstance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Get the vertex buffer layout for QuadInstance
    fn instance_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // center: vec2<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                // size: vec2<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 8,
                    shader_location: 1,
                },
                // angle: f32
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 16,
                    shader_location: 2,
                },
                // color: vec4<f32>
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 20,
                    shader_location: 3,
                },
            ],
        }
    }

    /// Upload the frame's quads and screen uniforms
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        lists: &[DrawList],
        target: (u32, u32),
        pixel_scale: f32,
    ) {
        let mut instances: Vec<QuadInstance> = Vec::new();
        self.batches.clear();
        for list in lists {
            let Some(scissor) = scissor_rect(list.viewport, pixel_scale, target) else {
                continue;
            };
            let start = instances.len() as u32;
            instances.extend(list.quads.iter().map(QuadInstance::from));
            let end = instances.len() as u32;
            if end > start {
                self.batches.push(Batch {
                    scissor,
                    instances: start..end,
                });
            }
        }

        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.capacity);
            log::debug!("Quad instance buffer grown to {}", self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let uniforms = ScreenUniforms {
            size: [target.0.max(1) as f32, target.1.max(1) as f32],
            pixel_scale,
            _padding: 0.0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Clear `view` and draw the prepared batches
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, clear_color: wgpu::Color) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Quad Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        for batch in &self.batches {
            let (x, y, w, h) = batch.scissor;
            render_pass.set_scissor_rect(x, y, w, h);
            render_pass.draw(0..VERTICES_PER_QUAD, batch.instances.clone());
        }
    }

    /// Number of viewports with something to draw
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}
