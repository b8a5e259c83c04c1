use std::cell::Cell;
use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::{MultisampleState, PipelineCompilationOptions, RenderPass, RenderPassDescriptor};

use crate::experience::OverlayQuad;
use crate::rendering::{
    passes::{pass::Pass, render_pass_context::PassCreationContext},
    shader_loader::{self, ShaderDefinition},
};

const OVERLAY_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Overlay Shader",
    source: include_str!("../../shaders/overlay.wgsl"),
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

        wgpu::VertexBufferLayout {
            array_stride: size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Two triangles per quad, pixels converted to clip space.
pub fn quad_vertices(quads: &[OverlayQuad], viewport: Vec2) -> Vec<OverlayVertex> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec::new();
    }

    let to_clip = |pixel: Vec2| {
        let ndc = pixel / viewport * 2.0 - Vec2::ONE;
        [ndc.x, -ndc.y]
    };

    quads
        .iter()
        .flat_map(|quad| {
            let color = quad.color.to_array();
            let corners = [
                to_clip(quad.min),
                to_clip(Vec2::new(quad.max.x, quad.min.y)),
                to_clip(quad.max),
                to_clip(Vec2::new(quad.min.x, quad.max.y)),
            ];
            [0, 1, 2, 0, 2, 3].map(|i| OverlayVertex {
                position: corners[i],
                color,
            })
        })
        .collect()
}

/// Alpha blended 2D quads drawn over the scene.
pub struct OverlayPass {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: Cell<u32>,
}

impl OverlayPass {
    const MAX_QUADS: u64 = 64;

    /// Replaces the quads drawn by the next `render`.
    pub fn upload(&self, queue: &wgpu::Queue, quads: &[OverlayQuad], viewport: Vec2) {
        let mut vertices = quad_vertices(quads, viewport);
        vertices.truncate(Self::MAX_QUADS as usize * 6);

        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        self.vertex_count.set(vertices.len() as u32);
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let count = self.vertex_count.get();
        if count == 0 {
            return;
        }

        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..count, 0..1);
    }
}

impl Pass for OverlayPass {
    type TextureViews = wgpu::TextureView;

    fn create(context: &PassCreationContext) -> anyhow::Result<Self> {
        let device = context.device;
        let format = context.common.surface_format();

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let pipeline = shader_loader::compile(device, &OVERLAY_SHADER, |device, shader| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Overlay Pass Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[OverlayVertex::descriptor()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay vertex buffer"),
            size: size_of::<OverlayVertex>() as u64 * 6 * Self::MAX_QUADS,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            pipeline,
            vertex_buffer,
            vertex_count: Cell::new(0),
        })
    }

    fn render<'a, F>(
        &self,
        texture_views: &Self::TextureViews,
        encoder: &mut wgpu::CommandEncoder,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a,
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: texture_views,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_callback(&mut render_pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::OverlayKind;
    use glam::Vec4;

    #[test]
    fn quads_map_to_clip_space() {
        let quad = OverlayQuad {
            kind: OverlayKind::Card,
            min: Vec2::ZERO,
            max: Vec2::new(400.0, 300.0),
            color: Vec4::ONE,
        };
        let vertices = quad_vertices(&[quad], Vec2::new(800.0, 600.0));

        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].position, [-1.0, 1.0]);
        assert_eq!(vertices[2].position, [0.0, 0.0]);
        assert!(quad_vertices(&[quad], Vec2::ZERO).is_empty());
    }
}
