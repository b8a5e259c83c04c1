use std::sync::Arc;

use wgpu::{
    DepthBiasState, MultisampleState, PipelineCompilationOptions, RenderPass,
    RenderPassDescriptor, StencilState,
};

use crate::config::RenderConfig;
use crate::rendering::{
    passes::{pass::Pass, render_pass_context::PassCreationContext},
    render_common::RenderCommon,
    render_mesh::{Instance, RENDER_MESH_VBL},
    shader_loader::{self, ShaderDefinition},
    texture::{DepthTexture, Texture},
};

const SCENE_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Scene Shader",
    source: include_str!("../../shaders/scene.wgsl"),
};

/// Lit, flat coloured primitives plus the textured picture card.
pub struct ScenePass {
    pipeline: wgpu::RenderPipeline,
    common: Arc<RenderCommon>,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    clear_color: wgpu::Color,
}

pub struct SceneTextureViews {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Prop texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

impl ScenePass {
    pub fn set_prop_texture(&mut self, device: &wgpu::Device, texture: &Texture) {
        self.texture_bind_group =
            create_texture_bind_group(device, &self.texture_bind_group_layout, texture);
    }

    pub fn set_clear_color(&mut self, config: &RenderConfig) {
        self.clear_color = config.clear_color;
    }
}

impl Pass for ScenePass {
    type TextureViews = SceneTextureViews;

    fn create(context: &PassCreationContext) -> anyhow::Result<Self> {
        let device = context.device;
        let common = context.common.clone();

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Prop texture bind group layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let fallback = Texture::from_prop_image(device, context.queue, None);
        let texture_bind_group =
            create_texture_bind_group(device, &texture_bind_group_layout, &fallback);

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[
                    &common.global_uniform.bind_group_layout,
                    &texture_bind_group_layout,
                ],
                push_constant_ranges: &[],
            });

        let format = common.surface_format();

        let pipeline = shader_loader::compile(device, &SCENE_SHADER, |device, shader| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene render pipeline"),
                layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[RENDER_MESH_VBL, Instance::descriptor()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // The card and the flap are seen from both sides
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthTexture::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        Ok(ScenePass {
            pipeline,
            common,
            texture_bind_group_layout,
            texture_bind_group,
            clear_color: RenderConfig::default().clear_color,
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
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.common.global_uniform.bind_group, &[]);
        render_pass.set_bind_group(1, &self.texture_bind_group, &[]);

        render_callback(&mut render_pass);
    }
}
