use std::sync::RwLock;

use glam::Vec2;
use wgpu::SurfaceConfiguration;
use winit::dpi::PhysicalSize;

use crate::camera::Camera;
use crate::rendering::global_uniform::{GlobalUniform, GlobalUniformState};

/// State every pass reads: the surface format and the per-frame uniform.
pub struct RenderCommon {
    pub output_surface_config: RwLock<SurfaceConfiguration>,
    pub global_uniform: GlobalUniform,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        surface: &wgpu::Surface,
        size: PhysicalSize<u32>,
        ambient: f32,
    ) -> Self {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let output_surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(device, &output_surface_config);

        let resolution = Vec2::new(size.width as f32, size.height as f32);
        let global_uniform = GlobalUniform::new(
            device,
            GlobalUniformState::new(&Camera::character_view(), resolution, 0.0, ambient),
        );

        Self {
            output_surface_config: RwLock::new(output_surface_config),
            global_uniform,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        match self.output_surface_config.read() {
            Ok(config) => config.format,
            Err(poisoned) => poisoned.into_inner().format,
        }
    }
}
