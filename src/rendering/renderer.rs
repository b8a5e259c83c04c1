use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use glam::Vec2;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    config::RenderConfig,
    experience::Experience,
    rendering::{
        global_uniform::GlobalUniformState,
        passes::{
            overlay_pass::OverlayPass,
            pass::Pass,
            render_pass_context::PassCreationContext,
            scene_pass::{ScenePass, SceneTextureViews},
        },
        render_common::RenderCommon,
        render_mesh::{create_render_meshes, gather_instances, RenderMesh},
        texture::{DepthTexture, Texture},
    },
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    config: RenderConfig,
    depth_texture: DepthTexture,
    meshes: Vec<RenderMesh>,

    scene_pass: ScenePass,
    overlay_pass: OverlayPass,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        experience: &Experience,
        config: RenderConfig,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No compatible graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request device")?;

        let common = Arc::new(RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            config.ambient,
        ));

        let depth_texture = {
            let surface_config = common
                .output_surface_config
                .read()
                .map_err(|_| anyhow::anyhow!("Surface configuration lock poisoned"))?;
            DepthTexture::new(&device, &surface_config, "Depth Texture")
        };

        let context = PassCreationContext {
            device: &device,
            queue: &queue,
            common: common.clone(),
        };

        let mut scene_pass = ScenePass::create(&context)?;
        scene_pass.set_clear_color(&config);
        let overlay_pass = OverlayPass::create(&context)?;

        let prop_texture = Texture::from_prop_image(&device, &queue, experience.prop_image());
        scene_pass.set_prop_texture(&device, &prop_texture);

        let character = experience.landing().character();
        let meshes = create_render_meshes(&device, &character.scene, character.character);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            config,
            depth_texture,
            meshes,
            scene_pass,
            overlay_pass,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let mut config = match self.common.output_surface_config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.depth_texture.resize(&self.device, &config);
        self.surface.configure(&self.device, &config);
    }

    pub fn render(&mut self, experience: &Experience, now: Duration) -> Result<(), wgpu::SurfaceError> {
        let landing = experience.landing();
        let character = landing.character();
        let resolution = Vec2::new(self.size.width as f32, self.size.height as f32);

        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(
                landing.camera(),
                resolution,
                now.as_secs_f32(),
                self.config.ambient,
            ),
        );

        gather_instances(
            &self.queue,
            &character.scene,
            character.character,
            &mut self.meshes,
        );
        self.overlay_pass
            .upload(&self.queue, &experience.overlay(now), resolution);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.scene_pass.render(
            &SceneTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            |render_pass| {
                for mesh in &self.meshes {
                    mesh.draw(render_pass);
                }
            },
        );

        self.overlay_pass
            .render(&view, &mut encoder, |render_pass| {
                self.overlay_pass.draw(render_pass)
            });

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
