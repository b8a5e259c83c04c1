use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use teddy_reveal::{
    clock::{Clock, SystemClock},
    config::{ExperienceConfig, RenderConfig},
    experience::{Experience, View},
    interaction::ContainerRect,
    motion::MotionSubject,
    rendering::renderer::Renderer,
};

struct App {
    renderer: Option<Renderer>,
    experience: Experience,
    clock: SystemClock,
    motion: MotionSubject,
    cursor: Vec2,
}

impl App {
    fn new(experience: Experience, motion: MotionSubject) -> Self {
        Self {
            renderer: None,
            experience,
            clock: SystemClock::new(),
            motion,
            cursor: Vec2::ZERO,
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.experience.resize(ContainerRect::from_size(Vec2::new(
            size.width as f32,
            size.height as f32,
        )));

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(size);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.now();
        self.experience.frame(now);

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.window.request_redraw();

        match renderer.render(&self.experience, now) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }
    }

    fn key_pressed(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => {
                self.experience.exit();
                event_loop.exit();
            }
            KeyCode::KeyM => {
                let reduced = self.motion.toggle();
                log::info!("Reduced motion: {}", reduced);
            }
            KeyCode::KeyS => self.experience.skip(self.clock.now()),
            KeyCode::Enter if self.experience.view() == View::Question => {
                self.experience.accept();
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Teddy")
            .with_inner_size(LogicalSize::new(960.0, 720.0));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                log::error!("Failed to create window: {}", error);
                event_loop.exit();
                return;
            }
        };

        let renderer = match pollster::block_on(Renderer::new(
            window.clone(),
            &self.experience,
            RenderConfig::default(),
        )) {
            Ok(renderer) => renderer,
            Err(error) => {
                log::error!("Failed to create renderer: {:#}", error);
                event_loop.exit();
                return;
            }
        };

        self.renderer = Some(renderer);
        self.clock.restart();
        self.resize(window.inner_size());
        window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.experience.exit();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.experience.pointer_moved(self.cursor, self.clock.now());
            }
            WindowEvent::CursorLeft { .. } => self.experience.pointer_left(),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.experience.click(self.cursor, self.clock.now()),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.key_pressed(event_loop, key),
            _ => (),
        }

        if self.experience.view() == View::Exited {
            event_loop.exit();
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = ExperienceConfig::from_env();
    let motion = MotionSubject::new(config.reduced_motion);
    let experience = Experience::new(config, Rc::new(motion.clone()))
        .context("Failed to create experience")?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(experience, motion);
    event_loop.run_app(&mut app)?;

    Ok(())
}
