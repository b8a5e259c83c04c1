use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::config::PointerConfig;
use crate::motion::MotionFlag;
use crate::scene_graph::{Hit, NodeId, PoseOffset, Scene};

/// The container's bounding rectangle in client (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ContainerRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_size(size: Vec2) -> Self {
        Self::new(0.0, 0.0, size.x, size.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, client: Vec2) -> bool {
        client.x >= self.left
            && client.x <= self.left + self.width
            && client.y >= self.top
            && client.y <= self.top + self.height
    }

    /// Client position to normalized device coordinates, y up. Not clamped.
    pub fn client_to_ndc(&self, client: Vec2) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }

        Some(Vec2::new(
            (client.x - self.left) / self.width * 2.0 - 1.0,
            -((client.y - self.top) / self.height * 2.0 - 1.0),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    /// Last pointer position, clamped to [-1, 1]
    pub ndc: Vec2,
    pub hovering: bool,
    /// (pitch, yaw) the smoothed rotation is heading for, radians
    pub target: Vec2,
    pub smoothed: Vec2,
}

/// Fraction of the remaining distance to cover this frame, scaled so the
/// convergence speed does not depend on the frame rate.
pub fn smoothing_factor(rate_per_frame: f32, dt: f32) -> f32 {
    let rate = rate_per_frame.clamp(0.0, 1.0);
    1.0 - (1.0 - rate).powf(dt.max(0.0) * 60.0)
}

pub struct PointerResolver {
    state: PointerState,
    config: PointerConfig,
    motion: MotionFlag,
}

impl PointerResolver {
    pub fn new(config: PointerConfig, motion: MotionFlag) -> Self {
        Self {
            state: PointerState::default(),
            config,
            motion,
        }
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    pub fn on_pointer_move(&mut self, client: Vec2, rect: &ContainerRect) {
        let Some(ndc) = rect.client_to_ndc(client) else {
            return;
        };

        self.state.hovering = rect.contains(client);
        self.state.ndc = ndc.clamp(Vec2::NEG_ONE, Vec2::ONE);

        if self.state.hovering {
            self.state.target = self.pointer_target();
        }
    }

    pub fn on_pointer_leave(&mut self) {
        self.state.hovering = false;
    }

    fn pointer_target(&self) -> Vec2 {
        // (pitch, yaw)
        Vec2::new(
            -self.state.ndc.y * self.config.max_pitch,
            self.state.ndc.x * self.config.max_yaw,
        )
    }

    fn drift_target(&self, t: f32) -> Vec2 {
        if self.motion.is_reduced() {
            return Vec2::ZERO;
        }

        let phase = self.config.drift_frequency * t;
        Vec2::new(
            self.config.drift_amplitude.x * phase.x.sin(),
            self.config.drift_amplitude.y * phase.y.sin(),
        )
    }

    /// Advances the smoothed rotation by one frame and returns it.
    pub fn update(&mut self, t: f32, dt: f32) -> Vec2 {
        let rate = if self.state.hovering {
            self.state.target = self.pointer_target();
            self.config.follow_rate
        } else {
            self.state.target = self.drift_target(t);
            self.config.drift_rate
        };

        let factor = smoothing_factor(rate, dt);
        self.state.smoothed += (self.state.target - self.state.smoothed) * factor;
        self.state.smoothed
    }

    pub fn rotation_offset(&self) -> PoseOffset {
        PoseOffset {
            translation: Vec3::ZERO,
            rotation: Vec3::new(self.state.smoothed.x, self.state.smoothed.y, 0.0),
        }
    }

    pub fn reset(&mut self) {
        self.state = PointerState::default();
    }
}

/// Casts from the camera through `ndc` and reports the nearest primitive of
/// the subtree under `root`.
pub fn hit_test(scene: &Scene, root: NodeId, camera: &Camera, ndc: Vec2) -> Option<Hit> {
    if scene.is_empty() || scene.get_node(root).is_none() {
        return None;
    }

    scene.raycast(root, &camera.ray_from_ndc(ndc))
}
