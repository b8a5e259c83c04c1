use glam::{Mat4, Vec2, Vec3};

use crate::math::ray::Ray;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Framing used for the character scene.
    pub fn character_view() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.8, 5.8),
            target: Vec3::new(0.0, 0.5, 0.0),
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn set_viewport(&mut self, resolution: Vec2) {
        if resolution.x > 0.0 && resolution.y > 0.0 {
            self.aspect = resolution.x / resolution.y;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn get_vp_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World point to normalized device coordinates (x, y in [-1, 1] when on screen).
    pub fn project(&self, point: Vec3) -> Vec2 {
        self.get_vp_matrix().project_point3(point).truncate()
    }

    /// Ray from the eye through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.get_vp_matrix().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::character_view()
    }
}
