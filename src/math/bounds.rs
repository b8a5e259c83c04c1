use glam::{Mat4, Vec3};

use crate::math::ray::Ray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(point1: Vec3, point2: Vec3) -> AABB {
        let min = point1.min(point2);
        let max = point1.max(point2);
        AABB { min, max }
    }

    pub fn from_half_extents(half_extents: Vec3) -> AABB {
        AABB::new(-half_extents, half_extents)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    pub fn transform(&self, matrix: &Mat4) -> AABB {
        let corners = self.corners().map(|corner| matrix.transform_point3(corner));
        let mut bounds = AABB::new(corners[0], corners[0]);

        for corner in &corners[1..] {
            bounds.min = bounds.min.min(*corner);
            bounds.max = bounds.max.max(*corner);
        }

        bounds
    }

    /// Slab test. Returns the entry distance, or 0 when the origin is inside.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inverse_direction = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inverse_direction;
        let t2 = (self.max - ray.origin) * inverse_direction;

        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_near > t_far || t_far < 0.0 || t_near.is_nan() || t_far.is_nan() {
            return None;
        }

        Some(t_near.max(0.0))
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_box_from_outside() {
        let bounds = AABB::from_half_extents(Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let t = bounds.intersect_ray(&ray).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_box_beside_it() {
        let bounds = AABB::from_half_extents(Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(bounds.intersect_ray(&ray).is_none());
    }

    #[test]
    fn ray_pointing_away_misses() {
        let bounds = AABB::from_half_extents(Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(bounds.intersect_ray(&ray).is_none());
    }

    #[test]
    fn transformed_bounds_follow_translation() {
        let bounds = AABB::from_half_extents(Vec3::splat(0.5));
        let moved = bounds.transform(&Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        assert!(moved.contains_point(Vec3::new(2.4, 0.0, 0.0)));
        assert!(!moved.contains_point(Vec3::ZERO));
        assert_eq!(moved.center(), Vec3::new(2.0, 0.0, 0.0));
    }
}
