use glam::{Vec2, Vec3};

use crate::math::bounds::AABB;
use crate::math::ray::{self, Ray};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere {
        radius: f32,
    },
    /// Y-aligned, `length` is the straight section between the cap centers.
    Capsule {
        radius: f32,
        length: f32,
    },
    Cuboid {
        size: Vec3,
    },
    /// Y-aligned, apex up. Few segments make a pyramid.
    Cone {
        radius: f32,
        height: f32,
        segments: u32,
    },
    /// XY plane facing +Z.
    Plane {
        size: Vec2,
    },
}

impl Shape {
    pub fn local_bounds(&self) -> AABB {
        match *self {
            Shape::Sphere { radius } => AABB::from_half_extents(Vec3::splat(radius)),
            Shape::Capsule { radius, length } => {
                AABB::from_half_extents(Vec3::new(radius, length * 0.5 + radius, radius))
            }
            Shape::Cuboid { size } => AABB::from_half_extents(size * 0.5),
            Shape::Cone { radius, height, .. } => {
                AABB::from_half_extents(Vec3::new(radius, height * 0.5, radius))
            }
            Shape::Plane { size } => AABB::from_half_extents(size.extend(0.0) * 0.5),
        }
    }

    /// Exact hit against the shape surface, ray in the shape's local space.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Shape::Sphere { radius } => ray::intersect_sphere(ray, Vec3::ZERO, radius),
            Shape::Capsule { radius, length } => {
                let half = Vec3::Y * length * 0.5;
                ray::intersect_capsule(ray, -half, half, radius)
            }
            Shape::Cuboid { size } => AABB::from_half_extents(size * 0.5).intersect_ray(ray),
            Shape::Cone {
                radius,
                height,
                segments,
            } => {
                // Cheap reject before walking the faces
                self.local_bounds().intersect_ray(ray)?;

                cone_triangles(radius, height, segments)
                    .filter_map(|[a, b, c]| ray::intersect_triangle(ray, a, b, c))
                    .reduce(f32::min)
            }
            Shape::Plane { size } => ray::intersect_quad(ray, size.x, size.y),
        }
    }
}

/// Corner `index` of the cone base ring, matching the mesh generator.
pub fn cone_base_point(radius: f32, height: f32, segments: u32, index: u32) -> Vec3 {
    let theta = index as f32 / segments as f32 * std::f32::consts::TAU;
    Vec3::new(radius * theta.sin(), -height * 0.5, radius * theta.cos())
}

fn cone_triangles(radius: f32, height: f32, segments: u32) -> impl Iterator<Item = [Vec3; 3]> {
    let segments = segments.max(3);
    let apex = Vec3::Y * height * 0.5;
    let base_center = -apex;

    (0..segments).flat_map(move |i| {
        let a = cone_base_point(radius, height, segments, i);
        let b = cone_base_point(radius, height, segments, i + 1);
        [[apex, a, b], [base_center, b, a]]
    })
}

/// Flat colour plus an emissive boost, in linear space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub emissive: f32,
    pub textured: bool,
}

impl Material {
    pub fn from_hex(hex: u32) -> Self {
        Self {
            color: srgb_hex_to_linear(hex),
            emissive: 0.0,
            textured: false,
        }
    }

    pub fn with_emissive(mut self, emissive: f32) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn textured(mut self) -> Self {
        self.textured = true;
        self
    }
}

pub fn srgb_hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let value = ((hex >> shift) & 0xFF) as f32 / 255.0;
        if value <= 0.04045 {
            value / 12.92
        } else {
            ((value + 0.055) / 1.055).powf(2.4)
        }
    };

    Vec3::new(channel(16), channel(8), channel(0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub material: Material,
}

impl Primitive {
    pub fn new(shape: Shape, material: Material) -> Self {
        Self { shape, material }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyramid_is_hit_inside_but_not_at_bounding_box_corner() {
        let cone = Shape::Cone {
            radius: 0.45,
            height: 0.32,
            segments: 4,
        };

        let center = Ray::new(Vec3::new(0.05, 0.0, 2.0), Vec3::NEG_Z);
        assert!(cone.intersect_ray(&center).is_some());

        // Inside the AABB but outside the slanted faces
        let corner = Ray::new(Vec3::new(0.4, 0.14, 2.0), Vec3::NEG_Z);
        assert!(cone.local_bounds().intersect_ray(&corner).is_some());
        assert!(cone.intersect_ray(&corner).is_none());
    }

    #[test]
    fn cuboid_hit_distance() {
        let cuboid = Shape::Cuboid {
            size: Vec3::new(0.9, 0.6, 0.04),
        };
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
        assert!((cuboid.intersect_ray(&ray).unwrap() - 0.98).abs() < 1e-5);
    }

    #[test]
    fn hex_colours_convert_to_linear() {
        assert_eq!(srgb_hex_to_linear(0xFFFFFF), Vec3::ONE);
        assert_eq!(srgb_hex_to_linear(0x000000), Vec3::ZERO);
        let mid = srgb_hex_to_linear(0x808080);
        assert!(mid.x > 0.2 && mid.x < 0.23);
    }
}
