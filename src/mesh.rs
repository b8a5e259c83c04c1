use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use itertools::iproduct;

use crate::scene_graph::primitive::{cone_base_point, Shape};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

const SPHERE_SEGMENTS: u32 = 32;
const SPHERE_RINGS: u32 = 16;

impl MeshData {
    pub fn from_shape(shape: &Shape) -> Self {
        match *shape {
            Shape::Sphere { radius } => sphere(radius, SPHERE_SEGMENTS, SPHERE_RINGS),
            Shape::Capsule { radius, length } => {
                capsule(radius, length, SPHERE_SEGMENTS, SPHERE_RINGS)
            }
            Shape::Cuboid { size } => cuboid(size),
            Shape::Cone {
                radius,
                height,
                segments,
            } => cone(radius, height, segments),
            Shape::Plane { size } => plane(size),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
}

/// Latitude/longitude grid. Each row is `(polar angle, y offset)`.
fn lat_long(radius: f32, segments: u32, rows: &[(f32, f32)]) -> MeshData {
    let columns = segments + 1;
    let row_count = rows.len() as u32;

    let vertices = iproduct!(0..row_count, 0..columns)
        .map(|(row, column)| {
            let (phi, y_offset) = rows[row as usize];
            let theta = column as f32 / segments as f32 * TAU;
            let normal = Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());
            let uv = Vec2::new(
                column as f32 / segments as f32,
                row as f32 / (row_count - 1) as f32,
            );
            Vertex::new(normal * radius + Vec3::Y * y_offset, normal, uv)
        })
        .collect();

    let mut mesh = MeshData {
        vertices,
        indices: Vec::new(),
    };

    for (row, column) in iproduct!(0..row_count - 1, 0..segments) {
        let top = row * columns + column;
        let bottom = top + columns;
        mesh.push_quad(top, bottom, bottom + 1, top + 1);
    }

    mesh
}

pub fn sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let rows: Vec<_> = (0..=rings)
        .map(|ring| (ring as f32 / rings as f32 * PI, 0.0))
        .collect();
    lat_long(radius, segments, &rows)
}

/// Two hemispheres pushed apart by `length`; the duplicated equator rows form
/// the cylinder between them.
pub fn capsule(radius: f32, length: f32, segments: u32, rings: u32) -> MeshData {
    let half_rings = (rings / 2).max(1);
    let half = length * 0.5;

    let top = (0..=half_rings).map(|ring| (ring as f32 / half_rings as f32 * PI * 0.5, half));
    let bottom = (0..=half_rings).map(|ring| {
        (
            PI * 0.5 + ring as f32 / half_rings as f32 * PI * 0.5,
            -half,
        )
    });

    let rows: Vec<_> = top.chain(bottom).collect();
    lat_long(radius, segments, &rows)
}

pub fn cuboid(size: Vec3) -> MeshData {
    let half = size * 0.5;
    let mut mesh = MeshData::default();

    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        for normal in [axis, -axis] {
            // Two tangents spanning the face
            let u = if axis == Vec3::Y { Vec3::X } else { Vec3::Y.cross(normal) };
            let v = normal.cross(u);

            let base = mesh.vertices.len() as u32;
            for (corner, uv) in [
                (-u - v, Vec2::new(0.0, 1.0)),
                (u - v, Vec2::new(1.0, 1.0)),
                (u + v, Vec2::new(1.0, 0.0)),
                (-u + v, Vec2::new(0.0, 0.0)),
            ] {
                let position = (normal + corner) * half;
                mesh.vertices.push(Vertex::new(position, normal, uv));
            }
            mesh.push_quad(base, base + 1, base + 2, base + 3);
        }
    }

    mesh
}

/// Flat shaded sides and a base cap. The corners match the hit test.
pub fn cone(radius: f32, height: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let apex = Vec3::Y * height * 0.5;
    let mut mesh = MeshData::default();

    for i in 0..segments {
        let a = cone_base_point(radius, height, segments, i);
        let b = cone_base_point(radius, height, segments, i + 1);
        let normal = (a - apex).cross(b - apex).normalize_or(Vec3::Y);
        let outward = (a + b) * Vec3::new(1.0, 0.0, 1.0);
        let normal = if normal.dot(outward) < 0.0 { -normal } else { normal };

        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend([
            Vertex::new(apex, normal, Vec2::new(0.5, 0.0)),
            Vertex::new(a, normal, Vec2::new(0.0, 1.0)),
            Vertex::new(b, normal, Vec2::new(1.0, 1.0)),
        ]);
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    let center = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex::new(-apex, Vec3::NEG_Y, Vec2::splat(0.5)));
    for i in 0..segments {
        let point = cone_base_point(radius, height, segments, i);
        let uv = Vec2::new(point.x, point.z) / (2.0 * radius.max(f32::EPSILON)) + 0.5;
        mesh.vertices.push(Vertex::new(point, Vec3::NEG_Y, uv));
    }
    for i in 0..segments {
        let a = center + 1 + i;
        let b = center + 1 + (i + 1) % segments;
        mesh.indices.extend_from_slice(&[center, b, a]);
    }

    mesh
}

/// Facing +Z, texture upright when viewed from the front.
pub fn plane(size: Vec2) -> MeshData {
    let half = size * 0.5;
    let mut mesh = MeshData::default();

    for (corner, uv) in [
        (Vec2::new(-half.x, -half.y), Vec2::new(0.0, 1.0)),
        (Vec2::new(half.x, -half.y), Vec2::new(1.0, 1.0)),
        (Vec2::new(half.x, half.y), Vec2::new(1.0, 0.0)),
        (Vec2::new(-half.x, half.y), Vec2::new(0.0, 0.0)),
    ] {
        mesh.vertices.push(Vertex::new(corner.extend(0.0), Vec3::Z, uv));
    }
    mesh.push_quad(0, 1, 2, 3);

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_shapes() -> Vec<Shape> {
        vec![
            Shape::Sphere { radius: 0.75 },
            Shape::Capsule {
                radius: 0.22,
                length: 0.5,
            },
            Shape::Cuboid {
                size: Vec3::new(0.9, 0.6, 0.04),
            },
            Shape::Cone {
                radius: 0.45,
                height: 0.32,
                segments: 4,
            },
            Shape::Plane {
                size: Vec2::new(0.8, 0.55),
            },
        ]
    }

    #[test]
    fn normals_are_unit_length() {
        for shape in all_shapes() {
            let mesh = MeshData::from_shape(&shape);
            for vertex in &mesh.vertices {
                assert!(
                    (vertex.normal.length() - 1.0).abs() < 1e-4,
                    "{:?} has normal {}",
                    shape,
                    vertex.normal
                );
            }
        }
    }

    #[test]
    fn indices_are_in_range() {
        for shape in all_shapes() {
            let mesh = MeshData::from_shape(&shape);
            assert_eq!(mesh.indices.len() % 3, 0);
            assert!(mesh.triangle_count() > 0);
            assert!(mesh
                .indices
                .iter()
                .all(|&index| (index as usize) < mesh.vertices.len()));
        }
    }

    #[test]
    fn meshes_fit_their_bounds() {
        for shape in all_shapes() {
            let bounds = shape.local_bounds();
            for vertex in &MeshData::from_shape(&shape).vertices {
                assert!(
                    bounds.contains_point(vertex.position * 0.999),
                    "{:?} vertex {} outside {:?}",
                    shape,
                    vertex.position,
                    bounds
                );
            }
        }
    }

    #[test]
    fn sphere_vertices_lie_on_surface() {
        let mesh = sphere(2.0, 12, 6);
        assert_eq!(mesh.vertices.len(), 13 * 7);
        for vertex in &mesh.vertices {
            assert!((vertex.position.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn capsule_spans_length_plus_caps() {
        let mesh = capsule(0.25, 1.0, 16, 8);
        let (min, max) = mesh
            .vertices
            .iter()
            .fold((f32::MAX, f32::MIN), |(min, max), vertex| {
                (min.min(vertex.position.y), max.max(vertex.position.y))
            });
        assert!((max - 0.75).abs() < 1e-5);
        assert!((min + 0.75).abs() < 1e-5);
    }

    #[test]
    fn cone_side_normals_point_outwards() {
        let mesh = cone(0.45, 0.32, 4);
        for vertex in mesh.vertices.iter().filter(|vertex| vertex.normal.y > -0.99) {
            let outwards = Vec3::new(vertex.position.x, 0.0, vertex.position.z);
            if outwards.length() > 1e-3 {
                assert!(vertex.normal.dot(outwards) > 0.0);
            }
        }
    }
}
