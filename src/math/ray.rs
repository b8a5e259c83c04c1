use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Moves the ray into the space described by `matrix` (usually an inverse
    /// world matrix). The direction is renormalized, so distances along the
    /// returned ray are in the target space's units.
    pub fn transform(&self, matrix: &Mat4) -> Ray {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }
}

const EPSILON: f32 = 1e-6;

/// Möller–Trumbore, double sided.
pub fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let determinant = edge1.dot(p);

    if determinant.abs() < EPSILON {
        return None;
    }

    let inverse_determinant = 1.0 / determinant;
    let s = ray.origin - a;
    let u = s.dot(p) * inverse_determinant;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inverse_determinant;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inverse_determinant;
    (t >= 0.0).then_some(t)
}

/// Capsule around the segment `a`..`b`.
pub fn intersect_capsule(ray: &Ray, a: Vec3, b: Vec3, radius: f32) -> Option<f32> {
    let ba = b - a;
    let oa = ray.origin - a;
    let baba = ba.dot(ba);
    let bard = ba.dot(ray.direction);
    let baoa = ba.dot(oa);
    let rdoa = ray.direction.dot(oa);
    let oaoa = oa.dot(oa);

    let qa = baba - bard * bard;
    let qb = baba * rdoa - baoa * bard;
    let qc = baba * oaoa - baoa * baoa - radius * radius * baba;
    let h = qb * qb - qa * qc;

    if h >= 0.0 && qa.abs() > EPSILON {
        let t = (-qb - h.sqrt()) / qa;
        let y = baoa + t * bard;

        // Body
        if y > 0.0 && y < baba && t >= 0.0 {
            return Some(t);
        }
    }

    // Caps
    [a, b]
        .into_iter()
        .filter_map(|center| intersect_sphere(ray, center, radius))
        .reduce(f32::min)
}

pub fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let h = b * b - c;

    if h < 0.0 {
        return None;
    }

    let t = -b - h.sqrt();
    if t >= 0.0 {
        Some(t)
    } else if -b + h.sqrt() >= 0.0 {
        Some(0.0)
    } else {
        None
    }
}

/// Rectangle of `width` × `height` centered on the origin in the XY plane.
pub fn intersect_quad(ray: &Ray, width: f32, height: f32) -> Option<f32> {
    if ray.direction.z.abs() < EPSILON {
        return None;
    }

    let t = -ray.origin.z / ray.direction.z;
    if t < 0.0 {
        return None;
    }

    let point = ray.at(t);
    (point.x.abs() <= width * 0.5 && point.y.abs() <= height * 0.5).then_some(t)
}
