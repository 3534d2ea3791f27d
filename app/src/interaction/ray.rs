use nalgebra_glm as glm;

use super::pointer::NormalizedPointer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: glm::Vec3,
    /// Unit length.
    pub direction: glm::Vec3,
}

impl Ray {
    pub fn new(origin: glm::Vec3, direction: glm::Vec3) -> Option<Self> {
        let length = glm::length(&direction);
        if !(length > f32::EPSILON) || !origin.iter().all(|c| c.is_finite()) {return None};
        Some(Self { origin, direction: direction / length })
    }

    /// Ray through the pointer from the near to the far clip plane (depth range 0..1).
    pub fn from_ndc(pointer: NormalizedPointer, inverse_proj_view: &glm::Mat4) -> Option<Self> {
        let unproject = |z: f32| {
            let p = inverse_proj_view * glm::vec4(pointer.x, pointer.y, z, 1.0);
            (p.w.abs() > f32::EPSILON).then(|| glm::vec3(p.x, p.y, p.z) / p.w)
        };
        let near = unproject(0.0)?;
        let far = unproject(1.0)?;
        Self::new(near, far - near)
    }

    pub fn at(&self, t: f32) -> glm::Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first hit in front of the origin.
    pub fn intersect_sphere(&self, center: &glm::Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = glm::dot(&oc, &self.direction);
        let c = glm::dot(&oc, &oc) - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {return None};
        let sqrt = disc.sqrt();
        [-b - sqrt, -b + sqrt].into_iter().find(|t| *t >= 0.0)
    }

    pub fn intersect_plane(&self, point: &glm::Vec3, normal: &glm::Vec3) -> Option<glm::Vec3> {
        let denom = glm::dot(normal, &self.direction);
        if denom.abs() < 1e-6 {return None};
        let t = glm::dot(normal, &(point - self.origin)) / denom;
        (t >= 0.0).then(|| self.at(t))
    }

    /// Parameters `(s, t)` of the closest approach between this ray (`origin + s * direction`)
    /// and the line `point + t * axis`. `None` when they are parallel.
    pub fn closest_to_line(&self, point: &glm::Vec3, axis: &glm::Vec3) -> Option<(f32, f32)> {
        let w0 = self.origin - point;
        let a = glm::dot(&self.direction, &self.direction);
        let b = glm::dot(&self.direction, axis);
        let c = glm::dot(axis, axis);
        let d = glm::dot(&self.direction, &w0);
        let e = glm::dot(axis, &w0);
        let denom = a * c - b * b;
        if denom.abs() < 1e-6 {return None};
        Some(((b * e - c * d) / denom, (a * e - b * d) / denom))
    }

    /// Shortest distance between the ray and the segment `a..b`, with the ray parameter at that point.
    pub fn distance_to_segment(&self, a: &glm::Vec3, b: &glm::Vec3) -> Option<(f32, f32)> {
        let axis = b - a;
        let (_, t) = self.closest_to_line(a, &axis)?;
        let on_segment = a + axis * t.clamp(0.0, 1.0);
        let s = glm::dot(&(on_segment - self.origin), &self.direction).max(0.0);
        Some((glm::distance(&self.at(s), &on_segment), s))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn ray(o: [f32; 3], d: [f32; 3]) -> Ray {
        Ray::new(glm::make_vec3(&o), glm::make_vec3(&d)).unwrap()
    }

    #[test]
    fn sphere_hit_and_miss() {
        let r = ray([0.0, 0.0, 5.0], [0.0, 0.0, -1.0]);
        let t = r.intersect_sphere(&glm::vec3(0.0, 0.0, 0.0), 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!(r.intersect_sphere(&glm::vec3(3.0, 0.0, 0.0), 1.0).is_none());
        // behind the origin
        assert!(r.intersect_sphere(&glm::vec3(0.0, 0.0, 10.0), 1.0).is_none());
    }

    #[test]
    fn closest_point_on_axis() {
        let r = ray([2.0, 5.0, 0.0], [0.0, -1.0, 0.0]);
        let (s, t) = r.closest_to_line(&glm::vec3(0.0, 0.0, 0.0), &glm::vec3(1.0, 0.0, 0.0)).unwrap();
        assert!((s - 5.0).abs() < 1e-5);
        assert!((t - 2.0).abs() < 1e-5);
        assert!(r.closest_to_line(&glm::vec3(0.0, 0.0, 0.0), &glm::vec3(0.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn unproject_through_camera() {
        let proj = glm::perspective_rh_zo(1.0, 1.0, 0.1, 100.0);
        let view = glm::look_at(&glm::vec3(0.0, 0.0, 5.0), &glm::vec3(0.0, 0.0, 0.0), &glm::vec3(0.0, 1.0, 0.0));
        let inverse = glm::inverse(&(proj * view));
        let r = Ray::from_ndc(NormalizedPointer::new(0.0, 0.0), &inverse).unwrap();
        assert!(glm::distance(&r.direction, &glm::vec3(0.0, 0.0, -1.0)) < 1e-4);
        assert!(r.intersect_sphere(&glm::vec3(0.0, 0.0, 0.0), 0.1).is_some());
    }

    #[test]
    fn plane_hit() {
        let r = ray([0.0, 1.0, 0.0], [0.0, -1.0, 0.0]);
        let hit = r.intersect_plane(&glm::vec3(3.0, 0.0, 3.0), &glm::vec3(0.0, 1.0, 0.0)).unwrap();
        assert!(glm::distance(&hit, &glm::vec3(0.0, 0.0, 0.0)) < 1e-6);
    }
}
