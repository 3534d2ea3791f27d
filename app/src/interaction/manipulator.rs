use nalgebra_glm as glm;

use super::ray::Ray;

/// Handles pick within this fraction of the manipulator size.
const AXIS_PICK_RATIO: f32 = 0.12;
const CENTER_PICK_RATIO: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn unit(&self) -> glm::Vec3 {
        match self {
            Axis::X => glm::vec3(1.0, 0.0, 0.0),
            Axis::Y => glm::vec3(0.0, 1.0, 0.0),
            Axis::Z => glm::vec3(0.0, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Axis(Axis),
    /// Drag in the plane facing the camera.
    Free,
}

/// Where a drag started: the joint position and the point under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGrab {
    pub handle: Handle,
    pub start: glm::Vec3,
    anchor: glm::Vec3,
    plane_normal: glm::Vec3,
}

impl DragGrab {
    /// Joint position implied by `ray`, `None` when the ray no longer meets the constraint.
    pub fn target(&self, ray: &Ray) -> Option<glm::Vec3> {
        let point = match self.handle {
            Handle::Axis(axis) => {
                let (_, t) = ray.closest_to_line(&self.start, &axis.unit())?;
                self.start + axis.unit() * t
            }
            Handle::Free => ray.intersect_plane(&self.start, &self.plane_normal)?,
        };
        let target = self.start + (point - self.anchor);
        target.iter().all(|c| c.is_finite()).then_some(target)
    }
}

/// Three axis drag handle attached to the selected joint.
#[derive(Debug, Clone, PartialEq)]
pub struct Manipulator {
    sensor: Option<usize>,
    position: glm::Vec3,
    size: f32,
}

impl Manipulator {
    pub fn new(size: f32) -> Self {
        Self { sensor: None, position: glm::Vec3::zeros(), size }
    }

    pub fn attach(&mut self, sensor: usize, position: glm::Vec3) {
        self.sensor = Some(sensor);
        self.position = position;
    }

    pub fn detach(&mut self) {
        self.sensor = None;
    }

    pub fn sensor(&self) -> Option<usize> { self.sensor }
    pub fn is_visible(&self) -> bool { self.sensor.is_some() }
    pub fn position(&self) -> glm::Vec3 { self.position }
    pub fn size(&self) -> f32 { self.size }

    pub fn set_position(&mut self, position: glm::Vec3) {
        self.position = position;
    }

    pub fn set_size(&mut self, size: f32) {
        if size.is_finite() && size > 0.0 {
            self.size = size;
        }
    }

    /// End point of the handle line for `axis`.
    pub fn tip(&self, axis: Axis) -> glm::Vec3 {
        self.position + axis.unit() * self.size
    }

    /// Nearest handle under the ray.
    pub fn hit_test(&self, ray: &Ray) -> Option<Handle> {
        if !self.is_visible() {return None};

        let tolerance = self.size * AXIS_PICK_RATIO;
        let axis = Axis::ALL.into_iter()
            .filter_map(|axis| {
                let (distance, _) = ray.distance_to_segment(&self.position, &self.tip(axis))?;
                (distance <= tolerance).then_some((axis, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        // the center belongs to the free handle even though all three axes meet there
        if ray.intersect_sphere(&self.position, self.size * CENTER_PICK_RATIO).is_some() {
            return Some(Handle::Free);
        }
        axis.map(|(axis, _)| Handle::Axis(axis))
    }

    pub fn grab(&self, ray: &Ray, handle: Handle, view_dir: &glm::Vec3) -> Option<DragGrab> {
        Self::grab_at(self.position, ray, handle, view_dir)
    }

    /// Starts a drag of a joint at `start`, with or without a visible manipulator.
    pub fn grab_at(start: glm::Vec3, ray: &Ray, handle: Handle, view_dir: &glm::Vec3) -> Option<DragGrab> {
        let plane_normal = glm::normalize(view_dir);
        let anchor = match handle {
            Handle::Axis(axis) => {
                let (_, t) = ray.closest_to_line(&start, &axis.unit())?;
                start + axis.unit() * t
            }
            Handle::Free => ray.intersect_plane(&start, &plane_normal)?,
        };
        Some(DragGrab { handle, start, anchor, plane_normal })
    }
}
