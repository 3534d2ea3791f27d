use nalgebra_glm as glm;

const UP: glm::Vec3 = glm::Vec3::new(0.0, 1.0, 0.0);

/// Camera circling `target` at `distance`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub(super) fov: f32,
    pub(super) near: f32,
    pub(super) far: f32,
    pub(super) target: glm::Vec3,
    pub(super) yaw: f32,
    pub(super) pitch: f32,
    pub(super) distance: f32,
}

impl Camera {
    pub fn new(target: glm::Vec3, distance: f32, fov: f32, near: f32, far: f32) -> Camera {
        Camera {
            fov,
            near,
            far,
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance,
        }
    }

    /// Unit vector from the camera to the target.
    pub fn front(&self) -> glm::Vec3 {
        glm::vec3(
            -self.pitch.cos() * self.yaw.sin(),
            -self.pitch.sin(),
            -self.pitch.cos() * self.yaw.cos(),
        )
    }

    pub fn right(&self) -> glm::Vec3 {
        glm::normalize(&glm::cross(&self.front(), &UP))
    }

    pub fn up(&self) -> glm::Vec3 {
        glm::cross(&self.right(), &self.front())
    }

    pub fn position(&self) -> glm::Vec3 {
        self.target - self.front() * self.distance
    }

    /// Depth range 0..1, as wgpu expects.
    pub fn projection(&self, width: f32, height: f32) -> glm::Mat4 {
        let aspect = width/height.max(1.0);
        glm::perspective_rh_zo(aspect, self.fov, self.near, self.far)
    }

    pub fn view(&self) -> glm::Mat4 {
        glm::look_at(&self.position(), &self.target, &UP)
    }

    pub fn proj_view(&self, width: f32, height: f32) -> glm::Mat4 {
        self.projection(width, height)*self.view()
    }

    pub fn target(&self) -> &glm::Vec3 { &self.target }
    pub fn distance(&self) -> f32 { self.distance }
    pub fn yaw(&self) -> f32 { self.yaw }
    pub fn pitch(&self) -> f32 { self.pitch }
    pub fn fov(&self) -> f32 { self.fov }
}
