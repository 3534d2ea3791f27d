use nalgebra_glm as glm;

use crate::pose::framing::CameraFraming;
use super::camera::Camera;

const MIN_DISTANCE: f32 = 0.05;
const MAX_DISTANCE: f32 = 500.0;

/// Orbit, pan and zoom driven by normalized pointer deltas.
pub struct CameraController {
    enabled: bool,
    camera: Camera,
}


impl CameraController {
    const PITCH_LIMIT: f32 = 1.569_051;
    /// Radians per normalized unit of pointer travel.
    const ORBIT_SENSETIV: f32 = 2.5;
    const ZOOM_STEP: f32 = 0.1;
    const INITIAL_PITCH: f32 = 0.15;

    pub fn new(fov: f32, near: f32, far: f32) -> Self {
        let mut camera = Camera::new(glm::Vec3::zeros(), 3.0, fov, near, far);
        camera.pitch = Self::INITIAL_PITCH;
        Self { enabled: true, camera }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool { self.enabled }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if !self.enabled || !dx.is_finite() || !dy.is_finite() {return};
        self.camera.yaw -= dx*Self::ORBIT_SENSETIV;
        self.camera.pitch -= dy*Self::ORBIT_SENSETIV;
        self.camera.pitch = self.camera.pitch.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Moves the target in the view plane so the scene follows the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !self.enabled || !dx.is_finite() || !dy.is_finite() {return};
        let half_height = self.camera.distance * (self.camera.fov*0.5).tan();
        let shift = self.camera.right()*dx + self.camera.up()*dy;
        self.camera.target -= shift*half_height;
    }

    /// Positive `delta` moves closer.
    pub fn zoom(&mut self, delta: f32) {
        if !delta.is_finite() {return};
        let factor = (1.0 - Self::ZOOM_STEP).powf(delta);
        self.camera.distance = (self.camera.distance*factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn frame(&mut self, framing: &CameraFraming) {
        self.camera.target = framing.center;
        self.camera.distance = framing.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.camera.yaw = 0.0;
        self.camera.pitch = Self::INITIAL_PITCH;
    }

    pub fn projection(&self, width: f32, height: f32) -> glm::Mat4 {
        self.camera.projection(width, height)
    }
    pub fn view(&self) -> glm::Mat4 {
        self.camera.view()
    }
    pub fn proj_view(&self, width: f32, height: f32) -> glm::Mat4 {
        self.camera.proj_view(width, height)
    }
    pub fn position(&self) -> glm::Vec3 {self.camera.position()}
    pub fn front(&self) -> glm::Vec3 {self.camera.front()}
    pub fn target(&self) -> &glm::Vec3 {self.camera.target()}
    pub fn distance(&self) -> f32 {self.camera.distance()}
    pub fn near(&self) -> f32 {self.camera.near}
    pub fn far(&self) -> f32 {self.camera.far}
    pub fn fov(&self) -> f32 {self.camera.fov}
    pub fn camera(&self) -> &Camera {&self.camera}
}
