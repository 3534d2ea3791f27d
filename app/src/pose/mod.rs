pub mod framing;

use nalgebra_glm as glm;
use resources::{Calibration, Dataset};

pub use framing::CameraFraming;

pub const DEFAULT_POSITION_SCALE: f32 = 0.01;

/// One bone of the resolved pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub edge: usize,
    pub a: usize,
    pub b: usize,
    pub start: glm::Vec3,
    pub end: glm::Vec3,
}

/// Joint positions in render space for one frame, indexed like the dataset's sensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPose {
    pub frame: usize,
    pub joints: Vec<glm::Vec3>,
    pub segments: Vec<Segment>,
}

impl RenderPose {
    pub fn clear(&mut self) {
        self.frame = 0;
        self.joints.clear();
        self.segments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Maps source positions and calibration offsets into render space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseResolver {
    scale: f32,
}

impl PoseResolver {
    pub fn new(scale: f32) -> Self {
        if !scale.is_finite() || scale <= 0.0 {
            tracing::warn!(scale, "invalid position scale, using default");
            return Self::default();
        }
        Self { scale }
    }

    pub fn scale(&self) -> f32 { self.scale }

    #[inline]
    pub fn apply(&self, raw: &glm::Vec3, offset: &glm::Vec3) -> glm::Vec3 {
        raw * self.scale + offset * self.scale
    }

    /// Uncalibrated render-space position of `sensor` at `frame`.
    pub fn base_position(&self, dataset: &Dataset, frame: usize, sensor: usize) -> Option<glm::Vec3> {
        dataset.position(frame, sensor).map(|p| p * self.scale)
    }

    /// Source-unit offset that places a joint whose base is `base` at `world`.
    #[inline]
    pub fn offset_for(&self, world: &glm::Vec3, base: &glm::Vec3) -> glm::Vec3 {
        (world - base) / self.scale
    }

    pub fn resolve(&self, frame: usize, dataset: &Dataset, calibration: &Calibration) -> RenderPose {
        let mut pose = RenderPose::default();
        self.resolve_into(&mut pose, frame, dataset, calibration);
        pose
    }

    /// Same as `resolve` but reuses the allocations of `pose`.
    pub fn resolve_into(&self, pose: &mut RenderPose, frame: usize, dataset: &Dataset, calibration: &Calibration) {
        pose.clear();
        if dataset.is_degenerate() {return};

        let frame = frame.min(dataset.frame_count() - 1);
        pose.frame = frame;
        pose.joints.extend(dataset.frame(frame).iter()
            .zip(dataset.sensor_names())
            .map(|(raw, name)| self.apply(raw, &calibration.offset(name))));

        for (edge, e) in dataset.edges().iter().enumerate() {
            let (Some(a), Some(b)) = (dataset.sensor_index(&e.a), dataset.sensor_index(&e.b)) else {continue};
            pose.segments.push(Segment {
                edge,
                a,
                b,
                start: pose.joints[a],
                end: pose.joints[b],
            });
        }
    }
}

impl Default for PoseResolver {
    fn default() -> Self {
        Self { scale: DEFAULT_POSITION_SCALE }
    }
}
