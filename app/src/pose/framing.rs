use nalgebra_glm as glm;

const MARGIN: f32 = 1.3;
const MIN_HALF_EXTENT: f32 = 0.1;

/// Where to put an orbit camera so the whole skeleton is visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFraming {
    pub center: glm::Vec3,
    pub min: glm::Vec3,
    pub max: glm::Vec3,
    pub distance: f32,
}

impl CameraFraming {
    /// `None` when there is no finite joint to frame.
    pub fn compute(joints: &[glm::Vec3], fov_y: f32) -> Option<Self> {
        let mut finite = joints.iter().filter(|j| j.iter().all(|c| c.is_finite()));
        let first = *finite.next()?;
        let (min, max) = finite.fold((first, first), |(min, max), j| {
            (glm::min2(&min, j), glm::max2(&max, j))
        });

        let size = max - min;
        let half = (size.x.max(size.y) * 0.5).max(MIN_HALF_EXTENT);
        let fov_y = if fov_y.is_finite() && fov_y > 0.01 {fov_y} else {std::f32::consts::FRAC_PI_3};
        let distance = half * MARGIN / (fov_y * 0.5).tan() + size.z * 0.5;

        Some(Self {
            center: (min + max) * 0.5,
            min,
            max,
            distance,
        })
    }

    /// Radius of a sphere around `center` that holds the box.
    pub fn radius(&self) -> f32 {
        glm::length(&(self.max - self.min)) * 0.5
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_the_bounding_box() {
        let joints = [glm::vec3(-1.0, 0.0, 0.0), glm::vec3(1.0, 2.0, 0.5), glm::vec3(f32::NAN, 0.0, 0.0)];
        let framing = CameraFraming::compute(&joints, std::f32::consts::FRAC_PI_2).unwrap();

        assert_eq!(framing.center, glm::vec3(0.0, 1.0, 0.25));
        // half extent 1, tan(45deg) = 1
        assert!((framing.distance - (1.0 * MARGIN + 0.25)).abs() < 1e-5);
    }

    #[test]
    fn skeleton_fits_in_view() {
        let joints = [glm::vec3(0.0, 0.0, 0.0), glm::vec3(0.3, 1.8, 0.2)];
        let fov = 1.0;
        let framing = CameraFraming::compute(&joints, fov).unwrap();
        let near_face = framing.distance - (framing.max.z - framing.center.z);
        let visible_half_height = near_face * (fov * 0.5).tan();
        assert!(visible_half_height >= (framing.max.y - framing.center.y));
    }

    #[test]
    fn nothing_to_frame() {
        assert!(CameraFraming::compute(&[], 1.0).is_none());
        assert!(CameraFraming::compute(&[glm::vec3(f32::INFINITY, 0.0, 0.0)], 1.0).is_none());
    }
}
