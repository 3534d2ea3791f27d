use nalgebra_glm as glm;

pub const MIN_GLYPH_LENGTH: f32 = 0.03;
pub const MAX_GLYPH_LENGTH: f32 = 0.3;
const GLYPH_GAIN: f32 = 0.06;
pub const TRIAD_LENGTH: f32 = 0.08;

/// Arrow from a joint along a sampled vector channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorGlyph {
    /// Unit length.
    pub direction: glm::Vec3,
    pub length: f32,
}

impl VectorGlyph {
    pub fn from_sample(sample: &glm::Vec3) -> Self {
        let magnitude = glm::length(sample);
        if !(magnitude > f32::EPSILON) || !magnitude.is_finite() {
            return Self { direction: glm::vec3(0.0, 1.0, 0.0), length: MIN_GLYPH_LENGTH };
        }
        Self { direction: sample / magnitude, length: glyph_length(magnitude) }
    }

    pub fn tip(&self, origin: &glm::Vec3) -> glm::Vec3 {
        origin + self.direction * self.length
    }
}

/// Monotonic in `magnitude`, kept inside `[MIN_GLYPH_LENGTH, MAX_GLYPH_LENGTH]`.
pub fn glyph_length(magnitude: f32) -> f32 {
    if !magnitude.is_finite() || magnitude <= 0.0 {return MIN_GLYPH_LENGTH};
    (GLYPH_GAIN * magnitude.ln_1p()).clamp(MIN_GLYPH_LENGTH, MAX_GLYPH_LENGTH)
}

/// Unit x, y and z axes rotated by `rotation`. A degenerate quaternion is read as identity.
pub fn triad(rotation: &glm::Quat) -> [glm::Vec3; 3] {
    let length = glm::quat_length(rotation);
    let rotation = if length.is_finite() && length > f32::EPSILON {
        glm::quat_normalize(rotation)
    } else {
        glm::quat_identity()
    };
    [
        glm::quat_rotate_vec3(&rotation, &glm::vec3(1.0, 0.0, 0.0)),
        glm::quat_rotate_vec3(&rotation, &glm::vec3(0.0, 1.0, 0.0)),
        glm::quat_rotate_vec3(&rotation, &glm::vec3(0.0, 0.0, 1.0)),
    ]
}
