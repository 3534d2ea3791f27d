pub mod glyph;

use bitflags::bitflags;
use graphics_engine::{LineVertex, MarkerInstance, SceneGeometry};
use nalgebra_glm as glm;
use resources::{ChannelKind, ChannelSample, Dataset, DatasetId};

use crate::{interaction::manipulator::{Axis, Manipulator}, playback::PlaybackState, pose::{CameraFraming, RenderPose}};
use glyph::{VectorGlyph, TRIAD_LENGTH};

const BONE_COLOR: [f32; 4] = [0.85, 0.85, 0.9, 1.0];
const SELECTED_BONE_COLOR: [f32; 4] = [1.0, 0.8, 0.3, 1.0];
const MARKER_COLOR: [f32; 4] = [0.25, 0.6, 1.0, 1.0];
const SELECTED_MARKER_COLOR: [f32; 4] = [1.0, 0.65, 0.1, 1.0];
const GRID_COLOR: [f32; 4] = [0.35, 0.35, 0.38, 1.0];
const AXIS_COLORS: [[f32; 4]; 3] = [
    [0.95, 0.25, 0.25, 1.0],
    [0.3, 0.9, 0.3, 1.0],
    [0.3, 0.45, 1.0, 1.0],
];

bitflags! {
    /// Which raw channel glyphs are drawn.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelVisibility: u8 {
        const ORIENTATION         = 0b0001;
        const ANGULAR_VELOCITY    = 0b0010;
        const LINEAR_ACCELERATION = 0b0100;
        const MAGNETIC_FIELD      = 0b1000;
    }
}

impl ChannelVisibility {
    pub fn of(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Orientation => Self::ORIENTATION,
            ChannelKind::AngularVelocity => Self::ANGULAR_VELOCITY,
            ChannelKind::LinearAcceleration => Self::LINEAR_ACCELERATION,
            ChannelKind::MagneticField => Self::MAGNETIC_FIELD,
        }
    }

    pub fn shows(&self, kind: ChannelKind) -> bool {
        self.contains(Self::of(kind))
    }
}

impl Default for ChannelVisibility {
    fn default() -> Self {
        Self::empty()
    }
}

fn channel_color(kind: ChannelKind) -> [f32; 4] {
    match kind {
        ChannelKind::Orientation => [1.0, 1.0, 1.0, 1.0],
        ChannelKind::AngularVelocity => [0.9, 0.3, 0.9, 1.0],
        ChannelKind::LinearAcceleration => [1.0, 0.9, 0.2, 1.0],
        ChannelKind::MagneticField => [0.2, 0.9, 0.9, 1.0],
    }
}

/// Lifecycle of the drawn scene for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Uninitialized,
    /// Objects built, pose at frame 0.
    Loaded,
    Playing,
    Paused,
    Seeking,
}

impl SceneState {
    pub fn follow(self, playback: &PlaybackState) -> Self {
        match self {
            SceneState::Uninitialized => SceneState::Uninitialized,
            _ if playback.is_seeking => SceneState::Seeking,
            _ if playback.is_playing => SceneState::Playing,
            _ => SceneState::Paused,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneStyle {
    pub marker_radius: f32,
    pub grid_lines: u32,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self { marker_radius: 0.025, grid_lines: 11 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    pub edge: usize,
    pub a: usize,
    pub b: usize,
    pub start: glm::Vec3,
    pub end: glm::Vec3,
}

/// Glyphs of one sensor for the current frame. `None` when hidden or unsampled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorGlyphs {
    pub orientation: Option<[glm::Vec3; 3]>,
    /// Angular velocity, acceleration, magnetic field.
    pub vectors: [Option<VectorGlyph>; 3],
}

impl SensorGlyphs {
    fn vector_slot(kind: ChannelKind) -> Option<usize> {
        match kind {
            ChannelKind::Orientation => None,
            ChannelKind::AngularVelocity => Some(0),
            ChannelKind::LinearAcceleration => Some(1),
            ChannelKind::MagneticField => Some(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ground {
    height: f32,
    center: glm::Vec3,
    half_extent: f32,
}

/// Render objects of the current dataset, indexed by sensor and edge position.
#[derive(Debug, Default)]
pub struct SceneObjects {
    dataset: Option<DatasetId>,
    markers: Vec<glm::Vec3>,
    bones: Vec<Bone>,
    glyphs: Vec<SensorGlyphs>,
    ground: Option<Ground>,
    framed: bool,
}

impl SceneObjects {
    pub fn new() -> Self { Self::default() }

    pub fn dataset(&self) -> Option<DatasetId> { self.dataset }
    pub fn markers(&self) -> &[glm::Vec3] { &self.markers }
    pub fn bones(&self) -> &[Bone] { &self.bones }
    pub fn glyphs(&self, sensor: usize) -> Option<&SensorGlyphs> { self.glyphs.get(sensor) }
    pub fn is_framed(&self) -> bool { self.framed }

    /// Builds a fresh set for `dataset`. Returns `false` when it already is the current one.
    pub fn rebuild(&mut self, dataset: &Dataset) -> bool {
        if self.dataset == Some(dataset.id()) {return false};
        self.clear();

        self.dataset = Some(dataset.id());
        if dataset.is_degenerate() {
            tracing::debug!(dataset = dataset.name(), "degenerate dataset, empty scene");
            return true;
        }

        let sensors = dataset.sensor_count();
        self.markers = vec![glm::Vec3::zeros(); sensors];
        self.glyphs = vec![SensorGlyphs::default(); sensors];
        self.bones = dataset.edges().iter()
            .enumerate()
            .filter_map(|(edge, e)| {
                let a = dataset.sensor_index(&e.a)?;
                let b = dataset.sensor_index(&e.b)?;
                Some(Bone { edge, a, b, start: glm::Vec3::zeros(), end: glm::Vec3::zeros() })
            })
            .collect();
        tracing::debug!(dataset = dataset.name(), sensors, bones = self.bones.len(), "scene rebuilt");
        true
    }

    pub fn clear(&mut self) {
        self.dataset = None;
        self.markers = Vec::new();
        self.bones = Vec::new();
        self.glyphs = Vec::new();
        self.ground = None;
        self.framed = false;
    }

    /// Copies joint positions, leaving the `overridden` marker where it is.
    pub fn apply_pose(&mut self, pose: &RenderPose, overridden: Option<usize>) {
        for (i, (marker, joint)) in self.markers.iter_mut().zip(&pose.joints).enumerate() {
            if Some(i) != overridden {
                *marker = *joint;
            }
        }
        self.refresh_bones();
    }

    pub fn set_marker_position(&mut self, sensor: usize, position: glm::Vec3) -> bool {
        let Some(marker) = self.markers.get_mut(sensor) else {return false};
        *marker = position;
        true
    }

    /// Re-reads bone endpoints from the current markers.
    pub fn refresh_bones(&mut self) {
        for bone in self.bones.iter_mut() {
            bone.start = self.markers[bone.a];
            bone.end = self.markers[bone.b];
        }
    }

    pub fn update_glyphs(&mut self, frame: usize, dataset: &Dataset, visibility: ChannelVisibility) {
        for (sensor, glyphs) in self.glyphs.iter_mut().enumerate() {
            *glyphs = SensorGlyphs::default();
            for kind in ChannelKind::ALL {
                if !visibility.shows(kind) {continue};
                match (dataset.channel_sample(sensor, kind, frame), SensorGlyphs::vector_slot(kind)) {
                    (Some(ChannelSample::Orientation(q)), _) => glyphs.orientation = Some(glyph::triad(&q)),
                    (Some(ChannelSample::Vector(v)), Some(slot)) => glyphs.vectors[slot] = Some(VectorGlyph::from_sample(&v)),
                    _ => {}
                }
            }
        }
    }

    /// One time per dataset: remembers the framing and lays the ground under the skeleton.
    pub fn mark_framed(&mut self, framing: &CameraFraming) {
        self.framed = true;
        self.ground = Some(Ground {
            height: framing.min.y,
            center: framing.center,
            half_extent: framing.radius().max(0.5) * 1.5,
        });
    }

    pub fn geometry(&self, manipulator: &Manipulator, selected: Option<usize>, style: &SceneStyle) -> SceneGeometry {
        let mut geometry = SceneGeometry::default();
        self.write_geometry(&mut geometry, manipulator, selected, style);
        geometry
    }

    pub fn write_geometry(&self, geometry: &mut SceneGeometry, manipulator: &Manipulator, selected: Option<usize>, style: &SceneStyle) {
        geometry.clear();
        if let Some(ground) = &self.ground {
            push_grid(&mut geometry.lines, ground, style.grid_lines);
        }

        for bone in &self.bones {
            let color = if selected.is_some_and(|s| s == bone.a || s == bone.b) {SELECTED_BONE_COLOR} else {BONE_COLOR};
            push_line(&mut geometry.lines, &bone.start, &bone.end, color);
        }

        for (sensor, marker) in self.markers.iter().enumerate() {
            let color = if selected == Some(sensor) {SELECTED_MARKER_COLOR} else {MARKER_COLOR};
            geometry.markers.push(MarkerInstance { center: (*marker).into(), radius: style.marker_radius, color });

            let Some(glyphs) = self.glyphs.get(sensor) else {continue};
            if let Some(axes) = &glyphs.orientation {
                for (axis, color) in axes.iter().zip(AXIS_COLORS) {
                    push_line(&mut geometry.lines, marker, &(marker + axis * TRIAD_LENGTH), color);
                }
            }
            let vector_kinds = [ChannelKind::AngularVelocity, ChannelKind::LinearAcceleration, ChannelKind::MagneticField];
            for (glyph, kind) in glyphs.vectors.iter().zip(vector_kinds) {
                if let Some(glyph) = glyph {
                    push_line(&mut geometry.lines, marker, &glyph.tip(marker), channel_color(kind));
                }
            }
        }

        if manipulator.is_visible() {
            let center = manipulator.position();
            for (axis, color) in Axis::ALL.into_iter().zip(AXIS_COLORS) {
                push_line(&mut geometry.overlay_lines, &center, &manipulator.tip(axis), color);
            }
        }
    }
}

fn push_line(lines: &mut Vec<LineVertex>, a: &glm::Vec3, b: &glm::Vec3, color: [f32; 4]) {
    lines.push(LineVertex::new((*a).into(), color));
    lines.push(LineVertex::new((*b).into(), color));
}

fn push_grid(lines: &mut Vec<LineVertex>, ground: &Ground, count: u32) {
    let count = count.max(2);
    let step = ground.half_extent * 2.0 / (count - 1) as f32;
    let origin = glm::vec3(ground.center.x - ground.half_extent, ground.height, ground.center.z - ground.half_extent);
    let span = ground.half_extent * 2.0;
    for i in 0..count {
        let d = i as f32 * step;
        push_line(lines, &(origin + glm::vec3(d, 0.0, 0.0)), &(origin + glm::vec3(d, 0.0, span)), GRID_COLOR);
        push_line(lines, &(origin + glm::vec3(0.0, 0.0, d)), &(origin + glm::vec3(span, 0.0, d)), GRID_COLOR);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{tests::dataset, PoseResolver};
    use resources::{Calibration, DatasetPayload, SkeletonSchema};
    use std::collections::HashMap;

    #[test]
    fn rebuild_is_keyed_on_dataset_identity() {
        let first = dataset(&["head", "neck", "lumbar"], &[("head", "neck"), ("neck", "lumbar")], 2);
        let second = dataset(&["head", "neck"], &[("head", "neck")], 2);
        let mut scene = SceneObjects::new();

        assert!(scene.rebuild(&first));
        assert!(!scene.rebuild(&first));
        assert_eq!((scene.markers().len(), scene.bones().len()), (3, 2));

        assert!(scene.rebuild(&second));
        assert_eq!(scene.dataset(), Some(second.id()));
        assert_eq!((scene.markers().len(), scene.bones().len()), (2, 1));
        assert!(!scene.is_framed());
    }

    #[test]
    fn overridden_marker_keeps_its_position_and_bones_follow() {
        let rig = dataset(&["head", "neck", "lumbar"], &[("head", "neck"), ("neck", "lumbar")], 4);
        let resolver = PoseResolver::default();
        let mut scene = SceneObjects::new();
        scene.rebuild(&rig);

        let dragged = glm::vec3(9.0, 9.0, 9.0);
        scene.set_marker_position(1, dragged);
        scene.apply_pose(&resolver.resolve(2, &rig, &Calibration::new()), Some(1));

        assert_eq!(scene.markers()[1], dragged);
        assert_eq!(scene.bones()[0].end, dragged);
        assert_eq!(scene.bones()[1].start, dragged);
        assert_eq!(scene.markers()[0], resolver.base_position(&rig, 2, 0).unwrap());
    }

    #[test]
    fn geometry_counts() {
        let rig = dataset(&["head", "neck", "lumbar"], &[("head", "neck"), ("neck", "lumbar")], 1);
        let mut scene = SceneObjects::new();
        scene.rebuild(&rig);
        let mut manipulator = Manipulator::new(0.2);

        let geometry = scene.geometry(&manipulator, None, &SceneStyle::default());
        assert_eq!(geometry.markers.len(), 3);
        assert_eq!(geometry.lines.len(), 4);
        assert!(geometry.overlay_lines.is_empty());

        manipulator.attach(2, scene.markers()[2]);
        let geometry = scene.geometry(&manipulator, Some(2), &SceneStyle::default());
        assert_eq!(geometry.overlay_lines.len(), 6);
        assert_eq!(geometry.markers[2].color, SELECTED_MARKER_COLOR);
        assert_eq!(geometry.lines[2].color, SELECTED_BONE_COLOR);
        assert_eq!(geometry.lines[0].color, BONE_COLOR);
    }

    #[test]
    fn ground_appears_after_framing() {
        let rig = dataset(&["head", "neck"], &[("head", "neck")], 1);
        let mut scene = SceneObjects::new();
        scene.rebuild(&rig);
        let pose = PoseResolver::default().resolve(0, &rig, &Calibration::new());
        scene.apply_pose(&pose, None);
        scene.mark_framed(&CameraFraming::compute(&pose.joints, 1.0).unwrap());

        let style = SceneStyle { grid_lines: 5, ..Default::default() };
        let geometry = scene.geometry(&Manipulator::new(0.2), None, &style);
        assert_eq!(geometry.lines.len(), 5 * 4 + 2);
        assert!(geometry.lines[..20].iter().all(|v| v.position[1] == pose.joints[0].y.min(pose.joints[1].y)));
    }

    #[test]
    fn glyphs_follow_visibility_flags() {
        let mut raw = HashMap::new();
        raw.insert("head".to_string(), resources::dataset::RawSensorPayload {
            orientation: Some(vec![vec![Some(1.0), Some(0.0), Some(0.0), Some(0.0)]; 2]),
            accelerometer: Some(vec![vec![Some(0.0), Some(0.0), Some(0.0)], vec![Some(0.0), Some(9.8), Some(0.0)]]),
            ..Default::default()
        });
        let payload = DatasetPayload {
            frame_rate: 30.0,
            sensor_names: vec!["head".to_string(), "neck".to_string()],
            edges: vec![("head".to_string(), "neck".to_string())],
            num_frames: None,
            num_sensors: None,
            frames: vec![vec![vec![Some(0.0); 3]; 2]; 2],
            raw_sensor_data: Some(raw),
        };
        let (rig, _) = Dataset::from_payload(payload, &SkeletonSchema::canonical()).unwrap();
        let mut scene = SceneObjects::new();
        scene.rebuild(&rig);

        scene.update_glyphs(1, &rig, ChannelVisibility::LINEAR_ACCELERATION);
        let head = scene.glyphs(0).unwrap();
        assert!(head.orientation.is_none());
        assert!(glm::distance(&head.vectors[1].unwrap().direction, &glm::vec3(0.0, 1.0, 0.0)) < 1e-6);
        assert_eq!(scene.glyphs(1), Some(&SensorGlyphs::default()));

        scene.update_glyphs(0, &rig, ChannelVisibility::all());
        let head = scene.glyphs(0).unwrap();
        assert!(head.orientation.is_some());
        assert_eq!(head.vectors[1].unwrap().length, glyph::MIN_GLYPH_LENGTH);
        assert!(head.vectors[0].is_none());
    }

    #[test]
    fn scene_state_follows_playback() {
        let mut playback = PlaybackState::default();
        assert_eq!(SceneState::Uninitialized.follow(&playback), SceneState::Uninitialized);
        assert_eq!(SceneState::Loaded.follow(&playback), SceneState::Playing);
        playback.is_playing = false;
        assert_eq!(SceneState::Playing.follow(&playback), SceneState::Paused);
        playback.is_seeking = true;
        assert_eq!(SceneState::Paused.follow(&playback), SceneState::Seeking);
    }
}
