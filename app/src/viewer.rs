use std::{sync::Arc, time::Duration};

use graphics_engine::SceneGeometry;
use nalgebra_glm as glm;
use resources::{Calibration, Dataset};

use crate::{
    camera::camera_controller::CameraController,
    interaction::{manipulator::Manipulator, pointer::{PointerEvent, SurfaceRect}, Interaction, InteractionContext, InteractionController},
    playback::{PlaybackClock, PlaybackState, Tick, DEFAULT_MAX_CATCH_UP},
    pose::{CameraFraming, PoseResolver, RenderPose, DEFAULT_POSITION_SCALE},
    scene::{ChannelVisibility, SceneObjects, SceneState, SceneStyle},
};

const CAMERA_NEAR: f32 = 0.01;
const CAMERA_FAR: f32 = 200.0;
const PICK_RADIUS_RATIO: f32 = 1.5;
const MANIPULATOR_RATIO: f32 = 0.2;

/// Callbacks from the viewer core to its host.
pub trait ViewerListener {
    /// At most once per frame advance or seek, after the frame has been resolved.
    fn on_frame_change(&mut self, frame: usize);
    /// Every drag movement, and `[0, 0, 0]` on reset.
    fn on_calibration_change(&mut self, sensor: &str, offset: glm::Vec3);
    fn on_select_joint(&mut self, sensor: Option<&str>);
    fn on_drag_start(&mut self, _sensor: &str) {}
    fn on_drag_end(&mut self, _sensor: &str) {}
}

/// Identifies one dataset request. Only the latest ticket is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerOptions {
    pub max_catch_up: u32,
    pub position_scale: f32,
    pub marker_radius: f32,
    /// Vertical, radians.
    pub camera_fov: f32,
    pub playing: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            position_scale: DEFAULT_POSITION_SCALE,
            marker_radius: SceneStyle::default().marker_radius,
            camera_fov: std::f32::consts::FRAC_PI_3,
            playing: true,
        }
    }
}

/// Animation and calibration core. Owns every piece of per-dataset state and is
/// the only place it changes.
pub struct Viewer {
    dataset: Option<Arc<Dataset>>,
    next_ticket: u64,
    pending: Option<u64>,
    calibration: Calibration,
    clock: PlaybackClock,
    resolver: PoseResolver,
    pose: RenderPose,
    /// Uncalibrated render positions at the current frame.
    bases: Vec<glm::Vec3>,
    scene: SceneObjects,
    scene_state: SceneState,
    style: SceneStyle,
    visibility: ChannelVisibility,
    interaction: InteractionController,
    manipulator: Manipulator,
    camera: CameraController,
    last_notified: Option<usize>,
    dirty: bool,
    reported_invalid: bool,
}

impl Viewer {
    pub fn new(options: ViewerOptions) -> Self {
        let mut clock = PlaybackClock::new(options.max_catch_up);
        clock.set_playing(options.playing);
        let style = SceneStyle { marker_radius: options.marker_radius, ..Default::default() };
        Self {
            dataset: None,
            next_ticket: 0,
            pending: None,
            calibration: Calibration::new(),
            clock,
            resolver: PoseResolver::new(options.position_scale),
            pose: RenderPose::default(),
            bases: Vec::new(),
            scene: SceneObjects::new(),
            scene_state: SceneState::Uninitialized,
            style,
            visibility: ChannelVisibility::empty(),
            interaction: InteractionController::new(),
            manipulator: Manipulator::new(0.15),
            camera: CameraController::new(options.camera_fov, CAMERA_NEAR, CAMERA_FAR),
            last_notified: None,
            dirty: false,
            reported_invalid: false,
        }
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> { self.dataset.as_ref() }
    pub fn playback(&self) -> &PlaybackState { self.clock.state() }
    pub fn clock(&self) -> &PlaybackClock { &self.clock }
    pub fn pose(&self) -> &RenderPose { &self.pose }
    pub fn scene(&self) -> &SceneObjects { &self.scene }
    pub fn scene_state(&self) -> SceneState { self.scene_state }
    pub fn calibration(&self) -> &Calibration { &self.calibration }
    pub fn camera(&self) -> &CameraController { &self.camera }
    pub fn manipulator(&self) -> &Manipulator { &self.manipulator }
    pub fn visibility(&self) -> ChannelVisibility { self.visibility }
    pub fn resolver(&self) -> &PoseResolver { &self.resolver }
    pub fn is_dragging(&self) -> bool { self.interaction.is_dragging() }

    pub fn selected_sensor(&self) -> Option<&str> {
        let dataset = self.dataset.as_ref()?;
        dataset.sensor_name(self.interaction.selected()?)
    }

    /// Abandons any request in flight. Results for older tickets are refused.
    pub fn begin_dataset_switch(&mut self) -> LoadTicket {
        self.next_ticket += 1;
        self.pending = Some(self.next_ticket);
        LoadTicket(self.next_ticket)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// The current dataset has no frames or no sensors, playback is held at frame 0.
    pub fn is_invalid(&self) -> bool {
        self.dataset.as_ref().is_some_and(|dataset| dataset.is_degenerate())
    }

    /// Resets all per-dataset state, then takes `dataset` and resolves frame 0.
    pub fn accept_dataset(&mut self, ticket: LoadTicket, dataset: Arc<Dataset>) -> bool {
        if self.pending != Some(ticket.0) {
            tracing::debug!(ticket = ticket.0, latest = self.next_ticket, "stale dataset dropped");
            return false;
        }
        self.pending = None;

        // Nothing to resolve means nothing to play: held at frame 0 like an empty recording.
        let playable = if dataset.is_degenerate() {0} else {dataset.frame_count()};
        self.clock.reset(playable, dataset.frame_rate());
        self.interaction.reset(&mut self.manipulator);
        self.camera.set_enabled(true);
        self.calibration = Calibration::new();
        self.pose.clear();
        self.bases.clear();
        // Re-accepting the same dataset frames the camera again.
        self.scene.clear();
        self.scene.rebuild(&dataset);
        self.last_notified = None;
        self.reported_invalid = false;
        self.scene_state = SceneState::Loaded;

        tracing::info!(
            dataset = dataset.name(),
            frames = dataset.frame_count(),
            sensors = dataset.sensor_count(),
            fps = dataset.frame_rate(),
            "dataset accepted"
        );
        self.dataset = Some(dataset);
        self.resolve();
        true
    }

    /// The request for `ticket` failed. The current dataset stays.
    pub fn reject_dataset(&mut self, ticket: LoadTicket) -> bool {
        if self.pending != Some(ticket.0) {return false};
        self.pending = None;
        true
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
        self.dirty = true;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.clock.set_playing(playing);
    }

    pub fn toggle_playing(&mut self) -> bool {
        self.clock.toggle_playing()
    }

    pub fn set_target_fps(&mut self, fps: f32) {
        self.clock.set_target_fps(fps);
    }

    pub fn set_max_catch_up(&mut self, steps: u32) {
        self.clock.set_max_catch_up(steps);
    }

    /// `Some` while the host is seeking: the frame is set and reported right away.
    /// `None` ends the seek and playback resumes from there.
    pub fn set_seek_frame(&mut self, frame: Option<usize>, listener: &mut dyn ViewerListener) {
        let Some(frame) = frame else {
            self.clock.set_seeking(false);
            return;
        };
        self.clock.set_seeking(true);
        if self.dataset.is_none() {return};

        let frame = self.clock.seek(frame);
        if frame != self.pose.frame || self.pose.is_empty() {
            self.dirty = true;
        }
        self.refresh(listener);
    }

    /// Moves `delta` frames and pauses.
    pub fn step(&mut self, delta: i64, listener: &mut dyn ViewerListener) {
        if self.dataset.is_none() {return};
        self.clock.set_playing(false);
        self.clock.step(delta);
        self.dirty = true;
        self.refresh(listener);
    }

    pub fn set_channel_visibility(&mut self, visibility: ChannelVisibility) {
        if self.visibility != visibility {
            self.visibility = visibility;
            self.dirty = true;
        }
    }

    /// Selection from the host. Ignored during a drag.
    pub fn set_selected_sensor(&mut self, sensor: Option<&str>) -> bool {
        let index = match (sensor, &self.dataset) {
            (Some(name), Some(dataset)) => match dataset.sensor_index(name) {
                Some(i) => Some(i),
                None => {
                    tracing::warn!(sensor = name, "selected sensor not in dataset");
                    None
                }
            },
            _ => None,
        };
        self.interaction.select(index, self.scene.markers(), &mut self.manipulator)
    }

    /// Reports a zero offset for the selected joint. The host decides how to store it.
    pub fn reset_selected_offset(&mut self, listener: &mut dyn ViewerListener) -> bool {
        if self.interaction.is_dragging() {return false};
        let Some(name) = self.selected_sensor().map(str::to_string) else {return false};
        self.calibration.set(&name, glm::Vec3::zeros());
        self.dirty = true;
        listener.on_calibration_change(&name, glm::Vec3::zeros());
        true
    }

    /// Per display refresh: advances the clock, resolves if needed, then reports the frame.
    pub fn update(&mut self, elapsed: Duration, listener: &mut dyn ViewerListener) {
        if self.dataset.is_none() {return};
        self.clock.set_suspended(self.interaction.is_dragging());

        match self.clock.tick(elapsed) {
            Tick::Advanced { dropped, frame, .. } => {
                if dropped {
                    tracing::debug!(frame, "playback fell behind, time discarded");
                }
                self.dirty = true;
            }
            Tick::InvalidDataset if !self.reported_invalid => {
                tracing::warn!("dataset has no frames or no sensors, playback held at frame 0");
                self.reported_invalid = true;
            }
            _ => {}
        }
        self.refresh(listener);
        self.scene_state = self.scene_state.follow(self.clock.state());
    }

    fn refresh(&mut self, listener: &mut dyn ViewerListener) {
        if self.dirty {
            self.resolve();
        }
        let frame = self.clock.current_frame();
        if self.last_notified != Some(frame) {
            self.last_notified = Some(frame);
            listener.on_frame_change(frame);
        }
    }

    fn resolve(&mut self) {
        self.dirty = false;
        let Some(dataset) = self.dataset.clone() else {return};
        let frame = self.clock.current_frame();

        self.resolver.resolve_into(&mut self.pose, frame, &dataset, &self.calibration);
        self.bases.clear();
        self.bases.extend((0..self.pose.joints.len())
            .map(|i| self.resolver.base_position(&dataset, self.pose.frame, i).unwrap_or_default()));

        let dragged = self.interaction.dragged_sensor();
        self.scene.apply_pose(&self.pose, dragged);
        self.scene.update_glyphs(self.pose.frame, &dataset, self.visibility);

        if !self.scene.is_framed() {
            if let Some(framing) = CameraFraming::compute(&self.pose.joints, self.camera.fov()) {
                tracing::debug!(distance = framing.distance, "camera framed");
                self.camera.frame(&framing);
                self.manipulator.set_size((framing.radius() * MANIPULATOR_RATIO).max(0.02));
                self.scene.mark_framed(&framing);
            }
        }

        if let (Some(sensor), None) = (self.manipulator.sensor(), dragged) {
            if let Some(marker) = self.scene.markers().get(sensor) {
                self.manipulator.set_position(*marker);
            }
        }
    }

    /// Routes one normalized pointer event through the interaction state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent, surface: &SurfaceRect, listener: &mut dyn ViewerListener) {
        let Some(dataset) = self.dataset.clone() else {return};

        let proj_view = self.camera.proj_view(surface.width, surface.height);
        let mut ctx = InteractionContext {
            inverse_proj_view: glm::inverse(&proj_view),
            view_dir: self.camera.front(),
            markers: self.scene.markers(),
            bases: &self.bases,
            pick_radius: self.style.marker_radius * PICK_RADIUS_RATIO,
            resolver: &self.resolver,
            manipulator: &mut self.manipulator,
        };
        let effects = self.interaction.dispatch(event, &mut ctx);

        for effect in effects {
            let name = |sensor: usize| dataset.sensor_name(sensor).unwrap_or_default();
            match effect {
                Interaction::Select(sensor) => listener.on_select_joint(sensor.map(name)),
                Interaction::DragStarted(sensor) => {
                    tracing::debug!(sensor = name(sensor), "drag started");
                    self.clock.set_suspended(true);
                    listener.on_drag_start(name(sensor));
                }
                Interaction::DragMoved { sensor, position, offset } => {
                    self.scene.set_marker_position(sensor, position);
                    self.scene.refresh_bones();
                    listener.on_calibration_change(name(sensor), offset);
                }
                Interaction::DragEnded(sensor) => {
                    tracing::debug!(sensor = name(sensor), "drag ended");
                    self.clock.set_suspended(false);
                    self.dirty = true;
                    listener.on_drag_end(name(sensor));
                }
                Interaction::Orbit(dx, dy) => self.camera.orbit(dx, dy),
                Interaction::Pan(dx, dy) => self.camera.pan(dx, dy),
                Interaction::Zoom(delta) => self.camera.zoom(delta),
            }
        }
        self.camera.set_enabled(self.interaction.orbit_enabled());
    }

    pub fn geometry(&self) -> SceneGeometry {
        self.scene.geometry(&self.manipulator, self.interaction.selected(), &self.style)
    }

    /// Same as `geometry` but reuses the allocations of `geometry`.
    pub fn write_geometry(&self, geometry: &mut SceneGeometry) {
        self.scene.write_geometry(geometry, &self.manipulator, self.interaction.selected(), &self.style);
    }

    pub fn proj_view(&self, width: f32, height: f32) -> glm::Mat4 {
        self.camera.proj_view(width, height)
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerOptions::default())
    }
}
