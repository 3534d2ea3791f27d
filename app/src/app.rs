use std::path::PathBuf;
use std::sync::Arc;

use graphics_engine::{SceneGeometry, State};
use nalgebra_glm as glm;
use resources::{library::{self, DatasetEntry}, ChannelKind, SkeletonSchema, ValidationReport};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window, WindowId};

use crate::calibration::CalibrationStore;
use crate::gui::gui_controller::{GuiAction, GuiController, PanelView};
use crate::input_event::input_service::{InputService, Key};
use crate::input_event::KeypressState;
use crate::interaction::pointer::SurfaceRect;
use crate::loader::{DatasetLoader, LoadResult};
use crate::my_time;
use crate::save_load::Save;
use crate::scene::ChannelVisibility;
use crate::setting::Setting;
use crate::viewer::{LoadTicket, Viewer, ViewerListener};

/// Startup options coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub data_dir: PathBuf,
    /// Loaded right away when it names a dataset in the data directory.
    pub dataset: Option<String>,
    pub paused: bool,
}


/// Receives viewer notifications and keeps the calibration store in step with them.
#[derive(Debug, Default)]
struct HostListener {
    store: CalibrationStore,
    frame: usize,
}

impl ViewerListener for HostListener {
    fn on_frame_change(&mut self, frame: usize) {
        self.frame = frame;
    }

    fn on_calibration_change(&mut self, sensor: &str, offset: glm::Vec3) {
        if self.store.dragging() == Some(sensor) {
            self.store.apply_drag_change(sensor, offset);
        } else {
            self.store.set_offset(sensor, offset);
        }
    }

    fn on_select_joint(&mut self, sensor: Option<&str>) {
        tracing::debug!(?sensor, "joint selected");
    }

    fn on_drag_start(&mut self, sensor: &str) {
        self.store.begin_drag(sensor);
    }

    fn on_drag_end(&mut self, sensor: &str) {
        if let Some(ended) = self.store.end_drag() {
            tracing::info!(sensor = ended, offset = ?self.store.calibration().offset(sensor), "calibration updated");
        }
    }
}


pub struct App {
    window: Option<Arc<Window>>,
    state: Option<State>,
    /// Set when the renderer could not start. The window stays open without drawing.
    fatal: Option<String>,
    setting: Setting,
    save: Save,
    viewer: Viewer,
    host: HostListener,
    synced_revision: Option<u64>,
    loader: DatasetLoader,
    datasets: Vec<DatasetEntry>,
    pending: Option<(LoadTicket, String)>,
    warnings: Vec<String>,
    error: Option<String>,
    gui_controller: GuiController,
    input: InputService,
    time: my_time::Time,
    geometry: SceneGeometry,
}


impl App {
    pub fn new(args: RunArgs) -> Self {
        let save = Save::new(&args.data_dir);
        let setting = save.setting.load().unwrap_or_default();
        save.setting.save(&setting);

        let mut viewer = Viewer::new(setting.viewer_options());
        if args.paused {
            viewer.set_playing(false);
        }
        let datasets = library::list_datasets(&save.datasets);
        tracing::info!(dir = ?save.datasets, count = datasets.len(), "datasets found");

        let mut app = Self {
            window: None,
            state: None,
            fatal: None,
            setting,
            save,
            viewer,
            host: HostListener::default(),
            synced_revision: None,
            loader: DatasetLoader::spawn(SkeletonSchema::canonical()),
            datasets,
            pending: None,
            warnings: vec![],
            error: None,
            gui_controller: GuiController::new(),
            input: InputService::new(),
            time: my_time::Time::new(),
            geometry: SceneGeometry::default(),
        };

        if let Some(name) = &args.dataset {
            match app.datasets.iter().position(|entry| &entry.name == name) {
                Some(index) => app.request_dataset(index),
                None => {
                    tracing::warn!(dataset = name, "requested dataset not found");
                    app.error = Some(format!("Dataset \"{name}\" not found"));
                }
            }
        }
        app
    }

    fn request_dataset(&mut self, index: usize) {
        let Some(entry) = self.datasets.get(index) else {return};
        let ticket = self.viewer.begin_dataset_switch();
        tracing::info!(dataset = entry.name, path = ?entry.path, "dataset requested");
        if self.loader.request(ticket, entry.path.clone()) {
            self.pending = Some((ticket, entry.name.clone()));
        } else {
            self.viewer.reject_dataset(ticket);
            self.error = Some("Dataset loader is not running".to_string());
        }
    }

    fn receive_datasets(&mut self) {
        for (ticket, result) in self.loader.poll() {
            self.receive_dataset(ticket, result);
        }
    }

    fn receive_dataset(&mut self, ticket: LoadTicket, result: LoadResult) {
        let is_latest = self.pending.as_ref().is_some_and(|(pending, _)| *pending == ticket);
        match result {
            Ok((dataset, report)) => {
                let name = dataset.name().to_string();
                if !self.viewer.accept_dataset(ticket, Arc::new(dataset)) {return};
                self.pending = None;
                self.error = None;
                self.on_dataset_accepted(&name, &report);
            }
            Err(err) => {
                if !is_latest || !self.viewer.reject_dataset(ticket) {return};
                let name = self.pending.take().map(|(_, name)| name).unwrap_or_default();
                tracing::error!(dataset = name, %err, "dataset failed to load");
                self.error = Some(format!("{name}: {err}"));
            }
        }
    }

    fn on_dataset_accepted(&mut self, name: &str, report: &ValidationReport) {
        self.warnings = report.warnings();
        if self.viewer.is_invalid() {
            self.warnings.push("Dataset has no frames or no sensors, playback held at frame 0".to_string());
        }
        for warning in &self.warnings {
            tracing::warn!(dataset = name, "{warning}");
        }

        let calibration = match self.save.calibration.load(name) {
            Ok((calibration, import)) => {
                for sensor in &import.rejected {
                    tracing::warn!(dataset = name, sensor, "calibration entry rejected");
                    self.warnings.push(format!("Calibration entry rejected: {sensor}"));
                }
                calibration
            }
            Err(err) => {
                tracing::warn!(dataset = name, %err, "stored calibration unreadable");
                self.warnings.push(format!("Calibration not loaded: {err}"));
                Default::default()
            }
        };
        self.host.store.replace(calibration);
        self.host.frame = 0;
        self.sync_calibration();

        self.viewer.write_geometry(&mut self.geometry);
        if let Some(state) = &mut self.state {
            state.reset_scene_buffers(self.geometry.markers.len(), self.geometry.lines.len());
        }
    }

    /// Pushes the store to the viewer when it changed.
    fn sync_calibration(&mut self) {
        let revision = self.host.store.revision();
        if self.synced_revision != Some(revision) {
            self.synced_revision = Some(revision);
            self.viewer.set_calibration(self.host.store.snapshot());
        }
    }

    fn current_dataset(&self) -> Option<String> {
        self.viewer.dataset().map(|dataset| dataset.name().to_string())
    }

    fn handle_keys(&mut self, wants_keyboard: bool) {
        if self.input.is_key(&Key::F11, KeypressState::JustPressed) {
            if let Some(window) = &self.window {
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                }
            }
        }
        if self.input.is_key(&Key::F1, KeypressState::JustPressed) {
            self.gui_controller.toggle_ui();
        }
        if wants_keyboard {return};

        if self.input.is_key(&Key::Space, KeypressState::JustPressed) {
            self.viewer.toggle_playing();
        }
        if self.input.is_key(&Key::ArrowLeft, KeypressState::Triggered) {
            self.viewer.step(-1, &mut self.host);
        }
        if self.input.is_key(&Key::ArrowRight, KeypressState::Triggered) {
            self.viewer.step(1, &mut self.host);
        }
        if self.input.is_key(&Key::Escape, KeypressState::JustPressed) {
            self.viewer.set_selected_sensor(None);
        }
        if self.input.is_key(&Key::Delete, KeypressState::JustPressed)
            || self.input.is_key(&Key::Backspace, KeypressState::JustPressed) {
            self.viewer.reset_selected_offset(&mut self.host);
        }
    }

    fn apply(&mut self, action: GuiAction) {
        match action {
            GuiAction::LoadDataset(index) => self.request_dataset(index),
            GuiAction::RefreshDatasets => {
                self.datasets = library::list_datasets(&self.save.datasets);
            }
            GuiAction::SetPlaying(playing) => self.viewer.set_playing(playing),
            GuiAction::Step(delta) => self.viewer.step(delta, &mut self.host),
            GuiAction::Seek(frame) => self.viewer.set_seek_frame(frame, &mut self.host),
            GuiAction::SetTargetFps(fps) => self.viewer.set_target_fps(fps),
            GuiAction::SetVisibility(visibility) => self.viewer.set_channel_visibility(visibility),
            GuiAction::Select(sensor) => {
                self.viewer.set_selected_sensor(sensor.as_deref());
            }
            GuiAction::ResetSelected => {
                self.viewer.reset_selected_offset(&mut self.host);
            }
            GuiAction::SaveCalibration => {
                let Some(name) = self.current_dataset() else {return};
                if let Err(err) = self.save.calibration.save(&name, self.host.store.calibration()) {
                    tracing::error!(dataset = name, %err, "calibration save failed");
                    self.error = Some(format!("Calibration not saved: {err}"));
                }
            }
            GuiAction::LoadCalibration => {
                let Some(name) = self.current_dataset() else {return};
                match self.save.calibration.load(&name) {
                    Ok((calibration, report)) => {
                        if !report.rejected.is_empty() {
                            tracing::warn!(dataset = name, rejected = ?report.rejected, "calibration entries rejected");
                        }
                        self.host.store.import(calibration);
                    }
                    Err(err) => {
                        tracing::error!(dataset = name, %err, "calibration load failed");
                        self.error = Some(format!("Calibration not loaded: {err}"));
                    }
                }
            }
            GuiAction::ClearCalibration => self.host.store.clear(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {return};
        self.receive_datasets();

        let (wants_keyboard, surface) = match &self.state {
            Some(state) => (state.egui().wants_keyboard(), SurfaceRect::from_size(state.size.width, state.size.height)),
            None => return,
        };
        for event in self.input.take_pointer_events() {
            self.viewer.handle_pointer(event, &surface, &mut self.host);
        }
        self.handle_keys(wants_keyboard);
        self.sync_calibration();

        let elapsed = self.time.update();
        self.viewer.update(elapsed, &mut self.host);
        self.viewer.write_geometry(&mut self.geometry);

        let Some(state) = self.state.as_mut() else {return};
        state.update_camera(&self.viewer.proj_view(surface.width, surface.height).into());

        let dataset = self.viewer.dataset();
        let selected = self.viewer.selected_sensor();
        let available_channels = dataset.map_or(ChannelVisibility::empty(), |dataset| {
            ChannelKind::ALL.into_iter()
                .filter(|kind| dataset.has_channel(*kind))
                .fold(ChannelVisibility::empty(), |acc, kind| acc | ChannelVisibility::of(kind))
        });
        let view = PanelView {
            datasets: &self.datasets,
            dataset: dataset.map(|dataset| dataset.name()),
            loading: self.pending.is_some(),
            playing: self.viewer.playback().is_playing,
            frame: self.host.frame,
            num_frames: self.viewer.clock().num_frames(),
            target_fps: self.viewer.playback().target_fps,
            dataset_fps: dataset.map_or(0.0, |dataset| dataset.frame_rate()),
            visibility: self.viewer.visibility(),
            available_channels,
            sensors: dataset.map(|dataset| dataset.sensor_names()).unwrap_or_default(),
            selected,
            selected_offset: selected.map(|sensor| self.host.store.calibration().offset(sensor)),
            calibration_entries: self.host.store.calibration().len(),
            warnings: &self.warnings,
            error: self.error.as_deref(),
            render_fps: self.time.fps(),
        };

        let mut actions = vec![];
        let gui_controller = &mut self.gui_controller;
        let setting = &mut self.setting;
        let save = &self.save;
        let result = state.render(&self.geometry, |ctx| {
            actions = gui_controller.draw_panel(ctx, &view);
            gui_controller.draw_setting(ctx, setting, &save.setting);
        });
        match result {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                state.resize(state.size)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => tracing::warn!("surface timeout"),
        }

        for action in actions {
            self.apply(action);
        }
        self.sync_calibration();
        self.input.update();
    }
}


impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {return};

        let win_attr = Window::default_attributes()
            .with_title("Mocap Viewer")
            .with_inner_size(PhysicalSize::new(1280u32, 760u32));
        let window = match event_loop.create_window(win_attr) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(%err, "failed to create window");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        self.input.set_surface(SurfaceRect::from_size(size.width, size.height));

        match pollster::block_on(State::new(window.clone(), &self.setting.graphic)) {
            Ok(mut state) => {
                self.viewer.write_geometry(&mut self.geometry);
                state.reset_scene_buffers(self.geometry.markers.len(), self.geometry.lines.len());
                self.state = Some(state);
            }
            Err(err) => {
                tracing::error!(%err, "renderer initialization failed");
                window.set_title(&format!("Mocap Viewer: {err}"));
                self.fatal = Some(err.to_string());
            }
        }
        self.window = Some(window);
        self.time.restart();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|window| window.id()) != Some(window_id) {return};
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        if self.fatal.is_some() {return};
        let Some(state) = self.state.as_mut() else {return};

        let consumed = state.on_window_event(&event);
        let pointer_blocked = consumed || state.egui().wants_pointer();
        self.input.handle_window_event(&event, pointer_blocked);

        match event {
            WindowEvent::Resized(size) => {
                self.input.set_surface(SurfaceRect::from_size(size.width, size.height));
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.fatal.is_some() {return};
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        tracing::info!("viewer closed");
        self.state = None;
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const WALK: &str = r#"{"frameRate": 30, "sensorNames": ["head", "lumbar"], "frames": [[[0, 0, 0], [0, 100, 0]], [[0, 0, 0], [0, 100, 0]]]}"#;

    fn app_with(dir: &std::path::Path, dataset: Option<&str>) -> App {
        App::new(RunArgs {
            data_dir: dir.to_path_buf(),
            dataset: dataset.map(str::to_string),
            paused: true,
        })
    }

    fn write_dataset(dir: &std::path::Path) {
        fs::create_dir_all(dir.join("datasets")).unwrap();
        fs::write(dir.join("datasets").join("walk.json"), WALK).unwrap();
    }

    fn wait_for_dataset(app: &mut App) {
        let (ticket, result) = app.loader.wait().unwrap();
        app.receive_dataset(ticket, result);
    }

    #[test]
    fn auto_load_applies_stored_calibration() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        fs::create_dir(dir.path().join("calibration")).unwrap();
        fs::write(dir.path().join("calibration").join("walk.json"), r#"{"lumbar": {"positionOffset": [5, 0, 0]}, "ghost": {"positionOffset": "x"}}"#).unwrap();

        let mut app = app_with(dir.path(), Some("walk"));
        assert!(app.pending.is_some());
        wait_for_dataset(&mut app);

        assert!(app.pending.is_none());
        assert_eq!(app.current_dataset().as_deref(), Some("walk"));
        assert_eq!(app.viewer.calibration().offset("lumbar"), glm::vec3(5.0, 0.0, 0.0));
        assert!(!app.viewer.playback().is_playing);
        assert!(app.warnings.iter().any(|w| w.contains("ghost")));
    }

    #[test]
    fn empty_dataset_is_warned_and_held() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("datasets")).unwrap();
        fs::write(dir.path().join("datasets").join("empty.json"),
            r#"{"frameRate": 30, "sensorNames": [], "frames": [[], [], []]}"#).unwrap();

        let mut app = app_with(dir.path(), Some("empty"));
        wait_for_dataset(&mut app);

        assert_eq!(app.current_dataset().as_deref(), Some("empty"));
        assert!(app.viewer.is_invalid());
        assert!(app.warnings.iter().any(|w| w.contains("held at frame 0")));
        app.apply(GuiAction::Seek(Some(2)));
        assert_eq!(app.viewer.playback().current_frame, 0);
    }

    #[test]
    fn unknown_dataset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(dir.path(), Some("nope"));
        assert!(app.pending.is_none());
        assert!(app.error.is_some());
    }

    #[test]
    fn reset_and_save_calibration() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let mut app = app_with(dir.path(), Some("walk"));
        wait_for_dataset(&mut app);

        app.host.store.set_offset("head", glm::vec3(1.0, 2.0, 3.0));
        app.apply(GuiAction::Select(Some("head".to_string())));
        assert_eq!(app.viewer.selected_sensor(), Some("head"));
        app.apply(GuiAction::SaveCalibration);
        assert!(app.save.calibration.exists("walk"));

        app.apply(GuiAction::ResetSelected);
        assert_eq!(app.host.store.calibration().offset("head"), glm::Vec3::zeros());

        app.apply(GuiAction::LoadCalibration);
        assert_eq!(app.host.store.calibration().offset("head"), glm::vec3(1.0, 2.0, 3.0));
        app.sync_calibration();
        assert_eq!(app.viewer.calibration().offset("head"), glm::vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn seek_and_step_report_frames() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let mut app = app_with(dir.path(), Some("walk"));
        wait_for_dataset(&mut app);

        app.apply(GuiAction::Seek(Some(1)));
        assert_eq!(app.host.frame, 1);
        app.apply(GuiAction::Seek(None));
        app.apply(GuiAction::Step(1));
        assert_eq!(app.host.frame, 0);
    }
}
