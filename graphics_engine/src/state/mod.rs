use std::sync::Arc;

use winit::{dpi::PhysicalSize, event::WindowEvent, window::Window};

use crate::camera_uniform::CameraUniform;
use crate::egui::Egui;
use crate::error::StateError;
use crate::mesh::SceneMesh;
use crate::pipeline::Pipelines;
use crate::setting::GraphicSetting;
use crate::targets::FrameTargets;

mod adapter;
mod draw;

/// Window surface and device plus everything needed to draw the skeleton scene
/// and the egui overlay on top of it.
pub struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    sample_count: u32,

    camera: CameraUniform,
    pipelines: Pipelines,
    targets: FrameTargets,
    /// `None` until the first `reset_scene_buffers`.
    scene: Option<SceneMesh>,

    egui: Egui,
}

impl State {
    pub async fn new(window: Arc<Window>, setting: &GraphicSetting) -> Result<Self, StateError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: setting.backends.unwrap_or(wgpu::Backends::all()),
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = adapter::select_adapter(&instance, &surface, setting).await?;
        let info = adapter.get_info();
        tracing::info!(name = %info.name, backend = ?info.backend, device_type = ?info.device_type, "adapter selected");
        let (device, queue) = adapter::open_device(&adapter).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps.formats.iter().copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(StateError::NoSurfaceFormat)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if setting.vsync {wgpu::PresentMode::AutoVsync} else {wgpu::PresentMode::AutoNoVsync},
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![format],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let supported = adapter::supported_sample_counts(format, adapter.get_texture_format_features(format).flags);
        let sample_count = adapter::pick_sample_count(setting.sample_count, &supported);
        if sample_count != setting.sample_count {
            tracing::warn!(requested = setting.sample_count, used = sample_count, "sample count not supported");
        }
        tracing::info!(?format, sample_count, "surface configured");

        let camera = CameraUniform::new(&device);
        let pipelines = Pipelines::new(&device, &camera.layout, format, sample_count);
        let targets = FrameTargets::new(&device, &config, sample_count);
        let egui = Egui::new(&device, &window, format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            camera,
            pipelines,
            targets,
            scene: None,
            egui,
        })
    }

    pub fn egui(&self) -> &Egui {
        &self.egui
    }

    /// Zero sized windows are ignored, the surface keeps its last size.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {return};
        self.size = size;
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.targets = FrameTargets::new(&self.device, &self.config, self.sample_count);
        self.window.request_redraw();
    }

    pub fn update_camera(&mut self, proj_view: &[[f32; 4]; 4]) {
        self.camera.write(&self.queue, proj_view);
    }

    /// Drops the buffers of the previous dataset and allocates new ones.
    pub fn reset_scene_buffers(&mut self, marker_capacity: usize, line_capacity: usize) {
        tracing::debug!(marker_capacity, line_capacity, "scene buffers reset");
        self.scene = Some(SceneMesh::new(&self.device, marker_capacity, line_capacity));
    }

    /// Forwards to egui and tracks resizes. Returns true when egui consumed the event.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        let consumed = self.egui.on_window_event(&self.window, event);
        if let WindowEvent::Resized(size) = event {
            self.resize(*size);
        }
        consumed
    }
}
