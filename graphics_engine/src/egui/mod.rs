use winit::window::Window;

/// Paint jobs of one egui pass, ready to be recorded into a render pass.
pub struct EguiFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    screen_descriptor: egui_wgpu::ScreenDescriptor,
    free: Vec<egui::TextureId>,
}

pub struct Egui {
    context: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Egui {
    pub fn new(device: &wgpu::Device, window: &Window, format: wgpu::TextureFormat) -> Self {
        let context = egui::Context::default();
        let state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self {
            context,
            state,
            renderer: egui_wgpu::Renderer::new(device, format, None, 1, false),
        }
    }

    /// Returns true when egui consumed the event and the scene must not see it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn wants_pointer(&self) -> bool {
        self.context.wants_pointer_input() || self.context.is_using_pointer()
    }

    pub fn wants_keyboard(&self) -> bool {
        self.context.wants_keyboard_input()
    }

    /// Runs the ui closure, uploads textures and vertex data.
    pub(crate) fn prepare(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size_in_pixels: [u32; 2],
        ui: impl FnMut(&egui::Context),
    ) -> (EguiFrame, Vec<wgpu::CommandBuffer>) {
        let raw_input = self.state.take_egui_input(window);
        let output = self.context.run(raw_input, ui);
        self.state.handle_platform_output(window, output.platform_output);

        let paint_jobs = self.context.tessellate(output.shapes, output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let commands = self.renderer.update_buffers(device, queue, encoder, &paint_jobs, &screen_descriptor);

        let frame = EguiFrame { paint_jobs, screen_descriptor, free: output.textures_delta.free };
        (frame, commands)
    }

    pub(crate) fn render(&self, render_pass: &mut wgpu::RenderPass<'static>, frame: &EguiFrame) {
        self.renderer.render(render_pass, &frame.paint_jobs, &frame.screen_descriptor);
    }

    /// Textures egui no longer references are released once the frame is recorded.
    pub(crate) fn finish(&mut self, frame: EguiFrame) {
        for id in &frame.free {
            self.renderer.free_texture(id);
        }
    }
}
