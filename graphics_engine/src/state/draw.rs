use crate::constants::CLEAR_COLOR;
use crate::mesh::{SceneGeometry, SceneMesh};

use super::State;

impl State {
    /// Uploads `geometry`, draws the scene, then the ui built by `ui` on top.
    pub fn render(&mut self, geometry: &SceneGeometry, ui: impl FnMut(&egui::Context)) -> Result<(), wgpu::SurfaceError> {
        if let Some(scene) = &mut self.scene {
            scene.upload(&self.device, &self.queue, geometry);
        }

        self.window.pre_present_notify();
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });

        self.scene_pass(&mut encoder, &view);

        let (frame, ui_commands) = self.egui.prepare(&mut encoder, &self.window, &self.device,
            &self.queue, [self.config.width, self.config.height], ui);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ui pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store},
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        }).forget_lifetime();
        self.egui.render(&mut pass, &frame);
        drop(pass);
        self.egui.finish(frame);

        self.queue.submit(ui_commands.into_iter().chain([encoder.finish()]));
        output.present();
        Ok(())
    }

    fn scene_pass(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(self.targets.color(view, CLEAR_COLOR))],
            depth_stencil_attachment: Some(self.targets.depth()),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        let Some(scene) = &self.scene else {return};

        pass.set_bind_group(0, &self.camera.bind_group, &[]);
        self.draw_lines(&mut pass, scene);
        self.draw_markers(&mut pass, scene);
        // Last, so handles stay visible through the body.
        self.draw_overlay(&mut pass, scene);
    }

    fn draw_lines(&self, pass: &mut wgpu::RenderPass<'_>, scene: &SceneMesh) {
        if scene.lines.is_empty() {return};
        pass.set_pipeline(&self.pipelines.lines);
        pass.set_vertex_buffer(0, scene.lines.slice());
        pass.draw(0..scene.lines.len(), 0..1);
    }

    fn draw_markers(&self, pass: &mut wgpu::RenderPass<'_>, scene: &SceneMesh) {
        if scene.markers.is_empty() {return};
        pass.set_pipeline(&self.pipelines.markers);
        pass.set_vertex_buffer(0, scene.sphere_vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, scene.markers.slice());
        pass.draw(0..scene.sphere_vertex_count, 0..scene.markers.len());
    }

    fn draw_overlay(&self, pass: &mut wgpu::RenderPass<'_>, scene: &SceneMesh) {
        if scene.overlay_lines.is_empty() {return};
        pass.set_pipeline(&self.pipelines.overlay);
        pass.set_vertex_buffer(0, scene.overlay_lines.slice());
        pass.draw(0..scene.overlay_lines.len(), 0..1);
    }
}
