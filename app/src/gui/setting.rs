use egui::{Context, RichText, Ui};
use crate::{setting::Setting, save_load::SettingSave};


fn section(ui: &mut Ui, title: &str, id: &str, rows: impl FnOnce(&mut Ui)) {
    ui.add_space(6.0);
    ui.label(RichText::new(title).strong());
    egui::Grid::new(id)
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, rows);
}


/// Edits `setting` in place. Scene and graphics values apply on next start.
pub fn draw_setting(ctx: &Context, open: &mut bool, setting: &mut Setting, save: &SettingSave) {
    let mut is_save = false;
    egui::Window::new("Setting")
        .open(open)
        .resizable(false)
        .collapsible(false)
        .default_pos([320.0, 8.0])
        .show(ctx, |ui| {
            section(ui, "Playback", "setting_playback", |ui| {
                ui.label("Max catch-up steps");
                ui.add(egui::Slider::new(&mut setting.playback.max_catch_up_steps, 1..=16));
                ui.end_row();
                ui.label("Play on load");
                ui.checkbox(&mut setting.playback.default_playing, "");
                ui.end_row();
            });

            section(ui, "Scene (restart required)", "setting_scene", |ui| {
                ui.label("Marker radius");
                ui.add(egui::Slider::new(&mut setting.marker_radius, 0.005..=0.1));
                ui.end_row();
                ui.label("Field of view");
                ui.add(egui::Slider::new(&mut setting.camera_fov, 20.0..=120.0).suffix("°"));
                ui.end_row();
            });

            let graphic = &mut setting.graphic;
            section(ui, "Graphics (restart required)", "setting_graphics", |ui| {
                ui.label("Vsync");
                ui.checkbox(&mut graphic.vsync, "");
                ui.end_row();

                ui.label("Backend");
                ui.horizontal(|ui| {
                    for (value, name) in [
                        (None, "Auto"),
                        (Some(wgpu::Backends::VULKAN), "Vulkan"),
                        (Some(wgpu::Backends::DX12), "Dx12"),
                        (Some(wgpu::Backends::METAL), "Metal"),
                        (Some(wgpu::Backends::GL), "Gl"),
                    ] {
                        ui.selectable_value(&mut graphic.backends, value, name);
                    }
                });
                ui.end_row();

                ui.label("Device");
                ui.horizontal(|ui| {
                    for (value, name) in [
                        (None, "Auto"),
                        (Some(wgpu::DeviceType::DiscreteGpu), "Discrete"),
                        (Some(wgpu::DeviceType::IntegratedGpu), "Integrated"),
                    ] {
                        ui.selectable_value(&mut graphic.device_type, value, name);
                    }
                });
                ui.end_row();

                ui.label("Sample count");
                ui.horizontal(|ui| {
                    for count in [1, 2, 4, 8] {
                        ui.selectable_value(&mut graphic.sample_count, count, format!("X{count}"));
                    }
                });
                ui.end_row();
            });

            ui.add_space(6.0);
            is_save = ui.button("Save setting").clicked();
        });

    if is_save {
        save.save(setting);
    }
}
