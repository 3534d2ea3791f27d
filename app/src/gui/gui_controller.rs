use egui::{vec2, Align2, Color32, Context, RichText, Ui};
use nalgebra_glm as glm;
use resources::{library::DatasetEntry, ChannelKind};

use crate::{save_load::SettingSave, scene::ChannelVisibility, setting::Setting};

const WARNING_COLOR: Color32 = Color32::from_rgb(255, 196, 0);
const ERROR_COLOR: Color32 = Color32::from_rgb(255, 110, 110);
const MAX_TARGET_FPS: f32 = 240.0;

/// What the control panel shows this frame.
pub struct PanelView<'a> {
    pub datasets: &'a [DatasetEntry],
    pub dataset: Option<&'a str>,
    pub loading: bool,
    pub playing: bool,
    pub frame: usize,
    pub num_frames: usize,
    pub target_fps: f32,
    pub dataset_fps: f32,
    pub visibility: ChannelVisibility,
    pub available_channels: ChannelVisibility,
    pub sensors: &'a [String],
    pub selected: Option<&'a str>,
    pub selected_offset: Option<glm::Vec3>,
    pub calibration_entries: usize,
    pub warnings: &'a [String],
    pub error: Option<&'a str>,
    pub render_fps: f32,
}

/// User requests collected while drawing, applied by the app afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiAction {
    LoadDataset(usize),
    RefreshDatasets,
    SetPlaying(bool),
    Step(i64),
    /// `Some` while the frame slider is held, `None` on release.
    Seek(Option<usize>),
    SetTargetFps(f32),
    SetVisibility(ChannelVisibility),
    Select(Option<String>),
    ResetSelected,
    SaveCalibration,
    LoadCalibration,
    ClearCalibration,
}


pub struct GuiController {
    is_ui: bool,
    is_setting: bool,
    seek: Option<usize>,
}


impl GuiController {
    pub fn new() -> Self {
        Self {
            is_ui: true,
            is_setting: false,
            seek: None,
        }
    }

    pub fn is_ui(&self) -> bool {
        self.is_ui
    }

    pub fn toggle_ui(&mut self) {
        self.is_ui = !self.is_ui;
    }

    pub fn toggle_setting(&mut self) {
        self.is_setting = !self.is_setting;
    }

    pub fn draw_setting(&mut self, ctx: &Context, setting: &mut Setting, save: &SettingSave) -> &mut Self {
        super::setting::draw_setting(ctx, &mut self.is_setting, setting, save);
        self
    }

    pub fn draw_panel(&mut self, ctx: &Context, view: &PanelView) -> Vec<GuiAction> {
        let mut actions = vec![];
        if !self.is_ui {return actions};

        egui::Window::new("Viewer")
            .anchor(Align2::LEFT_TOP, [8.0, 8.0])
            .resizable(false)
            .collapsible(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing = vec2(6.0, 4.0);
                self.draw_datasets(ui, view, &mut actions);
                ui.separator();
                self.draw_playback(ui, view, &mut actions);
                ui.separator();
                Self::draw_channels(ui, view, &mut actions);
                ui.separator();
                Self::draw_joint(ui, view, &mut actions);
                ui.separator();
                Self::draw_calibration(ui, view, &mut actions);
                Self::draw_messages(ui, view);
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(format!("Render: {:.0} fps", view.render_fps));
                    if ui.button("Setting").clicked() {
                        self.toggle_setting();
                    }
                });
            });
        actions
    }

    fn draw_datasets(&mut self, ui: &mut Ui, view: &PanelView, actions: &mut Vec<GuiAction>) {
        ui.horizontal(|ui| {
            ui.label("Dataset:");
            let current = view.dataset.unwrap_or("none");
            egui::ComboBox::from_id_salt("dataset")
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for (index, entry) in view.datasets.iter().enumerate() {
                        let selected = view.dataset == Some(entry.name.as_str());
                        if ui.selectable_label(selected, &entry.name).clicked() && !selected {
                            actions.push(GuiAction::LoadDataset(index));
                        }
                    }
                });
            if ui.small_button("⟳").on_hover_text("Rescan data directory").clicked() {
                actions.push(GuiAction::RefreshDatasets);
            }
            if view.loading {
                ui.spinner();
            }
        });
        if view.datasets.is_empty() {
            ui.label(RichText::new("No datasets found").color(WARNING_COLOR));
        }
    }

    fn draw_playback(&mut self, ui: &mut Ui, view: &PanelView, actions: &mut Vec<GuiAction>) {
        ui.add_enabled_ui(view.num_frames > 0, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⏮").clicked() {
                    actions.push(GuiAction::Step(-1));
                }
                let label = if view.playing {"Pause"} else {"Play"};
                if ui.button(label).clicked() {
                    actions.push(GuiAction::SetPlaying(!view.playing));
                }
                if ui.button("⏭").clicked() {
                    actions.push(GuiAction::Step(1));
                }
                ui.label(format!("{} / {}", view.frame + 1, view.num_frames.max(1)));
            });

            let last = view.num_frames.saturating_sub(1);
            let mut frame = self.seek.unwrap_or(view.frame).min(last);
            ui.spacing_mut().slider_width = 220.0;
            let response = ui.add(egui::Slider::new(&mut frame, 0..=last).show_value(false));
            if response.dragged() || response.changed() {
                self.seek = Some(frame);
                actions.push(GuiAction::Seek(Some(frame)));
            }
            if self.seek.is_some() && !response.dragged() {
                self.seek = None;
                actions.push(GuiAction::Seek(None));
            }

            ui.horizontal(|ui| {
                ui.label("Target fps:");
                let mut fps = if view.target_fps > 0.0 {view.target_fps} else {view.dataset_fps};
                let response = ui.add(egui::Slider::new(&mut fps, 1.0..=MAX_TARGET_FPS).integer());
                if response.changed() {
                    actions.push(GuiAction::SetTargetFps(fps));
                }
                if ui.small_button("Native").clicked() {
                    actions.push(GuiAction::SetTargetFps(0.0));
                }
            });
        });
    }

    fn draw_channels(ui: &mut Ui, view: &PanelView, actions: &mut Vec<GuiAction>) {
        ui.label("Sensor channels:");
        let mut visibility = view.visibility;
        ui.horizontal_wrapped(|ui| {
            for kind in ChannelKind::ALL {
                let flag = ChannelVisibility::of(kind);
                let mut shown = visibility.contains(flag);
                let enabled = view.available_channels.contains(flag);
                if ui.add_enabled(enabled, egui::Checkbox::new(&mut shown, kind.label())).changed() {
                    visibility.set(flag, shown);
                }
            }
        });
        if visibility != view.visibility {
            actions.push(GuiAction::SetVisibility(visibility));
        }
    }

    fn draw_joint(ui: &mut Ui, view: &PanelView, actions: &mut Vec<GuiAction>) {
        ui.horizontal(|ui| {
            ui.label("Joint:");
            egui::ComboBox::from_id_salt("joint")
                .selected_text(view.selected.unwrap_or("none"))
                .show_ui(ui, |ui| {
                    if ui.selectable_label(view.selected.is_none(), "none").clicked() {
                        actions.push(GuiAction::Select(None));
                    }
                    for sensor in view.sensors {
                        let selected = view.selected == Some(sensor.as_str());
                        if ui.selectable_label(selected, sensor).clicked() && !selected {
                            actions.push(GuiAction::Select(Some(sensor.clone())));
                        }
                    }
                });
        });
        let Some(offset) = view.selected_offset else {return};
        ui.horizontal(|ui| {
            ui.label(format!("Offset: ({:.2}, {:.2}, {:.2})", offset.x, offset.y, offset.z));
            if ui.add_enabled(offset != glm::Vec3::zeros(), egui::Button::new("Reset")).clicked() {
                actions.push(GuiAction::ResetSelected);
            }
        });
    }

    fn draw_calibration(ui: &mut Ui, view: &PanelView, actions: &mut Vec<GuiAction>) {
        ui.label(format!("Calibration: {} offsets", view.calibration_entries));
        ui.add_enabled_ui(view.dataset.is_some(), |ui| {
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    actions.push(GuiAction::SaveCalibration);
                }
                if ui.button("Load").clicked() {
                    actions.push(GuiAction::LoadCalibration);
                }
                if ui.button("Clear").clicked() {
                    actions.push(GuiAction::ClearCalibration);
                }
            });
        });
    }

    fn draw_messages(ui: &mut Ui, view: &PanelView) {
        if let Some(error) = view.error {
            ui.separator();
            ui.label(RichText::new(error).color(ERROR_COLOR));
        }
        if view.warnings.is_empty() {return};
        ui.separator();
        ui.collapsing(format!("Warnings ({})", view.warnings.len()), |ui| {
            for warning in view.warnings {
                ui.label(RichText::new(warning).color(WARNING_COLOR));
            }
        });
    }
}


impl Default for GuiController {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(sensors: &'a [String], warnings: &'a [String]) -> PanelView<'a> {
        PanelView {
            datasets: &[],
            dataset: Some("walk"),
            loading: false,
            playing: true,
            frame: 3,
            num_frames: 30,
            target_fps: 0.0,
            dataset_fps: 30.0,
            visibility: ChannelVisibility::ORIENTATION,
            available_channels: ChannelVisibility::all(),
            sensors,
            selected: Some("head"),
            selected_offset: Some(glm::vec3(1.0, 0.0, 0.0)),
            calibration_entries: 1,
            warnings,
            error: Some("failed"),
            render_fps: 60.0,
        }
    }

    #[test]
    fn idle_panel_requests_nothing() {
        let ctx = Context::default();
        let sensors = vec!["head".to_string(), "lumbar".to_string()];
        let warnings = vec!["Missing sensors: foot_right".to_string()];
        let mut gui = GuiController::new();
        let mut actions = vec![];
        for _ in 0..2 {
            let _ = ctx.run(Default::default(), |ctx| {
                actions.extend(gui.draw_panel(ctx, &view(&sensors, &warnings)));
            });
        }
        assert!(actions.is_empty());
    }

    #[test]
    fn hidden_ui_draws_nothing() {
        let ctx = Context::default();
        let mut gui = GuiController::new();
        gui.toggle_ui();
        let _ = ctx.run(Default::default(), |ctx| {
            assert!(gui.draw_panel(ctx, &view(&[], &[])).is_empty());
        });
    }
}
