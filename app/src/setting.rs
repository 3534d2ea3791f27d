use graphics_engine::GraphicSetting;
use serde::{Deserialize, Serialize};

use crate::{playback::DEFAULT_MAX_CATCH_UP, pose::DEFAULT_POSITION_SCALE, viewer::ViewerOptions};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PlaybackSetting {
    /// Frame steps taken per refresh at most, the rest of a stall is dropped.
    pub max_catch_up_steps: u32,
    pub default_playing: bool,
}

impl Default for PlaybackSetting {
    fn default() -> Self {
        Self {
            max_catch_up_steps: DEFAULT_MAX_CATCH_UP,
            default_playing: true,
        }
    }
}


#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Setting {
    pub graphic: GraphicSetting,
    pub playback: PlaybackSetting,
    /// Source units to render units, applied to positions and offsets alike.
    pub position_scale: f32,
    pub marker_radius: f32,
    /// Vertical field of view in degrees.
    pub camera_fov: f32,
}


impl Setting {
    pub fn new() -> Self{Self::default()}

    pub fn viewer_options(&self) -> ViewerOptions {
        let defaults = ViewerOptions::default();
        let fov = self.camera_fov.to_radians();
        ViewerOptions {
            max_catch_up: self.playback.max_catch_up_steps,
            position_scale: self.position_scale,
            marker_radius: if self.marker_radius.is_finite() && self.marker_radius > 0.0 {self.marker_radius} else {defaults.marker_radius},
            camera_fov: if fov.is_finite() && fov > 0.05 && fov < 3.0 {fov} else {defaults.camera_fov},
            playing: self.playback.default_playing,
        }
    }
}


impl Default for Setting {
    fn default() -> Self {
        Self {
            graphic: Default::default(),
            playback: Default::default(),
            position_scale: DEFAULT_POSITION_SCALE,
            marker_radius: 0.025,
            camera_fov: 60.0,
        }
    }
}
