pub mod camera;
pub mod camera_controller;
