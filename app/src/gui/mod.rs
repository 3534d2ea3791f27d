pub mod gui_controller;
pub mod setting;
