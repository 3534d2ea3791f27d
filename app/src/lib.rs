use winit::event_loop::{ControlFlow, EventLoop};

pub use app::RunArgs;
pub use graphics_engine;

pub mod app;
pub mod calibration;
pub mod camera;
pub mod gui;
pub mod input_event;
pub mod interaction;
pub mod loader;
pub mod my_time;
pub mod playback;
pub mod pose;
pub mod save_load;
pub mod scene;
pub mod setting;
pub mod viewer;

pub fn run(args: RunArgs) -> Result<(), winit::error::EventLoopError> {
    tracing::info!(data_dir = ?args.data_dir, dataset = ?args.dataset, "starting viewer");
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = app::App::new(args);
    event_loop.run_app(&mut app)
}
