mod camera_uniform;
mod pipeline;
mod shaders;
mod targets;

pub mod constants;
pub mod egui;
pub mod error;
pub mod mesh;
pub mod setting;
pub mod state;
pub mod vertices;

pub use error::StateError;
pub use mesh::SceneGeometry;
pub use setting::GraphicSetting;
pub use state::State;
pub use vertices::{line_vertex::LineVertex, marker_instance::MarkerInstance};
