pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const SAMPLE_COUNTS: [u32; 5] = [1, 2, 4, 8, 16];

// Per-dataset buffers start at this many elements and double when a frame needs more.
pub const MIN_LINE_VERTICES: usize = 1024;
pub const MIN_MARKER_INSTANCES: usize = 32;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {r: 0.08, g: 0.09, b: 0.11, a: 1.0};
