/// Compiled WGSL modules, each with `vs_main` and `fs_main` entry points.
pub(crate) struct Shaders {
    pub line: wgpu::ShaderModule,
    pub marker: wgpu::ShaderModule,
}

impl Shaders {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            line: device.create_shader_module(wgpu::include_wgsl!("line.wgsl")),
            marker: device.create_shader_module(wgpu::include_wgsl!("marker.wgsl")),
        }
    }
}
