use crate::constants::DEPTH_FORMAT;
use crate::shaders::Shaders;
use crate::vertices::{line_vertex::LineVertex, marker_instance::MarkerInstance, marker_vertex::MarkerVertex};

/// What a scene pipeline draws. Decides topology, vertex layout and depth behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScenePass {
    /// Ground grid, bones and glyphs, depth tested.
    Lines,
    /// Manipulator handles: always on top, never writes depth.
    Overlay,
    /// One instanced sphere per sensor.
    Markers,
}

impl ScenePass {
    fn label(self) -> &'static str {
        match self {
            ScenePass::Lines => "scene lines",
            ScenePass::Overlay => "scene overlay",
            ScenePass::Markers => "scene markers",
        }
    }

    fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            ScenePass::Lines | ScenePass::Overlay => wgpu::PrimitiveTopology::LineList,
            ScenePass::Markers => wgpu::PrimitiveTopology::TriangleList,
        }
    }

    fn depth(self) -> wgpu::DepthStencilState {
        let (write, compare) = match self {
            ScenePass::Overlay => (false, wgpu::CompareFunction::Always),
            ScenePass::Lines | ScenePass::Markers => (true, wgpu::CompareFunction::Less),
        };
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: write,
            depth_compare: compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    fn buffers(self) -> Vec<wgpu::VertexBufferLayout<'static>> {
        match self {
            ScenePass::Lines | ScenePass::Overlay => vec![LineVertex::desc()],
            ScenePass::Markers => vec![MarkerVertex::desc(), MarkerInstance::desc()],
        }
    }

    fn shader(self, shaders: &Shaders) -> &wgpu::ShaderModule {
        match self {
            ScenePass::Lines | ScenePass::Overlay => &shaders.line,
            ScenePass::Markers => &shaders.marker,
        }
    }
}

pub(crate) struct Pipelines {
    pub lines: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
    pub markers: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        camera: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let shaders = Shaders::new(device);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[camera],
            push_constant_ranges: &[],
        });
        let build = |pass: ScenePass| build_pipeline(device, &layout, &shaders, format, sample_count, pass);

        Self {
            lines: build(ScenePass::Lines),
            overlay: build(ScenePass::Overlay),
            markers: build(ScenePass::Markers),
        }
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shaders: &Shaders,
    format: wgpu::TextureFormat,
    sample_count: u32,
    pass: ScenePass,
) -> wgpu::RenderPipeline {
    let module = pass.shader(shaders);
    let buffers = pass.buffers();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(pass.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: "vs_main",
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        // Lines have no facing and the marker spheres are closed.
        primitive: wgpu::PrimitiveState {
            topology: pass.topology(),
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(pass.depth()),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}
