use crate::constants::DEPTH_FORMAT;

/// Size dependent attachments of the scene pass. Rebuilt on every reconfigure.
pub(crate) struct FrameTargets {
    depth: wgpu::TextureView,
    /// Present only when multisampling, resolved into the surface texture.
    msaa: Option<wgpu::TextureView>,
}

fn attachment(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    format: wgpu::TextureFormat,
    sample_count: u32,
    label: &str,
) -> wgpu::TextureView {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }).create_view(&wgpu::TextureViewDescriptor::default())
}

impl FrameTargets {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> Self {
        Self {
            depth: attachment(device, config, DEPTH_FORMAT, sample_count, "scene depth"),
            msaa: (sample_count > 1)
                .then(|| attachment(device, config, config.format, sample_count, "scene msaa")),
        }
    }

    pub fn color<'a>(&'a self, surface: &'a wgpu::TextureView, clear: wgpu::Color) -> wgpu::RenderPassColorAttachment<'a> {
        let load = wgpu::LoadOp::Clear(clear);
        match &self.msaa {
            Some(msaa) => wgpu::RenderPassColorAttachment {
                view: msaa,
                resolve_target: Some(surface),
                // Only the resolved surface is read afterwards.
                ops: wgpu::Operations {load, store: wgpu::StoreOp::Discard},
            },
            None => wgpu::RenderPassColorAttachment {
                view: surface,
                resolve_target: None,
                ops: wgpu::Operations {load, store: wgpu::StoreOp::Store},
            },
        }
    }

    pub fn depth(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Discard,
            }),
            stencil_ops: None,
        }
    }
}
