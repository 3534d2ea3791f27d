use std::f32::consts::PI;

use bytemuck::NoUninit;
use wgpu::util::DeviceExt;

use crate::constants::{MIN_LINE_VERTICES, MIN_MARKER_INSTANCES};
use crate::vertices::{line_vertex::LineVertex, marker_instance::MarkerInstance, marker_vertex::MarkerVertex};

const VERTEX: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX;
const COPY_DST: wgpu::BufferUsages = wgpu::BufferUsages::COPY_DST;

const SPHERE_STACKS: u32 = 10;
const SPHERE_SLICES: u32 = 16;

pub fn new_buffer<A: NoUninit>(
    device: &wgpu::Device,
    a: &[A],
    usage: wgpu::BufferUsages,
    label: &str
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(a),
        usage
    })
}

/// Everything drawn for one display refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGeometry {
    /// Depth tested line list: ground grid, bones, glyphs.
    pub lines: Vec<LineVertex>,
    /// Line list drawn over the scene (manipulator).
    pub overlay_lines: Vec<LineVertex>,
    pub markers: Vec<MarkerInstance>,
}

impl SceneGeometry {
    pub fn clear(&mut self) {
        self.lines.clear();
        self.overlay_lines.clear();
        self.markers.clear();
    }
}

/// Vertex buffer rewritten every frame, reallocated with doubled capacity when too small.
#[derive(Debug)]
pub struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    len: u32,
    label: &'static str,
}

impl DynamicBuffer {
    fn allocate(device: &wgpu::Device, bytes: usize, label: &str) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: bytes as wgpu::BufferAddress,
            usage: VERTEX | COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn new<A: NoUninit>(device: &wgpu::Device, capacity: usize, label: &'static str) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Self::allocate(device, capacity * std::mem::size_of::<A>(), label),
            capacity,
            len: 0,
            label,
        }
    }

    pub fn write<A: NoUninit>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[A]) {
        if data.len() > self.capacity {
            self.capacity = data.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.capacity * std::mem::size_of::<A>(), self.label);
            tracing::debug!(label = self.label, capacity = self.capacity, "vertex buffer grown");
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.len = data.len() as u32;
    }

    pub fn len(&self) -> u32 { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn capacity(&self) -> usize { self.capacity }
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }
}

/// GPU side of the scene. Owned by `State` and dropped as a whole when the dataset changes.
#[derive(Debug)]
pub struct SceneMesh {
    pub sphere_vertex_buffer: wgpu::Buffer,
    pub sphere_vertex_count: u32,
    pub lines: DynamicBuffer,
    pub overlay_lines: DynamicBuffer,
    pub markers: DynamicBuffer,
}

impl SceneMesh {
    pub fn new(device: &wgpu::Device, marker_capacity: usize, line_capacity: usize) -> Self {
        let sphere = unit_sphere(SPHERE_STACKS, SPHERE_SLICES);
        Self {
            sphere_vertex_buffer: new_buffer(device, &sphere, VERTEX, "Marker sphere vertex buffer"),
            sphere_vertex_count: sphere.len() as u32,
            lines: DynamicBuffer::new::<LineVertex>(device,
                line_capacity.max(MIN_LINE_VERTICES), "Scene line buffer"),
            overlay_lines: DynamicBuffer::new::<LineVertex>(device,
                MIN_LINE_VERTICES, "Scene overlay line buffer"),
            markers: DynamicBuffer::new::<MarkerInstance>(device,
                marker_capacity.max(MIN_MARKER_INSTANCES), "Marker instance buffer"),
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, geometry: &SceneGeometry) {
        self.lines.write(device, queue, &geometry.lines);
        self.overlay_lines.write(device, queue, &geometry.overlay_lines);
        self.markers.write(device, queue, &geometry.markers);
    }
}

/// Non-indexed triangle list of a unit sphere centered at the origin.
pub fn unit_sphere(stacks: u32, slices: u32) -> Vec<MarkerVertex> {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let point = |stack: u32, slice: u32| {
        let phi = PI * stack as f32 / stacks as f32;
        let theta = 2.0 * PI * slice as f32 / slices as f32;
        let p = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
        MarkerVertex { position: p, normal: p }
    };

    let mut vertices = Vec::with_capacity((stacks * slices * 6) as usize);
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = point(stack, slice);
            let b = point(stack + 1, slice);
            let c = point(stack + 1, slice + 1);
            let d = point(stack, slice + 1);
            vertices.extend([a, c, b, a, d, c]);
        }
    }
    vertices
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_are_on_unit_sphere() {
        let sphere = unit_sphere(6, 8);
        assert_eq!(sphere.len(), 6 * 8 * 6);
        for v in sphere {
            let [x, y, z] = v.position;
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-5);
            assert_eq!(v.position, v.normal);
        }
    }

    #[test]
    fn geometry_clear_keeps_nothing() {
        let mut geometry = SceneGeometry::default();
        geometry.lines.push(LineVertex::new([0.0; 3], [1.0; 4]));
        geometry.markers.push(MarkerInstance { center: [0.0; 3], radius: 1.0, color: [1.0; 4] });
        geometry.clear();
        assert_eq!(geometry, SceneGeometry::default());
    }
}
