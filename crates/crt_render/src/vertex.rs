use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Two triangles over the corners emitted by `SpriteVertex::quad`.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

impl SpriteVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }

    /// Corners of an axis-aligned rectangle in screen space (top-left origin),
    /// ordered top-left, top-right, bottom-right, bottom-left.
    pub fn quad(x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) -> [SpriteVertex; 4] {
        [
            SpriteVertex {
                position: [x, y],
                tex_coords: [0.0, 0.0],
                color,
            },
            SpriteVertex {
                position: [x + width, y],
                tex_coords: [1.0, 0.0],
                color,
            },
            SpriteVertex {
                position: [x + width, y + height],
                tex_coords: [1.0, 1.0],
                color,
            },
            SpriteVertex {
                position: [x, y + height],
                tex_coords: [0.0, 1.0],
                color,
            },
        ]
    }
}

/// GPU buffers for a single textured rectangle.
pub struct QuadMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
}

impl QuadMesh {
    pub fn new(device: &wgpu::Device, x: f32, y: f32, width: f32, height: f32) -> Self {
        let vertices = SpriteVertex::quad(x, y, width, height, WHITE);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}
