use bytemuck::{Pod, Zeroable};
use colorcube_render::Shape;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn for_shape(shape: Shape) -> Self {
        match shape {
            Shape::Cube => Self::cube(),
            Shape::Triangle => Self::triangle(),
        }
    }

    /// Unit cube centered on the origin, one color per face.
    pub fn cube() -> Self {
        let p = 0.5_f32;
        let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
            // +Z
            ([[-p, -p, p], [p, -p, p], [p, p, p], [-p, p, p]], [1.0, 0.0, 0.0]),
            // -Z
            ([[p, -p, -p], [-p, -p, -p], [-p, p, -p], [p, p, -p]], [0.0, 1.0, 0.0]),
            // +X
            ([[p, -p, p], [p, -p, -p], [p, p, -p], [p, p, p]], [0.0, 0.0, 1.0]),
            // -X
            ([[-p, -p, -p], [-p, -p, p], [-p, p, p], [-p, p, -p]], [1.0, 1.0, 0.0]),
            // +Y
            ([[-p, p, p], [p, p, p], [p, p, -p], [-p, p, -p]], [0.0, 1.0, 1.0]),
            // -Y
            ([[-p, -p, -p], [p, -p, -p], [p, -p, p], [-p, -p, p]], [1.0, 0.0, 1.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (corners, color) in faces {
            let base = vertices.len() as u16;
            vertices.extend(corners.iter().map(|&position| Vertex { position, color }));
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self { vertices, indices }
    }

    /// Red, green and blue corners.
    pub fn triangle() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            Vertex { position: [-0.6, -0.4, 0.0], color: [1.0, 0.0, 0.0] },
            Vertex { position: [ 0.6, -0.4, 0.0], color: [0.0, 1.0, 0.0] },
            Vertex { position: [ 0.0,  0.6, 0.0], color: [0.0, 0.0, 1.0] },
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2],
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
