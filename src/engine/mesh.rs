//! Fixed meshes used by the precompute passes.

use crate::{AttributeUsage, DataType, MeshData, Primitive, VertexAttribute};

#[rustfmt::skip]
const UNIT_CUBE_VERTICES: [f32; 72] = [
    // back
    -1.0, -1.0, -1.0,   -1.0,  1.0, -1.0,    1.0,  1.0, -1.0,    1.0, -1.0, -1.0,
    // front
    -1.0, -1.0,  1.0,    1.0, -1.0,  1.0,    1.0,  1.0,  1.0,   -1.0,  1.0,  1.0,
    // left
    -1.0, -1.0, -1.0,   -1.0, -1.0,  1.0,   -1.0,  1.0,  1.0,   -1.0,  1.0, -1.0,
    // right
     1.0, -1.0, -1.0,    1.0,  1.0, -1.0,    1.0,  1.0,  1.0,    1.0, -1.0,  1.0,
    // bottom
    -1.0, -1.0, -1.0,    1.0, -1.0, -1.0,    1.0, -1.0,  1.0,   -1.0, -1.0,  1.0,
    // top
    -1.0,  1.0, -1.0,   -1.0,  1.0,  1.0,    1.0,  1.0,  1.0,    1.0,  1.0, -1.0,
];

#[rustfmt::skip]
const UNIT_CUBE_INDICES: [u16; 36] = [
     0,  2,  3,    2,  0,  1, // back
     4,  5,  6,    6,  7,  4, // front
    10, 11,  8,    8,  9, 10, // left
    14, 12, 13,   12, 14, 15, // right
    16, 17, 18,   18, 19, 16, // bottom
    20, 22, 23,   22, 20, 21, // top
];

#[rustfmt::skip]
const UNIT_QUAD_VERTICES: [f32; 20] = [
    -1.0,  1.0,  0.0,   0.0, 1.0,
    -1.0, -1.0,  0.0,   0.0, 0.0,
     1.0,  1.0,  0.0,   1.0, 1.0,
     1.0, -1.0,  0.0,   1.0, 0.0,
];

/// The `[-1, 1]^3` cube as an indexed triangle list, position only.
pub fn unit_cube() -> MeshData {
    MeshData {
        vertices: UNIT_CUBE_VERTICES.to_vec(),
        layout: vec![VertexAttribute::new(
            AttributeUsage::Position,
            DataType::Float3,
        )],
        indices: Some(UNIT_CUBE_INDICES.to_vec()),
        primitive: Primitive::TriangleList,
    }
}

/// A screen-covering quad drawn as a four vertex triangle strip.
pub fn unit_quad() -> MeshData {
    MeshData {
        vertices: UNIT_QUAD_VERTICES.to_vec(),
        layout: vec![
            VertexAttribute::new(AttributeUsage::Position, DataType::Float3),
            VertexAttribute::new(AttributeUsage::TexCoord, DataType::Float2),
        ],
        indices: None,
        primitive: Primitive::TriangleStrip,
    }
}
