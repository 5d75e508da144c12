#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{Context, Error};
use web_sys::WebGl2RenderingContext as GL;
use zerocopy::AsBytes;

/// Element type tag of a vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Float,
    Float2,
    Float3,
    Float4,
    Float2x2,
    Float3x3,
    Float4x4,
    Int,
    UInt,
}

impl DataType {
    /// Component count for types usable as float vertex attributes.
    pub fn components(self) -> Option<usize> {
        match self {
            Self::Float => Some(1),
            Self::Float2 => Some(2),
            Self::Float3 => Some(3),
            Self::Float4 => Some(4),
            _ => None,
        }
    }
}

/// Semantic of a vertex attribute, which also fixes its shader location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeUsage {
    Position = 0,
    Normal = 1,
    TexCoord = 2,
    Color = 3,
}

impl AttributeUsage {
    pub fn location(self) -> u32 {
        self as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub usage: AttributeUsage,
    pub kind: DataType,
}

impl VertexAttribute {
    pub fn new(usage: AttributeUsage, kind: DataType) -> Self {
        Self { usage, kind }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    TriangleList,
    TriangleStrip,
}

impl Primitive {
    pub fn gl_mode(self) -> u32 {
        match self {
            Self::TriangleList => GL::TRIANGLES,
            Self::TriangleStrip => GL::TRIANGLE_STRIP,
        }
    }
}

/// Interleaved vertex data with an optional 16-bit index list.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub layout: Vec<VertexAttribute>,
    pub indices: Option<Vec<u16>>,
    pub primitive: Primitive,
}

impl MeshData {
    /// Number of floats per vertex, or the first attribute that is invalid.
    pub fn vertex_size(&self) -> Result<usize, Error> {
        let mut size = 0;

        for (index, attribute) in self.layout.iter().enumerate() {
            size += attribute
                .kind
                .components()
                .ok_or(Error::InvalidVertexLayout {
                    index,
                    usage: attribute.usage,
                    kind: attribute.kind,
                })?;
        }

        Ok(size)
    }

    pub fn vertex_count(&self) -> usize {
        match self.vertex_size() {
            Ok(size) if size > 0 => self.vertices.len() / size,
            _ => 0,
        }
    }
}

#[derive(Debug)]
pub struct VertexArray<C: Context> {
    gl: C,
    handle: Option<C::VertexArray>,
    vertex_buffer: Option<C::Buffer>,
    index_buffer: Option<C::Buffer>,
    primitive: Primitive,
    element_count: usize,
}

impl<C: Context> VertexArray<C> {
    pub fn new(gl: C) -> Self {
        Self {
            gl,
            handle: None,
            vertex_buffer: None,
            index_buffer: None,
            primitive: Primitive::TriangleList,
            element_count: 0,
        }
    }

    pub fn handle(&self) -> Option<&C::VertexArray> {
        self.handle.as_ref()
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Number of indices for indexed meshes, of vertices otherwise.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn upload(&mut self, mesh: &MeshData) -> Result<(), Error> {
        let vertex_size = mesh.vertex_size()?;

        assert!(vertex_size > 0, "mesh has an empty vertex layout");
        assert_eq!(mesh.vertices.len() % vertex_size, 0);

        self.reset();

        self.handle = self.gl.create_vertex_array();
        self.vertex_buffer = self.gl.create_buffer();

        if self.handle.is_none() || self.vertex_buffer.is_none() {
            return Err(Error::Allocation {
                resource: "vertex array",
            });
        }

        self.gl.bind_vertex_array(self.handle.as_ref());

        self.gl
            .bind_buffer(GL::ARRAY_BUFFER, self.vertex_buffer.as_ref());
        self.gl
            .buffer_data(GL::ARRAY_BUFFER, mesh.vertices.as_slice().as_bytes());

        let stride = (vertex_size * std::mem::size_of::<f32>()) as i32;
        let mut offset = 0;

        for attribute in &mesh.layout {
            let components = attribute.kind.components().unwrap_or(0);

            self.gl.enable_vertex_attrib_array(attribute.usage.location());
            self.gl.vertex_attrib_pointer(
                attribute.usage.location(),
                components as i32,
                stride,
                offset as i32,
            );

            offset += components * std::mem::size_of::<f32>();
        }

        if let Some(indices) = &mesh.indices {
            self.index_buffer = self.gl.create_buffer();

            if self.index_buffer.is_none() {
                self.gl.bind_vertex_array(None);

                return Err(Error::Allocation {
                    resource: "index buffer",
                });
            }

            self.gl
                .bind_buffer(GL::ELEMENT_ARRAY_BUFFER, self.index_buffer.as_ref());
            self.gl
                .buffer_data(GL::ELEMENT_ARRAY_BUFFER, indices.as_slice().as_bytes());

            self.element_count = indices.len();
        } else {
            self.element_count = mesh.vertices.len() / vertex_size;
        }

        self.gl.bind_vertex_array(None);
        self.gl.bind_buffer(GL::ARRAY_BUFFER, None);

        self.primitive = mesh.primitive;

        Ok(())
    }

    pub fn reset(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gl.delete_vertex_array(Some(&handle));
        }

        if let Some(buffer) = self.vertex_buffer.take() {
            self.gl.delete_buffer(Some(&buffer));
        }

        if let Some(buffer) = self.index_buffer.take() {
            self.gl.delete_buffer(Some(&buffer));
        }

        self.element_count = 0;
    }
}

impl<C: Context> Drop for VertexArray<C> {
    fn drop(&mut self) {
        self.reset();
    }
}
