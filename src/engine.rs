export![context, framebuffer, renderbuffer, shader, texture, vertex_array];

pub mod mesh;

#[cfg(test)]
pub(crate) mod mock;
