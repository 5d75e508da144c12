#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{AsBindTarget, BindTarget, Context, Error, PixelData};
use std::marker::PhantomData;
use web_sys::WebGl2RenderingContext as GL;

pub trait RenderTarget {}

#[derive(Debug)]
pub struct Color;
#[derive(Debug)]
pub struct Depth;

impl RenderTarget for Color {}
impl RenderTarget for Depth {}

/// Whether a texture is a single 2D image or a six-face cubemap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    Texture2D,
    CubeMap,
}

impl TextureKind {
    pub fn target(self) -> u32 {
        match self {
            Self::Texture2D => GL::TEXTURE_2D,
            Self::CubeMap => GL::TEXTURE_CUBE_MAP,
        }
    }
}

/// Returns the length of a complete mip chain for a square texture.
pub fn mip_levels_for(size: usize) -> usize {
    8 * std::mem::size_of::<usize>() - size.leading_zeros() as usize
}

#[derive(Debug)]
pub struct Texture<C: Context, T> {
    gl: C,

    handle: Option<C::Texture>,
    kind: TextureKind,
    layout: (usize, usize, usize),
    format: PhantomData<T>,
}

impl<C: Context, T> Texture<C, T> {
    pub fn new(gl: C) -> Self {
        Self {
            gl,
            handle: None,
            kind: TextureKind::Texture2D,
            layout: (0, 0, 0),
            format: PhantomData,
        }
    }

    pub fn handle(&self) -> Option<&C::Texture> {
        self.handle.as_ref()
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn cols(&self) -> usize {
        self.layout.0
    }

    pub fn rows(&self) -> usize {
        self.layout.1
    }

    pub fn levels(&self) -> usize {
        self.layout.2
    }

    pub fn reset(&mut self) {
        if let Some(texture_handle) = self.handle.take() {
            self.gl.delete_texture(Some(&texture_handle));
        }

        self.layout = (0, 0, 0);
    }

    fn create_texture(
        &mut self,
        kind: TextureKind,
        cols: usize,
        rows: usize,
        levels: usize,
    ) -> Result<bool, Error> {
        assert!(cols > 0 && rows > 0, "invalid texture layout requested");
        assert!(levels > 0, "texture must have at least one level");

        if self.layout != (cols, rows, levels) || self.kind != kind || self.handle.is_none() {
            self.reset();

            self.handle = self.gl.create_texture();

            if self.handle.is_none() {
                return Err(Error::Allocation {
                    resource: match kind {
                        TextureKind::Texture2D => "2D texture",
                        TextureKind::CubeMap => "cubemap texture",
                    },
                });
            }

            self.kind = kind;
            self.layout = (cols, rows, levels);

            Ok(false)
        } else {
            Ok(true)
        }
    }
}

impl<C: Context, T: TextureFormat> Texture<C, T> {
    fn set_texture_parameters(&mut self) {
        let target = self.kind.target();

        let min_filter = if self.levels() > 1 {
            GL::LINEAR_MIPMAP_LINEAR
        } else {
            GL::LINEAR
        };

        self.gl
            .tex_parameteri(target, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
        self.gl
            .tex_parameteri(target, GL::TEXTURE_MIN_FILTER, min_filter as i32);

        self.gl
            .tex_parameteri(target, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
        self.gl
            .tex_parameteri(target, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);

        if self.kind == TextureKind::CubeMap {
            self.gl
                .tex_parameteri(target, GL::TEXTURE_WRAP_R, GL::CLAMP_TO_EDGE as i32);
        }
    }

    fn allocate_storage(&mut self) {
        let target = self.kind.target();

        self.gl.bind_texture(target, self.handle.as_ref());

        self.gl.tex_storage_2d(
            target,
            self.levels() as i32,
            T::GL_INTERNAL_FORMAT,
            self.cols() as i32,
            self.rows() as i32,
        );

        self.set_texture_parameters();

        self.gl.bind_texture(target, None);
    }

    /// Creates a single-level 2D texture.
    pub fn create(&mut self, cols: usize, rows: usize) -> Result<(), Error> {
        if self.create_texture(TextureKind::Texture2D, cols, rows, 1)? {
            return Ok(()); // texture already created
        }

        self.allocate_storage();

        Ok(())
    }

    /// Creates a square cubemap with `levels` mip levels reserved up front.
    pub fn create_cube(&mut self, size: usize, levels: usize) -> Result<(), Error> {
        assert!(levels <= mip_levels_for(size), "too many mip levels");

        if self.create_texture(TextureKind::CubeMap, size, size, levels)? {
            return Ok(()); // texture already created
        }

        self.allocate_storage();

        Ok(())
    }

    pub fn upload(&mut self, cols: usize, rows: usize, data: &[T::Data]) -> Result<(), Error> {
        assert_eq!(data.len(), cols * rows * T::CHANNELS);

        self.create(cols, rows)?;

        self.gl.bind_texture(GL::TEXTURE_2D, self.handle.as_ref());

        let result = self.gl.tex_sub_image_2d(
            GL::TEXTURE_2D,
            0,
            cols as i32,
            rows as i32,
            T::GL_FORMAT,
            T::GL_TYPE,
            T::pixel_data(data),
        );

        self.gl.bind_texture(GL::TEXTURE_2D, None);

        result
    }

    /// Fills every level below the base level from the base level contents.
    pub fn generate_mipmaps(&mut self) {
        let target = self.kind.target();

        self.gl.bind_texture(target, self.handle.as_ref());
        self.gl.generate_mipmap(target);
        self.gl.bind_texture(target, None);
    }
}

impl<C: Context, T: TextureFormat> AsBindTarget<C> for Texture<C, T> {
    fn bind_target(&self) -> BindTarget<C> {
        BindTarget::Texture(self.handle.as_ref(), self.kind)
    }
}

impl<C: Context, T> Drop for Texture<C, T> {
    fn drop(&mut self) {
        self.reset();
    }
}

pub trait TextureFormat {
    type Data;

    type Renderable: RenderTarget;

    const CHANNELS: usize;
    const GL_INTERNAL_FORMAT: u32;
    const GL_FORMAT: u32;
    const GL_TYPE: u32;

    fn pixel_data(_data: &[Self::Data]) -> PixelData {
        unimplemented!("texture data upload is not implemented for this texture format")
    }
}

#[derive(Debug)]
pub struct RGBA16F;
#[derive(Debug)]
pub struct RG16F;
#[derive(Debug)]
pub struct D24;

impl TextureFormat for RGBA16F {
    type Data = u16;

    type Renderable = Color;

    const CHANNELS: usize = 4;
    const GL_INTERNAL_FORMAT: u32 = GL::RGBA16F;
    const GL_FORMAT: u32 = GL::RGBA;
    const GL_TYPE: u32 = GL::HALF_FLOAT;

    fn pixel_data(data: &[u16]) -> PixelData {
        PixelData::Half(data)
    }
}

impl TextureFormat for RG16F {
    type Data = u16;

    type Renderable = Color;

    const CHANNELS: usize = 2;
    const GL_INTERNAL_FORMAT: u32 = GL::RG16F;
    const GL_FORMAT: u32 = GL::RG;
    const GL_TYPE: u32 = GL::HALF_FLOAT;

    fn pixel_data(data: &[u16]) -> PixelData {
        PixelData::Half(data)
    }
}

impl TextureFormat for D24 {
    type Data = u32;

    type Renderable = Depth;

    const CHANNELS: usize = 1;
    const GL_INTERNAL_FORMAT: u32 = GL::DEPTH_COMPONENT24;
    const GL_FORMAT: u32 = GL::DEPTH_COMPONENT;
    const GL_TYPE: u32 = GL::UNSIGNED_INT;
}
