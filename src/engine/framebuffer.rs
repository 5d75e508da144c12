#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{Color, Context, CubeFace, Error, Renderbuffer, Texture, TextureFormat};
use web_sys::WebGl2RenderingContext as GL;

#[derive(Debug)]
pub struct Framebuffer<C: Context> {
    gl: C,
    handle: Option<C::Framebuffer>,
    cols: usize,
    rows: usize,
}

impl<C: Context> Framebuffer<C> {
    pub fn new(gl: C) -> Self {
        Self {
            gl,
            handle: None,
            cols: 0,
            rows: 0,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Binds the framebuffer for drawing, creating it on first use.
    pub fn bind(&mut self) -> Result<(), Error> {
        if self.handle.is_none() {
            self.handle = self.gl.create_framebuffer();

            if self.handle.is_none() {
                return Err(Error::Allocation {
                    resource: "framebuffer",
                });
            }
        }

        self.gl
            .bind_framebuffer(GL::DRAW_FRAMEBUFFER, self.handle.as_ref());

        Ok(())
    }

    pub fn unbind(&self) {
        self.gl.bind_framebuffer(GL::DRAW_FRAMEBUFFER, None);
    }

    pub fn attach_renderbuffers(
        &mut self,
        color: &Renderbuffer<C>,
        depth: &Renderbuffer<C>,
    ) -> Result<(), Error> {
        if (color.cols(), color.rows()) != (depth.cols(), depth.rows()) {
            panic!("inconsistent framebuffer attachment dimensions");
        }

        self.bind()?;

        self.gl
            .framebuffer_renderbuffer(GL::COLOR_ATTACHMENT0, color.handle());
        self.gl
            .framebuffer_renderbuffer(GL::DEPTH_ATTACHMENT, depth.handle());

        self.cols = color.cols();
        self.rows = color.rows();

        Ok(())
    }

    /// Attaches one face of a cubemap at a given mip level as the color target.
    pub fn attach_cube_face<F>(
        &mut self,
        texture: &Texture<C, F>,
        face: CubeFace,
        level: usize,
    ) -> Result<(), Error>
    where
        F: TextureFormat<Renderable = Color>,
    {
        assert!(level < texture.levels(), "mip level out of range");

        self.bind()?;

        self.gl.framebuffer_texture_2d(
            GL::COLOR_ATTACHMENT0,
            face.target(),
            texture.handle(),
            level as i32,
        );

        self.cols = (texture.cols() >> level).max(1);
        self.rows = (texture.rows() >> level).max(1);

        Ok(())
    }

    pub fn attach_texture<F>(&mut self, texture: &Texture<C, F>) -> Result<(), Error>
    where
        F: TextureFormat<Renderable = Color>,
    {
        self.bind()?;

        self.gl.framebuffer_texture_2d(
            GL::COLOR_ATTACHMENT0,
            GL::TEXTURE_2D,
            texture.handle(),
            0,
        );

        self.cols = texture.cols();
        self.rows = texture.rows();

        Ok(())
    }

    /// Verifies that the currently bound attachments form a complete framebuffer.
    pub fn check_status(&mut self) -> Result<(), Error> {
        self.bind()?;

        if self.gl.is_context_lost() {
            return Ok(());
        }

        match self.gl.check_framebuffer_status() {
            GL::FRAMEBUFFER_COMPLETE => Ok(()),
            status => Err(Error::IncompleteFramebuffer { status }),
        }
    }

    pub fn reset(&mut self) {
        if let Some(framebuffer_handle) = &self.handle {
            self.gl.delete_framebuffer(Some(framebuffer_handle));
        }

        self.handle = None;
        self.cols = 0;
        self.rows = 0;
    }
}

impl<C: Context> Drop for Framebuffer<C> {
    fn drop(&mut self) {
        if let Some(framebuffer_handle) = &self.handle {
            self.gl.delete_framebuffer(Some(framebuffer_handle));
        }
    }
}
