#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{Context, Error, TextureFormat};

/// Renderbuffer whose storage is re-specified when its layout changes.
#[derive(Debug)]
pub struct Renderbuffer<C: Context> {
    gl: C,

    handle: Option<C::Renderbuffer>,
    layout: Option<(u32, usize, usize)>,
}

impl<C: Context> Renderbuffer<C> {
    pub fn new(gl: C) -> Self {
        Self {
            gl,
            handle: None,
            layout: None,
        }
    }

    pub fn handle(&self) -> Option<&C::Renderbuffer> {
        self.handle.as_ref()
    }

    pub fn cols(&self) -> usize {
        self.layout.map(|(_, cols, _)| cols).unwrap_or(0)
    }

    pub fn rows(&self) -> usize {
        self.layout.map(|(_, _, rows)| rows).unwrap_or(0)
    }

    pub fn format(&self) -> Option<u32> {
        self.layout.map(|(format, _, _)| format)
    }

    /// Allocates `cols` x `rows` storage in format `F`.
    ///
    /// Returns whether the storage was re-specified.
    pub fn storage<F: TextureFormat>(&mut self, cols: usize, rows: usize) -> Result<bool, Error> {
        assert!(cols > 0 && rows > 0, "invalid renderbuffer layout requested");

        if self.handle.is_none() {
            self.handle = self.gl.create_renderbuffer();
            self.layout = None;

            if self.handle.is_none() {
                return Err(Error::Allocation {
                    resource: "renderbuffer",
                });
            }
        }

        let layout = (F::GL_INTERNAL_FORMAT, cols, rows);

        if self.layout == Some(layout) {
            return Ok(false);
        }

        self.gl.bind_renderbuffer(self.handle.as_ref());
        self.gl
            .renderbuffer_storage(F::GL_INTERNAL_FORMAT, cols as i32, rows as i32);
        self.gl.bind_renderbuffer(None);

        debug!("renderbuffer storage {:#06x} {}x{}", layout.0, cols, rows);

        self.layout = Some(layout);

        Ok(true)
    }

    pub fn reset(&mut self) {
        if let Some(renderbuffer_handle) = &self.handle {
            self.gl.delete_renderbuffer(Some(renderbuffer_handle));
        }

        self.handle = None;
        self.layout = None;
    }
}

impl<C: Context> Drop for Renderbuffer<C> {
    fn drop(&mut self) {
        if let Some(renderbuffer_handle) = &self.handle {
            self.gl.delete_renderbuffer(Some(renderbuffer_handle));
        }
    }
}
