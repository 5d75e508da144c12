#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{Color, Context, Error, Framebuffer, Renderbuffer, TextureFormat, D24};

/// Reusable render destination: one framebuffer with color and depth
/// renderbuffers, resized for every pass.
#[derive(Debug)]
pub struct CaptureTarget<C: Context> {
    pub framebuffer: Framebuffer<C>,
    color: Renderbuffer<C>,
    depth: Renderbuffer<C>,
}

impl<C: Context> CaptureTarget<C> {
    pub fn new(gl: C) -> Self {
        Self {
            framebuffer: Framebuffer::new(gl.clone()),
            color: Renderbuffer::new(gl.clone()),
            depth: Renderbuffer::new(gl),
        }
    }

    pub fn cols(&self) -> usize {
        self.color.cols()
    }

    pub fn rows(&self) -> usize {
        self.color.rows()
    }

    /// Re-specifies renderbuffer storage as `size` x `size` pixels of `F`.
    ///
    /// The renderbuffers are reattached and left bound for drawing.
    pub fn resize<F>(&mut self, size: usize) -> Result<(), Error>
    where
        F: TextureFormat<Renderable = Color>,
    {
        let color_changed = self.color.storage::<F>(size, size)?;
        let depth_changed = self.depth.storage::<D24>(size, size)?;

        if color_changed || depth_changed {
            debug!("capture target resized to {}x{}", size, size);
        }

        self.framebuffer
            .attach_renderbuffers(&self.color, &self.depth)
    }

    /// Deletes the framebuffer and both renderbuffers.
    pub fn release(&mut self) {
        self.framebuffer.reset();
        self.color.reset();
        self.depth.reset();
    }
}
