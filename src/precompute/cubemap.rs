#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::{
    CaptureTarget, Color, Context, CubeFace, DrawCommand, Error, FaceViews, Texture,
    TextureFormat, VertexArray,
};

/// Name of the view-projection uniform shared by all cubemap passes.
pub const VIEW_PROJECTION_UNIFORM: &str = "u_viewProjMatrix";

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Renders the unit cube into all six faces of `cubemap` at mip `level`.
///
/// The program behind `command` must already have its other uniforms and
/// samplers set, and the capture target must already match the face size.
pub fn render_cube_faces<C, F>(
    command: &DrawCommand<C>,
    target: &mut CaptureTarget<C>,
    cubemap: &Texture<C, F>,
    level: usize,
    views: &FaceViews,
    cube: &VertexArray<C>,
) -> Result<(), Error>
where
    C: Context,
    F: TextureFormat<Renderable = Color>,
{
    command.set_vertex_array(cube);

    for (face, view_projection) in views.iter() {
        command.set_uniform_mat4(VIEW_PROJECTION_UNIFORM, view_projection);

        target.framebuffer.attach_cube_face(cubemap, face, level)?;

        if face == CubeFace::PositiveX {
            target.framebuffer.check_status()?;
        }

        let (cols, rows) = (target.framebuffer.cols(), target.framebuffer.rows());
        command.set_viewport(0, 0, cols as i32, rows as i32);

        command.clear(CLEAR_COLOR);
        command.draw(cube);
    }

    command.unset_vertex_array();

    debug!(
        "rendered cubemap faces at level {} ({}x{})",
        level,
        target.framebuffer.cols(),
        target.framebuffer.rows()
    );

    Ok(())
}
