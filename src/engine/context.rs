use crate::Error;
use js_sys::{Float32Array, Object, Uint16Array};
use std::fmt::Debug;
use web_sys::{
    WebGl2RenderingContext as GL, WebGlBuffer, WebGlFramebuffer, WebGlProgram, WebGlRenderbuffer,
    WebGlShader, WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

/// Program parameter exposed by `KHR_parallel_shader_compile`.
pub const COMPLETION_STATUS_KHR: u32 = 0x91B1;

/// Typed texel data for texture uploads.
///
/// WebGL2 requires the array view type to match the upload type, so half
/// floats and full floats are kept apart instead of passing raw bytes.
#[derive(Clone, Copy, Debug)]
pub enum PixelData<'a> {
    Half(&'a [u16]),
    Float(&'a [f32]),
}

impl PixelData<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Half(data) => data.len(),
            Self::Float(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The WebGL2 primitives the engine is built on.
///
/// All GL enums passed through this trait are the constants defined on
/// `web_sys::WebGl2RenderingContext`. Creation methods return `None` when
/// the underlying context cannot allocate the object (e.g. context loss).
pub trait Context: Clone + Debug {
    type Texture: Debug;
    type Renderbuffer: Debug;
    type Framebuffer: Debug;
    type Buffer: Debug;
    type VertexArray: Debug;
    type Shader: Debug;
    type Program: Debug;
    type UniformLocation: Debug;

    fn is_context_lost(&self) -> bool;
    fn has_extension(&self, name: &str) -> bool;

    fn create_texture(&self) -> Option<Self::Texture>;
    fn delete_texture(&self, texture: Option<&Self::Texture>);
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<&Self::Texture>);
    fn tex_storage_2d(&self, target: u32, levels: i32, format: u32, cols: i32, rows: i32);
    fn tex_parameteri(&self, target: u32, parameter: u32, value: i32);
    fn generate_mipmap(&self, target: u32);
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &self,
        target: u32,
        level: i32,
        cols: i32,
        rows: i32,
        format: u32,
        kind: u32,
        data: PixelData,
    ) -> Result<(), Error>;

    fn create_renderbuffer(&self) -> Option<Self::Renderbuffer>;
    fn delete_renderbuffer(&self, renderbuffer: Option<&Self::Renderbuffer>);
    fn bind_renderbuffer(&self, renderbuffer: Option<&Self::Renderbuffer>);
    fn renderbuffer_storage(&self, format: u32, cols: i32, rows: i32);

    fn create_framebuffer(&self) -> Option<Self::Framebuffer>;
    fn delete_framebuffer(&self, framebuffer: Option<&Self::Framebuffer>);
    fn bind_framebuffer(&self, target: u32, framebuffer: Option<&Self::Framebuffer>);
    fn framebuffer_texture_2d(
        &self,
        attachment: u32,
        target: u32,
        texture: Option<&Self::Texture>,
        level: i32,
    );
    fn framebuffer_renderbuffer(&self, attachment: u32, renderbuffer: Option<&Self::Renderbuffer>);
    fn check_framebuffer_status(&self) -> u32;

    fn create_buffer(&self) -> Option<Self::Buffer>;
    fn delete_buffer(&self, buffer: Option<&Self::Buffer>);
    fn bind_buffer(&self, target: u32, buffer: Option<&Self::Buffer>);
    fn buffer_data(&self, target: u32, data: &[u8]);

    fn create_vertex_array(&self) -> Option<Self::VertexArray>;
    fn delete_vertex_array(&self, vertex_array: Option<&Self::VertexArray>);
    fn bind_vertex_array(&self, vertex_array: Option<&Self::VertexArray>);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer(&self, index: u32, size: i32, stride: i32, offset: i32);

    fn create_shader(&self, kind: u32) -> Option<Self::Shader>;
    fn delete_shader(&self, shader: Option<&Self::Shader>);
    fn shader_source(&self, shader: &Self::Shader, source: &str);
    fn compile_shader(&self, shader: &Self::Shader);
    fn shader_compile_status(&self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> Option<String>;

    fn create_program(&self) -> Option<Self::Program>;
    fn delete_program(&self, program: Option<&Self::Program>);
    fn attach_shader(&self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&self, program: &Self::Program);
    /// Returns whether compilation and linking finished, without blocking.
    fn program_completion_status(&self, program: &Self::Program) -> bool;
    fn program_link_status(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> Option<String>;
    fn use_program(&self, program: Option<&Self::Program>);

    fn get_uniform_location(
        &self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn uniform1i(&self, location: &Self::UniformLocation, value: i32);
    fn uniform1f(&self, location: &Self::UniformLocation, value: f32);
    fn uniform3f(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32);
    fn uniform_matrix4fv(&self, location: &Self::UniformLocation, value: &[f32; 16]);

    fn viewport(&self, x: i32, y: i32, w: i32, h: i32);
    fn enable(&self, capability: u32);
    fn disable(&self, capability: u32);
    fn depth_func(&self, func: u32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&self, depth: f32);
    fn clear(&self, mask: u32);

    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
    fn draw_elements(&self, mode: u32, count: i32, kind: u32, offset: i32);
}

impl Context for GL {
    type Texture = WebGlTexture;
    type Renderbuffer = WebGlRenderbuffer;
    type Framebuffer = WebGlFramebuffer;
    type Buffer = WebGlBuffer;
    type VertexArray = WebGlVertexArrayObject;
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type UniformLocation = WebGlUniformLocation;

    fn is_context_lost(&self) -> bool {
        GL::is_context_lost(self)
    }

    fn has_extension(&self, name: &str) -> bool {
        matches!(self.get_extension(name), Ok(Some(_)))
    }

    fn create_texture(&self) -> Option<WebGlTexture> {
        GL::create_texture(self)
    }

    fn delete_texture(&self, texture: Option<&WebGlTexture>) {
        GL::delete_texture(self, texture)
    }

    fn active_texture(&self, unit: u32) {
        GL::active_texture(self, unit)
    }

    fn bind_texture(&self, target: u32, texture: Option<&WebGlTexture>) {
        GL::bind_texture(self, target, texture)
    }

    fn tex_storage_2d(&self, target: u32, levels: i32, format: u32, cols: i32, rows: i32) {
        GL::tex_storage_2d(self, target, levels, format, cols, rows)
    }

    fn tex_parameteri(&self, target: u32, parameter: u32, value: i32) {
        GL::tex_parameteri(self, target, parameter, value)
    }

    fn generate_mipmap(&self, target: u32) {
        GL::generate_mipmap(self, target)
    }

    fn tex_sub_image_2d(
        &self,
        target: u32,
        level: i32,
        cols: i32,
        rows: i32,
        format: u32,
        kind: u32,
        data: PixelData,
    ) -> Result<(), Error> {
        let view: Object = match data {
            PixelData::Half(data) => Uint16Array::from(data).into(),
            PixelData::Float(data) => Float32Array::from(data).into(),
        };

        self.tex_sub_image_2d_with_i32_and_i32_and_u32_and_type_and_opt_array_buffer_view(
            target,
            level,
            0,
            0,
            cols,
            rows,
            format,
            kind,
            Some(&view),
        )
        .map_err(|_| Error::Upload {
            resource: "texture",
        })
    }

    fn create_renderbuffer(&self) -> Option<WebGlRenderbuffer> {
        GL::create_renderbuffer(self)
    }

    fn delete_renderbuffer(&self, renderbuffer: Option<&WebGlRenderbuffer>) {
        GL::delete_renderbuffer(self, renderbuffer)
    }

    fn bind_renderbuffer(&self, renderbuffer: Option<&WebGlRenderbuffer>) {
        GL::bind_renderbuffer(self, GL::RENDERBUFFER, renderbuffer)
    }

    fn renderbuffer_storage(&self, format: u32, cols: i32, rows: i32) {
        GL::renderbuffer_storage(self, GL::RENDERBUFFER, format, cols, rows)
    }

    fn create_framebuffer(&self) -> Option<WebGlFramebuffer> {
        GL::create_framebuffer(self)
    }

    fn delete_framebuffer(&self, framebuffer: Option<&WebGlFramebuffer>) {
        GL::delete_framebuffer(self, framebuffer)
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<&WebGlFramebuffer>) {
        GL::bind_framebuffer(self, target, framebuffer)
    }

    fn framebuffer_texture_2d(
        &self,
        attachment: u32,
        target: u32,
        texture: Option<&WebGlTexture>,
        level: i32,
    ) {
        GL::framebuffer_texture_2d(
            self,
            GL::DRAW_FRAMEBUFFER,
            attachment,
            target,
            texture,
            level,
        )
    }

    fn framebuffer_renderbuffer(&self, attachment: u32, renderbuffer: Option<&WebGlRenderbuffer>) {
        GL::framebuffer_renderbuffer(
            self,
            GL::DRAW_FRAMEBUFFER,
            attachment,
            GL::RENDERBUFFER,
            renderbuffer,
        )
    }

    fn check_framebuffer_status(&self) -> u32 {
        GL::check_framebuffer_status(self, GL::DRAW_FRAMEBUFFER)
    }

    fn create_buffer(&self) -> Option<WebGlBuffer> {
        GL::create_buffer(self)
    }

    fn delete_buffer(&self, buffer: Option<&WebGlBuffer>) {
        GL::delete_buffer(self, buffer)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<&WebGlBuffer>) {
        GL::bind_buffer(self, target, buffer)
    }

    fn buffer_data(&self, target: u32, data: &[u8]) {
        self.buffer_data_with_u8_array(target, data, GL::STATIC_DRAW)
    }

    fn create_vertex_array(&self) -> Option<WebGlVertexArrayObject> {
        GL::create_vertex_array(self)
    }

    fn delete_vertex_array(&self, vertex_array: Option<&WebGlVertexArrayObject>) {
        GL::delete_vertex_array(self, vertex_array)
    }

    fn bind_vertex_array(&self, vertex_array: Option<&WebGlVertexArrayObject>) {
        GL::bind_vertex_array(self, vertex_array)
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        GL::enable_vertex_attrib_array(self, index)
    }

    fn vertex_attrib_pointer(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.vertex_attrib_pointer_with_i32(index, size, GL::FLOAT, false, stride, offset)
    }

    fn create_shader(&self, kind: u32) -> Option<WebGlShader> {
        GL::create_shader(self, kind)
    }

    fn delete_shader(&self, shader: Option<&WebGlShader>) {
        GL::delete_shader(self, shader)
    }

    fn shader_source(&self, shader: &WebGlShader, source: &str) {
        GL::shader_source(self, shader, source)
    }

    fn compile_shader(&self, shader: &WebGlShader) {
        GL::compile_shader(self, shader)
    }

    fn shader_compile_status(&self, shader: &WebGlShader) -> bool {
        self.get_shader_parameter(shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn shader_info_log(&self, shader: &WebGlShader) -> Option<String> {
        self.get_shader_info_log(shader)
    }

    fn create_program(&self) -> Option<WebGlProgram> {
        GL::create_program(self)
    }

    fn delete_program(&self, program: Option<&WebGlProgram>) {
        GL::delete_program(self, program)
    }

    fn attach_shader(&self, program: &WebGlProgram, shader: &WebGlShader) {
        GL::attach_shader(self, program, shader)
    }

    fn link_program(&self, program: &WebGlProgram) {
        GL::link_program(self, program)
    }

    fn program_completion_status(&self, program: &WebGlProgram) -> bool {
        if !self.has_extension("KHR_parallel_shader_compile") {
            return true; // querying the link status will block instead
        }

        self.get_program_parameter(program, COMPLETION_STATUS_KHR)
            .as_bool()
            .unwrap_or(true)
    }

    fn program_link_status(&self, program: &WebGlProgram) -> bool {
        self.get_program_parameter(program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
    }

    fn program_info_log(&self, program: &WebGlProgram) -> Option<String> {
        self.get_program_info_log(program)
    }

    fn use_program(&self, program: Option<&WebGlProgram>) {
        GL::use_program(self, program)
    }

    fn get_uniform_location(
        &self,
        program: &WebGlProgram,
        name: &str,
    ) -> Option<WebGlUniformLocation> {
        GL::get_uniform_location(self, program, name)
    }

    fn uniform1i(&self, location: &WebGlUniformLocation, value: i32) {
        GL::uniform1i(self, Some(location), value)
    }

    fn uniform1f(&self, location: &WebGlUniformLocation, value: f32) {
        GL::uniform1f(self, Some(location), value)
    }

    fn uniform3f(&self, location: &WebGlUniformLocation, x: f32, y: f32, z: f32) {
        GL::uniform3f(self, Some(location), x, y, z)
    }

    fn uniform_matrix4fv(&self, location: &WebGlUniformLocation, value: &[f32; 16]) {
        self.uniform_matrix4fv_with_f32_array(Some(location), false, value)
    }

    fn viewport(&self, x: i32, y: i32, w: i32, h: i32) {
        GL::viewport(self, x, y, w, h)
    }

    fn enable(&self, capability: u32) {
        GL::enable(self, capability)
    }

    fn disable(&self, capability: u32) {
        GL::disable(self, capability)
    }

    fn depth_func(&self, func: u32) {
        GL::depth_func(self, func)
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        GL::clear_color(self, r, g, b, a)
    }

    fn clear_depth(&self, depth: f32) {
        GL::clear_depth(self, depth)
    }

    fn clear(&self, mask: u32) {
        GL::clear(self, mask)
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        GL::draw_arrays(self, mode, first, count)
    }

    fn draw_elements(&self, mode: u32, count: i32, kind: u32, offset: i32) {
        self.draw_elements_with_i32(mode, count, kind, offset)
    }
}
