#[allow(unused_imports)]
use log::{debug, error, info, warn};

use crate::{shader::ShaderInfo, Context, Error, TextureKind, VertexArray};
use cgmath::Matrix4;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use web_sys::WebGl2RenderingContext as GL;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingPoint {
    TextureUnit(u32),
}

#[derive(Debug)]
enum ShaderState<C: Context> {
    Idle,
    Linking {
        program: C::Program,
        vert: C::Shader,
        frag: C::Shader,
        vert_source: String,
        frag_source: String,
    },
    Ready(C::Program),
    Failed {
        shader: &'static str,
        log: String,
    },
}

/// A vertex/fragment program built asynchronously from build-time sources.
#[derive(Debug)]
pub struct Shader<C: Context> {
    gl: C,
    invalidated: bool,
    state: ShaderState<C>,
    vertex: &'static ShaderInfo,
    fragment: &'static ShaderInfo,

    binds: BTreeMap<&'static str, BindingPoint>,
    defines: BTreeMap<&'static str, String>,
}

fn merge_sort_dedup(lhs: &[&'static str], rhs: &[&'static str]) -> Vec<&'static str> {
    let mut vec = Vec::with_capacity(lhs.len() + rhs.len());

    vec.extend_from_slice(lhs);
    vec.extend_from_slice(rhs);
    vec.sort_unstable();
    vec.dedup();
    vec
}

impl<C: Context> Shader<C> {
    pub fn new(gl: C, vertex: &'static ShaderInfo, fragment: &'static ShaderInfo) -> Self {
        let mut defines = BTreeMap::new();

        for key in merge_sort_dedup(vertex.defines, fragment.defines) {
            defines.insert(key, String::new());
        }

        let mut binds = BTreeMap::new();

        let texture_units = merge_sort_dedup(vertex.texture_units, fragment.texture_units);

        for (index, &key) in texture_units.iter().enumerate() {
            binds.insert(key, BindingPoint::TextureUnit(index as u32));
        }

        Self {
            gl,
            invalidated: true,
            state: ShaderState::Idle,
            vertex,
            fragment,
            binds,
            defines,
        }
    }

    /// Name of the fragment stage, used to identify the program in logs.
    pub fn name(&self) -> &'static str {
        self.fragment.name
    }

    pub fn set_define(&mut self, define: &'static str, value: impl ToString) {
        assert!(self.defines.contains_key(define), "undeclared define");

        let value = value.to_string();

        if self.defines.get(define) != Some(&value) {
            self.defines.insert(define, value);
            self.invalidated = true;
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ShaderState::Ready(_))
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, ShaderState::Failed { .. })
    }

    pub fn begin_draw(&self) -> DrawCommand<C> {
        DrawCommand::new(self)
    }

    /// Deletes the program; the next poll rebuilds it.
    pub fn reset(&mut self) {
        self.release();
        self.invalidated = true;
    }

    /// Starts compiling and linking the program with the current defines.
    ///
    /// Completion is observed through [`Shader::poll`].
    pub fn rebuild(&mut self) -> Result<(), Error> {
        if !self.invalidated {
            return Ok(());
        }

        self.release();
        self.invalidated = false;

        for (name, value) in &self.defines {
            if value.is_empty() {
                warn!("define `{}' of `{}' has no value", name, self.name());
            }
        }

        let vert_source = Self::generate_source(self.vertex.code, &self.defines);
        let frag_source = Self::generate_source(self.fragment.code, &self.defines);

        let vert = self.compile_shader(GL::VERTEX_SHADER, &vert_source)?;

        let frag = match self.compile_shader(GL::FRAGMENT_SHADER, &frag_source) {
            Ok(frag) => frag,
            Err(error) => {
                self.gl.delete_shader(Some(&vert));
                return Err(error);
            }
        };

        let program = match self.gl.create_program() {
            Some(program) => program,
            None => {
                self.gl.delete_shader(Some(&vert));
                self.gl.delete_shader(Some(&frag));

                return Err(Error::Allocation {
                    resource: "shader program",
                });
            }
        };

        self.gl.attach_shader(&program, &vert);
        self.gl.attach_shader(&program, &frag);
        self.gl.link_program(&program);

        debug!("linking shader program `{}'", self.name());

        self.state = ShaderState::Linking {
            program,
            vert,
            frag,
            vert_source,
            frag_source,
        };

        Ok(())
    }

    /// Advances the build without blocking.
    ///
    /// Returns `Ok(true)` once the program is ready. A build failure is
    /// logged once and then reported on every subsequent poll.
    pub fn poll(&mut self) -> Result<bool, Error> {
        if self.invalidated && !self.has_failed() {
            self.rebuild()?;
        }

        if let ShaderState::Linking { program, .. } = &self.state {
            if self.gl.is_context_lost() || !self.gl.program_completion_status(program) {
                return Ok(false);
            }
        }

        match std::mem::replace(&mut self.state, ShaderState::Idle) {
            ShaderState::Idle => Ok(false),
            ShaderState::Linking {
                program,
                vert,
                frag,
                vert_source,
                frag_source,
            } => {
                let linked = self.gl.program_link_status(&program);

                if linked {
                    self.gl.delete_shader(Some(&vert));
                    self.gl.delete_shader(Some(&frag));

                    self.state = ShaderState::Ready(program);
                    self.configure_binds();

                    info!("shader program `{}' ready", self.name());

                    return Ok(true);
                }

                let (shader, log) = if let Some(log) = self.get_shader_build_error(&vert) {
                    (self.vertex.name, Self::remap_error_lines(&log, &vert_source))
                } else if let Some(log) = self.get_shader_build_error(&frag) {
                    (self.fragment.name, Self::remap_error_lines(&log, &frag_source))
                } else {
                    let log = self
                        .gl
                        .program_info_log(&program)
                        .filter(|log| !log.is_empty())
                        .unwrap_or_else(|| String::from("unknown program linking error"));

                    (self.fragment.name, log)
                };

                self.gl.delete_shader(Some(&vert));
                self.gl.delete_shader(Some(&frag));
                self.gl.delete_program(Some(&program));

                error!("{}", log);

                self.state = ShaderState::Failed {
                    shader,
                    log: log.clone(),
                };

                Err(Error::ShaderBuild { shader, log })
            }
            ShaderState::Ready(program) => {
                self.state = ShaderState::Ready(program);
                Ok(true)
            }
            ShaderState::Failed { shader, log } => {
                self.state = ShaderState::Failed {
                    shader,
                    log: log.clone(),
                };

                Err(Error::ShaderBuild { shader, log })
            }
        }
    }

    fn program(&self) -> Option<&C::Program> {
        match &self.state {
            ShaderState::Ready(program) => Some(program),
            _ => None,
        }
    }

    fn release(&mut self) {
        match std::mem::replace(&mut self.state, ShaderState::Idle) {
            ShaderState::Linking {
                program,
                vert,
                frag,
                ..
            } => {
                self.gl.delete_shader(Some(&vert));
                self.gl.delete_shader(Some(&frag));
                self.gl.delete_program(Some(&program));
            }
            ShaderState::Ready(program) => {
                self.gl.delete_program(Some(&program));
            }
            ShaderState::Idle | ShaderState::Failed { .. } => {}
        }
    }

    fn configure_binds(&self) {
        if let Some(program) = self.program() {
            self.gl.use_program(Some(program));

            for (&name, &binding_point) in &self.binds {
                match binding_point {
                    BindingPoint::TextureUnit(slot) => {
                        let location = self.gl.get_uniform_location(program, name);

                        if let Some(location) = location {
                            self.gl.uniform1i(&location, slot as i32);
                        } else {
                            warn!("no such shader binding point: {}", name);
                        }
                    }
                }
            }

            self.gl.use_program(None);
        }
    }

    fn compile_shader(&self, kind: u32, source: &str) -> Result<C::Shader, Error> {
        let shader = self.gl.create_shader(kind).ok_or(Error::Allocation {
            resource: "shader object",
        })?;

        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        Ok(shader)
    }

    fn get_shader_build_error(&self, shader: &C::Shader) -> Option<String> {
        if self.gl.shader_compile_status(shader) {
            return None;
        }

        match self.gl.shader_info_log(shader) {
            Some(error) if !error.is_empty() => Some(error),
            _ => Some(String::from("unknown shader building error")),
        }
    }

    fn remap_error_lines(error: &str, glsl_source: &str) -> String {
        let pattern = Regex::new(r#"0:([0-9]+):"#).unwrap();

        let remapped = pattern.replace_all(error, |caps: &Captures| {
            let line: u32 = caps[1].parse().unwrap_or(0);

            let (file, line) = Self::determine_real_position(glsl_source, line);

            format!("{}:{}:", file, line)
        });

        remapped.into_owned()
    }

    fn generate_source(glsl_source: &str, defines: &BTreeMap<&'static str, String>) -> String {
        let mut source = String::from("#version 300 es\nprecision highp float;\n");
        source.reserve(glsl_source.len());

        for (name, value) in defines {
            source += "#define ";
            source += name;
            source += " (";
            source += value;
            source += ")\n";
        }

        source += glsl_source;

        if !source.ends_with('\n') {
            source += "\n";
        }

        source
    }

    /// Finds the position of a GLSL source line through file/line markers.
    fn determine_real_position(source: &str, line: u32) -> (String, u32) {
        let pattern = Regex::new(r#"^// __POS__ ([^:]+):([0-9]+)$"#).unwrap();

        let lines: Vec<&str> = source.lines().collect();
        let line = line.min(lines.len() as u32);

        for index in (0..line).rev() {
            if let Some(captures) = pattern.captures(lines[index as usize]) {
                let marker: u32 = captures[2].parse().unwrap_or(1);

                return (
                    captures[1].to_owned(),
                    (marker + line).saturating_sub(index + 2),
                );
            }
        }

        (String::from("<unknown>"), 0)
    }
}

impl<C: Context> Drop for Shader<C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug)]
pub enum BindTarget<'a, C: Context> {
    Texture(Option<&'a C::Texture>, TextureKind),
}

pub trait AsBindTarget<C: Context> {
    fn bind_target(&self) -> BindTarget<C>;
}

#[derive(Debug)]
pub struct DrawCommand<'a, C: Context> {
    shader: &'a Shader<C>,
}

impl<'a, C: Context> DrawCommand<'a, C> {
    fn new(shader: &'a Shader<C>) -> Self {
        shader.gl.use_program(shader.program());

        shader.gl.disable(GL::BLEND);
        shader.gl.disable(GL::CULL_FACE);
        shader.gl.disable(GL::DEPTH_TEST);
        shader.gl.disable(GL::SCISSOR_TEST);
        shader.gl.disable(GL::STENCIL_TEST);

        Self { shader }
    }

    pub fn bind(&self, target: &dyn AsBindTarget<C>, slot: &str) {
        match target.bind_target() {
            BindTarget::Texture(handle, kind) => self.bind_texture(handle, slot, kind),
        }
    }

    pub fn set_viewport(&self, x: i32, y: i32, w: i32, h: i32) {
        self.shader.gl.viewport(x, y, w, h);
    }

    pub fn set_depth_test(&self, enabled: bool) {
        if enabled {
            self.shader.gl.enable(GL::DEPTH_TEST);
            self.shader.gl.depth_func(GL::LEQUAL);
        } else {
            self.shader.gl.disable(GL::DEPTH_TEST);
        }
    }

    pub fn set_vertex_array(&self, target: &VertexArray<C>) {
        self.shader.gl.bind_vertex_array(target.handle());
    }

    pub fn unset_vertex_array(&self) {
        self.shader.gl.bind_vertex_array(None);
    }

    /// Clears color and depth of the bound framebuffer.
    pub fn clear(&self, color: [f32; 4]) {
        self.shader
            .gl
            .clear_color(color[0], color[1], color[2], color[3]);
        self.shader.gl.clear_depth(1.0);
        self.shader
            .gl
            .clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
    }

    pub fn draw(&self, vertex_array: &VertexArray<C>) {
        let mode = vertex_array.primitive().gl_mode();
        let count = vertex_array.element_count() as i32;

        if vertex_array.is_indexed() {
            self.shader
                .gl
                .draw_elements(mode, count, GL::UNSIGNED_SHORT, 0);
        } else {
            self.shader.gl.draw_arrays(mode, 0, count);
        }
    }

    pub fn set_uniform_mat4(&self, name: &str, value: &Matrix4<f32>) {
        if let Some(location) = self.uniform_location(name) {
            self.shader.gl.uniform_matrix4fv(&location, value.as_ref());
        }
    }

    pub fn set_uniform_f32(&self, name: &str, value: f32) {
        if let Some(location) = self.uniform_location(name) {
            self.shader.gl.uniform1f(&location, value);
        }
    }

    pub fn set_uniform_vec3(&self, name: &str, value: [f32; 3]) {
        if let Some(location) = self.uniform_location(name) {
            self.shader
                .gl
                .uniform3f(&location, value[0], value[1], value[2]);
        }
    }

    fn uniform_location(&self, name: &str) -> Option<C::UniformLocation> {
        let program = self.shader.program()?;
        self.shader.gl.get_uniform_location(program, name)
    }

    fn bind_texture(&self, handle: Option<&C::Texture>, slot: &str, kind: TextureKind) {
        if let Some(&BindingPoint::TextureUnit(slot)) = self.shader.binds.get(slot) {
            self.shader.gl.active_texture(GL::TEXTURE0 + slot);
            self.shader.gl.bind_texture(kind.target(), handle);
        } else {
            panic!("slot '{}' does not map to a binding point", slot);
        }
    }
}
