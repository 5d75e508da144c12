//! In-memory context recording the calls made by the engine.

use crate::{Context, Error, PixelData};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use web_sys::WebGl2RenderingContext as GL;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockHandle(u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockUniform {
    program: MockHandle,
    name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureStorage {
    pub target: u32,
    pub levels: i32,
    pub format: u32,
    pub cols: i32,
    pub rows: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub framebuffer: Option<MockHandle>,
    pub attachment: u32,
    pub target: u32,
    pub texture: Option<MockHandle>,
    pub level: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Mat4([f32; 16]),
}

#[derive(Clone, Debug, PartialEq)]
pub struct UniformWrite {
    pub program: MockHandle,
    pub name: String,
    pub value: UniformValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Draw {
    pub program: Option<MockHandle>,
    pub framebuffer: Option<MockHandle>,
    pub color: Option<Attachment>,
    pub viewport: (i32, i32, i32, i32),
    pub mode: u32,
    pub count: i32,
    pub indexed: bool,
}

/// Number of live objects of each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Live {
    pub textures: usize,
    pub renderbuffers: usize,
    pub framebuffers: usize,
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub shaders: usize,
    pub programs: usize,
}

#[derive(Debug)]
struct ProgramState {
    shaders: Vec<MockHandle>,
    polls: usize,
    linked: bool,
}

#[derive(Debug)]
struct MockState {
    next_id: u32,

    textures: HashMap<MockHandle, Option<TextureStorage>>,
    renderbuffers: HashSet<MockHandle>,
    framebuffers: HashMap<MockHandle, Option<Attachment>>,
    buffers: HashSet<MockHandle>,
    vertex_arrays: HashSet<MockHandle>,
    shaders: HashMap<MockHandle, String>,
    programs: HashMap<MockHandle, ProgramState>,

    bound_textures: HashMap<u32, MockHandle>,
    bound_framebuffer: Option<MockHandle>,
    bound_vertex_array: Option<MockHandle>,
    current_program: Option<MockHandle>,
    viewport: (i32, i32, i32, i32),

    fail_allocations: bool,
    fail_uploads: bool,
    framebuffer_status: u32,
    completion_delay: usize,
    held_patterns: Vec<String>,
    failing_patterns: Vec<String>,

    link_count: usize,
    renderbuffer_storage_log: Vec<(u32, i32, i32)>,
    attachment_log: Vec<Attachment>,
    attribute_log: Vec<(u32, i32, i32, i32)>,
    uniform_log: Vec<UniformWrite>,
    draw_log: Vec<Draw>,
    mipmap_log: Vec<MockHandle>,
    upload_log: Vec<(u32, i32, i32, usize)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            next_id: 1,
            textures: HashMap::new(),
            renderbuffers: HashSet::new(),
            framebuffers: HashMap::new(),
            buffers: HashSet::new(),
            vertex_arrays: HashSet::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            bound_textures: HashMap::new(),
            bound_framebuffer: None,
            bound_vertex_array: None,
            current_program: None,
            viewport: (0, 0, 0, 0),
            fail_allocations: false,
            fail_uploads: false,
            framebuffer_status: GL::FRAMEBUFFER_COMPLETE,
            completion_delay: 0,
            held_patterns: Vec::new(),
            failing_patterns: Vec::new(),
            link_count: 0,
            renderbuffer_storage_log: Vec::new(),
            attachment_log: Vec::new(),
            attribute_log: Vec::new(),
            uniform_log: Vec::new(),
            draw_log: Vec::new(),
            mipmap_log: Vec::new(),
            upload_log: Vec::new(),
        }
    }
}

impl MockState {
    fn allocate(&mut self) -> Option<MockHandle> {
        if self.fail_allocations {
            return None;
        }

        let handle = MockHandle(self.next_id);
        self.next_id += 1;
        Some(handle)
    }

    fn shader_failed(&self, shader: &MockHandle) -> bool {
        match self.shaders.get(shader) {
            Some(source) => self
                .failing_patterns
                .iter()
                .any(|pattern| source.contains(pattern.as_str())),
            None => true,
        }
    }

    fn program_held(&self, program: &ProgramState) -> bool {
        program.shaders.iter().any(|shader| {
            self.shaders.get(shader).map_or(false, |source| {
                self.held_patterns
                    .iter()
                    .any(|pattern| source.contains(pattern.as_str()))
            })
        })
    }

    fn record_uniform(&mut self, location: &MockUniform, value: UniformValue) {
        self.uniform_log.push(UniformWrite {
            program: location.program,
            name: location.name.clone(),
            value,
        });
    }

    fn record_draw(&mut self, mode: u32, count: i32, indexed: bool) {
        let color = self
            .bound_framebuffer
            .and_then(|framebuffer| self.framebuffers.get(&framebuffer).copied().flatten());

        self.draw_log.push(Draw {
            program: self.current_program,
            framebuffer: self.bound_framebuffer,
            color,
            viewport: self.viewport,
            mode,
            count,
            indexed,
        });
    }
}

/// Shared handle to the recorded state; clones observe the same context.
#[derive(Clone, Debug, Default)]
pub struct MockContext(Rc<RefCell<MockState>>);

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_allocations(&self, fail: bool) {
        self.0.borrow_mut().fail_allocations = fail;
    }

    /// Texture uploads are rejected, as for a lost context or a bad view.
    pub fn fail_uploads(&self, fail: bool) {
        self.0.borrow_mut().fail_uploads = fail;
    }

    pub fn set_framebuffer_status(&self, status: u32) {
        self.0.borrow_mut().framebuffer_status = status;
    }

    /// Programs report completion only after this many unsuccessful polls.
    pub fn set_completion_delay(&self, polls: usize) {
        self.0.borrow_mut().completion_delay = polls;
    }

    /// Programs built from a source containing `pattern` never complete.
    pub fn hold_programs_containing(&self, pattern: &str) {
        self.0.borrow_mut().held_patterns.push(pattern.to_owned());
    }

    pub fn release_held_programs(&self) {
        self.0.borrow_mut().held_patterns.clear();
    }

    /// Shaders whose source contains `pattern` fail to compile.
    pub fn fail_shaders_containing(&self, pattern: &str) {
        self.0.borrow_mut().failing_patterns.push(pattern.to_owned());
    }

    pub fn live(&self) -> Live {
        let state = self.0.borrow();

        Live {
            textures: state.textures.len(),
            renderbuffers: state.renderbuffers.len(),
            framebuffers: state.framebuffers.len(),
            buffers: state.buffers.len(),
            vertex_arrays: state.vertex_arrays.len(),
            shaders: state.shaders.len(),
            programs: state.programs.len(),
        }
    }

    pub fn is_live_texture(&self, texture: &MockHandle) -> bool {
        self.0.borrow().textures.contains_key(texture)
    }

    pub fn texture_storage(&self, texture: &MockHandle) -> Option<TextureStorage> {
        self.0.borrow().textures.get(texture).copied().flatten()
    }

    /// Whether any live shader object was given a source containing `pattern`.
    pub fn has_shader_source_containing(&self, pattern: &str) -> bool {
        self.0
            .borrow()
            .shaders
            .values()
            .any(|source| source.contains(pattern))
    }

    pub fn program_link_count(&self) -> usize {
        self.0.borrow().link_count
    }

    pub fn renderbuffer_storage_log(&self) -> Vec<(u32, i32, i32)> {
        self.0.borrow().renderbuffer_storage_log.clone()
    }

    pub fn attachment_log(&self) -> Vec<Attachment> {
        self.0.borrow().attachment_log.clone()
    }

    pub fn attribute_log(&self) -> Vec<(u32, i32, i32, i32)> {
        self.0.borrow().attribute_log.clone()
    }

    pub fn draw_log(&self) -> Vec<Draw> {
        self.0.borrow().draw_log.clone()
    }

    pub fn mipmap_log(&self) -> Vec<MockHandle> {
        self.0.borrow().mipmap_log.clone()
    }

    pub fn upload_log(&self) -> Vec<(u32, i32, i32, usize)> {
        self.0.borrow().upload_log.clone()
    }

    pub fn uniform_log(&self) -> Vec<UniformWrite> {
        self.0.borrow().uniform_log.clone()
    }

    /// Last integer written to a uniform of the given name.
    pub fn uniform_int(&self, name: &str) -> Option<i32> {
        self.0
            .borrow()
            .uniform_log
            .iter()
            .rev()
            .filter(|write| write.name == name)
            .find_map(|write| match write.value {
                UniformValue::Int(value) => Some(value),
                _ => None,
            })
    }

    /// Every float written to a uniform of the given name, in order.
    pub fn uniform_floats(&self, name: &str) -> Vec<f32> {
        self.0
            .borrow()
            .uniform_log
            .iter()
            .filter(|write| write.name == name)
            .filter_map(|write| match write.value {
                UniformValue::Float(value) => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn clear_logs(&self) {
        let mut state = self.0.borrow_mut();

        state.renderbuffer_storage_log.clear();
        state.attachment_log.clear();
        state.attribute_log.clear();
        state.uniform_log.clear();
        state.draw_log.clear();
        state.mipmap_log.clear();
        state.upload_log.clear();
    }
}

impl Context for MockContext {
    type Texture = MockHandle;
    type Renderbuffer = MockHandle;
    type Framebuffer = MockHandle;
    type Buffer = MockHandle;
    type VertexArray = MockHandle;
    type Shader = MockHandle;
    type Program = MockHandle;
    type UniformLocation = MockUniform;

    fn is_context_lost(&self) -> bool {
        false
    }

    fn has_extension(&self, _name: &str) -> bool {
        true
    }

    fn create_texture(&self) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;
        state.textures.insert(handle, None);
        Some(handle)
    }

    fn delete_texture(&self, texture: Option<&MockHandle>) {
        if let Some(texture) = texture {
            self.0.borrow_mut().textures.remove(texture);
        }
    }

    fn active_texture(&self, _unit: u32) {}

    fn bind_texture(&self, target: u32, texture: Option<&MockHandle>) {
        let mut state = self.0.borrow_mut();

        match texture {
            Some(&texture) => state.bound_textures.insert(target, texture),
            None => state.bound_textures.remove(&target),
        };
    }

    fn tex_storage_2d(&self, target: u32, levels: i32, format: u32, cols: i32, rows: i32) {
        let mut state = self.0.borrow_mut();

        if let Some(texture) = state.bound_textures.get(&target).copied() {
            if let Some(storage) = state.textures.get_mut(&texture) {
                *storage = Some(TextureStorage {
                    target,
                    levels,
                    format,
                    cols,
                    rows,
                });
            }
        }
    }

    fn tex_parameteri(&self, _target: u32, _parameter: u32, _value: i32) {}

    fn generate_mipmap(&self, target: u32) {
        let mut state = self.0.borrow_mut();

        if let Some(texture) = state.bound_textures.get(&target).copied() {
            state.mipmap_log.push(texture);
        }
    }

    fn tex_sub_image_2d(
        &self,
        target: u32,
        _level: i32,
        cols: i32,
        rows: i32,
        _format: u32,
        _kind: u32,
        data: PixelData,
    ) -> Result<(), Error> {
        let mut state = self.0.borrow_mut();

        if state.fail_uploads {
            return Err(Error::Upload {
                resource: "texture",
            });
        }

        state.upload_log.push((target, cols, rows, data.len()));

        Ok(())
    }

    fn create_renderbuffer(&self) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;
        state.renderbuffers.insert(handle);
        Some(handle)
    }

    fn delete_renderbuffer(&self, renderbuffer: Option<&MockHandle>) {
        if let Some(renderbuffer) = renderbuffer {
            self.0.borrow_mut().renderbuffers.remove(renderbuffer);
        }
    }

    fn bind_renderbuffer(&self, _renderbuffer: Option<&MockHandle>) {}

    fn renderbuffer_storage(&self, format: u32, cols: i32, rows: i32) {
        self.0
            .borrow_mut()
            .renderbuffer_storage_log
            .push((format, cols, rows));
    }

    fn create_framebuffer(&self) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;
        state.framebuffers.insert(handle, None);
        Some(handle)
    }

    fn delete_framebuffer(&self, framebuffer: Option<&MockHandle>) {
        if let Some(framebuffer) = framebuffer {
            let mut state = self.0.borrow_mut();
            state.framebuffers.remove(framebuffer);

            if state.bound_framebuffer == Some(*framebuffer) {
                state.bound_framebuffer = None;
            }
        }
    }

    fn bind_framebuffer(&self, _target: u32, framebuffer: Option<&MockHandle>) {
        self.0.borrow_mut().bound_framebuffer = framebuffer.copied();
    }

    fn framebuffer_texture_2d(
        &self,
        attachment: u32,
        target: u32,
        texture: Option<&MockHandle>,
        level: i32,
    ) {
        let mut state = self.0.borrow_mut();

        let record = Attachment {
            framebuffer: state.bound_framebuffer,
            attachment,
            target,
            texture: texture.copied(),
            level,
        };

        state.attachment_log.push(record);

        if attachment == GL::COLOR_ATTACHMENT0 {
            if let Some(framebuffer) = state.bound_framebuffer {
                state.framebuffers.insert(framebuffer, Some(record));
            }
        }
    }

    fn framebuffer_renderbuffer(&self, attachment: u32, _renderbuffer: Option<&MockHandle>) {
        let mut state = self.0.borrow_mut();

        if attachment == GL::COLOR_ATTACHMENT0 {
            if let Some(framebuffer) = state.bound_framebuffer {
                state.framebuffers.insert(framebuffer, None);
            }
        }
    }

    fn check_framebuffer_status(&self) -> u32 {
        self.0.borrow().framebuffer_status
    }

    fn create_buffer(&self) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;
        state.buffers.insert(handle);
        Some(handle)
    }

    fn delete_buffer(&self, buffer: Option<&MockHandle>) {
        if let Some(buffer) = buffer {
            self.0.borrow_mut().buffers.remove(buffer);
        }
    }

    fn bind_buffer(&self, _target: u32, _buffer: Option<&MockHandle>) {}

    fn buffer_data(&self, _target: u32, _data: &[u8]) {}

    fn create_vertex_array(&self) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;
        state.vertex_arrays.insert(handle);
        Some(handle)
    }

    fn delete_vertex_array(&self, vertex_array: Option<&MockHandle>) {
        if let Some(vertex_array) = vertex_array {
            self.0.borrow_mut().vertex_arrays.remove(vertex_array);
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<&MockHandle>) {
        self.0.borrow_mut().bound_vertex_array = vertex_array.copied();
    }

    fn enable_vertex_attrib_array(&self, _index: u32) {}

    fn vertex_attrib_pointer(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.0
            .borrow_mut()
            .attribute_log
            .push((index, size, stride, offset));
    }

    fn create_shader(&self, _kind: u32) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;
        state.shaders.insert(handle, String::new());
        Some(handle)
    }

    fn delete_shader(&self, shader: Option<&MockHandle>) {
        if let Some(shader) = shader {
            self.0.borrow_mut().shaders.remove(shader);
        }
    }

    fn shader_source(&self, shader: &MockHandle, source: &str) {
        if let Some(code) = self.0.borrow_mut().shaders.get_mut(shader) {
            *code = source.to_owned();
        }
    }

    fn compile_shader(&self, _shader: &MockHandle) {}

    fn shader_compile_status(&self, shader: &MockHandle) -> bool {
        !self.0.borrow().shader_failed(shader)
    }

    fn shader_info_log(&self, shader: &MockHandle) -> Option<String> {
        if self.0.borrow().shader_failed(shader) {
            Some(String::from("ERROR: 0:4: 'f_color' : syntax error"))
        } else {
            None
        }
    }

    fn create_program(&self) -> Option<MockHandle> {
        let mut state = self.0.borrow_mut();
        let handle = state.allocate()?;

        state.programs.insert(
            handle,
            ProgramState {
                shaders: Vec::new(),
                polls: 0,
                linked: false,
            },
        );

        Some(handle)
    }

    fn delete_program(&self, program: Option<&MockHandle>) {
        if let Some(program) = program {
            self.0.borrow_mut().programs.remove(program);
        }
    }

    fn attach_shader(&self, program: &MockHandle, shader: &MockHandle) {
        if let Some(state) = self.0.borrow_mut().programs.get_mut(program) {
            state.shaders.push(*shader);
        }
    }

    fn link_program(&self, program: &MockHandle) {
        let mut state = self.0.borrow_mut();
        state.link_count += 1;

        let linked = match state.programs.get(program) {
            Some(entry) => entry.shaders.iter().all(|shader| !state.shader_failed(shader)),
            None => false,
        };

        if let Some(entry) = state.programs.get_mut(program) {
            entry.linked = linked;
        }
    }

    fn program_completion_status(&self, program: &MockHandle) -> bool {
        let mut guard = self.0.borrow_mut();
        let state = &mut *guard;

        let held = match state.programs.get(program) {
            Some(entry) => state.program_held(entry),
            None => return true,
        };

        let delay = state.completion_delay;

        match state.programs.get_mut(program) {
            Some(entry) => {
                entry.polls += 1;
                !held && entry.polls > delay
            }
            None => true,
        }
    }

    fn program_link_status(&self, program: &MockHandle) -> bool {
        self.0
            .borrow()
            .programs
            .get(program)
            .map_or(false, |entry| entry.linked)
    }

    fn program_info_log(&self, _program: &MockHandle) -> Option<String> {
        Some(String::from("link failed"))
    }

    fn use_program(&self, program: Option<&MockHandle>) {
        self.0.borrow_mut().current_program = program.copied();
    }

    fn get_uniform_location(&self, program: &MockHandle, name: &str) -> Option<MockUniform> {
        Some(MockUniform {
            program: *program,
            name: name.to_owned(),
        })
    }

    fn uniform1i(&self, location: &MockUniform, value: i32) {
        self.0
            .borrow_mut()
            .record_uniform(location, UniformValue::Int(value));
    }

    fn uniform1f(&self, location: &MockUniform, value: f32) {
        self.0
            .borrow_mut()
            .record_uniform(location, UniformValue::Float(value));
    }

    fn uniform3f(&self, location: &MockUniform, x: f32, y: f32, z: f32) {
        self.0
            .borrow_mut()
            .record_uniform(location, UniformValue::Vec3([x, y, z]));
    }

    fn uniform_matrix4fv(&self, location: &MockUniform, value: &[f32; 16]) {
        self.0
            .borrow_mut()
            .record_uniform(location, UniformValue::Mat4(*value));
    }

    fn viewport(&self, x: i32, y: i32, w: i32, h: i32) {
        self.0.borrow_mut().viewport = (x, y, w, h);
    }

    fn enable(&self, _capability: u32) {}

    fn disable(&self, _capability: u32) {}

    fn depth_func(&self, _func: u32) {}

    fn clear_color(&self, _r: f32, _g: f32, _b: f32, _a: f32) {}

    fn clear_depth(&self, _depth: f32) {}

    fn clear(&self, _mask: u32) {}

    fn draw_arrays(&self, mode: u32, _first: i32, count: i32) {
        self.0.borrow_mut().record_draw(mode, count, false);
    }

    fn draw_elements(&self, mode: u32, count: i32, _kind: u32, _offset: i32) {
        self.0.borrow_mut().record_draw(mode, count, true);
    }
}
