//! Headless state-tracking backend
//!
//! Implements [`RenderBackend`] without a device. Resources live in slot
//! maps, binding state is global exactly as on a real context, and every
//! call is appended to a command log. Each draw validates what is bound
//! (program, attribute buffers, element buffer range) and records a
//! [`DrawCall`] snapshot of the complete binding state at that instant.
//!
//! Used by the demo application and by every renderer test.

use std::collections::{BTreeMap, HashMap, HashSet};

use slotmap::{Key, KeyData, SlotMap};

use crate::assets::ImageData;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::api::{
    AttributeLocation, BackendResult, BufferHandle, ClearState, ProgramHandle, RenderBackend,
    ShaderSource, TextureHandle, TextureParams, UniformLocation,
};
use crate::render::binding::BoundResources;
use crate::render::program::ShaderProgram;
use crate::render::RenderError;

slotmap::new_key_type! {
    struct BufferKey;
    struct TextureKey;
    struct ProgramKey;
}

fn buffer_handle(key: BufferKey) -> BufferHandle {
    BufferHandle(key.data().as_ffi())
}

fn buffer_key(handle: BufferHandle) -> BufferKey {
    BufferKey::from(KeyData::from_ffi(handle.0))
}

fn texture_handle(key: TextureKey) -> TextureHandle {
    TextureHandle(key.data().as_ffi())
}

fn texture_key(handle: TextureHandle) -> TextureKey {
    TextureKey::from(KeyData::from_ffi(handle.0))
}

fn program_handle(key: ProgramKey) -> ProgramHandle {
    ProgramHandle(key.data().as_ffi())
}

fn program_key(handle: ProgramHandle) -> ProgramKey {
    ProgramKey::from(KeyData::from_ffi(handle.0))
}

/// Buffer target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Vertex attribute data
    Vertex,
    /// `u32` element indices
    Index,
}

#[derive(Debug, Clone)]
struct BufferRecord {
    kind: BufferKind,
    len_bytes: usize,
    index_count: usize,
    max_index: Option<u32>,
}

#[derive(Debug, Clone)]
struct TextureRecord {
    width: u32,
    height: u32,
    params: TextureParams,
    mip_levels: u32,
}

#[derive(Debug, Clone)]
struct ProgramRecord {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

/// Value uploaded to a uniform slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
    /// vec2
    Vec2([f32; 2]),
    /// float
    F32(f32),
    /// int
    I32(i32),
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Frame cleared
    BeginFrame(ClearState),
    /// Program made current
    UseProgram(ProgramHandle),
    /// Attribute slot pointed at a buffer
    BindAttribute {
        /// Slot
        location: AttributeLocation,
        /// Buffer
        buffer: BufferHandle,
        /// Floats per vertex
        components: u32,
    },
    /// Element buffer bound
    BindIndexBuffer(BufferHandle),
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Texture
        texture: TextureHandle,
    },
    /// Uniform uploaded
    SetUniform {
        /// Slot
        location: UniformLocation,
        /// Value
        value: UniformValue,
    },
    /// Indexed draw issued
    Draw {
        /// Indices drawn
        index_count: u32,
    },
    /// Frame handed to the device
    EndFrame,
}

/// Complete binding state at the moment of a draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Frame the draw belongs to (count of `begin_frame` calls)
    pub frame: u64,
    /// Program in use
    pub program: ProgramHandle,
    /// Buffer behind every bound attribute slot
    pub attributes: BTreeMap<u32, BufferHandle>,
    /// Element buffer
    pub index_buffer: BufferHandle,
    /// Indices drawn
    pub index_count: u32,
    /// Texture on every bound unit
    pub textures: BTreeMap<u32, TextureHandle>,
    /// Uniform values in effect
    pub uniforms: HashMap<UniformLocation, UniformValue>,
}

impl DrawCall {
    /// The bound set as seen through `program`'s slots
    pub fn bound_for(&self, program: &ShaderProgram) -> BoundResources {
        let slots = &program.attributes;
        BoundResources {
            position: self.attributes.get(&slots.position.0).copied(),
            normal: self.attributes.get(&slots.normal.0).copied(),
            tex_coord: self.attributes.get(&slots.tex_coord.0).copied(),
            index: Some(self.index_buffer),
            texture: self.textures.get(&0).copied(),
        }
    }

    /// Matrix uniform in effect at `location`
    pub fn mat4(&self, location: UniformLocation) -> Option<Mat4> {
        match self.uniforms.get(&location) {
            Some(UniformValue::Mat4(columns)) => Some(Mat4::from_column_slice(columns)),
            _ => None,
        }
    }
}

/// Call that should fail once, for exercising recovery paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectedFailure {
    /// Binding this buffer to an attribute slot fails
    BindVertexBuffer(BufferHandle),
    /// Binding this texture fails
    BindTexture(TextureHandle),
    /// The next draw fails
    Draw,
}

/// Same-thread state-tracking backend
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    viewport: (u32, u32),
    buffers: SlotMap<BufferKey, BufferRecord>,
    textures: SlotMap<TextureKey, TextureRecord>,
    programs: SlotMap<ProgramKey, ProgramRecord>,

    current_program: Option<ProgramHandle>,
    attributes: BTreeMap<u32, (BufferHandle, u32)>,
    index_buffer: Option<BufferHandle>,
    texture_units: BTreeMap<u32, TextureHandle>,
    uniforms: HashMap<ProgramHandle, HashMap<UniformLocation, UniformValue>>,

    frames: u64,
    commands: Vec<Command>,
    draws: Vec<DrawCall>,
    failures: HashSet<InjectedFailure>,
}

impl HeadlessBackend {
    /// Backend with a `width` × `height` viewport
    pub fn new(width: u32, height: u32) -> Self {
        log::debug!("Created headless backend {}x{}", width, height);
        Self {
            viewport: (width, height),
            ..Self::default()
        }
    }

    /// Change the viewport size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Every call recorded since creation or the last [`clear_log`](Self::clear_log)
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Draw snapshots recorded since creation or the last clear
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Drop recorded commands and draws; resources and bindings stay
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.draws.clear();
    }

    /// Number of `begin_frame` calls
    pub fn frames_begun(&self) -> u64 {
        self.frames
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Size of a buffer in bytes
    pub fn buffer_len_bytes(&self, handle: BufferHandle) -> Option<usize> {
        self.buffers.get(buffer_key(handle)).map(|buffer| buffer.len_bytes)
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Current image size of a texture
    pub fn texture_size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(texture_key(handle))
            .map(|texture| (texture.width, texture.height))
    }

    /// Mip levels of a texture's current image
    pub fn texture_mip_levels(&self, handle: TextureHandle) -> Option<u32> {
        self.textures.get(texture_key(handle)).map(|texture| texture.mip_levels)
    }

    /// Sampling parameters of a texture's current image
    pub fn texture_params(&self, handle: TextureHandle) -> Option<TextureParams> {
        self.textures.get(texture_key(handle)).map(|texture| texture.params)
    }

    /// Make the matching call fail once
    pub fn inject_failure(&mut self, failure: InjectedFailure) {
        self.failures.insert(failure);
    }

    fn take_failure(&mut self, failure: InjectedFailure) -> BackendResult<()> {
        if self.failures.remove(&failure) {
            return Err(RenderError::BackendError(format!("injected failure: {failure:?}")));
        }
        Ok(())
    }

    fn program(&self, handle: ProgramHandle) -> BackendResult<&ProgramRecord> {
        self.programs
            .get(program_key(handle))
            .ok_or_else(|| RenderError::BackendError(format!("unknown program {handle:?}")))
    }

    fn buffer(&self, handle: BufferHandle) -> BackendResult<&BufferRecord> {
        self.buffers
            .get(buffer_key(handle))
            .ok_or_else(|| RenderError::BackendError(format!("unknown buffer {handle:?}")))
    }

    fn texture_mut(&mut self, handle: TextureHandle) -> BackendResult<&mut TextureRecord> {
        self.textures
            .get_mut(texture_key(handle))
            .ok_or_else(|| RenderError::BackendError(format!("unknown texture {handle:?}")))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) -> BackendResult<()> {
        let program = self
            .current_program
            .ok_or_else(|| RenderError::BackendError("uniform set with no program in use".to_string()))?;
        let uniform_count = self.program(program)?.uniforms.len();
        if location.0 as usize >= uniform_count {
            return Err(RenderError::BackendError(format!(
                "uniform location {} is not active in program {program:?}",
                location.0
            )));
        }

        self.uniforms.entry(program).or_default().insert(location, value);
        self.commands.push(Command::SetUniform { location, value });
        Ok(())
    }

    fn validate_image(image: &ImageData) -> BackendResult<()> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.data.len() != expected {
            return Err(RenderError::BackendError(format!(
                "image {}x{} carries {} bytes, expected {}",
                image.width,
                image.height,
                image.data.len(),
                expected
            )));
        }
        Ok(())
    }

    fn mip_levels(width: u32, height: u32, params: &TextureParams) -> u32 {
        if params.generate_mipmaps {
            32 - width.max(height).leading_zeros()
        } else {
            1
        }
    }
}

fn main_stage_present(stage: &str) -> bool {
    stage.contains("void main")
}

// Names declared by statements starting with one of `qualifiers`, in order.
fn declared_names(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let mut names = Vec::new();

    for line in source.lines() {
        let code = line.split("//").next().unwrap_or_default();
        for statement in code.split(';') {
            let mut statement = statement.trim();
            if statement.starts_with("layout") {
                statement = statement.split_once(')').map_or("", |(_, rest)| rest.trim());
            }

            let tokens: Vec<&str> = statement.split_whitespace().collect();
            let (Some(&first), Some(&last)) = (tokens.first(), tokens.last()) else {
                continue;
            };
            if tokens.len() < 3 || !qualifiers.contains(&first) {
                continue;
            }

            let name = last.split('[').next().unwrap_or(last).to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
}

impl RenderBackend for HeadlessBackend {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn compile_program(&mut self, source: &ShaderSource) -> BackendResult<ProgramHandle> {
        for (stage, text) in [("vertex", &source.vertex), ("fragment", &source.fragment)] {
            if !main_stage_present(text) {
                return Err(RenderError::PipelineSetupFailure(format!(
                    "{stage} stage failed to compile: no entry point"
                )));
            }
        }

        let attributes = declared_names(&source.vertex, &["in", "attribute"]);
        let mut uniforms = declared_names(&source.vertex, &["uniform"]);
        for name in declared_names(&source.fragment, &["uniform"]) {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }

        log::debug!(
            "Compiled program: {} attributes, {} uniforms",
            attributes.len(),
            uniforms.len()
        );
        let key = self.programs.insert(ProgramRecord { attributes, uniforms });
        Ok(program_handle(key))
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeLocation> {
        let record = self.programs.get(program_key(program))?;
        let index = record.attributes.iter().position(|attribute| attribute == name)?;
        u32::try_from(index).ok().map(AttributeLocation)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let record = self.programs.get(program_key(program))?;
        let index = record.uniforms.iter().position(|uniform| uniform == name)?;
        u32::try_from(index).ok().map(UniformLocation)
    }

    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        self.program(program)?;
        self.current_program = Some(program);
        self.commands.push(Command::UseProgram(program));
        Ok(())
    }

    fn create_vertex_buffer(&mut self, data: &[u8]) -> BackendResult<BufferHandle> {
        if data.is_empty() {
            return Err(RenderError::BackendError("empty vertex buffer".to_string()));
        }
        let key = self.buffers.insert(BufferRecord {
            kind: BufferKind::Vertex,
            len_bytes: data.len(),
            index_count: 0,
            max_index: None,
        });
        Ok(buffer_handle(key))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> BackendResult<BufferHandle> {
        if indices.is_empty() {
            return Err(RenderError::BackendError("empty index buffer".to_string()));
        }
        let key = self.buffers.insert(BufferRecord {
            kind: BufferKind::Index,
            len_bytes: std::mem::size_of_val(indices),
            index_count: indices.len(),
            max_index: indices.iter().copied().max(),
        });
        Ok(buffer_handle(key))
    }

    fn create_texture(&mut self, image: &ImageData, params: &TextureParams) -> BackendResult<TextureHandle> {
        Self::validate_image(image)?;
        let key = self.textures.insert(TextureRecord {
            width: image.width,
            height: image.height,
            params: *params,
            mip_levels: Self::mip_levels(image.width, image.height, params),
        });
        Ok(texture_handle(key))
    }

    fn upload_texture_image(
        &mut self,
        texture: TextureHandle,
        image: &ImageData,
        params: &TextureParams,
    ) -> BackendResult<()> {
        Self::validate_image(image)?;
        let mip_levels = Self::mip_levels(image.width, image.height, params);
        let record = self.texture_mut(texture)?;
        record.width = image.width;
        record.height = image.height;
        record.params = *params;
        record.mip_levels = mip_levels;
        Ok(())
    }

    fn begin_frame(&mut self, clear: &ClearState) -> BackendResult<()> {
        self.frames += 1;
        self.commands.push(Command::BeginFrame(*clear));
        log::trace!("Headless frame {} cleared to {:?}", self.frames, clear.color);
        Ok(())
    }

    fn bind_vertex_attribute(
        &mut self,
        location: AttributeLocation,
        buffer: BufferHandle,
        components: u32,
    ) -> BackendResult<()> {
        self.take_failure(InjectedFailure::BindVertexBuffer(buffer))?;
        if self.buffer(buffer)?.kind != BufferKind::Vertex {
            return Err(RenderError::BackendError(format!("{buffer:?} is not a vertex buffer")));
        }
        if !(1..=4).contains(&components) {
            return Err(RenderError::BackendError(format!("invalid component count {components}")));
        }

        self.attributes.insert(location.0, (buffer, components));
        self.commands.push(Command::BindAttribute { location, buffer, components });
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
        if self.buffer(buffer)?.kind != BufferKind::Index {
            return Err(RenderError::BackendError(format!("{buffer:?} is not an index buffer")));
        }
        self.index_buffer = Some(buffer);
        self.commands.push(Command::BindIndexBuffer(buffer));
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) -> BackendResult<()> {
        self.take_failure(InjectedFailure::BindTexture(texture))?;
        self.texture_mut(texture)?;
        self.texture_units.insert(unit, texture);
        self.commands.push(Command::BindTexture { unit, texture });
        Ok(())
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) -> BackendResult<()> {
        self.set_uniform(location, UniformValue::Mat4(value.to_column_array()))
    }

    fn set_uniform_vec2(&mut self, location: UniformLocation, value: [f32; 2]) -> BackendResult<()> {
        self.set_uniform(location, UniformValue::Vec2(value))
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) -> BackendResult<()> {
        self.set_uniform(location, UniformValue::F32(value))
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) -> BackendResult<()> {
        self.set_uniform(location, UniformValue::I32(value))
    }

    fn draw_indexed(&mut self, index_count: u32) -> BackendResult<()> {
        self.take_failure(InjectedFailure::Draw)?;

        let program = self
            .current_program
            .ok_or_else(|| RenderError::BackendError("draw with no program in use".to_string()))?;
        let attribute_count = self.program(program)?.attributes.len();

        let mut vertex_limit = usize::MAX;
        for location in 0..attribute_count {
            let slot = u32::try_from(location)
                .map_err(|_| RenderError::BackendError("too many attributes".to_string()))?;
            let (buffer, components) = self.attributes.get(&slot).copied().ok_or_else(|| {
                RenderError::BackendError(format!("attribute slot {slot} has no buffer bound"))
            })?;
            let bytes_per_vertex = components as usize * std::mem::size_of::<f32>();
            vertex_limit = vertex_limit.min(self.buffer(buffer)?.len_bytes / bytes_per_vertex);
        }

        let index_buffer = self
            .index_buffer
            .ok_or_else(|| RenderError::BackendError("draw with no index buffer bound".to_string()))?;
        let indices = self.buffer(index_buffer)?;
        if index_count as usize > indices.index_count {
            return Err(RenderError::BackendError(format!(
                "draw of {index_count} indices exceeds buffer of {}",
                indices.index_count
            )));
        }
        if indices.max_index.is_some_and(|max| max as usize >= vertex_limit) {
            return Err(RenderError::BackendError(format!(
                "index buffer {index_buffer:?} addresses beyond {vertex_limit} bound vertices"
            )));
        }

        self.commands.push(Command::Draw { index_count });
        self.draws.push(DrawCall {
            frame: self.frames,
            program,
            attributes: self.attributes.iter().map(|(slot, (buffer, _))| (*slot, *buffer)).collect(),
            index_buffer,
            index_count,
            textures: self.texture_units.clone(),
            uniforms: self.uniforms.get(&program).cloned().unwrap_or_default(),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.commands.push(Command::EndFrame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders::{SPHERE_FRAGMENT, SPHERE_VERTEX};

    #[test]
    fn test_declarations_parsed_from_glsl() {
        let attributes = declared_names(SPHERE_VERTEX, &["in", "attribute"]);
        assert_eq!(attributes, vec!["aVertexPosition", "aVertexNormal", "aTextureCoord"]);

        let uniforms = declared_names(SPHERE_FRAGMENT, &["uniform"]);
        assert_eq!(uniforms, vec!["uSampler", "resolution", "time"]);
    }

    #[test]
    fn test_layout_qualifiers_and_arrays() {
        let source = "layout(location = 2) in vec3 aNormal;\nuniform mat4 uBones[16]; // skinning";
        assert_eq!(declared_names(source, &["in"]), vec!["aNormal"]);
        assert_eq!(declared_names(source, &["uniform"]), vec!["uBones"]);
    }

    #[test]
    fn test_handles_round_trip_through_slotmap_keys() {
        let mut backend = HeadlessBackend::new(8, 8);
        let first = backend.create_vertex_buffer(&[0; 12]).expect("buffer");
        let second = backend.create_index_buffer(&[0, 0, 0]).expect("buffer");

        assert_ne!(first, second);
        assert_eq!(backend.buffer_len_bytes(first), Some(12));
        assert_eq!(backend.buffer_len_bytes(second), Some(12));
        assert_eq!(backend.buffer_len_bytes(BufferHandle(u64::MAX)), None);
    }

    #[test]
    fn test_draw_without_bindings_fails() {
        let mut backend = HeadlessBackend::new(8, 8);
        let program = backend
            .compile_program(&ShaderSource::new(SPHERE_VERTEX, SPHERE_FRAGMENT))
            .expect("compiles");
        backend.use_program(program).expect("program exists");

        assert!(matches!(backend.draw_indexed(3), Err(RenderError::BackendError(_))));
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn test_index_range_checked_against_bound_vertices() {
        let mut backend = HeadlessBackend::new(8, 8);
        let program = backend
            .compile_program(&ShaderSource::new(SPHERE_VERTEX, SPHERE_FRAGMENT))
            .expect("compiles");
        backend.use_program(program).expect("program exists");

        // Three vertices, index 3 dangles
        let positions = backend.create_vertex_buffer(&[0; 36]).expect("buffer");
        let uvs = backend.create_vertex_buffer(&[0; 24]).expect("buffer");
        let indices = backend.create_index_buffer(&[0, 1, 3]).expect("buffer");
        backend.bind_vertex_attribute(AttributeLocation(0), positions, 3).expect("bind");
        backend.bind_vertex_attribute(AttributeLocation(1), positions, 3).expect("bind");
        backend.bind_vertex_attribute(AttributeLocation(2), uvs, 2).expect("bind");
        backend.bind_index_buffer(indices).expect("bind");

        assert!(backend.draw_indexed(3).is_err());
        assert!(backend.draw_indexed(4).is_err());
    }

    #[test]
    fn test_uniform_outside_program_rejected() {
        let mut backend = HeadlessBackend::new(8, 8);
        assert!(backend.set_uniform_f32(UniformLocation(0), 1.0).is_err());
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mut backend = HeadlessBackend::new(8, 8);
        let texture = backend
            .create_texture(&ImageData::solid_color(1, 1, [255; 4]), &TextureParams::default())
            .expect("texture");
        backend.inject_failure(InjectedFailure::BindTexture(texture));

        assert!(backend.bind_texture(0, texture).is_err());
        assert!(backend.bind_texture(0, texture).is_ok());
    }

    #[test]
    fn test_mipmaps_counted_for_power_of_two() {
        let mut backend = HeadlessBackend::new(8, 8);
        let image = ImageData::solid_color(256, 64, [0; 4]);
        let texture = backend
            .create_texture(&image, &TextureParams::for_dimensions(256, 64))
            .expect("texture");
        assert_eq!(backend.texture_mip_levels(texture), Some(9));
    }

    #[test]
    fn test_malformed_image_rejected() {
        let mut backend = HeadlessBackend::new(8, 8);
        let mut image = ImageData::solid_color(2, 2, [0; 4]);
        image.data.truncate(3);
        assert!(backend.create_texture(&image, &TextureParams::default()).is_err());
    }
}
