//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that rendering backends implement so the
//! high-level renderer can drive any rasterization API through the same
//! bind → configure → draw sequence. Binding state is global to the backend,
//! exactly as it is on a real GPU context; nothing here remembers what a
//! previous draw left bound on the caller's behalf.

use serde::{Deserialize, Serialize};

use crate::assets::ImageData;
use crate::foundation::math::Mat4;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a vertex or index buffer stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// Handle to a texture stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Attribute slot resolved from a program by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// Uniform slot resolved from a program by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Frame-start state: clear values and depth testing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearState {
    /// RGBA clear colour
    pub color: [f32; 4],

    /// Depth clear value
    pub depth: f32,

    /// Depth test with a less-or-equal comparison
    pub depth_test: bool,
}

impl Default for ClearState {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            depth_test: true,
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Trilinear across generated mip levels
    LinearMipmapLinear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    /// Tile
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Sampling setup applied when a texture image is (re)specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureParams {
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
    /// Wrapping along u
    pub wrap_s: WrapMode,
    /// Wrapping along v
    pub wrap_t: WrapMode,
    /// Build the mip chain after upload
    pub generate_mipmaps: bool,
}

impl TextureParams {
    /// Parameters suited to an image of the given size.
    ///
    /// Power-of-two images get a mip chain; anything else is clamped and
    /// filtered linearly, which every rasterizer supports for arbitrary sizes.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width.is_power_of_two() && height.is_power_of_two() {
            Self {
                min_filter: FilterMode::LinearMipmapLinear,
                mag_filter: FilterMode::Linear,
                wrap_s: WrapMode::Repeat,
                wrap_t: WrapMode::Repeat,
                generate_mipmaps: true,
            }
        } else {
            Self::default()
        }
    }
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            generate_mipmaps: false,
        }
    }
}

/// Opaque shader program text, vertex and fragment stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Vertex stage
    pub vertex: String,
    /// Fragment stage
    pub fragment: String,
}

impl ShaderSource {
    /// Wrap the two stages
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// Main rendering backend trait
///
/// Object-safe so the renderer and scene can hold `&mut dyn RenderBackend`.
/// Every method that touches GPU state reports failure through
/// [`BackendResult`]; setup-time failures are fatal to the caller, per-frame
/// failures are logged and skipped by the renderer.
pub trait RenderBackend {
    /// Current viewport size in pixels (width, height)
    fn viewport(&self) -> (u32, u32);

    /// Compile and link a program from source
    fn compile_program(&mut self, source: &ShaderSource) -> BackendResult<ProgramHandle>;

    /// Look up an active attribute slot by name
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeLocation>;

    /// Look up an active uniform slot by name
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make `program` current for subsequent uniform uploads and draws
    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()>;

    /// Upload raw vertex attribute bytes into a new buffer
    fn create_vertex_buffer(&mut self, data: &[u8]) -> BackendResult<BufferHandle>;

    /// Upload `u32` triangle indices into a new element buffer
    fn create_index_buffer(&mut self, indices: &[u32]) -> BackendResult<BufferHandle>;

    /// Create a texture initialised with `image`
    fn create_texture(&mut self, image: &ImageData, params: &TextureParams) -> BackendResult<TextureHandle>;

    /// Replace the image of an existing texture in one call
    fn upload_texture_image(
        &mut self,
        texture: TextureHandle,
        image: &ImageData,
        params: &TextureParams,
    ) -> BackendResult<()>;

    /// Clear colour and depth and set the depth test for a new frame
    fn begin_frame(&mut self, clear: &ClearState) -> BackendResult<()>;

    /// Point an attribute slot at a buffer of `components` floats per vertex
    fn bind_vertex_attribute(
        &mut self,
        location: AttributeLocation,
        buffer: BufferHandle,
        components: u32,
    ) -> BackendResult<()>;

    /// Bind the element buffer used by the next indexed draw
    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()>;

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) -> BackendResult<()>;

    /// Upload a column-major 4x4 matrix uniform
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) -> BackendResult<()>;

    /// Upload a vec2 uniform
    fn set_uniform_vec2(&mut self, location: UniformLocation, value: [f32; 2]) -> BackendResult<()>;

    /// Upload a float uniform
    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) -> BackendResult<()>;

    /// Upload an int uniform (sampler units)
    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) -> BackendResult<()>;

    /// Draw `index_count` indices as triangles from the bound element buffer
    fn draw_indexed(&mut self, index_count: u32) -> BackendResult<()>;

    /// Hand the frame to the device; submission is not awaited
    fn end_frame(&mut self) -> BackendResult<()> {
        Ok(())
    }
}
