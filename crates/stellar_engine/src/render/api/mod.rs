//! Public rendering API
//!
//! The backend trait and the handle/parameter types that cross it.

pub mod render_backend;

// Re-export commonly used types
pub use render_backend::{
    AttributeLocation, BackendResult, BufferHandle, ClearState, FilterMode, ProgramHandle,
    RenderBackend, ShaderSource, TextureHandle, TextureParams, UniformLocation, WrapMode,
};
