//! # Rendering System
//!
//! Procedural meshes and the multi-body renderer that draws them through the
//! [`RenderBackend`] abstraction.
//!
//! ## Architecture
//!
//! - **Primitives**: mesh records, the UV-sphere generator and the camera
//! - **Api**: backend trait, resource handles and sampling parameters
//! - **Program / Buffers / Texture**: GPU-side resources a body draws with
//! - **Binding**: renderer-side model of the implicit GPU binding state
//! - **Renderer**: per-frame transform composition and the bind protocol
//! - **Backends**: the headless state-tracking backend
//!
//! Setup failures are returned as [`RenderError`]; per-frame failures are
//! logged and the affected draw is skipped.

pub mod api;
pub mod backends;
pub mod binding;
pub mod body;
pub mod buffers;
pub mod primitives;
pub mod program;
pub mod renderer;
pub mod shaders;
pub mod texture;

#[cfg(test)]
mod tests;

pub use api::{BackendResult, ClearState, RenderBackend, ShaderSource, TextureParams};
pub use binding::{BindingError, BindingState, BoundResources};
pub use body::{BodyTransform, RenderBody};
pub use buffers::GpuBufferSet;
pub use primitives::{Camera, MeshError, MeshRecord, MeshSource, SphereMeshGenerator, SphereOptions};
pub use program::{ProgramBindings, ShaderProgram};
pub use renderer::{FrameStats, MultiBodyRenderer};
pub use texture::{Texture, TextureState, TextureUpload, TextureUploads};

use thiserror::Error;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Rendering system errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Bad inputs rejected before any GPU resource is touched
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Shader compilation or linking failed, or a required slot is missing
    ///
    /// Fatal to scene start-up.
    #[error("Pipeline setup failed: {0}")]
    PipelineSetupFailure(String),

    /// Scene cannot be assembled (missing or inconsistent mesh, no bodies)
    #[error("Scene configuration error: {0}")]
    SceneConfiguration(String),

    /// Resource still loading; the placeholder stands in meanwhile
    #[error("Resource not ready: {0}")]
    ResourceNotReady(String),

    /// Backend rejected an operation
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Mesh data broke the shape contract
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// Bind protocol violated before a draw
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),
}
