//! # Stellar Engine
//!
//! Procedural UV-sphere meshes rendered as independently spinning bodies
//! through a pluggable GPU backend.
//!
//! ## Features
//!
//! - **Sphere generation**: deterministic positions, indices, normals, UVs
//!   and optional band colours for any radius and subdivision
//! - **Multi-body rendering**: per-frame transform composition with a
//!   strict, verified bind sequence before every draw
//! - **Placeholder textures**: bodies draw from the first frame while images
//!   decode on worker threads
//! - **Headless backend**: a state-tracking backend for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stellar_engine::prelude::*;
//!
//! struct Spin;
//!
//! impl Application for Spin {
//!     fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine, frame: &FrameState) -> Result<LoopControl, AppError> {
//!         Ok(if frame.elapsed > 10.0 { LoopControl::Stop } else { LoopControl::Continue })
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut engine = Engine::new(config, Box::new(HeadlessBackend::new(1280, 720)))?;
//!     engine.run(&mut Spin)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageData},
        core::config::{ApplicationConfig, BodyConfig, Config, ConfigError},
        foundation::{
            math::{Mat4, Vec3},
            time::{FrameState, LoopControl, Stopwatch},
        },
        render::{
            backends::HeadlessBackend, BodyTransform, Camera, FrameStats, MeshRecord, MeshSource,
            RenderBackend, RenderError, SphereMeshGenerator, SphereOptions,
        },
        scene::{Scene, SceneBuilder},
        AppError, Application, Engine, EngineError,
    };
}
