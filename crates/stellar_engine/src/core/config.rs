//! # Unified Configuration System
//!
//! Every setting the engine reads lives here, grouped per subsystem and
//! loaded as one [`ApplicationConfig`] from TOML or RON.
//!
//! ## Configuration Categories
//!
//! - **Engine**: log filter, frame pacing, frame limit
//! - **Renderer**: projection parameters, clear colour, initial viewport
//! - **Shaders**: optional shader files and the attribute/uniform names
//! - **Assets**: texture directory and decode orientation
//! - **Scene**: sphere generator options and the bodies to draw
//!
//! Defaults reproduce the two-body demo scene.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

use crate::assets::{self, AssetError};
use crate::foundation::math::Vec3;
use crate::render::api::{ClearState, ShaderSource};
use crate::render::body::BodyTransform;
use crate::render::primitives::camera::Camera;
use crate::render::primitives::sphere::SphereOptions;
use crate::render::program::ProgramBindings;
use crate::render::shaders::sphere_shader_source;
use crate::render::RenderResult;

/// # Engine Configuration
///
/// Logging and frame pacing for the whole process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Frame rate cap; `None` runs unpaced
    pub target_fps: Option<u32>,
    /// Stop after this many frames; `None` runs until the application stops
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }

    /// Stop after `frames` frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            target_fps: Some(60),
            max_frames: None,
        }
    }
}

/// # Renderer Configuration
///
/// Perspective projection and frame-start state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// RGBA clear colour
    pub clear_color: [f32; 4],
    /// Initial drawing-buffer size in pixels
    pub viewport: (u32, u32),
}

impl RendererConfig {
    /// Fixed camera built from these projection parameters
    pub fn camera(&self) -> Camera {
        let mut camera = Camera::fixed(self.fov_degrees, self.near, self.far);
        camera.set_viewport(self.viewport.0, self.viewport.1);
        camera
    }

    /// Frame-start state: configured colour, depth 1.0, depth test on
    pub fn clear_state(&self) -> ClearState {
        ClearState {
            color: self.clear_color,
            ..ClearState::default()
        }
    }

    /// Validate projection parameters
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(format!("fov must be in (0, 180) degrees, got {}", self.fov_degrees));
        }
        if !(self.near > 0.0) {
            return Err(format!("near plane must be positive, got {}", self.near));
        }
        if !(self.far > self.near) {
            return Err(format!("far plane {} must lie beyond near plane {}", self.far, self.near));
        }
        if self.viewport.0 == 0 || self.viewport.1 == 0 {
            return Err(format!("viewport {}x{} has no area", self.viewport.0, self.viewport.1));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 3840.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            viewport: (1280, 720),
        }
    }
}

/// # Shader Configuration
///
/// Shader stages are read from disk when both paths are set; otherwise the
/// built-in sphere program is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Vertex stage file
    pub vertex_shader_path: Option<String>,
    /// Fragment stage file
    pub fragment_shader_path: Option<String>,
    /// Attribute and uniform names looked up after linking
    pub bindings: ProgramBindings,
}

impl ShaderConfig {
    /// Use shader files instead of the built-in program
    pub fn from_files(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: Some(vertex_path.into()),
            fragment_shader_path: Some(fragment_path.into()),
            bindings: ProgramBindings::default(),
        }
    }

    /// Both stages, from disk or built in
    pub fn source(&self) -> Result<ShaderSource, AssetError> {
        match (&self.vertex_shader_path, &self.fragment_shader_path) {
            (Some(vertex), Some(fragment)) => assets::load_shader_source(vertex, fragment),
            _ => Ok(sphere_shader_source()),
        }
    }

    /// Paths must be given together
    pub fn validate(&self) -> Result<(), String> {
        match (&self.vertex_shader_path, &self.fragment_shader_path) {
            (Some(_), None) => Err("vertex shader set without a fragment shader".to_string()),
            (None, Some(_)) => Err("fragment shader set without a vertex shader".to_string()),
            _ => Ok(()),
        }
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory texture names are resolved against
    pub texture_dir: String,
    /// Reverse image rows on decode so `v = 0` samples the bottom row
    pub flip_vertical: bool,
}

impl AssetConfig {
    /// Set texture directory
    pub fn with_texture_dir(mut self, dir: impl Into<String>) -> Self {
        self.texture_dir = dir.into();
        self
    }

    /// Full path of a texture named in the scene
    pub fn texture_path(&self, name: &str) -> PathBuf {
        assets::resolve_path(Path::new(&self.texture_dir), name)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            texture_dir: "resources/textures".to_string(),
            flip_vertical: true,
        }
    }
}

/// # Body Configuration
///
/// One rendered sphere. Radius and subdivision fall back to the scene's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Name used in logs
    pub name: String,
    /// Translation in view space
    pub offset: [f32; 3],
    /// Rotation axis, normalised on use
    pub axis: [f32; 3],
    /// Radians per second
    pub speed: f32,
    /// Rotation at `t = 0`
    pub phase: f32,
    /// Uniform scale
    pub scale: f32,
    /// Texture file name under the texture directory
    pub texture: Option<String>,
    /// Sphere radius override
    pub radius: Option<f32>,
    /// Subdivision override
    pub steps: Option<u32>,
}

impl BodyConfig {
    /// Per-frame transform for this body
    pub fn transform(&self) -> RenderResult<BodyTransform> {
        BodyTransform::new(
            Vec3::from(self.offset),
            Vec3::from(self.axis),
            self.speed,
            self.phase,
            self.scale,
        )
    }

    /// The large body at the centre of the demo scene
    pub fn primary() -> Self {
        Self {
            name: "primary".to_string(),
            offset: [0.0, 0.0, -2500.0],
            axis: [1.0, 1.0, 0.0],
            speed: 1.0,
            phase: 0.0,
            scale: 1.0,
            texture: Some("R136a1.jpg".to_string()),
            radius: None,
            steps: None,
        }
    }

    /// Half-size companion spinning at three quarters of the primary's rate
    pub fn secondary() -> Self {
        let primary = Self::primary();
        Self {
            name: "secondary".to_string(),
            offset: [-1500.0, 500.0, -2500.0],
            speed: primary.speed * 0.75,
            scale: 0.5,
            ..primary
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            name: "body".to_string(),
            offset: [0.0, 0.0, 0.0],
            axis: [0.0, 0.0, 1.0],
            speed: 0.0,
            phase: 0.0,
            scale: 1.0,
            texture: None,
            radius: None,
            steps: None,
        }
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Default sphere radius
    pub radius: f32,
    /// Default subdivision count
    pub steps: u32,
    /// Generator options shared by every body
    pub sphere: SphereOptions,
    /// Bodies in draw order
    pub bodies: Vec<BodyConfig>,
}

impl SceneConfig {
    /// Validate body list and per-body transforms
    pub fn validate(&self) -> Result<(), String> {
        if self.bodies.is_empty() {
            return Err("scene has no bodies".to_string());
        }
        for body in &self.bodies {
            body.transform()
                .map_err(|e| format!("body '{}': {}", body.name, e))?;
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            radius: 640.0,
            steps: 64,
            sphere: SphereOptions::default(),
            bodies: vec![BodyConfig::primary(), BodyConfig::secondary()],
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration applications load and hand to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Projection and clear state
    pub renderer: RendererConfig,
    /// Shader program source and names
    pub shaders: ShaderConfig,
    /// Asset locations
    pub assets: AssetConfig,
    /// Bodies to render
    pub scene: SceneConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate().map_err(ConfigError::Invalid)?;
        self.shaders.validate().map_err(ConfigError::Invalid)?;
        self.scene.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Load from file and validate
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl Config for ApplicationConfig {}
