//! # Core Engine Module
//!
//! Shared configuration used by the engine, the scene builder and
//! applications.

pub mod config;

pub use config::{
    ApplicationConfig, AssetConfig, BodyConfig, Config, ConfigError, EngineConfig, RendererConfig,
    SceneConfig, ShaderConfig,
};
