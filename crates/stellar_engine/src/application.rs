//! Application trait and lifecycle management

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::{Engine, EngineError};
use crate::foundation::time::{FrameState, LoopControl};
use crate::render::renderer::FrameStats;

/// Application lifecycle trait
///
/// Implement this trait to drive a scene through the engine's frame loop.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the scene is built and before the first frame.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame after pending textures are applied and before the
    /// scene is drawn. Returning [`LoopControl::Stop`] draws this frame and
    /// schedules no further ones.
    fn update(&mut self, engine: &mut Engine, frame: &FrameState) -> Result<LoopControl, AppError>;

    /// Called after the scene has been drawn
    fn frame_rendered(&mut self, _frame: &FrameState, _stats: &FrameStats) {}

    /// Cleanup the application
    ///
    /// Called once when the loop ends, whether or not an error stopped it.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
