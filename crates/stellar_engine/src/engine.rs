//! Core engine implementation

use thiserror::Error;

use crate::application::Application;
use crate::config::ConfigError;
use crate::core::config::ApplicationConfig;
use crate::foundation::time::{FrameClock, FrameLoop, LoopControl};
use crate::render::api::RenderBackend;
use crate::render::renderer::FrameStats;
use crate::render::RenderError;
use crate::scene::Scene;

/// Main engine struct
///
/// Owns the backend and the scene and drives the frame loop. Every frame
/// runs to completion inside one loop tick: textures that finished decoding
/// are applied, the application updates, the scene is drawn.
pub struct Engine {
    config: ApplicationConfig,
    backend: Box<dyn RenderBackend>,
    scene: Scene,
    clock: FrameClock,
    last_stats: FrameStats,
    running: bool,
}

impl Engine {
    /// Validate `config` and build its scene on `backend`
    pub fn new(config: ApplicationConfig, mut backend: Box<dyn RenderBackend>) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;
        let scene = Scene::from_config(backend.as_mut(), &config)?;
        Ok(Self::with_scene(config, backend, scene))
    }

    /// Engine around a scene that was already built on `backend`
    pub fn with_scene(config: ApplicationConfig, backend: Box<dyn RenderBackend>, scene: Scene) -> Self {
        Self {
            config,
            backend,
            scene,
            clock: FrameClock::new(),
            last_stats: FrameStats::default(),
            running: true,
        }
    }

    /// Run the frame loop with the given application.
    ///
    /// Returns the number of frames drawn. An application error stops the
    /// loop; `cleanup` still runs before it is returned.
    pub fn run<T: Application>(&mut self, app: &mut T) -> Result<u64, EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("initialization: {e}")))?;

        let engine_config = &self.config.engine;
        let frame_loop = FrameLoop::new(engine_config.target_fps, engine_config.max_frames);
        log::info!(
            "Starting frame loop (target fps: {:?}, frame limit: {:?})",
            engine_config.target_fps,
            engine_config.max_frames
        );

        let mut failure = None;
        let frames = if self.running {
            frame_loop.run(|timestamp| match self.tick(app, timestamp) {
                Ok(control) => control,
                Err(error) => {
                    log::error!("Frame loop stopped: {}", error);
                    failure = Some(error);
                    LoopControl::Stop
                }
            })
        } else {
            0
        };

        app.cleanup(self);

        match failure {
            Some(error) => Err(error),
            None => {
                log::info!("Engine shutdown complete after {} frames", frames);
                Ok(frames)
            }
        }
    }

    fn tick<T: Application>(&mut self, app: &mut T, timestamp: f64) -> Result<LoopControl, EngineError> {
        let frame = self.clock.tick(timestamp, self.backend.viewport());

        let applied = self.scene.poll_texture_uploads(self.backend.as_mut());
        if applied > 0 {
            log::debug!("Applied {} texture(s) before frame {}", applied, frame.frame_index);
        }

        let control = app
            .update(self, &frame)
            .map_err(|e| EngineError::Application(format!("frame {}: {e}", frame.frame_index)))?;

        let stats = self.scene.render(self.backend.as_mut(), &frame);
        self.last_stats = stats;
        app.frame_rendered(&frame, &stats);

        Ok(if self.running { control } else { LoopControl::Stop })
    }

    /// Finish the current frame and schedule no more
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Configuration the engine was started with
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// The scene being drawn
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The rendering backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Mutable backend access
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// Statistics of the most recent frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Seconds since the first frame
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene could not be set up
    #[error("Scene setup failed: {0}")]
    Setup(#[from] RenderError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppError;
    use crate::assets::ImageData;
    use crate::foundation::time::FrameState;
    use crate::render::backends::headless::HeadlessBackend;
    use crate::render::texture::TextureUpload;
    use crate::scene::SceneBuilder;

    #[derive(Default)]
    struct Recorder {
        initialized: bool,
        cleaned_up: bool,
        elapsed: Vec<f32>,
        drawn: Vec<usize>,
        stop_at: Option<u64>,
        fail_at: Option<u64>,
        send_texture: bool,
        ready_at_first_frame: bool,
    }

    impl Application for Recorder {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            self.initialized = true;
            if self.send_texture {
                let scene = engine.scene();
                let texture = scene.bodies()[0].texture.handle();
                scene
                    .texture_sender()
                    .send(TextureUpload { texture, image: ImageData::solid_color(16, 16, [9; 4]) })
                    .map_err(|e| AppError::Custom(e.to_string()))?;
            }
            Ok(())
        }

        fn update(&mut self, engine: &mut Engine, frame: &FrameState) -> Result<LoopControl, AppError> {
            if frame.frame_index == 0 {
                self.ready_at_first_frame = engine.scene().pending_textures() == 0;
            }
            if self.fail_at == Some(frame.frame_index) {
                return Err(AppError::Custom("boom".to_string()));
            }
            if self.stop_at == Some(frame.frame_index) {
                return Ok(LoopControl::Stop);
            }
            Ok(LoopControl::Continue)
        }

        fn frame_rendered(&mut self, frame: &FrameState, stats: &FrameStats) {
            self.elapsed.push(frame.elapsed);
            self.drawn.push(stats.bodies_drawn);
        }

        fn cleanup(&mut self, _engine: &mut Engine) {
            self.cleaned_up = true;
        }
    }

    fn engine(max_frames: u64) -> Engine {
        let mut config = ApplicationConfig::default();
        config.scene.steps = 6;
        config.engine.target_fps = None;
        config.engine.max_frames = Some(max_frames);

        let mut backend = HeadlessBackend::new(320, 240);
        let scene = SceneBuilder::new(&config)
            .load_textures(false)
            .build(&mut backend)
            .expect("scene builds");
        Engine::with_scene(config, Box::new(backend), scene)
    }

    #[test]
    fn test_runs_until_frame_limit() {
        let mut engine = engine(5);
        let mut app = Recorder::default();

        let frames = engine.run(&mut app).expect("runs");

        assert_eq!(frames, 5);
        assert!(app.initialized && app.cleaned_up);
        assert_eq!(app.drawn, vec![2; 5]);
        assert!(app.elapsed.windows(2).all(|pair| pair[1] >= pair[0]));
        assert_eq!(app.elapsed[0], 0.0);
        assert_eq!(engine.last_stats().bodies_drawn, 2);
    }

    #[test]
    fn test_stop_draws_final_frame() {
        let mut engine = engine(100);
        let mut app = Recorder {
            stop_at: Some(2),
            ..Recorder::default()
        };

        assert_eq!(engine.run(&mut app).expect("runs"), 3);
        assert_eq!(app.drawn.len(), 3);
    }

    #[test]
    fn test_update_error_stops_loop_after_cleanup() {
        let mut engine = engine(100);
        let mut app = Recorder {
            fail_at: Some(1),
            ..Recorder::default()
        };

        let result = engine.run(&mut app);

        assert!(matches!(result, Err(EngineError::Application(_))));
        assert!(app.cleaned_up);
        assert_eq!(app.drawn.len(), 1);
    }

    #[test]
    fn test_texture_applied_before_first_frame() {
        let mut engine = engine(1);
        let mut app = Recorder {
            send_texture: true,
            ..Recorder::default()
        };

        engine.run(&mut app).expect("runs");
        assert!(app.ready_at_first_frame);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ApplicationConfig::default();
        config.renderer.far = 0.0;

        let result = Engine::new(config, Box::new(HeadlessBackend::new(8, 8)));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_new_builds_configured_scene() {
        let mut config = ApplicationConfig::default();
        config.scene.steps = 4;
        for body in &mut config.scene.bodies {
            body.texture = None;
        }

        let engine = Engine::new(config, Box::new(HeadlessBackend::new(8, 8))).expect("engine starts");
        assert_eq!(engine.scene().bodies().len(), 2);
        assert_eq!(engine.backend().viewport(), (8, 8));
    }
}
