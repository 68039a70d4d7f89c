//! Spinning spheres demo
//!
//! Loads a scene configuration, builds the two-body scene on the headless
//! backend and runs the frame loop, logging per-frame statistics.
//!
//! Usage: `stellar_demo [config.toml|config.ron]`

use std::path::PathBuf;

use stellar_engine::foundation::logging;
use stellar_engine::prelude::*;

const DEFAULT_CONFIG: &str = "stellar_app/config/scene.toml";

/// Logs what every frame drew and summarizes the run
struct SpinningSpheres {
    stopwatch: Stopwatch,
    frames: u64,
    triangles: u64,
    skipped: usize,
}

impl SpinningSpheres {
    fn new() -> Self {
        Self {
            stopwatch: Stopwatch::new(),
            frames: 0,
            triangles: 0,
            skipped: 0,
        }
    }
}

impl Application for SpinningSpheres {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        for body in engine.scene().bodies() {
            log::info!(
                "Body '{}': {} vertices, {} triangles, spin {:.2} rad/s, scale {}",
                body.name,
                body.buffers.vertex_count,
                body.buffers.triangle_count(),
                body.transform.speed,
                body.transform.scale
            );
        }
        self.stopwatch.start();
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine, _frame: &FrameState) -> Result<LoopControl, AppError> {
        Ok(LoopControl::Continue)
    }

    fn frame_rendered(&mut self, frame: &FrameState, stats: &FrameStats) {
        self.frames += 1;
        self.triangles += stats.triangles;
        self.skipped += stats.draws_skipped;
        log::debug!(
            "Frame {} at {:.3}s: {} bodies, {} triangles, {} skipped",
            frame.frame_index,
            frame.elapsed,
            stats.bodies_drawn,
            stats.triangles,
            stats.draws_skipped
        );
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        self.stopwatch.stop();
        let pending = engine.scene().pending_textures();
        if pending > 0 {
            log::warn!("{} bodies finished with their placeholder texture", pending);
        }
        log::info!(
            "Rendered {} frames ({} triangles, {} skipped draws) in {:.1} ms over {:.2}s of scene time",
            self.frames,
            self.triangles,
            self.skipped,
            self.stopwatch.elapsed_millis(),
            engine.elapsed()
        );
    }
}

fn config_path() -> PathBuf {
    std::env::args_os().nth(1).map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from)
}

fn run() -> Result<(), AppError> {
    let path = config_path();
    let config = if path.exists() {
        ApplicationConfig::load_from_file(&path)?
    } else {
        ApplicationConfig::default()
    };

    logging::init(&config.engine.log_level);
    if path.exists() {
        log::info!("Loaded scene configuration from {}", path.display());
    } else {
        log::warn!("{} not found, using the built-in scene", path.display());
    }

    let (width, height) = config.renderer.viewport;
    let backend = Box::new(HeadlessBackend::new(width, height));
    let mut engine = Engine::new(config, backend)?;

    let mut app = SpinningSpheres::new();
    engine.run(&mut app)?;
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        logging::init("info");
        log::error!("Stellar demo failed: {}", error);
        std::process::exit(1);
    }
}
