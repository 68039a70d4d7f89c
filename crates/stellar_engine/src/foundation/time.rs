//! Time management utilities
//!
//! The frame clock owns the only state shared across frames: the elapsed
//! time scalar. It is threaded into the renderer as a [`FrameState`] value
//! instead of living in a module-level variable.

use std::thread;
use std::time::{Duration, Instant};

/// Snapshot of the frame clock handed to one frame callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Total elapsed time in seconds (monotonically non-decreasing)
    pub elapsed: f32,

    /// Time advanced by the tick that produced this state
    pub delta: f32,

    /// Number of ticks before this one
    pub frame_index: u64,

    /// Viewport size in pixels at the time of the tick
    pub viewport: (u32, u32),
}

impl FrameState {
    /// Frame state at an explicit time, for rendering outside a live loop
    pub fn at(elapsed: f32, viewport: (u32, u32)) -> Self {
        Self {
            elapsed: elapsed.max(0.0),
            delta: 0.0,
            frame_index: 0,
            viewport,
        }
    }
}

/// Accumulates measured inter-frame deltas into an elapsed time
///
/// Timestamps come from the scheduling primitive in seconds. The first tick
/// only establishes the baseline; a timestamp earlier than the previous one
/// contributes a zero delta so elapsed time never runs backwards.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock at zero elapsed time
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock to `timestamp` (seconds) and return the new state
    pub fn tick(&mut self, timestamp: f64, viewport: (u32, u32)) -> FrameState {
        let delta = match self.last_timestamp {
            Some(previous) => (timestamp - previous).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(match self.last_timestamp {
            Some(previous) => previous.max(timestamp),
            None => timestamp,
        });
        self.elapsed += delta;

        let state = FrameState {
            elapsed: self.elapsed as f32,
            delta: delta as f32,
            frame_index: self.frame_count,
            viewport,
        };
        self.frame_count += 1;
        state
    }

    /// Total elapsed time in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// What the frame callback wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Schedule the next frame
    Continue,
    /// Do not schedule another frame
    Stop,
}

/// Cooperative single-threaded frame scheduler
///
/// Invokes the callback once per tick with a monotonically increasing
/// timestamp in seconds. Each invocation completes before the next one is
/// scheduled; stopping means simply not scheduling the next tick.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    frame_interval: Option<Duration>,
    max_frames: Option<u64>,
}

impl FrameLoop {
    /// Create a loop paced at `target_fps` (unpaced when `None` or zero)
    pub fn new(target_fps: Option<u32>, max_frames: Option<u64>) -> Self {
        let frame_interval = target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            frame_interval,
            max_frames,
        }
    }

    /// Run until the callback stops or the frame limit is reached.
    ///
    /// Returns the number of frames that were invoked.
    pub fn run<F>(&self, mut frame: F) -> u64
    where
        F: FnMut(f64) -> LoopControl,
    {
        let start = Instant::now();
        let mut frames = 0u64;

        loop {
            if self.max_frames.is_some_and(|max| frames >= max) {
                log::debug!("Frame limit reached after {} frames", frames);
                break;
            }

            let tick_start = Instant::now();
            let timestamp = tick_start.duration_since(start).as_secs_f64();
            frames += 1;

            if frame(timestamp) == LoopControl::Stop {
                log::debug!("Frame callback stopped the loop after {} frames", frames);
                break;
            }

            if let Some(interval) = self.frame_interval {
                let spent = tick_start.elapsed();
                if spent < interval {
                    thread::sleep(interval - spent);
                }
            }
        }

        frames
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}
