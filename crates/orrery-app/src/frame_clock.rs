//! Wall-clock frame timing for the metrics the debug server reports.
//!
//! Animation speed is tied to frames, not time, so the clock only measures.

use std::time::Instant;

use tracing::warn;

/// Frame times above this are clamped before they enter the fps average.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Weight of the newest frame in the smoothed fps.
pub const FPS_SMOOTHING: f64 = 0.1;

/// Frame counter with a smoothed frames-per-second estimate.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    previous: Instant,
    frame_count: u64,
    frame_time: f64,
    fps: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            previous: now,
            frame_count: 0,
            frame_time: 0.0,
            fps: 0.0,
        }
    }

    /// Mark the end of a frame. Returns the (clamped) frame time in seconds.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.record(elapsed)
    }

    fn record(&mut self, frame_time: f64) -> f64 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.frame_count += 1;
        self.frame_time = frame_time;
        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.fps = if self.fps == 0.0 {
                instant_fps
            } else {
                self.fps + (instant_fps - self.fps) * FPS_SMOOTHING
            };
        }
        frame_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_time * 1000.0
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
