use std::time::Instant;

use crate::shared::constants::FPS_WINDOW;

/// Frames-per-second estimate sampled every `window` ticks.
#[derive(Clone, Debug)]
pub struct FpsCounter {
    window: usize,
    frames: usize,
    last_sample: Instant,
    fps: f64,
}

impl FpsCounter {
    pub fn new(window: usize) -> Self {
        Self::starting_at(window, Instant::now())
    }

    /// Counter whose first sample window opens at `start`.
    pub fn starting_at(window: usize, start: Instant) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            last_sample: start,
            fps: 0.0,
        }
    }

    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Counts one frame at `now`. When the window fills, the rate becomes
    /// `window / elapsed` and a new window opens. Returns the current rate.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        if self.frames >= self.window {
            let elapsed = now.saturating_duration_since(self.last_sample).as_secs_f64();
            if elapsed > 0.0 {
                self.fps = self.frames as f64 / elapsed;
            }
            self.frames = 0;
            self.last_sample = now;
        }
        self.fps
    }

    /// Last computed rate; 0 before the first window completes.
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(FPS_WINDOW)
    }
}
