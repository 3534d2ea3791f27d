use std::time::{Duration, Instant};

const FPS_WINDOW: usize = 10;

/// Frame timing for the render loop: elapsed time between refreshes and an averaged fps.
pub struct Time {
    last_frame: Instant,
    delta: Duration,
    fps_samples: Vec<f32>,
    fps: f32,
}


impl Time {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            fps_samples: Vec::with_capacity(FPS_WINDOW),
            fps: 0.0,
        }
    }


    pub fn update(&mut self) -> Duration {
        let now = Instant::now();
        self.record(now - self.last_frame);
        self.last_frame = now;
        self.delta
    }

    fn record(&mut self, delta: Duration) {
        self.delta = delta;
        let seconds = delta.as_secs_f32();
        if seconds > 0.0 {
            self.fps_samples.push(1.0/seconds);
        }
        if self.fps_samples.len() >= FPS_WINDOW {
            self.fps = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
            self.fps_samples.clear();
        }
    }

    /// Drops the time spent away, e.g. while the window was hidden.
    pub fn restart(&mut self) {
        self.last_frame = Instant::now();
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
