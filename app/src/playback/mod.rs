use std::time::Duration;

pub const DEFAULT_MAX_CATCH_UP: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub current_frame: usize,
    pub is_playing: bool,
    /// Requested rate, 0 means the dataset's own frame rate.
    pub target_fps: f32,
    pub is_seeking: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_frame: 0,
            is_playing: true,
            target_fps: 0.0,
            is_seeking: false,
        }
    }
}

/// Outcome of one `PlaybackClock::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Suspended,
    Advanced { steps: u32, frame: usize, dropped: bool },
    InvalidDataset,
}

/// Fixed step frame counter driven by accumulated real time.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    num_frames: usize,
    dataset_fps: f32,
    accumulated_ms: f64,
    max_catch_up: u32,
    suspended: bool,
}

impl PlaybackClock {
    pub fn new(max_catch_up: u32) -> Self {
        Self {
            state: PlaybackState::default(),
            num_frames: 0,
            dataset_fps: 0.0,
            accumulated_ms: 0.0,
            max_catch_up: max_catch_up.max(1),
            suspended: false,
        }
    }

    /// New dataset. Play/pause and the requested rate are host inputs and survive.
    pub fn reset(&mut self, num_frames: usize, dataset_fps: f32) {
        self.num_frames = num_frames;
        self.dataset_fps = dataset_fps;
        self.state.current_frame = 0;
        self.state.is_seeking = false;
        self.suspended = false;
        self.accumulated_ms = 0.0;
    }

    pub fn state(&self) -> &PlaybackState { &self.state }
    pub fn current_frame(&self) -> usize { self.state.current_frame }
    pub fn num_frames(&self) -> usize { self.num_frames }
    pub fn is_playing(&self) -> bool { self.state.is_playing }
    pub fn is_seeking(&self) -> bool { self.state.is_seeking }
    pub fn is_suspended(&self) -> bool { self.suspended }
    pub fn max_catch_up(&self) -> u32 { self.max_catch_up }

    pub fn set_max_catch_up(&mut self, steps: u32) {
        self.max_catch_up = steps.max(1);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
    }

    pub fn toggle_playing(&mut self) -> bool {
        self.state.is_playing = !self.state.is_playing;
        self.state.is_playing
    }

    pub fn set_target_fps(&mut self, fps: f32) {
        if !fps.is_finite() || fps < 0.0 {
            tracing::warn!(fps, "ignored invalid target fps");
            return;
        }
        self.state.target_fps = fps;
    }

    pub fn effective_fps(&self) -> f32 {
        if self.state.target_fps > 0.0 {self.state.target_fps} else {self.dataset_fps}
    }

    fn interval_ms(&self) -> Option<f64> {
        let fps = self.effective_fps();
        (fps.is_finite() && fps > 0.0).then(|| 1000.0 / fps as f64)
    }

    /// Sets the frame directly, clamped to the dataset. Returns the frame actually set.
    pub fn seek(&mut self, frame: usize) -> usize {
        self.state.current_frame = match self.num_frames {
            0 => 0,
            n => frame.min(n - 1),
        };
        self.state.current_frame
    }

    pub fn set_seeking(&mut self, seeking: bool) {
        self.state.is_seeking = seeking;
    }

    /// Held while a joint is dragged.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    /// Moves `delta` frames with wrap around in both directions.
    pub fn step(&mut self, delta: i64) -> usize {
        if self.num_frames == 0 {return 0};
        let n = self.num_frames as i64;
        self.state.current_frame = (self.state.current_frame as i64 + delta).rem_euclid(n) as usize;
        self.state.current_frame
    }

    pub fn tick(&mut self, elapsed: Duration) -> Tick {
        if self.num_frames == 0 {
            self.state.current_frame = 0;
            self.accumulated_ms = 0.0;
            return Tick::InvalidDataset;
        }
        if !self.state.is_playing {
            self.accumulated_ms = 0.0;
            return Tick::Idle;
        }
        if self.state.is_seeking || self.suspended {
            self.accumulated_ms = 0.0;
            return Tick::Suspended;
        }
        let Some(interval) = self.interval_ms() else {return Tick::Idle};

        self.accumulated_ms += elapsed.as_secs_f64() * 1000.0;
        let mut steps = 0;
        while self.accumulated_ms >= interval && steps < self.max_catch_up {
            self.accumulated_ms -= interval;
            steps += 1;
        }

        let dropped = self.accumulated_ms >= interval;
        if dropped {
            tracing::debug!(skipped_ms = self.accumulated_ms, "playback catch-up cap hit");
            self.accumulated_ms = 0.0;
        }
        if steps == 0 {return Tick::Idle};

        self.state.current_frame = (self.state.current_frame + steps as usize) % self.num_frames;
        Tick::Advanced { steps, frame: self.state.current_frame, dropped }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CATCH_UP)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: f64) -> Duration {
        Duration::from_secs_f64(v / 1000.0)
    }

    fn run(clock: &mut PlaybackClock, ticks: impl IntoIterator<Item = f64>) -> u64 {
        let mut total = 0;
        for t in ticks {
            if let Tick::Advanced { steps, .. } = clock.tick(ms(t)) {
                total += steps as u64;
            }
        }
        total
    }

    #[test]
    fn dataset_rate_after_one_second() {
        let mut clock = PlaybackClock::default();
        clock.reset(100, 30.0);
        clock.set_target_fps(0.0);
        let steps = run(&mut clock, std::iter::repeat(1000.0 / 60.0).take(60));
        assert!((29..=31).contains(&steps), "{steps}");
        assert!((29..=31).contains(&clock.current_frame()));
    }

    #[test]
    fn advance_count_tracks_target_fps() {
        let pattern = [7.0, 16.0, 3.0, 33.0, 1.0, 12.5, 20.0];
        for fps in [1.0f32, 12.0, 24.0, 30.0, 60.0, 90.0] {
            let mut clock = PlaybackClock::new(64);
            clock.reset(1_000_000, 30.0);
            clock.set_target_fps(fps);
            let ticks: Vec<f64> = pattern.iter().copied().cycle().take(700).collect();
            let total_ms: f64 = ticks.iter().sum();
            let steps = run(&mut clock, ticks);
            let expected = (total_ms * fps as f64 / 1000.0).floor() as u64;
            assert!(steps.abs_diff(expected) <= 1, "fps {fps}: {steps} vs {expected}");
        }
    }

    #[test]
    fn wraps_to_first_frame() {
        let mut clock = PlaybackClock::default();
        clock.reset(5, 10.0);
        assert_eq!(clock.seek(4), 4);
        assert_eq!(clock.tick(ms(100.0)), Tick::Advanced { steps: 1, frame: 0, dropped: false });
        for _ in 0..50 {
            clock.tick(ms(37.0));
            assert!(clock.current_frame() < 5);
        }
    }

    #[test]
    fn step_wraps_both_ways() {
        let mut clock = PlaybackClock::default();
        clock.reset(3, 10.0);
        assert_eq!(clock.step(-1), 2);
        assert_eq!(clock.step(2), 1);
    }

    #[test]
    fn catch_up_is_capped() {
        let mut clock = PlaybackClock::new(3);
        clock.reset(100, 10.0);
        assert_eq!(clock.tick(ms(10_000.0)), Tick::Advanced { steps: 3, frame: 3, dropped: true });
        // nothing left over from the stall
        assert_eq!(clock.tick(ms(50.0)), Tick::Idle);
        assert_eq!(clock.tick(ms(50.0)), Tick::Advanced { steps: 1, frame: 4, dropped: false });
    }

    #[test]
    fn pause_keeps_frame_and_discards_time() {
        let mut clock = PlaybackClock::default();
        clock.reset(100, 10.0);
        clock.tick(ms(250.0));
        let frame = clock.current_frame();
        clock.set_playing(false);
        assert_eq!(clock.tick(ms(5_000.0)), Tick::Idle);
        assert_eq!(clock.current_frame(), frame);
        clock.set_playing(true);
        assert_eq!(clock.tick(ms(50.0)), Tick::Idle);
        assert_eq!(clock.current_frame(), frame);
    }

    #[test]
    fn seeking_and_drag_suspend() {
        let mut clock = PlaybackClock::default();
        clock.reset(100, 10.0);
        clock.set_seeking(true);
        assert_eq!(clock.tick(ms(1_000.0)), Tick::Suspended);
        clock.set_seeking(false);
        clock.set_suspended(true);
        assert!(clock.is_suspended());
        assert_eq!(clock.tick(ms(1_000.0)), Tick::Suspended);
        assert_eq!(clock.current_frame(), 0);
        clock.set_suspended(false);
        assert_eq!(clock.tick(ms(100.0)), Tick::Advanced { steps: 1, frame: 1, dropped: false });
    }

    #[test]
    fn seek_is_clamped() {
        let mut clock = PlaybackClock::default();
        clock.reset(10, 10.0);
        assert_eq!(clock.seek(99), 9);
        assert_eq!(clock.seek(3), 3);
    }

    #[test]
    fn empty_dataset_holds_frame_zero() {
        let mut clock = PlaybackClock::default();
        clock.reset(0, 30.0);
        assert_eq!(clock.tick(ms(1_000.0)), Tick::InvalidDataset);
        assert_eq!(clock.seek(5), 0);
        assert_eq!(clock.step(1), 0);
        assert_eq!(clock.current_frame(), 0);
    }

    #[test]
    fn invalid_target_fps_is_ignored() {
        let mut clock = PlaybackClock::default();
        clock.reset(10, 25.0);
        clock.set_target_fps(60.0);
        clock.set_target_fps(-1.0);
        clock.set_target_fps(f32::NAN);
        assert_eq!(clock.effective_fps(), 60.0);
        clock.set_target_fps(0.0);
        assert_eq!(clock.effective_fps(), 25.0);
    }
}
