use std::time::{Duration, Instant};

/// Measures the elapsed time between consecutive frames.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previous frame; the next tick reports zero.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Seconds between the previous tick and `now`. The first tick after
    /// construction or [`reset`](Self::reset) reports zero.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

/// Period of a frame loop running at `rate_hz`, clamped to 1..=1000 Hz.
pub fn frame_interval(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.clamp(1, 1000)))
}
