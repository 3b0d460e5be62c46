use std::time::{Duration, Instant};

/// Frame timing: delta between ticks and time since start.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    start: Instant,
    last: Instant,
    delta: Duration,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Timer whose clock starts at `start`. The first tick measures from it.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last: start,
            delta: Duration::ZERO,
        }
    }

    /// Advance to now. Returns the new delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Advance to `now`. An instant earlier than the last tick yields zero.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        self.delta = now.saturating_duration_since(self.last);
        self.last = now.max(self.last);
        self.delta.as_secs_f32()
    }

    /// Seconds between the two most recent ticks.
    pub fn delta(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Seconds from start to the most recent tick.
    pub fn frame_time(&self) -> f32 {
        (self.last - self.start).as_secs_f32()
    }

    /// Seconds from start to now.
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn delta_measures_between_ticks() {
        let t0 = Instant::now();
        let mut timer = FrameTimer::starting_at(t0);
        assert_eq!(timer.delta(), 0.0);

        let dt = timer.tick_at(t0 + Duration::from_millis(16));
        assert_relative_eq!(dt, 0.016, epsilon = 1e-6);

        let dt = timer.tick_at(t0 + Duration::from_millis(50));
        assert_relative_eq!(dt, 0.034, epsilon = 1e-6);
        assert_relative_eq!(timer.delta(), 0.034, epsilon = 1e-6);
        assert_relative_eq!(timer.frame_time(), 0.050, epsilon = 1e-6);
    }

    #[test]
    fn going_backwards_is_zero() {
        let t0 = Instant::now();
        let mut timer = FrameTimer::starting_at(t0);
        timer.tick_at(t0 + Duration::from_secs(1));
        assert_eq!(timer.tick_at(t0), 0.0);
        assert_relative_eq!(timer.frame_time(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn real_clock_is_monotonic() {
        let mut timer = FrameTimer::new();
        let dt = timer.tick();
        assert!(dt >= 0.0);
        assert!(timer.elapsed() >= timer.frame_time());
    }
}
