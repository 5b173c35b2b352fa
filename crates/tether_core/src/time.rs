//! Frame time-step data
//!
//! The native engine owns the clock. Each tick hands the script side a
//! delta and a time scale; `FrameClock` only accumulates what it was given.

use std::time::Duration;

/// Time-step data passed to every update callback.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Unscaled seconds since the previous tick
    pub delta_time: f32,
    pub time_scale: f32,
}

impl FrameTime {
    pub fn new(delta_time: f32, time_scale: f32) -> Self {
        Self {
            delta_time,
            time_scale,
        }
    }

    /// Seconds of game time this tick covers.
    pub fn scaled_delta(&self) -> f32 {
        self.delta_time * self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.time_scale == 0.0
    }
}

impl Default for FrameTime {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Frame counter and accumulated time
#[derive(Debug, Default)]
pub struct FrameClock {
    frame_count: u64,
    unscaled: Duration,
    scaled_seconds: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn advance(&mut self, time: FrameTime) {
        self.frame_count += 1;
        // Negative, non-finite or unrepresentable deltas are not time.
        if time.delta_time > 0.0 {
            if let Ok(delta) = Duration::try_from_secs_f32(time.delta_time) {
                self.unscaled = self.unscaled.saturating_add(delta);
            }
        }
        let scaled = f64::from(time.scaled_delta());
        if scaled.is_finite() {
            self.scaled_seconds += scaled;
        }
    }

    pub fn unscaled_time(&self) -> Duration {
        self.unscaled
    }

    pub fn scaled_time(&self) -> f64 {
        self.scaled_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_delta_applies_time_scale() {
        let t = FrameTime::new(0.5, 0.5);
        assert_eq!(t.scaled_delta(), 0.25);
        assert!(!t.is_paused());
        assert!(FrameTime::new(0.016, 0.0).is_paused());
    }

    #[test]
    fn clock_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance(FrameTime::new(0.5, 2.0));
        clock.advance(FrameTime::new(0.25, 1.0));
        assert_eq!(clock.frame_count(), 2);
        assert_eq!(clock.unscaled_time(), Duration::from_millis(750));
        assert!((clock.scaled_time() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn clock_ignores_bad_deltas() {
        let mut clock = FrameClock::new();
        clock.advance(FrameTime::new(-1.0, 1.0));
        clock.advance(FrameTime::new(f32::NAN, 1.0));
        clock.advance(FrameTime::new(f32::INFINITY, 1.0));
        clock.advance(FrameTime::new(1.0e30, 1.0));
        assert_eq!(clock.frame_count(), 4);
        assert_eq!(clock.unscaled_time(), Duration::ZERO);
        clock.advance(FrameTime::new(0.5, 1.0));
        assert_eq!(clock.unscaled_time(), Duration::from_millis(500));
    }

    #[test]
    fn unscaled_time_saturates() {
        let mut clock = FrameClock {
            unscaled: Duration::MAX,
            ..FrameClock::default()
        };
        clock.advance(FrameTime::new(1.0, 1.0));
        assert_eq!(clock.unscaled_time(), Duration::MAX);
    }
}
