//! Output duration composition across trim, speed and loop.

use crate::options::EditOptions;

/// Floor applied to the speed divisor. Near-zero speeds would
/// otherwise explode the effective duration fed to the bitrate
/// planner.
pub const MIN_SPEED_DIVISOR: f64 = 0.25;

impl EditOptions {
    /// The `[start, end)` trim window in seconds.
    ///
    /// Trim bounds are validated by the caller; an absent end means
    /// the full source duration.
    pub fn trim_window(&self) -> (f64, f64) {
        let start = self.trim_start.unwrap_or(0.0);
        let end = self.trim_end.unwrap_or(self.source_duration_secs);
        (start, end)
    }

    /// Duration of the output as the viewer will experience it:
    /// trimmed window, repeated `loop_count` times, divided by speed.
    pub fn effective_duration(&self) -> f64 {
        let (start, end) = self.trim_window();
        ((end - start) * self.loop_count as f64) / self.speed.max(MIN_SPEED_DIVISOR)
    }
}

#[cfg(test)]
mod tests {
    use crate::options::{Container, EditOptions};

    fn options(duration: f64) -> EditOptions {
        EditOptions::new(500_000, Container::Mp4, 320, 240, duration)
    }

    #[test]
    fn test_untouched_clip_keeps_source_duration() {
        assert_eq!(options(3.0).effective_duration(), 3.0);
    }

    #[test]
    fn test_speed_scales_inversely() {
        assert_eq!(options(3.0).with_speed(2.0).effective_duration(), 1.5);
    }

    #[test]
    fn test_loop_scales_linearly() {
        assert_eq!(options(3.0).with_loop_count(2).effective_duration(), 6.0);
    }

    #[test]
    fn test_trim_speed_loop_compose() {
        let opts = options(3.0).with_trim(1.0, 2.0).with_speed(0.5).with_loop_count(2);
        assert_eq!(opts.effective_duration(), 4.0);
    }

    #[test]
    fn test_speed_divisor_floor() {
        // 3s at speed 0.1 is capped by the 0.25 divisor floor.
        assert_eq!(options(3.0).with_speed(0.1).effective_duration(), 12.0);
    }

    #[test]
    fn test_trim_window_defaults_to_full_source() {
        assert_eq!(options(3.0).trim_window(), (0.0, 3.0));
        assert_eq!(options(3.0).with_trim(1.0, 2.5).trim_window(), (1.0, 2.5));
    }
}
