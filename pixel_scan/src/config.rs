// THEORY:
// Tunable knobs for the engine, kept as plain structs with public fields so that
// callers can build them literally or start from `Default` and override a field.

use crate::core_modules::color_math::Rgb;

/// Per-view configuration, inherited by sub-views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// The opaque color translucent pixels are composited against before hue,
    /// saturation or luminance are derived. Defaults to white.
    pub background: Rgb,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            background: Rgb::WHITE,
        }
    }
}

/// Pacing of trace playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackRate {
    /// Target number of draw operations per second.
    pub draws_per_second: f64,
    /// The assumed rate of the tick source driving playback.
    pub ticks_per_second: f64,
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self {
            draws_per_second: 60.0,
            ticks_per_second: 60.0,
        }
    }
}

impl PlaybackRate {
    pub fn new(draws_per_second: f64) -> Self {
        Self {
            draws_per_second,
            ..Self::default()
        }
    }

    /// Draw operations allowed per tick; never less than one.
    pub fn draws_per_tick(&self) -> usize {
        let ratio = (self.draws_per_second / self.ticks_per_second).round();
        if ratio.is_finite() && ratio >= 1.0 {
            ratio as usize
        } else {
            1
        }
    }

    /// Interval between ticks.
    pub fn tick_period(&self) -> std::time::Duration {
        if self.ticks_per_second > 0.0 {
            std::time::Duration::from_secs_f64(1.0 / self.ticks_per_second)
        } else {
            std::time::Duration::from_millis(16)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_follows_rate_ratio() {
        assert_eq!(PlaybackRate::new(600.0).draws_per_tick(), 10);
        assert_eq!(PlaybackRate::new(90.0).draws_per_tick(), 2);
        assert_eq!(PlaybackRate::new(10.0).draws_per_tick(), 1);
        assert_eq!(PlaybackRate::new(0.0).draws_per_tick(), 1);
        let custom = PlaybackRate {
            draws_per_second: 100.0,
            ticks_per_second: 20.0,
        };
        assert_eq!(custom.draws_per_tick(), 5);
    }
}
