//! Simulated vehicle speed.

use rand::Rng;

/// Default mean speed in km/h.
pub const DEFAULT_BASE_SPEED_KMH: f64 = 35.0;

/// Default spread around the mean in km/h.
pub const DEFAULT_SPEED_JITTER_KMH: f64 = 10.0;

/// Uniform speed around a base value: `base ± jitter`, never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedModel {
    pub base_kmh: f64,
    pub jitter_kmh: f64,
}

impl Default for SpeedModel {
    fn default() -> Self {
        Self {
            base_kmh: DEFAULT_BASE_SPEED_KMH,
            jitter_kmh: DEFAULT_SPEED_JITTER_KMH,
        }
    }
}

impl SpeedModel {
    pub fn new(base_kmh: f64, jitter_kmh: f64) -> Self {
        Self {
            base_kmh,
            jitter_kmh,
        }
    }

    /// Draws a speed using the thread-local generator.
    pub fn sample(&self) -> f64 {
        self.sample_with(&mut rand::rng())
    }

    /// Draws a speed from `rng`.
    ///
    /// The offset is `jitter` scaled by a unit draw, so huge jitter values
    /// cannot overflow the sampled range. Non-finite jitter counts as none.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let jitter = self.jitter_kmh.abs();
        let speed = if jitter.is_finite() && jitter > 0.0 {
            self.base_kmh + jitter * rng.random_range(-1.0f64..=1.0)
        } else {
            self.base_kmh
        };
        if speed.is_finite() {
            speed.max(0.0)
        } else {
            0.0
        }
    }
}
