//! Randomized delay source.

use super::error::DelayError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Inclusive range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayBounds {
    min: Duration,
    max: Duration,
}

impl DelayBounds {
    /// Create bounds, rejecting `max < min`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, DelayError> {
        if max < min {
            return Err(DelayError::InvalidBounds {
                min_ms: min.as_millis() as u64,
                max_ms: max.as_millis() as u64,
            });
        }
        Ok(Self { min, max })
    }

    /// Bounds from millisecond values.
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, DelayError> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// Degenerate bounds that always yield `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

/// Source of randomized wait durations.
pub trait DelayProvider {
    /// Draw a delay within `bounds` (both ends inclusive).
    fn next_delay(&mut self, bounds: &DelayBounds) -> Duration;
}

/// Uniformly distributed delays from a seedable RNG.
#[derive(Debug, Clone)]
pub struct RandomDelayProvider {
    rng: StdRng,
}

impl RandomDelayProvider {
    /// Provider seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic provider for reproducible schedules.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDelayProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayProvider for RandomDelayProvider {
    fn next_delay(&mut self, bounds: &DelayBounds) -> Duration {
        if bounds.min == bounds.max {
            return bounds.min;
        }
        self.rng.gen_range(bounds.min..=bounds.max)
    }
}
