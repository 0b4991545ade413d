//! # Reveal Jitter
//!
//! The reveal delay is the fairness mechanism of a round: it is drawn only
//! after the flash request is confirmed on-chain, so no earlier response can
//! leak it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use reflex_shared::{CUE_JITTER_MAX_MS, CUE_JITTER_MIN_MS};

/// Produces reveal delays in milliseconds.
pub trait DelaySource: Send + Sync {
    /// Draws the next delay.
    fn next_delay_ms(&mut self) -> u64;
}

impl<D: DelaySource + ?Sized> DelaySource for Box<D> {
    fn next_delay_ms(&mut self) -> u64 {
        (**self).next_delay_ms()
    }
}

/// Uniform delay in `[CUE_JITTER_MIN_MS, CUE_JITTER_MAX_MS)` from ChaCha20.
#[derive(Debug)]
pub struct RevealJitter {
    rng: ChaCha20Rng,
}

impl RevealJitter {
    /// Seeds from operating-system entropy. Use this in production.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Deterministic stream for tests and replays.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl DelaySource for RevealJitter {
    #[inline]
    fn next_delay_ms(&mut self) -> u64 {
        self.rng.gen_range(CUE_JITTER_MIN_MS..CUE_JITTER_MAX_MS)
    }
}

/// Always returns the same delay.
#[derive(Clone, Copy, Debug)]
pub struct FixedDelay(pub u64);

impl DelaySource for FixedDelay {
    fn next_delay_ms(&mut self) -> u64 {
        self.0
    }
}
