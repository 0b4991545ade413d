//! # Reaction Capture
//!
//! Turns a (cue, tap) timestamp pair into a classified result.
//!
//! | elapsed            | classification |
//! |--------------------|----------------|
//! | tap before cue     | `TooEarly`     |
//! | `< 10 ms`          | `TooFast`      |
//! | `10 ..= 5000 ms`   | `Success`      |
//! | `> 5000 ms`        | `TooSlow`      |

use reflex_shared::{MAX_SUCCESS_MS, MIN_PLAUSIBLE_MS};

/// Outcome class of a tap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Tapped while the cue was still hidden.
    TooEarly,
    /// Faster than a human can react.
    TooFast,
    /// A valid, mintable reaction.
    Success,
    /// Cue was visible for too long.
    TooSlow,
}

/// One resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReactionResult {
    /// Tap time minus cue time, in microseconds. Zero for `TooEarly`.
    pub elapsed_microseconds: u64,
    /// How the tap was judged.
    pub classification: Classification,
}

impl ReactionResult {
    /// Result of a tap that arrived before the cue.
    #[must_use]
    pub const fn too_early() -> Self {
        Self {
            elapsed_microseconds: 0,
            classification: Classification::TooEarly,
        }
    }

    /// Score to submit for minting, if this result may be minted.
    ///
    /// Only a `Success` with a positive score qualifies.
    #[must_use]
    pub const fn mintable_score(&self) -> Option<u64> {
        match self.classification {
            Classification::Success if self.elapsed_microseconds > 0 => {
                Some(self.elapsed_microseconds)
            }
            _ => None,
        }
    }

    /// Player-facing result text.
    #[must_use]
    pub fn message(&self) -> String {
        match self.classification {
            Classification::TooEarly => "Too early! Wait for the flash.".to_string(),
            Classification::TooFast => "Too fast! That tap doesn't look human.".to_string(),
            Classification::Success => {
                let seconds = self.elapsed_microseconds as f64 / 1_000_000.0;
                format!("Success! Your time: {seconds:.3}s")
            }
            Classification::TooSlow => "Too slow! Try again.".to_string(),
        }
    }
}

/// Classifies a tap against the moment the cue became visible.
///
/// # Arguments
///
/// * `cue_visible_ms` - Epoch milliseconds when the tap control appeared
/// * `tap_ms` - Epoch milliseconds of the tap
#[must_use]
pub fn classify(cue_visible_ms: u64, tap_ms: u64) -> ReactionResult {
    let Some(elapsed_ms) = tap_ms.checked_sub(cue_visible_ms) else {
        return ReactionResult::too_early();
    };

    let classification = if elapsed_ms < MIN_PLAUSIBLE_MS {
        Classification::TooFast
    } else if elapsed_ms <= MAX_SUCCESS_MS {
        Classification::Success
    } else {
        Classification::TooSlow
    };

    ReactionResult {
        elapsed_microseconds: elapsed_ms.saturating_mul(1_000),
        classification,
    }
}
