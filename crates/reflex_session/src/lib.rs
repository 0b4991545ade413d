//! # Reflex Blitz Session
//!
//! The clock-driven round protocol and reaction measurement.
//!
//! Everything here is synchronous and takes time as an argument; the game
//! controller owns the timers and feeds results back in. That keeps the
//! fairness rules (reveal drawn after confirmation, stale timers ignored,
//! early taps fatal) testable without a runtime.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod jitter;
pub mod reaction;
pub mod session;

pub use jitter::{DelaySource, FixedDelay, RevealJitter};
pub use reaction::{classify, Classification, ReactionResult};
pub use session::{
    PlaySession, RevealSchedule, SessionClock, SessionError, SessionResult, SessionState,
};
