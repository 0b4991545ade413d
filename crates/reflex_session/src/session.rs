//! # Session Clock
//!
//! State machine of a single play round.
//!
//! ```text
//!            flash confirmed            reveal due               tap
//!   Idle ─────────────────────▶ AwaitingCue ─────────▶ CueVisible ─────▶ Resolved
//!    ▲                              │  tap (TooEarly)                       │
//!    │                              └───────────────────────────────────────┤
//!    └──────────────────── close result / disconnect / network change ◀─────┘
//! ```
//!
//! Every transition into or out of a round bumps a generation counter. A
//! reveal timer carries the generation it was scheduled under, so a timer
//! that fires after the round ended (early tap, close, disconnect) is a
//! no-op.

use alloy_primitives::Address;
use thiserror::Error;

use crate::jitter::DelaySource;
use crate::reaction::{classify, ReactionResult};

/// Where the current round stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No round.
    Idle,
    /// Flash confirmed, cue still hidden.
    AwaitingCue,
    /// Cue shown, waiting for the tap.
    CueVisible,
    /// Result decided and on display.
    Resolved,
}

/// Rejected session transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No wallet is connected.
    #[error("no player connected")]
    NoPlayer,

    /// The event belongs to somebody else.
    #[error("event for {got} while tracking {expected}")]
    ForeignPlayer {
        /// Tracked player.
        expected: Address,
        /// Player named in the event.
        got: Address,
    },

    /// A round is already running; duplicate deliveries land here.
    #[error("a round is already in progress")]
    RoundInProgress,

    /// Tap with no round to apply it to.
    #[error("no active round")]
    NoActiveRound,
}

/// Result alias for session transitions.
pub type SessionResult<T> = Result<T, SessionError>;

/// One round of play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaySession {
    /// Player of the round.
    pub player: Address,
    /// On-chain request time, epoch milliseconds.
    pub requested_at_ms: u64,
    /// Local time the cue is scheduled to appear, epoch milliseconds.
    pub reveal_at_ms: u64,
    /// Local time the cue actually appeared.
    pub cue_visible_at_ms: Option<u64>,
    /// Result once resolved.
    pub result: Option<ReactionResult>,
}

/// Timer request produced when a round starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealSchedule {
    /// Generation the timer must present back.
    pub generation: u64,
    /// Delay from now until the reveal.
    pub delay_ms: u64,
    /// Absolute reveal time, epoch milliseconds.
    pub reveal_at_ms: u64,
}

/// The round state machine. Owns no timers; the caller schedules
/// [`RevealSchedule`]s and reports back through [`SessionClock::on_reveal_due`].
#[derive(Debug)]
pub struct SessionClock<D> {
    player: Option<Address>,
    state: SessionState,
    session: Option<PlaySession>,
    generation: u64,
    delays: D,
}

impl<D: DelaySource> SessionClock<D> {
    /// Creates an idle clock with no player.
    #[must_use]
    pub const fn new(delays: D) -> Self {
        Self {
            player: None,
            state: SessionState::Idle,
            session: None,
            generation: 0,
            delays,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current round, if any.
    #[inline]
    #[must_use]
    pub const fn session(&self) -> Option<&PlaySession> {
        self.session.as_ref()
    }

    /// Tracked player.
    #[inline]
    #[must_use]
    pub const fn player(&self) -> Option<Address> {
        self.player
    }

    /// Generation of the live round (or of the last reset).
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// True if a new flash may be requested.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Switches the tracked player (connect, disconnect, account change).
    /// Always ends the current round.
    pub fn set_player(&mut self, player: Option<Address>) {
        if self.player != player {
            tracing::info!("Session player changed: {:?} -> {:?}", self.player, player);
            self.player = player;
        }
        self.reset();
    }

    /// Starts a round from a confirmed flash request.
    ///
    /// # Arguments
    ///
    /// * `player` - Player named in the on-chain event
    /// * `requested_at_ms` - On-chain request time
    /// * `now_ms` - Local time the event was observed
    ///
    /// # Errors
    ///
    /// Fails without changing state if no player is tracked, the event is
    /// for another player, or a round is already running.
    pub fn on_flash_requested(
        &mut self,
        player: Address,
        requested_at_ms: u64,
        now_ms: u64,
    ) -> SessionResult<RevealSchedule> {
        let expected = self.player.ok_or(SessionError::NoPlayer)?;
        if player != expected {
            return Err(SessionError::ForeignPlayer {
                expected,
                got: player,
            });
        }
        if self.state != SessionState::Idle {
            tracing::debug!("Duplicate flash event for {} ignored in {:?}", player, self.state);
            return Err(SessionError::RoundInProgress);
        }

        let delay_ms = self.delays.next_delay_ms();
        let reveal_at_ms = now_ms + delay_ms;
        self.generation += 1;
        self.state = SessionState::AwaitingCue;
        self.session = Some(PlaySession {
            player,
            requested_at_ms,
            reveal_at_ms,
            cue_visible_at_ms: None,
            result: None,
        });
        tracing::info!(
            "Round {} started for {}: Idle -> AwaitingCue",
            self.generation,
            player
        );

        Ok(RevealSchedule {
            generation: self.generation,
            delay_ms,
            reveal_at_ms,
        })
    }

    /// Reveal timer fired.
    ///
    /// # Returns
    ///
    /// `true` if the cue is now visible; `false` if the timer was stale.
    pub fn on_reveal_due(&mut self, generation: u64, now_ms: u64) -> bool {
        if generation != self.generation || self.state != SessionState::AwaitingCue {
            tracing::debug!(
                "Stale reveal for round {} ignored (current {}, {:?})",
                generation,
                self.generation,
                self.state
            );
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        session.cue_visible_at_ms = Some(now_ms);
        self.state = SessionState::CueVisible;
        tracing::info!("Round {}: AwaitingCue -> CueVisible", self.generation);
        true
    }

    /// Applies a tap.
    ///
    /// A tap while the cue is hidden resolves the round as `TooEarly`
    /// no matter how close to the reveal it lands.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveRound`] if nothing is waiting for a tap.
    pub fn on_tap(&mut self, now_ms: u64) -> SessionResult<ReactionResult> {
        let result = match (self.state, self.session.as_ref()) {
            (SessionState::AwaitingCue, Some(_)) => ReactionResult::too_early(),
            (SessionState::CueVisible, Some(PlaySession {
                cue_visible_at_ms: Some(cue),
                ..
            })) => classify(*cue, now_ms),
            _ => return Err(SessionError::NoActiveRound),
        };

        if let Some(session) = self.session.as_mut() {
            session.result = Some(result);
        }
        tracing::info!(
            "Round {}: {:?} -> Resolved ({:?}, {}us)",
            self.generation,
            self.state,
            result.classification,
            result.elapsed_microseconds
        );
        self.state = SessionState::Resolved;
        Ok(result)
    }

    /// Closes the result and returns to `Idle`.
    pub fn close_result(&mut self) {
        self.reset();
    }

    /// Ends any round and invalidates outstanding reveal timers.
    pub fn reset(&mut self) {
        if self.state != SessionState::Idle {
            tracing::info!("Round {}: {:?} -> Idle", self.generation, self.state);
        }
        self.generation += 1;
        self.state = SessionState::Idle;
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::{FixedDelay, RevealJitter};
    use crate::reaction::Classification;

    const T0: u64 = 1_700_000_000_000;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn clock_for(player: Address) -> SessionClock<RevealJitter> {
        let mut clock = SessionClock::new(RevealJitter::from_seed(1));
        clock.set_player(Some(player));
        clock
    }

    #[test]
    fn test_end_to_end_success() {
        let mut clock = clock_for(alice());
        let schedule = clock.on_flash_requested(alice(), T0, T0).unwrap();
        assert!((2_000..5_000).contains(&schedule.delay_ms));
        assert_eq!(schedule.reveal_at_ms, T0 + schedule.delay_ms);
        assert_eq!(clock.state(), SessionState::AwaitingCue);

        assert!(clock.on_reveal_due(schedule.generation, schedule.reveal_at_ms));
        assert_eq!(clock.state(), SessionState::CueVisible);

        let result = clock.on_tap(schedule.reveal_at_ms + 50).unwrap();
        assert_eq!(result.classification, Classification::Success);
        assert_eq!(result.elapsed_microseconds, 50_000);
        assert_eq!(clock.state(), SessionState::Resolved);
    }

    #[test]
    fn test_early_tap_then_stale_timer() {
        let mut clock = clock_for(alice());
        let schedule = clock.on_flash_requested(alice(), T0, T0).unwrap();

        let result = clock.on_tap(schedule.reveal_at_ms - 1).unwrap();
        assert_eq!(result.classification, Classification::TooEarly);
        assert_eq!(clock.state(), SessionState::Resolved);

        assert!(!clock.on_reveal_due(schedule.generation, schedule.reveal_at_ms));
        assert_eq!(clock.state(), SessionState::Resolved);
        assert_eq!(clock.session().unwrap().result, Some(result));
        assert_eq!(clock.on_tap(schedule.reveal_at_ms + 100), Err(SessionError::NoActiveRound));
    }

    #[test]
    fn test_timer_from_closed_round_cannot_reveal_next_round() {
        let mut clock = SessionClock::new(FixedDelay(3_000));
        clock.set_player(Some(alice()));

        let first = clock.on_flash_requested(alice(), T0, T0).unwrap();
        clock.on_tap(T0 + 10).unwrap();
        clock.close_result();
        assert!(clock.is_idle());

        let second = clock.on_flash_requested(alice(), T0 + 20, T0 + 20).unwrap();
        assert_ne!(first.generation, second.generation);
        assert!(!clock.on_reveal_due(first.generation, first.reveal_at_ms));
        assert_eq!(clock.state(), SessionState::AwaitingCue);
        assert!(clock.on_reveal_due(second.generation, second.reveal_at_ms));
    }

    #[test]
    fn test_foreign_and_duplicate_events_ignored() {
        let mut clock = clock_for(alice());
        let bob = Address::repeat_byte(0xb0);

        assert!(matches!(
            clock.on_flash_requested(bob, T0, T0),
            Err(SessionError::ForeignPlayer { .. })
        ));
        assert!(clock.is_idle());

        let schedule = clock.on_flash_requested(alice(), T0, T0).unwrap();
        assert_eq!(
            clock.on_flash_requested(alice(), T0, T0 + 5),
            Err(SessionError::RoundInProgress)
        );
        assert_eq!(clock.generation(), schedule.generation);
    }

    #[test]
    fn test_disconnect_cancels_round() {
        let mut clock = clock_for(alice());
        let schedule = clock.on_flash_requested(alice(), T0, T0).unwrap();

        clock.set_player(None);
        assert!(clock.is_idle());
        assert!(!clock.on_reveal_due(schedule.generation, schedule.reveal_at_ms));
        assert_eq!(
            clock.on_flash_requested(alice(), T0, T0),
            Err(SessionError::NoPlayer)
        );
    }

    #[test]
    fn test_slow_tap() {
        let mut clock = SessionClock::new(FixedDelay(2_000));
        clock.set_player(Some(alice()));
        let schedule = clock.on_flash_requested(alice(), T0, T0).unwrap();
        clock.on_reveal_due(schedule.generation, schedule.reveal_at_ms);

        let result = clock.on_tap(schedule.reveal_at_ms + 6_000).unwrap();
        assert_eq!(result.classification, Classification::TooSlow);
        assert_eq!(result.mintable_score(), None);
    }
}
