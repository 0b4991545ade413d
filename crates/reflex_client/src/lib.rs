//! # Reflex Blitz Client
//!
//! Runs the game against the two contracts and the signature service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  commands   ┌────────────────┐  reads / txs   ┌──────────────┐
//! │  UI / input  │ ──────────▶ │ GameController │ ─────────────▶ │ GameContract │
//! └──────────────┘ ◀────────── │ SessionClock   │ ◀───────────── │ (events)     │
//!                    GameView  └───────┬────────┘                └──────────────┘
//!                                      │ Mint
//!                                      ▼
//!                              ┌────────────────┐  phase 1   ┌───────────────────┐
//!                              │MintOrchestrator│ ─────────▶ │ signature service │
//!                              └───────┬────────┘            └───────────────────┘
//!                                      │ phase 2
//!                                      ▼
//!                              ┌────────────────┐
//!                              │  NftContract   │
//!                              └────────────────┘
//! ```
//!
//! ## RULES
//!
//! - Every network call has a deadline and observes a cancel token
//! - The loading flag is cleared on every exit path
//! - Nothing is retried automatically

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod deadline;
pub mod game;
pub mod mint;
pub mod signature_client;

pub use clock::TokioClock;
pub use config::{ClientConfig, ConfigError};
pub use deadline::{with_deadline, CancelToken, DeadlineError};
pub use game::{GameCommand, GameController, GameHandle, GameServices, GameView};
pub use mint::{MintError, MintOrchestrator, MintOutcome, MintResult, WalletContext};
pub use signature_client::{
    truncate_for_display, HttpSignatureClient, SignatureFetchError, SignatureSource,
};
