//! # Reflex Blitz Contract Bridge
//!
//! Everything the game and the signature service need to talk about the two
//! deployed contracts without owning an RPC client.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    Logs     ┌─────────────────┐  per player  ┌──────────────┐
//! │  VRFReflexBlitz │ ──────────▶ │  EventListener  │ ───────────▶ │ Subscription │
//! │  ReflexBlitzNFT │             └─────────────────┘              └──────────────┘
//! └────────▲────────┘
//!          │ requestFlash / mintWithSignature
//! ┌────────┴────────┐   EIP-712   ┌───────────────────┐
//! │  GameContract   │ ◀────────── │ MintAuthorization │
//! │  NftContract    │             │ TypedSignature    │
//! └─────────────────┘             └───────────────────┘
//! ```
//!
//! The signer hashes a [`MintAuthorization`] exactly the way the NFT
//! contract does, and the client turns the signer's response into a
//! [`MintCall`]. Both sides share this crate so the two encodings cannot
//! drift apart.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chain;
pub mod contracts;
pub mod events;
pub mod listener;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod revert;
pub mod state;
pub mod typed_data;

pub use chain::{ChainError, ChainResult, GameContract, NftContract, TxHash, TxReceipt};
pub use contracts::MintCall;
pub use events::{ChainEvent, EventEncoder, EventParser, FlashRequested, NftMinted};
pub use listener::{EventListener, ListenerConfig, ListenerStats, Subscription};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockChain, MockConfig};
pub use revert::MintRejection;
pub use state::{MintedToken, PlayerChainState};
pub use typed_data::{address_of, MintAuthorization, MintDomain, SignatureError, TypedSignature};
