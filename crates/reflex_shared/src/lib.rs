//! # Reflex Blitz Shared
//!
//! Types and constants used by both the game client and the signature service.
//!
//! ## CRITICAL RULE
//!
//! The values in [`constants`] are part of an external contract with the
//! deployed NFT contract (EIP-712 domain, score bound, expiry window).
//! Changing them without redeploying breaks signature verification.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod clock;
pub mod constants;
pub mod protocol;

pub use clock::{Clock, ManualClock, SystemClock};
pub use constants::{
    CUE_JITTER_MAX_MS, CUE_JITTER_MIN_MS, DEFAULT_CHAIN_ID, MAX_SCORE_MICROS, MAX_SUCCESS_MS,
    MIN_PLAUSIBLE_MS, NONCE_FID_MULTIPLIER, SIGNATURE_TTL_SECS,
};
pub use protocol::{
    is_player_address, ApiErrorBody, FidValue, MintSignatureRequest, MintSignatureResponse,
    MINT_SIGNATURE_PATH,
};
