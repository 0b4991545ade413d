//! # Nonce and Expiry
//!
//! ```text
//! nonce  = fid * 1_000_000_000 + epochMillis    (fid present and non-zero)
//! nonce  = epochMillis                          (otherwise)
//! expiry = epochSeconds + 3600
//! ```
//!
//! Two requests without a `fid` in the same millisecond get the same
//! nonce. That is accepted: the NFT contract's used-nonce set rejects the
//! second redemption. Nothing is remembered between requests.

use alloy_primitives::U256;
use reflex_shared::{NONCE_FID_MULTIPLIER, SIGNATURE_TTL_SECS};

/// Derives the nonce for a request.
#[must_use]
pub fn derive_nonce(fid: Option<u64>, now_ms: u64) -> U256 {
    match fid {
        Some(fid) if fid > 0 => {
            U256::from(fid) * U256::from(NONCE_FID_MULTIPLIER) + U256::from(now_ms)
        }
        _ => U256::from(now_ms),
    }
}

/// Expiry for a signature issued at `now_secs`.
#[inline]
#[must_use]
pub const fn derive_expiry(now_secs: u64) -> u64 {
    now_secs + SIGNATURE_TTL_SECS
}
