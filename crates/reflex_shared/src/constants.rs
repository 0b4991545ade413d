//! # Game & Chain Constants
//!
//! **CRITICAL:** The EIP-712 defaults and the score bound must match the
//! deployed `ReflexBlitzNFT` contract.

// =============================================================================
// REACTION TIMING
// =============================================================================

/// Lower bound (inclusive) of the reveal jitter, in milliseconds.
pub const CUE_JITTER_MIN_MS: u64 = 2_000;

/// Upper bound (exclusive) of the reveal jitter, in milliseconds.
pub const CUE_JITTER_MAX_MS: u64 = 5_000;

/// Taps faster than this after the cue are physiologically implausible.
pub const MIN_PLAUSIBLE_MS: u64 = 10;

/// Slowest tap (inclusive) still counted as a success.
pub const MAX_SUCCESS_MS: u64 = 5_000;

// =============================================================================
// SIGNATURE ISSUANCE
// =============================================================================

/// Largest score the signer will attest to (100 seconds in microseconds).
pub const MAX_SCORE_MICROS: u64 = 100_000_000;

/// Lifetime of an issued signature.
pub const SIGNATURE_TTL_SECS: u64 = 3_600;

/// `nonce = fid * NONCE_FID_MULTIPLIER + epoch_millis`.
pub const NONCE_FID_MULTIPLIER: u64 = 1_000_000_000;

// =============================================================================
// CHAIN CONFIGURATION - MONAD TESTNET
// =============================================================================

/// Monad Testnet chain id.
pub const DEFAULT_CHAIN_ID: u64 = 10_143;

/// Display name of the expected network.
pub const DEFAULT_NETWORK_NAME: &str = "Monad Testnet";

/// EIP-712 domain name used by the NFT contract constructor.
pub const DEFAULT_DOMAIN_NAME: &str = "ReflexBlitz Achievement NFT";

/// EIP-712 domain version used by the NFT contract constructor.
pub const DEFAULT_DOMAIN_VERSION: &str = "1";
