//! # Contract Traits
//!
//! The wallet / RPC client is an external collaborator. The game only needs
//! three kinds of operation from it: read a view function, submit a
//! transaction, and wait for its receipt. Each contract gets one trait.
//!
//! ```text
//! GameContract ──┐
//!                ├── implemented by the wallet adapter (or MockChain)
//! NftContract  ──┘
//! ```

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use thiserror::Error;

use crate::contracts::MintCall;

/// Transaction hash.
pub type TxHash = B256;

/// Errors surfaced by a contract call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// RPC or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The wallet owner declined to sign.
    #[error("user rejected the request")]
    UserRejected,

    /// The call or transaction reverted. Carries the revert reason or
    /// custom error name as reported by the RPC client.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// A returned value could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The call did not complete before its deadline.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl ChainError {
    /// Short message suitable for display.
    #[must_use]
    pub fn short_message(&self) -> String {
        match self {
            Self::Network(msg) | Self::Reverted(msg) | Self::Decode(msg) | Self::Timeout(msg) => {
                msg.clone()
            }
            Self::UserRejected => "User rejected the request.".to_string(),
        }
    }
}

/// Result type for contract calls.
pub type ChainResult<T> = Result<T, ChainError>;

/// Outcome of a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the transaction.
    pub tx_hash: TxHash,
    /// Block the transaction landed in.
    pub block_number: u64,
    /// False if the transaction landed but reverted.
    pub success: bool,
}

/// The game-session contract (`VRFReflexBlitz`).
#[async_trait]
pub trait GameContract: Send + Sync {
    /// Price of a paid round, in wei.
    async fn play_price(&self) -> ChainResult<U256>;

    /// Seconds between free-play sessions.
    async fn free_play_interval(&self) -> ChainResult<u64>;

    /// Free plays granted per session.
    async fn plays_per_session(&self) -> ChainResult<u32>;

    /// Free plays the player has left in the current session.
    async fn remaining_plays(&self, player: Address) -> ChainResult<u32>;

    /// Seconds until the player's next free session.
    async fn remaining_cooldown(&self, player: Address) -> ChainResult<u64>;

    /// Submits `requestFlash()` from `player` with `value` attached.
    async fn request_flash(&self, player: Address, value: U256) -> ChainResult<TxHash>;

    /// Waits until the transaction is included.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceipt>;
}

/// The achievement NFT contract (`ReflexBlitzNFT`).
#[async_trait]
pub trait NftContract: Send + Sync {
    /// Price of a mint, in wei.
    async fn mint_price(&self) -> ChainResult<U256>;

    /// Rank label the contract assigns to `score`.
    async fn rank_for_score(&self, score: U256) -> ChainResult<String>;

    /// Submits `mintWithSignature(...)` with `value` attached.
    async fn mint_with_signature(&self, call: &MintCall, value: U256) -> ChainResult<TxHash>;

    /// Waits until the transaction is included.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceipt>;
}
