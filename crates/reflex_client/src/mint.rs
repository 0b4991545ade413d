//! # Mint Orchestrator
//!
//! Two-phase redemption of a successful reaction.
//!
//! ```text
//!  subscribe(player)
//!        │
//!        ▼
//!  ┌─────────────┐  Phase 1  ┌──────────────────┐  Phase 2  ┌───────────────┐
//!  │ ReactionRes │ ────────▶ │ signature service│ ────────▶ │ NFT contract  │
//!  │ (Success)   │           │ (nonce, expiry)  │           │ mintWithSig   │
//!  └─────────────┘           └──────────────────┘           └───────┬───────┘
//!                                                       receipt      │
//!                                                       NFTMinted ◀──┘
//! ```
//!
//! The subscription is opened before anything is submitted so the mint
//! event cannot slip past. Success is declared only on `NFTMinted` for the
//! player, not on the receipt. Nothing is retried: a new attempt re-runs
//! phase 1 and gets a fresh nonce.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use reflex_blockchain::{
    ChainError, ChainEvent, EventListener, MintCall, MintRejection, NftContract, Subscription,
    TxHash,
};
use reflex_session::ReactionResult;
use reflex_shared::MintSignatureRequest;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::deadline::{with_deadline, CancelToken, DeadlineError};
use crate::signature_client::{truncate_for_display, SignatureFetchError, SignatureSource};

/// Connected wallet as seen by the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletContext {
    /// Connected account.
    pub player: Option<Address>,
    /// Chain the wallet is on.
    pub chain_id: Option<u64>,
}

impl WalletContext {
    /// Wallet connected as `player` on `chain_id`.
    #[must_use]
    pub const fn connected(player: Address, chain_id: u64) -> Self {
        Self {
            player: Some(player),
            chain_id: Some(chain_id),
        }
    }
}

/// A confirmed mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintOutcome {
    /// Token assigned by the contract.
    pub token_id: U256,
    /// Rank assigned by the contract.
    pub rank: String,
    /// Minted score, microseconds.
    pub score: u64,
    /// Mint transaction.
    pub tx_hash: TxHash,
}

/// Why a mint did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    /// No successful result with a positive score.
    #[error("Only a successful reaction can be minted.")]
    NotMintable,

    /// Wallet not connected.
    #[error("Please connect your wallet to mint.")]
    NotConnected,

    /// Wallet on the wrong chain.
    #[error("Please switch to {0} to mint.")]
    WrongNetwork(String),

    /// Phase 1 failed; carries display-ready text.
    #[error("{0}")]
    Signature(String),

    /// The signature response does not describe this mint.
    #[error("Signature response does not match the request.")]
    SignatureMismatch,

    /// Wallet or RPC failure.
    #[error("Error: {}", .0.short_message())]
    Chain(ChainError),

    /// The NFT contract refused the mint.
    #[error("{0}")]
    Rejected(MintRejection),

    /// The transaction landed but reverted.
    #[error("Mint transaction failed.")]
    TransactionFailed(TxHash),

    /// A step ran past its deadline.
    #[error("Timed out waiting for {0}.")]
    Timeout(&'static str),

    /// The owner cancelled the flow.
    #[error("Minting cancelled.")]
    Cancelled,
}

impl MintError {
    fn from_deadline(error: DeadlineError, stage: &'static str) -> Self {
        match error {
            DeadlineError::TimedOut => Self::Timeout(stage),
            DeadlineError::Cancelled => Self::Cancelled,
        }
    }

    fn from_submit(error: ChainError) -> Self {
        match error {
            ChainError::Reverted(reason) => Self::Rejected(MintRejection::from_reason(&reason)),
            other => Self::Chain(other),
        }
    }
}

/// Result type for minting.
pub type MintResult<T> = Result<T, MintError>;

/// Sequences signature acquisition and on-chain redemption.
pub struct MintOrchestrator {
    config: ClientConfig,
    signatures: Arc<dyn SignatureSource>,
    nft: Arc<dyn NftContract>,
    listener: Arc<EventListener>,
}

impl MintOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        signatures: Arc<dyn SignatureSource>,
        nft: Arc<dyn NftContract>,
        listener: Arc<EventListener>,
    ) -> Self {
        Self {
            config,
            signatures,
            nft,
            listener,
        }
    }

    /// Mints `result` for the connected player.
    ///
    /// # Arguments
    ///
    /// * `wallet` - Connected wallet
    /// * `result` - The round to mint; must be a positive `Success`
    /// * `fid` - Optional session id forwarded to the signature service
    /// * `cancel` - Aborts any pending step
    ///
    /// # Errors
    ///
    /// See [`MintError`]. Preconditions are checked before any network call.
    pub async fn mint(
        &self,
        wallet: &WalletContext,
        result: &ReactionResult,
        fid: Option<u64>,
        cancel: &CancelToken,
    ) -> MintResult<MintOutcome> {
        let score = result.mintable_score().ok_or(MintError::NotMintable)?;
        let player = wallet.player.ok_or(MintError::NotConnected)?;
        if wallet.chain_id != Some(self.config.chain_id) {
            return Err(MintError::WrongNetwork(self.config.network_name.clone()));
        }

        let mut events = self.listener.subscribe(player);

        let call = self.fetch_signature(player, score, fid, cancel).await?;
        let tx_hash = self.submit(&call, cancel).await?;
        let (token_id, rank) = self.await_minted(&mut events, player, cancel).await?;

        tracing::info!(
            "Minted token {} ({}) for {} with score {}us in {}",
            token_id,
            rank,
            player,
            score,
            tx_hash
        );
        Ok(MintOutcome {
            token_id,
            rank,
            score,
            tx_hash,
        })
    }

    async fn fetch_signature(
        &self,
        player: Address,
        score: u64,
        fid: Option<u64>,
        cancel: &CancelToken,
    ) -> MintResult<MintCall> {
        let request = MintSignatureRequest {
            player_address: player.to_string(),
            score,
            fid: fid.map(reflex_shared::FidValue::Number),
        };

        let response = with_deadline(
            self.signatures.request_signature(&request),
            self.config.signature_timeout,
            cancel,
        )
        .await
        .map_err(|e| MintError::from_deadline(e, "the mint signature"))?
        .map_err(|e: SignatureFetchError| {
            MintError::Signature(truncate_for_display(&e.to_string(), self.config.message_limit))
        })?;

        let call = MintCall::from_response(&response).map_err(MintError::Chain)?;
        let signed = &call.authorization;
        if signed.player != player
            || signed.score != U256::from(score)
            || signed.contract != self.config.nft_contract
        {
            tracing::warn!("Signature response for {} does not match the request", signed.player);
            return Err(MintError::SignatureMismatch);
        }
        Ok(call)
    }

    async fn submit(&self, call: &MintCall, cancel: &CancelToken) -> MintResult<TxHash> {
        let limit = self.config.tx_timeout;

        let price = with_deadline(self.nft.mint_price(), limit, cancel)
            .await
            .map_err(|e| MintError::from_deadline(e, "the mint price"))?
            .map_err(MintError::Chain)?;

        let tx_hash = with_deadline(self.nft.mint_with_signature(call, price), limit, cancel)
            .await
            .map_err(|e| MintError::from_deadline(e, "the mint transaction"))?
            .map_err(|e| {
                let error = MintError::from_submit(e);
                tracing::warn!("Mint rejected: {}", error);
                error
            })?;

        let receipt = with_deadline(self.nft.wait_for_receipt(tx_hash), limit, cancel)
            .await
            .map_err(|e| MintError::from_deadline(e, "the mint confirmation"))?
            .map_err(MintError::from_submit)?;
        if !receipt.success {
            tracing::warn!("Mint transaction {} reverted", tx_hash);
            return Err(MintError::TransactionFailed(tx_hash));
        }
        Ok(tx_hash)
    }

    async fn await_minted(
        &self,
        events: &mut Subscription,
        player: Address,
        cancel: &CancelToken,
    ) -> MintResult<(U256, String)> {
        let wait = async {
            while let Some(event) = events.recv().await {
                match event {
                    ChainEvent::NftMinted(minted) if minted.player == player => {
                        return Some((minted.token_id, minted.rank));
                    }
                    other => tracing::debug!("Ignoring {:?} while waiting for mint", other),
                }
            }
            None
        };

        with_deadline(wait, self.config.event_timeout, cancel)
            .await
            .map_err(|e| MintError::from_deadline(e, "the mint event"))?
            .ok_or_else(|| MintError::Chain(ChainError::Network("event stream closed".into())))
    }
}
