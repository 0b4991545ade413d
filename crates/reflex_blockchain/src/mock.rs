//! Mock contracts for testing without a network.
//!
//! Simulates both contracts in memory, including the NFT contract's
//! used-nonce set, expiry and signer checks. Events are emitted into an
//! [`EventListener`] when a receipt is awaited, mirroring the order a real
//! client observes (receipt, then logs).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use reflex_shared::Clock;

use crate::chain::{ChainError, ChainResult, GameContract, NftContract, TxHash, TxReceipt};
use crate::contracts::MintCall;
use crate::events::{ChainEvent, FlashRequested, NftMinted};
use crate::listener::EventListener;
use crate::typed_data::MintDomain;

/// Tunables of the mock contracts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Price of a paid round.
    pub play_price: U256,
    /// Price of a mint.
    pub mint_price: U256,
    /// Free plays per session.
    pub plays_per_session: u32,
    /// Seconds between free sessions.
    pub free_play_interval_secs: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            play_price: U256::from(10_000_000_000_000_000u64),
            mint_price: U256::from(1_000_000_000_000_000u64),
            plays_per_session: 3,
            free_play_interval_secs: 86_400,
        }
    }
}

#[derive(Debug, Default)]
struct Allowance {
    remaining: u32,
    session_started_secs: Option<u64>,
}

#[derive(Debug, Default)]
struct MockState {
    allowances: HashMap<Address, Allowance>,
    used_nonces: HashSet<U256>,
    pending: HashMap<TxHash, Vec<ChainEvent>>,
    next_tx: u64,
    next_token_id: u64,
    block_number: u64,
    fail_next_submit: Option<ChainError>,
    stall_receipts: bool,
    drop_events: bool,
    flash_requests: u64,
    mint_submissions: u64,
}

/// In-memory game and NFT contracts.
#[derive(Clone)]
pub struct MockChain {
    config: MockConfig,
    domain: MintDomain,
    signer: Address,
    listener: Arc<EventListener>,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    /// Creates mock contracts that accept signatures from `signer` under `domain`.
    #[must_use]
    pub fn new(
        config: MockConfig,
        domain: MintDomain,
        signer: Address,
        listener: Arc<EventListener>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            domain,
            signer,
            listener,
            clock,
            state: Arc::new(Mutex::new(MockState {
                next_token_id: 1,
                ..MockState::default()
            })),
        }
    }

    /// Makes the next `request_flash` / `mint_with_signature` fail with `error`.
    pub fn fail_next_submit(&self, error: ChainError) {
        self.state.lock().fail_next_submit = Some(error);
    }

    /// When set, `wait_for_receipt` never completes.
    pub fn stall_receipts(&self, stall: bool) {
        self.state.lock().stall_receipts = stall;
    }

    /// When set, receipts complete but their logs are never delivered.
    pub fn drop_events(&self, drop: bool) {
        self.state.lock().drop_events = drop;
    }

    /// Number of `requestFlash` transactions accepted.
    #[must_use]
    pub fn flash_requests(&self) -> u64 {
        self.state.lock().flash_requests
    }

    /// Number of `mintWithSignature` submissions (accepted or not).
    #[must_use]
    pub fn mint_submissions(&self) -> u64 {
        self.state.lock().mint_submissions
    }

    /// Rank tiers used by the mock NFT contract.
    #[must_use]
    pub fn rank_label(score: U256) -> &'static str {
        let micros = u64::try_from(score).unwrap_or(u64::MAX);
        match micros {
            0..=149_999 => "Lightning",
            150_000..=249_999 => "Swift",
            250_000..=399_999 => "Quick",
            _ => "Steady",
        }
    }

    fn take_injected_failure(state: &mut MockState) -> ChainResult<()> {
        state.fail_next_submit.take().map_or(Ok(()), Err)
    }

    fn next_tx_hash(state: &mut MockState) -> TxHash {
        state.next_tx += 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        B256::from(bytes)
    }

    /// Refills the allowance if the cooldown elapsed.
    fn refresh_allowance(&self, allowance: &mut Allowance, now_secs: u64) {
        let elapsed = allowance
            .session_started_secs
            .map_or(u64::MAX, |start| now_secs.saturating_sub(start));
        if allowance.remaining == 0 && elapsed >= self.config.free_play_interval_secs {
            allowance.remaining = self.config.plays_per_session;
            allowance.session_started_secs = Some(now_secs);
        }
    }

    async fn confirm(&self, tx_hash: TxHash) -> ChainResult<TxReceipt> {
        let stalled = self.state.lock().stall_receipts;
        if stalled {
            std::future::pending::<()>().await;
        }

        let (events, block_number, drop_events) = {
            let mut state = self.state.lock();
            let events = state
                .pending
                .remove(&tx_hash)
                .ok_or_else(|| ChainError::Network(format!("unknown transaction {tx_hash}")))?;
            state.block_number += 1;
            (events, state.block_number, state.drop_events)
        };

        if !drop_events {
            for event in events {
                let event = match event {
                    ChainEvent::FlashRequested(e) => {
                        ChainEvent::FlashRequested(FlashRequested { block_number, ..e })
                    }
                    ChainEvent::NftMinted(e) => ChainEvent::NftMinted(NftMinted { block_number, ..e }),
                    other => other,
                };
                self.listener.dispatch(&event);
            }
        }

        Ok(TxReceipt {
            tx_hash,
            block_number,
            success: true,
        })
    }
}

#[async_trait]
impl GameContract for MockChain {
    async fn play_price(&self) -> ChainResult<U256> {
        Ok(self.config.play_price)
    }

    async fn free_play_interval(&self) -> ChainResult<u64> {
        Ok(self.config.free_play_interval_secs)
    }

    async fn plays_per_session(&self) -> ChainResult<u32> {
        Ok(self.config.plays_per_session)
    }

    async fn remaining_plays(&self, player: Address) -> ChainResult<u32> {
        let now_secs = self.clock.now_secs();
        let mut state = self.state.lock();
        let allowance = state.allowances.entry(player).or_default();
        self.refresh_allowance(allowance, now_secs);
        Ok(allowance.remaining)
    }

    async fn remaining_cooldown(&self, player: Address) -> ChainResult<u64> {
        let now_secs = self.clock.now_secs();
        let state = self.state.lock();
        let cooldown = state.allowances.get(&player).map_or(0, |allowance| {
            match (allowance.remaining, allowance.session_started_secs) {
                (0, Some(start)) => {
                    (start + self.config.free_play_interval_secs).saturating_sub(now_secs)
                }
                _ => 0,
            }
        });
        Ok(cooldown)
    }

    async fn request_flash(&self, player: Address, value: U256) -> ChainResult<TxHash> {
        let now_secs = self.clock.now_secs();
        let mut state = self.state.lock();
        Self::take_injected_failure(&mut state)?;

        let allowance = state.allowances.entry(player).or_default();
        self.refresh_allowance(allowance, now_secs);
        if allowance.remaining > 0 {
            allowance.remaining -= 1;
        } else if value != self.config.play_price {
            return Err(ChainError::Reverted("Incorrect play price".into()));
        }
        let remaining_plays = allowance.remaining;

        let tx_hash = Self::next_tx_hash(&mut state);
        state.flash_requests += 1;
        state.pending.insert(
            tx_hash,
            vec![ChainEvent::FlashRequested(FlashRequested {
                player,
                requested_at: now_secs,
                remaining_plays,
                plays_per_session: self.config.plays_per_session,
                block_number: 0,
            })],
        );
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceipt> {
        self.confirm(tx_hash).await
    }
}

#[async_trait]
impl NftContract for MockChain {
    async fn mint_price(&self) -> ChainResult<U256> {
        Ok(self.config.mint_price)
    }

    async fn rank_for_score(&self, score: U256) -> ChainResult<String> {
        Ok(Self::rank_label(score).to_string())
    }

    async fn mint_with_signature(&self, call: &MintCall, value: U256) -> ChainResult<TxHash> {
        let now_secs = self.clock.now_secs();
        let mut state = self.state.lock();
        state.mint_submissions += 1;
        Self::take_injected_failure(&mut state)?;

        let message = &call.authorization;
        if value != self.config.mint_price {
            return Err(ChainError::Reverted("IncorrectMintPrice()".into()));
        }
        if U256::from(now_secs) > message.expiry {
            return Err(ChainError::Reverted("SignatureExpired()".into()));
        }
        if state.used_nonces.contains(&message.nonce) {
            return Err(ChainError::Reverted("NonceAlreadyUsed()".into()));
        }
        let digest = message.signing_hash(&self.domain);
        let recovered = call.signature.recover(digest).ok();
        if message.contract != self.domain.verifying_contract || recovered != Some(self.signer) {
            return Err(ChainError::Reverted("InvalidSigner()".into()));
        }

        state.used_nonces.insert(message.nonce);
        let token_id = U256::from(state.next_token_id);
        state.next_token_id += 1;
        let tx_hash = Self::next_tx_hash(&mut state);
        state.pending.insert(
            tx_hash,
            vec![ChainEvent::NftMinted(NftMinted {
                player: message.player,
                token_id,
                score: message.score,
                rank: Self::rank_label(message.score).to_string(),
                block_number: 0,
            })],
        );
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceipt> {
        self.confirm(tx_hash).await
    }
}
