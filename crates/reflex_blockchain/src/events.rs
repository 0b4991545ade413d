//! # Contract Events
//!
//! Event types and parsing for the two contracts. Logs arrive as raw
//! `(topics, data)` pairs from the RPC client and are decoded here.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;

use super::contracts::{IReflexBlitzNFT, IVRFReflexBlitz};

/// All contract events the game cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainEvent {
    /// A flash request was accepted on-chain.
    FlashRequested(FlashRequested),
    /// An achievement NFT was minted.
    NftMinted(NftMinted),
    /// A new block was seen (for sync purposes).
    NewBlock(u64),
}

impl ChainEvent {
    /// The player this event belongs to, if any.
    #[must_use]
    pub const fn player(&self) -> Option<Address> {
        match self {
            Self::FlashRequested(e) => Some(e.player),
            Self::NftMinted(e) => Some(e.player),
            Self::NewBlock(_) => None,
        }
    }
}

/// `FlashRequested` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashRequested {
    /// Player who requested the round.
    pub player: Address,
    /// Block timestamp of the request (Unix seconds).
    pub requested_at: u64,
    /// Free plays left in the player's current session.
    pub remaining_plays: u32,
    /// Size of a free-play session.
    pub plays_per_session: u32,
    /// Block number where this occurred.
    pub block_number: u64,
}

/// `NFTMinted` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NftMinted {
    /// Owner of the new token.
    pub player: Address,
    /// Assigned token id.
    pub token_id: U256,
    /// Score recorded in the token.
    pub score: U256,
    /// Rank label computed by the contract.
    pub rank: String,
    /// Block number where this occurred.
    pub block_number: u64,
}

/// Event parser for raw log data.
///
/// Parses directly from the ABI words without intermediate decoding.
pub struct EventParser;

impl EventParser {
    /// Parses any known event, dispatching on `topics[0]`.
    #[must_use]
    pub fn parse(topics: &[B256], data: &[u8], block_number: u64) -> Option<ChainEvent> {
        let signature = *topics.first()?;
        if signature == IVRFReflexBlitz::FlashRequested::SIGNATURE_HASH {
            Self::parse_flash_requested(topics, data, block_number).map(ChainEvent::FlashRequested)
        } else if signature == IReflexBlitzNFT::NFTMinted::SIGNATURE_HASH {
            Self::parse_nft_minted(topics, data, block_number).map(ChainEvent::NftMinted)
        } else {
            None
        }
    }

    /// Parses a `FlashRequested` event.
    ///
    /// # Arguments
    ///
    /// * `topics` - Event signature and indexed player
    /// * `data` - `requestedAt | remainingPlays | playsPerSession`
    /// * `block_number` - Block where event occurred
    #[must_use]
    pub fn parse_flash_requested(
        topics: &[B256],
        data: &[u8],
        block_number: u64,
    ) -> Option<FlashRequested> {
        if topics.len() < 2 || data.len() < 96 {
            return None;
        }

        Some(FlashRequested {
            player: topic_address(&topics[1]),
            requested_at: word_u64(data, 0)?,
            remaining_plays: saturating_u32(word(data, 1)?),
            plays_per_session: saturating_u32(word(data, 2)?),
            block_number,
        })
    }

    /// Parses an `NFTMinted` event.
    ///
    /// # Arguments
    ///
    /// * `topics` - Event signature, indexed player and token id
    /// * `data` - `score | offset(rank) | ... | len | rank bytes`
    /// * `block_number` - Block where event occurred
    #[must_use]
    pub fn parse_nft_minted(topics: &[B256], data: &[u8], block_number: u64) -> Option<NftMinted> {
        if topics.len() < 3 || data.len() < 64 {
            return None;
        }

        let score = U256::from_be_slice(word(data, 0)?);
        let offset = usize::try_from(word_u64(data, 1)?).ok()?;
        let len_end = offset.checked_add(32)?;
        let len = usize::try_from(U256::from_be_slice(data.get(offset..len_end)?)).ok()?;
        let rank_bytes = data.get(len_end..len_end.checked_add(len)?)?;
        let rank = String::from_utf8(rank_bytes.to_vec()).ok()?;

        Some(NftMinted {
            player: topic_address(&topics[1]),
            token_id: U256::from_be_slice(topics[2].as_slice()),
            score,
            rank,
            block_number,
        })
    }
}

/// Encodes events into raw logs, the inverse of [`EventParser`].
///
/// Used by the mock chain and by tests that replay contract output.
pub struct EventEncoder;

impl EventEncoder {
    /// Encodes a `FlashRequested` log.
    #[must_use]
    pub fn flash_requested(event: &FlashRequested) -> (Vec<B256>, Vec<u8>) {
        let topics = vec![
            IVRFReflexBlitz::FlashRequested::SIGNATURE_HASH,
            address_topic(event.player),
        ];
        let mut data = Vec::with_capacity(96);
        data.extend_from_slice(&U256::from(event.requested_at).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(event.remaining_plays).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(event.plays_per_session).to_be_bytes::<32>());
        (topics, data)
    }

    /// Encodes an `NFTMinted` log.
    #[must_use]
    pub fn nft_minted(event: &NftMinted) -> (Vec<B256>, Vec<u8>) {
        let topics = vec![
            IReflexBlitzNFT::NFTMinted::SIGNATURE_HASH,
            address_topic(event.player),
            B256::from(event.token_id.to_be_bytes::<32>()),
        ];
        let rank = event.rank.as_bytes();
        let padded = rank.len().div_ceil(32) * 32;
        let mut data = Vec::with_capacity(96 + padded);
        data.extend_from_slice(&event.score.to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(64u64).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(rank.len()).to_be_bytes::<32>());
        data.extend_from_slice(rank);
        data.resize(96 + padded, 0);
        (topics, data)
    }
}

fn word(data: &[u8], index: usize) -> Option<&[u8]> {
    data.get(index * 32..(index + 1) * 32)
}

fn word_u64(data: &[u8], index: usize) -> Option<u64> {
    u64::try_from(U256::from_be_slice(word(data, index)?)).ok()
}

fn saturating_u32(word: &[u8]) -> u32 {
    u32::try_from(U256::from_be_slice(word)).unwrap_or(u32::MAX)
}

fn topic_address(topic: &B256) -> Address {
    Address::from_slice(&topic[12..32])
}

fn address_topic(address: Address) -> B256 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    B256::from(word)
}
