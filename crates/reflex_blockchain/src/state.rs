//! # Chain-Synced Player State
//!
//! The slice of on-chain state the game shows for the connected player:
//! play allowance counters, prices, and the tokens minted this session.
//! Updated from contract reads and from events.

use alloy_primitives::{Address, U256};

use super::events::{ChainEvent, FlashRequested, NftMinted};

/// One minted achievement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintedToken {
    /// Token id.
    pub token_id: U256,
    /// Recorded score in microseconds.
    pub score: U256,
    /// Rank label.
    pub rank: String,
}

/// Player state synchronized with the game and NFT contracts.
#[derive(Clone, Debug)]
pub struct PlayerChainState {
    player: Address,
    /// Free plays left in the current session.
    pub remaining_plays: u32,
    /// Size of a free-play session.
    pub plays_per_session: u32,
    /// Seconds until the next free session.
    pub remaining_cooldown_secs: u64,
    /// Seconds between free sessions.
    pub free_play_interval_secs: u64,
    /// Price of a paid round.
    pub play_price: U256,
    /// Price of a mint.
    pub mint_price: U256,
    minted: Vec<MintedToken>,
    last_block: u64,
    updates_processed: u64,
}

impl PlayerChainState {
    /// Empty state for `player`.
    #[must_use]
    pub fn new(player: Address) -> Self {
        Self {
            player,
            remaining_plays: 0,
            plays_per_session: 0,
            remaining_cooldown_secs: 0,
            free_play_interval_secs: 0,
            play_price: U256::ZERO,
            mint_price: U256::ZERO,
            minted: Vec::new(),
            last_block: 0,
            updates_processed: 0,
        }
    }

    /// Player this state tracks.
    #[inline]
    #[must_use]
    pub const fn player(&self) -> Address {
        self.player
    }

    /// Returns the last processed block number.
    #[inline]
    #[must_use]
    pub const fn last_block(&self) -> u64 {
        self.last_block
    }

    /// Returns the total number of events applied.
    #[inline]
    #[must_use]
    pub const fn updates_processed(&self) -> u64 {
        self.updates_processed
    }

    /// Tokens minted while this state was live.
    #[must_use]
    pub fn minted(&self) -> &[MintedToken] {
        &self.minted
    }

    /// True if the next round is free.
    #[must_use]
    pub const fn has_free_play(&self) -> bool {
        self.remaining_plays > 0
    }

    /// Value to attach to `requestFlash()`.
    #[must_use]
    pub fn flash_payment(&self) -> U256 {
        if self.has_free_play() {
            U256::ZERO
        } else {
            self.play_price
        }
    }

    /// Applies an event. Events for other players are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the event changed this state.
    pub fn process_event(&mut self, event: &ChainEvent) -> bool {
        let applied = match event {
            ChainEvent::FlashRequested(flash) if flash.player == self.player => {
                self.apply_flash(flash);
                true
            }
            ChainEvent::NftMinted(minted) if minted.player == self.player => {
                self.apply_mint(minted);
                true
            }
            ChainEvent::NewBlock(block_number) => {
                self.last_block = self.last_block.max(*block_number);
                true
            }
            _ => false,
        };
        if applied {
            self.updates_processed += 1;
        }
        applied
    }

    fn apply_flash(&mut self, flash: &FlashRequested) {
        self.remaining_plays = flash.remaining_plays;
        self.plays_per_session = flash.plays_per_session;
        self.last_block = self.last_block.max(flash.block_number);
    }

    fn apply_mint(&mut self, minted: &NftMinted) {
        if !self.minted.iter().any(|t| t.token_id == minted.token_id) {
            self.minted.push(MintedToken {
                token_id: minted.token_id,
                score: minted.score,
                rank: minted.rank.clone(),
            });
        }
        self.last_block = self.last_block.max(minted.block_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flash(player: Address, remaining: u32) -> ChainEvent {
        ChainEvent::FlashRequested(FlashRequested {
            player,
            requested_at: 100,
            remaining_plays: remaining,
            plays_per_session: 3,
            block_number: 12345,
        })
    }

    #[test]
    fn test_flash_updates_counters() {
        let player = Address::repeat_byte(1);
        let mut state = PlayerChainState::new(player);

        assert!(state.process_event(&flash(player, 2)));
        assert_eq!(state.remaining_plays, 2);
        assert_eq!(state.plays_per_session, 3);
        assert_eq!(state.last_block(), 12345);
        assert_eq!(state.updates_processed(), 1);
    }

    #[test]
    fn test_other_players_ignored() {
        let mut state = PlayerChainState::new(Address::repeat_byte(1));
        assert!(!state.process_event(&flash(Address::repeat_byte(2), 0)));
        assert_eq!(state.updates_processed(), 0);
    }

    #[test]
    fn test_payment_only_without_free_plays() {
        let mut state = PlayerChainState::new(Address::repeat_byte(1));
        state.play_price = U256::from(10u64);

        state.remaining_plays = 1;
        assert_eq!(state.flash_payment(), U256::ZERO);

        state.remaining_plays = 0;
        assert_eq!(state.flash_payment(), U256::from(10u64));
    }

    #[test]
    fn test_duplicate_mint_event_recorded_once() {
        let player = Address::repeat_byte(1);
        let mut state = PlayerChainState::new(player);
        let minted = ChainEvent::NftMinted(NftMinted {
            player,
            token_id: U256::from(1u64),
            score: U256::from(200_000u64),
            rank: "Gold".into(),
            block_number: 3,
        });

        state.process_event(&minted);
        state.process_event(&minted);
        assert_eq!(state.minted().len(), 1);
    }
}
