//! # Event Listener
//!
//! Fans contract events out to per-player subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │   RPC/WS     │ ──▶ │   Listener   │ ──▶ │  Subscription    │ ──▶ Game
//! │   logs       │     │   (Parser)   │     │  (player filter) │
//! └──────────────┘     └──────────────┘     └──────────────────┘
//! ```
//!
//! A [`Subscription`] owns its registration: dropping it unregisters, so a
//! round that ends on any path (result closed, teardown, network change)
//! releases its event stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use alloy_primitives::{Address, B256};
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::events::{ChainEvent, EventParser};

/// Which contracts the listener accepts logs from.
#[derive(Clone, Debug, Default)]
pub struct ListenerConfig {
    /// Game-session contract.
    pub game_contract: Address,
    /// NFT contract.
    pub nft_contract: Address,
}

/// Statistics for the event listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Raw logs offered to the listener.
    pub logs_received: AtomicU64,
    /// Logs that did not parse or came from another contract.
    pub logs_ignored: AtomicU64,
    /// Events handed to at least one subscriber.
    pub events_delivered: AtomicU64,
    /// Events no subscriber wanted (other players).
    pub events_unmatched: AtomicU64,
}

#[derive(Debug)]
struct Subscriber {
    id: u64,
    player: Address,
    sender: UnboundedSender<ChainEvent>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Player-filtered contract event listener.
pub struct EventListener {
    config: ListenerConfig,
    registry: Arc<Mutex<Registry>>,
    stats: Arc<ListenerStats>,
}

impl EventListener {
    /// Creates a new event listener.
    #[must_use]
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(Registry::default())),
            stats: Arc::new(ListenerStats::default()),
        }
    }

    /// Returns a reference to the statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }

    /// Subscribes to events belonging to `player`.
    ///
    /// Block notifications are delivered to every subscription.
    #[must_use]
    pub fn subscribe(&self, player: Address) -> Subscription {
        let (sender, receiver) = unbounded_channel();
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.push(Subscriber { id, player, sender });
        tracing::debug!("Subscription {} opened for {}", id, player);

        Subscription {
            id,
            player,
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers an already-decoded event.
    ///
    /// # Returns
    ///
    /// Number of subscriptions that received it.
    pub fn dispatch(&self, event: &ChainEvent) -> usize {
        let mut registry = self.registry.lock();
        registry.subscribers.retain(|s| !s.sender.is_closed());

        let target = event.player();
        let mut delivered = 0;
        for subscriber in &registry.subscribers {
            let wanted = target.map_or(true, |player| player == subscriber.player);
            if wanted && subscriber.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }

        if delivered > 0 {
            self.stats.events_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.events_unmatched.fetch_add(1, Ordering::Relaxed);
        }
        delivered
    }

    /// Decodes a raw log and dispatches it.
    ///
    /// # Arguments
    ///
    /// * `contract` - Address that emitted the log
    /// * `topics` - Event topics
    /// * `data` - Event data
    /// * `block_number` - Block number
    ///
    /// # Returns
    ///
    /// `true` if the log was a known event from a watched contract.
    pub fn process_raw_log(
        &self,
        contract: Address,
        topics: &[B256],
        data: &[u8],
        block_number: u64,
    ) -> bool {
        self.stats.logs_received.fetch_add(1, Ordering::Relaxed);

        if contract != self.config.game_contract && contract != self.config.nft_contract {
            self.stats.logs_ignored.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        match EventParser::parse(topics, data, block_number) {
            Some(event) => {
                self.dispatch(&event);
                true
            }
            None => {
                self.stats.logs_ignored.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Ignoring undecodable log from {} at block {}", contract, block_number);
                false
            }
        }
    }
}

/// A live, player-filtered event stream. Unregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    player: Address,
    receiver: UnboundedReceiver<ChainEvent>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Player this subscription filters on.
    #[must_use]
    pub const fn player(&self) -> Address {
        self.player
    }

    /// Waits for the next event. `None` once the listener is gone.
    pub async fn recv(&mut self) -> Option<ChainEvent> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChainEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().subscribers.retain(|s| s.id != self.id);
            tracing::debug!("Subscription {} closed for {}", self.id, self.player);
        }
    }
}
