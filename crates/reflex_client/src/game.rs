//! # Game Controller
//!
//! The single-task event loop that drives a player's rounds.
//!
//! ## Architecture
//!
//! ```text
//!  GameHandle ──commands──┐
//!                         ▼
//!  reveal timer ──gen──▶ GameController ──▶ watch<GameView> ──▶ UI
//!                         ▲     │
//!  Subscription ─events───┘     └──▶ GameContract / MintOrchestrator
//! ```
//!
//! Commands, reveal timers and chain events are multiplexed with
//! `tokio::select!` on one task, so session transitions never race. Each
//! network call runs under a deadline and the current [`CancelToken`]; the
//! handle can cancel it from outside (wallet change, shutdown) while the
//! loop is waiting on it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use reflex_blockchain::{
    ChainError, ChainEvent, ChainResult, EventListener, GameContract, NftContract,
    PlayerChainState, Subscription, TxHash,
};
use reflex_session::{DelaySource, ReactionResult, RevealSchedule, SessionClock, SessionState};
use reflex_shared::Clock;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::deadline::{with_deadline, CancelToken, DeadlineError};
use crate::mint::{MintOrchestrator, MintOutcome, WalletContext};
use crate::signature_client::{truncate_for_display, SignatureSource};

/// Shown when no wallet is connected.
pub const CONNECT_WALLET: &str = "Please connect your wallet to play.";
/// Shown when a round or transaction is already running.
pub const ROUND_IN_PROGRESS: &str = "A round is already in progress.";
/// Shown while the wallet confirms `requestFlash`.
pub const REQUESTING_FLASH: &str = "Requesting flash... please confirm in your wallet.";
/// Shown after `requestFlash` is confirmed, before its event arrives.
pub const FLASH_REQUESTED: &str = "Flash requested! Waiting for the round to start...";
/// Shown while the cue is hidden.
pub const GET_READY: &str = "Get ready...";
/// Shown when the cue appears.
pub const TAP_NOW: &str = "TAP NOW!";
/// Shown while a mint runs.
pub const MINTING: &str = "Minting... please confirm in your wallet.";
/// Shown when the current round's result was already minted.
pub const ALREADY_MINTED: &str = "This round was already minted. Play again to mint another.";

/// Input to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameCommand {
    /// Start a round.
    RequestFlash,
    /// The player tapped.
    Tap,
    /// Dismiss the result.
    CloseResult,
    /// Wallet connected, disconnected, or switched chain or account.
    WalletChanged(WalletContext),
    /// Mint the current result.
    Mint {
        /// Optional session id for the nonce.
        fid: Option<u64>,
    },
    /// Stop the loop.
    Shutdown,
}

/// Everything the UI renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameView {
    /// Round state.
    pub state: SessionState,
    /// Status line.
    pub message: String,
    /// A transaction or signature request is in flight.
    pub loading: bool,
    /// The tap target is visible.
    pub cue_visible: bool,
    /// Result of the current round.
    pub result: Option<ReactionResult>,
    /// Rank the contract would assign to the current result.
    pub rank_preview: Option<String>,
    /// Free plays left this session.
    pub remaining_plays: u32,
    /// Free plays per session.
    pub plays_per_session: u32,
    /// Seconds until free plays refill.
    pub cooldown_secs: u64,
    /// Price of a paid round.
    pub play_price: U256,
    /// Most recent mint.
    pub last_mint: Option<MintOutcome>,
}

impl Default for GameView {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            message: CONNECT_WALLET.to_string(),
            loading: false,
            cue_visible: false,
            result: None,
            rank_preview: None,
            remaining_plays: 0,
            plays_per_session: 0,
            cooldown_secs: 0,
            play_price: U256::ZERO,
            last_mint: None,
        }
    }
}

/// External collaborators of the controller.
pub struct GameServices {
    /// Game-session contract.
    pub game: Arc<dyn GameContract>,
    /// NFT contract.
    pub nft: Arc<dyn NftContract>,
    /// Signature service.
    pub signatures: Arc<dyn SignatureSource>,
    /// Contract event fan-out.
    pub listener: Arc<EventListener>,
}

/// Cancellation slot shared between the controller and its handle.
type CancelSlot = Arc<Mutex<CancelToken>>;

fn cancel_current(slot: &CancelSlot) {
    let mut current = slot.lock();
    current.cancel();
    *current = CancelToken::new();
}

/// Client side of a running controller.
#[derive(Clone, Debug)]
pub struct GameHandle {
    commands: UnboundedSender<GameCommand>,
    view: watch::Receiver<GameView>,
    cancel: CancelSlot,
}

impl GameHandle {
    /// Sends a command. Wallet changes and shutdown first cancel whatever
    /// network call is in flight. Returns `false` once the loop has stopped.
    pub fn send(&self, command: GameCommand) -> bool {
        if matches!(command, GameCommand::WalletChanged(_) | GameCommand::Shutdown) {
            cancel_current(&self.cancel);
        }
        self.commands.send(command).is_ok()
    }

    /// Cancels the in-flight network call, if any.
    pub fn cancel_pending(&self) {
        cancel_current(&self.cancel);
    }

    /// Current view.
    #[must_use]
    pub fn view(&self) -> GameView {
        self.view.borrow().clone()
    }

    /// A receiver for view changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<GameView> {
        self.view.clone()
    }

    /// Waits until the view satisfies `predicate`. `None` if the loop stopped.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<GameView>
    where
        F: FnMut(&GameView) -> bool,
    {
        let mut view = self.view.clone();
        let current = view.wait_for(predicate).await.ok()?;
        Some(current.clone())
    }

    /// Stops the controller.
    pub fn shutdown(&self) {
        self.send(GameCommand::Shutdown);
    }
}

/// Drives rounds and mints for one wallet.
pub struct GameController {
    config: ClientConfig,
    wallet: WalletContext,
    clock: Arc<dyn Clock>,
    session: SessionClock<Box<dyn DelaySource>>,
    chain_state: Option<PlayerChainState>,
    game: Arc<dyn GameContract>,
    nft: Arc<dyn NftContract>,
    listener: Arc<EventListener>,
    minter: MintOrchestrator,
    /// Generation of the round whose result was minted.
    minted_round: Option<u64>,
    events: Option<Subscription>,
    commands: UnboundedReceiver<GameCommand>,
    reveal_timer: Option<JoinHandle<()>>,
    reveal_tx: UnboundedSender<u64>,
    reveal_rx: UnboundedReceiver<u64>,
    view: watch::Sender<GameView>,
    cancel: CancelSlot,
}

impl GameController {
    /// Creates a controller and its handle. Call [`Self::run`] to start it.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        clock: Arc<dyn Clock>,
        delays: Box<dyn DelaySource>,
        services: GameServices,
    ) -> (Self, GameHandle) {
        let (command_tx, command_rx) = unbounded_channel();
        let (reveal_tx, reveal_rx) = unbounded_channel();
        let (view_tx, view_rx) = watch::channel(GameView::default());
        let cancel: CancelSlot = Arc::new(Mutex::new(CancelToken::new()));

        let minter = MintOrchestrator::new(
            config.clone(),
            services.signatures,
            Arc::clone(&services.nft),
            Arc::clone(&services.listener),
        );

        let controller = Self {
            config,
            wallet: WalletContext::default(),
            clock,
            session: SessionClock::new(delays),
            chain_state: None,
            game: services.game,
            nft: services.nft,
            listener: services.listener,
            minter,
            minted_round: None,
            events: None,
            commands: command_rx,
            reveal_timer: None,
            reveal_tx,
            reveal_rx,
            view: view_tx,
            cancel: Arc::clone(&cancel),
        };
        let handle = GameHandle {
            commands: command_tx,
            view: view_rx,
            cancel,
        };
        (controller, handle)
    }

    /// Creates a controller and runs it on a new task.
    #[must_use]
    pub fn spawn(
        config: ClientConfig,
        clock: Arc<dyn Clock>,
        delays: Box<dyn DelaySource>,
        services: GameServices,
    ) -> (GameHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(config, clock, delays, services);
        (handle, tokio::spawn(controller.run()))
    }

    /// Runs until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Game controller started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(GameCommand::Shutdown) => break,
                    Some(command) => self.handle(command).await,
                },
                Some(generation) = self.reveal_rx.recv() => self.on_reveal_due(generation),
                event = next_event(self.events.as_mut()) => match event {
                    Some(event) => self.on_chain_event(&event),
                    None => self.events = None,
                },
            }
        }
        self.teardown();
        tracing::info!("Game controller stopped");
    }

    async fn handle(&mut self, command: GameCommand) {
        tracing::debug!("Command {:?} in {:?}", command, self.session.state());
        match command {
            GameCommand::RequestFlash => self.request_flash().await,
            GameCommand::Tap => self.tap().await,
            GameCommand::CloseResult => self.close_result(),
            GameCommand::WalletChanged(wallet) => self.wallet_changed(wallet).await,
            GameCommand::Mint { fid } => self.mint(fid).await,
            GameCommand::Shutdown => {}
        }
    }

    // ------------------------------------------------------------------
    // View helpers
    // ------------------------------------------------------------------

    fn update<F: FnOnce(&mut GameView)>(&self, change: F) {
        let state = self.session.state();
        self.view.send_modify(|view| {
            change(view);
            view.state = state;
            view.cue_visible = state == SessionState::CueVisible;
        });
    }

    fn say(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|view| view.message = message);
    }

    fn is_loading(&self) -> bool {
        self.view.borrow().loading
    }

    fn publish_counters(&self) {
        if let Some(state) = &self.chain_state {
            let (remaining, per_session, cooldown, price) = (
                state.remaining_plays,
                state.plays_per_session,
                state.remaining_cooldown_secs,
                state.play_price,
            );
            self.update(|view| {
                view.remaining_plays = remaining;
                view.plays_per_session = per_session;
                view.cooldown_secs = cooldown;
                view.play_price = price;
            });
        }
    }

    fn op_token(&self) -> CancelToken {
        self.cancel.lock().clone()
    }

    fn display(&self, text: &str) -> String {
        truncate_for_display(text, self.config.message_limit)
    }

    /// Gating message, or the player when play is allowed.
    fn playable_player(&self) -> Result<Address, String> {
        match (self.wallet.player, self.wallet.chain_id) {
            (None, _) => Err(CONNECT_WALLET.to_string()),
            (Some(player), Some(chain)) if chain == self.config.chain_id => Ok(player),
            (Some(_), _) => Err(format!("Please switch to {} to play.", self.config.network_name)),
        }
    }

    // ------------------------------------------------------------------
    // Wallet
    // ------------------------------------------------------------------

    async fn wallet_changed(&mut self, wallet: WalletContext) {
        tracing::info!("Wallet changed: {:?}", wallet);
        self.wallet = wallet;
        self.abort_reveal_timer();

        let player = self.playable_player().ok();
        self.session.set_player(player);
        self.events = player.map(|p| self.listener.subscribe(p));
        self.chain_state = player.map(PlayerChainState::new);

        let message = self.playable_player().err().unwrap_or_default();
        self.update(|view| {
            *view = GameView {
                message,
                last_mint: view.last_mint.take(),
                ..GameView::default()
            };
        });

        if let Some(player) = player {
            let cancel = self.op_token();
            if let Err(e) = self.refresh_counters(player, &cancel).await {
                tracing::warn!("Could not read play counters for {}: {}", player, e);
            }
        }
    }

    async fn refresh_counters(&mut self, player: Address, cancel: &CancelToken) -> ChainResult<()> {
        let limit = self.config.tx_timeout;
        let remaining = bounded(self.game.remaining_plays(player), limit, cancel, "remainingPlays").await?;
        let per_session = bounded(self.game.plays_per_session(), limit, cancel, "playsPerSession").await?;
        let interval = bounded(self.game.free_play_interval(), limit, cancel, "freePlayInterval").await?;
        let cooldown =
            bounded(self.game.remaining_cooldown(player), limit, cancel, "remainingCooldown").await?;
        let price = bounded(self.game.play_price(), limit, cancel, "playPrice").await?;

        if let Some(state) = self.chain_state.as_mut().filter(|s| s.player() == player) {
            state.remaining_plays = remaining;
            state.plays_per_session = per_session;
            state.free_play_interval_secs = interval;
            state.remaining_cooldown_secs = cooldown;
            state.play_price = price;
        }
        self.publish_counters();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rounds
    // ------------------------------------------------------------------

    async fn request_flash(&mut self) {
        let player = match self.playable_player() {
            Ok(player) => player,
            Err(message) => return self.say(message),
        };
        if !self.session.is_idle() || self.is_loading() {
            return self.say(ROUND_IN_PROGRESS);
        }

        self.update(|view| {
            view.loading = true;
            view.message = REQUESTING_FLASH.to_string();
            view.result = None;
            view.rank_preview = None;
        });

        let cancel = self.op_token();
        let outcome = self.submit_flash(player, &cancel).await;

        let message = match outcome {
            Ok(tx_hash) => {
                tracing::info!("Flash requested by {} in {}", player, tx_hash);
                FLASH_REQUESTED.to_string()
            }
            Err(e) => {
                tracing::warn!("Flash request failed for {}: {}", player, e);
                self.display(&format!("Error: {}", e.short_message()))
            }
        };
        self.update(|view| {
            view.loading = false;
            view.message = message;
        });
    }

    async fn submit_flash(&mut self, player: Address, cancel: &CancelToken) -> ChainResult<TxHash> {
        self.refresh_counters(player, cancel).await?;
        let value = self
            .chain_state
            .as_ref()
            .map_or(U256::ZERO, PlayerChainState::flash_payment);
        tracing::debug!("requestFlash from {} with value {}", player, value);

        let limit = self.config.tx_timeout;
        let tx_hash = bounded(self.game.request_flash(player, value), limit, cancel, "requestFlash").await?;
        let receipt =
            bounded(self.game.wait_for_receipt(tx_hash), limit, cancel, "requestFlash receipt").await?;
        if !receipt.success {
            return Err(ChainError::Reverted("requestFlash reverted".into()));
        }
        Ok(tx_hash)
    }

    fn on_chain_event(&mut self, event: &ChainEvent) {
        if let Some(state) = self.chain_state.as_mut() {
            state.process_event(event);
        }

        if let ChainEvent::FlashRequested(flash) = event {
            let now_ms = self.clock.now_ms();
            match self
                .session
                .on_flash_requested(flash.player, flash.requested_at.saturating_mul(1_000), now_ms)
            {
                Ok(schedule) => {
                    self.schedule_reveal(schedule);
                    self.update(|view| {
                        view.message = GET_READY.to_string();
                        view.result = None;
                        view.rank_preview = None;
                    });
                }
                Err(e) => tracing::debug!("Flash event not applied: {}", e),
            }
        }
        self.publish_counters();
    }

    fn schedule_reveal(&mut self, schedule: RevealSchedule) {
        self.abort_reveal_timer();
        let reveal_tx = self.reveal_tx.clone();
        self.reveal_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(schedule.delay_ms)).await;
            let _ = reveal_tx.send(schedule.generation);
        }));
    }

    fn abort_reveal_timer(&mut self) {
        if let Some(timer) = self.reveal_timer.take() {
            timer.abort();
        }
    }

    fn on_reveal_due(&mut self, generation: u64) {
        self.reveal_timer = None;
        if self.session.on_reveal_due(generation, self.clock.now_ms()) {
            self.say(TAP_NOW);
        }
    }

    async fn tap(&mut self) {
        let result = match self.session.on_tap(self.clock.now_ms()) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Tap ignored: {}", e);
                return;
            }
        };
        self.abort_reveal_timer();
        self.update(|view| {
            view.result = Some(result);
            view.message = result.message();
        });

        if let Some(score) = result.mintable_score() {
            let cancel = self.op_token();
            let limit = self.config.tx_timeout;
            match bounded(self.nft.rank_for_score(U256::from(score)), limit, &cancel, "getRankForScore").await {
                Ok(rank) => self.update(|view| view.rank_preview = Some(rank)),
                Err(e) => tracing::debug!("Rank preview unavailable: {}", e),
            }
        }
    }

    fn close_result(&mut self) {
        self.abort_reveal_timer();
        self.session.close_result();
        self.update(|view| {
            view.result = None;
            view.rank_preview = None;
            view.message.clear();
        });
    }

    // ------------------------------------------------------------------
    // Minting
    // ------------------------------------------------------------------

    async fn mint(&mut self, fid: Option<u64>) {
        let Some(result) = self.session.session().and_then(|s| s.result) else {
            return self.say("Nothing to mint yet.");
        };
        let round = self.session.generation();
        if self.minted_round == Some(round) {
            return self.say(ALREADY_MINTED);
        }
        if self.is_loading() {
            return self.say(ROUND_IN_PROGRESS);
        }

        self.update(|view| {
            view.loading = true;
            view.message = MINTING.to_string();
        });

        let cancel = self.op_token();
        let outcome = self.minter.mint(&self.wallet, &result, fid, &cancel).await;

        match outcome {
            Ok(minted) => {
                self.minted_round = Some(round);
                let message = format!("Minted NFT #{}! Rank: {}", minted.token_id, minted.rank);
                self.update(|view| {
                    view.loading = false;
                    view.message = message;
                    view.last_mint = Some(minted);
                });
            }
            Err(e) => {
                let message = self.display(&e.to_string());
                self.update(|view| {
                    view.loading = false;
                    view.message = message;
                });
            }
        }
    }

    fn teardown(&mut self) {
        self.abort_reveal_timer();
        self.session.reset();
        self.events = None;
        self.cancel.lock().cancel();
        self.update(|view| view.loading = false);
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        self.abort_reveal_timer();
    }
}

async fn next_event(events: Option<&mut Subscription>) -> Option<ChainEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn bounded<T, F>(
    call: F,
    limit: Duration,
    cancel: &CancelToken,
    what: &str,
) -> ChainResult<T>
where
    F: Future<Output = ChainResult<T>>,
{
    match with_deadline(call, limit, cancel).await {
        Ok(result) => result,
        Err(DeadlineError::TimedOut) => Err(ChainError::Timeout(format!("{what} timed out"))),
        Err(DeadlineError::Cancelled) => Err(ChainError::Network(format!("{what} cancelled"))),
    }
}
