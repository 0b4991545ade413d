//! Shared fixtures: mock contracts, an in-process signature service, and a
//! paused-time clock they all agree on.

#![allow(dead_code)]

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use reflex_blockchain::{EventListener, ListenerConfig, MockChain, MockConfig};
use reflex_client::{
    ClientConfig, GameController, GameHandle, GameServices, MintOrchestrator, SignatureFetchError,
    SignatureSource, TokioClock,
};
use reflex_session::RevealJitter;
use reflex_shared::{MintSignatureRequest, MintSignatureResponse};
use reflex_signer::{SignatureService, SignerConfig};
use tokio::task::JoinHandle;

pub const SIGNER_KEY: &str = "0x0707070707070707070707070707070707070707070707070707070707070707";
pub const START_MS: u64 = 1_700_000_000_000;

pub fn player() -> Address {
    Address::repeat_byte(0x11)
}

pub fn nft_address() -> Address {
    Address::repeat_byte(0x22)
}

pub fn game_address() -> Address {
    Address::repeat_byte(0x33)
}

pub fn signer_config() -> SignerConfig {
    SignerConfig {
        signer_private_key: Some(SIGNER_KEY.into()),
        nft_contract_address: Some(nft_address().to_string()),
        ..SignerConfig::default()
    }
}

/// Calls a [`SignatureService`] directly, mapping its status like HTTP would.
pub struct ServiceSource(pub Arc<SignatureService>);

#[async_trait]
impl SignatureSource for ServiceSource {
    async fn request_signature(
        &self,
        request: &MintSignatureRequest,
    ) -> Result<MintSignatureResponse, SignatureFetchError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| SignatureFetchError::Decode(e.to_string()))?;
        let response = self.0.handle(&body);
        if response.status != 200 {
            return Err(SignatureFetchError::Rejected {
                status: response.status,
                message: response.body["error"].as_str().unwrap_or_default().to_string(),
            });
        }
        serde_json::from_value(response.body).map_err(|e| SignatureFetchError::Decode(e.to_string()))
    }
}

/// Hands out one fixed response forever.
pub struct ReplaySource(pub MintSignatureResponse);

#[async_trait]
impl SignatureSource for ReplaySource {
    async fn request_signature(
        &self,
        _request: &MintSignatureRequest,
    ) -> Result<MintSignatureResponse, SignatureFetchError> {
        Ok(self.0.clone())
    }
}

pub struct Env {
    pub clock: TokioClock,
    pub listener: Arc<EventListener>,
    pub service: Arc<SignatureService>,
    pub chain: MockChain,
    pub config: ClientConfig,
}

impl Env {
    pub fn new(mock: MockConfig) -> Self {
        Self::build(mock, None, signer_config())
    }

    /// The NFT contract trusts `trusted` instead of the service's key.
    pub fn trusting(mock: MockConfig, trusted: Address) -> Self {
        Self::build(mock, Some(trusted), signer_config())
    }

    pub fn with_signer_config(mock: MockConfig, signer: SignerConfig) -> Self {
        Self::build(mock, None, signer)
    }

    fn build(mock: MockConfig, trusted: Option<Address>, signer: SignerConfig) -> Self {
        let clock = TokioClock::anchored_at(START_MS);
        let listener = Arc::new(EventListener::new(ListenerConfig {
            game_contract: game_address(),
            nft_contract: nft_address(),
        }));
        // The contracts always trust the well-configured key and domain.
        let reference = SignatureService::new(&signer_config(), Arc::new(clock));
        let domain = reference.domain().unwrap();
        let trusted = trusted.unwrap_or_else(|| reference.signer_address().unwrap());
        let service = Arc::new(SignatureService::new(&signer, Arc::new(clock)));
        let chain = MockChain::new(mock, domain, trusted, Arc::clone(&listener), Arc::new(clock));

        let config = ClientConfig {
            game_contract: game_address(),
            nft_contract: nft_address(),
            ..ClientConfig::default()
        };

        Self {
            clock,
            listener,
            service,
            chain,
            config,
        }
    }

    pub fn service_source(&self) -> Arc<dyn SignatureSource> {
        Arc::new(ServiceSource(Arc::clone(&self.service)))
    }

    pub fn orchestrator(&self, source: Arc<dyn SignatureSource>) -> MintOrchestrator {
        MintOrchestrator::new(
            self.config.clone(),
            source,
            Arc::new(self.chain.clone()),
            Arc::clone(&self.listener),
        )
    }

    pub fn spawn_game(&self) -> (GameHandle, JoinHandle<()>) {
        self.spawn_game_with(self.config.clone())
    }

    pub fn spawn_game_with(&self, config: ClientConfig) -> (GameHandle, JoinHandle<()>) {
        let services = GameServices {
            game: Arc::new(self.chain.clone()),
            nft: Arc::new(self.chain.clone()),
            signatures: self.service_source(),
            listener: Arc::clone(&self.listener),
        };
        GameController::spawn(
            config,
            Arc::new(self.clock),
            Box::new(RevealJitter::from_seed(7)),
            services,
        )
    }
}
