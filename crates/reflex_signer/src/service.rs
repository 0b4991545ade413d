//! # Signature Service
//!
//! The request handler behind `POST /api/generate-mint-signature`,
//! independent of any HTTP framework.
//!
//! ## Request Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Config set?  │ ─▶│  Validation  │ ─▶│ Nonce/expiry │ ─▶│  EIP-712     │
//! │ (500)        │   │  (400)       │   │ from Clock   │   │  sign (500)  │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Configuration is resolved once in [`SignatureService::new`]. A missing
//! key or address is reported on every request before the body is parsed.
//! A key or address that is present but unusable only fails at signing
//! time, so a malformed request still gets its 400.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use reflex_blockchain::{MintAuthorization, MintDomain};
use reflex_shared::{ApiErrorBody, Clock, MintSignatureResponse};
use serde_json::{Map, Value};

use crate::config::SignerConfig;
use crate::error::{SignerError, SignerResult};
use crate::nonce::{derive_expiry, derive_nonce};
use crate::signer::MintSigner;
use crate::validation::{validate_body, ValidatedRequest};

/// Outcome of resolving the signing key at startup.
#[derive(Debug)]
enum SignerSlot {
    Missing,
    Invalid(SignerError),
    Ready(Arc<MintSigner>),
}

#[derive(Debug)]
enum ContractSlot {
    Missing,
    Invalid(String),
    Ready { address: Address, text: String },
}

/// A status code and JSON body, ready for any transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceResponse {
    /// HTTP status.
    pub status: u16,
    /// JSON body.
    pub body: serde_json::Value,
}

/// Stateless mint-signature handler.
pub struct SignatureService {
    signer: SignerSlot,
    contract: ContractSlot,
    domain_name: String,
    domain_version: String,
    chain_id: u64,
    clock: Arc<dyn Clock>,
}

impl SignatureService {
    /// Builds the service from loaded configuration.
    ///
    /// Never fails: configuration problems surface per request.
    #[must_use]
    pub fn new(config: &SignerConfig, clock: Arc<dyn Clock>) -> Self {
        let signer = match config.signer_private_key.as_deref() {
            None => {
                tracing::error!("SIGNER_PRIVATE_KEY is not set");
                SignerSlot::Missing
            }
            Some(text) => match MintSigner::from_hex(text) {
                Ok(signer) => {
                    tracing::info!("Mint signer loaded: {}", signer.address());
                    SignerSlot::Ready(Arc::new(signer))
                }
                Err(e) => {
                    tracing::error!("SIGNER_PRIVATE_KEY is not a valid key: {}", e);
                    SignerSlot::Invalid(e)
                }
            },
        };

        let contract = match config.nft_contract_address.as_deref() {
            None => {
                tracing::error!("NFT_CONTRACT_ADDRESS is not set");
                ContractSlot::Missing
            }
            Some(text) => match text.trim().parse::<Address>() {
                Ok(address) => ContractSlot::Ready {
                    address,
                    text: text.trim().to_string(),
                },
                Err(_) => {
                    tracing::error!("NFT_CONTRACT_ADDRESS is not an address: {}", text);
                    ContractSlot::Invalid(text.to_string())
                }
            },
        };

        Self {
            signer,
            contract,
            domain_name: config.domain_name.clone(),
            domain_version: config.domain_version.clone(),
            chain_id: config.chain_id,
            clock,
        }
    }

    /// Signer address, if a valid key is configured.
    #[must_use]
    pub fn signer_address(&self) -> Option<Address> {
        match &self.signer {
            SignerSlot::Ready(signer) => Some(signer.address()),
            _ => None,
        }
    }

    /// Domain the service signs under, if the contract address is configured.
    #[must_use]
    pub fn domain(&self) -> Option<MintDomain> {
        match &self.contract {
            ContractSlot::Ready { address, .. } => Some(self.domain_for(*address)),
            _ => None,
        }
    }

    fn domain_for(&self, verifying_contract: Address) -> MintDomain {
        MintDomain {
            name: self.domain_name.clone(),
            version: self.domain_version.clone(),
            chain_id: self.chain_id,
            verifying_contract,
        }
    }

    /// Handles a raw request body.
    pub fn handle(&self, body: &[u8]) -> ServiceResponse {
        let issued = self.issue(body).and_then(|response| {
            serde_json::to_value(&response).map_err(|e| SignerError::Signing {
                short: "response encoding failed".into(),
                details: e.to_string(),
            })
        });

        match issued {
            Ok(body) => ServiceResponse { status: 200, body },
            Err(e) => {
                if e.is_client_error() {
                    tracing::debug!("Rejected signature request: {}", e);
                } else {
                    tracing::error!("Signature request failed: {:?}", e);
                }
                ServiceResponse {
                    status: e.status(),
                    body: error_value(&e.to_body()),
                }
            }
        }
    }

    /// Validates a request body and signs it.
    ///
    /// # Errors
    ///
    /// Missing configuration first, then validation errors, then unusable
    /// configuration and signing errors.
    pub fn issue(&self, body: &[u8]) -> SignerResult<MintSignatureResponse> {
        self.require_configured()?;
        let request = validate_body(body)?;

        let signer = self.ready_signer()?;
        let (contract, contract_text) = self.ready_contract()?;
        self.sign_request(signer, contract, contract_text, &request)
    }

    fn require_configured(&self) -> SignerResult<()> {
        if matches!(self.signer, SignerSlot::Missing) {
            return Err(SignerError::MissingSignerKey);
        }
        if matches!(self.contract, ContractSlot::Missing) {
            return Err(SignerError::MissingContractAddress);
        }
        Ok(())
    }

    fn ready_signer(&self) -> SignerResult<&MintSigner> {
        match &self.signer {
            SignerSlot::Missing => Err(SignerError::MissingSignerKey),
            SignerSlot::Invalid(e) => Err(e.clone()),
            SignerSlot::Ready(signer) => Ok(signer),
        }
    }

    fn ready_contract(&self) -> SignerResult<(Address, &str)> {
        match &self.contract {
            ContractSlot::Missing => Err(SignerError::MissingContractAddress),
            ContractSlot::Invalid(text) => Err(SignerError::InvalidConfig(format!(
                "NFT contract address is not an address: {text}"
            ))),
            ContractSlot::Ready { address, text } => Ok((*address, text)),
        }
    }

    fn sign_request(
        &self,
        signer: &MintSigner,
        contract: Address,
        contract_text: &str,
        request: &ValidatedRequest,
    ) -> SignerResult<MintSignatureResponse> {
        let now_ms = self.clock.now_ms();
        let nonce = derive_nonce(request.fid, now_ms);
        let expiry = derive_expiry(now_ms / 1_000);

        let message = MintAuthorization {
            player: request.player,
            score: U256::from(request.score),
            nonce,
            expiry: U256::from(expiry),
            contract,
        };
        let domain = self.domain_for(contract);

        tracing::info!(
            "Signing Mint(player={}, score={}, nonce={}, expiry={}, contract={}) under {} v{} chain {} as {}",
            message.player,
            message.score,
            message.nonce,
            message.expiry,
            message.contract,
            domain.name,
            domain.version,
            domain.chain_id,
            signer.address()
        );
        let signature = signer.sign(&message, &domain)?;

        Ok(MintSignatureResponse {
            signature: signature.to_hex(),
            player: request.player_text.clone(),
            score: request.score,
            nonce: nonce.to_string(),
            expiry: expiry.to_string(),
            nft_contract_address: contract_text.to_string(),
        })
    }
}

/// JSON of an error body. Built field by field so it cannot fail.
fn error_value(body: &ApiErrorBody) -> Value {
    let mut map = Map::new();
    map.insert("error".into(), Value::String(body.error.clone()));
    if let Some(details) = &body.details {
        map.insert("details".into(), Value::String(details.clone()));
    }
    Value::Object(map)
}
