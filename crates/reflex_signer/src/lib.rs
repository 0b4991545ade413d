//! # Reflex Blitz Signer
//!
//! Issues the EIP-712 credential that lets a player mint an achievement NFT
//! for a reaction score.
//!
//! ## Trust Model
//!
//! The service binds `(player, score, nonce, expiry, contract)` under the
//! NFT contract's domain and signs it with a single static key. It keeps no
//! state between requests: replay protection is the contract's used-nonce
//! set, and freshness is the one-hour expiry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = SignerConfig::from_env()?;
//! let service = Arc::new(SignatureService::new(&config, Arc::new(SystemClock)));
//! http::serve(TcpListener::bind("0.0.0.0:3000").await?, service).await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod http;
pub mod nonce;
pub mod service;
pub mod signer;
pub mod validation;

pub use config::{ServerSettings, SignerConfig};
pub use error::{SignerError, SignerResult};
pub use service::{ServiceResponse, SignatureService};
pub use signer::MintSigner;
pub use validation::{validate_body, ValidatedRequest};
