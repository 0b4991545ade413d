//! # Mint Rejection Taxonomy
//!
//! A closed set of reasons the NFT contract rejects a mint. Each tag is
//! matched either by the 4-byte custom-error selector or by a fixed list
//! of stable keys in the revert text. Anything else lands in
//! [`MintRejection::Unclassified`] with the raw text preserved.

use std::fmt;

use alloy_sol_types::SolError;

use crate::contracts::IReflexBlitzNFT;

/// Why the NFT contract refused a mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintRejection {
    /// The nonce is already in the contract's used set.
    NonceAlreadyUsed,
    /// `block.timestamp > expiry`.
    SignatureExpired,
    /// Recovered signer is not the configured server signer.
    InvalidSigner,
    /// `msg.value != mintPrice`.
    IncorrectMintPrice,
    /// Anything not matched above.
    Unclassified(String),
}

const NONCE_KEYS: &[&str] = &["noncealreadyused", "nonce already used", "nonce used"];
const EXPIRY_KEYS: &[&str] = &["signatureexpired", "signature expired"];
const SIGNER_KEYS: &[&str] = &["invalidsigner", "invalid signer", "invalid signature"];
const PRICE_KEYS: &[&str] = &["incorrectmintprice", "incorrect mint price", "incorrect payment"];

fn contains_any(haystack: &str, keys: &[&str]) -> bool {
    keys.iter().any(|key| haystack.contains(key))
}

impl MintRejection {
    /// Classifies a revert reason reported as text.
    #[must_use]
    pub fn from_reason(reason: &str) -> Self {
        let lowered = reason.to_ascii_lowercase();
        if contains_any(&lowered, NONCE_KEYS) {
            Self::NonceAlreadyUsed
        } else if contains_any(&lowered, EXPIRY_KEYS) {
            Self::SignatureExpired
        } else if contains_any(&lowered, SIGNER_KEYS) {
            Self::InvalidSigner
        } else if contains_any(&lowered, PRICE_KEYS) {
            Self::IncorrectMintPrice
        } else {
            Self::Unclassified(reason.to_string())
        }
    }

    /// Classifies raw revert data by its custom-error selector.
    #[must_use]
    pub fn from_revert_data(data: &[u8]) -> Self {
        let Some(selector) = data.get(..4) else {
            return Self::Unclassified(format!("0x{}", hex::encode(data)));
        };
        if selector == IReflexBlitzNFT::NonceAlreadyUsed::SELECTOR {
            Self::NonceAlreadyUsed
        } else if selector == IReflexBlitzNFT::SignatureExpired::SELECTOR {
            Self::SignatureExpired
        } else if selector == IReflexBlitzNFT::InvalidSigner::SELECTOR {
            Self::InvalidSigner
        } else if selector == IReflexBlitzNFT::IncorrectMintPrice::SELECTOR {
            Self::IncorrectMintPrice
        } else {
            Self::Unclassified(format!("0x{}", hex::encode(data)))
        }
    }

    /// Player-facing text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NonceAlreadyUsed => {
                "This signature was already used. Please mint again for a fresh one.".to_string()
            }
            Self::SignatureExpired => {
                "The mint signature expired. Please mint again.".to_string()
            }
            Self::InvalidSigner => {
                "The mint signature was not accepted by the contract.".to_string()
            }
            Self::IncorrectMintPrice => {
                "Incorrect mint price. Please refresh and try again.".to_string()
            }
            Self::Unclassified(raw) => format!("Minting failed: {raw}"),
        }
    }
}

impl fmt::Display for MintRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}
