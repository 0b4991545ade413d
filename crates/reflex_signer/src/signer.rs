//! # Typed-Data Signer
//!
//! Holds the server's secp256k1 key and signs [`MintAuthorization`]s under a
//! [`MintDomain`]. The key is parsed once and never mutated, so a single
//! signer is shared by every request through an `Arc`.

use std::fmt;

use k256::ecdsa::SigningKey;
use reflex_blockchain::{address_of, MintAuthorization, MintDomain, TypedSignature};

use alloy_primitives::Address;

use crate::error::{SignerError, SignerResult};

/// The server's mint-signing identity.
pub struct MintSigner {
    key: SigningKey,
    address: Address,
}

impl fmt::Debug for MintSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl MintSigner {
    /// Parses a 32-byte hex private key, with or without `0x`.
    ///
    /// # Errors
    ///
    /// [`SignerError::Signing`] if the text is not a valid secp256k1 scalar.
    pub fn from_hex(text: &str) -> SignerResult<Self> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| SignerError::Signing {
            short: "invalid private key".into(),
            details: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Builds from raw key bytes.
    ///
    /// # Errors
    ///
    /// [`SignerError::Signing`] if the bytes are not a valid secp256k1 scalar.
    pub fn from_bytes(bytes: &[u8]) -> SignerResult<Self> {
        let key = SigningKey::from_slice(bytes).map_err(|e| SignerError::Signing {
            short: "invalid private key".into(),
            details: e.to_string(),
        })?;
        let address = address_of(key.verifying_key());
        Ok(Self { key, address })
    }

    /// Address the NFT contract must have as its trusted signer.
    #[inline]
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Signs `message` under `domain`.
    ///
    /// # Errors
    ///
    /// [`SignerError::Signing`] if the curve operation fails.
    pub fn sign(
        &self,
        message: &MintAuthorization,
        domain: &MintDomain,
    ) -> SignerResult<TypedSignature> {
        let digest = message.signing_hash(domain);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|e| SignerError::Signing {
                short: "signing failed".into(),
                details: e.to_string(),
            })?;
        Ok(TypedSignature::from_parts(&signature, recovery_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    fn domain() -> MintDomain {
        MintDomain {
            name: "ReflexBlitz Achievement NFT".into(),
            version: "1".into(),
            chain_id: 10_143,
            verifying_contract: Address::repeat_byte(0x22),
        }
    }

    fn message() -> MintAuthorization {
        MintAuthorization {
            player: Address::repeat_byte(0x11),
            score: U256::from(50_000u64),
            nonce: U256::from(1_700_000_000_000u64),
            expiry: U256::from(1_700_003_600u64),
            contract: Address::repeat_byte(0x22),
        }
    }

    #[test]
    fn test_known_key_address() {
        let signer = MintSigner::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            signer.address(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_signature_recovers_to_signer() {
        let signer = MintSigner::from_bytes(&[7u8; 32]).unwrap();
        let signature = signer.sign(&message(), &domain()).unwrap();

        let digest = message().signing_hash(&domain());
        assert_eq!(signature.recover(digest).unwrap(), signer.address());
        assert!(matches!(signature.as_bytes()[64], 27 | 28));
    }

    #[test]
    fn test_signature_bound_to_domain() {
        let signer = MintSigner::from_bytes(&[7u8; 32]).unwrap();
        let signature = signer.sign(&message(), &domain()).unwrap();

        let other_chain = MintDomain {
            chain_id: 1,
            ..domain()
        };
        let digest = message().signing_hash(&other_chain);
        assert_ne!(signature.recover(digest).ok(), Some(signer.address()));
    }

    #[test]
    fn test_bad_keys_rejected() {
        assert!(matches!(MintSigner::from_hex("0xzz"), Err(SignerError::Signing { .. })));
        assert!(matches!(MintSigner::from_bytes(&[0u8; 32]), Err(SignerError::Signing { .. })));
        assert!(MintSigner::from_hex("01").is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = MintSigner::from_hex(KEY_ONE).unwrap();
        let printed = format!("{signer:?}");
        assert!(printed.contains("address"));
        assert!(!printed.contains("key"));
    }
}
