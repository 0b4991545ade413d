//! # EIP-712 Mint Authorization
//!
//! Byte-exact reimplementation of the hashing done by `ReflexBlitzNFT`:
//!
//! ```text
//! MINT_TYPEHASH = keccak256("Mint(address player,uint256 score,uint256 nonce,uint256 expiry,address contract)")
//! structHash    = keccak256(MINT_TYPEHASH || player || score || nonce || expiry || contract)
//! digest        = keccak256(0x19 0x01 || domainSeparator || structHash)
//! ```
//!
//! The domain goes through [`Eip712Domain`]. The struct has a member named
//! `contract`, which is a reserved word in Solidity source, so it is encoded
//! by hand instead of through `sol!`.

use std::borrow::Cow;

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::Eip712Domain;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;

/// Canonical EIP-712 type string of the mint authorization.
pub const MINT_TYPE: &str =
    "Mint(address player,uint256 score,uint256 nonce,uint256 expiry,address contract)";

/// Canonical EIP-712 type string of the domain.
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Errors decoding or recovering a typed-data signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Not valid hex or wrong length.
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// `v` is not 0, 1, 27 or 28.
    #[error("invalid recovery byte {0}")]
    InvalidRecoveryByte(u8),

    /// The curve math rejected the signature.
    #[error("signer recovery failed: {0}")]
    RecoveryFailed(String),
}

/// EIP-712 domain fixed by server configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintDomain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain id.
    pub chain_id: u64,
    /// The NFT contract.
    pub verifying_contract: Address,
}

impl MintDomain {
    /// The equivalent `alloy` domain.
    #[must_use]
    pub fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    /// Computes the domain separator.
    #[must_use]
    pub fn separator(&self) -> B256 {
        self.to_eip712().separator()
    }
}

/// The message a player redeems for one NFT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintAuthorization {
    /// Player the mint is bound to.
    pub player: Address,
    /// Reaction time in microseconds.
    pub score: U256,
    /// Single-use value checked against the contract's used-nonce set.
    pub nonce: U256,
    /// Unix seconds after which the contract rejects the signature.
    pub expiry: U256,
    /// NFT contract address (repeated inside the message).
    pub contract: Address,
}

impl MintAuthorization {
    /// `keccak256` of [`MINT_TYPE`].
    #[must_use]
    pub fn type_hash() -> B256 {
        keccak256(MINT_TYPE.as_bytes())
    }

    /// EIP-712 `hashStruct` of this message.
    #[must_use]
    pub fn struct_hash(&self) -> B256 {
        let mut encoded = Vec::with_capacity(32 * 6);
        encoded.extend_from_slice(Self::type_hash().as_slice());
        encoded.extend_from_slice(&address_word(self.player));
        encoded.extend_from_slice(&self.score.to_be_bytes::<32>());
        encoded.extend_from_slice(&self.nonce.to_be_bytes::<32>());
        encoded.extend_from_slice(&self.expiry.to_be_bytes::<32>());
        encoded.extend_from_slice(&address_word(self.contract));
        keccak256(&encoded)
    }

    /// Final 32-byte digest that gets signed.
    #[must_use]
    pub fn signing_hash(&self, domain: &MintDomain) -> B256 {
        let mut encoded = [0u8; 66];
        encoded[0] = 0x19;
        encoded[1] = 0x01;
        encoded[2..34].copy_from_slice(domain.separator().as_slice());
        encoded[34..66].copy_from_slice(self.struct_hash().as_slice());
        keccak256(encoded)
    }
}

/// An `r || s || v` signature with `v` in {27, 28}.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypedSignature(pub [u8; SIGNATURE_LEN]);

impl TypedSignature {
    /// Builds from a k256 signature and its recovery id.
    #[must_use]
    pub fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Self(bytes)
    }

    /// Parses `0x`-prefixed (or bare) hex.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Malformed`] on bad hex or wrong length.
    pub fn from_hex(text: &str) -> Result<Self, SignatureError> {
        let raw = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(raw).map_err(|e| SignatureError::Malformed(e.to_string()))?;
        let array: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            SignatureError::Malformed(format!("expected {SIGNATURE_LEN} bytes, got {}", v.len()))
        })?;
        Ok(Self(array))
    }

    /// `0x`-prefixed lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Recovers the address that produced this signature over `digest`.
    ///
    /// # Errors
    ///
    /// Fails if `v` is out of range or the signature is not on the curve.
    pub fn recover(&self, digest: B256) -> Result<Address, SignatureError> {
        let v = self.0[64];
        let normalized = if v >= 27 { v - 27 } else { v };
        let recovery_id =
            RecoveryId::from_byte(normalized).ok_or(SignatureError::InvalidRecoveryByte(v))?;
        let signature = Signature::from_slice(&self.0[..64])
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
            .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;
        Ok(address_of(&key))
    }
}

/// Ethereum address of a public key: last 20 bytes of `keccak256(x || y)`.
#[must_use]
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Left-pads an address to a 32-byte ABI word.
fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}
