//! # Contract Definitions
//!
//! Solidity interfaces of the two deployed contracts, plus the Rust shape of
//! a mint transaction.

// The sol! macro generates code that we can't document, so allow missing_docs
#![allow(missing_docs)]

use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;

use reflex_shared::MintSignatureResponse;

use crate::chain::ChainError;
use crate::typed_data::{MintAuthorization, TypedSignature};

sol! {
    /// The game-session contract. Gates play behind payment or free-play
    /// allowances and announces each accepted round.
    #[derive(Debug)]
    interface IVRFReflexBlitz {
        /// Emitted when a player's flash request is accepted.
        event FlashRequested(
            address indexed player,
            uint256 requestedAt,
            uint256 remainingPlays,
            uint256 playsPerSession
        );

        function requestFlash() external payable;
        function playPrice() external view returns (uint256);
        function freePlayInterval() external view returns (uint256);
        function playsPerSession() external view returns (uint256);
        function remainingPlays(address player) external view returns (uint256);
        function remainingCooldown(address player) external view returns (uint256);
    }
}

sol! {
    /// The achievement NFT. Mints one token per valid server signature.
    #[derive(Debug)]
    interface IReflexBlitzNFT {
        /// Emitted once the token exists.
        event NFTMinted(
            address indexed player,
            uint256 indexed tokenId,
            uint256 score,
            string rank
        );

        error NonceAlreadyUsed();
        error SignatureExpired();
        error InvalidSigner();
        error IncorrectMintPrice();

        function mintWithSignature(
            address player,
            uint256 score,
            uint256 nonce,
            uint256 expiry,
            bytes signature
        ) external payable;
        function mintPrice() external view returns (uint256);
        function getRankForScore(uint256 score) external pure returns (string);
    }
}

/// Arguments of `mintWithSignature`, taken verbatim from a signature response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintCall {
    /// The signed message.
    pub authorization: MintAuthorization,
    /// Server signature over the message.
    pub signature: TypedSignature,
}

impl MintCall {
    /// Rebuilds the exact signed tuple from the server's response.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Decode`] if any echoed field fails to parse.
    pub fn from_response(response: &MintSignatureResponse) -> Result<Self, ChainError> {
        let player = parse_address("player", &response.player)?;
        let contract = parse_address("nftContractAddress", &response.nft_contract_address)?;
        let nonce = parse_decimal("nonce", &response.nonce)?;
        let expiry = parse_decimal("expiry", &response.expiry)?;
        let signature = TypedSignature::from_hex(&response.signature)
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        Ok(Self {
            authorization: MintAuthorization {
                player,
                score: U256::from(response.score),
                nonce,
                expiry,
                contract,
            },
            signature,
        })
    }
}

fn parse_address(field: &str, text: &str) -> Result<Address, ChainError> {
    text.parse()
        .map_err(|_| ChainError::Decode(format!("{field} is not an address: {text}")))
}

fn parse_decimal(field: &str, text: &str) -> Result<U256, ChainError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ChainError::Decode(format!("{field} is not a decimal integer: {text}")));
    }
    text.parse()
        .map_err(|_| ChainError::Decode(format!("{field} is out of range: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::{SolError, SolEvent};

    fn response() -> MintSignatureResponse {
        MintSignatureResponse {
            signature: format!("0x{}", "ab".repeat(65)),
            player: "0x1111111111111111111111111111111111111111".into(),
            score: 50_000,
            nonce: "42000000001700000000000".into(),
            expiry: "1700003600".into(),
            nft_contract_address: "0x2222222222222222222222222222222222222222".into(),
        }
    }

    #[test]
    fn test_mint_call_from_response() {
        let call = MintCall::from_response(&response()).unwrap();

        assert_eq!(call.authorization.player, Address::repeat_byte(0x11));
        assert_eq!(call.authorization.contract, Address::repeat_byte(0x22));
        assert_eq!(call.authorization.score, U256::from(50_000u64));
        assert_eq!(call.authorization.expiry, U256::from(1_700_003_600u64));
        assert_eq!(
            call.authorization.nonce,
            U256::from(42u64) * U256::from(1_000_000_000u64) + U256::from(1_700_000_000_000u64)
        );
    }

    #[test]
    fn test_mint_call_rejects_hex_nonce() {
        let mut bad = response();
        bad.nonce = "0x10".into();
        assert!(matches!(MintCall::from_response(&bad), Err(ChainError::Decode(_))));
    }

    #[test]
    fn test_event_and_error_identifiers_are_distinct() {
        assert_ne!(
            IVRFReflexBlitz::FlashRequested::SIGNATURE_HASH,
            IReflexBlitzNFT::NFTMinted::SIGNATURE_HASH
        );
        assert_ne!(
            IReflexBlitzNFT::NonceAlreadyUsed::SELECTOR,
            IReflexBlitzNFT::SignatureExpired::SELECTOR
        );
    }
}
