//! # Signature Endpoint Protocol
//!
//! JSON bodies exchanged on `POST /api/generate-mint-signature`.
//!
//! Large integers (`nonce`, `expiry`) travel as decimal strings so that no
//! JSON implementation rounds them.

use serde::{Deserialize, Serialize};

/// Route of the signature endpoint.
pub const MINT_SIGNATURE_PATH: &str = "/api/generate-mint-signature";

/// Optional session id; clients send it either as a number or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FidValue {
    /// `"fid": 1234`
    Number(u64),
    /// `"fid": "1234"`
    Text(String),
}

impl FidValue {
    /// Numeric value, if the text form parses as an unsigned integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Body of a signature request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintSignatureRequest {
    /// `0x`-prefixed, 40 hex chars.
    pub player_address: String,
    /// Reaction time in microseconds.
    pub score: u64,
    /// Optional session id mixed into the nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<FidValue>,
}

/// Body of a successful signature response.
///
/// Every field except `signature` echoes exactly what was signed, so the
/// client can replay it verbatim into `mintWithSignature`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintSignatureResponse {
    /// 65-byte `r || s || v` signature, `0x`-prefixed hex.
    pub signature: String,
    /// Player address exactly as submitted.
    pub player: String,
    /// Score exactly as submitted.
    pub score: u64,
    /// Decimal string.
    pub nonce: String,
    /// Decimal string, Unix seconds.
    pub expiry: String,
    /// Contract the signature is bound to.
    pub nft_contract_address: String,
}

/// Body of a 4xx/5xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human readable message.
    pub error: String,
    /// Underlying cause, for server errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiErrorBody {
    /// Error without details.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Error with details.
    #[must_use]
    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Returns true for `0x` followed by exactly 40 hex digits (either case).
#[must_use]
pub fn is_player_address(candidate: &str) -> bool {
    candidate
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_address_pattern() {
        assert!(is_player_address("0x00000000000000000000000000000000000000aB"));
        assert!(is_player_address("0xABCDEFabcdef0123456789ABCDEFabcdef012345"));

        assert!(!is_player_address("00000000000000000000000000000000000000ab"));
        assert!(!is_player_address("0x0000000000000000000000000000000000000a"));
        assert!(!is_player_address("0x00000000000000000000000000000000000000abc"));
        assert!(!is_player_address("0x000000000000000000000000000000000000000g"));
        assert!(!is_player_address("0X00000000000000000000000000000000000000ab"));
        assert!(!is_player_address(""));
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request = MintSignatureRequest {
            player_address: "0x1111111111111111111111111111111111111111".to_string(),
            score: 50_000,
            fid: None,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["playerAddress"], "0x1111111111111111111111111111111111111111");
        assert_eq!(json["score"], 50_000);
        assert!(json.get("fid").is_none());
    }

    #[test]
    fn test_fid_accepts_number_or_string() {
        let as_number: MintSignatureRequest = serde_json::from_str(
            r#"{"playerAddress":"0x1111111111111111111111111111111111111111","score":1,"fid":42}"#,
        )
        .unwrap();
        let as_text: MintSignatureRequest = serde_json::from_str(
            r#"{"playerAddress":"0x1111111111111111111111111111111111111111","score":1,"fid":"42"}"#,
        )
        .unwrap();

        assert_eq!(as_number.fid.and_then(|f| f.as_u64()), Some(42));
        assert_eq!(as_text.fid.and_then(|f| f.as_u64()), Some(42));
        assert_eq!(FidValue::Text("abc".into()).as_u64(), None);
    }

    #[test]
    fn test_response_field_names() {
        let response = MintSignatureResponse {
            signature: "0xabc".into(),
            player: "0x1111111111111111111111111111111111111111".into(),
            score: 50_000,
            nonce: "1700000000000".into(),
            expiry: "1700003600".into(),
            nft_contract_address: "0x2222222222222222222222222222222222222222".into(),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["nftContractAddress"], "0x2222222222222222222222222222222222222222");
        assert_eq!(json["nonce"], "1700000000000");
        assert_eq!(json["score"], 50_000);
    }

    #[test]
    fn test_error_body_omits_empty_details() {
        let json = serde_json::to_string(&ApiErrorBody::new("Invalid score value.")).unwrap();
        assert_eq!(json, r#"{"error":"Invalid score value."}"#);
    }
}
