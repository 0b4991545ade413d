//! # Request Validation
//!
//! Checks run in a fixed order so the first failure decides the message:
//!
//! 1. body is a JSON object
//! 2. `playerAddress` present and `score` is a JSON number
//! 3. `playerAddress` matches `0x` + 40 hex digits
//! 4. `score` is an integer in `[0, 100_000_000]`
//! 5. `fid`, if present, is an unsigned integer (number or numeric string)

use alloy_primitives::Address;
use reflex_shared::{is_player_address, FidValue, MAX_SCORE_MICROS};
use serde_json::Value;

use crate::error::{SignerError, SignerResult};

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// Parsed player address.
    pub player: Address,
    /// Address exactly as the client sent it (echoed back).
    pub player_text: String,
    /// Score in microseconds.
    pub score: u64,
    /// Session id, `None` when absent or zero.
    pub fid: Option<u64>,
}

/// Validates a raw request body.
///
/// # Errors
///
/// The first failed check, as a 400-class [`SignerError`].
pub fn validate_body(body: &[u8]) -> SignerResult<ValidatedRequest> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| SignerError::MalformedBody(e.to_string()))?;
    validate_value(&value)
}

/// Validates an already-parsed JSON body.
///
/// # Errors
///
/// The first failed check, as a 400-class [`SignerError`].
pub fn validate_value(value: &Value) -> SignerResult<ValidatedRequest> {
    let object = value
        .as_object()
        .ok_or_else(|| SignerError::MalformedBody("expected a JSON object".into()))?;

    let player_text = object
        .get("playerAddress")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let score = object.get("score").filter(|v| v.is_number());
    let (Some(player_text), Some(score)) = (player_text, score) else {
        return Err(SignerError::MissingParameters);
    };

    if !is_player_address(player_text) {
        return Err(SignerError::InvalidPlayerAddress);
    }
    let player: Address = player_text
        .parse()
        .map_err(|_| SignerError::InvalidPlayerAddress)?;

    let score = parse_score(score)?;
    let fid = parse_fid(object.get("fid"))?;

    Ok(ValidatedRequest {
        player,
        player_text: player_text.to_string(),
        score,
        fid,
    })
}

fn parse_score(score: &Value) -> SignerResult<u64> {
    // 50000.0 is a whole number and accepted; 50000.5 is not.
    let micros = match score.as_u64() {
        Some(micros) => micros,
        None => match score.as_f64() {
            Some(f) if f.fract() == 0.0 && (0.0..=MAX_SCORE_MICROS as f64).contains(&f) => {
                f as u64
            }
            _ => return Err(SignerError::InvalidScore),
        },
    };
    if micros > MAX_SCORE_MICROS {
        return Err(SignerError::InvalidScore);
    }
    Ok(micros)
}

fn parse_fid(fid: Option<&Value>) -> SignerResult<Option<u64>> {
    match fid {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => {
            let parsed: FidValue =
                serde_json::from_value(raw.clone()).map_err(|_| SignerError::InvalidFid)?;
            let fid = parsed.as_u64().ok_or(SignerError::InvalidFid)?;
            Ok((fid > 0).then_some(fid))
        }
    }
}
