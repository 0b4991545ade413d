//! # Signer Error Types
//!
//! Every failure the signature endpoint can report. The `Display` text of
//! each variant is the exact `error` string returned to the client.

use reflex_shared::ApiErrorBody;
use thiserror::Error;

/// Errors produced by the signature service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// No signing key configured.
    #[error("Server configuration error: Signer key missing.")]
    MissingSignerKey,

    /// No NFT contract address configured.
    #[error("Server configuration error: NFT contract address missing.")]
    MissingContractAddress,

    /// A configured value could not be parsed.
    #[error("Server configuration error: {0}")]
    InvalidConfig(String),

    /// Body is not a JSON object.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// `playerAddress` missing or `score` not a number.
    #[error("Invalid request parameters: playerAddress and score (number) are required.")]
    MissingParameters,

    /// `playerAddress` is not `0x` + 40 hex digits.
    #[error("Invalid playerAddress format.")]
    InvalidPlayerAddress,

    /// `score` negative, fractional, or above the bound.
    #[error("Invalid score value.")]
    InvalidScore,

    /// `fid` present but not an unsigned integer.
    #[error("Invalid fid value.")]
    InvalidFid,

    /// Signing itself failed.
    #[error("Failed to generate signature: {short}")]
    Signing {
        /// Short cause shown to the client.
        short: String,
        /// Full cause.
        details: String,
    },
}

impl SignerError {
    /// HTTP status for this error: client mistakes are 400, the rest 500.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::MalformedBody(_)
            | Self::MissingParameters
            | Self::InvalidPlayerAddress
            | Self::InvalidScore
            | Self::InvalidFid => 400,
            Self::MissingSignerKey
            | Self::MissingContractAddress
            | Self::InvalidConfig(_)
            | Self::Signing { .. } => 500,
        }
    }

    /// True for errors caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status() == 400
    }

    /// JSON body for this error.
    #[must_use]
    pub fn to_body(&self) -> ApiErrorBody {
        match self {
            Self::Signing { details, .. } => ApiErrorBody::with_details(self.to_string(), details),
            _ => ApiErrorBody::new(self.to_string()),
        }
    }
}

/// Result type for signer operations.
pub type SignerResult<T> = Result<T, SignerError>;
