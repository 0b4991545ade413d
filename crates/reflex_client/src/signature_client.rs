//! # Signature Client
//!
//! Phase 1 of minting: ask the signature service to sign a score.

use std::time::Duration;

use async_trait::async_trait;
use reflex_shared::{ApiErrorBody, MintSignatureRequest, MintSignatureResponse};
use thiserror::Error;

/// Failure to obtain a signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureFetchError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// The service's `error` text, or the raw body.
        message: String,
    },

    /// The request never got an answer.
    #[error("Could not reach the signature service: {0}")]
    Transport(String),

    /// The answer was not a signature response.
    #[error("Unexpected signature response: {0}")]
    Decode(String),
}

/// Anything that can issue mint signatures.
#[async_trait]
pub trait SignatureSource: Send + Sync {
    /// Requests a signature for `request`.
    async fn request_signature(
        &self,
        request: &MintSignatureRequest,
    ) -> Result<MintSignatureResponse, SignatureFetchError>;
}

/// [`SignatureSource`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpSignatureClient {
    http: reqwest::Client,
    url: String,
}

impl HttpSignatureClient {
    /// Creates a client for the endpoint at `url`.
    ///
    /// `timeout` bounds the whole request at the transport level as well.
    ///
    /// # Errors
    ///
    /// [`SignatureFetchError::Transport`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SignatureFetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignatureFetchError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SignatureSource for HttpSignatureClient {
    async fn request_signature(
        &self,
        request: &MintSignatureRequest,
    ) -> Result<MintSignatureResponse, SignatureFetchError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| SignatureFetchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SignatureFetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&body).map_or_else(
                |_| String::from_utf8_lossy(&body).into_owned(),
                |error| error.error,
            );
            tracing::warn!("Signature service answered {}: {}", status, message);
            return Err(SignatureFetchError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| SignatureFetchError::Decode(e.to_string()))
    }
}

const ELLIPSIS: &str = "...";

/// Cuts `text` to at most `limit` characters for display, marking the cut.
/// Limits too small for the marker get a plain cut.
#[must_use]
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit <= ELLIPSIS.len() {
        return text.chars().take(limit).collect();
    }
    let mut cut: String = text.chars().take(limit - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_for_display("Invalid score value.", 120), "Invalid score value.");
    }

    #[test]
    fn test_long_text_cut_to_limit() {
        let long = "x".repeat(500);
        let cut = truncate_for_display(&long, 120);
        assert_eq!(cut.chars().count(), 120);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_cut_respects_char_boundaries() {
        let cut = truncate_for_display(&"é".repeat(10), 5);
        assert_eq!(cut, "éé...");
    }

    #[test]
    fn test_tiny_limits_never_exceed_limit() {
        for limit in 0..=4 {
            let cut = truncate_for_display("Invalid score value.", limit);
            assert!(cut.chars().count() <= limit, "limit {limit}: {cut:?}");
        }
        assert_eq!(truncate_for_display("abcdef", 2), "ab");
        assert_eq!(truncate_for_display("abcdef", 3), "abc");
        assert_eq!(truncate_for_display("abcdef", 4), "a...");
    }

    #[test]
    fn test_rejected_displays_server_message() {
        let err = SignatureFetchError::Rejected {
            status: 400,
            message: "Invalid score value.".into(),
        };
        assert_eq!(err.to_string(), "Invalid score value.");
    }
}
