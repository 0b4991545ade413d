//! # Signer Configuration
//!
//! Loaded once at startup: an optional TOML file, then environment
//! overrides. The result is handed to [`crate::SignatureService::new`];
//! request handling never touches the environment.
//!
//! ```toml
//! signer_private_key = "0x..."
//! nft_contract_address = "0x..."
//! domain_name = "ReflexBlitz Achievement NFT"
//! domain_version = "1"
//! chain_id = 10143
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use reflex_shared::constants::{DEFAULT_CHAIN_ID, DEFAULT_DOMAIN_NAME, DEFAULT_DOMAIN_VERSION};

use crate::error::{SignerError, SignerResult};

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_VAR: &str = "REFLEX_SIGNER_CONFIG";

/// Default listen address of the HTTP server.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Signature service configuration.
///
/// Key and contract address are optional here: their absence is reported
/// per request as a configuration error, not at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Hex private key of the server signer.
    pub signer_private_key: Option<String>,
    /// Deployed NFT contract.
    pub nft_contract_address: Option<String>,
    /// EIP-712 domain name.
    pub domain_name: String,
    /// EIP-712 domain version.
    pub domain_version: String,
    /// Chain id of the domain.
    pub chain_id: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            signer_private_key: None,
            nft_contract_address: None,
            domain_name: DEFAULT_DOMAIN_NAME.to_string(),
            domain_version: DEFAULT_DOMAIN_VERSION.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field(
                "signer_private_key",
                &self.signer_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("nft_contract_address", &self.nft_contract_address)
            .field("domain_name", &self.domain_name)
            .field("domain_version", &self.domain_version)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl SignerConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`SignerError::InvalidConfig`] if the document does not parse.
    pub fn from_toml_str(text: &str) -> SignerResult<Self> {
        toml::from_str(text).map_err(|e| SignerError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`SignerError::InvalidConfig`] if the file is unreadable or invalid.
    pub fn from_file(path: &Path) -> SignerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SignerError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Overlays values from `lookup` (normally the process environment).
    ///
    /// Recognized keys: `SIGNER_PRIVATE_KEY`, `NFT_CONTRACT_ADDRESS`,
    /// `EIP712_DOMAIN_NAME`, `EIP712_DOMAIN_VERSION`, `CHAIN_ID`.
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// [`SignerError::InvalidConfig`] if `CHAIN_ID` is not an integer.
    pub fn with_overrides<F>(mut self, lookup: F) -> SignerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = read("SIGNER_PRIVATE_KEY") {
            self.signer_private_key = Some(key);
        }
        if let Some(address) = read("NFT_CONTRACT_ADDRESS") {
            self.nft_contract_address = Some(address);
        }
        if let Some(name) = read("EIP712_DOMAIN_NAME") {
            self.domain_name = name;
        }
        if let Some(version) = read("EIP712_DOMAIN_VERSION") {
            self.domain_version = version;
        }
        if let Some(chain_id) = read("CHAIN_ID") {
            self.chain_id = chain_id
                .trim()
                .parse()
                .map_err(|_| SignerError::InvalidConfig(format!("CHAIN_ID is not an integer: {chain_id}")))?;
        }
        Ok(self)
    }

    /// Loads the file named by `REFLEX_SIGNER_CONFIG` (if set), then
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Propagates file and parse errors.
    pub fn from_env() -> SignerResult<Self> {
        let base = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }
}

/// HTTP server settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    /// Listen address.
    pub bind: SocketAddr,
}

impl ServerSettings {
    /// Reads `SIGNER_BIND`, defaulting to `0.0.0.0:3000`.
    ///
    /// # Errors
    ///
    /// [`SignerError::InvalidConfig`] if the address does not parse.
    pub fn from_env() -> SignerResult<Self> {
        let raw = std::env::var("SIGNER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = raw
            .parse()
            .map_err(|_| SignerError::InvalidConfig(format!("SIGNER_BIND is not an address: {raw}")))?;
        Ok(Self { bind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SignerConfig::default();
        assert_eq!(config.chain_id, 10_143);
        assert_eq!(config.domain_name, "ReflexBlitz Achievement NFT");
        assert_eq!(config.domain_version, "1");
        assert!(config.signer_private_key.is_none());
    }

    #[test]
    fn test_toml_with_partial_fields() {
        let config = SignerConfig::from_toml_str(
            r#"
            nft_contract_address = "0x2222222222222222222222222222222222222222"
            chain_id = 31337
            "#,
        )
        .unwrap();
        assert_eq!(config.chain_id, 31_337);
        assert_eq!(config.domain_version, "1");
        assert!(config.nft_contract_address.is_some());
    }

    #[test]
    fn test_env_overrides_file() {
        let config = SignerConfig::from_toml_str("chain_id = 1")
            .unwrap()
            .with_overrides(env(&[
                ("CHAIN_ID", "10143"),
                ("SIGNER_PRIVATE_KEY", "0x01"),
                ("EIP712_DOMAIN_NAME", ""),
            ]))
            .unwrap();
        assert_eq!(config.chain_id, 10_143);
        assert_eq!(config.signer_private_key.as_deref(), Some("0x01"));
        assert_eq!(config.domain_name, "ReflexBlitz Achievement NFT");
    }

    #[test]
    fn test_bad_chain_id_rejected() {
        let result = SignerConfig::default().with_overrides(env(&[("CHAIN_ID", "monad")]));
        assert!(matches!(result, Err(SignerError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = SignerConfig {
            signer_private_key: Some("0xdeadbeef".into()),
            ..SignerConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("deadbeef"));
        assert!(printed.contains("<redacted>"));
    }
}
