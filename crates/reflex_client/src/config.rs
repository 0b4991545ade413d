//! Client configuration.

use std::env;
use std::time::Duration;

use alloy_primitives::Address;
use reflex_shared::constants::{DEFAULT_CHAIN_ID, DEFAULT_NETWORK_NAME};
use reflex_shared::MINT_SIGNATURE_PATH;
use thiserror::Error;

/// A configuration value that failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {key}: {value}")]
pub struct ConfigError {
    /// Variable name.
    pub key: &'static str,
    /// Offending value.
    pub value: String,
}

/// Settings of the game client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Chain the contracts live on.
    pub chain_id: u64,
    /// Display name of that chain.
    pub network_name: String,
    /// Game-session contract.
    pub game_contract: Address,
    /// NFT contract.
    pub nft_contract: Address,
    /// Full URL of the signature endpoint.
    pub signature_url: String,
    /// Deadline for the signature request.
    pub signature_timeout: Duration,
    /// Deadline for submitting a transaction and for its receipt.
    pub tx_timeout: Duration,
    /// Deadline for the confirming event after the receipt.
    pub event_timeout: Duration,
    /// Longest error text shown to the player.
    pub message_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            network_name: DEFAULT_NETWORK_NAME.to_string(),
            game_contract: Address::ZERO,
            nft_contract: Address::ZERO,
            signature_url: format!("http://127.0.0.1:3000{MINT_SIGNATURE_PATH}"),
            signature_timeout: Duration::from_secs(15),
            tx_timeout: Duration::from_secs(60),
            event_timeout: Duration::from_secs(60),
            message_limit: 120,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REFLEX_CHAIN_ID` - Expected chain id (default: 10143)
    /// - `REFLEX_NETWORK_NAME` - Display name (default: Monad Testnet)
    /// - `REFLEX_GAME_CONTRACT` - Game-session contract address
    /// - `REFLEX_NFT_CONTRACT` - NFT contract address
    /// - `REFLEX_SIGNATURE_URL` - Signature endpoint URL
    /// - `REFLEX_SIGNATURE_TIMEOUT_SECS`, `REFLEX_TX_TIMEOUT_SECS`,
    ///   `REFLEX_EVENT_TIMEOUT_SECS` - Deadlines (default: 15, 60, 60)
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for an address or number that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for an address or number that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            chain_id: parse_or(&read, "REFLEX_CHAIN_ID", defaults.chain_id)?,
            network_name: read("REFLEX_NETWORK_NAME").unwrap_or(defaults.network_name),
            game_contract: parse_or(&read, "REFLEX_GAME_CONTRACT", defaults.game_contract)?,
            nft_contract: parse_or(&read, "REFLEX_NFT_CONTRACT", defaults.nft_contract)?,
            signature_url: read("REFLEX_SIGNATURE_URL").unwrap_or(defaults.signature_url),
            signature_timeout: Duration::from_secs(parse_or(
                &read,
                "REFLEX_SIGNATURE_TIMEOUT_SECS",
                defaults.signature_timeout.as_secs(),
            )?),
            tx_timeout: Duration::from_secs(parse_or(
                &read,
                "REFLEX_TX_TIMEOUT_SECS",
                defaults.tx_timeout.as_secs(),
            )?),
            event_timeout: Duration::from_secs(parse_or(
                &read,
                "REFLEX_EVENT_TIMEOUT_SECS",
                defaults.event_timeout.as_secs(),
            )?),
            message_limit: defaults.message_limit,
        })
    }
}

fn parse_or<T, F>(read: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match read(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
    }
}
