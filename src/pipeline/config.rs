//! Monitor configuration loaded from `config.yaml`
//!
//! Example:
//! ```yaml
//! usd_threshold: 100000
//! coingecko_api_url: https://api.coingecko.com/api/v3
//! exchanges: [Binance, OKX, Coinbase]
//! deposit_keywords: [Deposit]
//! chains:
//!   - name: Ethereum
//!     explorer_api: https://api.etherscan.io/api
//!     explorer_url: https://etherscan.io
//!     api_key_env: ETHERSCAN_API_KEY
//!     tokens:
//!       - symbol: USDT
//!         name: Tether USD
//!         contract: "0xdac17f958d2ee523a2206206994597c13d831ec7"
//!         decimals: 6
//!         coingecko_id: tether
//!         monitor_mode: whale_transfer
//! ```

use super::classifier::ClassifierPolicy;
use super::types::MonitorMode;
use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_coingecko_api_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub chains: Vec<ChainConfig>,
    /// Inclusive: a transfer worth exactly this much notifies
    pub usd_threshold: Decimal,
    #[serde(default)]
    pub exchanges: Vec<String>,
    #[serde(default)]
    pub deposit_keywords: Vec<String>,
    #[serde(default = "default_coingecko_api_url")]
    pub coingecko_api_url: String,
}

/// One monitored chain and its explorer endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    /// Etherscan-compatible API endpoint
    pub explorer_api: String,
    /// Explorer UI base URL, used for transaction links
    pub explorer_url: String,
    /// Environment variable holding this chain's explorer API key
    pub api_key_env: String,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub name: String,
    pub contract: String,
    pub decimals: u8,
    /// Price asset id on the quote service
    pub coingecko_id: String,
    pub monitor_mode: MonitorMode,
}

impl MonitorConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.usd_threshold < Decimal::ZERO {
            return Err(ConfigError::InvalidValue(format!(
                "usd_threshold must be a non-negative number, got {}",
                self.usd_threshold
            )));
        }

        for chain in &self.chains {
            if chain.name.is_empty() {
                return Err(ConfigError::InvalidValue("chain name cannot be empty".to_string()));
            }
            for token in &chain.tokens {
                if let MonitorMode::Unknown(mode) = &token.monitor_mode {
                    // Not fatal: the token stays configured but never notifies
                    log::warn!(
                        "Unknown monitor_mode '{}' for {} on {}; it will never notify",
                        mode,
                        token.symbol,
                        chain.name
                    );
                }
            }
        }

        if self.exchanges.is_empty() || self.deposit_keywords.is_empty() {
            log::warn!("exchanges or deposit_keywords is empty; exchange_deposit tokens will never notify");
        }

        Ok(())
    }

    pub fn policy(&self) -> ClassifierPolicy {
        ClassifierPolicy::new(
            self.usd_threshold,
            self.exchanges.clone(),
            self.deposit_keywords.clone(),
        )
    }
}
