use crate::error::ConfigError;
use crate::pipeline::dedup::DEFAULT_MAX_PROCESSED;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelBackend {
    Json,
    Sqlite,
}

impl FromStr for LabelBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LabelBackend::Json),
            "sqlite" => Ok(LabelBackend::Sqlite),
            other => Err(ConfigError::InvalidValue(format!(
                "LABEL_BACKEND must be 'json' or 'sqlite', got '{}'",
                other
            ))),
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Lark bot webhook; `None` only allowed in dry-run mode
    pub webhook_url: Option<String>,
    pub state_file: String,
    pub label_backend: LabelBackend,
    pub labels_file: String,
    pub labels_db_path: String,
    pub notify_delay: Duration,
    pub lookback_blocks: u64,
    pub max_transfers_per_token: usize,
    pub max_processed_keys: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            state_file: "last_state.json".to_string(),
            label_backend: LabelBackend::Json,
            labels_file: "exchange_addresses.json".to_string(),
            labels_db_path: "labels.db".to_string(),
            notify_delay: Duration::from_millis(1000),
            lookback_blocks: 500,
            max_transfers_per_token: 100,
            max_processed_keys: DEFAULT_MAX_PROCESSED,
        }
    }
}

/// Parse a numeric env var, falling back to `default` on absence or garbage
fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Retention cap must keep at least one key; above the default only warns
fn check_max_processed_keys(max_keys: usize) -> Result<usize, ConfigError> {
    if max_keys == 0 {
        return Err(ConfigError::InvalidValue(
            "MAX_PROCESSED_KEYS must be at least 1".to_string(),
        ));
    }
    if max_keys > DEFAULT_MAX_PROCESSED {
        log::warn!(
            "MAX_PROCESSED_KEYS={} exceeds the usual cap of {}; state file will grow accordingly",
            max_keys,
            DEFAULT_MAX_PROCESSED
        );
    }
    Ok(max_keys)
}

impl RuntimeConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LARK_WEBHOOK_URL` (required unless `require_webhook` is false)
    /// - `STATE_FILE` (default: last_state.json)
    /// - `LABEL_BACKEND` (default: json; json | sqlite)
    /// - `LABELS_FILE` (default: exchange_addresses.json)
    /// - `LABELS_DB_PATH` (default: labels.db)
    /// - `NOTIFY_DELAY_MS` (default: 1000)
    /// - `LOOKBACK_BLOCKS` (default: 500)
    /// - `MAX_TRANSFERS_PER_TOKEN` (default: 100)
    /// - `MAX_PROCESSED_KEYS` (default: 1000)
    pub fn from_env(require_webhook: bool) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let webhook_url = env::var("LARK_WEBHOOK_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        if require_webhook && webhook_url.is_none() {
            return Err(ConfigError::MissingVariable("LARK_WEBHOOK_URL".to_string()));
        }

        if let Some(url) = &webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(
                    "LARK_WEBHOOK_URL must start with http:// or https://".to_string(),
                ));
            }
        }

        let label_backend = match env::var("LABEL_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.label_backend,
        };

        Ok(Self {
            webhook_url,
            state_file: env::var("STATE_FILE").unwrap_or(defaults.state_file),
            label_backend,
            labels_file: env::var("LABELS_FILE").unwrap_or(defaults.labels_file),
            labels_db_path: env::var("LABELS_DB_PATH").unwrap_or(defaults.labels_db_path),
            notify_delay: Duration::from_millis(parse_env("NOTIFY_DELAY_MS", 1000u64)),
            lookback_blocks: parse_env("LOOKBACK_BLOCKS", defaults.lookback_blocks),
            max_transfers_per_token: parse_env("MAX_TRANSFERS_PER_TOKEN", defaults.max_transfers_per_token),
            max_processed_keys: check_max_processed_keys(parse_env(
                "MAX_PROCESSED_KEYS",
                defaults.max_processed_keys,
            ))?,
        })
    }
}

/// Read the API key named by a chain's `api_key_env`
pub fn chain_api_key(var_name: &str) -> Option<String> {
    env::var(var_name).ok().filter(|key| !key.trim().is_empty())
}
