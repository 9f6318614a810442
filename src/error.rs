//! Error types shared across the monitor
//!
//! Each collaborator boundary has its own error enum so the coordinator can
//! decide at which scope a failure is contained (chain, token, transfer).

use thiserror::Error;

/// Fatal configuration problems. These abort the run before any processing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors from the explorer and price APIs
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Errors from alert delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook rejected message: {0}")]
    Rejected(String),
}

/// Errors from the label store and run-state persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A single explorer record that cannot be turned into a transfer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("malformed amount '{0}'")]
    MalformedAmount(String),

    #[error("malformed timestamp '{0}'")]
    MalformedTimestamp(String),
}
