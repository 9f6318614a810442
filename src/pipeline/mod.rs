//! Transfer monitoring pipeline
//!
//! ## Architecture
//!
//! ```text
//! LedgerReader ─┐
//! PriceOracle ──┼─► MonitorEngine ─► classify ─► Notifier
//! LabelResolver ┘        │
//!                        └─► MonitorState (processed keys)
//! ```
//!
//! `types`, `labels`, `classifier` and `dedup` are pure and synchronous.
//! `explorer`, `coingecko`, `notifier` and `label_store` hold the I/O
//! collaborators behind traits so the engine can be driven by fakes.

pub mod alert;
pub mod classifier;
pub mod coingecko;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod explorer;
pub mod label_store;
pub mod labels;
pub mod notifier;
pub mod types;

pub use alert::Alert;
pub use classifier::{classify, ClassifierPolicy};
pub use coingecko::{CoinGeckoClient, PriceOracle};
pub use config::{ChainConfig, MonitorConfig, TokenConfig};
pub use dedup::MonitorState;
pub use engine::{EngineOptions, MonitorEngine, RunSummary};
pub use explorer::{EtherscanClient, LedgerReader};
pub use label_store::{JsonLabelStore, LabelStore, SqliteLabelStore};
pub use labels::LabelResolver;
pub use notifier::{DryRunNotifier, LarkNotifier, Notifier};
pub use types::{ClassificationResult, MonitorMode, NotificationType, RawTransfer, SkipReason, Transfer};
