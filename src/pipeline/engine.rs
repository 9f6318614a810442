//! Monitor Engine - one classification pass over every configured token
//!
//! ## Flow
//!
//! ```text
//! for chain in config.chains          (skip chain if its API key is missing)
//!   for token in chain.tokens
//!     PriceOracle::fetch_price        (skip token if absent)
//!     LedgerReader::fetch_transfers   (skip token on error)
//!     sort newest first, keep the most recent N
//!     for transfer
//!       dedup → value → labels → classify
//!       notify? Notifier::send → record key only on success
//!       skip?   record key
//! trim processed keys to the retention cap
//! ```
//!
//! Every failure is contained at the narrowest scope (chain, token,
//! transfer) and logged with enough context to find the record again.
//! Nothing here is fatal; the run always yields a `RunSummary`.

use super::alert::Alert;
use super::classifier::{classify, ClassifierPolicy};
use super::coingecko::PriceOracle;
use super::config::{ChainConfig, MonitorConfig, TokenConfig};
use super::dedup::{MonitorState, DEFAULT_MAX_PROCESSED};
use super::explorer::LedgerReader;
use super::labels::LabelResolver;
use super::notifier::Notifier;
use super::types::{processed_key, NotificationType, RawTransfer, Transfer};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Tunables for a run
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Pause after every dispatched alert (rate-limit courtesy)
    pub notify_delay: Duration,
    /// Most recent transfers considered per token
    pub max_transfers_per_token: usize,
    /// Retention cap for processed keys
    pub max_processed_keys: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            notify_delay: Duration::from_secs(1),
            max_transfers_per_token: 100,
            max_processed_keys: DEFAULT_MAX_PROCESSED,
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Alerts delivered successfully
    pub notifications: usize,
    /// Transfers run through the classifier
    pub evaluated: usize,
    /// Transfers skipped as already processed
    pub duplicates: usize,
    /// Transfers dropped for a malformed amount or timestamp
    pub malformed: usize,
    /// Alerts the notifier failed to deliver (left for retry)
    pub delivery_failures: usize,
    pub skipped_tokens: usize,
    pub skipped_chains: usize,
}

type ApiKeyFn = Box<dyn Fn(&ChainConfig) -> Option<String> + Send + Sync>;

pub struct MonitorEngine {
    config: MonitorConfig,
    policy: ClassifierPolicy,
    ledger: Arc<dyn LedgerReader>,
    prices: Arc<dyn PriceOracle>,
    notifier: Arc<dyn Notifier>,
    options: EngineOptions,

    /// Chain API key lookup (environment by default, injectable for tests)
    api_key_fn: ApiKeyFn,
}

impl MonitorEngine {
    pub fn new(
        config: MonitorConfig,
        ledger: Arc<dyn LedgerReader>,
        prices: Arc<dyn PriceOracle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let policy = config.policy();
        Self {
            config,
            policy,
            ledger,
            prices,
            notifier,
            options: EngineOptions::default(),
            api_key_fn: Box::new(|chain| crate::config::chain_api_key(&chain.api_key_env)),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_api_key_fn(mut self, api_key_fn: ApiKeyFn) -> Self {
        self.api_key_fn = api_key_fn;
        self
    }

    /// Run one pass over all chains and tokens
    ///
    /// `state` is mutated in place so the caller can persist whatever was
    /// recorded even if it decides to stop afterwards.
    pub async fn run(&self, state: &mut MonitorState, labels: &LabelResolver) -> RunSummary {
        let mut summary = RunSummary::default();

        for chain in &self.config.chains {
            log::info!("🔗 Checking chain: {}", chain.name);

            let Some(api_key) = (self.api_key_fn)(chain) else {
                log::error!("❌ API Key not found: {} (chain {})", chain.api_key_env, chain.name);
                summary.skipped_chains += 1;
                continue;
            };

            for token in &chain.tokens {
                self.process_token(chain, &api_key, token, state, labels, &mut summary)
                    .await;
            }
        }

        state.trim(self.options.max_processed_keys);
        summary
    }

    async fn process_token(
        &self,
        chain: &ChainConfig,
        api_key: &str,
        token: &TokenConfig,
        state: &mut MonitorState,
        labels: &LabelResolver,
        summary: &mut RunSummary,
    ) {
        log::info!("📊 Checking {} on {}...", token.symbol, chain.name);

        let price = match self.prices.fetch_price(&token.coingecko_id).await {
            Ok(Some(price)) if price > Decimal::ZERO => price,
            Ok(_) => {
                log::warn!("⚠️  Failed to get price for {}, skipping...", token.symbol);
                summary.skipped_tokens += 1;
                return;
            }
            Err(e) => {
                log::warn!("⚠️  Failed to get price for {} ({}), skipping...", token.symbol, e);
                summary.skipped_tokens += 1;
                return;
            }
        };
        log::info!("💵 Current price: ${:.6}", price);

        let raw = match self
            .ledger
            .fetch_transfers(&chain.explorer_api, api_key, &token.contract)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("❌ Failed to fetch {} transfers on {}: {}", token.symbol, chain.name, e);
                summary.skipped_tokens += 1;
                return;
            }
        };

        if raw.is_empty() {
            log::info!("ℹ️  No transactions found");
            return;
        }

        let window = self.recent_window(chain, token, raw, summary);
        log::info!("📝 Found {} transactions", window.len());

        let mut notified = 0;
        for (timestamp, raw) in window {
            let key = processed_key(&chain.name, &token.symbol, &raw.hash);
            if !state.is_novel(&key) {
                summary.duplicates += 1;
                continue;
            }

            let raw_amount = match raw.parse_amount() {
                Ok(amount) => amount,
                Err(e) => {
                    log::warn!(
                        "Invalid transaction value: {} on {}/{} ({})",
                        raw.hash,
                        chain.name,
                        token.symbol,
                        e
                    );
                    summary.malformed += 1;
                    continue;
                }
            };

            let transfer = Transfer {
                tx_hash: raw.hash,
                from_address: raw.from.to_lowercase(),
                to_address: raw.to.to_lowercase(),
                raw_amount,
                timestamp,
            };
            let usd_value = transfer.usd_value(token.decimals, price);
            let (from_label, to_label) = labels.resolve_pair(&transfer.from_address, &transfer.to_address);

            let result = classify(&transfer, usd_value, to_label, from_label, &token.monitor_mode, &self.policy);
            summary.evaluated += 1;

            let notification_type = match result.notification_type {
                Some(notification_type) if result.should_notify => notification_type,
                _ => {
                    if let Some(reason) = result.skip_reason {
                        log::debug!("Skip {} ({}): {}", transfer.tx_hash, key, reason);
                    }
                    state.record(key);
                    continue;
                }
            };

            let alert = Alert {
                notification_type,
                chain_name: chain.name.clone(),
                explorer_url: chain.explorer_url.clone(),
                token_symbol: token.symbol.clone(),
                token_name: token.name.clone(),
                amount: transfer.token_amount(token.decimals),
                usd_value,
                usd_threshold: self.policy.usd_threshold,
                from_address: transfer.from_address.clone(),
                from_label: from_label.map(str::to_string),
                to_address: transfer.to_address.clone(),
                to_label: to_label.map(str::to_string),
                matched_exchange: result.matched_exchange,
                tx_hash: transfer.tx_hash.clone(),
                timestamp: transfer.timestamp,
            };

            match self.notifier.send(&alert).await {
                Ok(()) => {
                    log::info!(
                        "✅ Notified: {}... (${:.2}, {})",
                        transfer.tx_hash.get(..10).unwrap_or(&transfer.tx_hash),
                        usd_value,
                        describe(notification_type)
                    );
                    state.record(key);
                    notified += 1;
                    summary.notifications += 1;
                }
                Err(e) => {
                    // Not recorded: the transfer is retried on the next run
                    log::error!(
                        "❌ Failed to send notification for {} on {}/{}: {}",
                        transfer.tx_hash,
                        chain.name,
                        token.symbol,
                        e
                    );
                    summary.delivery_failures += 1;
                }
            }

            if !self.options.notify_delay.is_zero() {
                tokio::time::sleep(self.options.notify_delay).await;
            }
        }

        log::info!("✅ {}: {} notifications sent", token.symbol, notified);
    }

    /// Newest-first window of at most `max_transfers_per_token` records
    ///
    /// Records with an unparsable timestamp cannot be ordered and are
    /// dropped here, one at a time.
    fn recent_window(
        &self,
        chain: &ChainConfig,
        token: &TokenConfig,
        raw: Vec<RawTransfer>,
        summary: &mut RunSummary,
    ) -> Vec<(i64, RawTransfer)> {
        let mut timed: Vec<(i64, RawTransfer)> = raw
            .into_iter()
            .filter_map(|record| match record.parse_timestamp() {
                Ok(ts) => Some((ts, record)),
                Err(e) => {
                    log::warn!(
                        "Invalid transaction timestamp: {} on {}/{} ({})",
                        record.hash,
                        chain.name,
                        token.symbol,
                        e
                    );
                    summary.malformed += 1;
                    None
                }
            })
            .collect();

        timed.sort_by(|a, b| b.0.cmp(&a.0));
        timed.truncate(self.options.max_transfers_per_token);
        timed
    }
}

fn describe(notification_type: NotificationType) -> &'static str {
    match notification_type {
        NotificationType::ExchangeDeposit => "exchange deposit",
        NotificationType::WhaleTransfer => "whale transfer",
    }
}
