//! Token Monitor - one monitoring pass per invocation
//!
//! Usage:
//!   cargo run --release --bin token_monitor -- --config config.yaml
//!   cargo run --release --bin token_monitor -- --dry-run
//!
//! Environment variables: see `RuntimeConfig::from_env`. Chain API keys are
//! read from the variable each chain names in `api_key_env`.

use clap::Parser;
use dotenv::dotenv;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use token_monitor::config::{LabelBackend, RuntimeConfig};
use token_monitor::persistence::{load_state, save_state};
use token_monitor::pipeline::{
    CoinGeckoClient, DryRunNotifier, EngineOptions, EtherscanClient, JsonLabelStore, LabelResolver,
    LabelStore, LarkNotifier, MonitorConfig, MonitorEngine, Notifier, SqliteLabelStore,
};

#[derive(Parser, Debug)]
#[command(name = "token_monitor", about = "Alert on large ERC-20/BEP-20 transfers")]
struct Cli {
    /// Token and chain configuration (YAML)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log alerts instead of sending them; state is not saved
    #[arg(long)]
    dry_run: bool,
}

fn open_label_store(runtime: &RuntimeConfig) -> Result<Box<dyn LabelStore>, Box<dyn std::error::Error>> {
    Ok(match runtime.label_backend {
        LabelBackend::Json => Box::new(JsonLabelStore::new(&runtime.labels_file)),
        LabelBackend::Sqlite => Box::new(SqliteLabelStore::new(&runtime.labels_db_path)?),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    info!("🚀 Token Monitor starting");

    let config = MonitorConfig::from_file(&cli.config).map_err(|e| {
        error!("❌ Failed to load {}: {}", cli.config.display(), e);
        e
    })?;
    let runtime = RuntimeConfig::from_env(!cli.dry_run).map_err(|e| {
        error!("❌ Invalid runtime configuration: {}", e);
        e
    })?;

    info!("   ├─ Chains: {}", config.chains.len());
    info!("   ├─ USD threshold: ${:.2}", config.usd_threshold);
    info!("   ├─ State file: {}", runtime.state_file);
    info!("   └─ Mode: {}", if cli.dry_run { "dry-run" } else { "live" });

    let label_store = open_label_store(&runtime)?;
    let labels = match label_store.load() {
        Ok(map) => LabelResolver::new(map),
        Err(e) => {
            warn!("⚠️  Failed to load labels ({}): {}", label_store.backend_type(), e);
            LabelResolver::default()
        }
    };
    info!("🏷️  Loaded {} address labels ({})", labels.len(), label_store.backend_type());

    let mut state = load_state(&runtime.state_file);

    let notifier: Arc<dyn Notifier> = match (&runtime.webhook_url, cli.dry_run) {
        (Some(url), false) => Arc::new(LarkNotifier::new(url)?),
        _ => Arc::new(DryRunNotifier),
    };

    let engine = MonitorEngine::new(
        config.clone(),
        Arc::new(EtherscanClient::new(runtime.lookback_blocks)?),
        Arc::new(CoinGeckoClient::new(&config.coingecko_api_url)?),
        notifier,
    )
    .with_options(EngineOptions {
        notify_delay: runtime.notify_delay,
        max_transfers_per_token: runtime.max_transfers_per_token,
        max_processed_keys: runtime.max_processed_keys,
    });

    let summary = engine.run(&mut state, &labels).await;

    if cli.dry_run {
        info!("[dry-run] state not saved ({} processed keys in memory)", state.len());
    } else if let Err(e) = save_state(&state, &runtime.state_file) {
        error!("❌ Failed to save state to {}: {}", runtime.state_file, e);
    }

    if let Err(e) = label_store.persist(labels.labels()) {
        error!("❌ Failed to persist labels ({}): {}", label_store.backend_type(), e);
    }

    info!("🏁 Run complete");
    info!("   ├─ Notifications sent: {}", summary.notifications);
    info!("   ├─ Evaluated: {}", summary.evaluated);
    info!("   ├─ Already processed: {}", summary.duplicates);
    info!("   ├─ Malformed: {}", summary.malformed);
    info!("   ├─ Delivery failures: {}", summary.delivery_failures);
    info!("   ├─ Skipped tokens: {}", summary.skipped_tokens);
    info!("   └─ Skipped chains: {}", summary.skipped_chains);

    Ok(())
}
