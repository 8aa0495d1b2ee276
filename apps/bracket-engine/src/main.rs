//! Bracket Engine Binary
//!
//! Runs placements against the paper broker and monitors them to completion.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bracket-engine -- [config.yaml] [placements.json]
//! ```
//!
//! `placements.json` holds a JSON array of placement requests. Ctrl-C
//! releases every monitor; orders at the paper broker are left as they are.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: overrides `observability.logging.level`
//! - any `${VAR}` referenced from the config file

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bracket_engine::application::dto::PlaceOrderRequestDto;
use bracket_engine::application::ports::BrokerPort;
use bracket_engine::application::services::MonitorScheduler;
use bracket_engine::application::use_cases::PlaceOrderUseCase;
use bracket_engine::config::{Config, load_config};
use bracket_engine::infrastructure::broker::PaperBroker;
use bracket_engine::infrastructure::events::TracingStatusPublisher;
use bracket_engine::observability::{MetricsConfig, init_metrics};
use bracket_engine::telemetry::init_tracing;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PLACEMENTS_PATH: &str = "placements.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let placements_path = args
        .next()
        .unwrap_or_else(|| DEFAULT_PLACEMENTS_PATH.to_string());

    let config = load(config_path.as_deref())?;
    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;

    if config.observability.metrics.enabled {
        let addr: SocketAddr = config
            .observability
            .metrics
            .listen_addr
            .parse()
            .context("invalid metrics listen address")?;
        init_metrics(&MetricsConfig::with_addr(addr)).context("failed to start metrics exporter")?;
    }

    let placements = read_placements(&placements_path)?;
    tracing::info!(
        placements = placements.len(),
        fill_poll_ms = config.monitoring.fill_poll_interval_ms,
        leg_priority = ?config.monitoring.leg_priority,
        "Starting bracket engine"
    );

    let broker: Arc<dyn BrokerPort> = Arc::new(PaperBroker::new(config.paper_broker.clone()));
    let shutdown = CancellationToken::new();
    let scheduler = Arc::new(MonitorScheduler::new(
        Arc::clone(&broker),
        Arc::new(TracingStatusPublisher),
        config.monitoring.clone(),
        shutdown.clone(),
    )
    .context("failed to start monitor scheduler")?);
    let use_case = PlaceOrderUseCase::new(broker, Arc::clone(&scheduler), config.defaults.clone());

    let mut handles = Vec::new();
    for (index, request) in placements.iter().enumerate() {
        match use_case.execute_request(request).await {
            Ok(receipt) => {
                tracing::info!(
                    index,
                    order_id = %receipt.order_id,
                    monitored = receipt.monitored(),
                    "Placement accepted"
                );
                handles.extend(receipt.monitor);
            }
            Err(e) => tracing::error!(index, error = %e, "Placement failed"),
        }
    }

    let outcomes = futures::future::join_all(handles.into_iter().map(|h| h.outcome()));
    tokio::select! {
        results = outcomes => {
            for result in results {
                match result {
                    Ok(outcome) => tracing::info!(
                        order_id = %outcome.order_id,
                        state = %outcome.state,
                        fill_price = ?outcome.fill_price,
                        pnl_per_share = ?outcome.pnl_per_share,
                        "{}",
                        outcome.message
                    ),
                    Err(e) => tracing::error!(error = %e, "Monitor ended without an outcome"),
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Interrupted, releasing all monitors");
        }
    }

    scheduler.shutdown().await;
    tracing::info!("Bracket engine stopped");
    Ok(())
}

fn load(path: Option<&str>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_config(Some(path)).with_context(|| format!("loading {path}")),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(Some(DEFAULT_CONFIG_PATH)).context("loading config.yaml")
        }
        None => Ok(Config::default()),
    }
}

fn read_placements(path: &str) -> anyhow::Result<Vec<PlaceOrderRequestDto>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading placements from {path}"))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing placements in {path}"))
}
