//! Fabric Reconciler Daemon Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use fabric_reconciler::{
    metrics_server, FileStore, ReconcilerConfig, ReconcilerMetrics, ReconciliationEngine,
};

/// Intent-based reconciliation daemon for the fabric control plane.
#[derive(Debug, Parser)]
#[command(name = "reconcilerd", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the desired-state JSON document path
    #[arg(long)]
    desired_state: Option<PathBuf>,

    /// Override the cycle interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Override the metrics bind address (e.g. 0.0.0.0:9090)
    #[arg(long)]
    metrics_listen: Option<String>,

    /// Run a single reconciliation cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ReconcilerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReconcilerConfig::default(),
    };
    if let Some(path) = args.desired_state {
        config.desired_state_file = path;
    }
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }
    if let Some(addr) = args.metrics_listen {
        config.metrics_listen = Some(addr);
    }
    config.validate().context("validating configuration")?;

    info!(
        nodes = config.fabric_nodes.len(),
        interval_secs = config.interval_secs,
        desired_state = %config.desired_state_file.display(),
        "Starting reconcilerd"
    );

    let store = Arc::new(FileStore::new(&config.desired_state_file));
    let metrics = ReconcilerMetrics::new().context("registering metrics")?;

    if let Some(listen) = &config.metrics_listen {
        let addr = listen
            .parse()
            .with_context(|| format!("invalid metrics_listen address '{}'", listen))?;
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics_server::serve(metrics, addr).await {
                error!(error = %e, "Metrics server exited");
            }
        });
    }

    let mut engine = ReconciliationEngine::new(store, config.build_nodes(), &config, metrics)
        .context("constructing engine")?;

    if args.once {
        let result = engine.reconcile().await;
        info!(
            success = result.success,
            actions = result.actions_taken.len(),
            errors = result.errors.len(),
            duration_ms = result.duration.as_millis() as u64,
            "Single cycle complete"
        );
        for e in &result.errors {
            error!(error = %e, "Reconciliation error");
        }
        if !result.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    tokio::select! {
        _ = engine.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping reconcilerd");
        }
    }

    Ok(())
}
