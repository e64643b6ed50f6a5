//! Prometheus metrics for the reconciliation engine.
//!
//! Single-writer state: only the reconciliation task updates these, so
//! no locking beyond what the prometheus primitives carry.

use prometheus::{Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

use crate::engine::ReconcileResult;
use crate::types::ReconciliationAction;

/// Reconciliation duration buckets in milliseconds.
const DURATION_BUCKETS_MS: &[f64] = &[10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0];

/// Metrics collector with an owned registry.
#[derive(Clone)]
pub struct ReconcilerMetrics {
    /// Completed reconciliation cycles
    pub cycles_total: Counter,
    /// Successfully taken actions, labeled `{action}_{resource}`
    pub actions_total: CounterVec,
    /// Errors recorded across cycles (retryable and permanent)
    pub errors_total: Counter,
    /// Per-cycle latency in milliseconds
    pub duration_ms: Histogram,
    /// VPCs in the current desired state
    pub vpcs_total: Gauge,
    /// Routes in the current desired state
    pub routes_total: Gauge,

    /// Registry for export
    pub registry: Arc<Registry>,
}

impl ReconcilerMetrics {
    /// Creates and registers all collectors.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total = Counter::with_opts(Opts::new(
            "reconciliation_cycles_total",
            "Total number of reconciliation cycles completed",
        ))?;
        registry.register(Box::new(cycles_total.clone()))?;

        let actions_total = CounterVec::new(
            Opts::new(
                "reconciliation_actions_total",
                "Count of reconciliation actions taken",
            ),
            &["action_type"],
        )?;
        registry.register(Box::new(actions_total.clone()))?;

        let errors_total = Counter::with_opts(Opts::new(
            "reconciliation_errors_total",
            "Total number of errors recorded during reconciliation",
        ))?;
        registry.register(Box::new(errors_total.clone()))?;

        let duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "reconciliation_duration_ms",
                "Time taken for one reconciliation cycle in milliseconds",
            )
            .buckets(DURATION_BUCKETS_MS.to_vec()),
        )?;
        registry.register(Box::new(duration_ms.clone()))?;

        let vpcs_total = Gauge::with_opts(Opts::new(
            "vpcs_total",
            "Total count of VPCs in desired state",
        ))?;
        registry.register(Box::new(vpcs_total.clone()))?;

        let routes_total = Gauge::with_opts(Opts::new(
            "routes_total",
            "Total count of routes in desired state",
        ))?;
        registry.register(Box::new(routes_total.clone()))?;

        Ok(Self {
            cycles_total,
            actions_total,
            errors_total,
            duration_ms,
            vpcs_total,
            routes_total,
            registry: Arc::new(registry),
        })
    }

    /// Counts one successfully taken action.
    pub fn record_action(&self, action: &ReconciliationAction) {
        self.actions_total
            .with_label_values(&[&action.metric_label()])
            .inc();
    }

    /// Records the outcome of one cycle.
    pub fn record_cycle(&self, result: &ReconcileResult) {
        self.cycles_total.inc();
        self.errors_total.inc_by(result.errors.len() as f64);
        self.duration_ms
            .observe(result.duration.as_secs_f64() * 1000.0);
    }

    /// Updates the desired-resource gauges.
    pub fn record_desired_totals(&self, vpcs: usize, routes: usize) {
        self.vpcs_total.set(vpcs as f64);
        self.routes_total.set(routes as f64);
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        use prometheus::{Encoder, TextEncoder};
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics not UTF-8: {}", e)))
    }
}
