//! The reconciliation engine.
//!
//! One loop, one writer: fetch desired state, discover actual state from
//! the representative node, plan, execute ascending by priority, retry.
//! A single action's failure never aborts the rest of the cycle. Failed
//! actions below their retry budget are buffered in the pending list and
//! reprocessed at the end of every cycle until they succeed or exhaust
//! their budget; exhausted actions are reported once and dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fabric_common::{FabricError, FabricResult, NodeClient};
use fabric_net::Discoverer;
use tracing::{error, info, warn};

use crate::config::ReconcilerConfig;
use crate::executor::ActionExecutor;
use crate::metrics::ReconcilerMetrics;
use crate::planner;
use crate::state::DesiredState;
use crate::store::DesiredStateStore;
use crate::types::ReconciliationAction;

/// Result of one reconciliation cycle.
#[derive(Debug)]
pub struct ReconcileResult {
    /// False if any action failed permanently or the cycle itself broke
    pub success: bool,
    /// Actions that executed successfully this cycle
    pub actions_taken: Vec<ReconciliationAction>,
    /// Errors recorded this cycle (retryable and permanent)
    pub errors: Vec<String>,
    /// Wall-clock cycle duration
    pub duration: Duration,
}

impl ReconcileResult {
    fn new() -> Self {
        Self {
            success: true,
            actions_taken: Vec::new(),
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

/// The orchestrating loop converging actual state toward desired state.
///
/// Exactly one engine instance is assumed; there is no leader election
/// or cross-instance coordination.
pub struct ReconciliationEngine {
    store: Arc<dyn DesiredStateStore>,
    discoverer: Discoverer,
    executor: ActionExecutor,
    metrics: ReconcilerMetrics,
    interval: Duration,
    action_timeout: Duration,
    pending: Vec<ReconciliationAction>,
}

impl ReconciliationEngine {
    /// Creates an engine over the given store and fabric nodes.
    ///
    /// The first node is the representative node discovery consults.
    pub fn new(
        store: Arc<dyn DesiredStateStore>,
        nodes: Vec<Arc<dyn NodeClient>>,
        config: &ReconcilerConfig,
        metrics: ReconcilerMetrics,
    ) -> FabricResult<Self> {
        let representative = nodes
            .first()
            .ok_or_else(|| {
                FabricError::invalid_config("fabric_nodes", "at least one fabric node is required")
            })?
            .clone();

        Ok(Self {
            store,
            discoverer: Discoverer::new(representative),
            executor: ActionExecutor::new(nodes),
            metrics,
            interval: config.interval(),
            action_timeout: config.action_timeout(),
            pending: Vec::new(),
        })
    }

    /// The metrics collector shared with the exposition endpoint.
    pub fn metrics(&self) -> &ReconcilerMetrics {
        &self.metrics
    }

    /// Actions currently awaiting retry.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Runs the fixed-interval reconciliation loop forever.
    pub async fn run(&mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            nodes = self.executor.node_count(),
            representative = self.discoverer.node_name(),
            "Starting reconciliation loop"
        );

        loop {
            let result = self.reconcile().await;

            if !result.actions_taken.is_empty() {
                info!(
                    actions = result.actions_taken.len(),
                    duration_ms = result.duration.as_millis() as u64,
                    "Reconciliation took actions"
                );
            }
            for e in &result.errors {
                error!(error = %e, "Reconciliation error");
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Performs one reconciliation cycle.
    pub async fn reconcile(&mut self) -> ReconcileResult {
        let start = Instant::now();
        let mut result = ReconcileResult::new();

        match self.store.fetch().await {
            Ok(desired) => {
                self.metrics
                    .record_desired_totals(desired.vpcs.len(), desired.routes.len());

                let actual = self.discoverer.discover(&desired.vpc_intents()).await;

                // Planner output is already sorted ascending by priority;
                // this ordering is the only safety mechanism keeping
                // dependent resources behind their prerequisites.
                let actions = planner::compute_diff(&desired, &actual);
                for action in actions {
                    self.run_action(action, &desired, &mut result).await;
                }

                // Retry pass: everything buffered from prior cycles plus
                // this cycle's requeues, one attempt each.
                let pending = std::mem::take(&mut self.pending);
                for action in pending {
                    self.run_action(action, &desired, &mut result).await;
                }
            }
            Err(e) => {
                result.success = false;
                result.errors.push(format!("Failed to fetch desired state: {}", e));
            }
        }

        result.duration = start.elapsed();
        self.metrics.record_cycle(&result);
        result
    }

    async fn run_action(
        &mut self,
        mut action: ReconciliationAction,
        desired: &DesiredState,
        result: &mut ReconcileResult,
    ) {
        let outcome =
            match tokio::time::timeout(self.action_timeout, self.executor.execute(&action, desired))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(FabricError::timeout(action.describe())),
            };

        match outcome {
            Ok(()) => {
                self.metrics.record_action(&action);
                result.actions_taken.push(action);
            }
            Err(e) => {
                action.retries += 1;
                if action.retries < action.max_retries {
                    warn!(
                        action = %action.describe(),
                        attempt = action.retries,
                        error = %e,
                        "Action failed, will retry"
                    );
                    result.errors.push(format!("Action failed, will retry: {}", e));
                    self.pending.push(action);
                } else {
                    error!(
                        action = %action.describe(),
                        attempts = action.retries,
                        error = %e,
                        "Action failed permanently"
                    );
                    result.errors.push(format!("Action failed permanently: {}", e));
                    result.success = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_common::testing::FakeNode;

    use crate::store::MemoryStore;
    use crate::state::VpcSpec;
    use crate::types::{ActionKind, ResourceKind};

    fn vpc(id: &str, cidr: &str, vni: u32) -> VpcSpec {
        VpcSpec {
            id: id.to_string(),
            name: None,
            cidr: cidr.to_string(),
            vni,
            vrf_name: format!("VRF-{}", id),
            status: "available".to_string(),
        }
    }

    fn engine_with(
        store: Arc<MemoryStore>,
        nodes: Vec<Arc<dyn NodeClient>>,
    ) -> ReconciliationEngine {
        let config = ReconcilerConfig {
            fabric_nodes: nodes.iter().map(|n| n.name().to_string()).collect(),
            ..Default::default()
        };
        ReconciliationEngine::new(store, nodes, &config, ReconcilerMetrics::new().unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn first_cycle_emits_ordered_creates() {
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![vpc("vpc-a", "10.1.0.0/16", 1003)]);
        let node = Arc::new(FakeNode::new("leaf-1").on_command("link show", "[]"));
        let mut engine = engine_with(store, vec![node]);

        let result = engine.reconcile().await;
        assert!(result.success);
        assert_eq!(result.actions_taken.len(), 3);

        let taken: Vec<(ActionKind, ResourceKind, &str)> = result
            .actions_taken
            .iter()
            .map(|a| (a.action_kind, a.resource_kind, a.resource_id.as_str()))
            .collect();
        assert_eq!(
            taken,
            vec![
                (ActionKind::Create, ResourceKind::Vpc, "vpc-a"),
                (ActionKind::Create, ResourceKind::Vrf, "VRF-vpc-a"),
                (ActionKind::Create, ResourceKind::VxlanTunnel, "vni-1003"),
            ]
        );
    }

    #[tokio::test]
    async fn converged_fabric_yields_empty_cycle() {
        let links = r#"[
            {"ifname": "vxlan1003",
             "linkinfo": {"info_kind": "vxlan", "info_data": {"id": 1003}}},
            {"ifname": "VRF-vpc-a",
             "linkinfo": {"info_kind": "vrf", "info_data": {"id": 1003}}}
        ]"#;
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![vpc("vpc-a", "10.1.0.0/16", 1003)]);
        let node = Arc::new(FakeNode::new("leaf-1").on_command("link show", links));
        let mut engine = engine_with(store, vec![node.clone()]);

        let result = engine.reconcile().await;
        assert!(result.success);
        assert!(result.actions_taken.is_empty());
        assert!(result.errors.is_empty());
        // Discovery only, no mutations.
        assert_eq!(node.count_matching("link add"), 0);
    }

    #[tokio::test]
    async fn repeated_convergence_is_idempotent() {
        // The fabric claims nothing exists, then answers every create
        // with "exists" - the cycle must still succeed.
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![vpc("vpc-a", "10.1.0.0/16", 1003)]);
        let node = Arc::new(
            FakeNode::new("leaf-1")
                .on_command("link show", "[]")
                .fail_on("link add", "RTNETLINK answers: File exists"),
        );
        let mut engine = engine_with(store, vec![node]);

        let result = engine.reconcile().await;
        assert!(result.success);
        assert_eq!(result.actions_taken.len(), 3);
    }

    #[tokio::test]
    async fn retry_exhaustion_is_permanent_and_bounded() {
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![vpc("vpc-a", "10.1.0.0/16", 1003)]);
        let node = Arc::new(
            FakeNode::new("leaf-1")
                .on_command("link show", "[]")
                .fail_on("type vxlan", "RTNETLINK answers: Operation not permitted"),
        );
        let mut engine = engine_with(store.clone(), vec![node.clone()]);

        // Cycle 1: initial attempt plus the end-of-cycle retry pass.
        let result = engine.reconcile().await;
        assert!(result.success);
        assert_eq!(engine.pending_count(), 1);
        assert_eq!(node.count_matching("type vxlan"), 2);

        // Cycle 2 against an empty desired state: the pending action gets
        // its final attempt, then is reported and dropped.
        store.clear();
        let result = engine.reconcile().await;
        assert!(!result.success);
        assert!(result.errors.iter().any(|e| e.contains("permanently")));
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(node.count_matching("type vxlan"), 3);

        // Cycle 3: nothing left to retry.
        let result = engine.reconcile().await;
        assert!(result.success);
        assert_eq!(node.count_matching("type vxlan"), 3);
    }

    #[tokio::test]
    async fn single_action_failure_does_not_abort_cycle() {
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![
            vpc("vpc-a", "10.1.0.0/16", 1003),
            vpc("vpc-b", "10.2.0.0/16", 1004),
        ]);
        // vpc-a's tunnel device fails; everything else succeeds.
        let node = Arc::new(
            FakeNode::new("leaf-1")
                .on_command("link show", "[]")
                .fail_on("vxlan1003", "RTNETLINK answers: Operation not permitted"),
        );
        let mut engine = engine_with(store, vec![node]);

        let result = engine.reconcile().await;
        // The vni-1004 tunnel and both VPC/VRF creates still went through.
        assert!(result
            .actions_taken
            .iter()
            .any(|a| a.resource_id == "vni-1004"));
        assert!(result.errors.iter().any(|e| e.contains("will retry")));
    }

    #[tokio::test]
    async fn discovery_failure_degrades_and_replans_creates() {
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![vpc("vpc-a", "10.1.0.0/16", 1003)]);
        let node = Arc::new(FakeNode::new("leaf-1").fail_on("link show", "timeout"));
        let mut engine = engine_with(store, vec![node]);

        let result = engine.reconcile().await;
        // Empty snapshot, so everything is re-created; idempotent
        // primitives make this safe.
        assert!(result.success);
        assert_eq!(result.actions_taken.len(), 3);
    }

    #[tokio::test]
    async fn fetch_failure_fails_cycle() {
        struct BrokenStore;
        #[async_trait::async_trait]
        impl DesiredStateStore for BrokenStore {
            async fn fetch(&self) -> FabricResult<DesiredState> {
                Err(FabricError::internal("database unavailable"))
            }
        }

        let config = ReconcilerConfig::default();
        let node: Arc<dyn NodeClient> = Arc::new(FakeNode::new("leaf-1"));
        let mut engine = ReconciliationEngine::new(
            Arc::new(BrokenStore),
            vec![node],
            &config,
            ReconcilerMetrics::new().unwrap(),
        )
        .unwrap();

        let result = engine.reconcile().await;
        assert!(!result.success);
        assert!(result.errors[0].contains("desired state"));
    }

    #[tokio::test]
    async fn actions_are_counted_in_metrics() {
        let store = Arc::new(MemoryStore::new());
        store.set_vpcs(vec![vpc("vpc-a", "10.1.0.0/16", 1003)]);
        let node = Arc::new(FakeNode::new("leaf-1").on_command("link show", "[]"));
        let mut engine = engine_with(store, vec![node]);

        engine.reconcile().await;

        let exported = engine.metrics().export().unwrap();
        assert!(exported.contains("action_type=\"create_vpc\"} 1"));
        assert!(exported.contains("action_type=\"create_vrf\"} 1"));
        assert!(exported.contains("action_type=\"create_vxlan_tunnel\"} 1"));
        assert!(exported.contains("reconciliation_cycles_total 1"));
        assert!(exported.contains("vpcs_total 1"));
    }
}
