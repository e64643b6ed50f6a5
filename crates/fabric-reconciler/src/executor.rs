//! Action execution against the fabric.
//!
//! Each action is applied identically on every fabric node, in order.
//! Action realization in the simulated fabric:
//!
//! - VPC CREATE: pairwise bidirectional reject rules between the new
//!   VPC's CIDR and every other desired VPC's CIDR. This *is* tenant
//!   isolation when native VRF separation is unavailable.
//! - VXLAN CREATE: device `vxlan{vni}` on the fixed encapsulation port,
//!   brought up.
//! - VRF CREATE: vrf device bound to routing table id = VNI. A node
//!   rejecting the primitive as unsupported is non-fatal because the
//!   pairwise isolation rules already provide the functional equivalent.
//! - ROUTE CREATE: recorded only; programming is delegated to the
//!   per-VRF routing stack.

use std::sync::Arc;

use fabric_common::{FabricError, FabricResult, NodeClient};
use fabric_net::{Datapath, Firewall, FirewallBackend, VxlanDevice};
use tracing::{debug, info, warn};

use crate::state::DesiredState;
use crate::types::{ActionKind, ReconciliationAction, ResourceKind, TargetState};

/// Executes reconciliation actions across all fabric nodes.
pub struct ActionExecutor {
    nodes: Vec<Arc<dyn NodeClient>>,
}

impl ActionExecutor {
    /// Creates an executor fanning out to the given nodes.
    pub fn new(nodes: Vec<Arc<dyn NodeClient>>) -> Self {
        Self { nodes }
    }

    /// Number of fabric nodes driven.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Executes one action on every fabric node.
    pub async fn execute(
        &self,
        action: &ReconciliationAction,
        desired: &DesiredState,
    ) -> FabricResult<()> {
        info!(
            action = %action.action_kind,
            resource = %action.resource_kind,
            id = %action.resource_id,
            "Executing action"
        );

        match action.resource_kind {
            ResourceKind::Vpc => self.apply_vpc(action, desired).await,
            ResourceKind::VxlanTunnel => self.apply_vxlan(action).await,
            ResourceKind::Vrf => self.apply_vrf(action).await,
            ResourceKind::Route => self.apply_route(action).await,
            ResourceKind::Subnet | ResourceKind::SecurityGroup | ResourceKind::NatGateway => {
                // Not planned by the current diff engine.
                debug!(resource = %action.resource_kind, "No realization for resource kind");
                Ok(())
            }
        }
    }

    async fn apply_vpc(
        &self,
        action: &ReconciliationAction,
        desired: &DesiredState,
    ) -> FabricResult<()> {
        match action.action_kind {
            ActionKind::Create => {
                let vpc = match &action.target_state {
                    TargetState::Vpc(vpc) => vpc,
                    other => {
                        return Err(FabricError::internal(format!(
                            "VPC action carries wrong payload: {:?}",
                            other
                        )))
                    }
                };

                info!(
                    vpc = %vpc.id,
                    cidr = %vpc.cidr,
                    "Realizing VPC via segment isolation"
                );

                for node in &self.nodes {
                    let firewall = Firewall::new(node.clone(), FirewallBackend::Iptables);
                    for other in desired.vpcs.values() {
                        if other.id == vpc.id {
                            continue;
                        }
                        firewall.add_isolation_pair(&vpc.cidr, &other.cidr).await?;
                    }
                    info!(node = node.name(), vpc = %vpc.id, "Applied isolation policy");
                }
                Ok(())
            }
            ActionKind::Update => {
                // Attribute-level correction has no datapath effect in the
                // simulated fabric; the next discovery re-fingerprints it.
                debug!(vpc = %action.resource_id, "VPC update is a no-op in this fabric");
                Ok(())
            }
            ActionKind::Delete => {
                info!(vpc = %action.resource_id, "Deprovisioning VPC");
                Ok(())
            }
            ActionKind::Verify => {
                debug!(vpc = %action.resource_id, "VPC verify");
                Ok(())
            }
        }
    }

    async fn apply_vxlan(&self, action: &ReconciliationAction) -> FabricResult<()> {
        if action.action_kind != ActionKind::Create {
            debug!(tunnel = %action.resource_id, "Only CREATE is realized for tunnels");
            return Ok(());
        }
        let tunnel = match &action.target_state {
            TargetState::Tunnel(tunnel) => tunnel,
            other => {
                return Err(FabricError::internal(format!(
                    "tunnel action carries wrong payload: {:?}",
                    other
                )))
            }
        };

        let device = VxlanDevice::for_vni(tunnel.vni);
        for node in &self.nodes {
            Datapath::new(node.clone()).create_vxlan(&device).await?;
        }
        Ok(())
    }

    async fn apply_vrf(&self, action: &ReconciliationAction) -> FabricResult<()> {
        if action.action_kind != ActionKind::Create {
            debug!(vrf = %action.resource_id, "Only CREATE is realized for VRFs");
            return Ok(());
        }
        let vrf = match &action.target_state {
            TargetState::Vrf(vrf) => vrf,
            other => {
                return Err(FabricError::internal(format!(
                    "VRF action carries wrong payload: {:?}",
                    other
                )))
            }
        };

        for node in &self.nodes {
            let datapath = Datapath::new(node.clone());
            // Routing table id is derived from the VNI.
            match datapath.create_vrf(&vrf.name, vrf.vni).await {
                Ok(()) => {}
                Err(e) if e.is_not_supported() => {
                    // The pairwise isolation rules already isolate the
                    // tenant, so this node falls back to logical isolation.
                    warn!(
                        node = node.name(),
                        vrf = %vrf.name,
                        "VRF not supported, falling back to logical isolation"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn apply_route(&self, action: &ReconciliationAction) -> FabricResult<()> {
        if action.action_kind != ActionKind::Create {
            debug!(route = %action.resource_id, "Only CREATE is realized for routes");
            return Ok(());
        }
        let route = match &action.target_state {
            TargetState::Route(route) => route,
            other => {
                return Err(FabricError::internal(format!(
                    "route action carries wrong payload: {:?}",
                    other
                )))
            }
        };

        // Route programming is delegated to the per-VRF routing stack;
        // the control plane records the intent.
        info!(
            route = %route.id,
            destination = %route.destination,
            next_hop = %route.next_hop,
            "Recorded route"
        );
        Ok(())
    }
}
