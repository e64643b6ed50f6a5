//! Diff engine: desired vs. actual snapshots into prioritized actions.
//!
//! Priority encodes the dependency order of the overlay: the isolation
//! boundary (VPC, VRF) must exist before the overlay transport (VXLAN)
//! before routing, and deletions run only after all creates and updates
//! so the network is never more open mid-convergence than either its old
//! or new target state.

use fabric_net::FabricSnapshot;
use tracing::debug;

use crate::state::{state_hash, DesiredState};
use crate::types::{ActionKind, ReconciliationAction, ResourceKind, TargetState, VrfTarget};

/// VPCs are realized first.
pub const PRIORITY_VPC_CREATE: u32 = 10;
/// In-place VPC corrections follow creates.
pub const PRIORITY_VPC_UPDATE: u32 = 20;
/// VRF devices right after their VPC boundary.
pub const PRIORITY_VRF_CREATE: u32 = 25;
/// Overlay transport after isolation exists.
pub const PRIORITY_VXLAN_CREATE: u32 = 30;
/// Routing last among creates.
pub const PRIORITY_ROUTE_CREATE: u32 = 50;
/// Deletions strictly after everything else.
pub const PRIORITY_DELETE: u32 = 200;

/// Computes the corrective actions converging `actual` toward `desired`,
/// sorted ascending by priority.
pub fn compute_diff(desired: &DesiredState, actual: &FabricSnapshot) -> Vec<ReconciliationAction> {
    let mut actions = Vec::new();

    // VPCs: create when absent, update when the state fingerprint differs.
    for (vpc_id, vpc) in &desired.vpcs {
        match actual.vpcs.get(vpc_id) {
            None => {
                actions.push(ReconciliationAction::new(
                    ActionKind::Create,
                    ResourceKind::Vpc,
                    vpc_id.clone(),
                    TargetState::Vpc(vpc.clone()),
                    PRIORITY_VPC_CREATE,
                ));
            }
            Some(observed) => {
                if state_hash(&vpc.id, &vpc.status) != state_hash(&observed.id, &observed.status) {
                    actions.push(
                        ReconciliationAction::new(
                            ActionKind::Update,
                            ResourceKind::Vpc,
                            vpc_id.clone(),
                            TargetState::Vpc(vpc.clone()),
                            PRIORITY_VPC_UPDATE,
                        )
                        .with_current_state(TargetState::Observed(observed.clone())),
                    );
                }
            }
        }
    }

    // VRFs, derived from VPCs: missing only if neither the VPC id nor
    // the VRF device alias was discovered.
    for (vpc_id, vpc) in &desired.vpcs {
        if vpc.vrf_name.is_empty() {
            continue;
        }
        if !actual.vpcs.contains_key(vpc_id) && !actual.vpcs.contains_key(&vpc.vrf_name) {
            actions.push(ReconciliationAction::new(
                ActionKind::Create,
                ResourceKind::Vrf,
                vpc.vrf_name.clone(),
                TargetState::Vrf(VrfTarget {
                    name: vpc.vrf_name.clone(),
                    vni: vpc.vni,
                }),
                PRIORITY_VRF_CREATE,
            ));
        }
    }

    // VXLAN tunnels.
    for (tunnel_id, tunnel) in &desired.vxlan_tunnels {
        if !actual.vxlan_tunnels.contains_key(tunnel_id) {
            actions.push(ReconciliationAction::new(
                ActionKind::Create,
                ResourceKind::VxlanTunnel,
                tunnel_id.clone(),
                TargetState::Tunnel(tunnel.clone()),
                PRIORITY_VXLAN_CREATE,
            ));
        }
    }

    // Routes: CREATE-only. Routes are never discovered as actual state,
    // so there is no UPDATE or DELETE path for them.
    for (route_id, route) in &desired.routes {
        actions.push(ReconciliationAction::new(
            ActionKind::Create,
            ResourceKind::Route,
            route_id.clone(),
            TargetState::Route(route.clone()),
            PRIORITY_ROUTE_CREATE,
        ));
    }

    // Deletions: discovered VPC entries matching neither a desired VPC id
    // nor a desired VRF alias.
    for (observed_id, observed) in &actual.vpcs {
        let is_desired_vpc = desired.vpcs.contains_key(observed_id);
        let is_vrf_alias = desired.vpcs.values().any(|v| v.vrf_name == *observed_id);
        if !is_desired_vpc && !is_vrf_alias {
            actions.push(
                ReconciliationAction::new(
                    ActionKind::Delete,
                    ResourceKind::Vpc,
                    observed_id.clone(),
                    TargetState::Empty,
                    PRIORITY_DELETE,
                )
                .with_current_state(TargetState::Observed(observed.clone())),
            );
        }
    }

    actions.sort_by_key(|a| a.priority);
    debug!(actions = actions.len(), "Computed diff");
    actions
}
