//! Action types for the reconciliation engine.
//!
//! Action and resource kinds are closed enumerations so the executor
//! gets exhaustive-match safety instead of runtime string comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{RouteSpec, TunnelSpec, VpcSpec};

/// Default number of attempts before an action fails permanently.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// What a corrective action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Verify,
}

impl ActionKind {
    /// Lowercase wire/metric name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Verify => "verify",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a corrective action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    Subnet,
    Route,
    SecurityGroup,
    NatGateway,
    VxlanTunnel,
    Vrf,
}

impl ResourceKind {
    /// Lowercase wire/metric name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "vpc",
            ResourceKind::Subnet => "subnet",
            ResourceKind::Route => "route",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::NatGateway => "nat_gateway",
            ResourceKind::VxlanTunnel => "vxlan_tunnel",
            ResourceKind::Vrf => "vrf",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload an action carries to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetState {
    Vpc(VpcSpec),
    Route(RouteSpec),
    Tunnel(TunnelSpec),
    Vrf(VrfTarget),
    /// What discovery observed, attached as current state on
    /// UPDATE/DELETE actions.
    Observed(fabric_net::DeviceState),
    /// Deletions carry no target, only a current state.
    Empty,
}

/// Target of a VRF CREATE: the device name and the VNI it derives its
/// routing table id from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfTarget {
    /// VRF device name
    pub name: String,
    /// VNI, doubling as the routing table id
    pub vni: u32,
}

/// A single corrective action, created fresh each cycle.
///
/// Priority is a total order used solely for execution sequencing, never
/// for identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationAction {
    /// What to do
    pub action_kind: ActionKind,
    /// What kind of resource to do it to
    pub resource_kind: ResourceKind,
    /// Resource id, unique per resource kind within a cycle
    pub resource_id: String,
    /// Desired end state
    pub target_state: TargetState,
    /// Observed state, for UPDATE/DELETE
    pub current_state: Option<TargetState>,
    /// Execution priority, lower runs first
    pub priority: u32,
    /// Attempts made so far
    pub retries: u32,
    /// Attempts allowed before permanent failure
    pub max_retries: u32,
}

impl ReconciliationAction {
    /// Creates an action with default retry budget.
    pub fn new(
        action_kind: ActionKind,
        resource_kind: ResourceKind,
        resource_id: impl Into<String>,
        target_state: TargetState,
        priority: u32,
    ) -> Self {
        Self {
            action_kind,
            resource_kind,
            resource_id: resource_id.into(),
            target_state,
            current_state: None,
            priority,
            retries: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Attaches the observed state.
    pub fn with_current_state(mut self, current: TargetState) -> Self {
        self.current_state = Some(current);
        self
    }

    /// Metric label in `{action}_{resource}` form, e.g. `create_vpc`.
    pub fn metric_label(&self) -> String {
        format!("{}_{}", self.action_kind, self.resource_kind)
    }

    /// Short human-readable description for logs and errors.
    pub fn describe(&self) -> String {
        format!(
            "{} {} {}",
            self.action_kind, self.resource_kind, self.resource_id
        )
    }
}
