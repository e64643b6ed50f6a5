//! Desired-state snapshot model.
//!
//! Snapshots are rebuilt fully every cycle; nothing here is cached
//! across cycles. The actual-state counterpart is
//! [`fabric_net::FabricSnapshot`], built by the discoverer.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use fabric_net::types::vxlan_tunnel_id;
use fabric_net::VpcIntent;
use serde::{Deserialize, Serialize};

fn default_status() -> String {
    "available".to_string()
}

/// A desired tenant network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpcSpec {
    /// VPC id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Tenant CIDR
    pub cidr: String,
    /// Overlay segment id
    pub vni: u32,
    /// Per-tenant VRF device name
    pub vrf_name: String,
    /// Lifecycle status
    #[serde(default = "default_status")]
    pub status: String,
}

/// A desired route inside a VPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Route id
    pub id: String,
    /// Owning VPC
    pub vpc_id: String,
    /// Destination prefix
    pub destination: String,
    /// Next-hop address
    pub next_hop: String,
    /// Next-hop type (gateway, instance, ...)
    pub next_hop_type: String,
}

/// A desired VXLAN tunnel, derived from a VPC's VNI rather than stored
/// separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSpec {
    /// VXLAN network identifier
    pub vni: u32,
    /// VPC the tunnel was derived from
    pub vpc_id: String,
}

/// Full desired state for one reconciliation cycle.
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    /// VPCs keyed by id
    pub vpcs: BTreeMap<String, VpcSpec>,
    /// Routes keyed by id
    pub routes: BTreeMap<String, RouteSpec>,
    /// Derived tunnels keyed by `vni-{vni}`
    pub vxlan_tunnels: BTreeMap<String, TunnelSpec>,
}

impl DesiredState {
    /// Builds a snapshot from stored records, deriving one VXLAN tunnel
    /// per VPC VNI.
    pub fn from_records(vpcs: Vec<VpcSpec>, routes: Vec<RouteSpec>) -> Self {
        let mut state = Self::default();
        for vpc in vpcs {
            state.vxlan_tunnels.insert(
                vxlan_tunnel_id(vpc.vni),
                TunnelSpec {
                    vni: vpc.vni,
                    vpc_id: vpc.id.clone(),
                },
            );
            state.vpcs.insert(vpc.id.clone(), vpc);
        }
        for route in routes {
            state.routes.insert(route.id.clone(), route);
        }
        state
    }

    /// Per-VPC context the discoverer needs to attribute low-level
    /// signals back to VPC ids.
    pub fn vpc_intents(&self) -> Vec<VpcIntent> {
        self.vpcs
            .values()
            .map(|vpc| VpcIntent {
                id: vpc.id.clone(),
                cidr: vpc.cidr.clone(),
                vrf_name: vpc.vrf_name.clone(),
            })
            .collect()
    }

    /// True if no resources are desired.
    pub fn is_empty(&self) -> bool {
        self.vpcs.is_empty() && self.routes.is_empty()
    }
}

/// Cheap non-cryptographic equality fingerprint over the canonical
/// attribute set (id, status).
///
/// Used only to decide UPDATE vs. no-op, never for identity. The set is
/// limited to attributes both sides of the diff can carry: discovery
/// reports id and status, nothing more.
pub fn state_hash(id: &str, status: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    status.hash(&mut hasher);
    hasher.finish()
}
