//! Actual-state discovery.
//!
//! Queries exactly one fabric node as representative of the whole fabric
//! (a documented simplification of the simulated environment, not a
//! correctness guarantee; quorum discovery is an open question upstream).
//! Two signals feed the snapshot:
//!
//! 1. The node's extended interface table (`ip -d -j link show`),
//!    classified by device kind: vxlan devices record their VNI, vrf
//!    devices record their name.
//! 2. The forward-chain filter rules (`iptables -S FORWARD`), scanned for
//!    the per-VPC isolation markers the executor installs.
//!
//! A VPC counts as available if **either** signal is present. Any query
//! failure degrades to whatever was discovered so far (possibly an empty
//! snapshot) with a warning; the reconciler then re-issues CREATEs, which
//! is safe because every execution primitive is idempotent.

use std::collections::BTreeMap;
use std::sync::Arc;

use fabric_common::NodeClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::commands::build_show_forward_rules_cmd;
use crate::datapath::Datapath;
use crate::types::vxlan_tunnel_id;

/// Discovered state of one VXLAN tunnel endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelState {
    /// VXLAN network identifier
    pub vni: u32,
    /// Operational status
    pub status: String,
}

/// Discovered state of one VPC or VRF device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Resource id (VPC id or VRF device name)
    pub id: String,
    /// Operational status
    pub status: String,
}

/// Desired-state context discovery needs to map low-level signals back
/// to VPC ids.
#[derive(Debug, Clone)]
pub struct VpcIntent {
    /// VPC id
    pub id: String,
    /// Tenant CIDR, matched against isolation rule markers
    pub cidr: String,
    /// VRF device alias, matched against discovered vrf devices
    pub vrf_name: String,
}

/// Structured snapshot of live fabric state.
///
/// Routes are never discovered independently; the snapshot carries no
/// route table and route diffing stays CREATE-only.
#[derive(Debug, Clone, Default)]
pub struct FabricSnapshot {
    /// VPCs keyed by id, plus vrf devices keyed by device name
    pub vpcs: BTreeMap<String, DeviceState>,
    /// Tunnels keyed by `vni-{vni}`
    pub vxlan_tunnels: BTreeMap<String, TunnelState>,
}

impl FabricSnapshot {
    /// True if nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.vpcs.is_empty() && self.vxlan_tunnels.is_empty()
    }
}

/// Discovers actual fabric state from one representative node.
pub struct Discoverer {
    node: Arc<dyn NodeClient>,
    datapath: Datapath,
}

impl Discoverer {
    /// Creates a discoverer over the representative node.
    pub fn new(node: Arc<dyn NodeClient>) -> Self {
        let datapath = Datapath::new(node.clone());
        Self { node, datapath }
    }

    /// The representative node being consulted.
    pub fn node_name(&self) -> &str {
        self.node.name()
    }

    /// Builds the actual-state snapshot.
    ///
    /// `desired_vpcs` supplies the CIDR and VRF alias of every desired
    /// VPC so isolation-rule markers can be attributed.
    pub async fn discover(&self, desired_vpcs: &[VpcIntent]) -> FabricSnapshot {
        let mut snapshot = FabricSnapshot::default();

        let links = match self.datapath.get_interfaces(None).await {
            Ok(links) => links,
            Err(e) => {
                warn!(
                    node = self.node.name(),
                    error = %e,
                    "Interface discovery failed, degrading to empty snapshot"
                );
                return snapshot;
            }
        };

        for link in links {
            match link.kind() {
                Some("vxlan") => {
                    if let Some(vni) = link.vni() {
                        snapshot.vxlan_tunnels.insert(
                            vxlan_tunnel_id(vni),
                            TunnelState {
                                vni,
                                status: "up".to_string(),
                            },
                        );
                    }
                }
                Some("vrf") => {
                    snapshot.vpcs.insert(
                        link.ifname.clone(),
                        DeviceState {
                            id: link.ifname,
                            status: "up".to_string(),
                        },
                    );
                }
                _ => {}
            }
        }

        // Legacy signal: isolation rules for fabrics without vrf support.
        let rules = match self.node.execute(&build_show_forward_rules_cmd()).await {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    node = self.node.name(),
                    error = %e,
                    "Forward-rule discovery failed, snapshot limited to interface table"
                );
                return snapshot;
            }
        };

        for vpc in desired_vpcs {
            let reject_marker = format!("-A FORWARD -d {} -j REJECT", vpc.cidr);
            let source_marker = format!("-A FORWARD -s {}", vpc.cidr);
            let isolated = rules.contains(&reject_marker) || rules.contains(&source_marker);
            let vrf_present = snapshot.vpcs.contains_key(&vpc.vrf_name);

            if isolated || vrf_present {
                snapshot.vpcs.insert(
                    vpc.id.clone(),
                    DeviceState {
                        id: vpc.id.clone(),
                        status: "available".to_string(),
                    },
                );
            }
        }

        debug!(
            node = self.node.name(),
            vpcs = snapshot.vpcs.len(),
            tunnels = snapshot.vxlan_tunnels.len(),
            "Discovered fabric state"
        );

        snapshot
    }
}
