//! Type definitions for configuration generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-VRF configuration intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfConfig {
    /// VRF name
    pub name: String,
    /// L3VNI bound to the VRF
    pub vni: u32,
    /// BGP route distinguisher
    pub rd: String,
    /// Route-targets imported under l2vpn evpn
    #[serde(default)]
    pub rt_import: Vec<String>,
    /// Route-targets exported under l2vpn evpn
    #[serde(default)]
    pub rt_export: Vec<String>,
}

/// A BGP neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Peer address
    pub ip: String,
    /// Peer AS number
    pub remote_asn: u32,
    /// Optional peer-group membership
    #[serde(default)]
    pub peer_group: Option<String>,
    /// Display name, used by the ConfigDB form
    #[serde(default)]
    pub name: Option<String>,
}

/// A static route to inject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    /// Destination prefix
    pub prefix: String,
    /// Next-hop address
    pub next_hop: String,
    /// VRF to install into, default VRF when absent
    #[serde(default)]
    pub vrf: Option<String>,
}

/// Everything needed to render one switch's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchIntent {
    /// BGP router id (also the VTEP/loopback address)
    pub router_id: String,
    /// Local AS number
    pub asn: u32,
    /// BGP neighbors
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    /// VRF instances
    #[serde(default)]
    pub vrfs: Vec<VrfConfig>,
    /// Static routes
    #[serde(default)]
    pub static_routes: Vec<StaticRoute>,
}

/// A fabric topology: switch intents keyed by hostname.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    /// Switches keyed by hostname
    #[serde(default)]
    pub switches: BTreeMap<String, SwitchIntent>,
}

/// A rendered switch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Switch hostname
    pub hostname: String,
    /// BGP router id
    pub router_id: String,
    /// Local AS number
    pub asn: u32,
    /// Rendered configuration text
    pub config_text: String,
}
