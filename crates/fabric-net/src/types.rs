//! Type definitions for the network execution layer.

use serde::{Deserialize, Serialize};

/// Default VXLAN encapsulation port (IANA).
pub const VXLAN_DEFAULT_PORT: u16 = 4789;

/// Deterministic device name for a VNI's tunnel endpoint.
pub fn vxlan_device_name(vni: u32) -> String {
    format!("vxlan{}", vni)
}

/// Resource id under which a VNI's tunnel is tracked in state snapshots.
pub fn vxlan_tunnel_id(vni: u32) -> String {
    format!("vni-{}", vni)
}

/// A network namespace on a fabric node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkNamespace {
    /// Namespace name
    pub name: String,
    /// Interfaces moved into the namespace
    pub interfaces: Vec<String>,
}

impl NetworkNamespace {
    /// Create an empty namespace record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
        }
    }
}

/// Remote side of a VXLAN device: unicast peer or multicast group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VxlanEndpoint {
    /// Point-to-point remote VTEP address
    Remote(String),
    /// Multicast group for flood-and-learn
    Group(String),
}

/// A VXLAN tunnel endpoint device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VxlanDevice {
    /// Device name
    pub name: String,
    /// VXLAN network identifier (24 bits)
    pub vni: u32,
    /// Local VTEP address
    pub local_ip: Option<String>,
    /// Remote peer or multicast group
    pub endpoint: Option<VxlanEndpoint>,
    /// UDP encapsulation port
    pub port: u16,
}

impl VxlanDevice {
    /// Device for a VNI with the deterministic name and default port.
    pub fn for_vni(vni: u32) -> Self {
        Self {
            name: vxlan_device_name(vni),
            vni,
            local_ip: None,
            endpoint: None,
            port: VXLAN_DEFAULT_PORT,
        }
    }

    /// Sets the local VTEP address.
    pub fn with_local_ip(mut self, local_ip: impl Into<String>) -> Self {
        self.local_ip = Some(local_ip.into());
        self
    }

    /// Sets a unicast remote VTEP.
    pub fn with_remote(mut self, remote_ip: impl Into<String>) -> Self {
        self.endpoint = Some(VxlanEndpoint::Remote(remote_ip.into()));
        self
    }

    /// Sets a multicast group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.endpoint = Some(VxlanEndpoint::Group(group.into()));
        self
    }
}

/// A veth pair, optionally with the peer end in a namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VethPair {
    /// Name of the root-namespace end
    pub name: String,
    /// Name of the peer end
    pub peer_name: String,
    /// Namespace the peer end was moved into
    pub namespace: Option<String>,
}

/// One entry of `ip -d -j link show` output.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkEntry {
    /// Interface name
    pub ifname: String,
    /// Operational state (UP/DOWN/UNKNOWN)
    #[serde(default)]
    pub operstate: Option<String>,
    /// Kind-specific details
    #[serde(default)]
    pub linkinfo: Option<LinkInfo>,
}

impl LinkEntry {
    /// The device kind as reported by the kernel, if any.
    pub fn kind(&self) -> Option<&str> {
        self.linkinfo.as_ref()?.info_kind.as_deref()
    }

    /// The VNI for vxlan devices.
    pub fn vni(&self) -> Option<u32> {
        self.linkinfo.as_ref()?.info_data.as_ref()?.id
    }
}

/// `linkinfo` object of an `ip -d -j link` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkInfo {
    /// Device kind (vxlan, vrf, bridge, veth, ...)
    #[serde(default)]
    pub info_kind: Option<String>,
    /// Kind-specific attributes
    #[serde(default)]
    pub info_data: Option<LinkInfoData>,
}

/// Kind-specific attributes; only the fields discovery consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkInfoData {
    /// VNI for vxlan devices, routing table for vrf devices
    #[serde(default)]
    pub id: Option<u32>,
}

/// One entry of `ip -j route list` output.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    /// Destination prefix ("default" or CIDR)
    #[serde(default)]
    pub dst: Option<String>,
    /// Next-hop gateway
    #[serde(default)]
    pub gateway: Option<String>,
    /// Output device
    #[serde(default)]
    pub dev: Option<String>,
}
