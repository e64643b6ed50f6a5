//! Network Execution Layer - datapath primitives and fabric state discovery
//!
//! fabric-net drives the simulated network fabric through a [`NodeClient`]
//! transport, handling:
//! - Network namespace, VXLAN, veth, bridge, address and route management
//! - NAT and firewall rules over nftables or iptables backends
//! - Structured device introspection (`ip -j` output)
//! - Single-node actual-state snapshot discovery for the reconciler
//!
//! All create/add primitives are idempotent; re-issuing them against
//! existing state is success, never an error.
//!
//! [`NodeClient`]: fabric_common::NodeClient

pub mod commands;
pub mod datapath;
pub mod discover;
pub mod firewall;
pub mod types;

pub use datapath::Datapath;
pub use discover::{DeviceState, Discoverer, FabricSnapshot, TunnelState, VpcIntent};
pub use firewall::{Firewall, FirewallBackend, FilterRule};
pub use types::{VethPair, VxlanDevice, VxlanEndpoint};
