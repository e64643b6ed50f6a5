//! Switch configuration generation and zero touch provisioning.
//!
//! Renders BGP EVPN-VXLAN configurations (FRR CLI text, plus a ConfigDB
//! JSON backend), diffs rendered configurations into push commands, and
//! drives new devices through the discover/assign/provision lifecycle.

pub mod configdb;
pub mod diff;
pub mod error;
pub mod onboarding;
pub mod render;
pub mod types;

pub use configdb::generate_configdb;
pub use diff::diff_configs;
pub use error::{ConfgenError, ConfgenResult};
pub use onboarding::{DeviceOnboarding, DeviceStatus, InventoryEntry};
pub use render::ConfigGenerator;
pub use types::{Neighbor, StaticRoute, SwitchConfig, SwitchIntent, Topology, VrfConfig};
