//! Zero touch provisioning for new fabric devices.
//!
//! Devices move through discovered -> assigned -> provisioned. Discovery
//! is an upsert keyed by MAC address, so rediscovering a device resets it
//! to the discovered state and drops its role assignment. Provisioning
//! renders the device's FRR configuration from the fabric topology and
//! stores it with the inventory entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfgenError, ConfgenResult};
use crate::render::ConfigGenerator;
use crate::types::{SwitchConfig, Topology};

/// Lifecycle state of an inventoried device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Discovered,
    Assigned,
    Provisioned,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Discovered => "discovered",
            DeviceStatus::Assigned => "assigned",
            DeviceStatus::Provisioned => "provisioned",
        }
    }
}

/// One device in the onboarding inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub mac_address: String,
    pub ip_address: String,
    pub status: DeviceStatus,
    pub model: String,
    pub serial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

/// Handles device discovery, role assignment and initial config push.
#[derive(Debug, Default)]
pub struct DeviceOnboarding {
    generator: ConfigGenerator,
    inventory: BTreeMap<String, InventoryEntry>,
}

impl DeviceOnboarding {
    pub fn new(generator: ConfigGenerator) -> Self {
        Self {
            generator,
            inventory: BTreeMap::new(),
        }
    }

    /// Registers a device seen on the management network. Rediscovery
    /// of a known MAC overwrites the entry and resets its lifecycle.
    pub fn discover_device(&mut self, mac_address: &str, ip_address: &str) -> &InventoryEntry {
        info!(mac = mac_address, ip = ip_address, "Discovered device");

        let entry = InventoryEntry {
            mac_address: mac_address.to_string(),
            ip_address: ip_address.to_string(),
            status: DeviceStatus::Discovered,
            model: "generic-switch".to_string(),
            serial: format!("SN-{}", mac_address.replace(':', "")),
            role: None,
            rack_id: None,
            position: None,
            hostname: None,
            config: None,
        };

        self.inventory.insert(mac_address.to_string(), entry);
        &self.inventory[mac_address]
    }

    /// Assigns a fabric role (spine, leaf, border-leaf) and derives the
    /// hostname from role and rack position.
    pub fn assign_role(
        &mut self,
        mac_address: &str,
        role: &str,
        rack_id: &str,
        position: u32,
    ) -> ConfgenResult<&InventoryEntry> {
        let entry = self
            .inventory
            .get_mut(mac_address)
            .ok_or_else(|| ConfgenError::device_not_found(mac_address))?;

        entry.role = Some(role.to_string());
        entry.rack_id = Some(rack_id.to_string());
        entry.position = Some(position);
        entry.hostname = Some(format!("{}{}", role, position));
        entry.status = DeviceStatus::Assigned;

        info!(mac = mac_address, role, "Assigned device role");

        Ok(&*entry)
    }

    /// Renders and records the initial configuration for an assigned
    /// device. The device must have topology data under its hostname.
    pub fn provision_device(
        &mut self,
        mac_address: &str,
        topology: &Topology,
    ) -> ConfgenResult<SwitchConfig> {
        let hostname = {
            let entry = self
                .inventory
                .get(mac_address)
                .ok_or_else(|| ConfgenError::device_not_found(mac_address))?;

            if entry.status != DeviceStatus::Assigned {
                return Err(ConfgenError::invalid_state(
                    mac_address,
                    entry.status.as_str(),
                    DeviceStatus::Assigned.as_str(),
                ));
            }

            // Assigned entries always carry a hostname.
            entry.hostname.clone().unwrap_or_default()
        };

        let intent = topology
            .switches
            .get(&hostname)
            .ok_or_else(|| ConfgenError::switch_not_found(&hostname))?;

        let config = self.generator.generate_frr_config(&hostname, intent);

        // Presence was checked above.
        if let Some(entry) = self.inventory.get_mut(mac_address) {
            entry.status = DeviceStatus::Provisioned;
            entry.config = Some(config.config_text.clone());
        }

        info!(hostname, "Provisioned device");

        Ok(config)
    }

    pub fn get_inventory(&self) -> &BTreeMap<String, InventoryEntry> {
        &self.inventory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Neighbor, SwitchIntent, VrfConfig};

    const MAC: &str = "aa:bb:cc:dd:ee:01";

    fn topology_with(hostname: &str) -> Topology {
        let mut topology = Topology::default();
        topology.switches.insert(
            hostname.to_string(),
            SwitchIntent {
                router_id: "10.0.0.1".to_string(),
                asn: 65001,
                neighbors: vec![Neighbor {
                    ip: "10.0.0.100".to_string(),
                    remote_asn: 65100,
                    peer_group: None,
                    name: None,
                }],
                vrfs: vec![VrfConfig {
                    name: "VRF-vpc-a".to_string(),
                    vni: 1003,
                    rd: "10.0.0.1:1003".to_string(),
                    rt_import: vec!["65000:1003".to_string()],
                    rt_export: vec!["65000:1003".to_string()],
                }],
                static_routes: Vec::new(),
            },
        );
        topology
    }

    #[test]
    fn test_discovery_populates_inventory() {
        let mut onboarding = DeviceOnboarding::default();
        let entry = onboarding.discover_device(MAC, "192.168.1.50");

        assert_eq!(entry.status, DeviceStatus::Discovered);
        assert_eq!(entry.model, "generic-switch");
        assert_eq!(entry.serial, "SN-aabbccddee01");
        assert!(entry.hostname.is_none());
    }

    #[test]
    fn test_assign_role_derives_hostname() {
        let mut onboarding = DeviceOnboarding::default();
        onboarding.discover_device(MAC, "192.168.1.50");

        let entry = onboarding.assign_role(MAC, "leaf", "rack-3", 1).unwrap();
        assert_eq!(entry.status, DeviceStatus::Assigned);
        assert_eq!(entry.hostname.as_deref(), Some("leaf1"));
        assert_eq!(entry.rack_id.as_deref(), Some("rack-3"));
    }

    #[test]
    fn test_assign_role_unknown_device() {
        let mut onboarding = DeviceOnboarding::default();
        let err = onboarding.assign_role(MAC, "leaf", "rack-3", 1).unwrap_err();
        assert!(matches!(err, ConfgenError::DeviceNotFound { .. }));
    }

    #[test]
    fn test_provision_renders_and_stores_config() {
        let mut onboarding = DeviceOnboarding::default();
        onboarding.discover_device(MAC, "192.168.1.50");
        onboarding.assign_role(MAC, "leaf", "rack-3", 1).unwrap();

        let config = onboarding.provision_device(MAC, &topology_with("leaf1")).unwrap();
        assert_eq!(config.hostname, "leaf1");
        assert!(config.config_text.contains("router bgp 65001"));

        let entry = &onboarding.get_inventory()[MAC];
        assert_eq!(entry.status, DeviceStatus::Provisioned);
        assert_eq!(entry.config.as_deref(), Some(config.config_text.as_str()));
    }

    #[test]
    fn test_provision_requires_assignment() {
        let mut onboarding = DeviceOnboarding::default();
        onboarding.discover_device(MAC, "192.168.1.50");

        let err = onboarding
            .provision_device(MAC, &topology_with("leaf1"))
            .unwrap_err();
        assert!(matches!(err, ConfgenError::InvalidState { .. }));
    }

    #[test]
    fn test_provision_without_topology_entry() {
        let mut onboarding = DeviceOnboarding::default();
        onboarding.discover_device(MAC, "192.168.1.50");
        onboarding.assign_role(MAC, "leaf", "rack-3", 7).unwrap();

        let err = onboarding
            .provision_device(MAC, &topology_with("leaf1"))
            .unwrap_err();
        assert!(matches!(err, ConfgenError::SwitchNotFound { .. }));
    }

    #[test]
    fn test_reassign_overwrites_previous_role() {
        let mut onboarding = DeviceOnboarding::default();
        onboarding.discover_device(MAC, "192.168.1.50");
        onboarding.assign_role(MAC, "leaf", "rack-3", 1).unwrap();

        // Reassignment is permitted at any stage and simply replaces
        // the previous role, rack and derived hostname.
        let entry = onboarding.assign_role(MAC, "spine", "rack-1", 2).unwrap();
        assert_eq!(entry.status, DeviceStatus::Assigned);
        assert_eq!(entry.role.as_deref(), Some("spine"));
        assert_eq!(entry.rack_id.as_deref(), Some("rack-1"));
        assert_eq!(entry.position, Some(2));
        assert_eq!(entry.hostname.as_deref(), Some("spine2"));

        // Even a provisioned device can be repurposed this way.
        onboarding.provision_device(MAC, &topology_with("spine2")).unwrap();
        let entry = onboarding.assign_role(MAC, "leaf", "rack-5", 4).unwrap();
        assert_eq!(entry.status, DeviceStatus::Assigned);
        assert_eq!(entry.hostname.as_deref(), Some("leaf4"));
    }

    #[test]
    fn rediscovery_resets_state() {
        let mut onboarding = DeviceOnboarding::default();
        onboarding.discover_device(MAC, "192.168.1.50");
        onboarding.assign_role(MAC, "leaf", "rack-3", 1).unwrap();
        onboarding.provision_device(MAC, &topology_with("leaf1")).unwrap();

        // The device boots again and is rediscovered, possibly with a
        // new management address.
        let entry = onboarding.discover_device(MAC, "192.168.1.60");
        assert_eq!(entry.status, DeviceStatus::Discovered);
        assert_eq!(entry.ip_address, "192.168.1.60");
        assert!(entry.role.is_none());
        assert!(entry.config.is_none());

        // It must be reassigned before provisioning again.
        let err = onboarding
            .provision_device(MAC, &topology_with("leaf1"))
            .unwrap_err();
        assert!(matches!(err, ConfgenError::InvalidState { .. }));
    }
}
