//! FRR configuration rendering.
//!
//! Produces a full router configuration: a global BGP instance with
//! best-path multipath-relax and EVPN advertise-all-vni, plus one BGP
//! VRF instance per VRF redistributing connected/static routes and
//! carrying the VRF's route-targets under the l2vpn evpn address-family.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{SwitchConfig, SwitchIntent, Topology};

/// Generates switch configurations from high-level intent.
#[derive(Debug, Default)]
pub struct ConfigGenerator;

impl ConfigGenerator {
    /// Creates a generator.
    pub fn new() -> Self {
        Self
    }

    /// Renders the FRR configuration for one switch.
    pub fn generate_frr_config(&self, hostname: &str, intent: &SwitchIntent) -> SwitchConfig {
        let mut out = String::from("!\nfrr version 8.5\nfrr defaults datacenter\n");
        out.push_str(&format!("hostname {}\n", hostname));
        out.push_str("log syslog informational\n");
        out.push_str("service integrated-vtysh-config\n!\n");

        // VRF to L3VNI bindings.
        for vrf in &intent.vrfs {
            out.push_str(&format!("vrf {}\n vni {}\nexit-vrf\n!\n", vrf.name, vrf.vni));
        }

        // Global BGP instance.
        out.push_str(&format!("router bgp {}\n", intent.asn));
        out.push_str(&format!(" bgp router-id {}\n", intent.router_id));
        out.push_str(" bgp bestpath as-path multipath-relax\n");
        out.push_str(" no bgp ebgp-requires-policy\n");
        out.push_str(" no bgp default ipv4-unicast\n !\n");
        for neighbor in &intent.neighbors {
            out.push_str(&format!(
                " neighbor {} remote-as {}\n",
                neighbor.ip, neighbor.remote_asn
            ));
            if let Some(group) = &neighbor.peer_group {
                out.push_str(&format!(" neighbor {} peer-group {}\n", neighbor.ip, group));
            }
        }
        out.push_str(" !\n address-family ipv4 unicast\n  redistribute connected\n");
        for neighbor in &intent.neighbors {
            out.push_str(&format!("  neighbor {} activate\n", neighbor.ip));
        }
        out.push_str(" exit-address-family\n !\n address-family l2vpn evpn\n");
        for neighbor in &intent.neighbors {
            out.push_str(&format!("  neighbor {} activate\n", neighbor.ip));
        }
        out.push_str("  advertise-all-vni\n exit-address-family\nexit\n!\n");

        // One BGP VRF instance per VRF.
        for vrf in &intent.vrfs {
            out.push_str(&format!("router bgp {} vrf {}\n", intent.asn, vrf.name));
            out.push_str(&format!(" bgp router-id {}\n", intent.router_id));
            out.push_str(" !\n address-family ipv4 unicast\n");
            out.push_str("  redistribute connected\n  redistribute static\n");
            out.push_str(" exit-address-family\n !\n address-family l2vpn evpn\n");
            out.push_str("  advertise ipv4 unicast\n");
            out.push_str(&format!("  rd {}\n", vrf.rd));
            for rt in &vrf.rt_import {
                out.push_str(&format!("  route-target import {}\n", rt));
            }
            for rt in &vrf.rt_export {
                out.push_str(&format!("  route-target export {}\n", rt));
            }
            out.push_str(" exit-address-family\nexit\n!\n");
        }

        // Static route injection.
        for route in &intent.static_routes {
            match &route.vrf {
                Some(vrf) => out.push_str(&format!(
                    "ip route {} {} vrf {}\n",
                    route.prefix, route.next_hop, vrf
                )),
                None => {
                    out.push_str(&format!("ip route {} {}\n", route.prefix, route.next_hop))
                }
            }
        }

        debug!(hostname, lines = out.lines().count(), "Rendered FRR configuration");

        SwitchConfig {
            hostname: hostname.to_string(),
            router_id: intent.router_id.clone(),
            asn: intent.asn,
            config_text: out,
        }
    }

    /// Renders configurations for every switch in a topology.
    pub fn generate_all_configs(&self, topology: &Topology) -> BTreeMap<String, SwitchConfig> {
        topology
            .switches
            .iter()
            .map(|(hostname, intent)| {
                (hostname.clone(), self.generate_frr_config(hostname, intent))
            })
            .collect()
    }
}
