//! SONiC ConfigDB JSON rendering.
//!
//! Alternative backend to the FRR CLI renderer for switches managed
//! through a JSON configuration database. Nothing pushes this output
//! yet; the onboarding path stores FRR text only.

use serde_json::{json, Map, Value};

use crate::types::SwitchIntent;

/// Renders the ConfigDB document for one switch.
pub fn generate_configdb(hostname: &str, intent: &SwitchIntent) -> Value {
    let mut neighbors = Map::new();
    for neighbor in &intent.neighbors {
        neighbors.insert(
            neighbor.ip.clone(),
            json!({
                "asn": neighbor.remote_asn,
                "name": neighbor.name.as_deref().unwrap_or(""),
            }),
        );
    }

    let mut loopbacks = Map::new();
    loopbacks.insert("Loopback0".to_string(), json!({}));
    loopbacks.insert(format!("Loopback0|{}/32", intent.router_id), json!({}));

    let mut tunnel_maps = Map::new();
    let mut vrfs = Map::new();
    for vrf in &intent.vrfs {
        tunnel_maps.insert(
            format!("vtep1|map_{}_{}", vrf.vni, vrf.name),
            json!({ "vni": vrf.vni, "vlan": vrf.name }),
        );
        vrfs.insert(vrf.name.clone(), json!({ "vni": vrf.vni }));
    }

    json!({
        "DEVICE_METADATA": {
            "localhost": {
                "hostname": hostname,
                "type": "ToRRouter",
                "hwsku": "Force10-S6000",
            }
        },
        "LOOPBACK_INTERFACE": loopbacks,
        "BGP_GLOBALS": {
            "default": {
                "local_asn": intent.asn,
                "router_id": intent.router_id,
            }
        },
        "BGP_NEIGHBOR": neighbors,
        "VXLAN_TUNNEL": {
            "vtep1": { "src_ip": intent.router_id }
        },
        "VXLAN_TUNNEL_MAP": tunnel_maps,
        "VRF": vrfs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Neighbor, VrfConfig};

    fn intent() -> SwitchIntent {
        SwitchIntent {
            router_id: "10.0.0.1".to_string(),
            asn: 65001,
            neighbors: vec![Neighbor {
                ip: "10.0.0.100".to_string(),
                remote_asn: 65100,
                peer_group: None,
                name: Some("spine1".to_string()),
            }],
            vrfs: vec![VrfConfig {
                name: "VRF-vpc-a".to_string(),
                vni: 1003,
                rd: "10.0.0.1:1003".to_string(),
                rt_import: vec![],
                rt_export: vec![],
            }],
            static_routes: Vec::new(),
        }
    }

    #[test]
    fn test_configdb_tables() {
        let doc = generate_configdb("leaf1", &intent());

        assert_eq!(doc["DEVICE_METADATA"]["localhost"]["hostname"], "leaf1");
        assert_eq!(doc["BGP_GLOBALS"]["default"]["local_asn"], 65001);
        assert_eq!(doc["BGP_NEIGHBOR"]["10.0.0.100"]["asn"], 65100);
        assert_eq!(doc["VXLAN_TUNNEL"]["vtep1"]["src_ip"], "10.0.0.1");
        assert_eq!(doc["VXLAN_TUNNEL_MAP"]["vtep1|map_1003_VRF-vpc-a"]["vni"], 1003);
        assert_eq!(doc["VRF"]["VRF-vpc-a"]["vni"], 1003);
        assert!(doc["LOOPBACK_INTERFACE"]
            .as_object()
            .unwrap()
            .contains_key("Loopback0|10.0.0.1/32"));
    }
}
