//! Shell command builders for datapath operations.
//!
//! Builders only format commands; execution and idempotence handling live
//! in [`crate::datapath`] and [`crate::firewall`].

use fabric_common::shell::{self, shellquote};

use crate::types::{VxlanDevice, VxlanEndpoint};

/// Prefixes a command with `ip netns exec <ns>` when a namespace is given.
pub fn in_namespace(namespace: Option<&str>, cmd: &str) -> String {
    match namespace {
        Some(ns) => format!("{} netns exec {} {}", shell::IP_CMD, shellquote(ns), cmd),
        None => cmd.to_string(),
    }
}

/// Build namespace creation command
pub fn build_add_netns_cmd(name: &str) -> String {
    format!("{} netns add {}", shell::IP_CMD, shellquote(name))
}

/// Build namespace deletion command
pub fn build_del_netns_cmd(name: &str) -> String {
    format!("{} netns del {}", shell::IP_CMD, shellquote(name))
}

/// Build VXLAN device creation command
///
/// Renders local address, remote/group endpoint and encapsulation port
/// when present on the device record.
pub fn build_add_vxlan_cmd(device: &VxlanDevice) -> String {
    let mut cmd = format!(
        "{} link add {} type vxlan id {}",
        shell::IP_CMD,
        shellquote(&device.name),
        device.vni
    );
    if let Some(local) = &device.local_ip {
        cmd.push_str(&format!(" local {}", shellquote(local)));
    }
    match &device.endpoint {
        Some(VxlanEndpoint::Remote(ip)) => cmd.push_str(&format!(" remote {}", shellquote(ip))),
        Some(VxlanEndpoint::Group(group)) => {
            cmd.push_str(&format!(" group {}", shellquote(group)))
        }
        None => {}
    }
    cmd.push_str(&format!(" dstport {}", device.port));
    cmd
}

/// Build link bring-up command
pub fn build_set_link_up_cmd(name: &str, namespace: Option<&str>) -> String {
    in_namespace(
        namespace,
        &format!("{} link set {} up", shell::IP_CMD, shellquote(name)),
    )
}

/// Build link deletion command
pub fn build_del_link_cmd(name: &str) -> String {
    format!("{} link del {}", shell::IP_CMD, shellquote(name))
}

/// Build veth pair creation command
pub fn build_add_veth_cmd(name: &str, peer_name: &str) -> String {
    format!(
        "{} link add {} type veth peer name {}",
        shell::IP_CMD,
        shellquote(name),
        shellquote(peer_name)
    )
}

/// Build command moving a link into a namespace
pub fn build_set_link_netns_cmd(name: &str, namespace: &str) -> String {
    format!(
        "{} link set {} netns {}",
        shell::IP_CMD,
        shellquote(name),
        shellquote(namespace)
    )
}

/// Build address assignment command
pub fn build_add_address_cmd(interface: &str, address: &str, namespace: Option<&str>) -> String {
    in_namespace(
        namespace,
        &format!(
            "{} addr add {} dev {}",
            shell::IP_CMD,
            shellquote(address),
            shellquote(interface)
        ),
    )
}

/// Build route addition command
pub fn build_add_route_cmd(
    destination: &str,
    gateway: &str,
    interface: Option<&str>,
    table: Option<u32>,
    namespace: Option<&str>,
) -> String {
    let mut cmd = format!(
        "{} route add {} via {}",
        shell::IP_CMD,
        shellquote(destination),
        shellquote(gateway)
    );
    if let Some(dev) = interface {
        cmd.push_str(&format!(" dev {}", shellquote(dev)));
    }
    if let Some(table) = table {
        cmd.push_str(&format!(" table {}", table));
    }
    in_namespace(namespace, &cmd)
}

/// Build route deletion command
pub fn build_del_route_cmd(destination: &str, namespace: Option<&str>) -> String {
    in_namespace(
        namespace,
        &format!("{} route del {}", shell::IP_CMD, shellquote(destination)),
    )
}

/// Build JSON route listing command
pub fn build_list_routes_cmd(namespace: Option<&str>) -> String {
    in_namespace(namespace, &format!("{} -j route list", shell::IP_CMD))
}

/// Build detailed JSON link listing command
///
/// Detailed mode is required for `info_kind`/`info_data`, which discovery
/// uses to classify vxlan and vrf devices.
pub fn build_list_links_cmd(namespace: Option<&str>) -> String {
    in_namespace(namespace, &format!("{} -d -j link show", shell::IP_CMD))
}

/// Build bridge creation command
pub fn build_add_bridge_cmd(name: &str, namespace: Option<&str>) -> String {
    in_namespace(
        namespace,
        &format!("{} link add {} type bridge", shell::IP_CMD, shellquote(name)),
    )
}

/// Build bridge port enslave command
pub fn build_add_bridge_port_cmd(bridge: &str, interface: &str, namespace: Option<&str>) -> String {
    in_namespace(
        namespace,
        &format!(
            "{} link set {} master {}",
            shell::IP_CMD,
            shellquote(interface),
            shellquote(bridge)
        ),
    )
}

/// Build VRF device creation command
///
/// Binds the VRF to the given routing table ID.
pub fn build_add_vrf_cmd(vrf_name: &str, table_id: u32) -> String {
    format!(
        "{} link add {} type vrf table {}",
        shell::IP_CMD,
        shellquote(vrf_name),
        table_id
    )
}

/// Build forward-chain rule dump command
///
/// The output is scanned for per-VPC isolation markers during discovery.
pub fn build_show_forward_rules_cmd() -> String {
    format!("{} -S FORWARD", shell::IPTABLES_CMD)
}

/// Build a one-direction isolation reject rule between two CIDRs
pub fn build_isolation_reject_cmd(source_cidr: &str, dest_cidr: &str) -> String {
    format!(
        "{} -I FORWARD -s {} -d {} -j REJECT",
        shell::IPTABLES_CMD,
        shellquote(source_cidr),
        shellquote(dest_cidr)
    )
}

/// Build a vtysh invocation pushing configuration lines in order
pub fn build_vtysh_push_cmd(lines: &[String]) -> String {
    let mut cmd = shell::VTYSH_CMD.to_string();
    for line in lines {
        cmd.push_str(&format!(" -c {}", shellquote(line)));
    }
    cmd
}
