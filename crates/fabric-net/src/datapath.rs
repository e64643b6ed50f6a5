//! Datapath primitives against one fabric node.
//!
//! Every create/add operation is idempotent: re-issuing it against
//! existing state maps the kernel's "exists" answer to success. The
//! reconciler relies on this after a discovery failure degrades the
//! actual-state snapshot to empty and all CREATEs are re-issued.

use std::sync::Arc;

use fabric_common::{FabricError, FabricResult, NodeClient};
use tracing::{debug, info, instrument};

use crate::commands::*;
use crate::types::{LinkEntry, NetworkNamespace, RouteEntry, VethPair, VxlanDevice};

/// Maps an "object already exists" failure to success.
fn ok_if_exists(result: FabricResult<String>) -> FabricResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_already_exists() => {
            debug!("Object already exists, treating as success");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Maps an "object not found" failure on delete to success.
fn ok_if_missing(result: FabricResult<String>) -> FabricResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(FabricError::CommandFailed { ref output, .. })
            if {
                let out = output.to_ascii_lowercase();
                out.contains("no such") || out.contains("not found") || out.contains("cannot find")
            } =>
        {
            debug!("Object already absent, treating as success");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Datapath manager for a single fabric node.
pub struct Datapath {
    node: Arc<dyn NodeClient>,
}

impl Datapath {
    /// Creates a datapath manager over the given node transport.
    pub fn new(node: Arc<dyn NodeClient>) -> Self {
        Self { node }
    }

    /// The node this datapath drives.
    pub fn node_name(&self) -> &str {
        self.node.name()
    }

    /// Create a network namespace.
    #[instrument(skip(self))]
    pub async fn create_namespace(&self, name: &str) -> FabricResult<NetworkNamespace> {
        ok_if_exists(self.node.execute(&build_add_netns_cmd(name)).await)?;
        info!(node = self.node.name(), namespace = name, "Created namespace");
        Ok(NetworkNamespace::new(name))
    }

    /// Delete a network namespace.
    #[instrument(skip(self))]
    pub async fn delete_namespace(&self, name: &str) -> FabricResult<()> {
        ok_if_missing(self.node.execute(&build_del_netns_cmd(name)).await)?;
        info!(node = self.node.name(), namespace = name, "Deleted namespace");
        Ok(())
    }

    /// Create a VXLAN device and bring it up.
    #[instrument(skip(self, device), fields(device = %device.name, vni = device.vni))]
    pub async fn create_vxlan(&self, device: &VxlanDevice) -> FabricResult<()> {
        ok_if_exists(self.node.execute(&build_add_vxlan_cmd(device)).await)?;
        self.node
            .execute(&build_set_link_up_cmd(&device.name, None))
            .await?;
        info!(
            node = self.node.name(),
            device = %device.name,
            vni = device.vni,
            "Created VXLAN device"
        );
        Ok(())
    }

    /// Delete a link by name.
    #[instrument(skip(self))]
    pub async fn delete_link(&self, name: &str) -> FabricResult<()> {
        ok_if_missing(self.node.execute(&build_del_link_cmd(name)).await)
    }

    /// Create a veth pair, optionally moving the peer end into a
    /// namespace, and bring the local end up.
    #[instrument(skip(self))]
    pub async fn create_veth_pair(
        &self,
        name: &str,
        peer_name: &str,
        namespace: Option<&str>,
    ) -> FabricResult<VethPair> {
        ok_if_exists(self.node.execute(&build_add_veth_cmd(name, peer_name)).await)?;

        if let Some(ns) = namespace {
            self.node
                .execute(&build_set_link_netns_cmd(peer_name, ns))
                .await?;
        }

        self.node
            .execute(&build_set_link_up_cmd(name, None))
            .await?;

        info!(
            node = self.node.name(),
            veth = name,
            peer = peer_name,
            "Created veth pair"
        );

        Ok(VethPair {
            name: name.to_string(),
            peer_name: peer_name.to_string(),
            namespace: namespace.map(String::from),
        })
    }

    /// Add an IP address to an interface.
    #[instrument(skip(self))]
    pub async fn add_ip_address(
        &self,
        interface: &str,
        address: &str,
        namespace: Option<&str>,
    ) -> FabricResult<()> {
        ok_if_exists(
            self.node
                .execute(&build_add_address_cmd(interface, address, namespace))
                .await,
        )
    }

    /// Add a route.
    #[instrument(skip(self))]
    pub async fn add_route(
        &self,
        destination: &str,
        gateway: &str,
        interface: Option<&str>,
        namespace: Option<&str>,
        table: Option<u32>,
    ) -> FabricResult<()> {
        ok_if_exists(
            self.node
                .execute(&build_add_route_cmd(
                    destination,
                    gateway,
                    interface,
                    table,
                    namespace,
                ))
                .await,
        )
    }

    /// Delete a route.
    #[instrument(skip(self))]
    pub async fn del_route(&self, destination: &str, namespace: Option<&str>) -> FabricResult<()> {
        ok_if_missing(
            self.node
                .execute(&build_del_route_cmd(destination, namespace))
                .await,
        )
    }

    /// Structured route listing.
    pub async fn get_routes(&self, namespace: Option<&str>) -> FabricResult<Vec<RouteEntry>> {
        let output = self.node.execute(&build_list_routes_cmd(namespace)).await?;
        serde_json::from_str(&output)
            .map_err(|e| FabricError::parse("ip route listing", e.to_string()))
    }

    /// Structured interface listing (detailed mode).
    pub async fn get_interfaces(&self, namespace: Option<&str>) -> FabricResult<Vec<LinkEntry>> {
        let output = self.node.execute(&build_list_links_cmd(namespace)).await?;
        serde_json::from_str(&output)
            .map_err(|e| FabricError::parse("ip link listing", e.to_string()))
    }

    /// Create a bridge device and bring it up.
    #[instrument(skip(self))]
    pub async fn create_bridge(&self, name: &str, namespace: Option<&str>) -> FabricResult<()> {
        ok_if_exists(self.node.execute(&build_add_bridge_cmd(name, namespace)).await)?;
        self.node
            .execute(&build_set_link_up_cmd(name, namespace))
            .await?;
        info!(node = self.node.name(), bridge = name, "Created bridge");
        Ok(())
    }

    /// Enslave an interface to a bridge.
    #[instrument(skip(self))]
    pub async fn add_bridge_port(
        &self,
        bridge: &str,
        interface: &str,
        namespace: Option<&str>,
    ) -> FabricResult<()> {
        ok_if_exists(
            self.node
                .execute(&build_add_bridge_port_cmd(bridge, interface, namespace))
                .await,
        )
    }

    /// Create a VRF device bound to a routing table and bring it up.
    ///
    /// A node rejecting the vrf link kind surfaces as
    /// [`FabricError::NotSupported`] so callers with a functional
    /// fallback can downgrade it.
    #[instrument(skip(self))]
    pub async fn create_vrf(&self, vrf_name: &str, table_id: u32) -> FabricResult<()> {
        let result = self.node.execute(&build_add_vrf_cmd(vrf_name, table_id)).await;
        match result {
            Err(e) if e.is_not_supported() => {
                return Err(FabricError::not_supported(
                    format!("vrf device {}", vrf_name),
                    self.node.name(),
                ))
            }
            other => ok_if_exists(other)?,
        }
        self.node
            .execute(&build_set_link_up_cmd(vrf_name, None))
            .await?;
        info!(
            node = self.node.name(),
            vrf = vrf_name,
            table = table_id,
            "Created VRF device"
        );
        Ok(())
    }

    /// Push configuration lines to the node's routing daemon via vtysh.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn push_router_config(&self, lines: &[String]) -> FabricResult<String> {
        self.node.execute(&build_vtysh_push_cmd(lines)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_common::testing::FakeNode;

    fn datapath(node: FakeNode) -> (Datapath, Arc<FakeNode>) {
        let node = Arc::new(node);
        (Datapath::new(node.clone()), node)
    }

    #[tokio::test]
    async fn test_create_namespace() {
        let (dp, node) = datapath(FakeNode::new("leaf-1"));
        let ns = dp.create_namespace("blue").await.unwrap();
        assert_eq!(ns.name, "blue");
        assert_eq!(node.count_matching("netns add"), 1);
    }

    #[tokio::test]
    async fn test_create_namespace_idempotent() {
        let (dp, _) = datapath(
            FakeNode::new("leaf-1").fail_on("netns add", "Cannot create namespace: File exists"),
        );
        assert!(dp.create_namespace("blue").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_vxlan_brings_device_up() {
        let (dp, node) = datapath(FakeNode::new("leaf-1"));
        let dev = VxlanDevice::for_vni(1003);
        dp.create_vxlan(&dev).await.unwrap();

        let cmds = node.captured_commands();
        assert!(cmds[0].contains("type vxlan id 1003"));
        assert!(cmds[1].contains("link set \"vxlan1003\" up"));
    }

    #[tokio::test]
    async fn test_create_vxlan_idempotent() {
        let (dp, node) = datapath(
            FakeNode::new("leaf-1").fail_on("link add", "RTNETLINK answers: File exists"),
        );
        dp.create_vxlan(&VxlanDevice::for_vni(1003)).await.unwrap();
        // Device is still brought up
        assert_eq!(node.count_matching("link set"), 1);
    }

    #[tokio::test]
    async fn test_create_veth_pair_with_namespace() {
        let (dp, node) = datapath(FakeNode::new("leaf-1"));
        let pair = dp.create_veth_pair("veth0", "veth0-peer", Some("blue")).await.unwrap();

        assert_eq!(pair.namespace.as_deref(), Some("blue"));
        assert_eq!(node.count_matching("netns \"blue\""), 1);
        assert_eq!(node.count_matching("up"), 1);
    }

    #[tokio::test]
    async fn test_add_route_is_idempotent() {
        let (dp, _) = datapath(
            FakeNode::new("leaf-1").fail_on("route add", "RTNETLINK answers: File exists"),
        );
        assert!(dp
            .add_route("10.2.0.0/16", "10.0.0.1", None, None, None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_del_route_missing_is_ok() {
        let (dp, _) = datapath(
            FakeNode::new("leaf-1").fail_on("route del", "RTNETLINK answers: No such process"),
        );
        assert!(dp.del_route("10.2.0.0/16", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_interfaces_parses_json() {
        let json = r#"[{"ifname": "vxlan1003",
                        "linkinfo": {"info_kind": "vxlan", "info_data": {"id": 1003}}}]"#;
        let (dp, _) = datapath(FakeNode::new("leaf-1").on_command("link show", json));
        let links = dp.get_interfaces(None).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].vni(), Some(1003));
    }

    #[tokio::test]
    async fn test_get_routes_bad_json_is_parse_error() {
        let (dp, _) = datapath(FakeNode::new("leaf-1").on_command("route list", "not json"));
        let err = dp.get_routes(None).await.unwrap_err();
        assert!(matches!(err, FabricError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_create_vrf_not_supported_is_distinct() {
        let (dp, _) = datapath(FakeNode::new("leaf-2").not_supported_on("type vrf"));
        let err = dp.create_vrf("VRF-vpc-a", 1003).await.unwrap_err();
        assert!(err.is_not_supported());
    }

    #[tokio::test]
    async fn test_create_vrf_binds_table_to_vni() {
        let (dp, node) = datapath(FakeNode::new("leaf-1"));
        dp.create_vrf("VRF-vpc-a", 1003).await.unwrap();
        assert_eq!(node.count_matching("type vrf table 1003"), 1);
        assert_eq!(node.count_matching("link set \"VRF-vpc-a\" up"), 1);
    }
}
