//! Firewall and NAT rule management.
//!
//! Backend-agnostic over the legacy linear rule list (iptables) and the
//! atomic rule-set engine (nftables). Tenant isolation always goes through
//! the legacy backend because discovery scans `iptables -S FORWARD` output
//! for the per-VPC reject markers.

use std::sync::Arc;

use fabric_common::shell::{self, shellquote};
use fabric_common::{FabricResult, NodeClient};
use tracing::{info, instrument};

use crate::commands::{build_isolation_reject_cmd, build_show_forward_rules_cmd};

/// Rule engine to drive on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallBackend {
    /// `nft` with atomic rule-set updates
    Nftables,
    /// `iptables` linear rule lists
    Iptables,
}

/// A filter rule for [`Firewall::add_firewall_rule`].
///
/// `protocol = None` means all protocols; `port` is only rendered when a
/// protocol is set.
#[derive(Debug, Clone, Default)]
pub struct FilterRule {
    /// Chain to append to (e.g. "forward", "input")
    pub chain: String,
    /// Source CIDR match
    pub source: Option<String>,
    /// Destination CIDR match
    pub dest: Option<String>,
    /// Protocol match (tcp, udp, icmp)
    pub protocol: Option<String>,
    /// Destination port match
    pub port: Option<u16>,
    /// Verdict (accept, drop, reject)
    pub action: String,
}

impl FilterRule {
    /// Creates a rule for a chain with the given verdict.
    pub fn new(chain: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            action: action.into(),
            ..Default::default()
        }
    }

    /// Sets the source CIDR match.
    pub fn source(mut self, cidr: impl Into<String>) -> Self {
        self.source = Some(cidr.into());
        self
    }

    /// Sets the destination CIDR match.
    pub fn dest(mut self, cidr: impl Into<String>) -> Self {
        self.dest = Some(cidr.into());
        self
    }

    /// Sets the protocol and optional destination port match.
    pub fn protocol(mut self, protocol: impl Into<String>, port: Option<u16>) -> Self {
        self.protocol = Some(protocol.into());
        self.port = port;
        self
    }
}

/// Firewall manager for a single fabric node.
pub struct Firewall {
    node: Arc<dyn NodeClient>,
    backend: FirewallBackend,
}

impl Firewall {
    /// Creates a firewall manager over the given node transport.
    pub fn new(node: Arc<dyn NodeClient>, backend: FirewallBackend) -> Self {
        Self { node, backend }
    }

    /// Add a source NAT rule for outbound traffic from a CIDR.
    #[instrument(skip(self))]
    pub async fn add_snat_rule(
        &self,
        source_cidr: &str,
        snat_ip: &str,
        out_interface: &str,
    ) -> FabricResult<()> {
        let cmd = match self.backend {
            FirewallBackend::Nftables => format!(
                "{} add rule ip nat postrouting ip saddr {} oifname {} snat to {}",
                shell::NFT_CMD,
                shellquote(source_cidr),
                shellquote(out_interface),
                shellquote(snat_ip)
            ),
            FirewallBackend::Iptables => format!(
                "{} -t nat -A POSTROUTING -s {} -o {} -j SNAT --to-source {}",
                shell::IPTABLES_CMD,
                shellquote(source_cidr),
                shellquote(out_interface),
                shellquote(snat_ip)
            ),
        };
        self.node.execute(&cmd).await?;
        info!(
            node = self.node.name(),
            source = source_cidr,
            snat = snat_ip,
            "Added SNAT rule"
        );
        Ok(())
    }

    /// Add a destination NAT rule for inbound traffic to an IP.
    #[instrument(skip(self))]
    pub async fn add_dnat_rule(
        &self,
        dest_ip: &str,
        dnat_ip: &str,
        protocol: &str,
        port: Option<u16>,
    ) -> FabricResult<()> {
        let cmd = match self.backend {
            FirewallBackend::Nftables => {
                let mut rule = format!("ip daddr {}", shellquote(dest_ip));
                if protocol != "all" {
                    if let Some(port) = port {
                        rule.push_str(&format!(" {} dport {}", shellquote(protocol), port));
                    }
                }
                format!("{} add rule ip nat prerouting {} dnat to {}", shell::NFT_CMD, rule, shellquote(dnat_ip))
            }
            FirewallBackend::Iptables => {
                let mut cmd = format!(
                    "{} -t nat -A PREROUTING -d {}",
                    shell::IPTABLES_CMD,
                    shellquote(dest_ip)
                );
                if protocol != "all" {
                    cmd.push_str(&format!(" -p {}", shellquote(protocol)));
                    if let Some(port) = port {
                        cmd.push_str(&format!(" --dport {}", port));
                    }
                }
                cmd.push_str(&format!(" -j DNAT --to-destination {}", shellquote(dnat_ip)));
                cmd
            }
        };
        self.node.execute(&cmd).await?;
        info!(
            node = self.node.name(),
            dest = dest_ip,
            dnat = dnat_ip,
            "Added DNAT rule"
        );
        Ok(())
    }

    /// Add a generic filter rule.
    #[instrument(skip(self, rule), fields(chain = %rule.chain, action = %rule.action))]
    pub async fn add_firewall_rule(&self, rule: &FilterRule) -> FabricResult<()> {
        let cmd = match self.backend {
            FirewallBackend::Nftables => {
                let mut parts = Vec::new();
                if let Some(source) = &rule.source {
                    parts.push(format!("ip saddr {}", shellquote(source)));
                }
                if let Some(dest) = &rule.dest {
                    parts.push(format!("ip daddr {}", shellquote(dest)));
                }
                if let Some(protocol) = &rule.protocol {
                    parts.push(format!("ip protocol {}", shellquote(protocol)));
                    if let Some(port) = rule.port {
                        parts.push(format!("{} dport {}", shellquote(protocol), port));
                    }
                }
                parts.push(rule.action.clone());
                format!(
                    "{} add rule ip filter {} {}",
                    shell::NFT_CMD,
                    shellquote(&rule.chain),
                    parts.join(" ")
                )
            }
            FirewallBackend::Iptables => {
                let mut cmd = format!(
                    "{} -A {}",
                    shell::IPTABLES_CMD,
                    shellquote(&rule.chain.to_ascii_uppercase())
                );
                if let Some(source) = &rule.source {
                    cmd.push_str(&format!(" -s {}", shellquote(source)));
                }
                if let Some(dest) = &rule.dest {
                    cmd.push_str(&format!(" -d {}", shellquote(dest)));
                }
                if let Some(protocol) = &rule.protocol {
                    cmd.push_str(&format!(" -p {}", shellquote(protocol)));
                    if let Some(port) = rule.port {
                        cmd.push_str(&format!(" --dport {}", port));
                    }
                }
                cmd.push_str(&format!(" -j {}", shellquote(&rule.action.to_ascii_uppercase())));
                cmd
            }
        };
        self.node.execute(&cmd).await?;
        Ok(())
    }

    /// Install the pairwise isolation boundary between two VPC CIDRs:
    /// reject rules in both directions on the forward chain.
    ///
    /// Always uses the legacy backend, matching what discovery scans for.
    #[instrument(skip(self))]
    pub async fn add_isolation_pair(&self, cidr_a: &str, cidr_b: &str) -> FabricResult<()> {
        self.node
            .execute(&build_isolation_reject_cmd(cidr_a, cidr_b))
            .await?;
        self.node
            .execute(&build_isolation_reject_cmd(cidr_b, cidr_a))
            .await?;
        info!(
            node = self.node.name(),
            a = cidr_a,
            b = cidr_b,
            "Installed isolation pair"
        );
        Ok(())
    }

    /// Dump the forward-chain rule text.
    pub async fn forward_rules(&self) -> FabricResult<String> {
        self.node.execute(&build_show_forward_rules_cmd()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_common::testing::FakeNode;

    fn firewall(backend: FirewallBackend) -> (Firewall, Arc<FakeNode>) {
        let node = Arc::new(FakeNode::new("leaf-1"));
        (Firewall::new(node.clone(), backend), node)
    }

    #[tokio::test]
    async fn test_snat_rule_nftables() {
        let (fw, node) = firewall(FirewallBackend::Nftables);
        fw.add_snat_rule("10.1.0.0/16", "192.0.2.1", "eth0").await.unwrap();

        let cmds = node.captured_commands();
        assert!(cmds[0].contains("nat postrouting"));
        assert!(cmds[0].contains("saddr \"10.1.0.0/16\""));
        assert!(cmds[0].contains("snat to \"192.0.2.1\""));
    }

    #[tokio::test]
    async fn test_snat_rule_iptables() {
        let (fw, node) = firewall(FirewallBackend::Iptables);
        fw.add_snat_rule("10.1.0.0/16", "192.0.2.1", "eth0").await.unwrap();

        let cmds = node.captured_commands();
        assert!(cmds[0].contains("-t nat -A POSTROUTING"));
        assert!(cmds[0].contains("-j SNAT --to-source \"192.0.2.1\""));
    }

    #[tokio::test]
    async fn test_dnat_rule_with_port() {
        let (fw, node) = firewall(FirewallBackend::Iptables);
        fw.add_dnat_rule("192.0.2.10", "10.1.0.5", "tcp", Some(443)).await.unwrap();

        let cmds = node.captured_commands();
        assert!(cmds[0].contains("-A PREROUTING"));
        assert!(cmds[0].contains("-p \"tcp\" --dport 443"));
        assert!(cmds[0].contains("--to-destination \"10.1.0.5\""));
    }

    #[tokio::test]
    async fn test_dnat_rule_all_protocols_skips_port() {
        let (fw, node) = firewall(FirewallBackend::Nftables);
        fw.add_dnat_rule("192.0.2.10", "10.1.0.5", "all", Some(443)).await.unwrap();
        assert!(!node.captured_commands()[0].contains("dport"));
    }

    #[tokio::test]
    async fn test_filter_rule_iptables() {
        let (fw, node) = firewall(FirewallBackend::Iptables);
        let rule = FilterRule::new("forward", "accept")
            .source("10.1.0.0/16")
            .protocol("tcp", Some(22));
        fw.add_firewall_rule(&rule).await.unwrap();

        let cmds = node.captured_commands();
        assert!(cmds[0].contains("-A \"FORWARD\""));
        assert!(cmds[0].contains("-j \"ACCEPT\""));
    }

    #[tokio::test]
    async fn test_isolation_pair_is_bidirectional() {
        let (fw, node) = firewall(FirewallBackend::Nftables);
        fw.add_isolation_pair("10.1.0.0/16", "10.2.0.0/16").await.unwrap();

        let cmds = node.captured_commands();
        assert_eq!(cmds.len(), 2);
        assert!(cmds[0].contains("-s \"10.1.0.0/16\" -d \"10.2.0.0/16\" -j REJECT"));
        assert!(cmds[1].contains("-s \"10.2.0.0/16\" -d \"10.1.0.0/16\" -j REJECT"));
        // Isolation stays on the legacy backend regardless of the configured one
        assert!(cmds[0].starts_with(fabric_common::shell::IPTABLES_CMD));
    }

    #[tokio::test]
    async fn test_forward_rules_dump() {
        let node = Arc::new(
            FakeNode::new("leaf-1").on_command("-S FORWARD", "-A FORWARD -d 10.1.0.0/16 -j REJECT"),
        );
        let fw = Firewall::new(node, FirewallBackend::Iptables);
        let rules = fw.forward_rules().await.unwrap();
        assert!(rules.contains("REJECT"));
    }
}
