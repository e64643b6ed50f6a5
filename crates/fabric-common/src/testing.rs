//! Test doubles shared across the workspace.
//!
//! [`FakeNode`] captures every command it is asked to run and can be
//! programmed with canned outputs and failures, so executor and discovery
//! logic is testable without touching the host network stack.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{FabricError, FabricResult};
use crate::node::NodeClient;

/// A programmable response rule matched by command substring.
struct Rule {
    needle: String,
    response: Response,
    /// Remaining times the rule fires; `None` means always.
    remaining: Option<u32>,
}

enum Response {
    Output(String),
    Fail(String),
    NotSupported,
}

/// In-memory [`NodeClient`] for tests.
pub struct FakeNode {
    name: String,
    reachable: bool,
    commands: Mutex<Vec<String>>,
    rules: Mutex<Vec<Rule>>,
}

impl FakeNode {
    /// Creates a reachable fake node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reachable: true,
            commands: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Creates an unreachable fake node.
    pub fn unreachable(name: impl Into<String>) -> Self {
        let mut node = Self::new(name);
        node.reachable = false;
        node
    }

    /// Returns stdout `output` for any command containing `needle`.
    pub fn on_command(self, needle: impl Into<String>, output: impl Into<String>) -> Self {
        self.push_rule(needle, Response::Output(output.into()), None);
        self
    }

    /// Fails any command containing `needle` with the given output.
    pub fn fail_on(self, needle: impl Into<String>, output: impl Into<String>) -> Self {
        self.push_rule(needle, Response::Fail(output.into()), None);
        self
    }

    /// Fails the first `times` commands containing `needle`, then stops
    /// matching. Used for retry tests.
    pub fn fail_times(self, needle: impl Into<String>, output: impl Into<String>, times: u32) -> Self {
        self.push_rule(needle, Response::Fail(output.into()), Some(times));
        self
    }

    /// Rejects any command containing `needle` as an unsupported primitive.
    pub fn not_supported_on(self, needle: impl Into<String>) -> Self {
        self.push_rule(needle, Response::NotSupported, None);
        self
    }

    fn push_rule(&self, needle: impl Into<String>, response: Response, remaining: Option<u32>) {
        self.rules
            .lock()
            .expect("rules lock poisoned")
            .push(Rule {
                needle: needle.into(),
                response,
                remaining,
            });
    }

    /// All commands executed so far, in order.
    pub fn captured_commands(&self) -> Vec<String> {
        self.commands.lock().expect("commands lock poisoned").clone()
    }

    /// Number of captured commands containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.captured_commands()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }
}

#[async_trait]
impl NodeClient for FakeNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, cmd: &str) -> FabricResult<String> {
        if !self.reachable {
            return Err(FabricError::node_not_found(&self.name));
        }

        self.commands
            .lock()
            .expect("commands lock poisoned")
            .push(cmd.to_string());

        let mut rules = self.rules.lock().expect("rules lock poisoned");
        for rule in rules.iter_mut() {
            if !cmd.contains(&rule.needle) {
                continue;
            }
            if let Some(remaining) = rule.remaining.as_mut() {
                if *remaining == 0 {
                    continue;
                }
                *remaining -= 1;
            }
            return match &rule.response {
                Response::Output(out) => Ok(out.clone()),
                Response::Fail(out) => Err(FabricError::CommandFailed {
                    command: cmd.to_string(),
                    exit_code: 1,
                    output: out.clone(),
                }),
                Response::NotSupported => {
                    Err(FabricError::not_supported(cmd.to_string(), &self.name))
                }
            };
        }

        Ok(String::new())
    }

    async fn exists(&self) -> bool {
        self.reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_node_captures_commands() {
        let node = FakeNode::new("leaf-1");
        node.execute("ip link show").await.unwrap();
        node.execute("iptables -S FORWARD").await.unwrap();

        assert_eq!(node.captured_commands().len(), 2);
        assert_eq!(node.count_matching("iptables"), 1);
    }

    #[tokio::test]
    async fn test_fake_node_canned_output() {
        let node = FakeNode::new("leaf-1").on_command("link show", "[]");
        let out = node.execute("ip -d -j link show").await.unwrap();
        assert_eq!(out, "[]");
    }

    #[tokio::test]
    async fn test_fake_node_fail_times() {
        let node = FakeNode::new("leaf-1").fail_times("vxlan", "boom", 2);

        assert!(node.execute("ip link add vxlan1003").await.is_err());
        assert!(node.execute("ip link add vxlan1003").await.is_err());
        assert!(node.execute("ip link add vxlan1003").await.is_ok());
    }

    #[tokio::test]
    async fn test_fake_node_unreachable() {
        let node = FakeNode::unreachable("leaf-9");
        assert!(!node.exists().await);
        let err = node.execute("ip link show").await.unwrap_err();
        assert!(matches!(err, FabricError::NodeNotFound { .. }));
        assert!(node.captured_commands().is_empty());
    }

    #[tokio::test]
    async fn test_fake_node_not_supported() {
        let node = FakeNode::new("leaf-1").not_supported_on("type vrf");
        let err = node.execute("ip link add Vrf1 type vrf table 1003").await.unwrap_err();
        assert!(err.is_not_supported());
    }
}
