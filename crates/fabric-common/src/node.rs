//! Transport abstraction for executing commands on fabric nodes.
//!
//! The reconciliation core never talks to a transport directly; it goes
//! through [`NodeClient`] so the executor stays unit-testable with a fake
//! and the transport (local process, container exec, SSH, RPC) stays
//! pluggable.

use async_trait::async_trait;

use crate::error::{FabricError, FabricResult};
use crate::shell;

/// A single fabric node the control plane can drive.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// The node name (e.g. "leaf-1"), used for logging and fan-out.
    fn name(&self) -> &str;

    /// Executes a shell command on the node, returning stdout on success.
    async fn execute(&self, cmd: &str) -> FabricResult<String>;

    /// Returns true if the node is currently reachable.
    async fn exists(&self) -> bool;
}

/// Node backend that runs commands in the local process context.
///
/// Used when the control plane runs directly on the node it manages,
/// and by the simulated single-host fabric.
pub struct LocalNode {
    name: String,
}

impl LocalNode {
    /// Creates a local-process node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl NodeClient for LocalNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, cmd: &str) -> FabricResult<String> {
        shell::exec_or_throw(cmd).await
    }

    async fn exists(&self) -> bool {
        true
    }
}

/// Node backend that executes commands inside a named container.
///
/// This is the transport used against the simulated leaf switches, which
/// run as containers named after the node.
pub struct ContainerNode {
    name: String,
}

impl ContainerNode {
    /// Creates a container-exec node. The container is looked up by name
    /// on every call, so a restarted container is picked up transparently.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl NodeClient for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, cmd: &str) -> FabricResult<String> {
        if !self.exists().await {
            return Err(FabricError::node_not_found(&self.name));
        }
        let wrapped = format!(
            "docker exec {} /bin/sh -c {}",
            shell::shellquote(&self.name),
            shell::shellquote(cmd)
        );
        shell::exec_or_throw(&wrapped).await
    }

    async fn exists(&self) -> bool {
        let probe = format!("docker inspect {} >/dev/null 2>&1", shell::shellquote(&self.name));
        matches!(shell::exec(&probe).await, Ok(r) if r.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_node_execute() {
        let node = LocalNode::new("local");
        assert_eq!(node.name(), "local");
        assert!(node.exists().await);

        let out = node.execute("echo up").await.unwrap();
        assert_eq!(out, "up");
    }

    #[tokio::test]
    async fn test_local_node_failure_propagates() {
        let node = LocalNode::new("local");
        let err = node.execute("exit 7").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
