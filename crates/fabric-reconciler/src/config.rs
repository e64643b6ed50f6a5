//! Daemon configuration, loaded from a YAML file with CLI overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fabric_common::{ContainerNode, FabricError, FabricResult, LocalNode, NodeClient};
use serde::{Deserialize, Serialize};

fn default_interval_secs() -> u64 {
    10
}

fn default_action_timeout_secs() -> u64 {
    30
}

fn default_fabric_nodes() -> Vec<String> {
    vec!["leaf-1".to_string(), "leaf-2".to_string(), "leaf-3".to_string()]
}

fn default_desired_state_file() -> PathBuf {
    PathBuf::from("/etc/fabricd/desired-state.json")
}

/// How to reach fabric nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTransport {
    /// Run commands in the local process context
    Local,
    /// Run commands inside containers named after the node
    #[default]
    Container,
}

/// Reconciler daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Seconds between reconciliation cycles
    pub interval_secs: u64,
    /// Fabric nodes driven by the executor; the first is the
    /// representative node discovery consults
    pub fabric_nodes: Vec<String>,
    /// Transport used to reach nodes
    pub node_transport: NodeTransport,
    /// JSON document holding the desired state
    pub desired_state_file: PathBuf,
    /// Bind address for the metrics endpoint; disabled when absent
    pub metrics_listen: Option<String>,
    /// Upper bound on a single action's execution, so one stuck node
    /// cannot wedge a cycle
    pub action_timeout_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fabric_nodes: default_fabric_nodes(),
            node_transport: NodeTransport::default(),
            desired_state_file: default_desired_state_file(),
            metrics_listen: None,
            action_timeout_secs: default_action_timeout_secs(),
        }
    }
}

impl ReconcilerConfig {
    /// Loads and validates a YAML config file.
    pub fn load(path: &Path) -> FabricResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FabricError::invalid_config("config", format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&text)
            .map_err(|e| FabricError::invalid_config("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants the engine relies on.
    pub fn validate(&self) -> FabricResult<()> {
        if self.interval_secs == 0 {
            return Err(FabricError::invalid_config(
                "interval_secs",
                "must be greater than zero",
            ));
        }
        if self.fabric_nodes.is_empty() {
            return Err(FabricError::invalid_config(
                "fabric_nodes",
                "at least one fabric node is required",
            ));
        }
        if self.action_timeout_secs == 0 {
            return Err(FabricError::invalid_config(
                "action_timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Interval between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-action execution bound.
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    /// Builds node clients for the configured transport.
    pub fn build_nodes(&self) -> Vec<Arc<dyn NodeClient>> {
        self.fabric_nodes
            .iter()
            .map(|name| -> Arc<dyn NodeClient> {
                match self.node_transport {
                    NodeTransport::Local => Arc::new(LocalNode::new(name)),
                    NodeTransport::Container => Arc::new(ContainerNode::new(name)),
                }
            })
            .collect()
    }
}
