//! Intent-based reconciliation engine for the fabric control plane.
//!
//! Continuously converges the actual state of the network fabric toward
//! the desired state expressed as tenant networks (VPCs), routes, and
//! VRF/VNI bindings:
//!
//! 1. Fetch desired state from a [`store::DesiredStateStore`]
//! 2. Discover actual state from the representative fabric node
//! 3. Diff into prioritized [`types::ReconciliationAction`]s
//! 4. Execute ascending by priority, with per-action retry
//!
//! The `reconcilerd` binary wires this up with a YAML config file and a
//! Prometheus metrics endpoint.

pub mod config;
pub mod engine;
pub mod executor;
pub mod metrics;
pub mod metrics_server;
pub mod planner;
pub mod state;
pub mod store;
pub mod types;

pub use config::{NodeTransport, ReconcilerConfig};
pub use engine::{ReconcileResult, ReconciliationEngine};
pub use executor::ActionExecutor;
pub use metrics::ReconcilerMetrics;
pub use state::{DesiredState, RouteSpec, VpcSpec};
pub use store::{DesiredStateStore, FileStore, MemoryStore};
pub use types::{ActionKind, ReconciliationAction, ResourceKind};
