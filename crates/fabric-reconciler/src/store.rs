//! Desired-state sources.
//!
//! Any backing store must expose exactly the shape the engine consumes:
//! VPC records `{id, cidr, vni, vrf_name, status}` and route records
//! `{id, vpc_id, destination, next_hop, next_hop_type}`. The CRUD API
//! and its relational schema live outside this crate.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use fabric_common::{FabricError, FabricResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::{DesiredState, RouteSpec, VpcSpec};

/// Read-only desired-state source, queried once per cycle.
#[async_trait]
pub trait DesiredStateStore: Send + Sync {
    /// Fetches a fresh desired-state snapshot.
    async fn fetch(&self) -> FabricResult<DesiredState>;
}

/// On-disk document shape for [`FileStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesiredDocument {
    /// Desired VPC records
    #[serde(default)]
    pub vpcs: Vec<VpcSpec>,
    /// Desired route records
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

/// Desired state read from a JSON document on every fetch, so edits are
/// picked up on the next cycle without a restart.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store reading the given JSON file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DesiredStateStore for FileStore {
    async fn fetch(&self) -> FabricResult<DesiredState> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FabricError::invalid_config(
                "desired_state_file",
                format!("cannot read {}: {}", self.path.display(), e),
            )
        })?;
        let doc: DesiredDocument = serde_json::from_str(&text)
            .map_err(|e| FabricError::parse("desired-state document", e.to_string()))?;
        debug!(
            vpcs = doc.vpcs.len(),
            routes = doc.routes.len(),
            "Fetched desired state"
        );
        Ok(DesiredState::from_records(doc.vpcs, doc.routes))
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<DesiredDocument>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored VPC records.
    pub fn set_vpcs(&self, vpcs: Vec<VpcSpec>) {
        self.inner.lock().expect("store lock poisoned").vpcs = vpcs;
    }

    /// Replaces the stored route records.
    pub fn set_routes(&self, routes: Vec<RouteSpec>) {
        self.inner.lock().expect("store lock poisoned").routes = routes;
    }

    /// Removes all records.
    pub fn clear(&self) {
        *self.inner.lock().expect("store lock poisoned") = DesiredDocument::default();
    }
}

#[async_trait]
impl DesiredStateStore for MemoryStore {
    async fn fetch(&self) -> FabricResult<DesiredState> {
        let doc = self.inner.lock().expect("store lock poisoned").clone();
        Ok(DesiredState::from_records(doc.vpcs, doc.routes))
    }
}
