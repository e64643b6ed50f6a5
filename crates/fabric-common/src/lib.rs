//! Common infrastructure for the fabric control-plane crates.
//!
//! - [`shell`]: safe shell command execution with proper quoting
//! - [`node`]: the [`NodeClient`] transport trait with local-process and
//!   container-exec backends
//! - [`error`]: the shared error type
//! - [`testing`]: programmable fake node for unit tests
//!
//! # Architecture
//!
//! Every layer above this crate drives fabric nodes exclusively through
//! [`NodeClient`], keeping the reconciliation core decoupled from its
//! transport.

pub mod error;
pub mod node;
pub mod shell;
pub mod testing;

// Re-export commonly used items at crate root
pub use error::{FabricError, FabricResult};
pub use node::{ContainerNode, LocalNode, NodeClient};
