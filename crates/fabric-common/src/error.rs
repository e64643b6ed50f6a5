//! Error types shared by the fabric control-plane crates.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use std::io;
use thiserror::Error;

/// Result type alias for fabric operations.
pub type FabricResult<T> = Result<T, FabricError>;

/// Errors that can occur while driving fabric nodes.
#[derive(Debug, Error)]
pub enum FabricError {
    /// Failed to spawn a shell command.
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to spawn.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned a non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Fabric node is unreachable or unknown to the transport.
    #[error("Fabric node '{node}' not found or unreachable")]
    NodeNotFound {
        /// The node name.
        node: String,
    },

    /// A primitive the node does not support. Callers that have a
    /// functional fallback treat this as non-fatal.
    #[error("Operation '{operation}' not supported on node '{node}'")]
    NotSupported {
        /// The primitive that was rejected.
        operation: String,
        /// The node that rejected it.
        node: String,
    },

    /// Structured device output could not be parsed.
    #[error("Failed to parse {context}: {message}")]
    Parse {
        /// What was being parsed (e.g. "ip link listing").
        context: String,
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A bounded operation ran out of time.
    #[error("Operation timed out: {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl FabricError {
    /// Creates a node-not-found error.
    pub fn node_not_found(node: impl Into<String>) -> Self {
        Self::NodeNotFound { node: node.into() }
    }

    /// Creates a not-supported error.
    pub fn not_supported(operation: impl Into<String>, node: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
            node: node.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FabricError::CommandFailed { .. }
                | FabricError::NodeNotFound { .. }
                | FabricError::Timeout { .. }
        )
    }

    /// Returns true if the failure was the kernel reporting that the
    /// object already exists. Creates are idempotent, so callers map
    /// this to success.
    pub fn is_already_exists(&self) -> bool {
        match self {
            FabricError::CommandFailed { output, .. } => {
                let out = output.to_ascii_lowercase();
                out.contains("file exists") || out.contains("already exists")
            }
            _ => false,
        }
    }

    /// Returns true if the node rejected the primitive as unsupported.
    pub fn is_not_supported(&self) -> bool {
        match self {
            FabricError::NotSupported { .. } => true,
            FabricError::CommandFailed { output, .. } => output
                .to_ascii_lowercase()
                .contains("not supported"),
            _ => false,
        }
    }
}
