//! Error types for configuration generation and onboarding.

use thiserror::Error;

/// Result type alias for confgen operations.
pub type ConfgenResult<T> = Result<T, ConfgenError>;

/// Errors from the config generator and the ZTP state machine.
#[derive(Debug, Error)]
pub enum ConfgenError {
    /// The MAC address is not in the inventory.
    #[error("Device '{mac}' not in inventory")]
    DeviceNotFound {
        /// Hardware identity
        mac: String,
    },

    /// The topology has no switch entry for the device's hostname.
    #[error("No topology data for switch '{hostname}'")]
    SwitchNotFound {
        /// Derived hostname
        hostname: String,
    },

    /// The device is not in the status the operation requires.
    #[error("Device '{mac}' is '{status}', expected '{expected}'")]
    InvalidState {
        /// Hardware identity
        mac: String,
        /// Current status
        status: String,
        /// Status the operation requires
        expected: String,
    },
}

impl ConfgenError {
    /// Creates a device-not-found error.
    pub fn device_not_found(mac: impl Into<String>) -> Self {
        Self::DeviceNotFound { mac: mac.into() }
    }

    /// Creates a switch-not-found error.
    pub fn switch_not_found(hostname: impl Into<String>) -> Self {
        Self::SwitchNotFound {
            hostname: hostname.into(),
        }
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(
        mac: impl Into<String>,
        status: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            mac: mac.into(),
            status: status.into(),
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfgenError::device_not_found("00:11:22:33:44:55");
        assert_eq!(err.to_string(), "Device '00:11:22:33:44:55' not in inventory");

        let err = ConfgenError::InvalidState {
            mac: "00:11:22:33:44:55".to_string(),
            status: "discovered".to_string(),
            expected: "assigned".to_string(),
        };
        assert!(err.to_string().contains("expected 'assigned'"));
    }
}
