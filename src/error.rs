//! Error types for wsl-mount-findfs
//!
//! Provides comprehensive error handling using thiserror for ergonomic error definitions.

use thiserror::Error;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, FindfsError>;

/// Main error type for the resolver
#[derive(Error, Debug)]
pub enum FindfsError {
    /// GUID text is not in the canonical 8-4-4-4-12 form
    #[error("{0}: invalid GUID")]
    InvalidGuid(String),

    /// Tag prefix is neither PTUUID= nor PARTUUID=
    #[error(
        "{0}: <Tag> must be from the GPT partition table (i.e. PARTUUID|PTUUID=...); \
         other blkid tags (e.g. UUID=, LABEL=) are only parsed by linux \
         and cannot be used to locate the device to attach to wsl"
    )]
    UnsupportedTag(String),

    /// An OS query failed
    #[error("{operation}: {details}")]
    Os { operation: String, details: String },

    /// A variable-sized query kept asking for more room than allowed
    #[error("{operation}: reply exceeds {ceiling} bytes")]
    BufferCeiling { operation: String, ceiling: usize },

    /// Layout reply is shorter than its own partition count implies
    #[error("drive layout announces {expected} bytes but only {returned} were returned")]
    TruncatedLayout { expected: usize, returned: usize },

    /// Layout reply could not be decoded
    #[error("malformed drive layout: {0}")]
    MalformedLayout(String),

    /// The device enumeration primitive is not available
    #[error("device enumeration unavailable: {0}")]
    EnumerationUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FindfsError {
    /// Create an OS error for the named operation
    pub fn os<S: Into<String>, D: Into<String>>(operation: S, details: D) -> Self {
        Self::Os {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Errors that only concern one device; the scan carries on past them
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Os { .. }
                | Self::BufferCeiling { .. }
                | Self::TruncatedLayout { .. }
                | Self::MalformedLayout(_)
        )
    }

    /// Errors caused by what the user typed rather than by the system
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGuid(_) | Self::UnsupportedTag(_) | Self::ConfigError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_error_carries_operation_and_reason() {
        let err = FindfsError::os("IOCTL_DISK_GET_DRIVE_LAYOUT_EX", "The device is not ready.");
        assert_eq!(
            err.to_string(),
            "IOCTL_DISK_GET_DRIVE_LAYOUT_EX: The device is not ready."
        );
        assert!(err.is_skippable());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_input_errors() {
        let err = FindfsError::InvalidGuid("PARTUUID=xyz".to_string());
        assert!(err.is_input_error());
        assert!(!err.is_skippable());
        assert_eq!(err.to_string(), "PARTUUID=xyz: invalid GUID");

        let err = FindfsError::UnsupportedTag("LABEL=foo".to_string());
        assert!(err.is_input_error());
        assert!(err.to_string().starts_with("LABEL=foo"));
    }

    #[test]
    fn test_enumeration_unavailable_is_fatal() {
        let err = FindfsError::EnumerationUnavailable("SetupDiGetClassDevs".to_string());
        assert!(!err.is_skippable());
        assert!(!err.is_input_error());
    }
}
