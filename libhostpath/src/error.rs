//! Provisioner error types.
//!
//! All errors in the `libhostpath` crate are represented by the
//! [`ProvisionerError`] enum, which derives [`thiserror::Error`] and also
//! implements [`Serialize`]/[`Deserialize`] so errors can travel across the
//! QUIC transport layer back to the orchestration driver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for provisioner operations.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ProvisionerError {
    /// A required configuration value was not set at startup.
    #[error("{0} must be set so that this provisioner can start")]
    MissingConfig(String),

    /// A configuration value was set but could not be used.
    #[error("invalid configuration value for {key}: {reason}")]
    InvalidConfig {
        /// Name of the configuration value.
        key: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Creating or removing a volume directory failed.
    #[error("filesystem error at {path}: {reason}")]
    Filesystem {
        /// Host path the operation was applied to.
        path: String,
        /// The OS error, as reported.
        reason: String,
    },

    /// A volume descriptor lacks a required annotation.
    #[error("{0} annotation not found on volume")]
    MissingMetadata(String),

    /// The volume was provisioned by another instance.
    ///
    /// Callers should treat this as a no-op for this instance rather than a
    /// failure; see [`ProvisionerError::is_ignorable`].
    #[error("volume {volume} ignored: {reason}")]
    NotOwned {
        /// Name of the volume.
        volume: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The caller supplied an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A QUIC / transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// An unclassified internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProvisionerError {
    /// Whether the orchestration driver may drop this error instead of
    /// retrying: the volume belongs to another provisioner instance.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::NotOwned { .. })
    }

    /// Whether the process must not start because of this error.
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, Self::MissingConfig(_) | Self::InvalidConfig { .. })
    }

    /// Create a [`ProvisionerError::Filesystem`] for `path` from an I/O error.
    pub fn filesystem(path: impl AsRef<std::path::Path>, e: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        }
    }

    /// Create a [`ProvisionerError::Transport`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn transport<E: std::fmt::Display>(e: E) -> Self {
        Self::Transport(e.to_string())
    }

    /// Create a [`ProvisionerError::Internal`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProvisionerError::MissingMetadata("hostpath".into());
        assert_eq!(err.to_string(), "hostpath annotation not found on volume");

        let err = ProvisionerError::MissingConfig("NODE_NAME".into());
        assert_eq!(
            err.to_string(),
            "NODE_NAME must be set so that this provisioner can start"
        );
    }

    #[test]
    fn only_not_owned_is_ignorable() {
        let ignored = ProvisionerError::NotOwned {
            volume: "pv-1".into(),
            reason: "identity annotation on volume does not match ours".into(),
        };
        assert!(ignored.is_ignorable());
        assert!(!ProvisionerError::MissingMetadata("hostpath".into()).is_ignorable());
        assert!(
            !ProvisionerError::Filesystem {
                path: "/data".into(),
                reason: "permission denied".into(),
            }
            .is_ignorable()
        );
    }

    #[test]
    fn filesystem_keeps_os_error_text() {
        let io = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let text = io.to_string();
        let err = ProvisionerError::filesystem("/var/data/zk", io);
        assert_eq!(
            err,
            ProvisionerError::Filesystem {
                path: "/var/data/zk".into(),
                reason: text,
            }
        );
    }

    #[test]
    fn not_owned_survives_serde() {
        let err = ProvisionerError::NotOwned {
            volume: "pv-1".into(),
            reason: "not ours".into(),
        };
        let json = serde_json::to_string(&err).expect("serialize");
        let de: ProvisionerError = serde_json::from_str(&json).expect("deserialize");
        assert!(de.is_ignorable());
    }
}
