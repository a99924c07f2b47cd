//! Provisioner protocol messages transmitted over QUIC.
//!
//! [`ProvisionerMessage`] is the top-level envelope for all request and
//! response variants exchanged between the orchestration driver (client side)
//! and the provisioner (server side) via QUIC bi-directional streams.

use serde::{Deserialize, Serialize};

use crate::error::ProvisionerError;
use crate::types::*;

/// Top-level message envelope for the provisioner protocol.
///
/// Each QUIC bi-stream carries exactly one request followed by one response.
/// The client sends a *request* variant and the server replies with the
/// corresponding *response* variant (or [`ProvisionerMessage::Error`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProvisionerMessage {
    // ----- Requests --------------------------------------------------------
    /// Provision a volume for a claim.
    Provision(ProvisionRequest),
    /// Delete a previously provisioned volume.
    Delete(VolumeDescriptor),
    /// Health probe.
    Probe,
    /// Query plugin info.
    GetPluginInfo,

    // ----- Responses -------------------------------------------------------
    /// A volume was provisioned.
    Provisioned(VolumeDescriptor),
    /// Plugin information.
    PluginInfoResponse(PluginInfo),
    /// Generic success acknowledgement (no payload).
    Ok,
    /// Probe result.
    ProbeResult(bool),
    /// An error occurred.
    Error(ProvisionerError),
}

impl std::fmt::Display for ProvisionerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provision(req) => write!(
                f,
                "Provision({}/{}, volume={})",
                req.claim.namespace, req.claim.name, req.volume_name
            ),
            Self::Delete(vol) => write!(f, "Delete({})", vol.name),
            Self::Probe => f.write_str("Probe"),
            Self::GetPluginInfo => f.write_str("GetPluginInfo"),
            Self::Provisioned(vol) => write!(f, "Provisioned({})", vol.name),
            Self::PluginInfoResponse(info) => write!(f, "PluginInfo(name={})", info.name),
            Self::Ok => f.write_str("Ok"),
            Self::ProbeResult(ok) => write!(f, "ProbeResult({})", ok),
            Self::Error(e) => write!(f, "Error({})", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_owned_error_keeps_its_kind() {
        let msg = ProvisionerMessage::Error(ProvisionerError::NotOwned {
            volume: "pv-1".into(),
            reason: "identity annotation on volume does not match ours".into(),
        });
        let json = serde_json::to_string(&msg).expect("serialize");
        let de: ProvisionerMessage = serde_json::from_str(&json).expect("deserialize");
        assert!(matches!(de, ProvisionerMessage::Error(e) if e.is_ignorable()));
    }

    #[test]
    fn display_formatting() {
        let msg = ProvisionerMessage::Provision(ProvisionRequest {
            claim: ClaimContext {
                namespace: "default".into(),
                name: "pvc1".into(),
                ..Default::default()
            },
            volume_name: "pv-1".into(),
            ..Default::default()
        });
        assert_eq!(msg.to_string(), "Provision(default/pvc1, volume=pv-1)");
        assert_eq!(ProvisionerMessage::Ok.to_string(), "Ok");
        assert_eq!(ProvisionerMessage::Probe.to_string(), "Probe");
    }
}
