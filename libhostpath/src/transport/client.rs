//! QUIC client used by the orchestration driver to call the provisioner.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use quinn::crypto::rustls::QuicClientConfig;
use tracing::{debug, instrument};

use super::MAX_MESSAGE_BYTES;
use crate::error::ProvisionerError;
use crate::message::ProvisionerMessage;
use crate::types::{PluginInfo, ProvisionRequest, VolumeDescriptor};

/// A lightweight client that sends [`ProvisionerMessage`] requests over a
/// single QUIC connection and returns the server's response.
pub struct ProvisionerClient {
    connection: quinn::Connection,
}

impl ProvisionerClient {
    /// Establish a new QUIC connection to the provisioner at `addr`.
    ///
    /// * `addr` — socket address of the remote provisioner
    /// * `server_name` — TLS SNI name that must match a SAN in the server's
    ///   certificate (the node name or `localhost`)
    /// * `tls_config` — client TLS configuration trusting the server
    ///   certificate
    pub async fn connect(
        addr: SocketAddr,
        server_name: &str,
        tls_config: rustls::ClientConfig,
    ) -> Result<Self, ProvisionerError> {
        let quic_client_config = QuicClientConfig::try_from(tls_config)
            .map_err(|e| ProvisionerError::Transport(format!("invalid TLS config: {e}")))?;
        let client_config = quinn::ClientConfig::new(Arc::new(quic_client_config));

        let bind = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
        let mut endpoint = quinn::Endpoint::client(bind).map_err(ProvisionerError::transport)?;
        endpoint.set_default_client_config(client_config);

        let connection = endpoint
            .connect(addr, server_name)
            .map_err(ProvisionerError::transport)?
            .await
            .map_err(ProvisionerError::transport)?;

        debug!(%addr, %server_name, "provisioner QUIC connection established");
        Ok(Self { connection })
    }

    /// Send a request and wait for the corresponding response.
    ///
    /// Each call opens a new bi-directional QUIC stream, writes the
    /// JSON-serialized request, finishes the send side, then reads the
    /// full response and deserializes it.
    #[instrument(skip(self), fields(msg = %msg))]
    pub async fn request(
        &self,
        msg: &ProvisionerMessage,
    ) -> Result<ProvisionerMessage, ProvisionerError> {
        let (mut send, mut recv) = self
            .connection
            .open_bi()
            .await
            .map_err(ProvisionerError::transport)?;

        let payload = serde_json::to_vec(msg).map_err(ProvisionerError::internal)?;
        send.write_all(&payload)
            .await
            .map_err(ProvisionerError::transport)?;
        send.finish().map_err(ProvisionerError::transport)?;

        let buf = recv
            .read_to_end(MAX_MESSAGE_BYTES)
            .await
            .map_err(ProvisionerError::transport)?;

        let response: ProvisionerMessage =
            serde_json::from_slice(&buf).map_err(ProvisionerError::transport)?;
        debug!(%response, "provisioner response received");
        Ok(response)
    }

    /// Provision a volume.  Errors reported by the provisioner come back as
    /// `Err` with their original kind.
    pub async fn provision(
        &self,
        req: ProvisionRequest,
    ) -> Result<VolumeDescriptor, ProvisionerError> {
        match self.request(&ProvisionerMessage::Provision(req)).await? {
            ProvisionerMessage::Provisioned(volume) => Ok(volume),
            other => Err(unexpected(other)),
        }
    }

    /// Delete a volume.  A foreign volume yields an error for which
    /// [`ProvisionerError::is_ignorable`] is true.
    pub async fn delete(&self, volume: VolumeDescriptor) -> Result<(), ProvisionerError> {
        match self.request(&ProvisionerMessage::Delete(volume)).await? {
            ProvisionerMessage::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn probe(&self) -> Result<bool, ProvisionerError> {
        match self.request(&ProvisionerMessage::Probe).await? {
            ProvisionerMessage::ProbeResult(ok) => Ok(ok),
            other => Err(unexpected(other)),
        }
    }

    pub async fn plugin_info(&self) -> Result<PluginInfo, ProvisionerError> {
        match self.request(&ProvisionerMessage::GetPluginInfo).await? {
            ProvisionerMessage::PluginInfoResponse(info) => Ok(info),
            other => Err(unexpected(other)),
        }
    }

    /// Close the underlying QUIC connection gracefully.
    pub fn close(&self) {
        self.connection
            .close(quinn::VarInt::from_u32(0), b"client shutdown");
    }
}

/// Turn a response that does not answer the request into an error.
fn unexpected(response: ProvisionerMessage) -> ProvisionerError {
    match response {
        ProvisionerMessage::Error(e) => e,
        other => ProvisionerError::Transport(format!("unexpected response: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_keeps_kind() {
        let err = unexpected(ProvisionerMessage::Error(ProvisionerError::MissingMetadata(
            "hostpath".into(),
        )));
        assert_eq!(err, ProvisionerError::MissingMetadata("hostpath".into()));
    }

    #[test]
    fn mismatched_response_is_transport_error() {
        let err = unexpected(ProvisionerMessage::ProbeResult(true));
        assert!(matches!(err, ProvisionerError::Transport(_)));
    }
}
