//! QUIC server that runs on each node and answers provisioner requests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use quinn::crypto::rustls::QuicServerConfig;
use tracing::{debug, error, info, instrument, warn};

use super::MAX_MESSAGE_BYTES;
use crate::error::ProvisionerError;
use crate::identity::Identity;
use crate::message::ProvisionerMessage;
use crate::provisioner::Provisioner;

/// Serves one backend over a QUIC endpoint.  Every bi-stream carries one
/// request and its response.
pub struct ProvisionerServer<T> {
    endpoint: quinn::Endpoint,
    handler: Arc<T>,
}

impl<T> ProvisionerServer<T>
where
    T: Provisioner + Identity + 'static,
{
    pub fn new(
        addr: SocketAddr,
        tls_config: rustls::ServerConfig,
        handler: Arc<T>,
    ) -> Result<Self, ProvisionerError> {
        let crypto = QuicServerConfig::try_from(tls_config)
            .map_err(|e| ProvisionerError::Transport(format!("invalid TLS config: {e}")))?;
        let endpoint = quinn::Endpoint::server(
            quinn::ServerConfig::with_crypto(Arc::new(crypto)),
            addr,
        )
        .map_err(ProvisionerError::transport)?;
        info!(%addr, "provisioner QUIC server listening");
        Ok(Self { endpoint, handler })
    }

    /// Accept connections until `shutdown` completes or the endpoint is
    /// closed, then wait for open connections to drain.
    pub async fn serve<F>(&self, shutdown: F) -> Result<(), ProvisionerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let incoming = tokio::select! {
                incoming = self.endpoint.accept() => incoming,
                () = &mut shutdown => {
                    self.close();
                    break;
                }
            };
            let Some(incoming) = incoming else {
                break;
            };
            tokio::spawn(serve_connection(incoming, Arc::clone(&self.handler)));
        }

        self.endpoint.wait_idle().await;
        info!("provisioner QUIC server stopped");
        Ok(())
    }

    pub fn endpoint(&self) -> &quinn::Endpoint {
        &self.endpoint
    }

    /// Refuse new connections and close the open ones.
    pub fn close(&self) {
        self.endpoint
            .close(quinn::VarInt::from_u32(0), b"server shutdown");
    }
}

async fn serve_connection<T>(incoming: quinn::Incoming, handler: Arc<T>)
where
    T: Provisioner + Identity + 'static,
{
    let conn = match incoming.await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "handshake failed");
            return;
        }
    };
    let remote = conn.remote_address();
    debug!(%remote, "connection accepted");

    loop {
        match conn.accept_bi().await {
            Ok((send, recv)) => {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    if let Err(e) = answer(send, recv, handler.as_ref()).await {
                        error!(%remote, error = %e, "failed to answer request");
                    }
                });
            }
            Err(
                quinn::ConnectionError::ApplicationClosed(_)
                | quinn::ConnectionError::LocallyClosed,
            ) => {
                debug!(%remote, "connection closed");
                return;
            }
            Err(e) => {
                warn!(%remote, error = %e, "connection lost");
                return;
            }
        }
    }
}

#[instrument(skip_all)]
async fn answer<T>(
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    handler: &T,
) -> Result<(), ProvisionerError>
where
    T: Provisioner + Identity,
{
    let buf = recv
        .read_to_end(MAX_MESSAGE_BYTES)
        .await
        .map_err(ProvisionerError::transport)?;

    let response = match decode_request(&buf) {
        Ok(request) => dispatch(handler, request).await,
        Err(e) => ProvisionerMessage::Error(e),
    };

    let payload = serde_json::to_vec(&response).map_err(ProvisionerError::internal)?;
    send.write_all(&payload)
        .await
        .map_err(ProvisionerError::transport)?;
    send.finish().map_err(ProvisionerError::transport)?;
    Ok(())
}

fn decode_request(buf: &[u8]) -> Result<ProvisionerMessage, ProvisionerError> {
    let request: ProvisionerMessage = serde_json::from_slice(buf)
        .map_err(|e| ProvisionerError::InvalidArgument(format!("malformed request: {e}")))?;
    debug!(%request, "request received");
    Ok(request)
}

async fn dispatch<T>(handler: &T, request: ProvisionerMessage) -> ProvisionerMessage
where
    T: Provisioner + Identity,
{
    let result = match request {
        ProvisionerMessage::Provision(req) => {
            handler.provision(req).await.map(ProvisionerMessage::Provisioned)
        }
        ProvisionerMessage::Delete(volume) => {
            let deleted = handler.delete(&volume).await;
            match &deleted {
                Err(e) if e.is_ignorable() => {
                    debug!(volume = %volume.name, "delete ignored: {e}")
                }
                Err(e) => warn!(volume = %volume.name, error = %e, "delete failed"),
                Ok(()) => {}
            }
            deleted.map(|()| ProvisionerMessage::Ok)
        }
        ProvisionerMessage::Probe => handler.probe().await.map(ProvisionerMessage::ProbeResult),
        ProvisionerMessage::GetPluginInfo => handler
            .get_plugin_info()
            .await
            .map(ProvisionerMessage::PluginInfoResponse),
        other => {
            warn!(msg = %other, "response variant received as request");
            Err(ProvisionerError::InvalidArgument(format!(
                "unexpected message: {other}"
            )))
        }
    };
    result.unwrap_or_else(ProvisionerMessage::Error)
}
