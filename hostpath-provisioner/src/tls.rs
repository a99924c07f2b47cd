//! TLS material for the QUIC endpoint.

use anyhow::Context;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

/// Generate a self-signed certificate for `node_name` (and `localhost`) and
/// build the server config around it.
pub fn self_signed_server_config(node_name: &str) -> anyhow::Result<rustls::ServerConfig> {
    let cert = rcgen::generate_simple_self_signed(vec![
        node_name.to_owned(),
        "localhost".to_owned(),
    ])
    .context("failed to generate self-signed certificate")?;
    let cert_der = CertificateDer::from(cert.serialize_der()?);
    let key = PrivatePkcs8KeyDer::from(cert.serialize_private_key_der());

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], PrivateKeyDer::Pkcs8(key))
        .context("failed to build TLS server config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_config_for_node() {
        assert!(self_signed_server_config("node-a").is_ok());
    }
}
