use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use libhostpath::transport::client::ProvisionerClient;
use libhostpath::transport::server::ProvisionerServer;
use libhostpath::*;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

fn tls_pair() -> (rustls::ServerConfig, rustls::ClientConfig) {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_der = CertificateDer::from(cert.serialize_der().unwrap());
    let key = PrivatePkcs8KeyDer::from(cert.serialize_private_key_der());

    let server = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der.clone()], PrivateKeyDer::Pkcs8(key))
        .unwrap();

    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert_der).unwrap();
    let client = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    (server, client)
}

fn config(root: &Path, identity: &str) -> ProvisionerConfig {
    ProvisionerConfig {
        identity: identity.to_owned(),
        dirs: CategoryDirs {
            zk: root.join("zk"),
            mongodb: root.join("mongodb"),
            es: root.join("es"),
            kafka: root.join("kafka"),
            default: root.join("fallback"),
        },
        dir_mode: 0o755,
    }
}

async fn start(root: &Path, identity: &str) -> ProvisionerClient {
    let (server_tls, client_tls) = tls_pair();
    let backend = Arc::new(HostPathProvisioner::new(config(root, identity)).unwrap());
    let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = ProvisionerServer::new(bind, server_tls, backend).unwrap();
    let addr = server.endpoint().local_addr().unwrap();
    tokio::spawn(async move { server.serve(std::future::pending()).await });

    ProvisionerClient::connect(addr, "localhost", client_tls)
        .await
        .unwrap()
}

fn zk_claim(volume: &str) -> ProvisionRequest {
    ProvisionRequest {
        claim: ClaimContext {
            namespace: "default".into(),
            name: "pvc1".into(),
            labels: BTreeMap::from([(CATEGORY_LABEL.to_owned(), "zk".to_owned())]),
            requested_storage: Some("1Gi".into()),
            access_modes: vec![AccessMode::ReadWriteOnce],
        },
        storage_class: StorageClassContext {
            name: "hostpath".into(),
            reclaim_policy: Some(ReclaimPolicy::Delete),
            ..Default::default()
        },
        volume_name: volume.into(),
    }
}

#[tokio::test]
async fn provision_and_delete_over_quic() {
    let tmp = tempfile::tempdir().unwrap();
    let client = start(tmp.path(), "node-a").await;

    assert!(client.probe().await.unwrap());
    let info = client.plugin_info().await.unwrap();
    assert_eq!(info.name, PROVISIONER_NAME);
    assert_eq!(info.node_id, "node-a");

    let volume = client.provision(zk_claim("pv-1")).await.unwrap();
    let expected = tmp.path().join("zk").join("default-pvc1-pv-1");
    assert_eq!(volume.path, expected);
    assert!(expected.is_dir());
    assert_eq!(volume.annotations.provisioner_identity().unwrap(), "node-a");

    client.delete(volume.clone()).await.unwrap();
    assert!(!expected.exists());
    client.delete(volume).await.unwrap();

    client.close();
}

#[tokio::test]
async fn foreign_volume_is_ignorable_over_quic() {
    let tmp = tempfile::tempdir().unwrap();
    let client_a = start(tmp.path(), "node-a").await;
    let client_b = start(tmp.path(), "node-b").await;

    let volume = client_a.provision(zk_claim("pv-2")).await.unwrap();

    let err = client_b.delete(volume.clone()).await.unwrap_err();
    assert!(err.is_ignorable());
    assert!(volume.path.is_dir());

    let mut stripped = volume.clone();
    stripped.annotations.hostpath = None;
    let err = client_a.delete(stripped).await.unwrap_err();
    assert_eq!(err, ProvisionerError::MissingMetadata(ANN_HOSTPATH.into()));
    assert!(volume.path.is_dir());
}

#[tokio::test]
async fn response_variant_is_rejected_as_request() {
    let tmp = tempfile::tempdir().unwrap();
    let client = start(tmp.path(), "node-a").await;

    let response = client.request(&ProvisionerMessage::Ok).await.unwrap();
    assert!(matches!(
        response,
        ProvisionerMessage::Error(ProvisionerError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn serve_returns_after_shutdown_signal() {
    let tmp = tempfile::tempdir().unwrap();
    let (server_tls, client_tls) = tls_pair();
    let backend = Arc::new(HostPathProvisioner::new(config(tmp.path(), "node-a")).unwrap());
    let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = ProvisionerServer::new(bind, server_tls, backend).unwrap();
    let addr = server.endpoint().local_addr().unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let serving = tokio::spawn(async move {
        server
            .serve(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let client = ProvisionerClient::connect(addr, "localhost", client_tls)
        .await
        .unwrap();
    assert!(client.probe().await.unwrap());

    stop_tx.send(()).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(10), serving)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    assert!(client.probe().await.is_err());
}
