mod cli;
mod tls;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, LogFormat};
use libhostpath::transport::server::ProvisionerServer;
use libhostpath::{Category, HostPathProvisioner, PROVISIONER_NAME, ProvisionerConfig};
use nix::sys::stat::{Mode, umask};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let config =
        ProvisionerConfig::from_env().context("failed to load provisioner configuration")?;

    match cli.command {
        Commands::Start { listen } => start(config, listen).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn start(config: ProvisionerConfig, listen: SocketAddr) -> anyhow::Result<()> {
    // Directories get exactly the configured mode.
    umask(Mode::empty());

    info!(
        provisioner = PROVISIONER_NAME,
        identity = %config.identity,
        mode = %format!("{:o}", config.dir_mode),
        "starting provisioner",
    );
    for category in Category::CONFIGURED.into_iter().chain([Category::Default]) {
        info!(
            %category,
            dir = %config.dirs.base_dir(category).display(),
            "base directory",
        );
    }

    let tls = tls::self_signed_server_config(&config.identity)?;
    let provisioner =
        Arc::new(HostPathProvisioner::new(config).context("invalid provisioner configuration")?);
    let server =
        ProvisionerServer::new(listen, tls, provisioner).context("failed to start QUIC server")?;

    server
        .serve(shutdown_signal())
        .await
        .context("QUIC server stopped")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
