use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;

#[derive(Parser)]
#[command(
    name = "hostpath-provisioner",
    version,
    about = "Hostpath dynamic volume provisioner"
)]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve provision and delete requests over QUIC
    Start {
        #[arg(short, long, env = "PROVISIONER_LISTEN", default_value = "0.0.0.0:7443")]
        listen: SocketAddr,
    },
    /// Print the configuration resolved from the environment and exit
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
