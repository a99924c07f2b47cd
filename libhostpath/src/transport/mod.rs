//! QUIC transport layer for provisioner messages.
//!
//! This module provides [`ProvisionerClient`](client::ProvisionerClient) and
//! [`ProvisionerServer`](server::ProvisionerServer) that exchange
//! [`ProvisionerMessage`](crate::message::ProvisionerMessage) values over QUIC
//! bi-directional streams using `quinn`.

pub mod client;
pub mod server;

/// Upper bound on a single serialized message.
pub(crate) const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;
