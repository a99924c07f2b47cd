//! # libhostpath — hostpath dynamic volume provisioner
//!
//! `libhostpath` creates one host directory per claimed volume and removes it
//! again when the volume is reclaimed.  Watching the cluster, retrying and
//! leader election belong to an external orchestration driver, which reaches
//! the provisioner through the two-operation [`Provisioner`] trait, either
//! in-process or over QUIC (via [`quinn`]) using the [`transport`] module.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Data model: claims, storage classes, categories, volume descriptors. |
//! | [`config`] | [`ProvisionerConfig`] resolved once at startup. |
//! | [`error`] | [`ProvisionerError`] enum covering all failure modes. |
//! | [`message`] | [`ProvisionerMessage`] protocol envelope for QUIC transport. |
//! | [`provisioner`] | [`Provisioner`] trait — provision and delete. |
//! | [`identity`] | [`Identity`] trait — plugin discovery & health. |
//! | [`transport`] | QUIC client/server built on `quinn`. |
//! | [`backend`] | Host directory backend. |

pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod provisioner;
pub mod transport;
pub mod types;

pub use backend::hostpath::{HostPathProvisioner, PROVISIONER_NAME};
pub use config::{CategoryDirs, ProvisionerConfig};
pub use error::ProvisionerError;
pub use identity::Identity;
pub use message::ProvisionerMessage;
pub use provisioner::Provisioner;
pub use types::*;
