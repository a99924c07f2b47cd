//! Provisioner identity service.
//!
//! Lets a driver discover which provisioner it is talking to and check that
//! it is alive.

use async_trait::async_trait;

use crate::error::ProvisionerError;
use crate::types::PluginInfo;

/// Identity service — plugin discovery and health probing.
#[async_trait]
pub trait Identity: Send + Sync {
    /// Return the provisioner name, version and node identity.
    async fn get_plugin_info(&self) -> Result<PluginInfo, ProvisionerError>;

    /// Liveness probe.  Returns `true` when the provisioner is healthy.
    async fn probe(&self) -> Result<bool, ProvisionerError>;
}
