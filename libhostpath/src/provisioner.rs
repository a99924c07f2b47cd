//! Provisioner callback trait.
//!
//! This is the whole surface the orchestration driver sees: it watches claims,
//! calls [`Provisioner::provision`] when one needs a volume, persists the
//! returned descriptor, and hands it back to [`Provisioner::delete`] when the
//! volume is reclaimed.  Retries, backoff and leader election stay on the
//! driver side.

use async_trait::async_trait;

use crate::error::ProvisionerError;
use crate::types::{ProvisionRequest, VolumeDescriptor};

/// Dynamic volume provisioner.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Create the storage asset for a claim and describe it.
    ///
    /// Calling this again with the same request must succeed and yield the
    /// same descriptor.
    async fn provision(&self, req: ProvisionRequest) -> Result<VolumeDescriptor, ProvisionerError>;

    /// Remove the storage asset described by `volume`.
    ///
    /// Returns [`ProvisionerError::NotOwned`] when another instance created
    /// the volume.  Deleting an asset that is already gone succeeds.
    async fn delete(&self, volume: &VolumeDescriptor) -> Result<(), ProvisionerError>;
}
