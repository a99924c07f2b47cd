//! Host directory storage backend.
//!
//! [`HostPathProvisioner`] implements [`Provisioner`] and [`Identity`] by
//! creating one directory per volume on the local filesystem.  The base
//! directory is chosen from the claim's `app` label.
//!
//! # On-disk layout
//!
//! ```text
//! <category base dir>/
//!   <namespace>-<claim name>-<volume name>/   # one directory per volume
//! ```
//!
//! The backend keeps no record of the volumes it created.  Everything needed
//! to delete a volume travels on the descriptor as annotations.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::ProvisionerConfig;
use crate::error::ProvisionerError;
use crate::identity::Identity;
use crate::provisioner::Provisioner;
use crate::types::*;

/// Name this provisioner registers under.
pub const PROVISIONER_NAME: &str = "nirmata.io/hostpath";

/// Separator between the parts of a volume directory name.
const KEY_SEPARATOR: &str = "-";

/// Provisioner that backs every volume with a host directory.
///
/// Stateless apart from its configuration, so `provision` and `delete` can
/// run concurrently from any number of tasks.
#[derive(Debug, Clone)]
pub struct HostPathProvisioner {
    config: ProvisionerConfig,
}

impl HostPathProvisioner {
    /// Create a provisioner, rejecting a configuration with an empty
    /// identity or base directory.
    pub fn new(config: ProvisionerConfig) -> Result<Self, ProvisionerError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Identity written on every volume this instance creates.
    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Compute the directory backing the volume requested by `req`.
    pub fn volume_path(&self, req: &ProvisionRequest) -> PathBuf {
        let category = Category::of_claim(&req.claim);
        self.config.dirs.base_dir(category).join(volume_dir_name(
            &req.claim.namespace,
            &req.claim.name,
            &req.volume_name,
        ))
    }

    async fn create_dir(&self, path: &Path) -> Result<(), ProvisionerError> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.config.dir_mode);
        builder
            .create(path)
            .await
            .map_err(|e| ProvisionerError::filesystem(path, e))
    }
}

/// Build the single path component `<namespace>-<name>-<volume>`.
///
/// Path separators and NUL bytes are replaced so the result can never
/// escape the base directory.
fn volume_dir_name(namespace: &str, name: &str, volume_name: &str) -> String {
    [namespace, name, volume_name]
        .join(KEY_SEPARATOR)
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Whether `path` may be handed to [`remove_path`]: absolute, free of `..`,
/// and naming something below the root.
fn is_deletable(path: &Path) -> bool {
    path.is_absolute()
        && path.components().any(|c| matches!(c, Component::Normal(_)))
        && !path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Remove `path` and everything below it.  A path that is already gone
/// counts as removed.
async fn remove_path(path: &Path) -> Result<(), ProvisionerError> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "path already gone, nothing to delete");
            return Ok(());
        }
        Err(e) => return Err(ProvisionerError::filesystem(path, e)),
    };

    let removed = if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match removed {
        Ok(()) => Ok(()),
        // Lost a race with another remover.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionerError::filesystem(path, e)),
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[async_trait]
impl Identity for HostPathProvisioner {
    async fn get_plugin_info(&self) -> Result<PluginInfo, ProvisionerError> {
        Ok(PluginInfo {
            name: PROVISIONER_NAME.to_owned(),
            vendor_version: env!("CARGO_PKG_VERSION").to_owned(),
            node_id: self.config.identity.clone(),
        })
    }

    async fn probe(&self) -> Result<bool, ProvisionerError> {
        // Base directories are created lazily, so a missing one is fine.  One
        // that exists but is not a directory makes every provision fail.
        for category in Category::CONFIGURED.into_iter().chain([Category::Default]) {
            let base = self.config.dirs.base_dir(category);
            if let Ok(meta) = tokio::fs::metadata(base).await
                && !meta.is_dir()
            {
                debug!(%category, base = %base.display(), "base path is not a directory");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Provisioner
// ---------------------------------------------------------------------------

#[async_trait]
impl Provisioner for HostPathProvisioner {
    #[instrument(skip(self, req), fields(
        namespace = %req.claim.namespace,
        claim = %req.claim.name,
        volume = %req.volume_name,
    ))]
    async fn provision(&self, req: ProvisionRequest) -> Result<VolumeDescriptor, ProvisionerError> {
        if req.volume_name.is_empty() {
            return Err(ProvisionerError::InvalidArgument(
                "volume name must not be empty".into(),
            ));
        }
        let reclaim_policy = req.storage_class.reclaim_policy.ok_or_else(|| {
            ProvisionerError::InvalidArgument(format!(
                "storage class {:?} has no reclaim policy",
                req.storage_class.name
            ))
        })?;

        let path = self.volume_path(&req);
        // Idempotent: an existing directory from an earlier attempt is reused.
        self.create_dir(&path).await?;

        let hostpath = path.to_string_lossy().into_owned();
        let volume = VolumeDescriptor {
            name: req.volume_name,
            path,
            capacity: req.claim.requested_storage,
            access_modes: req.claim.access_modes,
            reclaim_policy,
            annotations: VolumeAnnotations {
                provisioner_identity: Some(self.config.identity.clone()),
                hostpath: Some(hostpath),
            },
        };

        info!(
            volume = %volume.name,
            path = %volume.path.display(),
            "persistent volume provisioned",
        );
        Ok(volume)
    }

    #[instrument(skip(self, volume), fields(volume = %volume.name))]
    async fn delete(&self, volume: &VolumeDescriptor) -> Result<(), ProvisionerError> {
        let owner = volume.annotations.provisioner_identity()?;
        if owner != self.config.identity {
            debug!(%owner, "volume belongs to another provisioner, ignoring");
            return Err(ProvisionerError::NotOwned {
                volume: volume.name.clone(),
                reason: "identity annotation on volume does not match ours".into(),
            });
        }

        // The annotation is authoritative; the claim may no longer exist.
        let hostpath = volume.annotations.hostpath()?;
        let path = Path::new(hostpath);
        if !is_deletable(path) {
            return Err(ProvisionerError::InvalidArgument(format!(
                "refusing to delete {hostpath:?}"
            )));
        }

        remove_path(path).await?;

        info!(path = %path.display(), "persistent volume deleted");
        Ok(())
    }
}
