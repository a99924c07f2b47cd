//! Core provisioner types: claims, storage classes, categories, and volume
//! descriptors.
//!
//! These types form the data model shared by the [`Provisioner`] trait, the
//! transport layer, and the hostpath backend.  They are all
//! [`Serialize`]/[`Deserialize`] so they can be transmitted over QUIC as JSON.
//!
//! [`Provisioner`]: crate::provisioner::Provisioner

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use crate::error::ProvisionerError;

/// Claim label whose value selects the [`Category`].
pub const CATEGORY_LABEL: &str = "app";

/// Annotation carrying the identity of the provisioner that created a volume.
pub const ANN_PROVISIONER_IDENTITY: &str = "hostPathProvisionerIdentity";

/// Annotation carrying the host path backing a volume.
pub const ANN_HOSTPATH: &str = "hostpath";

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Application category of a claim, selecting its base directory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    /// ZooKeeper (`app=zk`).
    Zk,
    /// MongoDB (`app=mongodb`).
    Mongodb,
    /// Elasticsearch (`app=es`).
    Es,
    /// Kafka (`app=kafka`).
    Kafka,
    /// Any other claim, including claims without the label.
    Default,
}

impl Category {
    /// Every category with its own configured directory.
    pub const CONFIGURED: [Category; 4] = [Self::Zk, Self::Mongodb, Self::Es, Self::Kafka];

    /// Map a label value to a category.  Unknown values fall back to
    /// [`Category::Default`].
    pub fn from_label(value: Option<&str>) -> Self {
        match value {
            Some("zk") => Self::Zk,
            Some("mongodb") => Self::Mongodb,
            Some("es") => Self::Es,
            Some("kafka") => Self::Kafka,
            _ => Self::Default,
        }
    }

    /// Resolve the category of a claim from its labels.
    pub fn of_claim(claim: &ClaimContext) -> Self {
        Self::from_label(claim.labels.get(CATEGORY_LABEL).map(String::as_str))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zk => "zk",
            Self::Mongodb => "mongodb",
            Self::Es => "es",
            Self::Kafka => "kafka",
            Self::Default => "default",
        })
    }
}

// ---------------------------------------------------------------------------
// Access mode, reclaim policy, quantity
// ---------------------------------------------------------------------------

/// Describes how a volume may be accessed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessMode {
    /// Single-node read-write.
    ReadWriteOnce,
    /// Multi-node read-only.
    ReadOnlyMany,
    /// Multi-node read-write.
    ReadWriteMany,
    /// Single-pod read-write.
    ReadWriteOncePod,
}

/// What happens to the backing storage when its claim is released.
///
/// Copied from the storage class onto the volume; never interpreted here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReclaimPolicy {
    Retain,
    Delete,
    Recycle,
}

/// A resource quantity such as `"1Gi"`, carried through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Quantity(pub String);

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The claim being provisioned, as seen by the orchestration driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimContext {
    pub namespace: String,
    pub name: String,
    /// Claim labels; [`CATEGORY_LABEL`] selects the base directory.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Requested storage, if the claim asked for any.
    #[serde(default)]
    pub requested_storage: Option<Quantity>,
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
}

/// The storage class the claim refers to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageClassContext {
    pub name: String,
    /// Must be set for provisioning to succeed.
    #[serde(default)]
    pub reclaim_policy: Option<ReclaimPolicy>,
    /// Opaque class parameters; unused by the hostpath backend.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// Request to provision a volume for a claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub claim: ClaimContext,
    pub storage_class: StorageClassContext,
    /// Volume name assigned by the driver, unique cluster-wide.
    pub volume_name: String,
}

// ---------------------------------------------------------------------------
// Volume descriptor
// ---------------------------------------------------------------------------

/// Ownership and location metadata written on provision and read on delete.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeAnnotations {
    #[serde(
        rename = "hostPathProvisionerIdentity",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioner_identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostpath: Option<String>,
}

impl VolumeAnnotations {
    /// The identity annotation, or [`ProvisionerError::MissingMetadata`].
    pub fn provisioner_identity(&self) -> Result<&str, ProvisionerError> {
        required(self.provisioner_identity.as_deref(), ANN_PROVISIONER_IDENTITY)
    }

    /// The host path annotation, or [`ProvisionerError::MissingMetadata`].
    pub fn hostpath(&self) -> Result<&str, ProvisionerError> {
        required(self.hostpath.as_deref(), ANN_HOSTPATH)
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, ProvisionerError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ProvisionerError::MissingMetadata(key.to_owned())),
    }
}

/// A provisioned volume, persisted by the driver and handed back on delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeDescriptor {
    /// The driver-assigned volume name.
    pub name: String,
    /// Host directory backing the volume.
    pub path: PathBuf,
    #[serde(default)]
    pub capacity: Option<Quantity>,
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    pub reclaim_policy: ReclaimPolicy,
    #[serde(default)]
    pub annotations: VolumeAnnotations,
}

// ---------------------------------------------------------------------------
// Plugin info
// ---------------------------------------------------------------------------

/// Information about the provisioner plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Provisioner name, e.g. `"nirmata.io/hostpath"`.
    pub name: String,
    /// Vendor-provided version string.
    pub vendor_version: String,
    /// Identity of the node this instance runs on.
    pub node_id: String,
}
