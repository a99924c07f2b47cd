//! Provisioner configuration.
//!
//! Resolved once at startup and handed to the backend by value; nothing in
//! the provisioning path reads the environment afterwards.
//!
//! Environment variables:
//! - `NODE_NAME`: identity of this provisioner instance. Required.
//! - `ZK_PV_DIR`, `MONGODB_PV_DIR`, `ES_PV_DIR`, `KAFKA_PV_DIR`: base directory
//!   for each application category. All required.
//! - `DEFAULT_PV_DIR`: base directory for claims without a known `app` label.
//!   Defaults to `/tmp/nirmata-hostpath-provisioner`.
//! - `PV_DIR_MODE`: octal permission mode for created directories.
//!   Defaults to `0755`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProvisionerError;
use crate::types::Category;

pub const ENV_NODE_NAME: &str = "NODE_NAME";
pub const ENV_ZK_PV_DIR: &str = "ZK_PV_DIR";
pub const ENV_MONGODB_PV_DIR: &str = "MONGODB_PV_DIR";
pub const ENV_ES_PV_DIR: &str = "ES_PV_DIR";
pub const ENV_KAFKA_PV_DIR: &str = "KAFKA_PV_DIR";
pub const ENV_DEFAULT_PV_DIR: &str = "DEFAULT_PV_DIR";
pub const ENV_PV_DIR_MODE: &str = "PV_DIR_MODE";

/// Fallback base directory for uncategorized claims.
pub const DEFAULT_PV_DIR: &str = "/tmp/nirmata-hostpath-provisioner";

/// Owner-writable, group/other-readable.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

const MAX_DIR_MODE: u32 = 0o7777;

/// Base directory for every [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDirs {
    pub zk: PathBuf,
    pub mongodb: PathBuf,
    pub es: PathBuf,
    pub kafka: PathBuf,
    pub default: PathBuf,
}

impl CategoryDirs {
    pub fn base_dir(&self, category: Category) -> &Path {
        match category {
            Category::Zk => &self.zk,
            Category::Mongodb => &self.mongodb,
            Category::Es => &self.es,
            Category::Kafka => &self.kafka,
            Category::Default => &self.default,
        }
    }
}

/// Immutable configuration of a provisioner instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Identity written on every volume this instance creates, normally the
    /// node name.
    pub identity: String,
    pub dirs: CategoryDirs,
    /// Permission mode for newly created directories.
    pub dir_mode: u32,
}

impl ProvisionerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ProvisionerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a key lookup.  Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProvisionerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ProvisionerError::MissingConfig(key.into()));

        let identity = require(ENV_NODE_NAME)?;

        let dir = |key: &str| require(key).map(PathBuf::from);
        let (zk, mongodb, es, kafka) = (
            dir(ENV_ZK_PV_DIR)?,
            dir(ENV_MONGODB_PV_DIR)?,
            dir(ENV_ES_PV_DIR)?,
            dir(ENV_KAFKA_PV_DIR)?,
        );

        let default = get(ENV_DEFAULT_PV_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PV_DIR));

        let dir_mode = match get(ENV_PV_DIR_MODE) {
            Some(raw) => parse_mode(&raw)?,
            None => DEFAULT_DIR_MODE,
        };

        Ok(Self {
            identity,
            dirs: CategoryDirs {
                zk,
                mongodb,
                es,
                kafka,
                default,
            },
            dir_mode,
        })
    }

    /// Check the invariants [`Self::from_lookup`] establishes, for
    /// configurations assembled by hand.
    pub fn validate(&self) -> Result<(), ProvisionerError> {
        if self.identity.is_empty() {
            return Err(ProvisionerError::MissingConfig(ENV_NODE_NAME.into()));
        }
        let dirs = [
            (ENV_ZK_PV_DIR, &self.dirs.zk),
            (ENV_MONGODB_PV_DIR, &self.dirs.mongodb),
            (ENV_ES_PV_DIR, &self.dirs.es),
            (ENV_KAFKA_PV_DIR, &self.dirs.kafka),
            (ENV_DEFAULT_PV_DIR, &self.dirs.default),
        ];
        if let Some((key, _)) = dirs.iter().find(|(_, dir)| dir.as_os_str().is_empty()) {
            return Err(ProvisionerError::MissingConfig((*key).into()));
        }
        if self.dir_mode > MAX_DIR_MODE {
            return Err(ProvisionerError::InvalidConfig {
                key: ENV_PV_DIR_MODE.into(),
                reason: format!("{:o} is out of range", self.dir_mode),
            });
        }
        Ok(())
    }
}

/// Parse an octal permission mode such as `0755` or `0o777`.
fn parse_mode(raw: &str) -> Result<u32, ProvisionerError> {
    let digits = raw.strip_prefix("0o").unwrap_or(raw);
    let invalid = |reason: String| ProvisionerError::InvalidConfig {
        key: ENV_PV_DIR_MODE.into(),
        reason,
    };
    let mode = u32::from_str_radix(digits, 8).map_err(|e| invalid(format!("{raw:?}: {e}")))?;
    if mode > MAX_DIR_MODE {
        return Err(invalid(format!("{raw:?} is out of range")));
    }
    Ok(mode)
}
