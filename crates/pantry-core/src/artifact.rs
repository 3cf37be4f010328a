//! Materialized artifacts and the metadata they declare.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use pantry_util::errors::{PantryError, PantryResult};
use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, Version};

/// File name of the descriptor every materialized artifact carries.
pub const METADATA_FILE: &str = "metadata.toml";

/// Raw descriptor of an artifact as written in its `metadata.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Constraint>,
    /// Optional dependencies; treated as demands just like `dependencies`.
    #[serde(default)]
    pub recommendations: BTreeMap<String, Constraint>,
}

impl ArtifactMetadata {
    pub fn parse_toml(content: &str) -> PantryResult<Self> {
        let metadata: Self = toml::from_str(content).map_err(|e| PantryError::Metadata {
            message: format!("Failed to parse {METADATA_FILE}: {e}"),
        })?;
        if metadata.name.trim().is_empty() {
            return Err(PantryError::Metadata {
                message: "artifact name must not be empty".to_string(),
            });
        }
        Ok(metadata)
    }

    /// Read the descriptor from a materialized artifact directory.
    pub fn from_dir(dir: &Path) -> PantryResult<Self> {
        let path = dir.join(METADATA_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| PantryError::Metadata {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// An artifact that is available locally, with its merged demand set.
///
/// Immutable once built; shared behind `Arc` between sources, the registry
/// and resolution results. Identity and ordering are `(name, version, path)`.
#[derive(Debug, Clone)]
pub struct CachedArtifact {
    name: String,
    version: Version,
    dependencies: BTreeMap<String, Constraint>,
    path: Option<PathBuf>,
}

impl CachedArtifact {
    pub fn new(
        name: impl Into<String>,
        version: Version,
        dependencies: BTreeMap<String, Constraint>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies,
            path: None,
        }
    }

    /// Build from metadata, merging recommendations into the dependency set.
    /// A required dependency wins over a recommendation of the same name.
    pub fn from_metadata(metadata: ArtifactMetadata, path: Option<PathBuf>) -> Self {
        let mut dependencies = metadata.recommendations;
        dependencies.extend(metadata.dependencies);
        Self {
            name: metadata.name,
            version: metadata.version,
            dependencies,
            path,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn dependencies(&self) -> &BTreeMap<String, Constraint> {
        &self.dependencies
    }

    /// Directory the artifact was materialized into, if it lives on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl PartialEq for CachedArtifact {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CachedArtifact {}

impl Ord for CachedArtifact {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.name, &self.version)
            .cmp(&(&other.name, &other.version))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for CachedArtifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CachedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.version)
    }
}
