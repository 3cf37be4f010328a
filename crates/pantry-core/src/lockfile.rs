use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use pantry_util::errors::{PantryError, PantryResult};
use serde::{Deserialize, Serialize};

use crate::artifact::CachedArtifact;
use crate::constraint::{Constraint, Version};
use crate::source::{Source, SourceLocation};

/// File name of the lockfile written next to a manifest.
pub const LOCKFILE_NAME: &str = "Pantry.lock";

/// Deterministic record of a resolution: the declared sources and the exact
/// artifact versions they resolved to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub source: Vec<LockedSource>,
    #[serde(default)]
    pub artifact: Vec<LockedArtifact>,
}

/// A top-level source as it was declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedSource {
    pub name: String,
    pub constraint: Constraint,
    pub location: SourceLocation,
}

/// A resolved artifact with the demands it declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedArtifact {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Constraint>,
}

impl Lockfile {
    /// Build a lockfile from registered sources and a resolved artifact set.
    pub fn from_resolution<'a>(
        sources: impl IntoIterator<Item = &'a Source>,
        artifacts: &[Arc<CachedArtifact>],
    ) -> Self {
        let mut source: Vec<LockedSource> = sources
            .into_iter()
            .map(|s| LockedSource {
                name: s.name().to_string(),
                constraint: s.constraint().clone(),
                location: s.location().clone(),
            })
            .collect();
        source.sort_by(|a, b| a.name.cmp(&b.name));

        let mut artifact: Vec<LockedArtifact> = artifacts
            .iter()
            .map(|a| LockedArtifact {
                name: a.name().to_string(),
                version: a.version().clone(),
                dependencies: a.dependencies().clone(),
            })
            .collect();
        artifact.sort_by(|a, b| (&a.name, &a.version).cmp(&(&b.name, &b.version)));

        Self { source, artifact }
    }

    /// Load and parse a `Pantry.lock` file from the given path.
    pub fn from_path(path: &Path) -> PantryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PantryError::Lockfile {
            message: format!("Failed to read lockfile: {e}"),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> PantryResult<Self> {
        toml::from_str(content).map_err(|e| PantryError::Lockfile {
            message: format!("Failed to parse lockfile: {e}"),
        })
    }

    /// Serialize the lockfile to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The locked version of an artifact, if it is part of the resolution.
    pub fn locked_version(&self, name: &str) -> Option<&Version> {
        self.artifact
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.version)
    }
}
