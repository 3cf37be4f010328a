//! Top-level dependency declarations and where they come from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::CachedArtifact;
use crate::constraint::{Constraint, Version};

/// Where a source's artifact is obtained from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceLocation {
    /// A directory on the local filesystem, used in place.
    Path { path: PathBuf },
    /// A git repository, optionally pinned to a branch, tag or revision.
    Git {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rev: Option<String>,
    },
    /// A package registry; `None` means the caller's default registry.
    Registry {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// An artifact store server.
    Store { url: String },
}

/// A cached artifact that does not belong to the location it was requested from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected artifact at {expected}, found {found}")]
pub struct LocationMismatch {
    pub expected: String,
    pub found: String,
}

impl SourceLocation {
    /// Check that a cached artifact really came from this location.
    ///
    /// Path sources are read in place, so the artifact must live at the path.
    /// Remote locations accept whatever the store materialized.
    pub fn validate_cached(&self, artifact: &CachedArtifact) -> Result<(), LocationMismatch> {
        match self {
            Self::Path { path } => match artifact.path() {
                Some(found) if found == path.as_path() => Ok(()),
                found => Err(LocationMismatch {
                    expected: path.display().to_string(),
                    found: found
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "no local path".to_string()),
                }),
            },
            Self::Git { .. } | Self::Registry { .. } | Self::Store { .. } => Ok(()),
        }
    }

    /// The local path of a path location.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Path { path } => Some(path),
            _ => None,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::Registry { url: None }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { path } => write!(f, "path: {}", path.display()),
            Self::Git { uri, rev: Some(rev) } => write!(f, "git: {uri} ({rev})"),
            Self::Git { uri, rev: None } => write!(f, "git: {uri}"),
            Self::Registry { url: Some(url) } => write!(f, "registry: {url}"),
            Self::Registry { url: None } => f.write_str("registry: default"),
            Self::Store { url } => write!(f, "store: {url}"),
        }
    }
}

/// A user-declared dependency: a name, a constraint, and a location.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    constraint: Constraint,
    location: SourceLocation,
    cached: Option<Arc<CachedArtifact>>,
}

impl Source {
    pub fn new(name: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            constraint,
            location: SourceLocation::default(),
            cached: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// Attach the materialized artifact for this source.
    pub fn with_cached(mut self, artifact: impl Into<Arc<CachedArtifact>>) -> Self {
        self.cached = Some(artifact.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn is_downloaded(&self) -> bool {
        self.cached.is_some()
    }

    pub fn cached_artifact(&self) -> Option<&Arc<CachedArtifact>> {
        self.cached.as_ref()
    }

    /// Version of the materialized artifact, once there is one.
    pub fn resolved_version(&self) -> Option<&Version> {
        self.cached.as_deref().map(CachedArtifact::version)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.constraint, self.location)
    }
}
