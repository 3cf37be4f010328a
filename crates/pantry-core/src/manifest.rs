//! `Pantryfile.toml` parsing.
//!
//! ```toml
//! [sources]
//! nginx = "~> 2.0"
//! app = { path = "../app" }
//! db = { version = ">= 1.0", git = "https://example.test/db.git", branch = "main" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pantry_util::errors::{PantryError, PantryResult};
use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::source::{Source, SourceLocation};

/// File name of a manifest, both at the project root and bundled in artifacts.
pub const MANIFEST_FILE: &str = "Pantryfile.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceEntry>,
}

/// A source declaration: either a bare constraint or a detailed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Short(Constraint),
    Detailed(DetailedSource),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedSource {
    #[serde(default)]
    pub version: Option<Constraint>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn from_path(path: &Path) -> PantryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PantryError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> PantryResult<Self> {
        toml::from_str(content).map_err(|e| PantryError::Manifest {
            message: format!("Failed to parse {MANIFEST_FILE}: {e}"),
        })
    }

    /// Find the nearest manifest at or above `start`.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        pantry_util::fs::find_ancestor_with(start, MANIFEST_FILE).map(|dir| dir.join(MANIFEST_FILE))
    }

    /// Parse a manifest file and turn it into sources relative to its directory.
    pub fn load_sources(path: &Path) -> PantryResult<Vec<Source>> {
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::from_path(path)?.sources(base_dir)
    }

    /// Convert every entry into a [`Source`], ordered by name.
    ///
    /// Relative `path` entries are resolved against `base_dir`.
    pub fn sources(&self, base_dir: &Path) -> PantryResult<Vec<Source>> {
        self.sources
            .iter()
            .map(|(name, entry)| entry.to_source(name, base_dir))
            .collect()
    }
}

impl SourceEntry {
    fn to_source(&self, name: &str, base_dir: &Path) -> PantryResult<Source> {
        match self {
            Self::Short(constraint) => Ok(Source::new(name, constraint.clone())),
            Self::Detailed(detail) => {
                let constraint = detail.version.clone().unwrap_or_default();
                let location = detail.location(name, base_dir)?;
                Ok(Source::new(name, constraint).with_location(location))
            }
        }
    }
}

impl DetailedSource {
    fn location(&self, name: &str, base_dir: &Path) -> PantryResult<SourceLocation> {
        let declared = [
            self.path.is_some(),
            self.git.is_some(),
            self.registry.is_some(),
            self.store.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if declared > 1 {
            return Err(PantryError::Manifest {
                message: format!(
                    "source '{name}' declares more than one of `path`, `git`, `registry`, `store`"
                ),
            });
        }

        let git_refs: Vec<&String> = [&self.rev, &self.branch, &self.tag]
            .into_iter()
            .flatten()
            .collect();
        if git_refs.len() > 1 {
            return Err(PantryError::Manifest {
                message: format!("source '{name}' declares more than one of `rev`, `branch`, `tag`"),
            });
        }
        if !git_refs.is_empty() && self.git.is_none() {
            return Err(PantryError::Manifest {
                message: format!("source '{name}' sets a git reference without `git`"),
            });
        }

        if let Some(path) = &self.path {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            return Ok(SourceLocation::Path { path });
        }
        if let Some(uri) = &self.git {
            return Ok(SourceLocation::Git {
                uri: uri.clone(),
                rev: git_refs.first().map(|r| r.to_string()),
            });
        }
        if let Some(url) = &self.store {
            return Ok(SourceLocation::Store { url: url.clone() });
        }
        Ok(SourceLocation::Registry {
            url: self.registry.clone(),
        })
    }
}
