//! Filesystem artifact store.
//!
//! Layout: `<root>/<name>/<version>/metadata.toml`, with an optional bundled
//! `Pantryfile.toml` next to it. Path sources are read in place.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use pantry_core::artifact::{ArtifactMetadata, CachedArtifact, METADATA_FILE};
use pantry_core::config::StoreConfig;
use pantry_core::constraint::Version;
use pantry_core::manifest::{Manifest, MANIFEST_FILE};
use pantry_core::source::Source;
use pantry_core::store::{ArtifactStore, ManifestReader};
use pantry_util::errors::{PantryError, PantryResult};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the configured `[store] dir`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.resolved_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_dir(&self, name: &str, version: &Version) -> PathBuf {
        self.root.join(name).join(version.to_string())
    }

    /// Write an artifact's metadata into the store, creating directories as needed.
    pub fn put(&self, metadata: &ArtifactMetadata) -> PantryResult<PathBuf> {
        let dir = self.artifact_dir(&metadata.name, &metadata.version);
        pantry_util::fs::ensure_dir(&dir)?;
        let content = metadata
            .to_string_pretty()
            .map_err(|e| PantryError::Metadata {
                message: format!("Failed to serialize {METADATA_FILE}: {e}"),
            })?;
        fs::write(dir.join(METADATA_FILE), content)?;
        tracing::debug!("Stored {} {} at {}", metadata.name, metadata.version, dir.display());
        Ok(dir)
    }

    /// Bundle a manifest with a stored artifact.
    pub fn put_manifest(
        &self,
        name: &str,
        version: &Version,
        manifest: &Manifest,
    ) -> PantryResult<PathBuf> {
        let dir = self.artifact_dir(name, version);
        pantry_util::fs::ensure_dir(&dir)?;
        let content = toml::to_string_pretty(manifest).map_err(|e| PantryError::Manifest {
            message: format!("Failed to serialize {MANIFEST_FILE}: {e}"),
        })?;
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Whether `name` at `version` is materialized in the store.
    pub fn contains(&self, name: &str, version: &Version) -> bool {
        self.artifact_dir(name, version).join(METADATA_FILE).is_file()
    }

    /// Remove stored versions not in `keep`. Returns the number of version
    /// directories removed.
    pub fn prune(&self, keep: &HashSet<(String, Version)>) -> PantryResult<u32> {
        let mut removed = 0u32;
        if !self.root.is_dir() {
            return Ok(removed);
        }
        for name_entry in fs::read_dir(&self.root)?.flatten() {
            let name_dir = name_entry.path();
            if !name_dir.is_dir() {
                continue;
            }
            let name = name_entry.file_name().to_string_lossy().to_string();
            for version_entry in fs::read_dir(&name_dir)?.flatten() {
                let version_dir = version_entry.path();
                let version = version_entry.file_name().to_string_lossy().to_string();
                let Ok(version) = Version::parse(&version) else {
                    continue;
                };
                if version_dir.is_dir() && !keep.contains(&(name.clone(), version)) {
                    fs::remove_dir_all(&version_dir)?;
                    removed += 1;
                }
            }
            if fs::read_dir(&name_dir)?.next().is_none() {
                fs::remove_dir(&name_dir)?;
            }
        }
        Ok(removed)
    }

    fn read_artifact(dir: &Path) -> PantryResult<CachedArtifact> {
        let metadata = ArtifactMetadata::from_dir(dir)?;
        Ok(CachedArtifact::from_metadata(metadata, Some(dir.to_path_buf())))
    }
}

impl ArtifactStore for LocalStore {
    fn is_downloaded(&self, source: &Source) -> bool {
        matches!(self.cached_artifact(source), Ok(Some(_)))
    }

    fn cached_artifact(&self, source: &Source) -> PantryResult<Option<CachedArtifact>> {
        if let Some(path) = source.location().local_path() {
            if !path.join(METADATA_FILE).is_file() {
                return Ok(None);
            }
            return Self::read_artifact(path).map(Some);
        }

        let mut versions = self.versions(source.name())?;
        versions.retain(|a| source.constraint().matches(a.version()));
        Ok(versions.into_iter().max_by(|a, b| a.version().cmp(b.version())))
    }

    fn versions(&self, name: &str) -> PantryResult<Vec<CachedArtifact>> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match Self::read_artifact(&path) {
                Ok(artifact) if artifact.name() == name => found.push(artifact),
                Ok(artifact) => {
                    tracing::warn!(
                        "Skipping {}: declares name '{}'",
                        path.display(),
                        artifact.name()
                    );
                }
                Err(e) => tracing::warn!("Skipping unreadable store entry {}: {e}", path.display()),
            }
        }
        found.sort();
        Ok(found)
    }
}

impl ManifestReader for LocalStore {
    fn nested_sources(&self, artifact: &CachedArtifact) -> PantryResult<Option<Vec<Source>>> {
        let Some(dir) = artifact.path() else {
            return Ok(None);
        };
        let manifest = dir.join(MANIFEST_FILE);
        if !manifest.is_file() {
            return Ok(None);
        }
        tracing::debug!("Reading manifest bundled in {artifact}");
        Manifest::load_sources(&manifest).map(Some)
    }
}
