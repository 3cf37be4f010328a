//! Collaborator interfaces the resolver queries, plus an in-memory store.

use std::collections::BTreeMap;

use pantry_util::errors::PantryResult;

use crate::artifact::CachedArtifact;
use crate::constraint::Version;
use crate::source::Source;

/// Answers "is this artifact materialized" and "what does it declare".
pub trait ArtifactStore {
    /// Whether `source` already has a materialized artifact.
    fn is_downloaded(&self, source: &Source) -> bool;

    /// The materialized artifact for `source`, best matching version first.
    fn cached_artifact(&self, source: &Source) -> PantryResult<Option<CachedArtifact>>;

    /// Every materialized version of `name`, in any order.
    fn versions(&self, name: &str) -> PantryResult<Vec<CachedArtifact>>;
}

/// Reads manifests bundled inside artifacts.
pub trait ManifestReader {
    /// Sources declared by the manifest bundled in `artifact`, or `None` if
    /// the artifact carries no manifest.
    fn nested_sources(&self, artifact: &CachedArtifact) -> PantryResult<Option<Vec<Source>>>;
}

/// A store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: BTreeMap<String, BTreeMap<Version, CachedArtifact>>,
    manifests: BTreeMap<String, Vec<Source>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, replacing any previous one with the same name and version.
    pub fn add(&mut self, artifact: CachedArtifact) -> &mut Self {
        self.artifacts
            .entry(artifact.name().to_string())
            .or_default()
            .insert(artifact.version().clone(), artifact);
        self
    }

    /// Declare the manifest bundled in every version of `artifact_name`.
    pub fn add_manifest(&mut self, artifact_name: &str, sources: Vec<Source>) -> &mut Self {
        self.manifests.insert(artifact_name.to_string(), sources);
        self
    }
}

impl ArtifactStore for MemoryStore {
    fn is_downloaded(&self, source: &Source) -> bool {
        matches!(self.cached_artifact(source), Ok(Some(_)))
    }

    fn cached_artifact(&self, source: &Source) -> PantryResult<Option<CachedArtifact>> {
        let Some(versions) = self.artifacts.get(source.name()) else {
            return Ok(None);
        };
        let found = match source.location().local_path() {
            Some(path) => versions.values().rev().find(|a| a.path() == Some(path)),
            None => versions
                .values()
                .rev()
                .find(|a| source.constraint().matches(a.version())),
        };
        Ok(found.cloned())
    }

    fn versions(&self, name: &str) -> PantryResult<Vec<CachedArtifact>> {
        Ok(self
            .artifacts
            .get(name)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl ManifestReader for MemoryStore {
    fn nested_sources(&self, artifact: &CachedArtifact) -> PantryResult<Option<Vec<Source>>> {
        Ok(self.manifests.get(artifact.name()).cloned())
    }
}
