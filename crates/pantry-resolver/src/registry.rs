//! Every cached artifact known to a resolver, keyed by name and version.

use std::collections::BTreeMap;
use std::sync::Arc;

use pantry_core::artifact::CachedArtifact;
use pantry_core::constraint::Version;

#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, BTreeMap<Version, Arc<CachedArtifact>>>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact. Returns `false` if the same name and version was
    /// already present, in which case the earlier entry is kept.
    pub fn insert(&mut self, artifact: Arc<CachedArtifact>) -> bool {
        let versions = self
            .artifacts
            .entry(artifact.name().to_string())
            .or_default();
        if versions.contains_key(artifact.version()) {
            return false;
        }
        versions.insert(artifact.version().clone(), artifact);
        true
    }

    /// Register an artifact over any entry with the same name and version,
    /// returning the one it displaced.
    pub fn replace(&mut self, artifact: Arc<CachedArtifact>) -> Option<Arc<CachedArtifact>> {
        self.artifacts
            .entry(artifact.name().to_string())
            .or_default()
            .insert(artifact.version().clone(), artifact)
    }

    pub fn get(&self, name: &str, version: &Version) -> Option<&Arc<CachedArtifact>> {
        self.artifacts.get(name)?.get(version)
    }

    /// Registered artifacts of `name`, ascending by version.
    pub fn versions(&self, name: &str) -> impl Iterator<Item = &Arc<CachedArtifact>> {
        self.artifacts.get(name).into_iter().flat_map(|v| v.values())
    }

    pub fn len(&self) -> usize {
        self.artifacts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
