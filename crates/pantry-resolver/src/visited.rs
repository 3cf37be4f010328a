use std::collections::HashSet;

/// Artifact names whose bundled manifest has already been expanded.
///
/// Nested manifests may refer back to each other; checking here before
/// descending keeps expansion finite.
#[derive(Debug, Default)]
pub struct ManifestVisits {
    visited: HashSet<String>,
}

impl ManifestVisits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the manifest bundled in `artifact_name` as expanded. Returns
    /// `false` if it already was.
    pub fn visit(&mut self, artifact_name: &str) -> bool {
        self.visited.insert(artifact_name.to_string())
    }

    pub fn contains(&self, artifact_name: &str) -> bool {
        self.visited.contains(artifact_name)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
