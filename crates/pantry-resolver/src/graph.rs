//! Demand graph over versioned artifacts.
//!
//! Nodes are `(name, version)` pairs. Each node carries outgoing demands: a
//! dependency name plus the constraint its version must meet. The graph only
//! accumulates demands; choosing versions is the solver's job.

use std::collections::BTreeMap;
use std::fmt;

use pantry_core::constraint::{Constraint, Version};

/// Identity of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactId {
    pub name: String,
    pub version: Version,
}

impl ArtifactId {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.version)
    }
}

/// "Some version of `name` matching `constraint`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    pub name: String,
    pub constraint: Constraint,
}

impl Demand {
    pub fn new(name: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.constraint)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactNode {
    id: ArtifactId,
    demands: Vec<Demand>,
}

impl ArtifactNode {
    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    /// Record a demand. Demands are additive; an identical one is kept once.
    pub fn add_demand(&mut self, name: &str, constraint: Constraint) -> &mut Self {
        let demand = Demand::new(name, constraint);
        if !self.demands.contains(&demand) {
            self.demands.push(demand);
        }
        self
    }

    pub fn clear_demands(&mut self) -> &mut Self {
        self.demands.clear();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, BTreeMap<Version, ArtifactNode>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node for `name` at `version`, creating it on first reference.
    pub fn artifact(&mut self, name: &str, version: Version) -> &mut ArtifactNode {
        self.nodes
            .entry(name.to_string())
            .or_default()
            .entry(version.clone())
            .or_insert_with(|| ArtifactNode {
                id: ArtifactId::new(name, version),
                demands: Vec::new(),
            })
    }

    /// Record that `from` requires some version of `name` matching `constraint`.
    pub fn add_demand(&mut self, from: &ArtifactId, name: &str, constraint: Constraint) {
        self.artifact(&from.name, from.version.clone())
            .add_demand(name, constraint);
    }

    pub fn get(&self, name: &str, version: &Version) -> Option<&ArtifactNode> {
        self.nodes.get(name)?.get(version)
    }

    pub fn contains(&self, name: &str, version: &Version) -> bool {
        self.get(name, version).is_some()
    }

    /// Known versions of `name`, ascending.
    pub fn versions(&self, name: &str) -> Vec<&Version> {
        self.nodes
            .get(name)
            .map(|versions| versions.keys().collect())
            .unwrap_or_default()
    }

    /// Versions of `name` meeting every constraint, highest first.
    pub fn satisfying<'c>(
        &self,
        name: &str,
        constraints: impl IntoIterator<Item = &'c Constraint> + Clone,
    ) -> Vec<&Version> {
        let Some(versions) = self.nodes.get(name) else {
            return Vec::new();
        };
        versions
            .keys()
            .rev()
            .filter(|v| constraints.clone().into_iter().all(|c| c.matches(v)))
            .collect()
    }

    /// Number of `(name, version)` nodes.
    pub fn len(&self) -> usize {
        self.nodes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
