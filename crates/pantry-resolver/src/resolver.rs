//! Source registration, transitive expansion and resolution.
//!
//! Registering a source materializes its artifact through the store, adds it
//! to the registry and the demand graph, then (optionally) pulls every stored
//! version of each transitive dependency name into the graph, breadth-first.
//! Manifests bundled inside source artifacts are expanded into further
//! sources when enabled, with a visit set bounding circular references.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use pantry_core::artifact::CachedArtifact;
use pantry_core::config::ResolverConfig;
use pantry_core::constraint::Version;
use pantry_core::lockfile::Lockfile;
use pantry_core::source::Source;
use pantry_core::store::{ArtifactStore, ManifestReader};

use crate::error::{ResolveError, ResolveResult};
use crate::graph::{ArtifactId, Demand, DependencyGraph};
use crate::registry::ArtifactRegistry;
use crate::solver::Solver;
use crate::visited::ManifestVisits;

pub struct Resolver<'a> {
    store: &'a dyn ArtifactStore,
    manifests: Option<&'a dyn ManifestReader>,
    config: ResolverConfig,
    sources: BTreeMap<String, Source>,
    registry: ArtifactRegistry,
    graph: DependencyGraph,
    /// Dependency names whose stored versions are already in the graph.
    expanded: BTreeSet<String>,
    /// Shared by every `add_source` call, so a manifest reached again through
    /// a later registration is not expanded twice.
    visited: ManifestVisits,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn ArtifactStore) -> Self {
        Self {
            store,
            manifests: None,
            config: ResolverConfig::default(),
            sources: BTreeMap::new(),
            registry: ArtifactRegistry::new(),
            graph: DependencyGraph::new(),
            expanded: BTreeSet::new(),
            visited: ManifestVisits::new(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Reader for manifests bundled inside artifacts. Only consulted when
    /// `nested-manifests` is enabled.
    pub fn with_manifest_reader(mut self, reader: &'a dyn ManifestReader) -> Self {
        self.manifests = Some(reader);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Register a source and, if `include_dependencies`, everything it pulls in.
    ///
    /// Fails without touching any state if a source of the same name exists
    /// or the source's artifact can't be materialized.
    pub fn add_source(&mut self, source: Source, include_dependencies: bool) -> ResolveResult<()> {
        if self.sources.contains_key(source.name()) {
            return Err(ResolveError::DuplicateSourceDefined {
                name: source.name().to_string(),
            });
        }

        let source = self.materialize(source)?;
        let Some(artifact) = source.cached_artifact().cloned() else {
            return Err(ResolveError::NotDownloaded {
                name: source.name().to_string(),
            });
        };
        tracing::debug!("Registering source {source} at {}", artifact.version());

        self.register_source_artifact(Arc::clone(&artifact), include_dependencies);
        self.sources.insert(source.name().to_string(), source);

        if include_dependencies {
            self.expand_dependencies(&artifact)?;
            self.expand_nested_manifest(&artifact)?;
        }
        Ok(())
    }

    pub fn get_source(&self, name: &str) -> ResolveResult<&Source> {
        self.sources
            .get(name)
            .ok_or_else(|| ResolveError::SourceNotFound {
                name: name.to_string(),
            })
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Registered sources, ordered by name.
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// Resolve the named sources (every registered source if `None`) to the
    /// full set of artifacts they need, ordered by name.
    pub fn resolve(&self, names: Option<&[&str]>) -> ResolveResult<Vec<Arc<CachedArtifact>>> {
        let roots = match names {
            Some(names) => names
                .iter()
                .map(|name| self.get_source(name))
                .collect::<ResolveResult<Vec<_>>>()?,
            None => self.sources.values().collect(),
        };
        let demands: Vec<Demand> = roots
            .iter()
            .map(|s| Demand::new(s.name(), s.constraint().clone()))
            .collect();

        // A registered source stands for exactly the artifact it materialized.
        let pins: BTreeMap<String, Version> = self
            .sources
            .values()
            .filter_map(|s| Some((s.name().to_string(), s.resolved_version()?.clone())))
            .collect();

        let assignment = Solver::new(&self.graph)
            .with_pins(pins)
            .with_max_steps(self.config.solver.max_steps)
            .solve(&demands)?;

        let artifacts = assignment
            .iter()
            .map(|(name, version)| self.artifact_for(name, version))
            .collect::<ResolveResult<Vec<_>>>()?;

        tracing::info!(
            "Resolved {} artifacts for {} sources",
            artifacts.len(),
            demands.len()
        );
        Ok(artifacts)
    }

    /// Record a resolution against the registered sources.
    pub fn lockfile(&self, artifacts: &[Arc<CachedArtifact>]) -> Lockfile {
        Lockfile::from_resolution(self.sources.values(), artifacts)
    }

    fn materialize(&self, source: Source) -> ResolveResult<Source> {
        let artifact = match source.cached_artifact() {
            Some(artifact) => Arc::clone(artifact),
            None => {
                if !self.store.is_downloaded(&source) {
                    return Err(ResolveError::NotDownloaded {
                        name: source.name().to_string(),
                    });
                }
                let cached = self.store.cached_artifact(&source)?.ok_or_else(|| {
                    ResolveError::NotDownloaded {
                        name: source.name().to_string(),
                    }
                })?;
                Arc::new(cached)
            }
        };

        let invalid = |reason: String| ResolveError::InvalidArtifact {
            name: source.name().to_string(),
            reason,
        };
        if artifact.name() != source.name() {
            return Err(invalid(format!("artifact is named '{}'", artifact.name())));
        }
        source
            .location()
            .validate_cached(&artifact)
            .map_err(|e| invalid(e.to_string()))?;
        if !source.constraint().matches(artifact.version()) {
            return Err(invalid(format!(
                "version {} does not satisfy {}",
                artifact.version(),
                source.constraint()
            )));
        }

        Ok(source.with_cached(artifact))
    }

    /// Make a source's artifact the one registered for its name and version,
    /// displacing any stored copy pulled in by earlier expansion. Its demands
    /// are recorded only when dependencies are included.
    fn register_source_artifact(&mut self, artifact: Arc<CachedArtifact>, include_demands: bool) {
        if let Some(previous) = self.registry.replace(Arc::clone(&artifact)) {
            tracing::debug!("Source artifact replaces expanded {previous}");
        }
        let node = self
            .graph
            .artifact(artifact.name(), artifact.version().clone());
        node.clear_demands();
        if include_demands {
            for (name, constraint) in artifact.dependencies() {
                node.add_demand(name, constraint.clone());
            }
        }
    }

    /// Put a stored artifact in the registry and give it a graph node with its
    /// demands. An artifact already registered for that version is kept.
    fn add_artifact(&mut self, artifact: Arc<CachedArtifact>) {
        let id = ArtifactId::new(artifact.name(), artifact.version().clone());
        if !self.registry.insert(Arc::clone(&artifact)) {
            tracing::trace!("{id} already registered");
            return;
        }
        let node = self.graph.artifact(&id.name, id.version.clone());
        for (name, constraint) in artifact.dependencies() {
            node.add_demand(name, constraint.clone());
        }
    }

    /// Pull every stored version of each transitive dependency of `root` into
    /// the graph, breadth-first. Each name is expanded once per resolver.
    fn expand_dependencies(&mut self, root: &CachedArtifact) -> ResolveResult<()> {
        let mut queue: VecDeque<String> = root.dependencies().keys().cloned().collect();

        while let Some(name) = queue.pop_front() {
            if !self.expanded.insert(name.clone()) {
                continue;
            }
            let mut versions = self.store.versions(&name)?;
            versions.sort();
            tracing::debug!("Expanding {name}: {} stored versions", versions.len());

            for artifact in versions {
                if artifact.name() != name {
                    tracing::warn!(
                        "Store returned {} while listing {name}; skipping",
                        artifact.name()
                    );
                    continue;
                }
                queue.extend(
                    artifact
                        .dependencies()
                        .keys()
                        .filter(|dep| !self.expanded.contains(*dep))
                        .cloned(),
                );
                self.add_artifact(Arc::new(artifact));
            }
        }
        Ok(())
    }

    /// Register the sources of the manifest bundled in `artifact`, if any.
    fn expand_nested_manifest(&mut self, artifact: &CachedArtifact) -> ResolveResult<()> {
        if !self.config.nested_manifests {
            return Ok(());
        }
        let Some(reader) = self.manifests else {
            return Ok(());
        };
        if !self.visited.visit(artifact.name()) {
            tracing::debug!("Manifest of {} already expanded", artifact.name());
            return Ok(());
        }
        let Some(nested) = reader.nested_sources(artifact)? else {
            return Ok(());
        };

        tracing::debug!(
            "Expanding manifest bundled in {} ({} sources)",
            artifact.name(),
            nested.len()
        );
        for source in nested {
            if self.has_source(source.name()) {
                tracing::debug!("Skipping nested source {}: already registered", source.name());
                continue;
            }
            self.add_source(source, true)?;
        }
        Ok(())
    }

    fn artifact_for(&self, name: &str, version: &Version) -> ResolveResult<Arc<CachedArtifact>> {
        let from_source = self
            .sources
            .get(name)
            .and_then(Source::cached_artifact)
            .filter(|a| a.version() == version);
        from_source
            .or_else(|| self.registry.get(name, version))
            .cloned()
            .ok_or_else(|| ResolveError::ArtifactNotFound {
                name: name.to_string(),
                version: version.clone(),
            })
    }
}
