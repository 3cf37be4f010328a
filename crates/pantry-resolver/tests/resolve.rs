use std::collections::BTreeMap;
use std::sync::Arc;

use pantry_core::artifact::CachedArtifact;
use pantry_core::config::ResolverConfig;
use pantry_core::constraint::{Constraint, Version};
use pantry_core::source::Source;
use pantry_core::store::MemoryStore;
use pantry_resolver::resolved::ResolvedGraph;
use pantry_resolver::{ResolveError, Resolver};

fn artifact(name: &str, version: &str, deps: &[(&str, &str)]) -> CachedArtifact {
    let deps: BTreeMap<String, Constraint> = deps
        .iter()
        .map(|(n, c)| (n.to_string(), Constraint::parse(c).unwrap()))
        .collect();
    CachedArtifact::new(name, Version::parse(version).unwrap(), deps)
}

fn source(name: &str, constraint: &str) -> Source {
    Source::new(name, Constraint::parse(constraint).unwrap())
}

fn rendered(artifacts: &[Arc<CachedArtifact>]) -> Vec<String> {
    artifacts
        .iter()
        .map(|a| format!("{}@{}", a.name(), a.version()))
        .collect()
}

fn web_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .add(artifact("web", "1.0", &[("nginx", "~> 1.0"), ("ssl", ">= 1.0")]))
        .add(artifact("nginx", "1.2", &[("pcre", ">= 8.0")]))
        .add(artifact("nginx", "1.4", &[("pcre", ">= 8.0")]))
        .add(artifact("pcre", "8.4", &[]))
        .add(artifact("ssl", "1.1", &[]))
        .add(artifact("db", "3.0", &[("disk", "= 1.0")]))
        .add(artifact("disk", "1.0", &[]));
    store
}

#[test]
fn one_artifact_per_source_and_transitive_name() {
    let store = web_store();
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("web", ">= 0"), true).unwrap();
    resolver.add_source(source("db", ">= 0"), true).unwrap();

    let resolved = resolver.resolve(None).unwrap();
    assert_eq!(
        rendered(&resolved),
        vec![
            "db@3.0.0",
            "disk@1.0.0",
            "nginx@1.4.0",
            "pcre@8.4.0",
            "ssl@1.1.0",
            "web@1.0.0"
        ]
    );
}

#[test]
fn root_without_dependencies_resolves_to_itself() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("x", "1.0", &[]))
        .add(artifact("other", "1.0", &[]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("x", ">= 0"), true).unwrap();
    resolver.add_source(source("other", ">= 0"), true).unwrap();

    let resolved = resolver.resolve(Some(&["x"])).unwrap();
    assert_eq!(rendered(&resolved), vec!["x@1.0.0"]);
}

#[test]
fn requested_roots_only_pull_their_own_closure() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("x", "1.0", &[("y", ">= 1.0")]))
        .add(artifact("y", "1.0", &[]))
        .add(artifact("y", "2.0", &[]))
        .add(artifact("z", "1.0", &[]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("x", ">= 0"), true).unwrap();
    resolver.add_source(source("y", "~> 1.0"), true).unwrap();
    resolver.add_source(source("z", ">= 0"), true).unwrap();

    // y is registered at 1.0, which pins it even though 2.0 is stored.
    let with_x = resolver.resolve(Some(&["x"])).unwrap();
    assert_eq!(rendered(&with_x), vec!["x@1.0.0", "y@1.0.0"]);

    let with_z = resolver.resolve(Some(&["z"])).unwrap();
    assert_eq!(rendered(&with_z), vec!["z@1.0.0"]);
}

#[test]
fn resolved_sources_are_the_registered_artifacts() {
    let mut store = MemoryStore::new();
    store.add(artifact("x", "1.0", &[("y", ">= 0")]));
    let mut resolver = Resolver::new(&store);
    let attached = Arc::new(artifact("y", "4.2", &[]));
    resolver.add_source(source("x", ">= 0"), true).unwrap();
    resolver
        .add_source(source("y", ">= 0").with_cached(Arc::clone(&attached)), true)
        .unwrap();

    let resolved = resolver.resolve(None).unwrap();
    assert!(Arc::ptr_eq(&resolved[1], &attached));
}

#[test]
fn source_registered_without_dependencies_resolves_alone() {
    let mut store = MemoryStore::new();
    store.add(artifact("app", "1.0", &[("lib", ">= 1.0")]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("app", ">= 0"), false).unwrap();

    let resolved = resolver.resolve(None).unwrap();
    assert_eq!(rendered(&resolved), vec!["app@1.0.0"]);
}

#[test]
fn source_artifact_takes_over_expanded_copy() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("x", "1.0", &[("y", ">= 0")]))
        .add(artifact("y", "1.0", &[]))
        .add(artifact("z", "1.0", &[]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("x", ">= 0"), true).unwrap();

    let own = Arc::new(artifact("y", "1.0", &[("z", ">= 1.0")]));
    resolver
        .add_source(source("y", ">= 0").with_cached(Arc::clone(&own)), true)
        .unwrap();

    let registered = resolver.registry().get("y", &Version::new(1, 0, 0)).unwrap();
    assert!(Arc::ptr_eq(registered, &own));

    let resolved = resolver.resolve(None).unwrap();
    assert_eq!(rendered(&resolved), vec!["x@1.0.0", "y@1.0.0", "z@1.0.0"]);
    assert!(Arc::ptr_eq(&resolved[1], &own));
}

#[test]
fn source_without_dependencies_drops_expanded_demands() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("x", "1.0", &[("y", ">= 0")]))
        .add(artifact("y", "1.0", &[("ghost", ">= 1.0")]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("x", ">= 0"), true).unwrap();
    resolver.add_source(source("y", ">= 0"), false).unwrap();

    let resolved = resolver.resolve(None).unwrap();
    assert_eq!(rendered(&resolved), vec!["x@1.0.0", "y@1.0.0"]);
}

#[test]
fn duplicate_source_leaves_registry_unchanged() {
    let store = web_store();
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("web", "~> 1.0"), true).unwrap();
    let registered = resolver.registry().len();
    let nodes = resolver.graph().len();

    let err = resolver.add_source(source("web", ">= 0"), true).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::DuplicateSourceDefined { ref name } if name == "web"
    ));
    assert_eq!(resolver.sources().count(), 1);
    assert_eq!(
        resolver.get_source("web").unwrap().constraint().to_string(),
        "~> 1.0"
    );
    assert_eq!(resolver.registry().len(), registered);
    assert_eq!(resolver.graph().len(), nodes);
}

#[test]
fn repeated_resolution_is_deterministic() {
    let store = web_store();
    let build = || {
        let mut resolver = Resolver::new(&store);
        resolver.add_source(source("db", ">= 0"), true).unwrap();
        resolver.add_source(source("web", ">= 0"), true).unwrap();
        resolver
    };
    let first = rendered(&build().resolve(None).unwrap());
    let resolver = build();
    for _ in 0..3 {
        assert_eq!(rendered(&resolver.resolve(None).unwrap()), first);
    }
}

#[test]
fn disjoint_ranges_have_no_solution() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("web", "1.0", &[("nginx", ">= 2.0")]))
        .add(artifact("api", "1.0", &[("nginx", "< 2.0")]))
        .add(artifact("nginx", "1.8", &[]))
        .add(artifact("nginx", "2.1", &[]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("web", ">= 0"), true).unwrap();
    resolver.add_source(source("api", ">= 0"), true).unwrap();

    let err = resolver.resolve(None).unwrap_err();
    let ResolveError::NoSolution { report, .. } = &err else {
        panic!("expected NoSolution, got {err:?}");
    };
    let nginx = report.get("nginx").expect("nginx conflict reported");
    let constraints: Vec<String> = nginx
        .demands
        .iter()
        .map(|d| d.constraint.to_string())
        .collect();
    assert!(constraints.contains(&">= 2.0".to_string()));
    assert!(constraints.contains(&"< 2.0".to_string()));
    assert!(err.to_string().starts_with("Unable to find a solution for demands:"));

    // Each side alone is fine.
    assert_eq!(resolver.resolve(Some(&["web"])).unwrap().len(), 2);
    assert_eq!(resolver.resolve(Some(&["api"])).unwrap().len(), 2);
}

#[test]
fn backtracks_past_newest_version() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("app", "1.0", &[("web", ">= 1.0"), ("db", ">= 1.0")]))
        .add(artifact("web", "1.0", &[("ssl", "~> 1.0")]))
        .add(artifact("web", "2.0", &[("ssl", "~> 2.0")]))
        .add(artifact("db", "1.0", &[("ssl", "< 2.0")]))
        .add(artifact("ssl", "1.5", &[]))
        .add(artifact("ssl", "2.0", &[]));
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("app", ">= 0"), true).unwrap();

    let resolved = resolver.resolve(None).unwrap();
    assert_eq!(
        rendered(&resolved),
        vec!["app@1.0.0", "db@1.0.0", "ssl@1.5.0", "web@1.0.0"]
    );
}

#[test]
fn unknown_root_is_not_found() {
    let store = web_store();
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("web", ">= 0"), true).unwrap();
    let err = resolver.resolve(Some(&["nope"])).unwrap_err();
    assert!(matches!(err, ResolveError::SourceNotFound { ref name } if name == "nope"));
    assert!(resolver.get_source("nope").is_err());
}

#[test]
fn source_missing_from_store_is_not_downloaded() {
    let store = web_store();
    let mut resolver = Resolver::new(&store);
    let err = resolver.add_source(source("ghost", ">= 0"), true).unwrap_err();
    assert!(matches!(err, ResolveError::NotDownloaded { .. }));

    let err = resolver.add_source(source("web", ">= 5.0"), true).unwrap_err();
    assert!(matches!(err, ResolveError::NotDownloaded { .. }));
    assert_eq!(resolver.sources().count(), 0);
}

#[test]
fn step_budget_from_config() {
    let mut store = MemoryStore::new();
    store
        .add(artifact("web", "1.0", &[("nginx", ">= 2.0")]))
        .add(artifact("api", "1.0", &[("nginx", "< 2.0")]))
        .add(artifact("nginx", "1.8", &[]))
        .add(artifact("nginx", "2.1", &[]));
    let config = ResolverConfig::parse_toml("[solver]\nmax-steps = 1\n").unwrap();
    let mut resolver = Resolver::new(&store).with_config(config);
    resolver.add_source(source("web", ">= 0"), true).unwrap();
    resolver.add_source(source("api", ">= 0"), true).unwrap();

    let err = resolver.resolve(None).unwrap_err();
    assert!(matches!(err, ResolveError::StepLimitExceeded { steps: 1 }));
}

#[test]
fn lockfile_and_tree_from_resolution() {
    let store = web_store();
    let mut resolver = Resolver::new(&store);
    resolver.add_source(source("web", "~> 1.0"), true).unwrap();
    let resolved = resolver.resolve(None).unwrap();

    let lock = resolver.lockfile(&resolved);
    assert_eq!(lock.source.len(), 1);
    assert_eq!(lock.artifact.len(), 4);
    assert_eq!(lock.locked_version("nginx"), Some(&Version::new(1, 4, 0)));

    let graph = ResolvedGraph::build(&resolved, &["web"]);
    let path: Vec<&str> = graph
        .find_path("pcre")
        .unwrap()
        .iter()
        .map(|a| a.name())
        .collect();
    assert_eq!(path, vec!["web", "nginx", "pcre"]);
    let order: Vec<&str> = graph.install_order().iter().map(|a| a.name()).collect();
    assert_eq!(order.last(), Some(&"web"));
}
