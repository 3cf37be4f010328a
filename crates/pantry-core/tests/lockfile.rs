use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use pantry_core::artifact::CachedArtifact;
use pantry_core::constraint::{Constraint, Version};
use pantry_core::lockfile::Lockfile;
use pantry_core::source::{Source, SourceLocation};

fn artifact(name: &str, version: &str, deps: &[(&str, &str)]) -> Arc<CachedArtifact> {
    let dependencies: BTreeMap<String, Constraint> = deps
        .iter()
        .map(|(n, c)| (n.to_string(), Constraint::parse(c).unwrap()))
        .collect();
    Arc::new(CachedArtifact::new(
        name,
        Version::parse(version).unwrap(),
        dependencies,
    ))
}

fn sample() -> Lockfile {
    let sources = vec![
        Source::new("web", Constraint::parse("~> 1.0").unwrap()),
        Source::new("app", Constraint::any()).with_location(SourceLocation::Path {
            path: PathBuf::from("/work/app"),
        }),
    ];
    let artifacts = vec![
        artifact("web", "1.4.0", &[("nginx", ">= 2.0")]),
        artifact("nginx", "2.1.0", &[]),
        artifact("app", "0.1.0", &[("web", "~> 1.0")]),
    ];
    Lockfile::from_resolution(&sources, &artifacts)
}

#[test]
fn from_resolution_sorts_entries() {
    let lockfile = sample();
    let sources: Vec<&str> = lockfile.source.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sources, vec!["app", "web"]);
    let artifacts: Vec<&str> = lockfile.artifact.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(artifacts, vec!["app", "nginx", "web"]);
}

#[test]
fn round_trip_serialize_deserialize() {
    let lockfile = sample();
    let serialized = lockfile.to_string_pretty().unwrap();
    let parsed = Lockfile::parse_toml(&serialized).unwrap();

    assert_eq!(parsed.source.len(), 2);
    assert_eq!(
        parsed.source[0].location,
        SourceLocation::Path {
            path: PathBuf::from("/work/app")
        }
    );
    assert_eq!(parsed.source[1].location, SourceLocation::Registry { url: None });
    assert_eq!(parsed.artifact.len(), 3);
    assert_eq!(
        parsed.artifact[2].dependencies["nginx"],
        Constraint::parse(">= 2.0").unwrap()
    );
}

#[test]
fn locked_version_lookup() {
    let lockfile = sample();
    assert_eq!(lockfile.locked_version("nginx"), Some(&Version::new(2, 1, 0)));
    assert_eq!(lockfile.locked_version("missing"), None);
}

#[test]
fn empty_lockfile_serializes_deserializes() {
    let lockfile = Lockfile::default();
    let serialized = lockfile.to_string_pretty().unwrap();
    let parsed = Lockfile::parse_toml(&serialized).unwrap();
    assert!(parsed.source.is_empty());
    assert!(parsed.artifact.is_empty());
}

#[test]
fn malformed_lockfile_is_a_lockfile_error() {
    let err = Lockfile::parse_toml("[[artifact]]\nname = 3").unwrap_err();
    assert!(err.to_string().starts_with("Lockfile error"), "got: {err}");
}
