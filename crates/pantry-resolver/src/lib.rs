//! Dependency resolution engine: source registration, transitive expansion
//! with nested manifest discovery, a demand graph over versioned artifacts,
//! and a deterministic backtracking solver.

pub mod conflict;
pub mod error;
pub mod graph;
pub mod registry;
pub mod resolved;
pub mod resolver;
pub mod solver;
pub mod visited;

pub use error::{ResolveError, ResolveResult};
pub use resolver::Resolver;
