use miette::Diagnostic;
use pantry_core::constraint::Version;
use pantry_util::errors::PantryError;
use thiserror::Error;

use crate::conflict::ConflictReport;

/// Failures surfaced by source registration and resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// A second source with an already registered name.
    #[error("Source '{name}' is defined more than once")]
    #[diagnostic(help("Each artifact name may be declared by a single source"))]
    DuplicateSourceDefined { name: String },

    #[error("No source named '{name}' is registered")]
    SourceNotFound { name: String },

    #[error("Artifact {name} ({version}) is not in the artifact registry")]
    ArtifactNotFound { name: String, version: Version },

    /// The store has nothing materialized for the source yet.
    #[error("Source '{name}' has not been downloaded")]
    #[diagnostic(help("Fetch the artifact into the store before resolving"))]
    NotDownloaded { name: String },

    #[error("Cached artifact for source '{name}' is invalid: {reason}")]
    InvalidArtifact { name: String, reason: String },

    /// No assignment satisfies every accumulated constraint.
    #[error("Unable to find a solution for demands: {demands}\n{report}")]
    #[diagnostic(help("Relax one of the conflicting constraints listed above"))]
    NoSolution {
        demands: String,
        report: ConflictReport,
    },

    #[error("Resolution gave up after {steps} solver steps")]
    #[diagnostic(help("Raise `solver.max-steps` or tighten the source constraints"))]
    StepLimitExceeded { steps: u64 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pantry(#[from] PantryError),
}

pub type ResolveResult<T> = Result<T, ResolveError>;
