use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for Pantry collaborators: manifests, stores, lockfiles.
#[derive(Debug, Error, Diagnostic)]
pub enum PantryError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. Pantryfile.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Pantryfile.toml for syntax errors"))]
    Manifest { message: String },

    /// Invalid resolver configuration.
    #[error("Config error: {message}")]
    Config { message: String },

    /// A version or version constraint could not be parsed.
    #[error("Invalid version constraint: {message}")]
    #[diagnostic(help("Use an operator such as `=`, `>=`, `<` or `~>` followed by a version"))]
    Constraint { message: String },

    /// An artifact's metadata could not be read or parsed.
    #[error("Metadata error: {message}")]
    Metadata { message: String },

    /// Reading or writing the lockfile failed.
    #[error("Lockfile error: {message}")]
    Lockfile { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for results carrying a [`PantryError`].
pub type PantryResult<T> = Result<T, PantryError>;
