use pantry_util::errors::{PantryError, PantryResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolver settings, usually read from `pantry.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Expand manifests bundled inside artifacts into further sources.
    #[serde(default)]
    pub nested_manifests: bool,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub solver: SolverConfig,
}

/// Artifact store settings from `[store]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> String {
    "~/.pantry/store".to_string()
}

impl StoreConfig {
    /// The store directory with a leading `~/` expanded against `$HOME`.
    pub fn resolved_dir(&self) -> PathBuf {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from);
        pantry_util::fs::expand_home(&self.dir, home.as_deref())
    }
}

/// Search settings from `[solver]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SolverConfig {
    /// Upper bound on candidate attempts before giving up; unbounded if unset.
    #[serde(default)]
    pub max_steps: Option<u64>,
}

impl ResolverConfig {
    /// Load configuration from `path`, or return defaults if the file doesn't exist.
    pub fn from_path(path: &Path) -> PantryResult<Self> {
        if !path.is_file() {
            tracing::debug!("No resolver config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| PantryError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> PantryResult<Self> {
        toml::from_str(content).map_err(|e| PantryError::Config {
            message: format!("Failed to parse resolver config: {e}"),
        })
    }
}
