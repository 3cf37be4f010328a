//! Conflict diagnostics attached to a failed resolution.

use std::fmt;

use pantry_core::constraint::{Constraint, Version};

/// Every artifact name for which no version could be chosen.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// The demands on one name that no available version satisfies together.
#[derive(Debug, Clone)]
pub struct VersionConflict {
    pub name: String,
    pub demands: Vec<ConflictingDemand>,
    /// Every version of `name` the graph knows about.
    pub available: Vec<Version>,
}

/// One constraint and who asked for it.
#[derive(Debug, Clone)]
pub struct ConflictingDemand {
    pub constraint: Constraint,
    pub required_by: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn get(&self, name: &str) -> Option<&VersionConflict> {
        self.conflicts.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let demands = self
            .demands
            .iter()
            .map(|d| format!("{} (from {})", d.constraint, d.required_by))
            .collect::<Vec<_>>()
            .join(", ");
        let available = if self.available.is_empty() {
            "none".to_string()
        } else {
            self.available
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{}: no version satisfies [{}]; available: {}",
            self.name, demands, available
        )
    }
}
