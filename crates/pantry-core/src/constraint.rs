//! Version parsing, ordering, and constraint matching.
//!
//! Versions are lenient about precision: `1`, `1.2` and `1.2.3` all parse and
//! are padded with zeros. Pre-release and build suffixes follow semver rules.
//!
//! A constraint is one operator applied to one version:
//! - `=`, `!=`, `>`, `<`, `>=`, `<=`
//! - `~>` (pessimistic): `~> 1.2` means `>= 1.2.0, < 2.0.0` and
//!   `~> 1.2.3` means `>= 1.2.3, < 1.3.0`
//!
//! A bare version means `=`. An empty string or `*` matches every version.

use std::fmt;
use std::str::FromStr;

use pantry_util::errors::PantryError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("invalid version `{input}`: {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("invalid constraint `{input}`: unknown operator `{operator}`")]
    InvalidOperator { input: String, operator: String },
}

impl From<ConstraintError> for PantryError {
    fn from(err: ConstraintError) -> Self {
        PantryError::Constraint {
            message: err.to_string(),
        }
    }
}

/// A concrete artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(semver::Version);

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parse a version, padding a missing minor or patch component with zero.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        Self::parse_with_precision(input).map(|(version, _)| version)
    }

    /// Parse a version and report how many numeric components were written.
    fn parse_with_precision(input: &str) -> Result<(Self, usize), ConstraintError> {
        let trimmed = input.trim();
        let invalid = |reason: &str| ConstraintError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let split = trimmed.find(|c| c == '-' || c == '+').unwrap_or(trimmed.len());
        let (core, suffix) = trimmed.split_at(split);
        let parts: Vec<&str> = core.split('.').collect();

        if core.is_empty() || parts.len() > 3 {
            return Err(invalid("expected one to three numeric components"));
        }
        if parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(invalid("components must be non-negative integers"));
        }

        let mut padded = parts.join(".");
        for _ in parts.len()..3 {
            padded.push_str(".0");
        }
        padded.push_str(suffix);

        let version = semver::Version::parse(&padded).map_err(|e| invalid(&e.to_string()))?;
        let precision = if suffix.is_empty() { parts.len() } else { 3 };
        Ok((Self(version), precision))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Version {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Pessimistic,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "" | "=" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            ">=" => Some(Self::GreaterEqual),
            "<=" => Some(Self::LessEqual),
            "~>" => Some(Self::Pessimistic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Pessimistic => "~>",
        }
    }
}

/// A predicate over versions such as `>= 1.2` or `~> 2.0.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    operator: Operator,
    version: Version,
    /// Number of version components written by the user; drives `~>` bounds.
    precision: usize,
}

impl Constraint {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self {
            operator,
            version,
            precision: 3,
        }
    }

    /// `>= 0.0.0`, satisfied by every version.
    pub fn any() -> Self {
        Self::new(Operator::GreaterEqual, Version::new(0, 0, 0))
    }

    pub fn exact(version: Version) -> Self {
        Self::new(Operator::Equal, version)
    }

    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::any());
        }

        let op_len = trimmed
            .find(|c: char| !matches!(c, '=' | '!' | '<' | '>' | '~'))
            .unwrap_or(trimmed.len());
        let (op, rest) = trimmed.split_at(op_len);
        let operator = Operator::parse(op).ok_or_else(|| ConstraintError::InvalidOperator {
            input: input.to_string(),
            operator: op.to_string(),
        })?;
        let (version, precision) = Version::parse_with_precision(rest)?;

        Ok(Self {
            operator,
            version,
            precision,
        })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_any(&self) -> bool {
        self.operator == Operator::GreaterEqual && self.version == Version::new(0, 0, 0)
    }

    /// Check if a version satisfies this constraint.
    pub fn matches(&self, candidate: &Version) -> bool {
        let target = &self.version;
        match self.operator {
            Operator::Equal => candidate == target,
            Operator::NotEqual => candidate != target,
            Operator::Greater => candidate > target,
            Operator::Less => candidate < target,
            Operator::GreaterEqual => candidate >= target,
            Operator::LessEqual => candidate <= target,
            Operator::Pessimistic => candidate >= target && *candidate < self.pessimistic_ceiling(),
        }
    }

    /// Exclusive upper bound of a `~>` constraint.
    fn pessimistic_ceiling(&self) -> Version {
        let v = &self.version;
        match self.precision {
            1 | 2 => Version::new(v.major() + 1, 0, 0),
            _ => Version::new(v.major(), v.minor() + 1, 0),
        }
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = &self.version;
        match self.precision {
            1 => write!(f, "{} {}", self.operator.as_str(), v.major()),
            2 => write!(f, "{} {}.{}", self.operator.as_str(), v.major(), v.minor()),
            _ => write!(f, "{} {}", self.operator.as_str(), v),
        }
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
