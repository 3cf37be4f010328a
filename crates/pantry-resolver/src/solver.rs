//! Deterministic backtracking search over the demand graph.
//!
//! Each step picks the undecided name with the fewest satisfying candidates
//! (ties broken by name), then tries its candidates highest version first. A
//! candidate is accepted only if its own demands hold for every name decided
//! so far; its demands are then pushed and the search recurses. On failure
//! the demands are popped and the next candidate is tried.

use std::collections::BTreeMap;
use std::fmt;

use pantry_core::constraint::{Constraint, Version};

use crate::conflict::{ConflictReport, ConflictingDemand, VersionConflict};
use crate::error::{ResolveError, ResolveResult};
use crate::graph::{ArtifactId, Demand, DependencyGraph};

/// One chosen version per artifact name.
pub type Assignment = BTreeMap<String, Version>;

/// Who placed a demand on a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Root,
    Artifact(ArtifactId),
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Artifact(id) => fmt::Display::fmt(id, f),
        }
    }
}

#[derive(Debug, Clone)]
struct Requirement {
    constraint: Constraint,
    requester: Requester,
}

pub struct Solver<'g> {
    graph: &'g DependencyGraph,
    pins: BTreeMap<String, Version>,
    max_steps: Option<u64>,
    steps: u64,
    conflicts: BTreeMap<String, VersionConflict>,
}

impl<'g> Solver<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            pins: BTreeMap::new(),
            max_steps: None,
            steps: 0,
            conflicts: BTreeMap::new(),
        }
    }

    /// Restrict the named artifacts to exactly these versions.
    pub fn with_pins(mut self, pins: BTreeMap<String, Version>) -> Self {
        self.pins = pins;
        self
    }

    /// Fail with [`ResolveError::StepLimitExceeded`] after this many candidate attempts.
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Find an assignment covering `roots` and everything they transitively demand.
    pub fn solve(mut self, roots: &[Demand]) -> ResolveResult<Assignment> {
        let mut demands: BTreeMap<String, Vec<Requirement>> = BTreeMap::new();
        for root in roots {
            demands
                .entry(root.name.clone())
                .or_default()
                .push(Requirement {
                    constraint: root.constraint.clone(),
                    requester: Requester::Root,
                });
        }

        let mut selected = Assignment::new();
        if self.search(&mut demands, &mut selected)? {
            tracing::debug!(
                "Solver found {} artifacts in {} steps",
                selected.len(),
                self.steps
            );
            return Ok(selected);
        }

        let demands = roots
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let mut report = ConflictReport::new();
        for conflict in self.conflicts.into_values() {
            report.add(conflict);
        }
        Err(ResolveError::NoSolution { demands, report })
    }

    fn search(
        &mut self,
        demands: &mut BTreeMap<String, Vec<Requirement>>,
        selected: &mut Assignment,
    ) -> ResolveResult<bool> {
        let Some((name, candidates)) = self.next_decision(demands, selected) else {
            return Ok(true);
        };
        if candidates.is_empty() {
            self.record_conflict(&name, demands, None);
            return Ok(false);
        }

        for version in candidates {
            self.step()?;
            let Some(node) = self.graph.get(&name, &version) else {
                continue;
            };

            let clash = node.demands().iter().find_map(|d| {
                selected
                    .get(&d.name)
                    .filter(|chosen| !d.constraint.matches(chosen))
                    .map(|chosen| (d, chosen))
            });
            if let Some((clash, chosen)) = clash {
                tracing::trace!("Rejecting {name} {version}: demands {clash} but {chosen} is chosen");
                let requirement = Requirement {
                    constraint: clash.constraint.clone(),
                    requester: Requester::Artifact(node.id().clone()),
                };
                self.record_conflict(&clash.name, demands, Some(requirement));
                continue;
            }

            tracing::trace!("Trying {name} {version}");
            selected.insert(name.clone(), version.clone());
            for demand in node.demands() {
                demands
                    .entry(demand.name.clone())
                    .or_default()
                    .push(Requirement {
                        constraint: demand.constraint.clone(),
                        requester: Requester::Artifact(node.id().clone()),
                    });
            }

            if self.search(demands, selected)? {
                return Ok(true);
            }

            for demand in node.demands().iter().rev() {
                if let Some(list) = demands.get_mut(&demand.name) {
                    list.pop();
                    if list.is_empty() {
                        demands.remove(&demand.name);
                    }
                }
            }
            selected.remove(&name);
            tracing::trace!("Backtracking from {name} {version}");
        }

        Ok(false)
    }

    /// The undecided name with the fewest candidates, and those candidates
    /// ordered highest first. `None` once every demanded name is decided.
    fn next_decision(
        &self,
        demands: &BTreeMap<String, Vec<Requirement>>,
        selected: &Assignment,
    ) -> Option<(String, Vec<Version>)> {
        let mut best: Option<(String, Vec<Version>)> = None;
        for (name, requirements) in demands {
            if selected.contains_key(name) {
                continue;
            }
            let candidates = self.candidates(name, requirements);
            let better = best
                .as_ref()
                .map_or(true, |(_, current)| candidates.len() < current.len());
            if better {
                let done = candidates.is_empty();
                best = Some((name.clone(), candidates));
                if done {
                    break;
                }
            }
        }
        best
    }

    fn candidates(&self, name: &str, requirements: &[Requirement]) -> Vec<Version> {
        let pin = self.pins.get(name);
        self.graph
            .satisfying(name, requirements.iter().map(|r| &r.constraint))
            .into_iter()
            .filter(|v| pin.map_or(true, |pinned| *v == pinned))
            .cloned()
            .collect()
    }

    fn record_conflict(
        &mut self,
        name: &str,
        demands: &BTreeMap<String, Vec<Requirement>>,
        extra: Option<Requirement>,
    ) {
        let mut requirements: Vec<Requirement> = demands.get(name).cloned().unwrap_or_default();
        requirements.extend(extra);
        if let Some(pinned) = self.pins.get(name) {
            requirements.push(Requirement {
                constraint: Constraint::exact(pinned.clone()),
                requester: Requester::Root,
            });
        }

        let conflict = VersionConflict {
            name: name.to_string(),
            demands: requirements
                .into_iter()
                .map(|r| ConflictingDemand {
                    constraint: r.constraint,
                    required_by: r.requester.to_string(),
                })
                .collect(),
            available: self.graph.versions(name).into_iter().cloned().collect(),
        };
        tracing::trace!("Conflict: {conflict}");
        self.conflicts.insert(name.to_string(), conflict);
    }

    fn step(&mut self) -> ResolveResult<()> {
        self.steps += 1;
        match self.max_steps {
            Some(max) if self.steps > max => Err(ResolveError::StepLimitExceeded { steps: max }),
            _ => Ok(()),
        }
    }
}
