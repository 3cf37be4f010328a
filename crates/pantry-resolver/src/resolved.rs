//! Graph view over a finished resolution, for display and install planning.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pantry_core::artifact::CachedArtifact;
use pantry_core::constraint::Constraint;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Resolved artifacts linked by the constraints they declared on each other.
pub struct ResolvedGraph {
    graph: DiGraph<Arc<CachedArtifact>, Constraint>,
    /// Lookup from artifact name to node index.
    index: HashMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl ResolvedGraph {
    /// Build from a resolved artifact set. Each dependency edge points at the
    /// artifact chosen for that name; dependencies outside the set are left out.
    pub fn build(artifacts: &[Arc<CachedArtifact>], roots: &[&str]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        let mut sorted: Vec<&Arc<CachedArtifact>> = artifacts.iter().collect();
        sorted.sort();
        for artifact in sorted {
            if index.contains_key(artifact.name()) {
                continue;
            }
            let idx = graph.add_node(Arc::clone(artifact));
            index.insert(artifact.name().to_string(), idx);
        }

        let nodes: Vec<NodeIndex> = graph.node_indices().collect();
        for from in nodes {
            let deps: Vec<(NodeIndex, Constraint)> = graph[from]
                .dependencies()
                .iter()
                .filter_map(|(name, constraint)| Some((*index.get(name)?, constraint.clone())))
                .collect();
            for (to, constraint) in deps {
                graph.add_edge(from, to, constraint);
            }
        }

        let roots = roots
            .iter()
            .filter_map(|name| index.get(*name).copied())
            .collect();

        Self {
            graph,
            index,
            roots,
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &Arc<CachedArtifact> {
        &self.graph[idx]
    }

    /// Direct dependencies of a node, ordered by name.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &Constraint)> {
        self.sorted_edges(idx, Direction::Outgoing)
    }

    /// Reverse dependencies (who depends on this node), ordered by name.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &Constraint)> {
        self.sorted_edges(idx, Direction::Incoming)
    }

    fn sorted_edges(&self, idx: NodeIndex, dir: Direction) -> Vec<(NodeIndex, &Constraint)> {
        let mut edges: Vec<(NodeIndex, &Constraint)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, e.weight())
            })
            .collect();
        edges.sort_by(|a, b| self.graph[a.0].name().cmp(self.graph[b.0].name()));
        edges
    }

    /// Render each root and its dependencies as a tree.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        for &root in &self.roots {
            output.push_str(&format!("{}\n", self.graph[root]));
            visited.insert(root);
            let deps = self.dependencies_of(root);
            let count = deps.len();
            for (i, (idx, constraint)) in deps.iter().enumerate() {
                let is_last = i == count - 1;
                self.print_subtree(
                    &mut output,
                    *idx,
                    constraint,
                    "",
                    is_last,
                    1,
                    max_depth,
                    &mut visited,
                );
            }
            visited.remove(&root);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        constraint: &Constraint,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} [{constraint}]\n"));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, child_constraint)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                child_constraint,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// The first path from a root to `name`, trying roots in order.
    pub fn find_path(&self, name: &str) -> Option<Vec<&Arc<CachedArtifact>>> {
        let target = self.find(name)?;
        for &root in &self.roots {
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(root, target, &mut path, &mut visited) {
                return Some(path.iter().map(|&idx| &self.graph[idx]).collect());
            }
        }
        None
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (next, _) in self.dependencies_of(current) {
            if self.dfs_path(next, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Every artifact with its dependencies before it. Members of a dependency
    /// cycle are adjacent, ordered by name.
    pub fn install_order(&self) -> Vec<&Arc<CachedArtifact>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .flat_map(|mut component| {
                component.sort_by(|a, b| self.graph[*a].name().cmp(self.graph[*b].name()));
                component
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pantry_core::constraint::Version;

    use super::*;

    fn artifact(name: &str, version: &str, deps: &[(&str, &str)]) -> Arc<CachedArtifact> {
        let deps: BTreeMap<String, Constraint> = deps
            .iter()
            .map(|(n, c)| (n.to_string(), Constraint::parse(c).unwrap()))
            .collect();
        Arc::new(CachedArtifact::new(name, Version::parse(version).unwrap(), deps))
    }

    fn names(artifacts: &[&Arc<CachedArtifact>]) -> Vec<String> {
        artifacts.iter().map(|a| a.name().to_string()).collect()
    }

    fn sample() -> ResolvedGraph {
        ResolvedGraph::build(
            &[
                artifact("app", "1.0", &[("web", "~> 2.0"), ("db", ">= 1.0")]),
                artifact("web", "2.1", &[("ssl", ">= 1.0")]),
                artifact("db", "1.3", &[("ssl", "~> 1.2")]),
                artifact("ssl", "1.2.5", &[]),
            ],
            &["app"],
        )
    }

    #[test]
    fn build_and_find() {
        let g = sample();
        assert_eq!(g.len(), 4);
        let web = g.find("web").unwrap();
        assert_eq!(g.node(web).version(), &Version::new(2, 1, 0));
        assert!(g.find("missing").is_none());
    }

    #[test]
    fn dependencies_and_dependents_are_sorted() {
        let g = sample();
        let app = g.find("app").unwrap();
        let deps: Vec<&str> = g
            .dependencies_of(app)
            .iter()
            .map(|(idx, _)| g.node(*idx).name())
            .collect();
        assert_eq!(deps, vec!["db", "web"]);

        let ssl = g.find("ssl").unwrap();
        let dependents: Vec<&str> = g
            .dependents_of(ssl)
            .iter()
            .map(|(idx, _)| g.node(*idx).name())
            .collect();
        assert_eq!(dependents, vec!["db", "web"]);
    }

    #[test]
    fn tree_printing() {
        let tree = sample().print_tree(None);
        let expected = "\
app (1.0.0)
├── db (1.3.0) [>= 1.0]
│   └── ssl (1.2.5) [~> 1.2]
└── web (2.1.0) [~> 2.0]
    └── ssl (1.2.5) [>= 1.0]
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn tree_respects_max_depth() {
        let tree = sample().print_tree(Some(1));
        assert!(tree.contains("db (1.3.0)"));
        assert!(!tree.contains("ssl"));
    }

    #[test]
    fn tree_terminates_on_cycles() {
        let g = ResolvedGraph::build(
            &[
                artifact("a", "1.0", &[("b", ">= 0")]),
                artifact("b", "1.0", &[("a", ">= 0")]),
            ],
            &["a"],
        );
        let tree = g.print_tree(None);
        assert_eq!(tree.lines().count(), 3);
    }

    #[test]
    fn find_path_from_root() {
        let g = sample();
        let path = g.find_path("ssl").unwrap();
        assert_eq!(names(&path), vec!["app", "db", "ssl"]);
        assert!(g.find_path("missing").is_none());
    }

    #[test]
    fn find_path_unreachable_from_roots() {
        let g = ResolvedGraph::build(
            &[artifact("app", "1.0", &[]), artifact("lone", "1.0", &[])],
            &["app"],
        );
        assert!(g.find_path("lone").is_none());
    }

    #[test]
    fn install_order_puts_dependencies_first() {
        let g = sample();
        let order = names(&g.install_order());
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert_eq!(order.len(), 4);
        assert!(pos("ssl") < pos("db"));
        assert!(pos("ssl") < pos("web"));
        assert!(pos("db") < pos("app"));
        assert!(pos("web") < pos("app"));
    }

    #[test]
    fn install_order_keeps_cycles_together() {
        let g = ResolvedGraph::build(
            &[
                artifact("app", "1.0", &[("b", ">= 0")]),
                artifact("a", "1.0", &[("b", ">= 0")]),
                artifact("b", "1.0", &[("a", ">= 0")]),
            ],
            &["app"],
        );
        let order = names(&g.install_order());
        assert_eq!(order, vec!["a", "b", "app"]);
    }
}
