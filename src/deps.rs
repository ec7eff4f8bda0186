//! Dependency Graph
//!
//! Builds a directed graph from each record to the records it lists under
//! `dependencies`. References that name no record are kept aside rather than
//! rejected; resolving them is only enforced in strict loading mode.

use std::collections::HashMap;

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::registry::Registry;

/// A dependency naming a record that does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDependency {
    /// Record declaring the dependency
    pub record: String,
    /// Position in the record's `dependencies` list
    pub position: usize,
    pub dependency: String,
}

/// Graph of record -> dependency edges
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    unresolved: Vec<UnresolvedDependency>,
}

impl DependencyGraph {
    pub fn build(registry: &Registry) -> Self {
        let mut graph = DiGraph::with_capacity(registry.len(), registry.len() * 2);
        let mut node_indices = HashMap::with_capacity(registry.len());

        for record in registry.iter() {
            node_indices
                .entry(record.name.clone())
                .or_insert_with(|| graph.add_node(record.name.clone()));
        }

        let mut unresolved = Vec::new();
        for record in registry.iter() {
            let from = node_indices[&record.name];
            for (position, dependency) in record.dependencies.iter().enumerate() {
                match node_indices.get(dependency) {
                    Some(&to) => {
                        graph.update_edge(from, to, ());
                    }
                    None => unresolved.push(UnresolvedDependency {
                        record: record.name.clone(),
                        position,
                        dependency: dependency.clone(),
                    }),
                }
            }
        }

        Self {
            graph,
            node_indices,
            unresolved,
        }
    }

    /// Dependencies that name no record, in manifest order
    pub fn unresolved(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    /// Groups of records that depend on each other in a loop, including
    /// records that list themselves.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
            })
            .map(|scc| {
                let mut names: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Record names with every dependency ahead of its dependents.
    /// `None` when the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<String>> {
        let mut order = toposort(&self.graph, None).ok()?;
        // Edges point from dependent to dependency
        order.reverse();
        Some(
            order
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect(),
        )
    }

    /// Direct dependencies of `name` that resolve to records
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, petgraph::Direction::Outgoing)
    }

    /// Records that list `name` as a dependency
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, petgraph::Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: petgraph::Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RepositoryRecord;

    fn record(name: &str, deps: &[&str]) -> RepositoryRecord {
        let mut record = RepositoryRecord::new(
            name,
            format!("~/src/{}", name),
            "test",
            format!("https://github.com/foundry/{}.git", name),
        );
        record.dependencies = deps.iter().map(|d| d.to_string()).collect();
        record
    }

    #[test]
    fn test_topological_order() {
        let registry = Registry::from_records(vec![
            record("loom", &["vault", "ledger"]),
            record("ledger", &["vault"]),
            record("vault", &[]),
        ]);
        let graph = DependencyGraph::build(&registry);

        let order = graph.topological_order().unwrap();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("vault") < pos("ledger"));
        assert!(pos("ledger") < pos("loom"));
        assert!(graph.cycles().is_empty());
        assert_eq!(graph.dependencies_of("loom"), vec!["ledger", "vault"]);
        assert_eq!(graph.dependents_of("vault"), vec!["ledger", "loom"]);
    }

    #[test]
    fn test_unresolved_dependencies() {
        let registry = Registry::from_records(vec![record("loom", &["vault", "ghost"])]);
        let graph = DependencyGraph::build(&registry);

        assert_eq!(
            graph.unresolved(),
            &[
                UnresolvedDependency {
                    record: "loom".into(),
                    position: 0,
                    dependency: "vault".into(),
                },
                UnresolvedDependency {
                    record: "loom".into(),
                    position: 1,
                    dependency: "ghost".into(),
                },
            ]
        );
    }

    #[test]
    fn test_cycles() {
        let registry = Registry::from_records(vec![
            record("a", &["b"]),
            record("b", &["a"]),
            record("selfish", &["selfish"]),
            record("c", &[]),
        ]);
        let graph = DependencyGraph::build(&registry);

        assert_eq!(
            graph.cycles(),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["selfish".to_string()],
            ]
        );
        assert!(graph.topological_order().is_none());
    }
}
