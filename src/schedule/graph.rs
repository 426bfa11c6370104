//! Dependency graph over resource kinds
//!
//! An edge `K1 -> K2` means every entity of `K1` must finish processing
//! before any entity of `K2` starts. Edges are added incrementally (static
//! declarations first, implied edges during discovery); an edge that would
//! close a cycle is rejected at insertion time so execution can assume a
//! DAG.

use std::collections::HashSet;

use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use thiserror::Error;

use crate::resource::Kind;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown kind {0} referenced by a dependency edge")]
    UnknownKind(Kind),

    #[error("dependency edge {from} -> {to} would create a cycle")]
    WouldCycle { from: Kind, to: Kind },

    #[error("dependency cycle between kinds: {}", format_kinds(.0))]
    CycleDetected(Vec<Kind>),
}

fn format_kinds(kinds: &[Kind]) -> String {
    kinds
        .iter()
        .map(Kind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Directed acyclic graph whose vertices are resource kinds.
#[derive(Debug, Default)]
pub struct KindGraph {
    g: DiGraphMap<Kind, ()>,
}

impl KindGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_kind(&mut self, kind: Kind) {
        self.g.add_node(kind);
    }

    pub fn contains(&self, kind: Kind) -> bool {
        self.g.contains_node(kind)
    }

    /// Add an ordering edge: all of `before` completes ahead of `after`.
    ///
    /// Re-adding an existing edge is a no-op. An edge that would close a
    /// cycle (including a self-edge) is an error.
    pub fn add_edge(&mut self, before: Kind, after: Kind) -> Result<(), GraphError> {
        if !self.g.contains_node(before) {
            return Err(GraphError::UnknownKind(before));
        }
        if !self.g.contains_node(after) {
            return Err(GraphError::UnknownKind(after));
        }
        if before == after {
            return Err(GraphError::WouldCycle {
                from: before,
                to: after,
            });
        }
        if self.g.contains_edge(before, after) {
            return Ok(());
        }
        if has_path_connecting(&self.g, after, before, None) {
            return Err(GraphError::WouldCycle {
                from: before,
                to: after,
            });
        }
        self.g.add_edge(before, after, ());
        Ok(())
    }

    /// All kinds that must complete before `kind` may start, transitively.
    pub fn ancestors(&self, kind: Kind) -> HashSet<Kind> {
        let mut seen = HashSet::new();
        let mut stack: Vec<Kind> = self
            .g
            .neighbors_directed(kind, Direction::Incoming)
            .collect();
        while let Some(k) = stack.pop() {
            if seen.insert(k) {
                stack.extend(self.g.neighbors_directed(k, Direction::Incoming));
            }
        }
        seen
    }

    /// Kinds with no ancestors; these may start immediately.
    pub fn roots(&self) -> Vec<Kind> {
        self.g
            .nodes()
            .filter(|&k| {
                self.g
                    .neighbors_directed(k, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.g.nodes()
    }

    pub fn len(&self) -> usize {
        self.g.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.g.node_count() == 0
    }

    /// Verify the whole graph is acyclic, naming the participating kinds
    /// on failure. Incremental edge insertion already maintains this, so a
    /// failure here indicates a bug rather than bad input.
    pub fn ensure_acyclic(&self) -> Result<(), GraphError> {
        for scc in tarjan_scc(&self.g) {
            if scc.len() > 1 {
                return Err(GraphError::CycleDetected(scc));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Kind = Kind::new("Test::A");
    const B: Kind = Kind::new("Test::B");
    const C: Kind = Kind::new("Test::C");

    fn graph(kinds: &[Kind]) -> KindGraph {
        let mut g = KindGraph::new();
        for &k in kinds {
            g.add_kind(k);
        }
        g
    }

    #[test]
    fn duplicate_edge_is_a_noop() {
        let mut g = graph(&[A, B]);
        g.add_edge(A, B).unwrap();
        g.add_edge(A, B).unwrap();
        assert_eq!(g.ancestors(B), HashSet::from([A]));
    }

    #[test]
    fn edge_closing_a_cycle_is_rejected() {
        let mut g = graph(&[A, B, C]);
        g.add_edge(A, B).unwrap();
        g.add_edge(B, C).unwrap();
        let err = g.add_edge(C, A).unwrap_err();
        assert!(matches!(err, GraphError::WouldCycle { from: C, to: A }));
        // graph stays usable and acyclic
        g.ensure_acyclic().unwrap();
    }

    #[test]
    fn self_edge_is_rejected() {
        let mut g = graph(&[A]);
        assert!(matches!(
            g.add_edge(A, A),
            Err(GraphError::WouldCycle { .. })
        ));
    }

    #[test]
    fn edge_to_unknown_kind_is_rejected() {
        let mut g = graph(&[A]);
        assert!(matches!(g.add_edge(A, B), Err(GraphError::UnknownKind(B))));
        assert!(matches!(g.add_edge(B, A), Err(GraphError::UnknownKind(B))));
    }

    #[test]
    fn ancestors_are_transitive() {
        let mut g = graph(&[A, B, C]);
        g.add_edge(A, B).unwrap();
        g.add_edge(B, C).unwrap();
        assert_eq!(g.ancestors(C), HashSet::from([A, B]));
        assert_eq!(g.ancestors(A), HashSet::new());
    }

    #[test]
    fn roots_have_no_incoming_edges() {
        let mut g = graph(&[A, B, C]);
        g.add_edge(A, B).unwrap();
        let mut roots = g.roots();
        roots.sort();
        assert_eq!(roots, vec![A, C]);
    }
}
