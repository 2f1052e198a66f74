//! Dependency graph management using `petgraph`.
//!
//! One directed acyclic graph carries every ordering constraint between
//! declarations: parent-before-child, explicit `depends_on` edges, and the
//! producer-before-consumer edges implied by output references.

use std::collections::HashMap;

use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::Urn;

/// Why one declaration must exist before another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// The dependency is the dependent's parent.
    Parent,
    /// The dependent lists the dependency in `depends_on`.
    Explicit,
    /// The dependent reads one of the dependency's outputs.
    Reference,
}

impl EdgeKind {
    /// Short label used in listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Explicit => "explicit",
            Self::Reference => "reference",
        }
    }
}

/// A single edge: `dependent` must wait for `dependency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Declaration that must exist first.
    pub dependency: Urn,
    /// Declaration that waits.
    pub dependent: Urn,
    /// Origin of the constraint.
    pub kind: EdgeKind,
}

/// A dependency graph of declarations.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: Graph<Urn, EdgeKind>,
    nodes: HashMap<Urn, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            nodes: HashMap::new(),
        }
    }

    /// Adds a declaration node, returning the existing index if present.
    pub fn add_resource(&mut self, urn: &Urn) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(urn) {
            return idx;
        }
        let idx = self.graph.add_node(urn.clone());
        let _ = self.nodes.insert(urn.clone(), idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    /// Duplicate edges of the same kind are collapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if either node has not been added.
    pub fn add_dependency(
        &mut self,
        dependent: &Urn,
        dependency: &Urn,
        kind: EdgeKind,
    ) -> Result<()> {
        let to = self.index(dependent)?;
        let from = self.index(dependency)?;
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|e| *e.weight() == kind);
        if !exists {
            let _ = self.graph.add_edge(from, to, kind);
        }
        Ok(())
    }

    fn index(&self, urn: &Urn) -> Result<NodeIndex> {
        self.nodes
            .get(urn)
            .copied()
            .ok_or_else(|| StackwrightError::UnknownResource {
                urn: urn.to_string(),
            })
    }

    /// Returns a topological ordering of declarations.
    ///
    /// Dependencies appear before the declarations that depend on them.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<Urn>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(_cycle) => Err(StackwrightError::Cycle),
        }
    }

    /// Returns `true` if an edge of `kind` runs from `dependency` to `dependent`.
    #[must_use]
    pub fn has_edge(&self, dependent: &Urn, dependency: &Urn, kind: EdgeKind) -> bool {
        let (Ok(to), Ok(from)) = (self.index(dependent), self.index(dependency)) else {
            return false;
        };
        self.graph
            .edges_connecting(from, to)
            .any(|e| *e.weight() == kind)
    }

    /// Direct dependencies of `urn` with the kind of each edge.
    #[must_use]
    pub fn dependencies_of(&self, urn: &Urn) -> Vec<(Urn, EdgeKind)> {
        let Ok(idx) = self.index(urn) else {
            return Vec::new();
        };
        let mut deps: Vec<(Urn, EdgeKind)> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .map(|e| (self.graph[e.source()].clone(), *e.weight()))
            .collect();
        deps.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));
        deps
    }

    /// Every edge in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|e| Edge {
                dependency: self.graph[e.source()].clone(),
                dependent: self.graph[e.target()].clone(),
                kind: *e.weight(),
            })
            .collect()
    }

    /// Number of declaration nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
