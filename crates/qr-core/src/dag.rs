//! Dependency graph building and topological sorting

use crate::error::{CoreError, CoreResult};
use crate::node::NodeKind;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A node in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// What the node stands for
    pub kind: NodeKind,
}

impl GraphNode {
    /// Create a node whose display name equals its identifier
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
        }
    }

    /// Shorthand for a model node
    pub fn model(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Model)
    }

    /// Override the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Directed graph of "dependent depends on dependency" relations.
///
/// Edges are stored from dependency to dependent, so walking outgoing edges
/// visits the nodes that must run later.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Fails if a node with the same identifier already exists.
    pub fn add_node(&mut self, node: GraphNode) -> CoreResult<()> {
        if node.id.trim().is_empty() {
            return Err(CoreError::EmptyName {
                context: "dependency graph node".into(),
            });
        }
        if self.index.contains_key(&node.id) {
            return Err(CoreError::DuplicateNode { id: node.id });
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        Ok(())
    }

    /// Record that `dependent` depends on `dependency`.
    ///
    /// Both endpoints must already be nodes. Adding the same edge twice is
    /// a no-op.
    pub fn add_edge(&mut self, dependent: &str, dependency: &str) -> CoreResult<()> {
        let unknown = |missing: &str| CoreError::UnknownNode {
            dependent: dependent.to_string(),
            dependency: dependency.to_string(),
            missing: missing.to_string(),
        };
        let to = *self.index.get(dependent).ok_or_else(|| unknown(dependent))?;
        let from = *self
            .index
            .get(dependency)
            .ok_or_else(|| unknown(dependency))?;
        self.graph.update_edge(from, to, ());
        Ok(())
    }

    /// Look up a node by identifier
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Check if a node exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Direct dependencies of a node, in insertion order
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Direct dependents of a node, in insertion order
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        found.sort();
        found
            .into_iter()
            .map(|n| self.graph[n].id.as_str())
            .collect()
    }

    /// Nodes ordered so every dependency precedes its dependents.
    ///
    /// Kahn's algorithm; when several nodes are ready at once, the one added
    /// to the graph first is emitted first, so the order is stable across
    /// runs for the same input.
    pub fn topological_order(&self) -> CoreResult<Vec<&GraphNode>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(&self.graph[idx]);
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return Err(CoreError::CircularDependency {
                cycle: self.describe_cycle(),
            });
        }
        Ok(order)
    }

    /// Render one cycle as `a -> b -> a` for error reporting
    fn describe_cycle(&self) -> String {
        let component = tarjan_scc(&self.graph).into_iter().find(|scc| {
            scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
        });
        let Some(component) = component else {
            return "unknown cycle".to_string();
        };

        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let Some(&start) = component.iter().min() else {
            return "unknown cycle".to_string();
        };

        let mut path = vec![start];
        let mut current = start;
        loop {
            let next = self
                .graph
                .neighbors_directed(current, Direction::Outgoing)
                .filter(|n| members.contains(n))
                .min();
            let Some(next) = next else {
                break;
            };
            if let Some(pos) = path.iter().position(|&n| n == next) {
                path.drain(..pos);
                path.push(next);
                break;
            }
            path.push(next);
            current = next;
        }

        path.iter()
            .map(|&idx| self.graph[idx].id.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Order the graph's nodes so every dependency precedes its dependents.
///
/// Fails with [`CoreError::CircularDependency`] if the graph has a cycle.
pub fn topological_sort(graph: &DependencyGraph) -> CoreResult<Vec<&GraphNode>> {
    graph.topological_order()
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
