//! Kind tags for dependency-graph nodes.

use serde::{Deserialize, Serialize};

/// What a node in the dependency graph stands for.
///
/// The execution engine only schedules [`NodeKind::Model`] nodes; the other
/// kinds exist so callers can place sources and seeds in the same graph for
/// lineage display without them being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// SQL transformation model
    #[default]
    Model,
    /// External source table
    Source,
    /// Seed data table
    Seed,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Model => write!(f, "model"),
            NodeKind::Source => write!(f, "source"),
            NodeKind::Seed => write!(f, "seed"),
        }
    }
}
