//! Dependency collection as a side effect of rendering `ref()`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

/// Receives "model depends on dependency" facts discovered while rendering.
///
/// The renderer only sees this trait, never the dependency graph itself.
pub trait DependencyCollector: Send + Sync {
    /// Record that `model` depends on `dependency`
    fn record(&self, model: &str, dependency: &str);
}

/// Thread-safe collector that remembers every recorded edge.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    edges: Mutex<BTreeMap<String, BTreeSet<String>>>,
}

impl DependencyTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Dependencies recorded for `model`, sorted
    pub fn dependencies_of(&self, model: &str) -> Vec<String> {
        self.edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every recorded `(model, dependency)` pair, sorted
    pub fn edges(&self) -> Vec<(String, String)> {
        self.edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flat_map(|(model, deps)| deps.iter().map(move |d| (model.clone(), d.clone())))
            .collect()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DependencyCollector for DependencyTracker {
    fn record(&self, model: &str, dependency: &str) {
        log::debug!("Recorded dependency {} -> {}", model, dependency);
        self.edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(model.to_string())
            .or_default()
            .insert(dependency.to_string());
    }
}
