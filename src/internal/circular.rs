//! Registration-time cycle detection.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Static dependency graph: abstract type -> constructor parameter types.
///
/// Kept acyclic at all times. Edges may point at types that are not
/// registered (yet); those are leaves.
#[derive(Default)]
pub(crate) struct DependencyGraph {
    edges: HashMap<Key, Vec<Key>>,
}

impl DependencyGraph {
    /// Records `service -> dependencies`, or rejects it if `service` would
    /// become reachable from itself. Nothing is recorded on rejection.
    pub(crate) fn register(&mut self, service: Key, dependencies: Vec<Key>) -> DiResult<()> {
        if let Some(cycle) = self.find_cycle(&service, &dependencies) {
            let path: Vec<&'static str> = cycle.iter().map(Key::display_name).collect();
            debug!(service = service.display_name(), path = %path.join(" -> "), "registration rejected: cycle");
            return Err(DiError::CyclicDependency(path));
        }
        self.edges.insert(service, dependencies);
        Ok(())
    }

    pub(crate) fn dependencies_of(&self, service: &Key) -> &[Key] {
        self.edges.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Path `service -> ... -> service` through the committed edges plus
    /// the candidate ones, if any.
    fn find_cycle(&self, service: &Key, dependencies: &[Key]) -> Option<Vec<Key>> {
        let mut visited = HashSet::new();
        let mut path = vec![*service];
        for dependency in dependencies {
            if self.dfs(dependency, service, &mut visited, &mut path) {
                return Some(path);
            }
        }
        None
    }

    fn dfs(
        &self,
        current: &Key,
        target: &Key,
        visited: &mut HashSet<Key>,
        path: &mut Vec<Key>,
    ) -> bool {
        path.push(*current);
        if current == target {
            return true;
        }
        if visited.insert(*current) {
            for next in self.dependencies_of(current) {
                if self.dfs(next, target, visited, path) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }
}
