//! The resolved library graph.
//!
//! Once the walker has finished, a `LibraryManager` is read-only. Lookups
//! by name ignore ASCII case.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::core::RuntimeLibrary;

/// Read access to a resolved library graph.
pub trait LibraryGraph: Send + Sync {
    /// The library named `name`, if it is part of the graph.
    fn get_library(&self, name: &str) -> Option<&RuntimeLibrary>;

    /// `name` and its transitive dependencies, root first, each library once.
    fn get_library_dependencies(&self, name: &str) -> Vec<&RuntimeLibrary>;

    /// Every library, in discovery order.
    fn libraries(&self) -> &[RuntimeLibrary];
}

/// The resolved dependency graph of one root.
#[derive(Debug, Clone, Default)]
pub struct LibraryManager {
    /// Library graph; node weights index into `libraries`
    graph: DiGraph<usize, ()>,

    libraries: Vec<RuntimeLibrary>,

    /// Lowercased name to node
    by_name: HashMap<String, NodeIndex>,
}

impl LibraryManager {
    pub fn new() -> Self {
        LibraryManager::default()
    }

    /// Add a library. The first library with a given name wins; later ones
    /// are ignored.
    pub fn add_library(&mut self, library: RuntimeLibrary) -> bool {
        let key = library.name().to_ascii_lowercase();
        if self.by_name.contains_key(&key) {
            return false;
        }

        let node = self.graph.add_node(self.libraries.len());
        self.libraries.push(library);
        self.by_name.insert(key, node);
        true
    }

    /// Record that `from` depends on `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if let (Some(from_node), Some(to_node)) = (self.node(from), self.node(to)) {
            if !self.graph.contains_edge(from_node, to_node) {
                self.graph.add_edge(from_node, to_node, ());
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Direct dependencies of `name` that are part of the graph.
    pub fn deps(&self, name: &str) -> Vec<&RuntimeLibrary> {
        let Some(node) = self.node(name) else {
            return Vec::new();
        };

        let mut deps: Vec<_> = self
            .graph
            .neighbors(node)
            .map(|n| &self.libraries[self.graph[n]])
            .collect();
        // neighbors() yields the most recent edge first
        deps.reverse();
        deps
    }

    /// Libraries that failed to resolve or are incompatible with the target.
    pub fn problems(&self) -> impl Iterator<Item = &RuntimeLibrary> {
        self.libraries
            .iter()
            .filter(|lib| !lib.is_resolved() || !lib.is_compatible())
    }

    fn node(&self, name: &str) -> Option<NodeIndex> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }
}

impl LibraryGraph for LibraryManager {
    fn get_library(&self, name: &str) -> Option<&RuntimeLibrary> {
        self.node(name).map(|node| &self.libraries[self.graph[node]])
    }

    fn get_library_dependencies(&self, name: &str) -> Vec<&RuntimeLibrary> {
        let Some(root) = self.node(name) else {
            return Vec::new();
        };

        let mut closure = Vec::new();
        let mut dfs = Dfs::new(&self.graph, root);
        while let Some(node) = dfs.next(&self.graph) {
            closure.push(&self.libraries[self.graph[node]]);
        }
        closure
    }

    fn libraries(&self) -> &[RuntimeLibrary] {
        &self.libraries
    }
}
