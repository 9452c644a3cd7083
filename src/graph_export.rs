//! Graph export for dependency visualization.
//!
//! A [`GraphSnapshot`] captures the container's bindings and the constructor
//! edges recorded for cycle detection. It renders to DOT and Mermaid
//! directly, and to JSON with the `graph-export` feature.

use std::collections::HashMap;
use std::fmt::Write;

#[cfg(feature = "graph-export")]
use serde::Serialize;

use crate::descriptors::ServiceDescriptor;
use crate::lifetime::Lifetime;

/// A registered abstract type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphNode {
    /// Display name of the abstract type
    pub id: &'static str,
    pub lifetime: Lifetime,
    /// Concrete type name, when fixed
    pub implementation: Option<&'static str>,
}

/// `from` takes a constructor parameter of type `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphEdge {
    pub from: &'static str,
    pub to: &'static str,
}

/// Dependency graph of a container at one point in time.
///
/// Edges may point at types that are not (yet) registered.
///
/// ```rust
/// use scopewire::{constructor, Container};
/// use std::sync::Arc;
///
/// struct Config;
/// struct Server {
///     config: Arc<Config>,
/// }
///
/// impl Server {
///     fn new(config: Arc<Config>) -> Self {
///         Server { config }
///     }
/// }
///
/// constructor!(Server => Server::new(Config));
///
/// let mut container = Container::new();
/// container.bind::<Server>().unwrap().to_singleton::<Server>().unwrap();
///
/// let graph = container.dependency_graph();
/// assert_eq!(graph.nodes.len(), 1);
/// assert_eq!(graph.edges.len(), 1);
/// assert!(graph.edges[0].to.ends_with("Config"));
/// assert!(graph.to_dot().starts_with("digraph DependencyGraph {"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub(crate) fn from_descriptors(descriptors: &[ServiceDescriptor]) -> Self {
        let mut snapshot = GraphSnapshot::default();
        for descriptor in descriptors {
            snapshot.nodes.push(GraphNode {
                id: descriptor.type_name(),
                lifetime: descriptor.lifetime,
                implementation: descriptor.implementation,
            });
            snapshot.edges.extend(descriptor.dependencies.iter().map(|dependency| GraphEdge {
                from: descriptor.type_name(),
                to: dependency.display_name(),
            }));
        }
        snapshot
    }

    /// Renders the graph in Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph DependencyGraph {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in &self.nodes {
            let _ = writeln!(
                output,
                "  \"{}\" [label=\"{}\\n({})\", fillcolor={}, style=filled];",
                node.id,
                node.id,
                node.lifetime,
                fill_color(node.lifetime)
            );
        }

        output.push('\n');

        for edge in &self.edges {
            let _ = writeln!(output, "  \"{}\" -> \"{}\";", edge.from, edge.to);
        }

        output.push_str("}\n");
        output
    }

    /// Renders the graph as a Mermaid flowchart.
    ///
    /// Type names are not valid Mermaid identifiers, so nodes get positional
    /// ids and carry the name as their label.
    pub fn to_mermaid(&self) -> String {
        let mut ids: HashMap<&'static str, usize> = HashMap::new();
        let mut output = String::from("graph TD\n");

        for node in &self.nodes {
            let id = ids.len();
            ids.insert(node.id, id);
            let _ = writeln!(output, "  n{}[\"{}\"]", id, node.id);
        }
        // Unregistered edge targets.
        for edge in &self.edges {
            if !ids.contains_key(edge.to) {
                let id = ids.len();
                ids.insert(edge.to, id);
                let _ = writeln!(output, "  n{}[\"{}\"]", id, edge.to);
            }
        }

        for edge in &self.edges {
            if let (Some(from), Some(to)) = (ids.get(edge.from), ids.get(edge.to)) {
                let _ = writeln!(output, "  n{from} --> n{to}");
            }
        }

        output.push_str("\n  classDef singleton fill:#e1f5fe\n");
        output.push_str("  classDef scoped fill:#e8f5e8\n");
        output.push_str("  classDef transient fill:#fff3e0\n");

        for node in &self.nodes {
            let class = match node.lifetime {
                Lifetime::Singleton => "singleton",
                Lifetime::Scoped => "scoped",
                Lifetime::Transient => "transient",
                _ => continue,
            };
            if let Some(id) = ids.get(node.id) {
                let _ = writeln!(output, "  class n{id} {class}");
            }
        }

        output
    }

    /// Serializes the graph as pretty-printed JSON.
    #[cfg(feature = "graph-export")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn fill_color(lifetime: Lifetime) -> &'static str {
    match lifetime {
        Lifetime::Singleton => "lightblue",
        Lifetime::Scoped => "lightgreen",
        Lifetime::Transient => "lightyellow",
        Lifetime::Instance => "lightgrey",
        Lifetime::ScopeContext => "white",
    }
}
