//! Dependency target resolution.
//!
//! Targets are matched by package name only: the first node (in arena
//! order, i.e. input order) whose name matches wins, regardless of which
//! version range was declared. Swapping in real semantic-version range
//! matching later means replacing this resolver and nothing else.

use std::collections::HashMap;

use crate::graph::{DependencyGraph, PackageId};
use crate::manifest::DependencyKind;

/// Relationship-kind weight applied to every edge of that kind.
#[must_use]
pub fn edge_weight(kind: DependencyKind) -> f64 {
    match kind {
        DependencyKind::Production => 1.0,
        DependencyKind::Peer => 0.8,
        DependencyKind::Dev => 0.5,
        DependencyKind::Optional => 0.3,
    }
}

pub struct NameResolver<'a> {
    // name -> id of the first node carrying that name
    by_name: HashMap<&'a str, &'a PackageId>,
}

impl<'a> NameResolver<'a> {
    #[must_use]
    pub fn new(graph: &'a DependencyGraph) -> Self {
        let mut by_name: HashMap<&str, &PackageId> =
            HashMap::with_capacity(graph.package_count());
        for node in graph.packages() {
            by_name.entry(node.name.as_str()).or_insert(&node.id);
        }
        Self { by_name }
    }

    /// Resolve a declared dependency name to a node id, or `None` when no
    /// package with that name exists in the graph.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<PackageId> {
        self.by_name.get(name).map(|&id| id.clone())
    }
}
