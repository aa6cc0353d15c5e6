//! Graph model and builder for the crate.
//!
//! This module defines the core data structures for the dependency graph
//! (`DependencyGraph`, `PackageNode`, `DependencyEdge`, `DependencyCycle`,
//! `PackageCluster`, `GraphStats`) and the builder that assembles them from
//! a flattened package list.
//!
//! You typically construct a graph via `DependencyGraph::build_from_package_list`
//! and then pass it to queries in `crate::query` or exporters in
//! `crate::visualization`.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::GraphEngineError;
use crate::manifest::{DependencyKind, PackageMetadata, PackageRecord};

pub mod analysis;
pub mod resolver;

/// Fallback version used when a record arrives without one.
const UNKNOWN_VERSION: &str = "0.0.0";

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub String);

impl PackageId {
    #[must_use]
    pub fn new(name: &str, version: &str) -> Self {
        Self(format!("{name}@{version}"))
    }

    /// Package name portion of the id (everything before the last `@`).
    ///
    /// The split is from the right so scoped names like `@scope/pkg@1.0.0`
    /// keep their leading `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit_once('@').map_or(self.0.as_str(), |(n, _)| n)
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One resolved package version in the graph.
///
/// `weight`, `depth` and the stats-facing fields are seeded at creation and
/// mutated in place by the analysis passes; a node is never removed during
/// a single build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageNode {
    pub id: PackageId,
    pub name: String,
    pub version: String,
    pub kind: DependencyKind,
    pub size: u64,
    pub weight: f64,
    pub depth: usize,
    pub vulnerability_count: u32,
    pub license: Option<String>,
    pub risk_score: f64,
    pub metadata: PackageMetadata,
    /// Names declared under optional dependencies; kept as metadata only,
    /// never wired into edges.
    pub optional_dependencies: Vec<String>,
}

/// A directed dependency relationship `from -> to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: PackageId,
    pub to: PackageId,
    pub kind: DependencyKind,
    /// Declared range, verbatim from the manifest. Never evaluated.
    pub version_range: String,
    pub weight: f64,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// A circular dependency chain, stored with its closing repeat
/// (`a -> b -> a` is kept as `[a, b, a]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyCycle {
    pub members: Vec<PackageId>,
    pub length: usize,
    pub severity: CycleSeverity,
    pub impact: f64,
}

/// A group of packages sharing an identical production-dependency target
/// signature. Only groups with at least two members are retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageCluster {
    pub members: Vec<PackageId>,
    pub cohesion: f64,
    pub coupling: f64,
    pub main_package: PackageId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub density: f64,
    pub modularity: f64,
    pub max_centrality: f64,
    pub avg_path_length: f64,
    pub connected_components: usize,
    pub diameter: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_packages: usize,
    pub total_edges: usize,
    pub max_depth: usize,
    pub cycles: Vec<DependencyCycle>,
    pub critical_packages: Vec<PackageId>,
    pub clusters: Vec<PackageCluster>,
    pub metrics: GraphMetrics,
    pub generated_at: String,
}

/// The weighted, directed dependency graph.
///
/// Nodes live in an index-addressed arena (`nodes` plus the `index` map),
/// so analysis passes mutate one node at a time through its slot without
/// aliasing shared references. Edges live in an adjacency list keyed by
/// source id, insertion order preserved.
///
/// Once `build_from_package_list` returns, the graph is an immutable
/// snapshot: queries and exporters only read it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: Vec<PackageNode>,
    // Derived from `nodes`; skipped in serialization since the graph is
    // never re-loaded (persistence across runs is out of scope).
    #[serde(skip, default)]
    index: HashMap<PackageId, usize>,
    adjacency: HashMap<PackageId, Vec<DependencyEdge>>,
    stats: GraphStats,
}

impl DependencyGraph {
    /// Build the graph from a flattened package list and run every
    /// analysis pass, in order: nodes, edges, depth, weight, cycles,
    /// critical ranking, clusters, metrics, stats totals.
    ///
    /// Unresolvable dependency targets are silently dropped (no edge, no
    /// error): the builder does not fail on incomplete package lists.
    ///
    /// # Errors
    /// Returns `GraphEngineError::InvalidInput` when a record has an empty
    /// name, before any node is created. This is the only failure path; an
    /// error therefore never leaves a partially built graph behind.
    pub fn build_from_package_list(
        packages: &[PackageRecord],
    ) -> Result<Self, GraphEngineError> {
        if let Some(pos) = packages.iter().position(|p| p.name.trim().is_empty()) {
            return Err(GraphEngineError::InvalidInput(format!(
                "package record #{pos} has an empty name"
            )));
        }

        let mut graph = Self::default();
        graph.add_nodes(packages);
        graph.add_edges(packages);

        tracing::debug!(
            packages = graph.nodes.len(),
            edges = graph.edge_count(),
            "graph assembled, running analysis passes"
        );
        graph.analyze();
        graph.finalize_stats();
        Ok(graph)
    }

    /// Node pass: create or overwrite one node per record, keyed by
    /// `name@version` (last write wins, keeping the original arena slot).
    fn add_nodes(&mut self, packages: &[PackageRecord]) {
        for rec in packages {
            let version =
                if rec.version.trim().is_empty() { UNKNOWN_VERSION } else { rec.version.as_str() };
            let id = PackageId::new(&rec.name, version);
            let node = PackageNode {
                id: id.clone(),
                name: rec.name.clone(),
                version: version.to_string(),
                kind: rec.dependency_type,
                size: rec.size,
                weight: 1.0,
                depth: 0,
                vulnerability_count: rec.vulnerability_count,
                license: rec.license.clone(),
                risk_score: rec.risk_score.clamp(0.0, 10.0),
                metadata: rec.metadata.clone(),
                optional_dependencies: rec.optional_dependencies.keys().cloned().collect(),
            };
            match self.index.get(&id) {
                Some(&slot) => self.nodes[slot] = node,
                None => {
                    self.index.insert(id, self.nodes.len());
                    self.nodes.push(node);
                }
            }
        }
    }

    /// Edge pass: wire production/dev/peer dependency maps through the
    /// name-only resolver. Optional dependencies stay metadata.
    fn add_edges(&mut self, packages: &[PackageRecord]) {
        let resolved: Vec<DependencyEdge> = {
            let res = resolver::NameResolver::new(self);
            let mut edges = Vec::new();
            for rec in packages {
                let version = if rec.version.trim().is_empty() {
                    UNKNOWN_VERSION
                } else {
                    rec.version.as_str()
                };
                let from = PackageId::new(&rec.name, version);
                let maps = [
                    (&rec.dependencies, DependencyKind::Production),
                    (&rec.dev_dependencies, DependencyKind::Dev),
                    (&rec.peer_dependencies, DependencyKind::Peer),
                ];
                for (map, kind) in maps {
                    for (dep_name, range) in map {
                        let Some(to) = res.resolve(dep_name) else {
                            tracing::trace!(from = %from, target = %dep_name, "unresolved dependency dropped");
                            continue;
                        };
                        edges.push(DependencyEdge {
                            from: from.clone(),
                            to,
                            kind,
                            version_range: range.clone(),
                            weight: resolver::edge_weight(kind),
                            optional: kind == DependencyKind::Optional,
                        });
                    }
                }
            }
            edges
        };
        for edge in resolved {
            self.adjacency.entry(edge.from.clone()).or_default().push(edge);
        }
    }

    /// Stats pass: totals and generation timestamp. The analysis passes
    /// have already filled cycles/critical/clusters/metrics.
    fn finalize_stats(&mut self) {
        self.stats.total_packages = self.nodes.len();
        self.stats.total_edges = self.edge_count();
        // Seconds since epoch, without extra deps
        self.stats.generated_at =
            match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
                Ok(d) => format!("{}", d.as_secs()),
                Err(_) => "0".to_string(),
            };
    }

    // Read-only surface consumed by queries, exporters and reporters.

    #[must_use]
    pub fn package(&self, id: &PackageId) -> Option<&PackageNode> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    #[must_use]
    pub fn packages(&self) -> &[PackageNode] {
        &self.nodes
    }

    #[must_use]
    pub fn package_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edges_from(&self, id: &PackageId) -> &[DependencyEdge] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn adjacency(&self) -> &HashMap<PackageId, Vec<DependencyEdge>> {
        &self.adjacency
    }

    /// Iterate every edge in the graph, grouped by source id.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.adjacency.values().flatten()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }
}
