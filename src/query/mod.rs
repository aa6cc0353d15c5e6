use serde::Serialize;
use std::collections::HashMap;

use crate::graph::{
    CycleSeverity, DependencyCycle, DependencyGraph, GraphStats, PackageCluster, PackageId,
};

/// Query trait implemented by all query types.
///
/// Given an immutable reference to a `DependencyGraph`, returns a result of
/// type `R`. Queries never mutate the graph.
pub trait Query<R> {
    fn run(&self, graph: &DependencyGraph) -> R;
}

/// Return the full stats record computed at build time.
pub struct StatsQuery;

impl Query<GraphStats> for StatsQuery {
    fn run(&self, graph: &DependencyGraph) -> GraphStats {
        graph.stats().clone()
    }
}

/// One row of the critical-package listing.
#[derive(Debug, Serialize)]
pub struct CriticalPackageRow {
    pub id: String,
    pub name: String,
    pub version: String,
    pub weight: f64,
    pub depth: usize,
}

/// List the critical packages selected by the ranking pass, in rank order.
pub struct CriticalPackagesQuery;

impl Query<Vec<CriticalPackageRow>> for CriticalPackagesQuery {
    fn run(&self, graph: &DependencyGraph) -> Vec<CriticalPackageRow> {
        graph
            .stats()
            .critical_packages
            .iter()
            .filter_map(|id| graph.package(id))
            .map(|node| CriticalPackageRow {
                id: node.id.0.clone(),
                name: node.name.clone(),
                version: node.version.clone(),
                weight: node.weight,
                depth: node.depth,
            })
            .collect()
    }
}

/// List discovered cycles, optionally only those at or above a severity.
pub struct CyclesQuery {
    pub min_severity: Option<CycleSeverity>,
}

impl CyclesQuery {
    #[must_use]
    pub fn new(min_severity: Option<CycleSeverity>) -> Self {
        Self { min_severity }
    }
}

fn severity_rank(severity: CycleSeverity) -> u8 {
    match severity {
        CycleSeverity::Critical => 3,
        CycleSeverity::High => 2,
        CycleSeverity::Medium => 1,
        CycleSeverity::Low => 0,
    }
}

impl Query<Vec<DependencyCycle>> for CyclesQuery {
    fn run(&self, graph: &DependencyGraph) -> Vec<DependencyCycle> {
        let floor = self.min_severity.map_or(0, severity_rank);
        graph
            .stats()
            .cycles
            .iter()
            .filter(|c| severity_rank(c.severity) >= floor)
            .cloned()
            .collect()
    }
}

/// List discovered clusters.
pub struct ClustersQuery;

impl Query<Vec<PackageCluster>> for ClustersQuery {
    fn run(&self, graph: &DependencyGraph) -> Vec<PackageCluster> {
        graph.stats().clusters.clone()
    }
}

/// Metric for degree centrality used by `HubsQuery`.
pub enum CentralityMetric {
    In,
    Out,
    Total,
}

/// Compute top-N packages by degree centrality.
pub struct HubsQuery {
    pub metric: CentralityMetric,
    pub top: usize,
}

impl HubsQuery {
    /// Create a hubs query for the given metric and number of results.
    #[must_use]
    pub fn new(metric: CentralityMetric, top: usize) -> Self {
        Self { metric, top }
    }
}

impl Query<Vec<(PackageId, usize, usize)>> for HubsQuery {
    fn run(&self, graph: &DependencyGraph) -> Vec<(PackageId, usize, usize)> {
        let mut indeg: HashMap<&PackageId, usize> = HashMap::new();
        let mut outdeg: HashMap<&PackageId, usize> = HashMap::new();
        for edge in graph.edges() {
            *outdeg.entry(&edge.from).or_default() += 1;
            *indeg.entry(&edge.to).or_default() += 1;
        }

        let mut rows: Vec<(PackageId, usize, usize)> = graph
            .packages()
            .iter()
            .map(|node| {
                (
                    node.id.clone(),
                    indeg.get(&node.id).copied().unwrap_or(0),
                    outdeg.get(&node.id).copied().unwrap_or(0),
                )
            })
            .collect();

        // Sort by chosen metric desc, then by id asc for stability
        rows.sort_by(|a, b| {
            let ak = match self.metric {
                CentralityMetric::In => a.1,
                CentralityMetric::Out => a.2,
                CentralityMetric::Total => a.1 + a.2,
            };
            let bk = match self.metric {
                CentralityMetric::In => b.1,
                CentralityMetric::Out => b.2,
                CentralityMetric::Total => b.1 + b.2,
            };
            bk.cmp(&ak).then_with(|| a.0.cmp(&b.0))
        });

        rows.truncate(self.top);
        rows
    }
}

// Detailed info for a single package id
#[derive(Debug, Serialize)]
pub struct PackageRelationEntry {
    pub id: String,
    pub kind: String,
    pub version_range: String,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct PackageInfoResult {
    pub id: String,
    pub name: String,
    pub version: String,
    pub kind: String,
    pub weight: f64,
    pub depth: usize,
    pub size: u64,
    pub license: Option<String>,
    pub vulnerability_count: u32,
    pub risk_score: f64,
    pub dependents: Vec<PackageRelationEntry>,
    pub dependencies: Vec<PackageRelationEntry>,
}

pub struct PackageInfoQuery {
    pub id: PackageId,
}

impl PackageInfoQuery {
    #[must_use]
    pub fn new(id: PackageId) -> Self {
        Self { id }
    }
}

impl Query<Option<PackageInfoResult>> for PackageInfoQuery {
    fn run(&self, graph: &DependencyGraph) -> Option<PackageInfoResult> {
        let node = graph.package(&self.id)?;

        let kind_label = |k: crate::manifest::DependencyKind| -> String {
            match k {
                crate::manifest::DependencyKind::Production => "production",
                crate::manifest::DependencyKind::Dev => "dev",
                crate::manifest::DependencyKind::Peer => "peer",
                crate::manifest::DependencyKind::Optional => "optional",
            }
            .to_string()
        };

        let dependencies: Vec<PackageRelationEntry> = graph
            .edges_from(&self.id)
            .iter()
            .map(|e| PackageRelationEntry {
                id: e.to.0.clone(),
                kind: kind_label(e.kind),
                version_range: e.version_range.clone(),
                weight: e.weight,
            })
            .collect();

        let mut dependents: Vec<PackageRelationEntry> = graph
            .edges()
            .filter(|e| e.to == self.id)
            .map(|e| PackageRelationEntry {
                id: e.from.0.clone(),
                kind: kind_label(e.kind),
                version_range: e.version_range.clone(),
                weight: e.weight,
            })
            .collect();
        // Adjacency map order is arbitrary for inbound edges; pin it.
        dependents.sort_by(|a, b| a.id.cmp(&b.id));

        Some(PackageInfoResult {
            id: node.id.0.clone(),
            name: node.name.clone(),
            version: node.version.clone(),
            kind: kind_label(node.kind),
            weight: node.weight,
            depth: node.depth,
            size: node.size,
            license: node.license.clone(),
            vulnerability_count: node.vulnerability_count,
            risk_score: node.risk_score,
            dependents,
            dependencies,
        })
    }
}
