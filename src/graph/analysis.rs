//! Structural analysis passes.
//!
//! Invoked by the builder in a fixed order: depth, weight, cycles,
//! critical ranking, clusters, metrics. The order matters — the ranking
//! pass reads `max_depth` from the depth pass and cycle impact reads node
//! weights from the weight pass.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

use super::{
    CycleSeverity, DependencyCycle, DependencyGraph, GraphMetrics, PackageCluster, PackageId,
};
use crate::manifest::DependencyKind;

impl DependencyGraph {
    pub(crate) fn analyze(&mut self) {
        self.assign_depths();
        self.assign_weights();
        self.detect_cycles();
        self.rank_critical_packages();
        self.discover_clusters();
        self.compute_metrics();
    }

    // Project the adjacency list onto arena slots. Scanned in arena order
    // so every pass sees edges in the same, reproducible sequence.
    fn slot_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (u, node) in self.nodes.iter().enumerate() {
            for edge in self.adjacency.get(&node.id).into_iter().flatten() {
                if let Some(&v) = self.index.get(&edge.to) {
                    adj[u].push(v);
                }
            }
        }
        adj
    }

    fn in_degrees(adj: &[Vec<usize>]) -> Vec<usize> {
        let mut indeg = vec![0usize; adj.len()];
        for targets in adj {
            for &v in targets {
                indeg[v] += 1;
            }
        }
        indeg
    }

    /// Depth pass: multi-source BFS from every in-degree-zero node, first
    /// visit wins. Roots are taken in id order so assignment is
    /// reproducible across runs. Nodes unreachable from any root (pure
    /// cycles with no entry point) keep the seeded depth of 0.
    fn assign_depths(&mut self) {
        let adj = self.slot_adjacency();
        let n = self.nodes.len();
        let indeg = Self::in_degrees(&adj);

        let mut roots: Vec<usize> = (0..n).filter(|&u| indeg[u] == 0).collect();
        roots.sort_by(|&a, &b| self.nodes[a].id.cmp(&self.nodes[b].id));

        let mut visited = vec![false; n];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for u in roots {
            visited[u] = true;
            self.nodes[u].depth = 0;
            queue.push_back(u);
        }
        while let Some(u) = queue.pop_front() {
            let next_depth = self.nodes[u].depth + 1;
            for &v in &adj[u] {
                if !visited[v] {
                    visited[v] = true;
                    self.nodes[v].depth = next_depth;
                    queue.push_back(v);
                }
            }
        }

        self.stats.max_depth = self.nodes.iter().map(|node| node.depth).max().unwrap_or(0);
        tracing::debug!(max_depth = self.stats.max_depth, "depth pass complete");
    }

    /// Weight pass: plain degree centrality, `(in + out) / 2`, floored at
    /// 1.0 for isolated nodes.
    fn assign_weights(&mut self) {
        let adj = self.slot_adjacency();
        let indeg = Self::in_degrees(&adj);
        for u in 0..self.nodes.len() {
            let w = (indeg[u] + adj[u].len()) as f64 / 2.0;
            self.nodes[u].weight = if w == 0.0 { 1.0 } else { w };
        }
    }

    /// Cycle pass: DFS with an on-stack marker and a running path, entered
    /// once per unvisited node so disconnected subgraphs are covered too.
    /// Every discovered cycle is retained; cycles reachable from several
    /// entry points may appear more than once, which downstream scoring
    /// treats as signal amplification rather than noise.
    fn detect_cycles(&mut self) {
        let n = self.nodes.len();
        let adj = self.slot_adjacency();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];
        let mut path: Vec<usize> = Vec::new();
        let mut found: Vec<Vec<usize>> = Vec::new();

        for u in 0..n {
            if !visited[u] {
                dfs_cycles(u, &adj, &mut visited, &mut on_stack, &mut path, &mut found);
            }
        }

        self.stats.cycles = found
            .into_iter()
            .map(|slots| {
                let members: Vec<PackageId> =
                    slots.iter().map(|&u| self.nodes[u].id.clone()).collect();
                let length = members.len();
                let avg_weight =
                    slots.iter().map(|&u| self.nodes[u].weight).sum::<f64>() / length as f64;
                let impact = avg_weight * (1.0 / length as f64) * 10.0;
                DependencyCycle {
                    members,
                    length,
                    severity: severity_for_length(length),
                    impact,
                }
            })
            .collect();
        if !self.stats.cycles.is_empty() {
            tracing::debug!(cycles = self.stats.cycles.len(), "circular dependencies found");
        }
    }

    /// Ranking pass: composite criticality score per node, scored in
    /// parallel and merged back in arena order before the final sort, so
    /// the ranking is independent of scheduling. Keeps the top
    /// `max(round(0.1·N), min(5, N))` ids.
    fn rank_critical_packages(&mut self) {
        let n = self.nodes.len();
        if n == 0 {
            self.stats.critical_packages = Vec::new();
            return;
        }
        let adj = self.slot_adjacency();
        let indeg = Self::in_degrees(&adj);
        let max_depth = self.stats.max_depth;
        let nodes = &self.nodes;

        let mut scored: Vec<(PackageId, f64)> = (0..n)
            .into_par_iter()
            .map(|u| {
                let node = &nodes[u];
                let depth_factor = if max_depth > 0 {
                    (max_depth - node.depth) as f64 / max_depth as f64 * 2.0
                } else {
                    0.0
                };
                let score = (indeg[u] as f64).min(5.0)
                    + (adj[u].len() as f64 * 0.1).min(3.0)
                    + depth_factor
                    + (f64::from(node.vulnerability_count) * 0.5).min(3.0)
                    + (node.risk_score / 5.0).min(2.0)
                    + if node.kind == DependencyKind::Production { 1.0 } else { 0.0 };
                (node.id.clone(), score)
            })
            .collect();

        // Score descending, id ascending on ties: reproducible ranking.
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        let keep = ((n as f64 * 0.1).round() as usize).max(usize::min(5, n));
        scored.truncate(keep);
        self.stats.critical_packages = scored.into_iter().map(|(id, _)| id).collect();
    }

    /// Cluster pass: bucket nodes by the sorted signature of their
    /// production edge targets (leaf nodes share the empty signature),
    /// keep buckets of two or more.
    fn discover_clusters(&mut self) {
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        for (u, node) in self.nodes.iter().enumerate() {
            let mut targets: Vec<&str> = self
                .adjacency
                .get(&node.id)
                .into_iter()
                .flatten()
                .filter(|e| e.kind == DependencyKind::Production)
                .map(|e| e.to.0.as_str())
                .collect();
            targets.sort_unstable();
            buckets.entry(targets.join(",")).or_default().push(u);
        }

        let mut grouped: Vec<(String, Vec<usize>)> =
            buckets.into_iter().filter(|(_, members)| members.len() >= 2).collect();
        // Signature order for reproducible output
        grouped.sort_by(|a, b| a.0.cmp(&b.0));

        let mut clusters = Vec::with_capacity(grouped.len());
        for (_, mut members) in grouped {
            members.sort_by(|&a, &b| self.nodes[a].id.cmp(&self.nodes[b].id));
            let member_ids: HashSet<&PackageId> =
                members.iter().map(|&u| &self.nodes[u].id).collect();
            let m = members.len();

            let mut internal = 0usize;
            let mut external = 0usize;
            let mut total = 0usize;
            for &u in &members {
                for edge in self.adjacency.get(&self.nodes[u].id).into_iter().flatten() {
                    total += 1;
                    if member_ids.contains(&edge.to) {
                        internal += 1;
                    } else {
                        external += 1;
                    }
                }
            }
            let cohesion = (internal as f64 / (m * (m - 1)) as f64).clamp(0.0, 1.0);
            let coupling =
                if total > 0 { (external as f64 / total as f64).clamp(0.0, 1.0) } else { 0.0 };

            // Main package: heaviest member; members are in id order, so
            // strict comparison keeps the first on ties.
            let mut main = members[0];
            for &u in &members[1..] {
                if self.nodes[u].weight > self.nodes[main].weight {
                    main = u;
                }
            }

            clusters.push(PackageCluster {
                members: members.iter().map(|&u| self.nodes[u].id.clone()).collect(),
                cohesion,
                coupling,
                main_package: self.nodes[main].id.clone(),
            });
        }
        self.stats.clusters = clusters;
    }

    /// Metrics pass: graph-wide aggregates. Average path length and
    /// diameter are approximated from BFS depth (mean and max), not true
    /// all-pairs shortest paths.
    fn compute_metrics(&mut self) {
        let n = self.nodes.len();
        let e = self.edge_count();
        let density =
            if n > 1 { (e as f64 / (n * (n - 1)) as f64).clamp(0.0, 1.0) } else { 0.0 };

        // Connected components over the undirected view
        let adj = self.slot_adjacency();
        let mut undirected: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (u, targets) in adj.iter().enumerate() {
            for &v in targets {
                undirected[u].push(v);
                undirected[v].push(u);
            }
        }
        let mut seen = vec![false; n];
        let mut components = 0usize;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            components += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(u) = stack.pop() {
                for &v in &undirected[u] {
                    if !seen[v] {
                        seen[v] = true;
                        stack.push(v);
                    }
                }
            }
        }

        let clusters = &self.stats.clusters;
        let modularity = if clusters.is_empty() {
            0.0
        } else {
            clusters.iter().map(|c| c.cohesion).sum::<f64>() / clusters.len() as f64
        };

        let indeg = Self::in_degrees(&adj);
        let max_centrality =
            (0..n).map(|u| indeg[u] + adj[u].len()).max().unwrap_or(0) as f64;

        let avg_path_length = if n > 0 {
            self.nodes.iter().map(|node| node.depth as f64).sum::<f64>() / n as f64
        } else {
            0.0
        };

        self.stats.metrics = GraphMetrics {
            density,
            modularity,
            max_centrality,
            avg_path_length,
            connected_components: components,
            diameter: self.stats.max_depth,
        };
    }
}

fn severity_for_length(length: usize) -> CycleSeverity {
    match length {
        0..=2 => CycleSeverity::Critical,
        3..=4 => CycleSeverity::High,
        5..=6 => CycleSeverity::Medium,
        _ => CycleSeverity::Low,
    }
}

// Helper for DFS used by `detect_cycles`. On hitting a node already on the
// recursion stack, the cycle is the path suffix from that node's first
// occurrence, closed with a repeat of the node itself.
fn dfs_cycles(
    u: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    on_stack: &mut [bool],
    path: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    visited[u] = true;
    on_stack[u] = true;
    path.push(u);
    for &v in &adj[u] {
        if !visited[v] {
            dfs_cycles(v, adj, visited, on_stack, path, out);
        } else if on_stack[v] {
            if let Some(pos) = path.iter().position(|&x| x == v) {
                let mut cycle: Vec<usize> = path[pos..].to_vec();
                cycle.push(v);
                out.push(cycle);
            }
        }
    }
    path.pop();
    on_stack[u] = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageRecord;

    fn build(recs: Vec<PackageRecord>) -> DependencyGraph {
        DependencyGraph::build_from_package_list(&recs).expect("build graph")
    }

    fn id(name: &str) -> PackageId {
        PackageId::new(name, "1.0.0")
    }

    #[test]
    fn depths_follow_bfs_from_roots() {
        // root -> a -> b, root -> b: b is reached at depth 1 via the
        // direct edge before the depth-2 route through a.
        let graph = build(vec![
            PackageRecord::new("root", "1.0.0")
                .with_dependency("a", "*")
                .with_dependency("b", "*"),
            PackageRecord::new("a", "1.0.0").with_dependency("b", "*"),
            PackageRecord::new("b", "1.0.0"),
        ]);
        assert_eq!(graph.package(&id("root")).unwrap().depth, 0);
        assert_eq!(graph.package(&id("a")).unwrap().depth, 1);
        assert_eq!(graph.package(&id("b")).unwrap().depth, 1);
        assert_eq!(graph.stats().max_depth, 1);
    }

    #[test]
    fn weights_are_half_total_degree_floored_at_one() {
        let graph = build(vec![
            PackageRecord::new("hub", "1.0.0").with_dependency("leaf", "*"),
            PackageRecord::new("leaf", "1.0.0"),
            PackageRecord::new("user1", "1.0.0").with_dependency("hub", "*"),
            PackageRecord::new("user2", "1.0.0").with_dependency("hub", "*"),
            PackageRecord::new("lonely", "1.0.0"),
        ]);
        // hub: in 2, out 1 -> 1.5; leaf: in 1, out 0 -> 0.5; lonely: 0 -> floor 1.0
        assert!((graph.package(&id("hub")).unwrap().weight - 1.5).abs() < f64::EPSILON);
        assert!((graph.package(&id("leaf")).unwrap().weight - 0.5).abs() < f64::EPSILON);
        assert!((graph.package(&id("lonely")).unwrap().weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn self_loop_is_one_critical_cycle_of_length_two() {
        let graph = build(vec![
            PackageRecord::new("ouroboros", "1.0.0").with_dependency("ouroboros", "*"),
        ]);
        let cycles = &graph.stats().cycles;
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].length, 2);
        assert_eq!(cycles[0].severity, CycleSeverity::Critical);
        assert_eq!(cycles[0].members, vec![id("ouroboros"), id("ouroboros")]);
    }

    #[test]
    fn dag_has_no_cycles() {
        let graph = build(vec![
            PackageRecord::new("root", "1.0.0")
                .with_dependency("a", "*")
                .with_dependency("b", "*"),
            PackageRecord::new("a", "1.0.0"),
            PackageRecord::new("b", "1.0.0"),
        ]);
        assert!(graph.stats().cycles.is_empty());
    }

    #[test]
    fn three_ring_is_a_high_severity_cycle_of_length_four() {
        let graph = build(vec![
            PackageRecord::new("a", "1.0.0").with_dependency("b", "*"),
            PackageRecord::new("b", "1.0.0").with_dependency("c", "*"),
            PackageRecord::new("c", "1.0.0").with_dependency("a", "*"),
        ]);
        let cycles = &graph.stats().cycles;
        assert!(!cycles.is_empty());
        assert!(cycles.iter().any(|c| c.length == 4 && c.severity == CycleSeverity::High));
        assert!(!graph.stats().critical_packages.is_empty());
    }

    #[test]
    fn shorter_heavier_cycles_score_higher_impact() {
        let graph = build(vec![
            // tight pair
            PackageRecord::new("a", "1.0.0").with_dependency("b", "*"),
            PackageRecord::new("b", "1.0.0").with_dependency("a", "*"),
            // wide ring
            PackageRecord::new("p", "1.0.0").with_dependency("q", "*"),
            PackageRecord::new("q", "1.0.0").with_dependency("r", "*"),
            PackageRecord::new("r", "1.0.0").with_dependency("s", "*"),
            PackageRecord::new("s", "1.0.0").with_dependency("t", "*"),
            PackageRecord::new("t", "1.0.0").with_dependency("p", "*"),
        ]);
        let cycles = &graph.stats().cycles;
        let pair = cycles.iter().find(|c| c.length == 3).expect("pair cycle");
        let ring = cycles.iter().find(|c| c.length == 6).expect("ring cycle");
        assert!(pair.impact > ring.impact);
    }

    #[test]
    fn critical_count_matches_bound_for_various_sizes() {
        for n in [1usize, 3, 5, 10, 100] {
            let recs: Vec<PackageRecord> = (0..n)
                .map(|i| PackageRecord::new(&format!("pkg{i:03}"), "1.0.0"))
                .collect();
            let graph = build(recs);
            let expected = ((n as f64 * 0.1).round() as usize).max(usize::min(5, n));
            assert_eq!(
                graph.stats().critical_packages.len(),
                expected,
                "wrong critical count for n={n}"
            );
        }
    }

    #[test]
    fn hub_ranks_ahead_of_leaves() {
        let mut recs = vec![PackageRecord::new("hub", "1.0.0")];
        for i in 0..4 {
            recs.push(
                PackageRecord::new(&format!("user{i}"), "1.0.0").with_dependency("hub", "*"),
            );
        }
        for i in 0..10 {
            recs.push(PackageRecord::new(&format!("leaf{i}"), "1.0.0"));
        }
        let graph = build(recs);
        let critical = &graph.stats().critical_packages;
        assert!(critical.contains(&id("hub")), "hub missing from {critical:?}");
        assert_eq!(critical[0], id("hub"));
    }

    #[test]
    fn leaf_packages_share_the_empty_signature_cluster() {
        let graph = build(vec![
            PackageRecord::new("root", "1.0.0")
                .with_dependency("x", "*")
                .with_dependency("y", "*"),
            PackageRecord::new("x", "1.0.0"),
            PackageRecord::new("y", "1.0.0"),
        ]);
        let clusters = &graph.stats().clusters;
        assert_eq!(clusters.len(), 1);
        let leaves = &clusters[0];
        assert_eq!(leaves.members, vec![id("x"), id("y")]);
        assert!(leaves.cohesion >= 0.0 && leaves.cohesion <= 1.0);
        assert!(leaves.coupling >= 0.0 && leaves.coupling <= 1.0);
    }

    #[test]
    fn cluster_cohesion_and_coupling_math() {
        // a and b both depend (production) on base -> same signature.
        // a also depends on b via dev, an internal edge; b points at the
        // outside world via dev on ext.
        let graph = build(vec![
            PackageRecord::new("a", "1.0.0")
                .with_dependency("base", "*")
                .with_dev_dependency("b", "*"),
            PackageRecord::new("b", "1.0.0")
                .with_dependency("base", "*")
                .with_dev_dependency("ext", "*"),
            PackageRecord::new("base", "1.0.0"),
            PackageRecord::new("ext", "1.0.0"),
        ]);
        let cluster = graph
            .stats()
            .clusters
            .iter()
            .find(|c| c.members.contains(&id("a")))
            .expect("cluster of a and b");
        assert_eq!(cluster.members.len(), 2);
        // 1 internal edge (a->b) out of 2*1 possible
        assert!((cluster.cohesion - 0.5).abs() < f64::EPSILON);
        // 4 member edges total, 3 leave the cluster (a->base, b->base, b->ext)
        assert!((cluster.coupling - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_degrade_gracefully_on_empty_and_single_node_graphs() {
        let empty = build(vec![]);
        assert_eq!(empty.stats().total_packages, 0);
        assert!((empty.stats().metrics.density).abs() < f64::EPSILON);
        assert_eq!(empty.stats().metrics.connected_components, 0);

        let single = build(vec![PackageRecord::new("solo", "1.0.0")]);
        assert!((single.stats().metrics.density).abs() < f64::EPSILON);
        assert_eq!(single.stats().metrics.connected_components, 1);
        assert_eq!(single.stats().critical_packages.len(), 1);
    }

    #[test]
    fn components_count_undirected_islands() {
        let graph = build(vec![
            PackageRecord::new("a", "1.0.0").with_dependency("b", "*"),
            PackageRecord::new("b", "1.0.0"),
            PackageRecord::new("island", "1.0.0"),
        ]);
        assert_eq!(graph.stats().metrics.connected_components, 2);
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(severity_for_length(2), CycleSeverity::Critical);
        assert_eq!(severity_for_length(3), CycleSeverity::High);
        assert_eq!(severity_for_length(4), CycleSeverity::High);
        assert_eq!(severity_for_length(5), CycleSeverity::Medium);
        assert_eq!(severity_for_length(6), CycleSeverity::Medium);
        assert_eq!(severity_for_length(7), CycleSeverity::Low);
    }
}
