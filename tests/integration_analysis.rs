use std::fs;
use std::path::PathBuf;

use dep_insight::graph::{CycleSeverity, DependencyGraph, PackageId};
use dep_insight::manifest::{load_package_list, PackageRecord};

fn write_manifest(records: &[PackageRecord]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("packages.json");
    fs::write(&path, serde_json::to_string_pretty(records).expect("serialize")).expect("write");
    (dir, path)
}

#[test]
fn end_to_end_dag_scenario() {
    // root -> {A, B}, A -> {C}; B and C are leaves.
    let records = vec![
        PackageRecord::new("root", "1.0.0")
            .with_dependency("a", "^1.0.0")
            .with_dependency("b", "^1.0.0"),
        PackageRecord::new("a", "1.0.0").with_dependency("c", "^1.0.0"),
        PackageRecord::new("b", "1.0.0"),
        PackageRecord::new("c", "1.0.0"),
    ];
    let (_dir, path) = write_manifest(&records);
    let loaded = load_package_list(&path).expect("load");
    let graph = DependencyGraph::build_from_package_list(&loaded).expect("build");

    let stats = graph.stats();
    assert_eq!(stats.total_packages, 4);
    assert_eq!(stats.total_edges, 3);
    assert!(stats.max_depth >= 1);
    assert!(stats.cycles.is_empty());
    assert_eq!(graph.package(&PackageId::new("c", "1.0.0")).expect("c").depth, 2);
}

#[test]
fn end_to_end_cycle_scenario() {
    // A -> B -> C -> A
    let records = vec![
        PackageRecord::new("a", "1.0.0").with_dependency("b", "*"),
        PackageRecord::new("b", "1.0.0").with_dependency("c", "*"),
        PackageRecord::new("c", "1.0.0").with_dependency("a", "*"),
    ];
    let graph = DependencyGraph::build_from_package_list(&records).expect("build");

    let stats = graph.stats();
    assert_eq!(stats.total_packages, 3);
    assert_eq!(stats.total_edges, 3);
    assert!(stats.cycles.iter().any(|c| c.length == 4));
    assert!(!stats.critical_packages.is_empty());
}

#[test]
fn self_dependency_is_critical() {
    let records =
        vec![PackageRecord::new("snake", "1.0.0").with_dependency("snake", "^1.0.0")];
    let graph = DependencyGraph::build_from_package_list(&records).expect("build");
    let cycles = &graph.stats().cycles;
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].length, 2);
    assert_eq!(cycles[0].severity, CycleSeverity::Critical);
}

#[test]
fn duplicate_ids_collapse_via_manifest_round_trip() {
    let records = vec![
        PackageRecord::new("dup", "1.0.0").with_dependency("other", "*"),
        PackageRecord::new("dup", "1.0.0"),
        PackageRecord::new("other", "2.0.0"),
    ];
    let (_dir, path) = write_manifest(&records);
    let graph =
        DependencyGraph::build_from_package_list(&load_package_list(&path).expect("load"))
            .expect("build");
    assert_eq!(graph.package_count(), 2);
}

#[test]
fn built_graph_holds_structural_invariants() {
    let records = vec![
        PackageRecord::new("web", "2.0.0")
            .with_dependency("http", "^1.0.0")
            .with_dependency("json", "^3.0.0")
            .with_dev_dependency("testkit", "*"),
        PackageRecord::new("http", "1.5.0").with_dependency("json", "^3.0.0"),
        PackageRecord::new("json", "3.1.4"),
        PackageRecord::new("testkit", "0.9.0").with_peer_dependency("json", ">=3"),
        PackageRecord::new("orphan", "0.0.1"),
    ];
    let graph = DependencyGraph::build_from_package_list(&records).expect("build");
    let stats = graph.stats();

    for edge in graph.edges() {
        assert!(graph.package(&edge.from).is_some());
        assert!(graph.package(&edge.to).is_some());
        assert!(edge.weight >= 0.3 && edge.weight <= 1.0);
    }
    assert!(stats.metrics.density >= 0.0 && stats.metrics.density <= 1.0);
    for cluster in &stats.clusters {
        assert!(cluster.members.len() >= 2);
        assert!(cluster.cohesion >= 0.0 && cluster.cohesion <= 1.0);
        assert!(cluster.coupling >= 0.0 && cluster.coupling <= 1.0);
        assert!(cluster.members.contains(&cluster.main_package));
    }
    let n = stats.total_packages;
    let expected = ((n as f64 * 0.1).round() as usize).max(usize::min(5, n));
    assert_eq!(stats.critical_packages.len(), expected);
}

#[test]
fn hub_outranks_leaves_end_to_end() {
    let mut records = vec![PackageRecord::new("core", "1.0.0")];
    for i in 0..3 {
        records.push(
            PackageRecord::new(&format!("plugin{i}"), "1.0.0").with_dependency("core", "^1"),
        );
    }
    records.push(PackageRecord::new("standalone", "1.0.0"));
    let graph = DependencyGraph::build_from_package_list(&records).expect("build");

    let critical = &graph.stats().critical_packages;
    let core = PackageId::new("core", "1.0.0");
    let standalone = PackageId::new("standalone", "1.0.0");
    assert!(critical.contains(&core));
    let core_rank = critical.iter().position(|id| *id == core);
    let standalone_rank = critical.iter().position(|id| *id == standalone);
    match (core_rank, standalone_rank) {
        (Some(c), Some(s)) => assert!(c < s),
        (Some(_), None) => {}
        _ => panic!("core must be ranked critical"),
    }
}

#[test]
fn graph_serializes_for_reporters() {
    let records = vec![
        PackageRecord::new("a", "1.0.0").with_dependency("b", "*"),
        PackageRecord::new("b", "1.0.0"),
    ];
    let graph = DependencyGraph::build_from_package_list(&records).expect("build");
    let json = serde_json::to_string(&graph).expect("serialize");
    assert!(json.contains("a@1.0.0"));
    assert!(json.contains("total_packages"));
}
