//! Build a small graph in memory and print its headline stats.
//!
//! Run with: `cargo run --example basic_analyze`

use dep_insight::graph::DependencyGraph;
use dep_insight::manifest::PackageRecord;

fn main() {
    let packages = vec![
        PackageRecord::new("webapp", "1.0.0")
            .with_dependency("router", "^3.0.0")
            .with_dependency("store", "^2.1.0")
            .with_dev_dependency("bundler", "^5.0.0"),
        PackageRecord::new("router", "3.2.0").with_dependency("store", "^2.0.0"),
        PackageRecord::new("store", "2.4.1"),
        PackageRecord::new("bundler", "5.9.0"),
    ];

    let graph = DependencyGraph::build_from_package_list(&packages).expect("build graph");
    let stats = graph.stats();
    println!(
        "packages: {}, edges: {}, max depth: {}, density: {:.4}",
        stats.total_packages, stats.total_edges, stats.max_depth, stats.metrics.density
    );
    for id in &stats.critical_packages {
        println!("critical: {id}");
    }
}
