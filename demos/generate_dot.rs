//! Render a graph to DOT on stdout.
//!
//! Run with: `cargo run --example generate_dot > graph.dot`

use dep_insight::graph::DependencyGraph;
use dep_insight::manifest::PackageRecord;
use dep_insight::visualization::{DotGenerator, DotOptions, DotTheme};

fn main() {
    let packages = vec![
        PackageRecord::new("cli", "0.5.0")
            .with_dependency("parser", "^1.0.0")
            .with_dependency("logger", "^2.0.0"),
        PackageRecord::new("parser", "1.1.0").with_dependency("logger", "^2.0.0"),
        PackageRecord::new("logger", "2.0.3"),
    ];
    let graph = DependencyGraph::build_from_package_list(&packages).expect("build graph");

    let opts = DotOptions { theme: DotTheme::Dark, ..DotOptions::default() };
    let dot = DotGenerator::new().generate_dot_with_options(&graph, opts).expect("dot");
    println!("{dot}");
}
