//! dep-insight — Dependency Graph Analysis
//!
//! Build a weighted, directed dependency graph from a flattened package
//! list and answer structural questions about it.
//!
//! # Features
//! - Two-pass graph construction (nodes, then name-resolved edges)
//! - Structural analysis: BFS depth, degree weights, cycle detection,
//!   critical-package ranking, coupling clusters, aggregate metrics
//! - Queries: critical packages, cycles, clusters, hubs, package info, stats
//! - DOT and GraphML export
//!
//! # Quickstart (Library)
//! ```no_run
//! use dep_insight::graph::DependencyGraph;
//! use dep_insight::manifest::PackageRecord;
//!
//! let packages = vec![
//!     PackageRecord::new("app", "1.0.0").with_dependency("lib", "^2.0.0"),
//!     PackageRecord::new("lib", "2.3.1"),
//! ];
//! let graph = DependencyGraph::build_from_package_list(&packages).expect("build graph");
//! println!("packages: {} edges: {}", graph.package_count(), graph.edge_count());
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! dep-insight analyze --manifest packages.json --dot graph.dot
//! dep-insight query critical --manifest packages.json --format json
//! ```
//!
//! # Resolution Behavior
//! Dependency targets are matched by package name only; the first package
//! carrying the name wins and declared version ranges ride along unevaluated.
pub mod app;
pub mod cli;
pub mod errors;
pub mod graph;
pub mod manifest;
pub mod query;
pub mod utils;
pub mod visualization;
