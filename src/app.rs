use crate::cli::{
    Cli, Commands, DotRankDirArg, DotSplinesArg, DotThemeArg, OnOffArg, OutputFormat,
    QueryCommands, SeverityArg,
};
use crate::errors::GraphEngineError;
use crate::graph::{CycleSeverity, DependencyGraph, PackageId};
use crate::query::{
    CentralityMetric, ClustersQuery, CriticalPackagesQuery, CyclesQuery, HubsQuery,
    PackageInfoQuery, Query, StatsQuery,
};
use crate::utils::config::Config;
use crate::visualization::{DotGenerator, DotOptions, DotTheme, EdgeStyle, GraphMlGenerator, RankDir};
use clap::CommandFactory;
use clap_complete::generate;
use std::fs;
use std::io;
use std::path::PathBuf;

const DEFAULT_MANIFEST: &str = "packages.json";

fn load_config(path: Option<&str>) -> Option<Config> {
    match path {
        Some(p) => crate::utils::config::load_config_at(std::path::Path::new(p)),
        None => crate::utils::config::load_config_near(std::path::Path::new(".")),
    }
}

fn effective_manifest(flag: Option<String>, config: Option<&Config>) -> PathBuf {
    flag.or_else(|| config.and_then(|c| c.manifest.clone()))
        .map_or_else(|| PathBuf::from(DEFAULT_MANIFEST), PathBuf::from)
}

// Config-file default format wins over the flag default, as with DOT options.
fn effective_format(flag: OutputFormat, config: Option<&Config>) -> OutputFormat {
    match config.and_then(|c| c.query.as_ref()).and_then(|q| q.default_format.as_deref()) {
        Some("json") => OutputFormat::Json,
        Some("text") => OutputFormat::Text,
        _ => flag,
    }
}

fn build_graph(manifest: &std::path::Path) -> Result<DependencyGraph, GraphEngineError> {
    let packages = crate::manifest::load_package_list(manifest)?;
    DependencyGraph::build_from_package_list(&packages)
}

fn severity_from_arg(arg: SeverityArg) -> CycleSeverity {
    match arg {
        SeverityArg::Critical => CycleSeverity::Critical,
        SeverityArg::High => CycleSeverity::High,
        SeverityArg::Medium => CycleSeverity::Medium,
        SeverityArg::Low => CycleSeverity::Low,
    }
}

fn severity_label(severity: CycleSeverity) -> &'static str {
    match severity {
        CycleSeverity::Critical => "critical",
        CycleSeverity::High => "high",
        CycleSeverity::Medium => "medium",
        CycleSeverity::Low => "low",
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(e) => {
            eprintln!("JSON encode error: {e}");
            1
        }
    }
}

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success).
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn run_cli(cli: Cli) -> i32 {
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = crate::cli::Cli::command();
            let bin_name = env!("CARGO_PKG_NAME");
            let mut out = io::stdout();
            generate(shell, &mut cmd, bin_name, &mut out);
            0
        }
        Commands::Analyze {
            manifest,
            config,
            json,
            dot,
            graphml,
            dot_clusters,
            dot_legend,
            dot_theme,
            dot_rankdir,
            dot_splines,
            dot_rounded,
        } => {
            let cfg = load_config(config.as_deref());
            let manifest_path = effective_manifest(manifest, cfg.as_ref());
            let graph = match build_graph(&manifest_path) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };

            if let Some(json_path) = json {
                match serde_json::to_string_pretty(&graph) {
                    Ok(serialized) => {
                        if let Err(e) = fs::write(&json_path, serialized) {
                            eprintln!("Failed to write JSON output {json_path}: {e}");
                        }
                    }
                    Err(e) => eprintln!("JSON encode error: {e}"),
                }
            }

            // DOT options from flags with optional config overrides
            let mut clusters = matches!(dot_clusters, OnOffArg::On);
            let mut legend = matches!(dot_legend, OnOffArg::On);
            let mut theme = match dot_theme {
                DotThemeArg::Dark => DotTheme::Dark,
                DotThemeArg::Light => DotTheme::Light,
            };
            let mut rankdir = match dot_rankdir {
                DotRankDirArg::TB => RankDir::TB,
                DotRankDirArg::LR => RankDir::LR,
            };
            let mut splines = match dot_splines {
                DotSplinesArg::Ortho => EdgeStyle::Ortho,
                DotSplinesArg::Polyline => EdgeStyle::Polyline,
                DotSplinesArg::Curved => EdgeStyle::Curved,
            };
            let mut rounded = matches!(dot_rounded, OnOffArg::On);
            if let Some(dot_cfg) = cfg.as_ref().and_then(|c| c.dot.clone()) {
                if let Some(v) = dot_cfg.clusters {
                    clusters = v;
                }
                if let Some(v) = dot_cfg.legend {
                    legend = v;
                }
                if let Some(v) = dot_cfg.theme {
                    theme = if v == "dark" { DotTheme::Dark } else { DotTheme::Light };
                }
                if let Some(v) = dot_cfg.rankdir {
                    rankdir = if v == "TB" { RankDir::TB } else { RankDir::LR };
                }
                if let Some(v) = dot_cfg.splines {
                    splines = match v.as_str() {
                        "ortho" => EdgeStyle::Ortho,
                        "polyline" => EdgeStyle::Polyline,
                        _ => EdgeStyle::Curved,
                    };
                }
                if let Some(v) = dot_cfg.rounded {
                    rounded = v;
                }
            }
            let dot_opts = DotOptions { clusters, legend, theme, rankdir, splines, rounded };

            if let Some(dot_path) = dot {
                match DotGenerator::new().generate_dot_with_options(&graph, dot_opts) {
                    Ok(content) => {
                        if let Err(e) = fs::write(&dot_path, content) {
                            eprintln!("Failed to write DOT output {dot_path}: {e}");
                        }
                    }
                    Err(e) => eprintln!("Export error: {e}"),
                }
            }

            if let Some(graphml_path) = graphml {
                match GraphMlGenerator::new().generate_graphml(&graph) {
                    Ok(content) => {
                        if let Err(e) = fs::write(&graphml_path, content) {
                            eprintln!("Failed to write GraphML output {graphml_path}: {e}");
                        }
                    }
                    Err(e) => eprintln!("Export error: {e}"),
                }
            }

            if !cli.quiet {
                let stats = graph.stats();
                println!(
                    "Analyzed {} packages, {} edges (max depth {}, {} cycles, density {:.4})",
                    stats.total_packages,
                    stats.total_edges,
                    stats.max_depth,
                    stats.cycles.len(),
                    stats.metrics.density
                );
            }
            0
        }
        Commands::Query { query } => run_query(query),
    }
}

#[allow(clippy::too_many_lines)]
fn run_query(query: QueryCommands) -> i32 {
    match query {
        QueryCommands::Critical { manifest, config, format } => {
            let cfg = load_config(config.as_deref());
            let graph = match build_graph(&effective_manifest(manifest, cfg.as_ref())) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };
            let rows = CriticalPackagesQuery.run(&graph);
            match effective_format(format, cfg.as_ref()) {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    let body: Vec<Vec<String>> = rows
                        .iter()
                        .enumerate()
                        .map(|(i, r)| {
                            vec![
                                format!("{}", i + 1),
                                r.id.clone(),
                                format!("{:.2}", r.weight),
                                r.depth.to_string(),
                            ]
                        })
                        .collect();
                    println!("{}", crate::utils::table::render(&["#", "Package", "Weight", "Depth"], &body));
                    0
                }
            }
        }
        QueryCommands::Cycles { manifest, config, min_severity, format } => {
            let cfg = load_config(config.as_deref());
            let graph = match build_graph(&effective_manifest(manifest, cfg.as_ref())) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };
            let cycles = CyclesQuery::new(min_severity.map(severity_from_arg)).run(&graph);
            match effective_format(format, cfg.as_ref()) {
                OutputFormat::Json => print_json(&cycles),
                OutputFormat::Text => {
                    if cycles.is_empty() {
                        println!("<no cycles>");
                    } else {
                        for cycle in cycles {
                            let chain: Vec<String> =
                                cycle.members.iter().map(|id| id.0.clone()).collect();
                            println!(
                                "{} [{}, impact {:.2}]",
                                chain.join(" -> "),
                                severity_label(cycle.severity),
                                cycle.impact
                            );
                        }
                    }
                    0
                }
            }
        }
        QueryCommands::Clusters { manifest, config, format } => {
            let cfg = load_config(config.as_deref());
            let graph = match build_graph(&effective_manifest(manifest, cfg.as_ref())) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };
            let clusters = ClustersQuery.run(&graph);
            match effective_format(format, cfg.as_ref()) {
                OutputFormat::Json => print_json(&clusters),
                OutputFormat::Text => {
                    if clusters.is_empty() {
                        println!("<no clusters>");
                    } else {
                        let body: Vec<Vec<String>> = clusters
                            .iter()
                            .map(|c| {
                                vec![
                                    c.main_package.0.clone(),
                                    c.members.len().to_string(),
                                    format!("{:.3}", c.cohesion),
                                    format!("{:.3}", c.coupling),
                                ]
                            })
                            .collect();
                        println!(
                            "{}",
                            crate::utils::table::render(
                                &["Main", "Members", "Cohesion", "Coupling"],
                                &body
                            )
                        );
                    }
                    0
                }
            }
        }
        QueryCommands::Hubs { manifest, config, metric, top, format } => {
            let cfg = load_config(config.as_deref());
            let graph = match build_graph(&effective_manifest(manifest, cfg.as_ref())) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };
            let m = match metric {
                crate::cli::MetricArg::In => CentralityMetric::In,
                crate::cli::MetricArg::Out => CentralityMetric::Out,
                crate::cli::MetricArg::Total => CentralityMetric::Total,
            };
            let rows = HubsQuery::new(m, top).run(&graph);
            match effective_format(format, cfg.as_ref()) {
                OutputFormat::Json => {
                    #[derive(serde::Serialize)]
                    struct HubRow {
                        package: String,
                        indegree: usize,
                        outdegree: usize,
                    }
                    let out: Vec<HubRow> = rows
                        .into_iter()
                        .map(|(id, i, o)| HubRow { package: id.0, indegree: i, outdegree: o })
                        .collect();
                    print_json(&out)
                }
                OutputFormat::Text => {
                    let body: Vec<Vec<String>> = rows
                        .into_iter()
                        .map(|(id, i, o)| {
                            vec![id.0, i.to_string(), o.to_string(), (i + o).to_string()]
                        })
                        .collect();
                    println!(
                        "{}",
                        crate::utils::table::render(&["Package", "In", "Out", "Total"], &body)
                    );
                    0
                }
            }
        }
        QueryCommands::Package { manifest, config, id, format } => {
            let cfg = load_config(config.as_deref());
            let graph = match build_graph(&effective_manifest(manifest, cfg.as_ref())) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };
            let Some(info) = PackageInfoQuery::new(PackageId(id.clone())).run(&graph) else {
                eprintln!("Package not found: {id}");
                return 1;
            };
            match effective_format(format, cfg.as_ref()) {
                OutputFormat::Json => print_json(&info),
                OutputFormat::Text => {
                    println!("{} ({})", info.id, info.kind);
                    println!("  weight {:.2}, depth {}, size {} bytes", info.weight, info.depth, info.size);
                    if let Some(license) = &info.license {
                        println!("  license {license}");
                    }
                    println!(
                        "  vulnerabilities {}, risk {:.1}",
                        info.vulnerability_count, info.risk_score
                    );
                    println!("  dependents ({}):", info.dependents.len());
                    for d in &info.dependents {
                        println!("    {} ({}, {})", d.id, d.kind, d.version_range);
                    }
                    println!("  dependencies ({}):", info.dependencies.len());
                    for d in &info.dependencies {
                        println!("    {} ({}, {})", d.id, d.kind, d.version_range);
                    }
                    0
                }
            }
        }
        QueryCommands::Stats { manifest, config, format } => {
            let cfg = load_config(config.as_deref());
            let graph = match build_graph(&effective_manifest(manifest, cfg.as_ref())) {
                Ok(g) => g,
                Err(e) => {
                    eprintln!("Analysis failed: {e}");
                    return 1;
                }
            };
            let stats = StatsQuery.run(&graph);
            match effective_format(format, cfg.as_ref()) {
                OutputFormat::Json => print_json(&stats),
                OutputFormat::Text => {
                    let m = &stats.metrics;
                    let body = vec![
                        vec!["packages".to_string(), stats.total_packages.to_string()],
                        vec!["edges".to_string(), stats.total_edges.to_string()],
                        vec!["max depth".to_string(), stats.max_depth.to_string()],
                        vec!["cycles".to_string(), stats.cycles.len().to_string()],
                        vec!["critical".to_string(), stats.critical_packages.len().to_string()],
                        vec!["clusters".to_string(), stats.clusters.len().to_string()],
                        vec!["density".to_string(), format!("{:.4}", m.density)],
                        vec!["modularity".to_string(), format!("{:.4}", m.modularity)],
                        vec!["max centrality".to_string(), format!("{:.1}", m.max_centrality)],
                        vec!["avg path length".to_string(), format!("{:.2}", m.avg_path_length)],
                        vec!["components".to_string(), m.connected_components.to_string()],
                        vec!["diameter".to_string(), m.diameter.to_string()],
                    ];
                    println!("{}", crate::utils::table::render(&["Stat", "Value"], &body));
                    0
                }
            }
        }
    }
}
