use crate::errors::GraphEngineError;
use crate::graph::{DependencyGraph, PackageId};
use crate::manifest::DependencyKind;
use std::collections::HashSet;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy)]
pub enum DotTheme { Light, Dark }

#[derive(Debug, Clone, Copy)]
pub enum RankDir { LR, TB }

#[derive(Debug, Clone, Copy)]
pub enum EdgeStyle { Curved, Ortho, Polyline }

#[derive(Debug, Clone, Copy)]
pub struct DotOptions {
    pub clusters: bool,
    pub legend: bool,
    pub theme: DotTheme,
    pub rankdir: RankDir,
    pub splines: EdgeStyle,
    pub rounded: bool,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self { clusters: true, legend: true, theme: DotTheme::Light, rankdir: RankDir::LR, splines: EdgeStyle::Curved, rounded: true }
    }
}

#[derive(Debug, Default)]
pub struct DotGenerator;

impl DotGenerator {
    #[must_use]
    pub fn new() -> Self { Self {} }

    /// Generate DOT with default options.
    ///
    /// # Errors
    /// Returns a `GraphEngineError` if DOT generation fails for any reason.
    pub fn generate_dot(&self, graph: &DependencyGraph) -> Result<String, GraphEngineError> {
        self.generate_dot_with_options(graph, DotOptions::default())
    }

    /// Generate DOT with the given `opts`.
    ///
    /// When clusters are enabled, the discovered coupling clusters become
    /// DOT subgraphs; everything else is emitted flat.
    ///
    /// # Errors
    /// Returns a `GraphEngineError` if DOT generation fails for any reason.
    pub fn generate_dot_with_options(&self, graph: &DependencyGraph, opts: DotOptions) -> Result<String, GraphEngineError> {
        let mut s = String::new();
        s.push_str("digraph DepInsight\n{");
        s.push('\n');
        let rank = match opts.rankdir { RankDir::LR => "LR", RankDir::TB => "TB" };
        let splines = match opts.splines { EdgeStyle::Curved => "curved", EdgeStyle::Ortho => "ortho", EdgeStyle::Polyline => "polyline" };
        let node_style = if opts.rounded { "filled,rounded" } else { "filled" };
        let _ = write!(
            s,
            "  rankdir={rank};\n  graph [fontname=Helvetica, splines={splines}] ;\n  node [shape=box, fontsize=10, style={node_style}] ;\n  edge [fontname=Helvetica, fontsize=9];\n"
        );

        let mut clustered: HashSet<&PackageId> = HashSet::new();
        if opts.clusters {
            for (i, cluster) in graph.stats().clusters.iter().enumerate() {
                let main = cluster.main_package.0.as_str();
                let _ = write!(
                    s,
                    "  subgraph \"cluster_{i}\" {{\n    label=\"{}\";\n    color=lightgrey;\n",
                    escape_label(main)
                );
                for id in &cluster.members {
                    if let Some(node) = graph.package(id) {
                        clustered.insert(&node.id);
                        let node_id = sanitize_id(&node.id.0);
                        let fill = fill_for_kind(node.kind, opts.theme);
                        let _ = writeln!(
                            s,
                            "    \"{node_id}\" [label=\"{}\", fillcolor=\"{fill}\", tooltip=\"{}\"];",
                            escape_label(&node.name),
                            escape_label(&node.id.0)
                        );
                    }
                }
                s.push_str("  }\n");
            }
        }

        // Remaining nodes flat, in id order for determinism
        let mut rest: Vec<&PackageId> =
            graph.packages().iter().map(|n| &n.id).filter(|id| !clustered.contains(id)).collect();
        rest.sort();
        for id in rest {
            if let Some(node) = graph.package(id) {
                let node_id = sanitize_id(&node.id.0);
                let fill = fill_for_kind(node.kind, opts.theme);
                let _ = writeln!(
                    s,
                    "  \"{node_id}\" [label=\"{}\", fillcolor=\"{fill}\", tooltip=\"{}\"];",
                    escape_label(&node.name),
                    escape_label(&node.id.0)
                );
            }
        }

        // Emit edges grouped by source id, in id order
        let mut sources: Vec<&PackageId> = graph.adjacency().keys().collect();
        sources.sort();
        for src in sources {
            for edge in graph.edges_from(src) {
                let from = sanitize_id(&edge.from.0);
                let to = sanitize_id(&edge.to.0);
                let (label, color, style) = edge_attrs(edge.kind);
                let penwidth = edge.weight.max(0.8).min(3.0);
                let _ = writeln!(
                    s,
                    "  \"{from}\" -> \"{to}\" [label=\"{label}\", color=\"{color}\", style=\"{style}\", penwidth={penwidth}];"
                );
            }
        }

        if opts.legend {
            // Legend cluster
            s.push_str("  subgraph cluster_legend {\n    label=\"Legend\";\n    color=grey;\n");
            let legend_items = [
                ("production", DependencyKind::Production),
                ("dev", DependencyKind::Dev),
                ("peer", DependencyKind::Peer),
                ("optional", DependencyKind::Optional),
            ];
            for (name, kind) in legend_items {
                let fill = fill_for_kind(kind, opts.theme);
                let id = sanitize_id(&format!("legend_{name}"));
                let _ = writeln!(s, "    \"{id}\" [label=\"{name}\", fillcolor=\"{fill}\"]; ");
            }
            s.push_str("  }\n");
        }

        s.push_str("}\n");
        Ok(s)
    }
}

#[derive(Debug, Default)]
pub struct GraphMlGenerator;

impl GraphMlGenerator {
    #[must_use]
    pub fn new() -> Self { Self {} }

    /// Generate a GraphML document for the graph.
    ///
    /// Node weight/depth and edge kind/weight travel as GraphML data keys
    /// so downstream tools can style by them.
    ///
    /// # Errors
    /// Returns a `GraphEngineError` if GraphML generation fails for any reason.
    pub fn generate_graphml(&self, graph: &DependencyGraph) -> Result<String, GraphEngineError> {
        let mut s = String::new();
        s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        s.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
        s.push_str("  <key id=\"name\" for=\"node\" attr.name=\"name\" attr.type=\"string\"/>\n");
        s.push_str("  <key id=\"version\" for=\"node\" attr.name=\"version\" attr.type=\"string\"/>\n");
        s.push_str("  <key id=\"weight\" for=\"node\" attr.name=\"weight\" attr.type=\"double\"/>\n");
        s.push_str("  <key id=\"depth\" for=\"node\" attr.name=\"depth\" attr.type=\"int\"/>\n");
        s.push_str("  <key id=\"kind\" for=\"edge\" attr.name=\"kind\" attr.type=\"string\"/>\n");
        s.push_str("  <key id=\"edgeweight\" for=\"edge\" attr.name=\"weight\" attr.type=\"double\"/>\n");
        s.push_str("  <graph id=\"dependencies\" edgedefault=\"directed\">\n");

        let mut ids: Vec<&PackageId> = graph.packages().iter().map(|n| &n.id).collect();
        ids.sort();
        for id in ids {
            if let Some(node) = graph.package(id) {
                let _ = writeln!(s, "    <node id=\"{}\">", escape_xml(&node.id.0));
                let _ = writeln!(s, "      <data key=\"name\">{}</data>", escape_xml(&node.name));
                let _ = writeln!(s, "      <data key=\"version\">{}</data>", escape_xml(&node.version));
                let _ = writeln!(s, "      <data key=\"weight\">{}</data>", node.weight);
                let _ = writeln!(s, "      <data key=\"depth\">{}</data>", node.depth);
                s.push_str("    </node>\n");
            }
        }

        let mut sources: Vec<&PackageId> = graph.adjacency().keys().collect();
        sources.sort();
        for src in sources {
            for edge in graph.edges_from(src) {
                let (kind, _, _) = edge_attrs(edge.kind);
                let _ = writeln!(
                    s,
                    "    <edge source=\"{}\" target=\"{}\">",
                    escape_xml(&edge.from.0),
                    escape_xml(&edge.to.0)
                );
                let _ = writeln!(s, "      <data key=\"kind\">{kind}</data>");
                let _ = writeln!(s, "      <data key=\"edgeweight\">{}</data>", edge.weight);
                s.push_str("    </edge>\n");
            }
        }

        s.push_str("  </graph>\n</graphml>\n");
        Ok(s)
    }
}

fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn escape_label(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn edge_attrs(kind: DependencyKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        DependencyKind::Production => ("production", "#d62728", "solid"),
        DependencyKind::Peer => ("peer", "#9467bd", "dashed"),
        DependencyKind::Dev => ("dev", "#1f77b4", "dashed"),
        DependencyKind::Optional => ("optional", "#7f7f7f", "dotted"),
    }
}

fn fill_for_kind(kind: DependencyKind, theme: DotTheme) -> &'static str {
    match (theme, kind) {
        (DotTheme::Light, DependencyKind::Production) => "#e0f3ff",
        (DotTheme::Light, DependencyKind::Dev) => "#e8ffe0",
        (DotTheme::Light, DependencyKind::Peer) => "#f0e0ff",
        (DotTheme::Light, DependencyKind::Optional) => "#fff4e0",

        (DotTheme::Dark, DependencyKind::Production) => "#124559",
        (DotTheme::Dark, DependencyKind::Dev) => "#0b6e4f",
        (DotTheme::Dark, DependencyKind::Peer) => "#3c2a5a",
        (DotTheme::Dark, DependencyKind::Optional) => "#7a4c00",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageRecord;

    fn sample_graph() -> DependencyGraph {
        let recs = vec![
            PackageRecord::new("app", "1.0.0")
                .with_dependency("lib", "^1.0.0")
                .with_dev_dependency("lint", "*"),
            PackageRecord::new("lib", "1.0.0"),
            PackageRecord::new("lint", "3.2.1"),
        ];
        DependencyGraph::build_from_package_list(&recs).expect("build")
    }

    #[test]
    fn test_sanitize_id_basic() {
        assert_eq!(sanitize_id("@scope/pkg@1.0.0"), "_scope_pkg_1_0_0");
        assert_eq!(sanitize_id("abc_DEF012"), "abc_DEF012");
    }

    #[test]
    fn test_escape_xml_specials() {
        assert_eq!(escape_xml("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn dot_mentions_every_node_and_edge() {
        let graph = sample_graph();
        let dot = DotGenerator::new().generate_dot(&graph).expect("dot");
        assert!(dot.starts_with("digraph DepInsight"));
        for node in graph.packages() {
            assert!(dot.contains(&sanitize_id(&node.id.0)), "missing node {}", node.id);
        }
        assert!(dot.contains("->"));
        assert!(dot.contains("cluster_legend"));
    }

    #[test]
    fn dot_without_legend_omits_legend_cluster() {
        let graph = sample_graph();
        let opts = DotOptions { legend: false, ..DotOptions::default() };
        let dot = DotGenerator::new().generate_dot_with_options(&graph, opts).expect("dot");
        assert!(!dot.contains("cluster_legend"));
    }

    #[test]
    fn graphml_is_well_formed_enough() {
        let graph = sample_graph();
        let xml = GraphMlGenerator::new().generate_graphml(&graph).expect("graphml");
        assert!(xml.starts_with("<?xml"));
        assert!(xml.ends_with("</graphml>\n"));
        assert_eq!(xml.matches("<node id=").count(), graph.package_count());
        assert_eq!(xml.matches("<edge source=").count(), graph.edge_count());
    }
}
