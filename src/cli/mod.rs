use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "dep-insight",
    version,
    about = "Dependency graph analysis for package manifests",
    long_about = "Build a weighted dependency graph from a flattened package list (JSON) and answer structural questions: critical packages, circular dependencies, coupling clusters, density and connectivity. Dependency targets are matched by name only; version ranges are carried along but never evaluated."
)]
pub struct Cli {
    /// Suppress non-result output
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnOffArg {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DotThemeArg {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[allow(clippy::upper_case_acronyms)]
pub enum DotRankDirArg {
    LR,
    TB,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DotSplinesArg {
    Curved,
    Ortho,
    Polyline,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    In,
    Out,
    Total,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the dependency graph from a package list and report stats
    Analyze {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Write the full graph (nodes, edges, stats) as JSON
        #[arg(long)]
        json: Option<String>,
        /// Write a DOT rendering of the graph
        #[arg(long)]
        dot: Option<String>,
        /// Write a GraphML rendering of the graph
        #[arg(long)]
        graphml: Option<String>,
        /// DOT: group coupling clusters into subgraphs
        #[arg(long, value_enum, default_value_t = OnOffArg::On)]
        dot_clusters: OnOffArg,
        /// DOT: include legend
        #[arg(long, value_enum, default_value_t = OnOffArg::On)]
        dot_legend: OnOffArg,
        /// DOT: theme
        #[arg(long, value_enum, default_value_t = DotThemeArg::Light)]
        dot_theme: DotThemeArg,
        /// DOT: rank direction
        #[arg(long, value_enum, default_value_t = DotRankDirArg::LR)]
        dot_rankdir: DotRankDirArg,
        /// DOT: edge splines style
        #[arg(long, value_enum, default_value_t = DotSplinesArg::Curved)]
        dot_splines: DotSplinesArg,
        /// DOT: rounded node corners
        #[arg(long, value_enum, default_value_t = OnOffArg::On)]
        dot_rounded: OnOffArg,
    },
    /// Run queries over the dependency graph
    Query {
        #[command(subcommand)]
        query: QueryCommands,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum QueryCommands {
    /// List the packages ranked structurally critical
    Critical {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List circular dependency chains
    Cycles {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Only report cycles at or above this severity
        #[arg(long, value_enum)]
        min_severity: Option<SeverityArg>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List tightly coupled package clusters
    Clusters {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List top-N packages by degree centrality
    Hubs {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Centrality metric
        #[arg(long, value_enum, default_value_t = MetricArg::Total)]
        metric: MetricArg,
        /// Top N results
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show one package with its dependents and dependencies
    Package {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Package id (name@version)
        #[arg(long, value_name = "ID")]
        id: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print graph-wide stats and metrics
    Stats {
        /// Path to the flattened package list (JSON array of records)
        #[arg(short, long, env = "DEP_INSIGHT_MANIFEST")]
        manifest: Option<String>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
