use tracing_subscriber::EnvFilter;

fn main() {
    use dep_insight::cli::parse;
    let cli = parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dep_insight={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let code = dep_insight::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
