//! exposecontroller - exposes labelled Kubernetes services

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

mod commands;
mod error;
mod exit_codes;
mod liveness;
mod logging;

use commands::ClusterOptions;
use error::CliError;
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "exposecontroller")]
#[command(version)]
#[command(
    about = "Expose services labelled expose=true through ingresses, routes, node ports or load balancers",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Namespace holding the exposecontroller ConfigMap (default: the client's namespace)
    #[arg(long, global = true, env = "KUBERNETES_NAMESPACE")]
    namespace: Option<String>,

    /// Name of the configuration ConfigMap
    #[arg(long, global = true, default_value = expose_core::constants::CONFIG_MAP_NAME)]
    config_name: String,

    /// Address of the liveness probe listener
    #[arg(long, global = true, default_value = "0.0.0.0:8080")]
    liveness_addr: SocketAddr,

    /// Log filter, e.g. `debug` or `expose_kube=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch services and keep them exposed (default)
    Run,

    /// Validate the configuration against the connected cluster
    Check {
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();

    if let Err(err) = execute(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    logging::init(cli.log_level.as_deref(), cli.log_format)?;

    let options = ClusterOptions {
        namespace: cli.namespace,
        config_name: cli.config_name,
    };

    match cli.command {
        Some(Commands::Run) | None => commands::run::run(&options, cli.liveness_addr).await,
        Some(Commands::Check { json }) => commands::check::run(&options, json).await,
    }
}
