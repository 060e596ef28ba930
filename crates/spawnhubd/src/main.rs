//! spawnhubd: the spawnhub daemon.
//!
//! `spawnhubd watch` is the long-running daemon: it owns the state store,
//! runs the background check monitor and serves the control API. The other
//! subcommands drive services through that API:
//!
//! ```text
//! spawnhubd --config /etc/spawnhub/spawnhub.toml watch
//! spawnhubd apply nb-alice-1.json
//! spawnhubd start nb-alice-1
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(
    name = "spawnhubd",
    about = "spawnhub: service lifecycle orchestrator",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true, default_value = "/etc/spawnhub/spawnhub.toml")]
    config: PathBuf,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Store a service description read from a JSON file.
    Apply { file: PathBuf },
    /// Create the service's exposure, workload and route.
    Start { label: String },
    /// Remove the service's route, workload and exposure.
    Stop { label: String },
    /// Refresh the service's status message from its logs.
    Check { label: String },
    /// Stop, then start.
    Restart { label: String },
    /// Flag a running service for restart.
    MarkNeedRestart { label: String },
    /// Stop the service and delete its record.
    Reap { label: String },
    /// List stored services.
    List,
    /// Print the manifests `start` would submit, without contacting the cluster.
    Render { label: String },
    /// Run the daemon: check monitor and control API, until Ctrl-C.
    Watch,
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,spawnhub=debug"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().with_ansi(false).json()).try_init()?,
        LogFormat::Text => registry.with(fmt::layer()).try_init()?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = commands::load_config(&cli.config)?;

    match cli.command {
        Command::Apply { file } => commands::apply(&config, &file).await,
        Command::Start { label } => commands::start(&config, &label).await,
        Command::Stop { label } => commands::stop(&config, &label).await,
        Command::Check { label } => commands::check(&config, &label).await,
        Command::Restart { label } => commands::restart(&config, &label).await,
        Command::MarkNeedRestart { label } => commands::mark_need_restart(&config, &label).await,
        Command::Reap { label } => commands::reap(&config, &label).await,
        Command::List => commands::list(&config).await,
        Command::Render { label } => commands::render(&config, &label).await,
        Command::Watch => commands::watch(&config).await,
    }
}
