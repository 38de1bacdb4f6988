use clap::{Parser, Subcommand, ValueEnum};
use frugal_core::RunMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "frugal", version, about = "Cloud cost governance policy engine")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, short = 'c', global = true, default_value = "frugal.yaml", env = "FRUGAL_CONFIG")]
    config: PathBuf,

    /// Log filter, e.g. `debug` or `frugal_runtime=trace`. Defaults to RUST_LOG, then `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate enabled policies and dispatch their actions.
    Run {
        /// Simulate (`dry-run`) or mutate (`apply`).
        #[arg(long, value_enum, default_value_t = Mode::DryRun)]
        mode: Mode,

        /// Process every scope instead of the configured one.
        #[arg(long)]
        all_scopes: bool,

        /// Account scope to process, overriding the configuration.
        #[arg(long, env = "FRUGAL_SCOPE_ID", conflicts_with = "all_scopes")]
        scope: Option<String>,

        /// Write the JSON report here instead of `report.output_file`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and policy file.
    Check,

    /// List enabled policies.
    Policies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    DryRun,
    Apply,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::DryRun => RunMode::DryRun,
            Mode::Apply => RunMode::Apply,
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.cmd {
        Command::Run {
            mode,
            all_scopes,
            scope,
            output,
        } => {
            commands::run::run(commands::run::RunArgs {
                config_path: cli.config,
                mode: mode.into(),
                all_scopes,
                scope,
                output,
            })
            .await?
        }
        Command::Check => commands::check::run(&cli.config)?,
        Command::Policies => commands::policies::run(&cli.config)?,
    }

    Ok(())
}
