//! Entry point of the `station` binary.
//!
//! No subcommand runs the supervisor; the subcommands are readers over the
//! same root directory. Exit code 1 on any error, with the message on
//! stderr.

use std::process::ExitCode;

use clap::Parser;

use station_core::{
    print_activity, print_logs, print_metrics, stream_events, zinnia, Cli, Commands, Config,
    Station, StationError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // The supervisor's log stream is its stdout. Reader commands keep
    // stdout machine-readable and send diagnostics to stderr.
    init_tracing(cli.command.is_some());

    let cfg = cli.build_config();
    let result = match &cli.command {
        None => run_station(cfg).await,
        Some(Commands::Metrics { follow }) => print_metrics(&cfg, *follow).await,
        Some(Commands::Logs { follow }) => print_logs(&cfg, *follow).await,
        Some(Commands::Activity { follow }) => print_activity(&cfg, *follow).await,
        Some(Commands::Events) => stream_events(&cfg).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run_station(cfg: Config) -> Result<(), StationError> {
    let wallet = cfg
        .wallet_address
        .clone()
        .ok_or(StationError::WalletRequired)?;
    let modules = vec![zinnia(&cfg, &wallet)];
    Station::new(cfg).run(modules).await
}

fn init_tracing(to_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}
