//! robclass - risk-of-bias experiment runner

use clap::Parser;
use robclass_cli::{execute, report_error, Cli};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("robclass v{} starting", env!("CARGO_PKG_VERSION"));

    match execute(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            e.exit_code()
        }
    }
}
