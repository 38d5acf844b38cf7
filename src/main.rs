use std::process;

use clap::Parser;
use sheetreport::cli::{self, Cli};
use sheetreport::ReportError;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG first, then SHEETREPORT_LOG, then -v
    let log_level =
        std::env::var("SHEETREPORT_LOG").unwrap_or_else(|_| cli.log_level().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {e:#}");

        let exit_code = match e.downcast_ref::<ReportError>() {
            Some(err) if err.is_invalid_input() => 2,
            Some(ReportError::Io { .. }) => 3,
            Some(ReportError::Http(_) | ReportError::HttpStatus(_) | ReportError::Json(_)) => 4,
            _ => 1,
        };
        process::exit(exit_code);
    }
}
