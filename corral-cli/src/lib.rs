//! Command-line interface for Corral's offline reconciliation runs.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod reconcile;

pub use error::CliError;
use reconcile::{ReconcileArgs, run_reconcile};

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_NOMINATIM_URL: &str = "nominatim-url";
const ARG_USER_AGENT: &str = "user-agent";
const ARG_THRESHOLD: &str = "threshold";
const ARG_LINK_FLOOR: &str = "link-floor";
const ARG_REVIEW_SPREAD: &str = "review-spread";
const ARG_TIE_BREAK: &str = "tie-break";
const ARG_RANKING: &str = "ranking";
const ARG_GEOCODE_CONCURRENCY: &str = "geocode-concurrency";
const ARG_GEOCODE_TIMEOUT_SECS: &str = "geocode-timeout-secs";
const ENV_INPUT: &str = "CORRAL_CMDS_RECONCILE_INPUTS";
const ENV_OUTPUT: &str = "CORRAL_CMDS_RECONCILE_OUTPUT";

/// Run the Corral CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments, configuration, inputs or the run
/// itself fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Reconcile(args) => run_reconcile(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "corral",
    about = "Reconcile western-wear retailer listings from several providers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge raw provider listings into deduplicated, geocoded stores.
    Reconcile(ReconcileArgs),
}

#[cfg(test)]
mod tests;
