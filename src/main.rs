//! diagconf: resolve diagnostics run configurations from the command line
//!
//! Prints the resolved (and granulated) configuration list as JSON so that a
//! runner can start one unit of work per entry.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
