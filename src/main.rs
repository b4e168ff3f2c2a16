//! # Gallery Build CLI
//!
//! This is the binary entry point for the `gallery-build` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Turning any fatal error into a single diagnostic and a non-zero exit.
//!
//! The core logic lives in the `gallery_build` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
