//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Gallery Build - Build custom images and publish them to an Azure Compute Gallery
#[derive(Parser, Debug)]
#[command(name = "gallery-build")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace) [default: info, or RUST_LOG]
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every image whose version is not yet published
    Build(commands::build::BuildArgs),

    /// Raise the version in image documents so they are built again
    Bump(commands::bump::BumpArgs),

    /// Resolve images offline and print their properties
    Images(commands::images::ImagesArgs),

    /// Check gallery, common and image documents without contacting Azure
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level.as_deref());

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &self.color),
            Commands::Bump(args) => commands::bump::execute(args, &self.color),
            Commands::Images(args) => commands::images::execute(args),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
        }
    }
}

/// Log to stderr; an explicit `--log-level` wins over `RUST_LOG`.
fn init_logging(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.format_timestamp(None).format_target(false);
    // A logger may already be installed when running under a test harness.
    let _ = builder.try_init();
}
