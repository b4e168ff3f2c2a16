//! Thin wrapper around the `packer` command line.

use std::path::Path;
use std::process::Command;

use log::{info, warn};
use regex::Regex;

use crate::error::{Error, Result};

const PACKER: &str = "packer";

/// Variables assumed when `packer inspect` cannot tell which ones a template declares.
pub const DEFAULT_VARIABLES: &[&str] = &[
    "subscription",
    "name",
    "location",
    "version",
    "tempResourceGroup",
    "buildResourceGroup",
    "gallery",
    "replicaLocations",
    "keyVault",
    "virtualNetwork",
    "virtualNetworkSubnet",
    "virtualNetworkResourceGroup",
];

fn default_variables() -> Vec<String> {
    DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
}

/// Names of the input variables declared by the template in `dir`.
pub fn variables(dir: &Path) -> Result<Vec<String>> {
    let args = ["inspect".to_string(), "-machine-readable".to_string(), dir.display().to_string()];
    info!("Running packer command: {} {}", PACKER, args.join(" "));

    let output = match Command::new(PACKER).args(&args).output() {
        Ok(output) if output.status.success() => output,
        Ok(_) | Err(_) => {
            warn!("packer inspect failed for {}, using default variables", dir.display());
            return Ok(default_variables());
        }
    };

    let names = parse_variables(&String::from_utf8_lossy(&output.stdout))?;
    if names.is_empty() {
        return Ok(default_variables());
    }
    Ok(names)
}

/// Extract `var.<name>:` entries from `packer inspect -machine-readable` output.
///
/// Machine-readable output escapes newlines inside a message as a literal
/// `\n`, so both separators are accepted.
pub fn parse_variables(output: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(r"(?m)(?:^|\\n)var\.([A-Za-z0-9_-]+):")?;
    let mut names: Vec<String> = Vec::new();
    for captures in pattern.captures_iter(output) {
        let name = captures[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

fn run(subcommand: &[&str], dir: &Path, image: &str) -> Result<()> {
    let mut command = Command::new(PACKER);
    command.args(subcommand).arg(dir);
    let display = format!("{} {} {}", PACKER, subcommand.join(" "), dir.display());

    info!("[{}] Running packer command: {}", image, display);
    let status = command.status().map_err(|e| Error::ExternalToolFailure {
        command: display.clone(),
        stderr: e.to_string(),
    })?;
    info!("[{}] {} exited with {}", image, display, status);

    if !status.success() {
        return Err(Error::ExternalToolFailure {
            command: display,
            stderr: format!("exited with {}", status),
        });
    }
    Ok(())
}

/// Install the plugins the template in `dir` requires.
pub fn init(dir: &Path, image: &str) -> Result<()> {
    run(&["init"], dir, image)
}

/// Build the template in `dir`, replacing existing artifacts.
pub fn build(dir: &Path, image: &str, color: bool) -> Result<()> {
    run(&build_args(color), dir, image)
}

fn build_args(color: bool) -> Vec<&'static str> {
    let mut args = vec!["build", "-force"];
    if !color {
        args.push("-color=false");
    }
    args
}

/// `packer init` then `packer build -force`; a failing init skips the build.
pub fn execute(dir: &Path, image: &str, color: bool) -> Result<()> {
    init(dir, image)?;
    build(dir, image, color)
}
