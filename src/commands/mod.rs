//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `gallery-build` command-line tool, one file per subcommand.
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `gallery_build` library.

pub mod build;
pub mod bump;
pub mod images;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use gallery_build::resolve::{Resolver, Workspace};

/// Load the gallery and common documents of the repository at `repo`.
pub(crate) fn load_resolver(repo: &Path) -> Result<Resolver> {
    let workspace = Workspace::new(repo)
        .with_context(|| format!("Invalid repository path: {}", repo.display()))?;
    Ok(Resolver::load(workspace)?)
}

/// The requested image names, or every image directory when none were given.
pub(crate) fn image_names(resolver: &Resolver, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        Ok(resolver.workspace().image_names()?)
    } else {
        Ok(requested.to_vec())
    }
}
