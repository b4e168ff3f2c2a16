//! Bump command implementation
//!
//! Raises the `version` in image documents so the next `build` publishes a
//! new image version. Patch is bumped unless `--major` or `--minor` is given.
//! Only the images directory is read, so no gallery document is needed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gallery_build::output::{emoji, OutputConfig};
use gallery_build::resolve::Workspace;
use gallery_build::version::{self, BumpKind};

/// Arguments for the bump command
#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Repository root containing the images directory
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "GALLERY_BUILD_REPO",
        default_value = "."
    )]
    pub repo: PathBuf,

    /// Names of images to bump (all images when omitted)
    #[arg(short, long, value_name = "NAME", num_args = 1..)]
    pub images: Vec<String>,

    /// Bump the major version, resetting minor and patch
    #[arg(long, conflicts_with = "minor")]
    pub major: bool,

    /// Bump the minor version, resetting patch
    #[arg(long)]
    pub minor: bool,
}

impl BumpArgs {
    fn kind(&self) -> BumpKind {
        if self.major {
            BumpKind::Major
        } else if self.minor {
            BumpKind::Minor
        } else {
            BumpKind::Patch
        }
    }
}

/// Execute the bump command
pub fn execute(args: BumpArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let workspace = Workspace::new(&args.repo)
        .with_context(|| format!("Invalid repository path: {}", args.repo.display()))?;

    let bumps = version::bump_images(&workspace, &args.images, args.kind())?;
    for bump in &bumps {
        println!(
            "{} {} {} -> {}",
            emoji(&out, "⬆️", "[BUMP]"),
            bump.image,
            bump.from,
            bump.to
        );
    }
    println!(
        "{} Bumped {} image(s)",
        emoji(&out, "✅", "[OK]"),
        bumps.len()
    );
    Ok(())
}
