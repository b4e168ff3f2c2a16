//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a gallery
//! repository without contacting Azure or running any build tool.
//!
//! ## Functionality
//!
//! - **Gallery Document**: `gallery.yaml` exists once, parses and declares
//!   `name` and `resourceGroup`.
//! - **Common Document**: `images/images.yaml`, when present, only declares
//!   properties images may inherit.
//! - **Image Documents**: every selected image resolves, meaning no unknown
//!   properties, all required properties present after merging, a known
//!   builder, and a consistent resource group placement when one is declared.
//!
//! Every image is reported, not only the first invalid one.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gallery_build::output::{emoji, failure_line, OutputConfig};

/// Check gallery, common and image documents
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Repository root containing gallery.yaml and the images directory
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "GALLERY_BUILD_REPO",
        default_value = "."
    )]
    pub repo: PathBuf,

    /// Names of images to validate (all images when omitted)
    #[arg(short, long, value_name = "NAME", num_args = 1..)]
    pub images: Vec<String>,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Validating gallery repository: {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.repo.display()
    );

    let resolver = match super::load_resolver(&args.repo) {
        Ok(resolver) => resolver,
        Err(e) => {
            println!("{} {}", emoji(&out, "❌", "[ERR]"), e);
            return Err(anyhow::anyhow!("Validation failed: {}", e));
        }
    };

    let gallery = resolver.gallery();
    println!(
        "{} Gallery {} in resource group {}",
        emoji(&out, "✅", "[OK]"),
        gallery.name,
        gallery.resource_group
    );

    let names = super::image_names(&resolver, &args.images)?;
    println!(
        "\n{} Checking {} image(s)...",
        emoji(&out, "🔄", "[CHECK]"),
        names.len()
    );

    let mut invalid = 0;
    for name in &names {
        match resolver.resolve(name) {
            Ok(image) => println!(
                "{} {} {} ({})",
                emoji(&out, "✅", "[OK]"),
                image.name,
                image.version,
                image.builder
            ),
            Err(e) => {
                println!("{}", failure_line(&out, name, &e));
                invalid += 1;
            }
        }
    }

    println!();
    if invalid > 0 {
        println!(
            "{} {} of {} image(s) invalid",
            emoji(&out, "❌", "[ERR]"),
            invalid,
            names.len()
        );
        anyhow::bail!("Validation failed: {} invalid image(s)", invalid);
    }

    println!("{} All image(s) valid", emoji(&out, "✅", "[OK]"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const IMAGE: &str = "publisher: Contoso\noffer: DevBox\nsku: win11\nversion: 1.0.0\nos: Windows\nreplicaLocations:\n  - eastus\n";

    fn repo(images: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("gallery.yaml"), "name: Contoso\nresourceGroup: rg1\n").unwrap();
        for (name, text) in images {
            let dir = temp.path().join("images").join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("image.yaml"), text).unwrap();
        }
        temp
    }

    fn args(repo: &TempDir) -> ValidateArgs {
        ValidateArgs {
            repo: repo.path().to_path_buf(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_valid_repository() {
        let repo = repo(&[("A", IMAGE), ("B", IMAGE)]);
        assert!(execute(args(&repo), "never").is_ok());
    }

    #[test]
    fn test_invalid_image_reported() {
        let conflicting = format!("{}buildResourceGroup: rg-build\nlocation: eastus\n", IMAGE);
        let repo = repo(&[("A", IMAGE), ("B", &conflicting)]);
        let err = execute(args(&repo), "never").unwrap_err();
        assert!(err.to_string().contains("1 invalid image(s)"));
    }

    #[test]
    fn test_only_selected_images_checked() {
        let repo = repo(&[("A", IMAGE), ("B", "os: Windows\n")]);
        let mut args = args(&repo);
        args.images = vec!["A".to_string()];
        assert!(execute(args, "never").is_ok());
    }

    #[test]
    fn test_missing_gallery() {
        let temp = TempDir::new().unwrap();
        let err = execute(
            ValidateArgs {
                repo: temp.path().to_path_buf(),
                images: Vec::new(),
            },
            "never",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Validation failed"));
    }
}
