//! Images command implementation
//!
//! Resolves images from their documents without contacting Azure and prints
//! the resulting records. Catalog-dependent fields (`build`, the transient
//! resource group and its location) are left as declared.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use gallery_build::model::Image;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

/// Arguments for the images command
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Repository root containing gallery.yaml and the images directory
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "GALLERY_BUILD_REPO",
        default_value = "."
    )]
    pub repo: PathBuf,

    /// Names of images to print (all images when omitted)
    #[arg(short, long, value_name = "NAME", num_args = 1..)]
    pub images: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,
}

/// Execute the images command
pub fn execute(args: ImagesArgs) -> Result<()> {
    let images = resolve_all(&args)?;
    print!("{}", render(&images, args.format)?);
    Ok(())
}

fn resolve_all(args: &ImagesArgs) -> Result<Vec<Image>> {
    let resolver = super::load_resolver(&args.repo)?;
    let names = super::image_names(&resolver, &args.images)?;
    let mut images = Vec::with_capacity(names.len());
    for name in &names {
        images.push(resolver.resolve(name)?);
    }
    Ok(images)
}

fn render(images: &[Image], format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => {
            let mut text = serde_json::to_string_pretty(images)?;
            text.push('\n');
            text
        }
        Format::Yaml => serde_yaml::to_string(images)?,
    })
}
