//! Build command implementation
//!
//! Runs the full pipeline for the selected images: resolve, reconcile with the
//! gallery, write parameter files and run each image's builder. Inside GitHub
//! Actions the `matrix` and `build` outputs are published afterwards.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gallery_build::build::ExternalBuilder;
use gallery_build::catalog::AzureCatalog;
use gallery_build::ci::CiEnvironment;
use gallery_build::defaults::{default_suffix, AZURE_TEMPLATE};
use gallery_build::orchestrator::{Orchestrator, RunResult, RunSettings};
use gallery_build::output::{emoji, failure_line, image_line, OutputConfig};

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Repository root containing gallery.yaml and the images directory
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "GALLERY_BUILD_REPO",
        default_value = "."
    )]
    pub repo: PathBuf,

    /// Names of images to build (all images when omitted)
    #[arg(short, long, value_name = "NAME", num_args = 1..)]
    pub images: Vec<String>,

    /// Suffix appended to transient resource group names (current UTC time when omitted)
    #[arg(short, long, value_name = "SUFFIX")]
    pub suffix: Option<String>,

    /// Suffix for a single image, overriding --suffix
    #[arg(long = "image-suffix", value_name = "NAME=SUFFIX", value_parser = parse_image_suffix)]
    pub image_suffixes: Vec<(String, String)>,

    /// Process images concurrently; log output is not ordered
    #[arg(short = 'a', long)]
    pub concurrent: bool,

    /// Write parameter files but do not run packer or Azure Image Builder
    #[arg(long)]
    pub skip_build: bool,

    /// Template deployed for Azure Image Builder images
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,
}

fn parse_image_suffix(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, suffix)) if !name.is_empty() && !suffix.is_empty() => {
            Ok((name.to_string(), suffix.to_string()))
        }
        _ => Err(format!("expected NAME=SUFFIX, got '{}'", value)),
    }
}

impl BuildArgs {
    fn settings(&self) -> RunSettings {
        RunSettings {
            suffix: self.suffix.clone().unwrap_or_else(default_suffix),
            image_suffixes: self.image_suffixes.iter().cloned().collect::<HashMap<_, _>>(),
            concurrent: self.concurrent,
            skip_build: self.skip_build,
        }
    }
}

/// Execute the build command
pub fn execute(args: BuildArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let resolver = super::load_resolver(&args.repo)?;
    let names = super::image_names(&resolver, &args.images)?;

    println!(
        "{} Gallery {} ({} image(s))",
        emoji(&out, "🔍", "[SCAN]"),
        resolver.gallery().name,
        names.len()
    );

    let template = args
        .template
        .clone()
        .unwrap_or_else(|| resolver.workspace().repo_root.join(AZURE_TEMPLATE));
    let catalog = AzureCatalog;
    let builder = ExternalBuilder::new(template, out.use_color);
    let orchestrator = Orchestrator::new(&resolver, &catalog, &builder, args.settings());

    let result = orchestrator.run(Some(names.as_slice()))?;
    print_summary(&out, &result, args.skip_build);

    if let Some(ci) = CiEnvironment::detect() {
        ci.publish(&result)?;
    }

    let failed = result.failures().count();
    if failed > 0 {
        anyhow::bail!("{} of {} image(s) failed", failed, result.outcomes.len());
    }
    Ok(())
}

fn print_summary(out: &OutputConfig, result: &RunResult, skip_build: bool) {
    println!();
    for outcome in &result.outcomes {
        match &outcome.result {
            Ok(image) => println!("   {}", image_line(out, image)),
            Err(e) => println!("   {}", failure_line(out, &outcome.name, e)),
        }
    }

    let built = result.images().filter(|image| image.build).count();
    if result.is_success() {
        let verb = if skip_build { "prepared" } else { "built" };
        println!(
            "{} {} image(s) {}, {} already published",
            emoji(out, "✅", "[OK]"),
            built,
            verb,
            result.outcomes.len() - built
        );
    }
}
