//! Orchestrator for a complete build run
//!
//! For each image: resolve it, consult the catalog, complete the record and,
//! when the image needs building, write its parameter file and run its build
//! tool (unless builds are skipped).
//!
//! Two scheduling modes exist:
//!
//! - **sequential** (default): every image is resolved and reconciled first,
//!   then built in the requested order. The first error aborts the run.
//! - **concurrent**: one task per image on a pool sized to the number of
//!   images, joined at the end. Builds are long-running subprocesses, so every
//!   image gets its own worker rather than sharing one per CPU core.
//!   Each image keeps its own result, so one failing image does not discard
//!   its siblings' work. Completion order and interleaving of log lines are
//!   not deterministic.
//!
//! Tasks share only read-only state (resolver, settings); every image owns its
//! record and makes its own tool calls.

use std::collections::HashMap;

use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::build::Builder;
use crate::catalog::{self, Catalog};
use crate::error::Result;
use crate::model::Image;
use crate::resolve::{self, Resolver};

/// Everything a run needs to know, fixed before the run starts.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    /// Suffix for transient resource group names, shared by every image.
    pub suffix: String,
    /// Per-image suffix overrides.
    pub image_suffixes: HashMap<String, String>,
    pub concurrent: bool,
    /// Write parameter files but do not run build tools.
    pub skip_build: bool,
}

impl RunSettings {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ..Default::default()
        }
    }

    pub fn suffix_for(&self, image: &str) -> &str {
        self.image_suffixes
            .get(image)
            .map(String::as_str)
            .unwrap_or(&self.suffix)
    }
}

/// The result of processing one image.
#[derive(Debug)]
pub struct ImageOutcome {
    pub name: String,
    pub result: Result<Image>,
}

#[derive(Debug, Default)]
pub struct RunResult {
    pub outcomes: Vec<ImageOutcome>,
}

impl RunResult {
    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// True when at least one image needed a build.
    pub fn any_build(&self) -> bool {
        self.images().any(|image| image.build)
    }
}

pub struct Orchestrator<'a> {
    resolver: &'a Resolver,
    catalog: &'a dyn Catalog,
    builder: &'a dyn Builder,
    settings: RunSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        resolver: &'a Resolver,
        catalog: &'a dyn Catalog,
        builder: &'a dyn Builder,
        settings: RunSettings,
    ) -> Self {
        Self {
            resolver,
            catalog,
            builder,
            settings,
        }
    }

    /// Run for the named images, or for every image directory when `names` is `None`.
    ///
    /// Sequential mode returns the first error; concurrent mode reports every
    /// image's outcome in [`RunResult`].
    pub fn run(&self, names: Option<&[String]>) -> Result<RunResult> {
        let names = match names {
            Some(names) => names.to_vec(),
            None => self.resolver.workspace().image_names()?,
        };
        info!("Processing {} image(s): {}", names.len(), names.join(", "));

        let result = if self.settings.concurrent {
            self.run_concurrent(&names)?
        } else {
            self.run_sequential(&names)?
        };

        if self.settings.skip_build {
            warn!("Skipping build execution because --skip-build was provided");
        }
        Ok(result)
    }

    fn run_sequential(&self, names: &[String]) -> Result<RunResult> {
        let images = names
            .iter()
            .map(|name| self.prepare(name))
            .collect::<Result<Vec<_>>>()?;

        let mut result = RunResult::default();
        for image in images {
            self.build(&image)?;
            result.outcomes.push(ImageOutcome {
                name: image.name.clone(),
                result: Ok(image),
            });
        }
        Ok(result)
    }

    fn run_concurrent(&self, names: &[String]) -> Result<RunResult> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(names.len().max(1))
            .thread_name(|index| format!("image-{}", index))
            .build()?;

        let outcomes = pool.install(|| {
            names
                .par_iter()
                .with_max_len(1)
                .map(|name| ImageOutcome {
                    name: name.clone(),
                    result: self.process(name),
                })
                .collect()
        });

        let result = RunResult { outcomes };
        for failure in result.failures() {
            if let Err(e) = &failure.result {
                warn!("[{}] Failed: {}", failure.name, e);
            }
        }
        Ok(result)
    }

    fn process(&self, name: &str) -> Result<Image> {
        let image = self.prepare(name)?;
        self.build(&image)?;
        Ok(image)
    }

    /// Resolve an image and complete it with the catalog's decision.
    pub fn prepare(&self, name: &str) -> Result<Image> {
        let mut image = self.resolver.resolve(name)?;
        catalog::ensure_subscription(self.catalog, &mut image)?;
        let decision = catalog::reconcile(self.catalog, &image)?;
        resolve::apply_decision(&mut image, &decision, self.settings.suffix_for(name))?;
        info!(
            "[{}] build: {}, resource group: {}",
            image.name,
            image.build,
            image.resource_group().unwrap_or("-")
        );
        Ok(image)
    }

    fn build(&self, image: &Image) -> Result<()> {
        if !image.build {
            return Ok(());
        }

        let parameters = self.builder.write_parameters(image)?;
        if self.settings.skip_build {
            return Ok(());
        }
        info!("[{}] Building with {}", image.name, image.builder);
        self.builder.execute(image, &parameters)
    }
}
