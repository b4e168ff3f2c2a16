//! GitHub Actions output variables.
//!
//! After a run inside a workflow, two outputs are published:
//!
//! - `matrix`: `{"include": [...]}` with every image that needs a build, ready
//!   for a job matrix;
//! - `build`: `true` when at least one image needs a build.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::model::Image;
use crate::orchestrator::RunResult;

pub const ACTIONS_VAR: &str = "GITHUB_ACTIONS";
pub const OUTPUT_VAR: &str = "GITHUB_OUTPUT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiEnvironment {
    /// File outputs are appended to; workflow commands on stdout when absent.
    pub output_file: Option<PathBuf>,
}

impl CiEnvironment {
    /// The CI environment the process runs in, if any.
    pub fn detect() -> Option<Self> {
        env::var_os(ACTIONS_VAR)?;
        let output_file = env::var_os(OUTPUT_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Some(Self { output_file })
    }

    /// Publish the outputs for a finished run.
    pub fn publish(&self, result: &RunResult) -> Result<()> {
        let outputs = outputs(result)?;

        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                for (name, value) in &outputs {
                    writeln!(file, "{}={}", name, value)?;
                }
                info!("Wrote outputs {} to {}", output_names(&outputs), path.display());
            }
            None => {
                for (name, value) in &outputs {
                    println!("::set-output name={}::{}", name, value);
                }
            }
        }
        Ok(())
    }
}

fn output_names(outputs: &[(String, String)]) -> String {
    outputs
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct Matrix<'a> {
    include: Vec<&'a Image>,
}

/// The `matrix` and `build` outputs, each as a single-line string.
pub fn outputs(result: &RunResult) -> Result<Vec<(String, String)>> {
    let include = result.images().filter(|image| image.build).collect();
    let matrix = serde_json::to_string(&Matrix { include })?;
    Ok(vec![
        ("matrix".to_string(), matrix),
        ("build".to_string(), result.any_build().to_string()),
    ])
}
