//! # Build Step
//!
//! For every image that needs building, the resolved values are written into
//! the parameter file its builder reads, then the builder is run:
//!
//! | Builder | Parameter file | Execution |
//! |---|---|---|
//! | packer | `vars.auto.pkrvars.json` (flat map of declared variables) | `packer init`, `packer build -force` |
//! | azure | `image.parameters.json` (deployment parameters envelope) | `az group create` (transient group only), `az deployment group create` |
//!
//! Both files are written next to the image's configuration document.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde_json::{json, Map, Value as JsonValue};

use crate::azure;
use crate::error::{Error, Result};
use crate::model::{BuilderKind, Image};
use crate::packer;

pub const PACKER_VARS_FILE: &str = "vars.auto.pkrvars.json";
pub const AZURE_PARAMS_FILE: &str = "image.parameters.json";

const DEPLOYMENT_PARAMETERS_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentParameters.json#";
const CONTENT_VERSION: &str = "1.0.0.0";

/// Image properties passed to an Azure Image Builder deployment.
pub const AZURE_PARAMETERS: &[&str] = &[
    "name",
    "location",
    "version",
    "tempResourceGroup",
    "buildResourceGroup",
    "gallery",
    "replicaLocations",
];

/// Trait for build operations - allows mocking in tests.
pub trait Builder: Send + Sync {
    /// Write the parameter file the image's build tool reads and return its path.
    fn write_parameters(&self, image: &Image) -> Result<PathBuf>;

    /// Run the build tool for the image.
    fn execute(&self, image: &Image, parameters: &Path) -> Result<()>;
}

/// [`Builder`] that runs the real `packer` / `az` tools.
#[derive(Debug, Clone)]
pub struct ExternalBuilder {
    /// Template deployed for the azure builder.
    pub template: PathBuf,
    /// Whether build tools may print colour.
    pub color: bool,
}

impl ExternalBuilder {
    pub fn new(template: impl Into<PathBuf>, color: bool) -> Self {
        Self {
            template: template.into(),
            color,
        }
    }
}

impl Builder for ExternalBuilder {
    fn write_parameters(&self, image: &Image) -> Result<PathBuf> {
        match image.builder {
            BuilderKind::Packer => {
                let variables = packer::variables(&image.path)?;
                write_packer_vars(image, &variables)
            }
            BuilderKind::Azure => write_deployment_parameters(image),
        }
    }

    fn execute(&self, image: &Image, parameters: &Path) -> Result<()> {
        match image.builder {
            BuilderKind::Packer => packer::execute(&image.path, &image.name, self.color),
            BuilderKind::Azure => deploy(image, &self.template, parameters),
        }
    }
}

fn deploy(image: &Image, template: &Path, parameters: &Path) -> Result<()> {
    let group = match (&image.temp_resource_group, &image.build_resource_group) {
        (Some(temp), _) => {
            let location = image.location.as_deref().ok_or_else(|| {
                Error::ResourceGroupConfigurationConflict {
                    image: image.name.clone(),
                    message: "tempResourceGroup is set but no location".to_string(),
                }
            })?;
            info!("[{}] Creating resource group {}", image.name, temp);
            azure::cli(&azure::group_create_args(temp, location, image))?;
            temp
        }
        (None, Some(build)) => build,
        (None, None) => {
            return Err(Error::ResourceGroupConfigurationConflict {
                image: image.name.clone(),
                message: "no resource group to deploy the builder into".to_string(),
            })
        }
    };

    info!("[{}] Deploying image builder into {}", image.name, group);
    azure::cli(&azure::deployment_group_create_args(
        group, template, parameters, image,
    ))?;
    Ok(())
}

/// The image's properties as camelCase JSON, the naming both tools use.
fn properties(image: &Image) -> Result<Map<String, JsonValue>> {
    match serde_json::to_value(image)? {
        JsonValue::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn write_json(path: &Path, value: &JsonValue) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Write the packer auto variables file with every declared variable the image has a value for.
pub fn write_packer_vars(image: &Image, variables: &[String]) -> Result<PathBuf> {
    let properties = properties(image)?;
    let vars: Map<String, JsonValue> = variables
        .iter()
        .filter_map(|name| {
            properties
                .get(name)
                .filter(|value| has_value(value))
                .map(|value| (name.clone(), value.clone()))
        })
        .collect();

    let path = image.path.join(PACKER_VARS_FILE);
    info!(
        "[{}] Saving packer variables ({}) to {}",
        image.name,
        vars.keys().cloned().collect::<Vec<_>>().join(", "),
        path.display()
    );
    write_json(&path, &JsonValue::Object(vars))?;
    Ok(path)
}

/// Write the deployment parameters file for the azure builder.
pub fn write_deployment_parameters(image: &Image) -> Result<PathBuf> {
    let properties = properties(image)?;
    let mut parameters = Map::new();
    parameters.insert("image".to_string(), json!({ "value": image.name }));
    for name in AZURE_PARAMETERS {
        if let Some(value) = properties.get(*name).filter(|value| has_value(value)) {
            parameters.insert(name.to_string(), json!({ "value": value }));
        }
    }

    let document = json!({
        "$schema": DEPLOYMENT_PARAMETERS_SCHEMA,
        "contentVersion": CONTENT_VERSION,
        "parameters": parameters,
    });

    let path = image.path.join(AZURE_PARAMS_FILE);
    info!("[{}] Saving deployment parameters to {}", image.name, path.display());
    write_json(&path, &document)?;
    Ok(path)
}

fn has_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
        JsonValue::Number(_) => true,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording builder shared by the unit tests of this crate.

    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct RecordingBuilder {
        pub written: Mutex<Vec<String>>,
        pub executed: Mutex<Vec<String>>,
        pub fail_on: Option<String>,
    }

    impl Builder for RecordingBuilder {
        fn write_parameters(&self, image: &Image) -> Result<PathBuf> {
            self.written.lock().unwrap().push(image.name.clone());
            write_deployment_parameters(image)
        }

        fn execute(&self, image: &Image, _parameters: &Path) -> Result<()> {
            if self.fail_on.as_deref() == Some(image.name.as_str()) {
                return Err(Error::ExternalToolFailure {
                    command: format!("packer build -force {}", image.path.display()),
                    stderr: "exited with exit status: 1".to_string(),
                });
            }
            self.executed.lock().unwrap().push(image.name.clone());
            Ok(())
        }
    }
}
