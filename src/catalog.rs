//! # Catalog Reconciliation
//!
//! Decides, per image, whether a build is needed by looking at what the
//! compute gallery already holds. The check is an idempotent "ensure":
//!
//! - no image definition: create it, build (a new definition needs its first
//!   version);
//! - definition exists, version exists: do not build, warn (the version has to
//!   be bumped to build again; existing versions are never overwritten);
//! - definition exists, version missing: build.
//!
//! Re-running with an unchanged version is therefore a no-op.
//!
//! The gallery is reached through the [`Catalog`] trait. [`AzureCatalog`] runs
//! the `az` CLI; tests substitute an in-memory implementation.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::azure;
use crate::error::{Error, Result};
use crate::model::Image;

/// The parts of an image definition the engine uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Outcome of [`reconcile`] for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDecision {
    pub build: bool,
    /// The existing or freshly created definition, when the catalog returned one.
    pub definition: Option<Definition>,
}

/// Trait for catalog operations - allows mocking in tests.
///
/// "Not found" is `Ok(None)`, never an error.
pub trait Catalog: Send + Sync {
    /// The subscription the catalog client is currently using.
    fn current_subscription(&self) -> Result<String>;

    fn show_definition(&self, image: &Image) -> Result<Option<Definition>>;

    fn create_definition(&self, image: &Image) -> Result<Option<Definition>>;

    fn show_version(&self, image: &Image) -> Result<Option<JsonValue>>;
}

/// [`Catalog`] backed by the `az` CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureCatalog;

fn decode_definition(command: &[String], value: Option<JsonValue>) -> Result<Option<Definition>> {
    value
        .map(|v| {
            serde_json::from_value(v).map_err(|e| Error::ResponseDecodeFailure {
                command: format!("az {}", command.join(" ")),
                message: e.to_string(),
            })
        })
        .transpose()
}

impl Catalog for AzureCatalog {
    fn current_subscription(&self) -> Result<String> {
        let args = azure::account_show_args();
        let account = azure::cli(&args)?;
        account
            .as_ref()
            .and_then(|a| a.get("id"))
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::ResponseDecodeFailure {
                command: format!("az {}", args.join(" ")),
                message: "response has no subscription id".to_string(),
            })
    }

    fn show_definition(&self, image: &Image) -> Result<Option<Definition>> {
        let args = azure::image_definition_show_args(image);
        decode_definition(&args, azure::cli(&args)?)
    }

    fn create_definition(&self, image: &Image) -> Result<Option<Definition>> {
        let args = azure::image_definition_create_args(image);
        decode_definition(&args, azure::cli(&args)?)
    }

    fn show_version(&self, image: &Image) -> Result<Option<JsonValue>> {
        azure::cli(&azure::image_version_show_args(image))
    }
}

/// Fill in subscriptions neither the image nor the gallery declared.
///
/// An image without one gets the catalog's current subscription; a gallery
/// without one gets the image's.
pub fn ensure_subscription(catalog: &dyn Catalog, image: &mut Image) -> Result<()> {
    if image.subscription.is_none() {
        let subscription = catalog.current_subscription()?;
        info!("[{}] Using current subscription {}", image.name, subscription);
        image.subscription = Some(subscription);
    }
    if image.gallery.subscription.is_none() {
        image.gallery.subscription = image.subscription.clone();
    }
    Ok(())
}

/// Ensure the image definition exists and decide whether the version needs building.
pub fn reconcile(catalog: &dyn Catalog, image: &Image) -> Result<CatalogDecision> {
    let name = &image.name;
    let version = &image.version;

    info!("[{}] Checking if image definition exists", name);
    match catalog.show_definition(image)? {
        Some(definition) => {
            info!("[{}] Found existing image definition", name);
            info!("[{}] Checking if image version {} exists", name, version);

            let build = if catalog.show_version(image)?.is_some() {
                warn!(
                    "{} was not built because version {} already exists. Please update the version number or delete the existing image version and try again.",
                    name, version
                );
                false
            } else {
                info!("[{}] Image version {} does not exist", name, version);
                true
            };

            Ok(CatalogDecision {
                build,
                definition: Some(definition),
            })
        }
        None => {
            info!("[{}] Image definition does not exist, creating it", name);
            let definition = catalog.create_definition(image)?;
            Ok(CatalogDecision {
                build: true,
                definition,
            })
        }
    }
}
