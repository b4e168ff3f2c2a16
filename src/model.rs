//! Typed records built from configuration documents.
//!
//! - [`Gallery`]: the compute gallery every image publishes into.
//! - [`ImageProperties`]: a partial property bag. The common document and each
//!   image's own document are both read into one; the image's values are then
//!   laid over the common ones.
//! - [`Image`]: the fully merged record for one buildable image.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::markup::{Element, RawDocument, Value};

/// Selectors accepted for [`BuilderKind::Packer`].
pub const PACKER_ALIASES: &[&str] = &["packer", "pkr"];

/// Selectors accepted for [`BuilderKind::Azure`].
pub const AZURE_ALIASES: &[&str] = &["azure", "aib", "imagebuilder", "azure-image-builder"];

/// The external tool an image is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
    #[default]
    Packer,
    Azure,
}

impl BuilderKind {
    /// Map a builder selector to a kind. `None` means the alias is unknown.
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.trim().to_ascii_lowercase();
        if PACKER_ALIASES.contains(&alias.as_str()) {
            Some(BuilderKind::Packer)
        } else if AZURE_ALIASES.contains(&alias.as_str()) {
            Some(BuilderKind::Azure)
        } else {
            None
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderKind::Packer => write!(f, "packer"),
            BuilderKind::Azure => write!(f, "azure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub name: String,
    pub resource_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl Gallery {
    /// Build from a document that already passed the gallery schema.
    pub fn from_document(document: &RawDocument, path: &Path) -> Result<Self> {
        let name = scalar(document, path, "name")?;
        let resource_group = scalar(document, path, "resourceGroup")?;
        match (name, resource_group) {
            (Some(name), Some(resource_group)) => Ok(Self {
                name,
                resource_group,
                subscription: scalar(document, path, "subscription")?,
            }),
            (None, _) => Err(missing(path, "name")),
            (_, None) => Err(missing(path, "resourceGroup")),
        }
    }
}

/// Declared (not yet resolved) image properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    pub publisher: Option<String>,
    pub offer: Option<String>,
    pub sku: Option<String>,
    pub version: Option<String>,
    pub os: Option<String>,
    pub description: Option<String>,
    pub replica_locations: Option<Vec<String>>,
    pub builder: Option<String>,
    pub build_resource_group: Option<String>,
    pub temp_resource_group: Option<String>,
    pub location: Option<String>,
    pub key_vault: Option<String>,
    pub virtual_network: Option<String>,
    pub virtual_network_subnet: Option<String>,
    pub virtual_network_resource_group: Option<String>,
    pub subscription: Option<String>,
}

impl ImageProperties {
    /// Read the known properties of a document. Keys outside the schema are
    /// rejected earlier by [`crate::config::validate`]; `name` is ignored
    /// because the directory name identifies an image.
    pub fn from_document(document: &RawDocument, path: &Path) -> Result<Self> {
        Ok(Self {
            publisher: scalar(document, path, "publisher")?,
            offer: scalar(document, path, "offer")?,
            sku: scalar(document, path, "sku")?,
            version: scalar(document, path, "version")?,
            os: scalar(document, path, "os")?,
            description: scalar(document, path, "description")?,
            replica_locations: scalar_list(document, path, "replicaLocations")?,
            builder: scalar(document, path, "builder")?,
            build_resource_group: scalar(document, path, "buildResourceGroup")?,
            temp_resource_group: scalar(document, path, "tempResourceGroup")?,
            location: scalar(document, path, "location")?,
            key_vault: scalar(document, path, "keyVault")?,
            virtual_network: scalar(document, path, "virtualNetwork")?,
            virtual_network_subnet: scalar(document, path, "virtualNetworkSubnet")?,
            virtual_network_resource_group: scalar(
                document,
                path,
                "virtualNetworkResourceGroup",
            )?,
            subscription: scalar(document, path, "subscription")?,
        })
    }

    /// Lay `self` over `defaults`: every property `self` declares wins.
    pub fn overlay(self, defaults: &ImageProperties) -> ImageProperties {
        let d = defaults.clone();
        ImageProperties {
            publisher: self.publisher.or(d.publisher),
            offer: self.offer.or(d.offer),
            sku: self.sku.or(d.sku),
            version: self.version.or(d.version),
            os: self.os.or(d.os),
            description: self.description.or(d.description),
            replica_locations: self.replica_locations.or(d.replica_locations),
            builder: self.builder.or(d.builder),
            build_resource_group: self.build_resource_group.or(d.build_resource_group),
            temp_resource_group: self.temp_resource_group.or(d.temp_resource_group),
            location: self.location.or(d.location),
            key_vault: self.key_vault.or(d.key_vault),
            virtual_network: self.virtual_network.or(d.virtual_network),
            virtual_network_subnet: self.virtual_network_subnet.or(d.virtual_network_subnet),
            virtual_network_resource_group: self
                .virtual_network_resource_group
                .or(d.virtual_network_resource_group),
            subscription: self.subscription.or(d.subscription),
        }
    }
}

/// A fully merged image record.
///
/// `build`, `location` and `temp_resource_group` are filled in once the
/// catalog has been consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    pub path: PathBuf,
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub replica_locations: Vec<String>,
    pub builder: BuilderKind,
    pub gallery: Gallery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    pub build: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_resource_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_resource_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_vault: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_network_subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_network_resource_group: Option<String>,
}

impl Image {
    /// The resource group the build runs in, whichever kind is configured.
    pub fn resource_group(&self) -> Option<&str> {
        self.temp_resource_group
            .as_deref()
            .or(self.build_resource_group.as_deref())
    }
}

fn missing(path: &Path, key: &str) -> Error {
    Error::MissingRequiredProperty {
        path: path.display().to_string(),
        key: key.to_string(),
    }
}

fn scalar(document: &RawDocument, path: &Path, key: &str) -> Result<Option<String>> {
    match document.get(key) {
        None => Ok(None),
        Some(Value::Scalar(s)) if s.is_empty() => Ok(None),
        Some(Value::Scalar(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::InvalidPropertyType {
            path: path.display().to_string(),
            key: key.to_string(),
            expected: "a single value",
        }),
    }
}

fn scalar_list(document: &RawDocument, path: &Path, key: &str) -> Result<Option<Vec<String>>> {
    let invalid = || Error::InvalidPropertyType {
        path: path.display().to_string(),
        key: key.to_string(),
        expected: "a list of values",
    };

    match document.get(key) {
        None => Ok(None),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Element::Scalar(s) => Ok(s.clone()),
                Element::Object(_) => Err(invalid()),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}
