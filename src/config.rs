//! # Configuration Documents
//!
//! Locating, parsing and validating the three kinds of configuration
//! document:
//!
//! - **gallery** (`gallery.yaml` at the repository root, required)
//! - **common** (`images.yaml` in the images directory, optional)
//! - **image** (`image.yaml` in each image directory, required)
//!
//! A document may use either the `.yaml` or the `.yml` extension, but exactly
//! one of the two must exist. After the whole document has been parsed it is
//! checked against a [`DocumentSchema`]: every required key must be present
//! with a value, and only allowed keys may appear.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::markup::{self, RawDocument};

/// Required and allowed top-level keys of one kind of document.
///
/// An empty `allowed` list permits any key.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSchema {
    pub required: &'static [&'static str],
    pub allowed: &'static [&'static str],
}

pub const GALLERY_SCHEMA: DocumentSchema = DocumentSchema {
    required: &["name", "resourceGroup"],
    allowed: &["name", "resourceGroup", "subscription"],
};

pub const COMMON_SCHEMA: DocumentSchema = DocumentSchema {
    required: &[],
    allowed: &[
        "publisher",
        "offer",
        "replicaLocations",
        "builder",
        "buildResourceGroup",
        "keyVault",
        "virtualNetwork",
        "virtualNetworkSubnet",
        "virtualNetworkResourceGroup",
        "subscription",
    ],
};

/// Schema of an image's own document. Required keys are checked after the
/// merge with the common document, so only `allowed` applies here.
pub const IMAGE_SCHEMA: DocumentSchema = DocumentSchema {
    required: &[],
    allowed: &[
        "name",
        "publisher",
        "offer",
        "sku",
        "version",
        "os",
        "replicaLocations",
        "description",
        "builder",
        "buildResourceGroup",
        "tempResourceGroup",
        "location",
        "keyVault",
        "virtualNetwork",
        "virtualNetworkSubnet",
        "virtualNetworkResourceGroup",
        "subscription",
    ],
};

/// Whether a document has to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// A parsed document together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: RawDocument,
}

/// Find `{base_name}.yaml` or `{base_name}.yml` in `dir`.
///
/// Returns `Ok(None)` only for an optional document that does not exist.
pub fn find_document(dir: &Path, base_name: &str, presence: Presence) -> Result<Option<PathBuf>> {
    match presence {
        Presence::Required => find_required(dir, base_name).map(Some),
        Presence::Optional if !dir.is_dir() => Ok(None),
        Presence::Optional => existing_document(dir, base_name),
    }
}

/// Find a document that must exist in `dir`.
pub fn find_required(dir: &Path, base_name: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    existing_document(dir, base_name)?.ok_or_else(|| Error::AmbiguousOrMissingDocument {
        dir: dir.display().to_string(),
        message: format!("File {0}.yaml or {0}.yml not found", base_name),
    })
}

fn existing_document(dir: &Path, base_name: &str) -> Result<Option<PathBuf>> {
    let yaml = dir.join(format!("{}.yaml", base_name));
    let yml = dir.join(format!("{}.yml", base_name));

    match (yaml.is_file(), yml.is_file()) {
        (true, true) => Err(Error::AmbiguousOrMissingDocument {
            dir: dir.display().to_string(),
            message: format!(
                "Found both {0}.yaml and {0}.yml, only one {0} document is allowed",
                base_name
            ),
        }),
        (true, false) => Ok(Some(yaml)),
        (false, true) => Ok(Some(yml)),
        (false, false) => Ok(None),
    }
}

/// Locate, parse and validate a document that may be absent.
pub fn load_optional(
    dir: &Path,
    base_name: &str,
    schema: &DocumentSchema,
) -> Result<Option<LoadedDocument>> {
    let Some(path) = find_document(dir, base_name, Presence::Optional)? else {
        debug!("No {} document in {}", base_name, dir.display());
        return Ok(None);
    };
    read_document(path, schema).map(Some)
}

/// Locate, parse and validate a document that must exist.
pub fn load_required(dir: &Path, base_name: &str, schema: &DocumentSchema) -> Result<LoadedDocument> {
    read_document(find_required(dir, base_name)?, schema)
}

fn read_document(path: PathBuf, schema: &DocumentSchema) -> Result<LoadedDocument> {
    let text = std::fs::read_to_string(&path)?;
    let document = markup::parse_source(&text, &path.display().to_string())?;
    validate(&path, &document, schema)?;
    Ok(LoadedDocument { path, document })
}

/// Check a parsed document against a schema.
pub fn validate(path: &Path, document: &RawDocument, schema: &DocumentSchema) -> Result<()> {
    for key in schema.required {
        let present = document.get(key).is_some_and(|value| !value.is_empty());
        if !present {
            return Err(Error::MissingRequiredProperty {
                path: path.display().to_string(),
                key: key.to_string(),
            });
        }
    }

    if !schema.allowed.is_empty() {
        if let Some(key) = document
            .keys()
            .find(|k| !schema.allowed.iter().any(|allowed| allowed == k))
        {
            return Err(Error::UnknownProperty {
                path: path.display().to_string(),
                key: key.to_string(),
            });
        }
    }

    Ok(())
}
