//! # Image Resolution
//!
//! Turns the gallery document, the optional common document and an image's
//! own document into an [`Image`]:
//!
//! 1. load the image document (unknown keys are rejected here);
//! 2. lay the image's properties over the common ones;
//! 3. check the required properties on the merged result;
//! 4. normalize the builder selector;
//! 5. attach the directory name, path and gallery;
//! 6. share a subscription declared on only one of image/gallery;
//! 7. check any declared resource-group placement.
//!
//! [`apply_decision`] completes the record after the catalog was consulted.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::CatalogDecision;
use crate::config::{self, COMMON_SCHEMA, GALLERY_SCHEMA, IMAGE_SCHEMA};
use crate::defaults::{COMMON_DOCUMENT, GALLERY_DOCUMENT, IMAGES_DIR, IMAGE_DOCUMENT};
use crate::error::{Error, Result};
use crate::model::{BuilderKind, Gallery, Image, ImageProperties};

/// Where the configuration documents live.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub repo_root: PathBuf,
    pub images_root: PathBuf,
}

impl Workspace {
    /// Conventional layout: `gallery.yaml` in `repo_root`, images under `repo_root/images`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let repo_root = std::path::absolute(repo_root.into())?;
        let images_root = repo_root.join(IMAGES_DIR);
        Ok(Self {
            repo_root,
            images_root,
        })
    }

    pub fn image_dir(&self, name: &str) -> PathBuf {
        self.images_root.join(name)
    }

    /// Names of all image directories, sorted.
    pub fn image_names(&self) -> Result<Vec<String>> {
        if !self.images_root.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: self.images_root.display().to_string(),
            });
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.images_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if entry.file_type().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }
}

/// Load the gallery document from the repository root.
pub fn load_gallery(workspace: &Workspace) -> Result<Gallery> {
    let loaded = config::load_required(&workspace.repo_root, GALLERY_DOCUMENT, &GALLERY_SCHEMA)?;

    let gallery = Gallery::from_document(&loaded.document, &loaded.path)?;
    info!(
        "Found gallery {} (resource group {}) in {}",
        gallery.name,
        gallery.resource_group,
        loaded.path.display()
    );
    Ok(gallery)
}

/// Load the optional common document from the images directory.
pub fn load_common(workspace: &Workspace) -> Result<ImageProperties> {
    match config::load_optional(&workspace.images_root, COMMON_DOCUMENT, &COMMON_SCHEMA)? {
        Some(loaded) => {
            info!("Found common image properties in {}", loaded.path.display());
            ImageProperties::from_document(&loaded.document, &loaded.path)
        }
        None => Ok(ImageProperties::default()),
    }
}

/// Resolves image records against one gallery and one set of common defaults.
///
/// Both are read-only once loaded; each resolved [`Image`] gets its own copy of
/// the gallery.
#[derive(Debug, Clone)]
pub struct Resolver {
    workspace: Workspace,
    gallery: Gallery,
    common: ImageProperties,
}

impl Resolver {
    pub fn new(workspace: Workspace, gallery: Gallery, common: ImageProperties) -> Self {
        Self {
            workspace,
            gallery,
            common,
        }
    }

    /// Load gallery and common documents from the workspace.
    pub fn load(workspace: Workspace) -> Result<Self> {
        let gallery = load_gallery(&workspace)?;
        let common = load_common(&workspace)?;
        Ok(Self::new(workspace, gallery, common))
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Resolve one image from its directory.
    pub fn resolve(&self, name: &str) -> Result<Image> {
        let dir = self.workspace.image_dir(name);
        info!("[{}] Resolving image from {}", name, dir.display());

        let loaded = config::load_required(&dir, IMAGE_DOCUMENT, &IMAGE_SCHEMA)?;

        let declared = ImageProperties::from_document(&loaded.document, &loaded.path)?;
        let merged = declared.overlay(&self.common);
        let image = build_image(&dir, &loaded.path, merged, self.gallery.clone())?;

        // Only a declared placement can be checked before the catalog is asked;
        // otherwise a transient group is assigned later.
        if image.build_resource_group.is_some() || image.temp_resource_group.is_some() {
            validate_placement(&image)?;
        }

        debug!("[{}] Resolved {:?}", name, image);
        Ok(image)
    }
}

fn build_image(
    dir: &Path,
    document_path: &Path,
    props: ImageProperties,
    mut gallery: Gallery,
) -> Result<Image> {
    let missing = |key: &str| Error::MissingRequiredProperty {
        path: document_path.display().to_string(),
        key: key.to_string(),
    };

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::DirectoryNotFound {
            path: dir.display().to_string(),
        })?;

    let builder = match props.builder.as_deref() {
        None => BuilderKind::default(),
        Some(alias) => BuilderKind::from_alias(alias).ok_or_else(|| Error::InvalidBuilderKind {
            image: name.clone(),
            value: alias.to_string(),
        })?,
    };

    let publisher = props.publisher.ok_or_else(|| missing("publisher"))?;
    let offer = props.offer.ok_or_else(|| missing("offer"))?;
    let sku = props.sku.ok_or_else(|| missing("sku"))?;
    let version = props.version.ok_or_else(|| missing("version"))?;
    let os = props.os.ok_or_else(|| missing("os"))?;
    let replica_locations = props
        .replica_locations
        .filter(|locations| !locations.is_empty())
        .ok_or_else(|| missing("replicaLocations"))?;

    // The image's subscription wins over the gallery's; when only one of them
    // declares one it is shared. Differing values are left alone.
    let mut subscription = props.subscription;
    if subscription.is_none() && gallery.subscription.is_some() {
        subscription = gallery.subscription.clone();
    } else if gallery.subscription.is_none() && subscription.is_some() {
        gallery.subscription = subscription.clone();
    } else if let (Some(image_sub), Some(gallery_sub)) = (&subscription, &gallery.subscription) {
        if image_sub != gallery_sub {
            warn!(
                "[{}] Image subscription {} differs from gallery subscription {}",
                name, image_sub, gallery_sub
            );
        }
    }

    Ok(Image {
        name,
        path: dir.to_path_buf(),
        publisher,
        offer,
        sku,
        version,
        os,
        description: props.description,
        replica_locations,
        builder,
        gallery,
        subscription,
        build: false,
        build_resource_group: props.build_resource_group,
        temp_resource_group: props.temp_resource_group,
        location: props.location,
        key_vault: props.key_vault,
        virtual_network: props.virtual_network,
        virtual_network_subnet: props.virtual_network_subnet,
        virtual_network_resource_group: props.virtual_network_resource_group,
    })
}

/// Check that exactly one of buildResourceGroup / tempResourceGroup is set,
/// that a tempResourceGroup comes with a location and that a
/// buildResourceGroup comes without one.
pub fn validate_placement(image: &Image) -> Result<()> {
    let conflict = |message: &str| Error::ResourceGroupConfigurationConflict {
        image: image.name.clone(),
        message: message.to_string(),
    };

    match (&image.build_resource_group, &image.temp_resource_group) {
        (Some(_), Some(_)) => Err(conflict(
            "values for both buildResourceGroup and tempResourceGroup, must only define one",
        )),
        (None, Some(_)) if image.location.is_none() => {
            Err(conflict("tempResourceGroup is set but no location"))
        }
        (Some(_), None) if image.location.is_some() => Err(conflict(
            "buildResourceGroup and location are both set, must not define both",
        )),
        (None, None) => Err(conflict(
            "no value for buildResourceGroup and no value for tempResourceGroup, must define one",
        )),
        _ => Ok(()),
    }
}

/// Complete an image with the catalog's decision.
///
/// An image without a buildResourceGroup gets a location (declared, or the
/// definition's region) and a transient resource group named
/// `{gallery}-{image}-{suffix}` unless one was declared. This happens whether
/// or not the image needs building, so every completed record names exactly
/// one resource group.
pub fn apply_decision(image: &mut Image, decision: &CatalogDecision, suffix: &str) -> Result<()> {
    image.build = decision.build;

    if image.build_resource_group.is_none() {
        if image.location.is_none() {
            image.location = decision
                .definition
                .as_ref()
                .and_then(|definition| definition.location.clone());
        }
        if image.temp_resource_group.is_none() {
            image.temp_resource_group =
                Some(format!("{}-{}-{}", image.gallery.name, image.name, suffix));
        }
    }

    validate_placement(image)
}
