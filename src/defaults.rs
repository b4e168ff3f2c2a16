//! Default values and conventional names used across the engine.

use chrono::Utc;

/// Base name of the gallery document in the repository root.
pub const GALLERY_DOCUMENT: &str = "gallery";

/// Directory (under the repository root) holding one directory per image.
pub const IMAGES_DIR: &str = "images";

/// Base name of the optional common document in the images directory.
pub const COMMON_DOCUMENT: &str = "images";

/// Base name of each image's own document.
pub const IMAGE_DOCUMENT: &str = "image";

/// Template deployed by the Azure Image Builder, relative to the repository root.
pub const AZURE_TEMPLATE: &str = "templates/builder.bicep";

/// Returns the run-wide suffix for transient resource group names.
///
/// This is the current UTC time formatted as `YYYYmmddHHMM`. Callers capture
/// it once per run so every image built in that run shares it.
pub fn default_suffix() -> String {
    Utc::now().format("%Y%m%d%H%M").to_string()
}
