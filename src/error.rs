//! # Error Handling
//!
//! This module defines the centralized error type for `gallery-build`. It uses
//! the `thiserror` library to describe every failure the engine can run into,
//! each variant carrying enough context (document path, property, image,
//! command) to print a single useful diagnostic.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failure modes. Every variant is fatal to the
//!   image (or run) that produced it; nothing in the engine retries.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The catalog's "resource not found" answer is deliberately absent from this
//! enum. It is a legitimate absent value and is returned as `Ok(None)` by the
//! catalog collaborator.

use thiserror::Error;

use crate::model::{AZURE_ALIASES, PACKER_ALIASES};

/// Main error type for gallery-build operations
#[derive(Error, Debug)]
pub enum Error {
    /// A line of a configuration document could not be understood.
    #[error("Malformed document {source_name} (line {line}): {message}\n  {content}")]
    MalformedDocument {
        source_name: String,
        line: usize,
        content: String,
        message: String,
    },

    /// A directory that must contain a configuration document does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// Zero (for a required document) or two candidate files were found.
    #[error("{message} in {dir}")]
    AmbiguousOrMissingDocument { dir: String, message: String },

    /// A required property is absent or has no value.
    #[error("{path} is missing a value for required property {key}")]
    MissingRequiredProperty { path: String, key: String },

    /// A property that is not in the allowed set was declared.
    #[error("{path} contains an invalid property {key}")]
    UnknownProperty { path: String, key: String },

    /// A property has the wrong shape (list vs scalar).
    #[error("{path}: property {key} must be {expected}")]
    InvalidPropertyType {
        path: String,
        key: String,
        expected: &'static str,
    },

    /// The builder selector did not match any known alias.
    #[error("Image {image} has an invalid builder property value '{value}'{}", hint_builders())]
    InvalidBuilderKind { image: String, value: String },

    /// buildResourceGroup / tempResourceGroup / location are inconsistent.
    #[error("Image {image} has an invalid resource group configuration: {message}")]
    ResourceGroupConfigurationConflict { image: String, message: String },

    /// An external tool exited non-zero (other than the catalog's not-found marker).
    #[error("Command failed: {command} - {stderr}")]
    ExternalToolFailure { command: String, stderr: String },

    /// An external tool printed something that could not be decoded.
    #[error("Could not decode response of {command}: {message}")]
    ResponseDecodeFailure { command: String, message: String },

    /// An image document's `version` is not a `major.minor.patch` triple.
    #[error("{path} has an invalid version '{value}', expected major.minor.patch")]
    InvalidVersion { path: String, value: String },

    /// The worker pool for concurrent runs could not be started.
    #[error("Could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

fn hint_builders() -> String {
    let aliases: Vec<&str> = PACKER_ALIASES
        .iter()
        .chain(AZURE_ALIASES)
        .copied()
        .collect();
    format!("\n  hint: use one of {}", aliases.join(", "))
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed_document() {
        let error = Error::MalformedDocument {
            source_name: "gallery.yaml".to_string(),
            line: 3,
            content: "just text".to_string(),
            message: "line does not contain a colon".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("gallery.yaml"));
        assert!(display.contains("line 3"));
        assert!(display.contains("just text"));
    }

    #[test]
    fn test_error_display_missing_required_property() {
        let error = Error::MissingRequiredProperty {
            path: "images/Foo/image.yaml".to_string(),
            key: "sku".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("images/Foo/image.yaml"));
        assert!(display.contains("required property sku"));
    }

    #[test]
    fn test_error_display_invalid_builder_has_hint() {
        let error = Error::InvalidBuilderKind {
            image: "Foo".to_string(),
            value: "docker".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'docker'"));
        assert!(display.contains("hint:"));
        assert!(display.contains("packer"));
    }

    #[test]
    fn test_builder_hint_lists_every_alias() {
        let hint = hint_builders();
        for alias in PACKER_ALIASES.iter().chain(AZURE_ALIASES) {
            assert!(hint.contains(alias), "hint is missing {alias}");
        }
        assert!(hint.contains("azure-image-builder"));
    }

    #[test]
    fn test_error_display_invalid_version() {
        let error = Error::InvalidVersion {
            path: "images/Foo/image.yaml".to_string(),
            value: "latest".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'latest'"));
        assert!(display.contains("major.minor.patch"));
    }

    #[test]
    fn test_error_display_external_tool_failure() {
        let error = Error::ExternalToolFailure {
            command: "az sig image-definition show".to_string(),
            stderr: "Authorization failed".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Command failed"));
        assert!(display.contains("Authorization failed"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{unclosed").unwrap_err();
        let error: Error = json_error.into();
        assert!(format!("{}", error).contains("JSON error"));
    }
}
