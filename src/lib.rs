//! # Gallery Build Library
//!
//! This library resolves declarative image definitions into fully populated
//! build records, reconciles them with a compute gallery and drives the
//! external tool that builds each missing image version. It backs the
//! `gallery-build` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use gallery_build::markup;
//!
//! let doc = markup::parse(
//!     "publisher: Contoso\nreplicaLocations:\n  - eastus\n  - westeurope\n",
//! )
//! .unwrap();
//!
//! assert_eq!(doc.get("publisher").and_then(|v| v.as_scalar()), Some("Contoso"));
//! assert_eq!(doc.len(), 2);
//! ```
//!
//! ## Repository Layout
//!
//! ```text
//! <repo>/gallery.yaml               gallery name, resource group, subscription
//! <repo>/images/images.yaml         optional defaults shared by all images
//! <repo>/images/<name>/image.yaml   one directory per image
//! ```
//!
//! ## Core Concepts
//!
//! - **Markup (`markup`)**: The restricted configuration language: top-level
//!   `key: value` pairs, lists of scalars and lists of flat objects.
//! - **Configuration (`config`)**: Locating documents and checking them
//!   against the required/allowed key sets of their kind.
//! - **Resolution (`resolve`, `model`)**: Merging gallery, common defaults and
//!   image properties into one [`model::Image`] per image.
//! - **Catalog (`catalog`, `azure`)**: Ensuring the image definition exists and
//!   deciding whether the requested version must be built.
//! - **Build (`build`, `packer`)**: Writing the parameter file for an image's
//!   builder and running it.
//! - **Orchestration (`orchestrator`)**: Running all of the above for a set of
//!   images, sequentially or concurrently.
//! - **Versions (`version`)**: Raising the version in image documents so the
//!   next run publishes them again.
//!
//! ## Execution Flow
//!
//! For every requested image:
//!
//! 1.  **Resolve**: Load and merge documents, check required properties and
//!     any declared resource-group placement.
//! 2.  **Reconcile**: Create the image definition when missing; skip the image
//!     when its version is already published.
//! 3.  **Place**: Assign a transient resource group (and location) to images
//!     that have no build resource group.
//! 4.  **Build**: Write the builder's parameter file and run the builder.

pub mod azure;
pub mod build;
pub mod catalog;
pub mod ci;
pub mod config;
pub mod defaults;
pub mod error;
pub mod markup;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod packer;
pub mod resolve;
pub mod version;
