//! Shared test utilities for E2E tests.
//!
//! This module provides a gallery repository fixture and document snippets
//! to reduce duplication across test files.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_gallery(docs::GALLERY)
//!         .with_image("VSCodeBox", docs::IMAGE);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::docs;
    pub use super::TestFixture;
}

/// Configuration document snippets.
#[allow(dead_code)]
pub mod docs {
    /// Gallery without a subscription.
    pub const GALLERY: &str = "name: Contoso\nresourceGroup: Gallery-RG\n";

    /// Gallery with a subscription.
    pub const GALLERY_WITH_SUBSCRIPTION: &str =
        "name: Contoso\nresourceGroup: Gallery-RG\nsubscription: 00000000-0000-0000-0000-000000000000\n";

    /// Defaults shared by all images.
    pub const COMMON: &str = "\
publisher: Contoso
offer: DevBox
replicaLocations:
  - eastus
  - westeurope
builder: packer
";

    /// An image relying on the common defaults.
    pub const IMAGE: &str = "\
sku: win11-vscode
version: 1.0.0
os: Windows
description: Windows 11 with VS Code
";

    /// An image declaring everything itself.
    pub const FULL_IMAGE: &str = "\
publisher: Contoso
offer: DevBox
sku: win11-data
version: 2.1.0
os: Windows
replicaLocations:
  - eastus
builder: aib
buildResourceGroup: Build-RG
";

    /// An image that declares a build group and a location together.
    pub const CONFLICTING_IMAGE: &str = "\
sku: win11
version: 1.0.0
os: Windows
buildResourceGroup: Build-RG
location: eastus
";
}

/// A temporary gallery repository.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `gallery.yaml` at the repository root.
    pub fn with_gallery(self, content: &str) -> Self {
        self.with_file("gallery.yaml", content)
    }

    /// Write `images/images.yaml`.
    #[allow(dead_code)]
    pub fn with_common(self, content: &str) -> Self {
        self.with_file("images/images.yaml", content)
    }

    /// Write `images/<name>/image.yaml`.
    pub fn with_image(self, name: &str, content: &str) -> Self {
        self.with_file(&format!("images/{}/image.yaml", name), content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command for the binary, pointed at this repository and isolated from
    /// the caller's CI environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("gallery-build");
        cmd.current_dir(self.path())
            .env("GALLERY_BUILD_REPO", self.path())
            .env_remove("GITHUB_ACTIONS")
            .env_remove("GITHUB_OUTPUT")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
