//! End-to-end tests for the `validate` command.
//!
//! These tests invoke the actual CLI binary against temporary gallery
//! repositories. Nothing here contacts Azure.

mod common;
use common::prelude::*;

#[test]
fn test_validate_valid_repository() {
    let fixture = TestFixture::new()
        .with_gallery(docs::GALLERY)
        .with_common(docs::COMMON)
        .with_image("VSCodeBox", docs::IMAGE)
        .with_image("DataBox", docs::FULL_IMAGE);

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Gallery Contoso in resource group Gallery-RG"))
        .stdout(predicate::str::contains("[OK] DataBox 2.1.0 (azure)"))
        .stdout(predicate::str::contains("[OK] VSCodeBox 1.0.0 (packer)"))
        .stdout(predicate::str::contains("All image(s) valid"));
}

#[test]
fn test_validate_reports_every_invalid_image() {
    let fixture = TestFixture::new()
        .with_gallery(docs::GALLERY)
        .with_common(docs::COMMON)
        .with_image("Good", docs::IMAGE)
        .with_image("Conflict", docs::CONFLICTING_IMAGE)
        .with_image("Unknown", &format!("{}flavor: vanilla\n", docs::IMAGE));

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERR] Conflict"))
        .stdout(predicate::str::contains("must not define both"))
        .stdout(predicate::str::contains("[ERR] Unknown"))
        .stdout(predicate::str::contains("invalid property flavor"))
        .stdout(predicate::str::contains("[OK] Good"))
        .stderr(predicate::str::contains("2 invalid image(s)"));
}

#[test]
fn test_validate_missing_required_property() {
    let fixture = TestFixture::new()
        .with_gallery(docs::GALLERY)
        .with_image("VSCodeBox", docs::IMAGE);

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "missing a value for required property publisher",
        ));
}

#[test]
fn test_validate_missing_gallery() {
    let fixture = TestFixture::new().with_image("VSCodeBox", docs::FULL_IMAGE);

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("gallery.yaml or gallery.yml not found"));
}

#[test]
fn test_validate_ambiguous_gallery() {
    let fixture = TestFixture::new()
        .with_gallery(docs::GALLERY)
        .with_file("gallery.yml", docs::GALLERY)
        .with_image("VSCodeBox", docs::FULL_IMAGE);

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Found both gallery.yaml and gallery.yml"));
}

#[test]
fn test_validate_malformed_document() {
    let fixture = TestFixture::new()
        .with_gallery(docs::GALLERY)
        .with_image("VSCodeBox", "publisher Contoso\n");

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Malformed document"))
        .stdout(predicate::str::contains("line 1"));
}

#[test]
fn test_validate_selected_images() {
    let fixture = TestFixture::new()
        .with_gallery(docs::GALLERY)
        .with_common(docs::COMMON)
        .with_image("Good", docs::IMAGE)
        .with_image("Conflict", docs::CONFLICTING_IMAGE);

    fixture
        .command()
        .args(["--color", "never", "validate", "-i", "Good"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking 1 image(s)"));
}

#[test]
fn test_validate_repo_flag() {
    let fixture = TestFixture::new()
        .with_file("repo/gallery.yaml", docs::GALLERY)
        .with_file("repo/images/DataBox/image.yaml", docs::FULL_IMAGE);

    fixture
        .command()
        .env_remove("GALLERY_BUILD_REPO")
        .args(["--color", "never", "validate", "--repo", "repo"])
        .assert()
        .success();
}
