//! # Image Version Bumping
//!
//! The catalog never rebuilds a published version, so building an image again
//! means raising the `version` in its document. This module does that for one
//! image, a selection or every image in the workspace.
//!
//! Only the top-level `version:` line is rewritten. Every other line,
//! comments and blank lines included, is written back unchanged.

use std::fmt;
use std::path::PathBuf;

use log::info;

use crate::config::{self, IMAGE_SCHEMA};
use crate::defaults::IMAGE_DOCUMENT;
use crate::error::{Error, Result};
use crate::resolve::Workspace;

/// Which component of the version to raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BumpKind {
    /// `1.2.3` -> `2.0.0`
    Major,
    /// `1.2.3` -> `1.3.0`
    Minor,
    /// `1.2.3` -> `1.2.4`
    #[default]
    Patch,
}

/// A `major.minor.patch` image version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Parse `1`, `1.2` or `1.2.3`; missing components are zero.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = [0u64; 3];
        let mut count = 0;
        for part in text.trim().split('.') {
            if count == parts.len() || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parts[count] = part.parse().ok()?;
            count += 1;
        }
        Some(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
        })
    }

    /// Raise one component and reset the ones below it.
    pub fn bump(self, kind: BumpKind) -> Self {
        match kind {
            BumpKind::Major => Self {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            BumpKind::Minor => Self {
                minor: self.minor + 1,
                patch: 0,
                ..self
            },
            BumpKind::Patch => Self {
                patch: self.patch + 1,
                ..self
            },
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// One planned or applied version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub image: String,
    pub path: PathBuf,
    /// The version as written in the document.
    pub from: String,
    pub to: Version,
}

/// Work out the new version of one image without touching its document.
pub fn plan(workspace: &Workspace, name: &str, kind: BumpKind) -> Result<VersionBump> {
    let loaded = config::load_required(&workspace.image_dir(name), IMAGE_DOCUMENT, &IMAGE_SCHEMA)?;
    let path_text = loaded.path.display().to_string();

    let from = loaded
        .document
        .get("version")
        .and_then(|value| value.as_scalar())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::MissingRequiredProperty {
            path: path_text.clone(),
            key: "version".to_string(),
        })?
        .to_string();

    let to = Version::parse(&from)
        .ok_or_else(|| Error::InvalidVersion {
            path: path_text,
            value: from.clone(),
        })?
        .bump(kind);

    Ok(VersionBump {
        image: name.to_string(),
        path: loaded.path,
        from,
        to,
    })
}

/// Bump the named images, or every image when `names` is empty.
///
/// Every selected directory must exist and every document must carry a valid
/// version before any file is written.
pub fn bump_images(workspace: &Workspace, names: &[String], kind: BumpKind) -> Result<Vec<VersionBump>> {
    let names = if names.is_empty() {
        workspace.image_names()?
    } else {
        if let Some(missing) = names.iter().find(|name| !workspace.image_dir(name).is_dir()) {
            return Err(Error::DirectoryNotFound {
                path: workspace.image_dir(missing).display().to_string(),
            });
        }
        names.to_vec()
    };

    let bumps = names
        .iter()
        .map(|name| plan(workspace, name, kind))
        .collect::<Result<Vec<_>>>()?;

    for bump in &bumps {
        info!("[{}] Bumping version {} -> {}", bump.image, bump.from, bump.to);
        let text = std::fs::read_to_string(&bump.path)?;
        std::fs::write(&bump.path, rewrite_version(&text, &bump.to))?;
    }
    Ok(bumps)
}

/// Replace the value of the first top-level `version:` line, keeping its line ending.
fn rewrite_version(text: &str, version: &Version) -> String {
    let mut out = String::with_capacity(text.len());
    let mut replaced = false;
    for line in text.split_inclusive('\n') {
        if !replaced && line.starts_with("version:") {
            let ending = &line[line.trim_end_matches(['\r', '\n']).len()..];
            out.push_str(&format!("version: {}{}", version, ending));
            replaced = true;
        } else {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const IMAGE: &str = "\
# Windows 11 with VS Code
publisher: Contoso
sku: win11
version: 1.2.3
os: Windows
replicaLocations:
  - eastus
";

    fn workspace(images: &[(&str, &str)]) -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        for (name, text) in images {
            let dir = temp.path().join("images").join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("image.yaml"), text).unwrap();
        }
        let ws = Workspace::new(temp.path()).unwrap();
        (temp, ws)
    }

    fn read(ws: &Workspace, name: &str) -> String {
        fs::read_to_string(ws.image_dir(name).join("image.yaml")).unwrap()
    }

    #[test]
    fn test_bump_major_resets_minor_and_patch() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.bump(BumpKind::Major).to_string(), "2.0.0");
    }

    #[test]
    fn test_bump_minor_resets_patch() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.bump(BumpKind::Minor).to_string(), "1.3.0");
    }

    #[test]
    fn test_bump_patch() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.bump(BumpKind::Patch).to_string(), "1.2.4");
        assert_eq!(BumpKind::default(), BumpKind::Patch);
    }

    #[test]
    fn test_parse_short_versions() {
        assert_eq!(Version::parse("1.2").unwrap().to_string(), "1.2.0");
        assert_eq!(Version::parse(" 3 ").unwrap().to_string(), "3.0.0");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for text in ["", "1.2.3.4", "1..2", "v1.0.0", "1.0.0-beta", "latest"] {
            assert!(Version::parse(text).is_none(), "{text} should not parse");
        }
    }

    #[test]
    fn test_rewrite_keeps_other_lines() {
        let text = "# header\nversion: 1.0.0\r\nos: Windows\n";
        let rewritten = rewrite_version(text, &Version::parse("1.0.1").unwrap());
        assert_eq!(rewritten, "# header\nversion: 1.0.1\r\nos: Windows\n");
    }

    #[test]
    fn test_rewrite_ignores_nested_version() {
        let text = "repos:\n  - url: a\n    version: 9.9.9\nversion: 1.0.0";
        let rewritten = rewrite_version(text, &Version::parse("2.0.0").unwrap());
        assert_eq!(rewritten, "repos:\n  - url: a\n    version: 9.9.9\nversion: 2.0.0");
    }

    #[test]
    fn test_bump_all_images() {
        let (_temp, ws) = workspace(&[("A", IMAGE), ("B", "version: 2.0\n")]);

        let bumps = bump_images(&ws, &[], BumpKind::Minor).unwrap();
        assert_eq!(bumps.len(), 2);
        assert_eq!(bumps[0].image, "A");
        assert_eq!(bumps[0].from, "1.2.3");
        assert_eq!(bumps[0].to.to_string(), "1.3.0");

        assert_eq!(read(&ws, "A"), IMAGE.replace("version: 1.2.3", "version: 1.3.0"));
        assert_eq!(read(&ws, "B"), "version: 2.1.0\n");
    }

    #[test]
    fn test_bump_selected_images_only() {
        let (_temp, ws) = workspace(&[("A", IMAGE), ("B", IMAGE)]);

        bump_images(&ws, &["B".to_string()], BumpKind::Patch).unwrap();
        assert_eq!(read(&ws, "A"), IMAGE);
        assert!(read(&ws, "B").contains("version: 1.2.4\n"));
    }

    #[test]
    fn test_bump_missing_directory_writes_nothing() {
        let (_temp, ws) = workspace(&[("A", IMAGE)]);

        let err = bump_images(&ws, &["A".to_string(), "Nope".to_string()], BumpKind::Major)
            .unwrap_err();
        match err {
            Error::DirectoryNotFound { path } => assert!(path.ends_with("Nope")),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(read(&ws, "A"), IMAGE);
    }

    #[test]
    fn test_bump_invalid_version_writes_nothing() {
        let (_temp, ws) = workspace(&[("A", IMAGE), ("B", "version: latest\n")]);

        let err = bump_images(&ws, &[], BumpKind::Patch).unwrap_err();
        assert!(matches!(err, Error::InvalidVersion { .. }));
        assert_eq!(read(&ws, "A"), IMAGE);
    }

    #[test]
    fn test_plan_missing_version() {
        let (_temp, ws) = workspace(&[("A", "os: Windows\n")]);
        let err = plan(&ws, "A", BumpKind::Patch).unwrap_err();
        match err {
            Error::MissingRequiredProperty { key, .. } => assert_eq!(key, "version"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
