//! Thin wrapper around the `az` command line.
//!
//! Every call runs `az` as a subprocess and interprets the result:
//! - exit 0 with JSON output: the decoded value;
//! - exit 0 with no output: `None`;
//! - non-zero exit whose stderr contains [`RESOURCE_NOT_FOUND`]: `None`;
//! - any other non-zero exit: [`Error::ExternalToolFailure`].

use std::path::Path;
use std::process::Command;

use log::{debug, info};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::model::Image;

/// Marker the CLI prints on stderr when a resource does not exist.
pub const RESOURCE_NOT_FOUND: &str = "Code: ResourceNotFound";

const AZ: &str = "az";

/// Run an `az` command and decode its JSON response.
pub fn cli(args: &[String]) -> Result<Option<JsonValue>> {
    let command = format!("{} {}", AZ, args.join(" "));
    info!("Running az cli command: {}", command);

    let output = Command::new(AZ)
        .args(args)
        .output()
        .map_err(|e| Error::ExternalToolFailure {
            command: command.clone(),
            stderr: e.to_string(),
        })?;

    interpret(
        &command,
        output.status.success(),
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    )
}

/// Turn a finished command's exit status and output into a result.
pub fn interpret(
    command: &str,
    success: bool,
    stdout: &str,
    stderr: &str,
) -> Result<Option<JsonValue>> {
    if !success {
        if stderr.contains(RESOURCE_NOT_FOUND) {
            debug!("Resource not found: {}", command);
            return Ok(None);
        }
        let stderr = stderr.trim();
        return Err(Error::ExternalToolFailure {
            command: command.to_string(),
            stderr: if stderr.is_empty() {
                "azure cli command failed".to_string()
            } else {
                stderr.to_string()
            },
        });
    }

    if stdout.trim().is_empty() {
        return Ok(None);
    }
    for line in stdout.lines() {
        debug!("{}", line);
    }

    serde_json::from_str(stdout)
        .map(Some)
        .map_err(|e| Error::ResponseDecodeFailure {
            command: command.to_string(),
            message: e.to_string(),
        })
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn with_subscription(mut args: Vec<String>, subscription: Option<&str>) -> Vec<String> {
    if let Some(subscription) = subscription {
        args.push("--subscription".to_string());
        args.push(subscription.to_string());
    }
    args
}

pub fn account_show_args() -> Vec<String> {
    args(&["account", "show"])
}

pub fn image_definition_show_args(image: &Image) -> Vec<String> {
    let gallery = &image.gallery;
    with_subscription(
        args(&[
            "sig",
            "image-definition",
            "show",
            "--only-show-errors",
            "-g",
            &gallery.resource_group,
            "-r",
            &gallery.name,
            "-i",
            &image.name,
        ]),
        gallery.subscription.as_deref(),
    )
}

pub fn image_version_show_args(image: &Image) -> Vec<String> {
    let gallery = &image.gallery;
    with_subscription(
        args(&[
            "sig",
            "image-version",
            "show",
            "--only-show-errors",
            "-g",
            &gallery.resource_group,
            "-r",
            &gallery.name,
            "-i",
            &image.name,
            "-e",
            &image.version,
        ]),
        gallery.subscription.as_deref(),
    )
}

pub fn image_definition_create_args(image: &Image) -> Vec<String> {
    let gallery = &image.gallery;
    let mut create = args(&[
        "sig",
        "image-definition",
        "create",
        "--only-show-errors",
        "-g",
        &gallery.resource_group,
        "-r",
        &gallery.name,
        "-i",
        &image.name,
        "-p",
        &image.publisher,
        "-f",
        &image.offer,
        "-s",
        &image.sku,
        "--os-type",
        &image.os,
        "--hyper-v-generation",
        "V2",
        "--features",
        "SecurityType=TrustedLaunch",
    ]);
    if let Some(description) = &image.description {
        create.push("--description".to_string());
        create.push(description.clone());
    }
    with_subscription(create, gallery.subscription.as_deref())
}

pub fn group_create_args(group: &str, location: &str, image: &Image) -> Vec<String> {
    with_subscription(
        args(&["group", "create", "-n", group, "-l", location]),
        image.subscription.as_deref(),
    )
}

pub fn deployment_group_create_args(
    group: &str,
    template: &Path,
    parameters: &Path,
    image: &Image,
) -> Vec<String> {
    with_subscription(
        args(&[
            "deployment",
            "group",
            "create",
            "-n",
            &image.name,
            "-g",
            group,
            "-f",
            &template.display().to_string(),
            "-p",
            &format!("@{}", parameters.display()),
            "--no-prompt",
        ]),
        image.subscription.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuilderKind, Gallery};
    use std::path::PathBuf;

    fn image() -> Image {
        Image {
            name: "VSCodeBox".to_string(),
            path: PathBuf::from("/repo/images/VSCodeBox"),
            publisher: "Contoso".to_string(),
            offer: "DevBox".to_string(),
            sku: "win11".to_string(),
            version: "1.0.0".to_string(),
            os: "Windows".to_string(),
            description: None,
            replica_locations: vec!["eastus".to_string()],
            builder: BuilderKind::Packer,
            gallery: Gallery {
                name: "Contoso".to_string(),
                resource_group: "rg1".to_string(),
                subscription: Some("sub".to_string()),
            },
            subscription: Some("sub".to_string()),
            build: false,
            build_resource_group: None,
            temp_resource_group: None,
            location: None,
            key_vault: None,
            virtual_network: None,
            virtual_network_subnet: None,
            virtual_network_resource_group: None,
        }
    }

    #[test]
    fn test_interpret_json() {
        let value = interpret("az x", true, r#"{"location": "eastus"}"#, "")
            .unwrap()
            .unwrap();
        assert_eq!(value["location"], "eastus");
    }

    #[test]
    fn test_interpret_empty_output_is_none() {
        assert!(interpret("az x", true, "\n", "").unwrap().is_none());
    }

    #[test]
    fn test_interpret_not_found_is_none() {
        let stderr = "ERROR: (ResourceNotFound) The Resource was not found.\nCode: ResourceNotFound";
        assert!(interpret("az x", false, "", stderr).unwrap().is_none());
    }

    #[test]
    fn test_interpret_failure() {
        let err = interpret("az x", false, "", "ERROR: Please run 'az login'").unwrap_err();
        match err {
            Error::ExternalToolFailure { command, stderr } => {
                assert_eq!(command, "az x");
                assert!(stderr.contains("az login"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_interpret_undecodable() {
        let err = interpret("az x", true, "not json", "").unwrap_err();
        assert!(matches!(err, Error::ResponseDecodeFailure { .. }));
    }

    #[test]
    fn test_version_show_args() {
        let args = image_version_show_args(&image());
        assert_eq!(
            args.join(" "),
            "sig image-version show --only-show-errors -g rg1 -r Contoso -i VSCodeBox -e 1.0.0 --subscription sub"
        );
    }

    #[test]
    fn test_definition_create_args_include_description_when_set() {
        let mut image = image();
        assert!(!image_definition_create_args(&image).contains(&"--description".to_string()));

        image.description = Some("Windows 11".to_string());
        let args = image_definition_create_args(&image);
        let at = args.iter().position(|a| a == "--description").unwrap();
        assert_eq!(args[at + 1], "Windows 11");
    }

    #[test]
    fn test_deployment_args() {
        let args = deployment_group_create_args(
            "rg-temp",
            Path::new("/repo/templates/builder.bicep"),
            Path::new("/repo/images/VSCodeBox/image.parameters.json"),
            &image(),
        );
        assert!(args.contains(&"@/repo/images/VSCodeBox/image.parameters.json".to_string()));
        assert!(args.contains(&"--no-prompt".to_string()));
    }
}
