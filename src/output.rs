//! # Output Configuration
//!
//! Controls how the CLI prints its summaries: emoji or plain markers, colour
//! or none.
//!
//! The following are respected:
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colours when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colours
//! - `CLICOLOR_FORCE=1` forces colours even in non-TTY
//! - `TERM=dumb` disables colours
//!
//! ```rust,ignore
//! use gallery_build::output::{OutputConfig, emoji};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Resolving images...", emoji(&out, "🔍", "[SCAN]"));
//! ```

use std::env;

use console::style;

use crate::model::Image;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from the environment and the `--color` flag.
    ///
    /// `always` and `never` force the choice; anything else detects it. In
    /// auto mode colours are off when `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colours are enabled, the plain marker otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One summary line for a processed image.
///
/// ```text
/// 🔨 VSCodeBox 1.0.0 (packer) -> Contoso-VSCodeBox-202401011200
/// ⏭️ OtherBox 2.1.0 (azure) already published
/// ```
pub fn image_line(config: &OutputConfig, image: &Image) -> String {
    let name = if config.use_color {
        style(&image.name).bold().to_string()
    } else {
        image.name.clone()
    };

    if image.build {
        format!(
            "{} {} {} ({}) -> {}",
            emoji(config, "🔨", "[BUILD]"),
            name,
            image.version,
            image.builder,
            image.resource_group().unwrap_or("-")
        )
    } else {
        format!(
            "{} {} {} ({}) already published",
            emoji(config, "⏭️", "[SKIP]"),
            name,
            image.version,
            image.builder
        )
    }
}

/// One summary line for an image that failed.
pub fn failure_line(config: &OutputConfig, name: &str, error: &dyn std::fmt::Display) -> String {
    let marker = emoji(config, "❌", "[ERR]");
    if config.use_color {
        format!("{} {} {}", marker, style(name).bold(), style(error).red())
    } else {
        format!("{} {} {}", marker, name, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuilderKind, Gallery};
    use std::path::PathBuf;

    fn image(build: bool) -> Image {
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
            builder: BuilderKind::Azure,
            gallery: Gallery {
                name: "Contoso".to_string(),
                resource_group: "rg1".to_string(),
                subscription: None,
            },
            subscription: None,
            build,
            build_resource_group: None,
            temp_resource_group: Some("Contoso-VSCodeBox-s".to_string()),
            location: Some("eastus".to_string()),
            key_vault: None,
            virtual_network: None,
            virtual_network_subnet: None,
            virtual_network_resource_group: None,
        }
    }

    #[test]
    fn test_color_always() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
    }

    #[test]
    fn test_color_never() {
        assert!(!OutputConfig::from_env_and_flag("NEVER").use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🔍", "[SCAN]"), "🔍");
        assert_eq!(emoji(&OutputConfig::without_color(), "🔍", "[SCAN]"), "[SCAN]");
    }

    #[test]
    fn test_image_line_plain() {
        let out = OutputConfig::without_color();
        assert_eq!(
            image_line(&out, &image(true)),
            "[BUILD] VSCodeBox 1.0.0 (azure) -> Contoso-VSCodeBox-s"
        );
        assert_eq!(
            image_line(&out, &image(false)),
            "[SKIP] VSCodeBox 1.0.0 (azure) already published"
        );
    }

    #[test]
    fn test_failure_line_plain() {
        let out = OutputConfig::without_color();
        assert_eq!(failure_line(&out, "Foo", &"boom"), "[ERR] Foo boom");
    }
}
