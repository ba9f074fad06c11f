//! User settings, read from `<config dir>/mdoc/config.toml`.
//!
//! Every key is optional; a missing file at the default location simply means
//! default settings.

use crate::browser::PageOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `<theme>.html` files. `~`, `$VAR` and `${VAR}` are expanded.
    #[serde(default = "default_theme_dir")]
    pub theme_dir: String,
    /// Theme used when a document doesn't enable its front matter
    #[serde(default = "default_theme")]
    pub default_theme: String,
    /// Browser binary; searched for when unset
    #[serde(default)]
    pub browser: Option<PathBuf>,
    /// Extra command line arguments for the browser, e.g. `--no-sandbox`
    #[serde(default)]
    pub browser_args: Vec<String>,
    /// How long the browser may take to print, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub page: PageOptions,
}

fn default_theme_dir() -> String {
    config_dir()
        .map(|dir| dir.join("themes").display().to_string())
        .unwrap_or_else(|| "~/.config/mdoc/themes".to_string())
}
fn default_theme() -> String {
    "plain".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme_dir: default_theme_dir(),
            default_theme: default_theme(),
            browser: None,
            browser_args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            page: PageOptions::default(),
        }
    }
}

/// `<user config dir>/mdoc`
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mdoc"))
}

/// Folder a packaged browser snapshot is unpacked into.
pub fn packaged_browser_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("chromium"))
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match config_dir() {
                Some(dir) => (dir.join("config.toml"), false),
                None => return Ok(Settings::default()),
            },
        };

        if !required && !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        log::debug!("loading settings from {}", path.display());
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        Settings::parse(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Settings> {
        toml::from_str(contents).with_context(|| "Failed to parse TOML")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_settings() {
        let settings = Settings::default();
        let text = toml::to_string(&settings).expect("can serialize settings to TOML");
        assert_eq!(Settings::parse(&text).expect("can parse"), settings);
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::parse("").expect("can parse"), Settings::default());
    }

    #[test]
    fn can_parse_partial_settings() {
        let settings = Settings::parse(
            "theme_dir = \"${HOME}/themes\"\ndefault_theme = \"\"\nbrowser_args = [\"--no-sandbox\"]\n\n[page]\nmargin_top_in = 0.5\n",
        )
        .expect("can parse");
        assert_eq!(settings.theme_dir, "${HOME}/themes");
        assert_eq!(settings.default_theme, "");
        assert_eq!(settings.browser_args, vec!["--no-sandbox"]);
        assert_eq!(settings.page.margin_top_in, 0.5);
        assert_eq!(settings.page.width_in, 8.27);
        assert_eq!(settings.timeout_secs, 60);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        assert!(Settings::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn can_load_explicit_file() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("mdoc.toml");
        std::fs::write(&path, "timeout_secs = 5\n").expect("can write settings");
        let settings = Settings::load(Some(&path)).expect("can load");
        assert_eq!(settings.timeout_secs, 5);
    }
}
