//! Configuration management for MarkView.
//!
//! Parses `markview.toml` with serde and discovers it in the current
//! directory or one of its parents. Command-line flags are applied on top via
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Every `[theme]` string supports `${VAR}` (error if unset) and
//! `${VAR:-default}`.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "markview.toml";

/// Theme mode that follows the appearance preference.
pub const AUTO_MODE: &str = "auto";

/// Appearance values accepted by `theme.appearance`.
const APPEARANCES: [&str; 2] = ["light", "dark"];

/// Command-line overrides. Only `Some` values replace loaded settings.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Theme mode: `auto` or an explicit theme name.
    pub theme: Option<String>,
    /// Appearance preference fed to `auto`.
    pub appearance: Option<String>,
    /// Extract the first H1 as the document title.
    pub extract_title: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub render: RenderConfig,

    /// Path to the file this configuration was read from.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[theme]` section.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// `auto` or the name of a highlighter theme.
    pub mode: String,
    /// Theme used by `auto` for a dark appearance.
    pub dark: String,
    /// Theme used by `auto` for a light appearance.
    pub light: String,
    /// Initial appearance preference, `light` or `dark`.
    pub appearance: String,
}

impl ThemeConfig {
    /// Whether the theme follows the appearance preference.
    pub fn is_auto(&self) -> bool {
        self.mode.is_empty() || self.mode.eq_ignore_ascii_case(AUTO_MODE)
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            mode: AUTO_MODE.to_owned(),
            dark: "base16-ocean.dark".to_owned(),
            light: "InspiredGitHub".to_owned(),
            appearance: "light".to_owned(),
        }
    }
}

/// `[render]` section.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub extract_title: bool,
    pub linkify: bool,
    pub typographer: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            extract_title: false,
            linkify: true,
            typographer: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`theme.dark`").
        field: String,
        /// Error message (e.g., "${`DARK_THEME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `markview.toml` in the current directory and its parents, falling
    /// back to defaults when none exists. CLI settings are applied last and
    /// the result is validated again.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Search for a config file in `start` and its parents.
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(theme) = &settings.theme {
            self.theme.mode.clone_from(theme);
        }
        if let Some(appearance) = &settings.appearance {
            self.theme.appearance.clone_from(appearance);
        }
        if let Some(extract_title) = settings.extract_title {
            self.render.extract_title = extract_title;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.theme.dark, "theme.dark")?;
        require_non_empty(&self.theme.light, "theme.light")?;

        let appearance = self.theme.appearance.trim().to_ascii_lowercase();
        if !APPEARANCES.contains(&appearance.as_str()) {
            return Err(ConfigError::Validation(format!(
                "theme.appearance must be \"light\" or \"dark\", got {:?}",
                self.theme.appearance
            )));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let theme = &mut self.theme;
        theme.mode = expand::expand_env(&theme.mode, "theme.mode")?;
        theme.dark = expand::expand_env(&theme.dark, "theme.dark")?;
        theme.light = expand::expand_env(&theme.light, "theme.light")?;
        theme.appearance = expand::expand_env(&theme.appearance, "theme.appearance")?;
        Ok(())
    }
}
