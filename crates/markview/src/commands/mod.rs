//! CLI command implementations.

pub(crate) mod copy;
pub(crate) mod render;
pub(crate) mod themes;
pub(crate) mod watch;

use std::path::PathBuf;

use clap::Args;
use markview_config::{CliSettings, Config};

pub(crate) use copy::CopyArgs;
pub(crate) use render::RenderArgs;
pub(crate) use watch::WatchArgs;

use crate::error::CliError;

/// Arguments shared by every command that renders a file.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Markdown file to render.
    pub file: PathBuf,

    /// Path to configuration file (default: auto-discover markview.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Highlighting theme name, or `auto` to follow the appearance (overrides config).
    #[arg(long)]
    pub theme: Option<String>,

    /// Appearance preference used by `auto`: `light` or `dark` (overrides config).
    #[arg(long)]
    pub appearance: Option<String>,

    /// Use the first H1 as the page title (overrides config).
    #[arg(long)]
    pub extract_title: bool,
}

impl SourceArgs {
    pub(crate) fn cli_settings(&self) -> CliSettings {
        CliSettings {
            theme: self.theme.clone(),
            appearance: self.appearance.clone(),
            extract_title: self.extract_title.then_some(true),
        }
    }

    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        Ok(Config::load(
            self.config.as_deref(),
            Some(&self.cli_settings()),
        )?)
    }
}
