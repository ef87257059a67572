//! CLI error types.

use markview_config::ConfigError;
use markview_renderer::{ClipboardError, CopyError, ParseAppearanceError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Appearance(#[from] ParseAppearanceError),

    #[error("{0}")]
    Copy(#[from] CopyError),

    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    #[error("file watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("{0}")]
    Validation(String),
}
