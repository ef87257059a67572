//! `markview copy` command implementation.

use std::time::Instant;

use clap::Args;
use markview_renderer::{Clipboard, ClipboardError};

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::preview::Preview;

/// Arguments for the copy command.
#[derive(Args)]
pub(crate) struct CopyArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Index of the highlighted code block to copy (0-based, document order).
    #[arg(short, long, default_value_t = 0)]
    block: usize,
}

impl CopyArgs {
    /// Execute the copy command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config()?;
        let preview = Preview::new(&config)?;
        let rendered = preview.render_file(&self.source.file, false)?;

        let handler = rendered.copy_handler();
        let mut buttons = handler.buttons();
        let count = buttons.len();
        let button = buttons.get_mut(self.block).ok_or_else(|| {
            CliError::Validation(format!(
                "code block {} not found, {} has {count} code block(s)",
                self.block,
                self.source.file.display()
            ))
        })?;

        let mut clipboard = SystemClipboard::new()?;
        let now = Instant::now();
        if let Err(err) = handler.copy(button, &mut clipboard, now) {
            output.warning(button.label(now));
            return Err(err.into());
        }

        let lines = handler
            .source(button.target())
            .map_or(0, |source| source.lines().count());
        output.success(&format!(
            "{} {} ({lines} lines)",
            button.label(now),
            button.target()
        ));
        Ok(())
    }
}

/// The operating system clipboard.
pub(crate) struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub(crate) fn new() -> Result<Self, ClipboardError> {
        let inner = arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        tracing::debug!(chars = text.len(), "Writing to system clipboard");
        self.inner
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}
