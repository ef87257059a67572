//! `markview render` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use markview_renderer::RenderOutput;

use super::SourceArgs;
use crate::error::CliError;
use crate::output::Output;
use crate::preview::Preview;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wrap the fragment in a complete HTML page.
    #[arg(long)]
    standalone: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config()?;
        let preview = Preview::new(&config)?;

        let rendered = preview.render_file(&self.source.file, self.standalone)?;
        report_warnings(&output, &rendered);

        match &self.output {
            Some(path) => {
                write_html(path, &rendered.html)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => output.document(&rendered.html)?,
        }
        Ok(())
    }
}

/// Print render warnings, one per line.
pub(crate) fn report_warnings(output: &Output, rendered: &RenderOutput) {
    for warning in &rendered.warnings {
        output.warning(&format!("Warning: {warning}"));
    }
}

/// Write `html` to `path`, creating parent directories.
pub(crate) fn write_html(path: &Path, html: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_html_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site").join("notes.html");

        write_html(&path, "<p>hi</p>").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_write_html_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.html");

        write_html(&path, "a").unwrap();
        write_html(&path, "b").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b");
    }
}
