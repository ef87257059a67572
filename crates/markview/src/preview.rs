//! Renderer built from the loaded configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use markview_config::{Config, ThemeConfig};
use markview_renderer::{
    Appearance, Highlighter, Markview, MarkviewOptions, PageData, PreferenceSignal,
    PreferenceSubscription, RenderOutput, ResolvedTheme, SharedPreference, SyntectHighlighter,
    ThemeMode, ThemeResolver, render_page,
};

use crate::error::CliError;

/// A configured [`Markview`] together with the preference signal it follows.
pub(crate) struct Preview {
    markview: Markview,
    preference: SharedPreference,
}

impl Preview {
    pub(crate) fn new(config: &Config) -> Result<Self, CliError> {
        let appearance = Appearance::from_str(&config.theme.appearance)?;
        let mode = ThemeMode::from_str(&config.theme.mode).unwrap_or_default();

        let highlighter = Arc::new(SyntectHighlighter::new());
        check_themes(highlighter.as_ref(), &mode, &config.theme)?;

        let preference = SharedPreference::new(appearance);
        let resolver = ThemeResolver::new(mode, Arc::new(preference.clone()))
            .with_themes(&config.theme.dark, &config.theme.light);
        let markview = Markview::new(highlighter, resolver).with_options(MarkviewOptions {
            extract_title: config.render.extract_title,
            linkify: config.render.linkify,
            typographer: config.render.typographer,
        });

        tracing::info!(
            mode = ?markview.theme_resolver().mode(),
            %appearance,
            "Preview configured"
        );
        Ok(Self {
            markview,
            preference,
        })
    }

    pub(crate) fn appearance(&self) -> Appearance {
        self.preference.current()
    }

    /// Push a new appearance preference. Subscribers hear about it only if it
    /// differs from the current one.
    pub(crate) fn set_appearance(&self, appearance: Appearance) {
        self.preference.set(appearance);
    }

    pub(crate) fn subscribe(
        &self,
        callback: impl Fn(ResolvedTheme) + Send + Sync + 'static,
    ) -> Option<PreferenceSubscription> {
        self.markview.subscribe_theme_changes(callback)
    }

    /// Render the markdown file at `path`.
    ///
    /// With `standalone`, the HTML is a complete page titled after the first
    /// H1 (when title extraction is on) or the file name.
    pub(crate) fn render_file(&self, path: &Path, standalone: bool) -> Result<RenderOutput, CliError> {
        let source = std::fs::read_to_string(path)?;
        let theme = self.markview.theme_resolver().resolve();
        let mut output = self.markview.render_with_theme(&source, theme.clone());

        if standalone {
            let title = output.title.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            output.html = render_page(&PageData {
                title: &title,
                html_content: &output.html,
                toc: &output.toc,
                theme: &theme,
                appearance: self.appearance(),
            });
        }

        Ok(output)
    }
}

/// Fail early on theme names the highlighter does not ship.
fn check_themes(
    highlighter: &dyn Highlighter,
    mode: &ThemeMode,
    theme: &ThemeConfig,
) -> Result<(), CliError> {
    let known = highlighter.themes();
    let required = match mode {
        ThemeMode::Named(name) => vec![name.as_str()],
        ThemeMode::Auto => vec![theme.dark.as_str(), theme.light.as_str()],
    };

    for name in required {
        if !known.iter().any(|known| known == name) {
            return Err(CliError::Validation(format!(
                "unknown theme `{name}`, run `markview themes` to list available themes"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn write_markdown(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("notes.md");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_render_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_markdown(dir.path(), "[!TIP] hello");

        let preview = Preview::new(&Config::default()).unwrap();
        let output = preview.render_file(&path, false).unwrap();

        assert_eq!(output.html, r#"<div class="custom-block tip">hello</div>"#);
    }

    #[test]
    fn test_render_standalone_uses_file_stem_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_markdown(dir.path(), "## Intro\n\nText");

        let preview = Preview::new(&Config::default()).unwrap();
        let output = preview.render_file(&path, true).unwrap();

        assert!(output.html.starts_with("<!DOCTYPE html>"));
        assert!(output.html.contains("<title>notes</title>"));
        assert!(output.html.contains(r#"data-appearance="light" data-theme="InspiredGitHub""#));
    }

    #[test]
    fn test_render_standalone_extracted_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_markdown(dir.path(), "# Release Notes\n\nText");
        let mut config = Config::default();
        config.render.extract_title = true;

        let preview = Preview::new(&config).unwrap();
        let output = preview.render_file(&path, true).unwrap();

        assert!(output.html.contains("<title>Release Notes</title>"));
    }

    #[test]
    fn test_appearance_switches_theme() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_markdown(dir.path(), "```rust\nfn main() {}\n```");

        let preview = Preview::new(&Config::default()).unwrap();
        preview.set_appearance(Appearance::Dark);
        let output = preview.render_file(&path, false).unwrap();

        assert!(output.html.contains(r#"data-theme="base16-ocean.dark""#));
    }

    #[test]
    fn test_unknown_theme_rejected() {
        let mut config = Config::default();
        config.theme.mode = "no-such-theme".to_owned();

        let err = Preview::new(&config).err().unwrap();
        assert!(err.to_string().contains("no-such-theme"));
    }

    #[test]
    fn test_invalid_appearance_rejected() {
        let mut config = Config::default();
        config.theme.appearance = "sepia".to_owned();

        assert!(matches!(
            Preview::new(&config),
            Err(CliError::Appearance(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let preview = Preview::new(&Config::default()).unwrap();

        let err = preview
            .render_file(&dir.path().join("missing.md"), false)
            .err()
            .unwrap();
        assert!(matches!(err, CliError::Io(_)));
    }
}
