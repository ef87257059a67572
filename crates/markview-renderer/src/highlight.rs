//! Syntax highlighting for code fences.
//!
//! The renderer only depends on the [`Highlighter`] trait. [`SyntectHighlighter`]
//! is the bundled implementation backed by syntect's default syntax and theme
//! sets.

use std::fmt::Write;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::theme::ResolvedTheme;

/// Languages rendered without grammar.
const PLAIN_LANGUAGES: &[&str] = &["text", "plain", "plaintext", "txt"];

/// Error returned by a [`Highlighter`].
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("unsupported language `{0}`")]
    UnsupportedLanguage(String),
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),
    #[error("highlighter failed: {0}")]
    Internal(#[from] syntect::Error),
}

/// Highlighted code, one HTML fragment per source line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightedCode {
    /// Inline-styled markup of each line, without the line terminator.
    pub lines: Vec<String>,
    /// Theme background as a CSS color.
    pub background: Option<String>,
    /// Theme foreground as a CSS color.
    pub foreground: Option<String>,
}

/// Turns code into styled per-line markup.
pub trait Highlighter: Send + Sync {
    /// Highlight `code` written in `language` with `theme`.
    fn highlight(
        &self,
        code: &str,
        language: &str,
        theme: &ResolvedTheme,
    ) -> Result<HighlightedCode, HighlightError>;

    /// Names of the themes this highlighter knows, sorted.
    fn themes(&self) -> Vec<String>;

    /// Whether `language` has a grammar.
    fn supports_language(&self, language: &str) -> bool;
}

/// [`Highlighter`] backed by syntect's bundled syntaxes and themes.
///
/// Loading the sets is the expensive part; construct once and share.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
}

impl SyntectHighlighter {
    /// Load the default syntax and theme sets.
    #[must_use]
    pub fn new() -> Self {
        tracing::debug!("Loading syntect syntax and theme sets");
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
        }
    }

    fn syntax(&self, language: &str) -> Option<&SyntaxReference> {
        if PLAIN_LANGUAGES
            .iter()
            .any(|plain| plain.eq_ignore_ascii_case(language))
        {
            return Some(self.syntaxes.find_syntax_plain_text());
        }
        self.syntaxes
            .find_syntax_by_token(language)
            .or_else(|| self.syntaxes.find_syntax_by_token(&language.to_ascii_lowercase()))
    }

    fn theme(&self, theme: &ResolvedTheme) -> Result<&Theme, HighlightError> {
        self.themes
            .themes
            .get(theme.as_str())
            .ok_or_else(|| HighlightError::UnknownTheme(theme.as_str().to_owned()))
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(
        &self,
        code: &str,
        language: &str,
        theme: &ResolvedTheme,
    ) -> Result<HighlightedCode, HighlightError> {
        let syntax = self
            .syntax(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.to_owned()))?;
        let theme = self.theme(theme)?;

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let regions = highlighter.highlight_line(line, &self.syntaxes)?;
            let regions: Vec<_> = regions
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
                .filter(|(_, text)| !text.is_empty())
                .collect();
            lines.push(styled_line_to_highlighted_html(
                &regions,
                IncludeBackground::No,
            )?);
        }

        Ok(HighlightedCode {
            lines,
            background: theme.settings.background.map(css_color),
            foreground: theme.settings.foreground.map(css_color),
        })
    }

    fn themes(&self) -> Vec<String> {
        // ThemeSet keeps themes in a BTreeMap, so keys come out sorted.
        self.themes.themes.keys().cloned().collect()
    }

    fn supports_language(&self, language: &str) -> bool {
        self.syntax(language).is_some()
    }
}

/// Format a theme color as `#rrggbb`.
fn css_color(color: Color) -> String {
    let mut css = String::with_capacity(7);
    write!(css, "#{:02x}{:02x}{:02x}", color.r, color.g, color.b).unwrap();
    css
}
