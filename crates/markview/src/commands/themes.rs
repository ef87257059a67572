//! `markview themes` command implementation.

use markview_renderer::{DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME, Highlighter, SyntectHighlighter};

use crate::error::CliError;
use crate::output::Output;

/// List the highlighter's themes, marking the auto-mode defaults.
pub(crate) fn execute() -> Result<(), CliError> {
    let output = Output::new();
    for theme in SyntectHighlighter::new().themes() {
        output.line(&theme, default_note(&theme));
    }
    Ok(())
}

fn default_note(theme: &str) -> Option<&'static str> {
    match theme {
        DEFAULT_DARK_THEME => Some("(default dark)"),
        DEFAULT_LIGHT_THEME => Some("(default light)"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_notes() {
        assert_eq!(default_note("base16-ocean.dark"), Some("(default dark)"));
        assert_eq!(default_note("InspiredGitHub"), Some("(default light)"));
        assert_eq!(default_note("Solarized (dark)"), None);
    }

    #[test]
    fn test_defaults_are_listed() {
        let themes = SyntectHighlighter::new().themes();
        assert!(themes.iter().any(|t| t == DEFAULT_DARK_THEME));
        assert!(themes.iter().any(|t| t == DEFAULT_LIGHT_THEME));
    }
}
