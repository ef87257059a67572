//! Alert callouts.
//!
//! A paragraph whose text starts with `[!NOTE]`, `[!TIP]`, `[!IMPORTANT]`,
//! `[!WARNING]` or `[!CAUTION]` is rendered as a styled block:
//!
//! ```markdown
//! [!TIP] Run `cargo fmt` before committing.
//! ```
//!
//! becomes `<div class="custom-block tip">Run <code>cargo fmt</code> before committing.</div>`.
//! The marker must be uppercase and sit at the very start of the paragraph.
//! The text of a tight list item counts as a paragraph too.

use std::fmt;

use pulldown_cmark::{CowStr, Event, Tag};

use crate::html;
use crate::pipeline::Transform;
use crate::token::Token;

/// Kind of alert callout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CalloutKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl CalloutKind {
    /// All callout kinds, in marker order.
    pub const ALL: [Self; 5] = [
        Self::Note,
        Self::Tip,
        Self::Important,
        Self::Warning,
        Self::Caution,
    ];

    /// Parse the name between `[!` and `]`. Case-sensitive.
    #[must_use]
    pub fn from_marker_name(name: &str) -> Option<Self> {
        match name {
            "NOTE" => Some(Self::Note),
            "TIP" => Some(Self::Tip),
            "IMPORTANT" => Some(Self::Important),
            "WARNING" => Some(Self::Warning),
            "CAUTION" => Some(Self::Caution),
            _ => None,
        }
    }

    /// Name used in the marker, e.g. `NOTE`.
    #[must_use]
    pub fn marker_name(self) -> &'static str {
        match self {
            Self::Note => "NOTE",
            Self::Tip => "TIP",
            Self::Important => "IMPORTANT",
            Self::Warning => "WARNING",
            Self::Caution => "CAUTION",
        }
    }

    /// CSS class of the rendered block.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Warning => "warning",
            Self::Caution => "caution",
        }
    }
}

impl fmt::Display for CalloutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[!{}]", self.marker_name())
    }
}

/// Split a leading `[!KIND]` marker off `text`.
///
/// Returns the kind and the rest of the text with the whitespace run after the
/// marker removed.
#[must_use]
pub fn strip_marker(text: &str) -> Option<(CalloutKind, &str)> {
    let rest = text.strip_prefix("[!")?;
    let (name, rest) = rest.split_once(']')?;
    let kind = CalloutKind::from_marker_name(name)?;
    Some((kind, rest.trim_start()))
}

/// Rewrites marker paragraphs into callout blocks.
pub struct AlertTransform;

impl Transform for AlertTransform {
    fn name(&self) -> &'static str {
        "alert"
    }

    fn apply(&self, tokens: &mut Vec<Token<'_>>) {
        let mut index = 0;
        while index + 1 < tokens.len() {
            let is_paragraph = matches!(tokens[index], Token::ParagraphOpen)
                && matches!(tokens.get(index + 2), Some(Token::ParagraphClose));
            // Tight items carry their text without paragraph tokens.
            let is_tight_item = matches!(tokens[index], Token::BlockOpen(Tag::Item));
            let kind = match &mut tokens[index + 1] {
                Token::Inline(events) if is_paragraph || is_tight_item => take_marker(events),
                _ => None,
            };

            match kind {
                Some(kind) if is_paragraph => {
                    tokens[index] = Token::HtmlBlock(html::callout_start(kind));
                    tokens[index + 2] = Token::HtmlBlock(html::callout_end().to_owned());
                    index += 3;
                }
                Some(kind) => {
                    tokens.insert(index + 2, Token::HtmlBlock(html::callout_end().to_owned()));
                    tokens.insert(index + 1, Token::HtmlBlock(html::callout_start(kind)));
                    index += 4;
                }
                None => index += 1,
            }
        }
    }
}

/// Remove the marker from the first text event of a paragraph.
fn take_marker(events: &mut Vec<Event<'_>>) -> Option<CalloutKind> {
    let (kind, rest) = match events.first() {
        Some(Event::Text(text)) => {
            let (kind, rest) = strip_marker(text)?;
            (kind, rest.to_owned())
        }
        _ => return None,
    };

    if rest.is_empty() {
        events.remove(0);
        if matches!(events.first(), Some(Event::SoftBreak | Event::HardBreak)) {
            events.remove(0);
        }
    } else {
        events[0] = Event::Text(CowStr::from(rest));
    }
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{TokenizerOptions, inline_text, is_balanced, tokenize};
    use pretty_assertions::assert_eq;

    fn transform(source: &str) -> Vec<Token<'_>> {
        let mut tokens = tokenize(source, TokenizerOptions::default());
        AlertTransform.apply(&mut tokens);
        tokens
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("[!TIP] hello"), Some((CalloutKind::Tip, "hello")));
        assert_eq!(strip_marker("[!NOTE]"), Some((CalloutKind::Note, "")));
        assert_eq!(strip_marker("[!FOO] x"), None);
        assert_eq!(strip_marker("[!tip] x"), None);
        assert_eq!(strip_marker(" [!TIP] x"), None);
        assert_eq!(strip_marker("[!TIP x"), None);
    }

    #[test]
    fn test_every_kind_maps_to_class() {
        for kind in CalloutKind::ALL {
            assert_eq!(CalloutKind::from_marker_name(kind.marker_name()), Some(kind));
            assert_eq!(kind.css_class(), kind.marker_name().to_ascii_lowercase());
        }
    }

    #[test]
    fn test_paragraph_rewritten() {
        let tokens = transform("[!WARNING] careful *now*");
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[0],
            Token::HtmlBlock(r#"<div class="custom-block warning">"#.to_owned())
        );
        assert_eq!(tokens[2], Token::HtmlBlock("</div>".to_owned()));
        let Token::Inline(events) = &tokens[1] else {
            panic!("expected inline token");
        };
        assert_eq!(inline_text(events), "careful now");
        assert!(is_balanced(&tokens));
    }

    #[test]
    fn test_multiline_body_kept() {
        let tokens = transform("[!NOTE] first\nsecond line");
        assert_eq!(tokens[1].content(), "first\nsecond line");
    }

    #[test]
    fn test_marker_alone_on_first_line() {
        let tokens = transform("[!IMPORTANT]\nbody text");
        let Token::Inline(events) = &tokens[1] else {
            panic!("expected inline token");
        };
        assert!(matches!(&events[0], Event::Text(t) if t.as_ref() == "body text"));
    }

    #[test]
    fn test_empty_callout() {
        let tokens = transform("[!TIP]");
        assert_eq!(tokens[1], Token::Inline(Vec::new()));
    }

    #[test]
    fn test_unknown_kind_untouched() {
        let tokens = transform("[!FOO] hello");
        assert_eq!(tokens[0], Token::ParagraphOpen);
        assert_eq!(tokens[1].content(), "[!FOO] hello");
    }

    #[test]
    fn test_marker_not_at_start() {
        let tokens = transform("see [!TIP] here");
        assert_eq!(tokens[0], Token::ParagraphOpen);
    }

    #[test]
    fn test_heading_not_matched() {
        let tokens = transform("# [!TIP] title");
        assert!(tokens.iter().all(|t| !matches!(t, Token::HtmlBlock(_))));
    }

    #[test]
    fn test_tight_list_item() {
        let tokens = transform("- [!TIP] in tight list\n- other");
        assert!(is_balanced(&tokens));
        assert_eq!(tokens[1], Token::BlockOpen(Tag::Item));
        assert_eq!(
            tokens[2],
            Token::HtmlBlock(r#"<div class="custom-block tip">"#.to_owned())
        );
        assert_eq!(tokens[3].content(), "in tight list");
        assert_eq!(tokens[4], Token::HtmlBlock("</div>".to_owned()));
        assert_eq!(tokens[6], Token::BlockOpen(Tag::Item));
        assert_eq!(tokens[7].content(), "other");
    }

    #[test]
    fn test_tight_item_with_nested_list() {
        let tokens = transform("- [!NOTE] parent\n  - child");
        assert!(is_balanced(&tokens));
        assert_eq!(tokens[3].content(), "parent");
        assert_eq!(tokens[4], Token::HtmlBlock("</div>".to_owned()));
        assert_eq!(tokens[5].kind(), "block_open");
    }

    #[test]
    fn test_task_item_not_matched() {
        let tokens = transform("- [ ] [!TIP] todo");
        assert!(tokens.iter().all(|t| !matches!(t, Token::HtmlBlock(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(CalloutKind::Caution.to_string(), "[!CAUTION]");
    }
}
