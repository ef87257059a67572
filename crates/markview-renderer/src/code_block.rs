//! Code block processor trait for special fence languages.
//!
//! Processors are registered with the fence renderer and checked in order
//! before a fence is highlighted. The first processor returning
//! [`ProcessResult::Inline`] wins; the others pass the fence through.
//!
//! # Example
//!
//! ```
//! use markview_renderer::{CodeBlockProcessor, FenceInfo, ProcessResult};
//!
//! struct MathProcessor;
//!
//! impl CodeBlockProcessor for MathProcessor {
//!     fn process(&mut self, fence: &FenceInfo, source: &str) -> ProcessResult {
//!         if fence.language == "math" {
//!             ProcessResult::Inline(format!(r#"<div class="math">{}</div>"#, source.trim()))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use crate::state::escape_html;

/// Language assumed for fences without a language tag.
pub const DEFAULT_LANGUAGE: &str = "text";

/// Reserved language rendered as a diagram container instead of code.
pub const MERMAID_LANGUAGE: &str = "mermaid";

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the whole fence, shell included, with this HTML.
    Inline(String),
    /// Highlight and wrap as a regular code block.
    PassThrough,
}

/// Fence info string split into language and metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenceInfo {
    /// Language tag, [`DEFAULT_LANGUAGE`] when absent.
    pub language: String,
    /// Everything after the language tag, trimmed.
    pub meta: String,
}

impl FenceInfo {
    /// Split an info string at its first whitespace.
    #[must_use]
    pub fn parse(info: &str) -> Self {
        let info = info.trim();
        let (language, meta) = info
            .split_once(char::is_whitespace)
            .map_or((info, ""), |(language, meta)| (language, meta.trim()));
        let language = if language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            language
        };
        Self {
            language: language.to_owned(),
            meta: meta.to_owned(),
        }
    }
}

/// Trait for processing special code blocks.
pub trait CodeBlockProcessor {
    /// Process a fence and return the result.
    ///
    /// `source` is the literal fence body.
    fn process(&mut self, fence: &FenceInfo, source: &str) -> ProcessResult;

    /// Warnings generated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Emits `mermaid` fences as diagram containers for client-side rendering.
///
/// Each diagram gets an id from a counter that starts at zero, so ids are
/// unique within one render and identical across renders of the same source.
#[derive(Debug, Default)]
pub struct MermaidProcessor {
    next_id: usize,
}

impl MermaidProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeBlockProcessor for MermaidProcessor {
    fn process(&mut self, fence: &FenceInfo, source: &str) -> ProcessResult {
        if fence.language != MERMAID_LANGUAGE {
            return ProcessResult::PassThrough;
        }

        let id = self.next_id;
        self.next_id += 1;
        ProcessResult::Inline(format!(
            r#"<div class="mermaid" id="mermaid-{id}">{}</div>"#,
            escape_html(source)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fence_info() {
        assert_eq!(
            FenceInfo::parse("rust {1,3} ln"),
            FenceInfo {
                language: "rust".to_owned(),
                meta: "{1,3} ln".to_owned()
            }
        );
        assert_eq!(
            FenceInfo::parse("python"),
            FenceInfo {
                language: "python".to_owned(),
                meta: String::new()
            }
        );
    }

    #[test]
    fn test_parse_fence_info_empty() {
        let fence = FenceInfo::parse("   ");
        assert_eq!(fence.language, "text");
        assert_eq!(fence.meta, "");
    }

    #[test]
    fn test_mermaid_ids_increase() {
        let mut processor = MermaidProcessor::new();
        let fence = FenceInfo::parse("mermaid");
        let first = processor.process(&fence, "graph TD; A-->B");
        let second = processor.process(&fence, "graph LR; C-->D");
        assert_eq!(
            first,
            ProcessResult::Inline(
                r#"<div class="mermaid" id="mermaid-0">graph TD; A--&gt;B</div>"#.to_owned()
            )
        );
        assert!(matches!(second, ProcessResult::Inline(html) if html.contains(r#"id="mermaid-1""#)));
    }

    #[test]
    fn test_other_languages_pass_through() {
        let mut processor = MermaidProcessor::new();
        assert_eq!(
            processor.process(&FenceInfo::parse("rust"), "fn main() {}"),
            ProcessResult::PassThrough
        );
        assert!(processor.warnings().is_empty());
    }
}
