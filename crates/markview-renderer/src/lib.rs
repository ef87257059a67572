//! Markdown to HTML renderer for live preview.
//!
//! The pipeline extends the pulldown-cmark grammar with three constructs:
//!
//! - alert callouts: a paragraph starting with `[!NOTE]`, `[!TIP]`,
//!   `[!IMPORTANT]`, `[!WARNING]` or `[!CAUTION]`,
//! - fenced containers: `:::info`, `:::tip`, `:::warning`, `:::danger` and
//!   `:::details Title` regions closed by `:::`,
//! - enhanced code fences: syntax highlighting, `{1,3-5}` line emphasis,
//!   `ln` line numbers, a copy button and `mermaid` diagram passthrough.
//!
//! # Architecture
//!
//! [`Markview`] drives a render:
//!
//! 1. [`isolate_fences`] separates paired `:::` fence lines from the blocks
//!    around them, then [`tokenize`] folds the parser's events into a flat
//!    [`Token`] sequence.
//! 2. The [`Pipeline`] runs its [`Transform`] stages in order: containers
//!    first, then alerts, then [`LinkifyTransform`] when autolinking is on.
//! 3. [`HtmlRenderer`] serializes the tokens, handing fences to a
//!    [`FenceRenderer`] that uses a [`Highlighter`] and the theme resolved for
//!    this render.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use markview_renderer::{
//!     FixedPreference, Markview, SyntectHighlighter, ThemeMode, ThemeResolver,
//! };
//!
//! let resolver = ThemeResolver::new(ThemeMode::Auto, Arc::new(FixedPreference::default()));
//! let markview = Markview::new(Arc::new(SyntectHighlighter::new()), resolver);
//!
//! let output = markview.render_document(":::tip\nBody\n:::\n\n```rust {1}\nfn main() {}\n```");
//! assert!(output.html.starts_with(r#"<div class="custom-block tip"><p>Body</p></div>"#));
//! assert_eq!(output.code_blocks.len(), 1);
//! ```

mod alert;
mod code_block;
mod container;
mod copy;
mod driver;
mod fence;
mod highlight;
mod html;
mod linkify;
mod meta;
mod page;
mod pipeline;
mod renderer;
mod state;
mod theme;
mod token;

pub use alert::{AlertTransform, CalloutKind, strip_marker};
pub use code_block::{
    CodeBlockProcessor, DEFAULT_LANGUAGE, FenceInfo, MERMAID_LANGUAGE, MermaidProcessor,
    ProcessResult,
};
pub use container::{
    ContainerKind, ContainerTransform, DEFAULT_DETAILS_TITLE, Marker, details_title,
    isolate_fences, parse_marker,
};
pub use copy::{
    COPY_LABEL, COPY_SCRIPT, Clipboard, ClipboardError, CodeBlockSource, CopyButton, CopyError,
    CopyHandler, FEEDBACK_DURATION, Feedback,
};
pub use driver::{Markview, MarkviewOptions};
pub use fence::FenceRenderer;
pub use highlight::{HighlightError, HighlightedCode, Highlighter, SyntectHighlighter};
pub use linkify::LinkifyTransform;
pub use meta::{FenceMeta, MAX_RANGE_SPAN, parse_meta};
pub use page::{PageData, render_page};
pub use pipeline::{Pipeline, Transform};
pub use renderer::{HtmlRenderer, RenderOutput};
pub use state::{TocEntry, escape_html, slugify};
pub use theme::{
    Appearance, AppearanceCallback, DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME, FixedPreference,
    ParseAppearanceError, PreferenceSignal, PreferenceSubscription, ResolvedTheme,
    SharedPreference, ThemeMode, ThemeResolver,
};
pub use token::{Nesting, Token, TokenizerOptions, inline_text, is_balanced, tokenize};
