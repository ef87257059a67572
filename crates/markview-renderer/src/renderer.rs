//! Token sequence to HTML serializer.

use std::fmt::Write;

use pulldown_cmark::{Event, HeadingLevel, Tag, TagEnd};

use crate::copy::{CodeBlockSource, CopyHandler};
use crate::fence::FenceRenderer;
use crate::html;
use crate::state::{HeadingAttrs, HeadingState, PendingImage, TableCursor, TocEntry, escape_html};
use crate::token::Token;

/// Result of rendering markdown.
#[derive(Clone, Debug, Default)]
pub struct RenderOutput {
    /// Rendered HTML fragment.
    pub html: String,
    /// Title extracted from first H1 heading (if title extraction was enabled).
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
    /// Sources of highlighted code blocks, in document order.
    pub code_blocks: Vec<CodeBlockSource>,
    /// Non-fatal problems met while rendering (e.g. highlighter failures).
    pub warnings: Vec<String>,
}

impl RenderOutput {
    /// Copy handler for the code blocks of this render.
    pub fn copy_handler(&self) -> CopyHandler<'_> {
        CopyHandler::new(&self.code_blocks)
    }
}

/// Serializes a transformed token sequence to HTML.
///
/// Fence tokens are delegated to a [`FenceRenderer`]; everything else is
/// written directly.
pub struct HtmlRenderer<'h> {
    output: String,
    table: TableCursor,
    image: Option<PendingImage>,
    heading: HeadingState,
    fences: FenceRenderer<'h>,
}

impl<'h> HtmlRenderer<'h> {
    pub fn new(fences: FenceRenderer<'h>) -> Self {
        Self {
            output: String::with_capacity(4096),
            table: TableCursor::default(),
            image: None,
            heading: HeadingState::new(false),
            fences,
        }
    }

    /// Enable title extraction from the first H1 heading.
    ///
    /// The heading is still rendered but left out of the table of contents.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Render tokens and return the result.
    pub fn render(mut self, tokens: &[Token<'_>]) -> RenderOutput {
        for token in tokens {
            self.token(token);
        }

        let (code_blocks, warnings) = self.fences.finish();
        RenderOutput {
            html: self.output,
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            code_blocks,
            warnings,
        }
    }

    fn token(&mut self, token: &Token<'_>) {
        match token {
            Token::ParagraphOpen => self.output.push_str("<p>"),
            Token::ParagraphClose => self.output.push_str("</p>"),
            Token::Inline(events) => {
                for event in events {
                    self.inline_event(event);
                }
            }
            Token::HtmlBlock(raw) => self.output.push_str(raw),
            Token::Fence { info, content } => self.fences.render(info, content, &mut self.output),
            Token::CodeBlock(content) => html::code_block(content, &mut self.output),
            Token::ContainerOpen { kind, info } => {
                html::container_start(*kind, info, &mut self.output);
            }
            Token::ContainerClose(kind) => html::container_end(*kind, &mut self.output),
            Token::BlockOpen(tag) => self.start_block(tag),
            Token::BlockClose(end) => self.end_block(*end),
            Token::Leaf(event) => self.inline_event(event),
        }
    }

    fn start_block(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                // Opening tag is written in end_block once the id is known.
                let heading_attrs = HeadingAttrs {
                    id: id.as_deref().map(str::to_owned),
                    classes: classes.iter().map(ToString::to_string).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(name, value)| (name.to_string(), value.as_deref().map(str::to_owned)))
                        .collect(),
                };
                self.heading
                    .start_heading(heading_level_to_num(*level), heading_attrs);
            }
            Tag::BlockQuote(_) => html::blockquote_start(&mut self.output),
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.begin(alignments.clone());
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.enter_header();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.begin_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                write!(
                    self.output,
                    "<{}{}>",
                    self.table.cell_tag(),
                    self.table.align_attr()
                )
                .unwrap();
            }
            _ => self.inline_start(tag),
        }
    }

    fn end_block(&mut self, end: TagEnd) {
        match end {
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete_heading() {
                    html::heading(&heading, &mut self.output);
                }
            }
            TagEnd::BlockQuote(_) => html::blockquote_end(&mut self.output),
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.leave_header();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                write!(self.output, "</{}>", self.table.cell_tag()).unwrap();
                self.table.end_cell();
            }
            _ => self.inline_end(end),
        }
    }

    fn inline_event(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(tag) => self.inline_start(tag),
            Event::End(end) => self.inline_end(*end),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.inline_code(code),
            Event::Html(raw) | Event::InlineHtml(raw) => self.push_inline(raw),
            Event::SoftBreak => self.push_inline("\n"),
            Event::HardBreak => {
                if self.image.is_none() {
                    let mut br = String::new();
                    html::hard_break(&mut br);
                    self.push_inline(&br);
                }
            }
            Event::Rule => html::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => html::task_list_marker(*checked, &mut self.output),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn inline_start(&mut self, tag: &Tag<'_>) {
        if let Some(image) = &mut self.image {
            if matches!(tag, Tag::Image { .. }) {
                image.nested += 1;
            }
            return;
        }
        match tag {
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut anchor = String::new();
                html::link_start(dest_url, title, &mut anchor);
                self.push_inline(&anchor);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the image ends.
                self.image = Some(PendingImage::new(dest_url.to_string(), title.to_string()));
            }
            _ => {}
        }
    }

    fn inline_end(&mut self, end: TagEnd) {
        if let Some(image) = &mut self.image {
            if end != TagEnd::Image {
                return;
            }
            if image.nested > 0 {
                image.nested -= 1;
                return;
            }
            if let Some(image) = self.image.take() {
                let mut img = String::new();
                html::image(&image.src, &image.alt, &image.title, &mut img);
                self.push_inline(&img);
            }
            return;
        }
        match end {
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            _ => {}
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{HighlightError, HighlightedCode, Highlighter};
    use crate::linkify::LinkifyTransform;
    use crate::pipeline::Pipeline;
    use crate::theme::ResolvedTheme;
    use crate::token::{TokenizerOptions, tokenize};
    use pretty_assertions::assert_eq;

    struct PlainHighlighter;

    impl Highlighter for PlainHighlighter {
        fn highlight(
            &self,
            code: &str,
            _language: &str,
            _theme: &ResolvedTheme,
        ) -> Result<HighlightedCode, HighlightError> {
            Ok(HighlightedCode {
                lines: code.lines().map(escape_html).collect(),
                ..HighlightedCode::default()
            })
        }

        fn themes(&self) -> Vec<String> {
            Vec::new()
        }

        fn supports_language(&self, _language: &str) -> bool {
            true
        }
    }

    fn render_html(markdown: &str) -> RenderOutput {
        let mut tokens = tokenize(markdown, TokenizerOptions::default());
        Pipeline::standard()
            .with_stage(LinkifyTransform)
            .run(&mut tokens);
        let fences = FenceRenderer::new(&PlainHighlighter, ResolvedTheme::new("t"));
        HtmlRenderer::new(fences).render(&tokens)
    }

    fn render_html_with_title(markdown: &str) -> RenderOutput {
        let tokens = tokenize(markdown, TokenizerOptions::default());
        let fences = FenceRenderer::new(&PlainHighlighter, ResolvedTheme::new("t"));
        HtmlRenderer::new(fences)
            .with_title_extraction()
            .render(&tokens)
    }

    #[test]
    fn test_html_basic_paragraph() {
        let result = render_html("Hello, world!");
        assert_eq!(result.html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_html_heading_with_id() {
        let result = render_html("## Section Title");
        assert_eq!(
            result.html,
            r##"<h2 id="section-title">Section Title <a class="header-anchor" href="#section-title" aria-hidden="true">#</a></h2>"##
        );
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].level, 2);
        assert_eq!(result.toc[0].title, "Section Title");
    }

    #[test]
    fn test_html_heading_with_inline_code() {
        let result = render_html("## Use `cargo`");
        assert!(result.html.contains(r#"<h2 id="use-cargo">Use <code>cargo</code>"#));
    }

    #[test]
    fn test_html_heading_attribute_block() {
        let result = render_html("# Title {#custom .lead data-level=top}\n\n## Title");
        assert_eq!(
            result.html,
            concat!(
                r##"<h1 id="custom" class="lead" data-level="top">Title <a class="header-anchor" href="#custom" aria-hidden="true">#</a></h1>"##,
                r##"<h2 id="title">Title <a class="header-anchor" href="#title" aria-hidden="true">#</a></h2>"##
            )
        );
        assert_eq!(result.toc[0].id, "custom");
        assert_eq!(result.toc[0].title, "Title");
    }

    #[test]
    fn test_html_heading_attribute_class_only() {
        let result = render_html("## Setup {.optional}");
        assert!(result.html.starts_with(r#"<h2 id="setup" class="optional">Setup "#));
    }

    #[test]
    fn test_html_title_extraction() {
        let result = render_html_with_title("# My Title\n\nSome content\n\n## Section");
        assert_eq!(result.title, Some("My Title".to_owned()));
        assert!(result.html.contains(r#"<h1 id="my-title">My Title"#));
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].level, 2);
    }

    #[test]
    fn test_html_inline_formatting() {
        let result = render_html("*em* **strong** ~~gone~~ `code`");
        assert_eq!(
            result.html,
            "<p><em>em</em> <strong>strong</strong> <s>gone</s> <code>code</code></p>"
        );
    }

    #[test]
    fn test_html_link_and_autolink() {
        let result = render_html("[site](https://a.dev \"A\") and https://b.dev");
        assert_eq!(
            result.html,
            r#"<p><a href="https://a.dev" title="A">site</a> and <a href="https://b.dev">https://b.dev</a></p>"#
        );
    }

    #[test]
    fn test_html_image_alt_text() {
        let result = render_html("![An *image*](img.png)");
        assert_eq!(result.html, r#"<p><img src="img.png" alt="An image"></p>"#);
    }

    #[test]
    fn test_html_nested_image_alt_text() {
        let result = render_html("![outer ![inner](in.png) tail](out.png)");
        assert_eq!(
            result.html,
            r#"<p><img src="out.png" alt="outer inner tail"></p>"#
        );
    }

    #[test]
    fn test_html_lists() {
        let ordered = render_html("3. a\n4. b");
        assert_eq!(ordered.html, r#"<ol start="3"><li>a</li><li>b</li></ol>"#);

        let tasks = render_html("- [x] done\n- [ ] todo");
        assert!(tasks.html.starts_with("<ul><li>"));
        assert!(tasks.html.contains("checked disabled>"));
        assert!(tasks.html.ends_with("todo</li></ul>"));
    }

    #[test]
    fn test_html_table() {
        let result = render_html("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            result.html,
            concat!(
                "<table><thead><tr>",
                r#"<th style="text-align:left">A</th><th style="text-align:right">B</th>"#,
                "</tr></thead><tbody><tr>",
                r#"<td style="text-align:left">1</td><td style="text-align:right">2</td>"#,
                "</tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_html_blockquote_and_rule() {
        let result = render_html("> quoted\n\n---");
        assert_eq!(result.html, "<blockquote><p>quoted</p></blockquote><hr>");
    }

    #[test]
    fn test_html_hard_break() {
        let result = render_html("a  \nb");
        assert_eq!(result.html, "<p>a<br>b</p>");
    }

    #[test]
    fn test_html_raw_passthrough() {
        let result = render_html("<div class=\"x\">raw</div>\n\ntext <kbd>k</kbd>");
        assert!(result.html.starts_with("<div class=\"x\">raw</div>"));
        assert!(result.html.contains("<kbd>k</kbd>"));
    }

    #[test]
    fn test_html_indented_code() {
        let result = render_html("    <tag>\n");
        assert_eq!(result.html, "<pre><code>&lt;tag&gt;\n</code></pre>");
    }

    #[test]
    fn test_callout_and_container() {
        let result = render_html("[!TIP] hello\n\n:::danger\nBody\n:::");
        assert_eq!(
            result.html,
            concat!(
                r#"<div class="custom-block tip">hello</div>"#,
                r#"<div class="custom-block danger"><p>Body</p></div>"#
            )
        );
    }

    #[test]
    fn test_code_blocks_collected() {
        let result = render_html("```rust\nfn a() {}\n```\n\n```\nplain\n```");
        assert_eq!(result.code_blocks.len(), 2);
        assert_eq!(result.code_blocks[1].id, "code-1");
        assert_eq!(result.copy_handler().source("code-0"), Some("fn a() {}\n"));
    }
}
