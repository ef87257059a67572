//! Flat token sequence built from the base markdown grammar.
//!
//! pulldown-cmark parses the source into an event stream. The stream is folded
//! into a flat list of [`Token`]s that mirrors the block structure of the
//! document:
//!
//! - block tags become open/close pairs ([`Token::ParagraphOpen`],
//!   [`Token::BlockOpen`], ...),
//! - a run of inline events becomes a single [`Token::Inline`],
//! - code blocks and raw HTML blocks collapse into one self-contained token.
//!
//! Transformers rewrite this sequence before it is serialized to HTML. Every
//! open token has exactly one matching close token later in the sequence; see
//! [`is_balanced`].

use std::borrow::Cow;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, TextMergeStream};

use crate::container::ContainerKind;

/// Position of a token in the implicit document tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nesting {
    /// Opens a region (+1).
    Open,
    /// Self-contained (0).
    Flat,
    /// Closes the innermost open region (-1).
    Close,
}

impl Nesting {
    /// Depth change caused by the token.
    #[must_use]
    pub fn delta(self) -> i32 {
        match self {
            Self::Open => 1,
            Self::Flat => 0,
            Self::Close => -1,
        }
    }
}

/// One node of the parsed document.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Paragraph start.
    ParagraphOpen,
    /// Paragraph end.
    ParagraphClose,
    /// Inline content of the enclosing block (text, emphasis, links, breaks).
    Inline(Vec<Event<'a>>),
    /// Raw HTML emitted verbatim.
    HtmlBlock(String),
    /// Fenced code block with its info string and body.
    Fence {
        /// Text after the opening fence (language and metadata).
        info: String,
        /// Literal body text.
        content: String,
    },
    /// Indented code block.
    CodeBlock(String),
    /// Start of a `:::kind` container region.
    ContainerOpen {
        /// Container kind.
        kind: ContainerKind,
        /// Trailing text on the opening line, trimmed.
        info: String,
    },
    /// End of a container region.
    ContainerClose(ContainerKind),
    /// Any other block-level tag of the base grammar (heading, list, table, ...).
    BlockOpen(Tag<'a>),
    /// End of a block-level tag.
    BlockClose(TagEnd),
    /// Self-contained block event (thematic break).
    Leaf(Event<'a>),
}

impl Token<'_> {
    /// Nesting value of this token.
    #[must_use]
    pub fn nesting(&self) -> Nesting {
        match self {
            Self::ParagraphOpen | Self::ContainerOpen { .. } | Self::BlockOpen(_) => Nesting::Open,
            Self::ParagraphClose | Self::ContainerClose(_) | Self::BlockClose(_) => Nesting::Close,
            Self::Inline(_)
            | Self::HtmlBlock(_)
            | Self::Fence { .. }
            | Self::CodeBlock(_)
            | Self::Leaf(_) => Nesting::Flat,
        }
    }

    /// Semantic tag of the token (`paragraph_open`, `inline`, `fence`, ...).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ParagraphOpen => "paragraph_open",
            Self::ParagraphClose => "paragraph_close",
            Self::Inline(_) => "inline",
            Self::HtmlBlock(_) => "html_block",
            Self::Fence { .. } => "fence",
            Self::CodeBlock(_) => "code_block",
            Self::ContainerOpen { .. } => "container_open",
            Self::ContainerClose(_) => "container_close",
            Self::BlockOpen(_) => "block_open",
            Self::BlockClose(_) => "block_close",
            Self::Leaf(_) => "leaf",
        }
    }

    /// Text payload: plain text for inline tokens, markup for HTML blocks,
    /// body for code blocks. Empty for structural tokens.
    #[must_use]
    pub fn content(&self) -> Cow<'_, str> {
        match self {
            Self::Inline(events) => Cow::Owned(inline_text(events)),
            Self::HtmlBlock(html) => Cow::Borrowed(html),
            Self::Fence { content, .. } | Self::CodeBlock(content) => Cow::Borrowed(content),
            _ => Cow::Borrowed(""),
        }
    }

    /// Info string of fences and container openings. Empty otherwise.
    #[must_use]
    pub fn info(&self) -> &str {
        match self {
            Self::Fence { info, .. } | Self::ContainerOpen { info, .. } => info,
            _ => "",
        }
    }
}

/// Plain text of a run of inline events.
///
/// Text and inline code contribute their literal content, line breaks become
/// `\n`, markup is dropped.
#[must_use]
pub fn inline_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Check that every open token is closed by a token of the same kind, in order.
#[must_use]
pub fn is_balanced(tokens: &[Token<'_>]) -> bool {
    let mut open: Vec<&Token<'_>> = Vec::new();
    for token in tokens {
        match token.nesting() {
            Nesting::Open => open.push(token),
            Nesting::Close => match open.pop() {
                Some(opener) if closes(opener, token) => {}
                _ => return false,
            },
            Nesting::Flat => {}
        }
    }
    open.is_empty()
}

fn closes(opener: &Token<'_>, closer: &Token<'_>) -> bool {
    match (opener, closer) {
        (Token::ParagraphOpen, Token::ParagraphClose) => true,
        (Token::ContainerOpen { kind, .. }, Token::ContainerClose(closed)) => kind == closed,
        (Token::BlockOpen(tag), Token::BlockClose(end)) => tag.to_end() == *end,
        _ => false,
    }
}

/// Options for the base grammar.
#[derive(Clone, Copy, Debug)]
pub struct TokenizerOptions {
    /// Typographic substitution (smart quotes, dashes, ellipsis).
    pub typographer: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self { typographer: true }
    }
}

impl TokenizerOptions {
    /// pulldown-cmark options for this configuration.
    ///
    /// Raw HTML always passes through; pulldown-cmark has no switch for it.
    /// Headings accept a trailing `{#id .class key=value}` attribute block.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES;
        if self.typographer {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }
}

/// Parse markdown source into a balanced token sequence.
#[must_use]
pub fn tokenize(source: &str, options: TokenizerOptions) -> Vec<Token<'_>> {
    let parser = Parser::new_ext(source, options.parser_options());
    let mut builder = TokenBuilder::default();
    for event in TextMergeStream::new(parser) {
        builder.push(event);
    }
    builder.finish()
}

/// Code block being collected.
struct CodeCapture {
    /// Info string for fenced blocks, `None` for indented ones.
    info: Option<String>,
    content: String,
}

#[derive(Default)]
struct TokenBuilder<'a> {
    tokens: Vec<Token<'a>>,
    inline: Vec<Event<'a>>,
    code: Option<CodeCapture>,
    html: Option<String>,
}

impl<'a> TokenBuilder<'a> {
    fn push(&mut self, event: Event<'a>) {
        if let Some(code) = &mut self.code {
            match event {
                Event::Text(text) => code.content.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.finish_code(),
                _ => {}
            }
            return;
        }

        if let Some(html) = &mut self.html {
            match event {
                Event::Html(text) | Event::Text(text) => html.push_str(&text),
                Event::End(TagEnd::HtmlBlock) => {
                    if let Some(html) = self.html.take() {
                        self.tokens.push(Token::HtmlBlock(html));
                    }
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Paragraph) => self.block(Token::ParagraphOpen),
            Event::End(TagEnd::Paragraph) => self.block(Token::ParagraphClose),
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_inline();
                let info = match kind {
                    CodeBlockKind::Fenced(info) => Some(info.into_string()),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeCapture {
                    info,
                    content: String::new(),
                });
            }
            Event::Start(Tag::HtmlBlock) => {
                self.flush_inline();
                self.html = Some(String::new());
            }
            Event::Start(tag) if !is_inline_tag(&tag) => self.block(Token::BlockOpen(tag)),
            Event::End(end) if !is_inline_end(end) => self.block(Token::BlockClose(end)),
            Event::Rule => self.block(Token::Leaf(Event::Rule)),
            Event::Html(html) => self.block(Token::HtmlBlock(html.into_string())),
            other => self.inline.push(other),
        }
    }

    fn block(&mut self, token: Token<'a>) {
        self.flush_inline();
        self.tokens.push(token);
    }

    fn flush_inline(&mut self) {
        if !self.inline.is_empty() {
            self.tokens
                .push(Token::Inline(std::mem::take(&mut self.inline)));
        }
    }

    fn finish_code(&mut self) {
        if let Some(code) = self.code.take() {
            self.tokens.push(match code.info {
                Some(info) => Token::Fence {
                    info,
                    content: code.content,
                },
                None => Token::CodeBlock(code.content),
            });
        }
    }

    fn finish(mut self) -> Vec<Token<'a>> {
        // The parser closes every block itself; these only matter for truncated streams.
        self.finish_code();
        if let Some(html) = self.html.take() {
            self.tokens.push(Token::HtmlBlock(html));
        }
        self.flush_inline();
        self.tokens
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Superscript
            | Tag::Subscript
            | Tag::Link { .. }
            | Tag::Image { .. }
    )
}

fn is_inline_end(end: TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript
            | TagEnd::Link
            | TagEnd::Image
    )
}
