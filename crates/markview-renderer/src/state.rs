//! Bookkeeping the serializer carries between tokens.
//!
//! Tables need the column being written, images collect their alt text before
//! the `<img>` tag can be emitted, and headings are buffered until their
//! anchor id is known.

use std::collections::HashSet;

use pulldown_cmark::Alignment;

/// Column position inside the table being written.
#[derive(Default)]
pub struct TableCursor {
    alignments: Vec<Alignment>,
    column: usize,
    header: bool,
}

impl TableCursor {
    pub fn begin(&mut self, alignments: Vec<Alignment>) {
        *self = Self {
            alignments,
            ..Self::default()
        };
    }

    pub fn enter_header(&mut self) {
        self.header = true;
        self.column = 0;
    }

    pub fn leave_header(&mut self) {
        self.header = false;
    }

    pub fn begin_row(&mut self) {
        self.column = 0;
    }

    pub fn end_cell(&mut self) {
        self.column += 1;
    }

    /// `th` while in the header row, `td` in the body.
    pub fn cell_tag(&self) -> &'static str {
        if self.header { "th" } else { "td" }
    }

    /// Inline style for the current column, empty when unaligned.
    pub fn align_attr(&self) -> &'static str {
        match self.alignments.get(self.column) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Image whose alt text is still being collected.
pub struct PendingImage {
    pub src: String,
    pub title: String,
    pub alt: String,
    /// Images nested in the alt text; they contribute text only.
    pub nested: usize,
}

impl PendingImage {
    pub fn new(src: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            title: title.into(),
            alt: String::new(),
            nested: 0,
        }
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Attribute block of a heading: `# Title {#id .class key=value}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadingAttrs {
    /// Id given by the author; replaces the generated slug.
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Other attributes, in source order. `None` for bare names.
    pub attrs: Vec<(String, Option<String>)>,
}

/// Heading ready to be written.
#[derive(Debug)]
pub struct CompletedHeading {
    pub level: u8,
    pub id: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, Option<String>)>,
    /// Rendered inline content.
    pub html: String,
}

struct OpenHeading {
    level: u8,
    attrs: HeadingAttrs,
    text: String,
    html: String,
}

/// Buffers the heading being written and hands out unique anchor ids.
#[derive(Default)]
pub struct HeadingState {
    extract_title: bool,
    title: Option<String>,
    open: Option<OpenHeading>,
    toc: Vec<TocEntry>,
    used_ids: HashSet<String>,
}

impl HeadingState {
    /// With `extract_title`, the first H1 becomes the document title and
    /// stays out of the table of contents.
    pub fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.open.is_some()
    }

    pub fn start_heading(&mut self, level: u8, attrs: HeadingAttrs) {
        self.open = Some(OpenHeading {
            level,
            attrs,
            text: String::new(),
            html: String::new(),
        });
    }

    /// Plain text, used for the slug and the table of contents.
    pub fn push_text(&mut self, text: &str) {
        if let Some(open) = &mut self.open {
            open.text.push_str(text);
        }
    }

    pub fn push_html(&mut self, html: &str) {
        if let Some(open) = &mut self.open {
            open.html.push_str(html);
        }
    }

    /// Close the buffered heading, assign its id and record it.
    pub fn complete_heading(&mut self) -> Option<CompletedHeading> {
        let OpenHeading {
            level,
            attrs,
            text,
            html,
        } = self.open.take()?;
        let title = text.trim().to_owned();

        let id = match attrs.id {
            Some(id) => {
                self.used_ids.insert(id.clone());
                id
            }
            None => self.unique_id(&title),
        };

        if self.extract_title && level == 1 && self.title.is_none() {
            self.title = Some(title);
        } else {
            self.toc.push(TocEntry {
                level,
                title,
                id: id.clone(),
            });
        }

        Some(CompletedHeading {
            level,
            id,
            classes: attrs.classes,
            attrs: attrs.attrs,
            html,
        })
    }

    /// Slug of `text`, suffixed with `-1`, `-2`, ... until unused.
    fn unique_id(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_owned();
        }

        let mut id = base.clone();
        let mut suffix = 0;
        while self.used_ids.contains(&id) {
            suffix += 1;
            id = format!("{base}-{suffix}");
        }
        self.used_ids.insert(id.clone());
        id
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Anchor slug of a heading.
///
/// Words are split at whitespace, `-` and `_`, lowercased, stripped of
/// everything but letters and digits, and joined with `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Escape `&`, `<`, `>` and `"` for use in text and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut copied = 0;
    for (index, c) in text.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            _ => continue,
        };
        escaped.push_str(&text[copied..index]);
        escaped.push_str(entity);
        copied = index + 1;
    }
    escaped.push_str(&text[copied..]);
    escaped
}
