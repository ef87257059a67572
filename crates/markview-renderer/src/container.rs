//! Fenced container blocks.
//!
//! ```markdown
//! :::tip Optional info
//! Body, any markdown.
//! :::
//!
//! :::details Click to expand
//! Hidden content.
//! :::
//! ```
//!
//! The base grammar has no notion of these fences. Two passes handle them:
//!
//! 1. [`isolate_fences`] works on the source. It pairs fence lines outside
//!    code and surrounds each pair member with blank lines, so a fence right
//!    after a list, quote or table is not swallowed as continuation text.
//! 2. [`ContainerTransform`] finds marker lines inside paragraphs, pairs
//!    openers with closers that live in the same enclosing block, then splits
//!    the affected paragraphs and inserts container open/close tokens. Fences
//!    inside block quotes only reach this stage.
//!
//! Markers that cannot be paired stay in the output as literal text.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;

use pulldown_cmark::Event;

use crate::pipeline::Transform;
use crate::token::{Nesting, Token};

/// Minimum number of colons in a container fence.
const MIN_COLONS: usize = 3;

/// Indentation at which a line is code rather than a fence.
const CODE_INDENT: usize = 4;

/// Summary used for `details` containers without a title.
pub const DEFAULT_DETAILS_TITLE: &str = "Details";

/// Kind of fenced container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Info,
    Tip,
    Warning,
    Danger,
    /// Collapsible block with a summary line.
    Details,
}

impl ContainerKind {
    /// Parse a container name. Case-sensitive, lowercase only.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "info" => Some(Self::Info),
            "tip" => Some(Self::Tip),
            "warning" => Some(Self::Warning),
            "danger" => Some(Self::Danger),
            "details" => Some(Self::Details),
            _ => None,
        }
    }

    /// Container name, also used as its CSS class.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Details => "details",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Title of a `details` container: the trimmed info text, or
/// [`DEFAULT_DETAILS_TITLE`] when empty.
#[must_use]
pub fn details_title(info: &str) -> &str {
    match info.trim() {
        "" => DEFAULT_DETAILS_TITLE,
        title => title,
    }
}

/// A container fence line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    /// `:::kind info`
    Open {
        kind: ContainerKind,
        info: String,
        colons: usize,
    },
    /// `:::`
    Close { colons: usize },
}

/// Parse a single line as a container fence.
///
/// Leading and trailing whitespace of the line is ignored. Unknown container
/// names are not fences.
#[must_use]
pub fn parse_marker(line: &str) -> Option<Marker> {
    let line = line.trim();
    let rest = line.trim_start_matches(':');
    let colons = line.len() - rest.len();
    if colons < MIN_COLONS {
        return None;
    }

    if rest.is_empty() {
        return Some(Marker::Close { colons });
    }

    let rest = rest.trim_start();
    let (name, info) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, info)| (name, info.trim()));
    let kind = ContainerKind::from_name(name)?;
    Some(Marker::Open {
        kind,
        info: info.to_owned(),
        colons,
    })
}

/// Put every paired fence line of `source` on its own blank-separated line.
///
/// The info text of an opener is backslash-escaped so it reaches the
/// transform verbatim: no smart quotes, no inline markup. Lines inside fenced
/// code and lines indented as code are never fences. Returns `source`
/// unchanged when nothing pairs.
#[must_use]
pub fn isolate_fences(source: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let paired = paired_fence_lines(&lines);
    if paired.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len() + paired.len() * 4);
    for (index, line) in lines.iter().enumerate() {
        if paired.contains(&index) {
            out.push('\n');
            escape_info(line.trim_end_matches(['\n', '\r']), &mut out);
            out.push_str("\n\n");
        } else {
            out.push_str(line);
        }
    }
    Cow::Owned(out)
}

/// Indices of fence lines that have a partner.
fn paired_fence_lines(lines: &[&str]) -> HashSet<usize> {
    let mut paired = HashSet::new();
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut code: Option<CodeFence> = None;

    for (index, line) in lines.iter().enumerate() {
        if let Some(fence) = &code {
            if fence.is_closed_by(line) {
                code = None;
            }
            continue;
        }
        if let Some(fence) = CodeFence::open(line) {
            code = Some(fence);
            continue;
        }
        if indentation(line) >= CODE_INDENT {
            continue;
        }

        match parse_marker(line) {
            Some(Marker::Open { colons, .. }) => open.push((index, colons)),
            Some(Marker::Close { colons }) => {
                if let Some(&(opener, opened)) = open.last()
                    && colons >= opened
                {
                    open.pop();
                    paired.insert(opener);
                    paired.insert(index);
                }
            }
            None => {}
        }
    }

    paired
}

/// Copy a fence line, escaping ASCII punctuation in the info text.
fn escape_info(line: &str, out: &mut String) {
    let name = line.trim_start().trim_start_matches(':').trim_start();
    let name_len = name.find(char::is_whitespace).unwrap_or(name.len());
    let (head, info) = line.split_at(line.len() - name.len() + name_len);
    out.push_str(head);
    for c in info.chars() {
        if c.is_ascii_punctuation() {
            out.push('\\');
        }
        out.push(c);
    }
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { CODE_INDENT } else { 1 })
        .sum()
}

/// Backtick or tilde code fence being skipped.
struct CodeFence {
    marker: char,
    len: usize,
}

impl CodeFence {
    fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        if marker == '`' && trimmed[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let len = trimmed.chars().take_while(|c| *c == self.marker).count();
        len >= self.len && len == trimmed.chars().count()
    }
}

/// Rewrites `:::kind` regions into container tokens.
pub struct ContainerTransform;

impl Transform for ContainerTransform {
    fn name(&self) -> &'static str {
        "container"
    }

    fn apply(&self, tokens: &mut Vec<Token<'_>>) {
        let sites = find_sites(tokens);
        if sites.is_empty() {
            return;
        }

        let rewrites = pair_sites(sites);
        if rewrites.is_empty() {
            return;
        }

        let original = std::mem::take(tokens);
        *tokens = rebuild(original, &rewrites);
    }
}

/// Marker line found inside a paragraph.
struct Site {
    /// Index of the paragraph's inline token.
    token: usize,
    /// Line number within the paragraph.
    line: usize,
    /// Index of the open token enclosing the paragraph (`None` at top level).
    parent: Option<usize>,
    marker: Marker,
}

/// Replacement for a matched marker line.
enum Rewrite {
    Open { kind: ContainerKind, info: String },
    Close(ContainerKind),
}

impl Rewrite {
    fn to_token<'a>(&self) -> Token<'a> {
        match self {
            Self::Open { kind, info } => Token::ContainerOpen {
                kind: *kind,
                info: info.clone(),
            },
            Self::Close(kind) => Token::ContainerClose(*kind),
        }
    }
}

fn find_sites(tokens: &[Token<'_>]) -> Vec<Site> {
    let mut sites = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token.nesting() {
            Nesting::Open => open.push(index),
            Nesting::Close => {
                open.pop();
            }
            Nesting::Flat => {}
        }

        let Token::Inline(events) = token else {
            continue;
        };
        if !is_paragraph_body(tokens, index) {
            continue;
        }

        // The innermost open token is the paragraph itself.
        let parent = open
            .len()
            .checked_sub(2)
            .and_then(|i| open.get(i))
            .copied();
        for (line, range) in split_lines(events).into_iter().enumerate() {
            if let Some(marker) = plain_line(&events[range]).as_deref().and_then(parse_marker) {
                sites.push(Site {
                    token: index,
                    line,
                    parent,
                    marker,
                });
            }
        }
    }

    sites
}

fn is_paragraph_body(tokens: &[Token<'_>], index: usize) -> bool {
    index > 0
        && matches!(tokens[index - 1], Token::ParagraphOpen)
        && matches!(tokens.get(index + 1), Some(Token::ParagraphClose))
}

/// Pair openers with closers per enclosing block.
///
/// A closer matches the innermost unmatched opener of the same block when it
/// has at least as many colons.
fn pair_sites(sites: Vec<Site>) -> HashMap<(usize, usize), Rewrite> {
    let mut pending: HashMap<Option<usize>, Vec<Site>> = HashMap::new();
    let mut rewrites = HashMap::new();

    for site in sites {
        let stack = pending.entry(site.parent).or_default();
        match site.marker {
            Marker::Open { .. } => stack.push(site),
            Marker::Close { colons } => {
                let matches_top = matches!(
                    stack.last(),
                    Some(Site { marker: Marker::Open { colons: opened, .. }, .. }) if colons >= *opened
                );
                if !matches_top {
                    tracing::debug!(
                        token = site.token,
                        line = site.line,
                        "Unmatched container close left as text"
                    );
                    continue;
                }
                if let Some(Site {
                    token,
                    line,
                    marker: Marker::Open { kind, info, .. },
                    ..
                }) = stack.pop()
                {
                    rewrites.insert((token, line), Rewrite::Open { kind, info });
                    rewrites.insert((site.token, site.line), Rewrite::Close(kind));
                }
            }
        }
    }

    for site in pending.values().flatten() {
        tracing::debug!(
            token = site.token,
            line = site.line,
            "Unclosed container fence left as text"
        );
    }

    rewrites
}

fn rebuild<'a>(tokens: Vec<Token<'a>>, rewrites: &HashMap<(usize, usize), Rewrite>) -> Vec<Token<'a>> {
    let split: HashSet<usize> = rewrites.keys().map(|&(token, _)| token).collect();
    let mut out = Vec::with_capacity(tokens.len() + rewrites.len() * 3);

    for (index, token) in tokens.into_iter().enumerate() {
        let paragraph_edge = match token {
            Token::ParagraphOpen => split.contains(&(index + 1)),
            Token::ParagraphClose => index.checked_sub(1).is_some_and(|i| split.contains(&i)),
            _ => false,
        };
        if paragraph_edge {
            continue;
        }

        match token {
            Token::Inline(events) if split.contains(&index) => {
                split_paragraph(index, events, rewrites, &mut out);
            }
            other => out.push(other),
        }
    }

    out
}

/// Emit a paragraph as alternating paragraph segments and container tokens.
fn split_paragraph<'a>(
    token: usize,
    events: Vec<Event<'a>>,
    rewrites: &HashMap<(usize, usize), Rewrite>,
    out: &mut Vec<Token<'a>>,
) {
    let mut segment: Option<Range<usize>> = None;
    for (line, range) in split_lines(&events).into_iter().enumerate() {
        match rewrites.get(&(token, line)) {
            Some(rewrite) => {
                if let Some(segment) = segment.take() {
                    push_paragraph(&events[segment], out);
                }
                out.push(rewrite.to_token());
            }
            None => {
                segment = Some(match segment {
                    Some(current) => current.start..range.end,
                    None => range,
                });
            }
        }
    }
    if let Some(segment) = segment {
        push_paragraph(&events[segment], out);
    }
}

fn push_paragraph<'a>(events: &[Event<'a>], out: &mut Vec<Token<'a>>) {
    if events.is_empty() {
        return;
    }
    out.push(Token::ParagraphOpen);
    out.push(Token::Inline(events.to_vec()));
    out.push(Token::ParagraphClose);
}

/// Split inline events into lines at top-level soft and hard breaks.
///
/// The returned ranges exclude the break events themselves.
pub(crate) fn split_lines(events: &[Event<'_>]) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::SoftBreak | Event::HardBreak if depth == 0 => {
                lines.push(start..index);
                start = index + 1;
            }
            _ => {}
        }
    }
    lines.push(start..events.len());
    lines
}

/// Text of a line made only of plain text events.
fn plain_line(events: &[Event<'_>]) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    let mut line = String::new();
    for event in events {
        match event {
            Event::Text(text) => line.push_str(text),
            _ => return None,
        }
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{TokenizerOptions, is_balanced, tokenize};
    use pretty_assertions::assert_eq;

    fn transform(source: &str) -> Vec<Token<'_>> {
        let mut tokens = tokenize(source, TokenizerOptions::default());
        ContainerTransform.apply(&mut tokens);
        assert!(is_balanced(&tokens));
        tokens
    }

    fn container_tokens(tokens: &[Token<'_>]) -> Vec<String> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::ContainerOpen { kind, info } => Some(format!("open {kind} {info}")),
                Token::ContainerClose(kind) => Some(format!("close {kind}")),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(
            parse_marker(":::tip"),
            Some(Marker::Open {
                kind: ContainerKind::Tip,
                info: String::new(),
                colons: 3
            })
        );
        assert_eq!(
            parse_marker("::::  details  Custom Title "),
            Some(Marker::Open {
                kind: ContainerKind::Details,
                info: "Custom Title".to_owned(),
                colons: 4
            })
        );
        assert_eq!(parse_marker(":::"), Some(Marker::Close { colons: 3 }));
        assert_eq!(parse_marker("::"), None);
        assert_eq!(parse_marker(":::unknown"), None);
        assert_eq!(parse_marker(":::TIP"), None);
        assert_eq!(parse_marker("text :::tip"), None);
    }

    #[test]
    fn test_details_title() {
        assert_eq!(details_title("  Custom Title "), "Custom Title");
        assert_eq!(details_title(""), "Details");
        assert_eq!(details_title("   "), "Details");
    }

    #[test]
    fn test_single_paragraph_container() {
        let tokens = transform(":::tip\nBody\n:::");
        assert_eq!(tokens.len(), 5);
        assert_eq!(container_tokens(&tokens), vec!["open tip ", "close tip"]);
        assert_eq!(tokens[2].content(), "Body");
    }

    #[test]
    fn test_blank_line_separated() {
        let tokens = transform(":::warning\n\nFirst\n\nSecond\n\n:::\n");
        assert_eq!(container_tokens(&tokens), vec!["open warning ", "close warning"]);
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_nested_depth_two() {
        let tokens = transform(":::tip\n:::warning\nInner\n:::\n:::");
        assert_eq!(
            container_tokens(&tokens),
            vec!["open tip ", "open warning ", "close warning", "close tip"]
        );
    }

    #[test]
    fn test_longer_fence_encloses_shorter() {
        let tokens = transform("::::danger\n:::info\nA\n:::\nB\n::::");
        assert_eq!(
            container_tokens(&tokens),
            vec!["open danger ", "open info ", "close info", "close danger"]
        );
    }

    #[test]
    fn test_short_closer_does_not_close_long_opener() {
        let tokens = transform("::::tip\nBody\n:::");
        assert!(container_tokens(&tokens).is_empty());
        assert_eq!(tokens[1].content(), "::::tip\nBody\n:::");
    }

    #[test]
    fn test_unclosed_left_literal() {
        let tokens = transform(":::tip\nBody");
        assert!(container_tokens(&tokens).is_empty());
        assert_eq!(tokens[1].content(), ":::tip\nBody");
    }

    #[test]
    fn test_stray_closer_left_literal() {
        let tokens = transform("Body\n:::");
        assert!(container_tokens(&tokens).is_empty());
    }

    #[test]
    fn test_details_info_kept() {
        let tokens = transform(":::details Custom Title\nHidden\n:::");
        assert_eq!(
            container_tokens(&tokens),
            vec!["open details Custom Title", "close details"]
        );
        assert_eq!(tokens[0].info(), "Custom Title");
    }

    #[test]
    fn test_different_blocks_do_not_pair() {
        let tokens = transform("> :::tip\n\n:::\n");
        assert!(container_tokens(&tokens).is_empty());
    }

    #[test]
    fn test_inside_blockquote() {
        let tokens = transform("> :::tip\n> quoted\n> :::\n");
        assert_eq!(container_tokens(&tokens), vec!["open tip ", "close tip"]);
    }

    #[test]
    fn test_code_fence_body_not_scanned() {
        let tokens = transform("```\n:::tip\n```\n\n:::");
        assert!(container_tokens(&tokens).is_empty());
    }

    #[test]
    fn test_marker_with_markup_is_literal() {
        let tokens = transform(":::tip *x*\nBody\n:::");
        assert!(container_tokens(&tokens).is_empty());
    }

    #[test]
    fn test_isolate_fences_around_blocks() {
        assert_eq!(
            isolate_fences(":::tip\n- a\n- b\n:::"),
            "\n:::tip\n\n- a\n- b\n\n:::\n\n"
        );
        assert_eq!(
            isolate_fences("intro\n  :::warning\n  > quoted\n  :::\nafter\n"),
            "intro\n\n  :::warning\n\n  > quoted\n\n  :::\n\nafter\n"
        );
    }

    #[test]
    fn test_isolate_fences_unpaired_is_borrowed() {
        assert!(matches!(isolate_fences(":::tip\nBody"), Cow::Borrowed(_)));
        assert!(matches!(isolate_fences("::::tip\nBody\n:::"), Cow::Borrowed(_)));
        assert!(matches!(isolate_fences("no fences"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_isolate_fences_skips_code() {
        let source = "```md\n:::tip\n```\n~~~~\n:::\n~~~\nstill code\n~~~~\n:::\n";
        assert!(matches!(isolate_fences(source), Cow::Borrowed(_)));
        assert!(matches!(isolate_fences("    :::tip\n    x\n    :::"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_isolate_fences_escapes_info() {
        assert_eq!(
            isolate_fences(":::details \"Quoted\" *x*\nA\n:::\r\n"),
            "\n:::details \\\"Quoted\\\" \\*x\\*\n\nA\n\n:::\n\n"
        );
    }

    #[test]
    fn test_isolated_info_is_raw() {
        let source = isolate_fences(":::details \"Don't\" -- *now*...\nA\n:::");
        let tokens = transform(&source);
        assert_eq!(tokens[0].info(), "\"Don't\" -- *now*...");
    }

    #[test]
    fn test_isolated_list_closes_container() {
        let source = isolate_fences(":::tip\n- a\n- b\n:::");
        let tokens = transform(&source);
        assert_eq!(container_tokens(&tokens), vec!["open tip ", "close tip"]);
        assert_eq!(tokens.first().map(Token::kind), Some("container_open"));
        assert_eq!(tokens.last().map(Token::kind), Some("container_close"));
    }

    #[test]
    fn test_isolated_fence_inside_list_item() {
        let source = isolate_fences("- item\n  :::tip\n  - a\n  :::\n- next");
        let tokens = transform(&source);
        assert_eq!(container_tokens(&tokens), vec!["open tip ", "close tip"]);
        let item_depth = tokens
            .iter()
            .position(|t| t.kind() == "container_open")
            .map(|index| {
                tokens[..index]
                    .iter()
                    .map(|t| t.nesting().delta())
                    .sum::<i32>()
            });
        assert_eq!(item_depth, Some(2));
    }

    #[test]
    fn test_split_lines() {
        let events = vec![
            Event::Text("a".into()),
            Event::SoftBreak,
            Event::Text("b".into()),
            Event::HardBreak,
        ];
        assert_eq!(split_lines(&events), vec![0..1, 2..3, 4..4]);
    }
}
