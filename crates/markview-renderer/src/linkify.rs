//! Bare URL detection in inline text.

use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use regex::Regex;

use crate::pipeline::Transform;
use crate::token::Token;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").unwrap());

/// Characters dropped from the end of a detected URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '*', '_', '~'];

/// Autolinks bare URLs in every inline token.
///
/// Runs after the stages that read marker lines as plain text, so a URL on a
/// `:::details` line cannot hide the marker.
pub struct LinkifyTransform;

impl Transform for LinkifyTransform {
    fn name(&self) -> &'static str {
        "linkify"
    }

    fn apply(&self, tokens: &mut Vec<Token<'_>>) {
        for token in tokens.iter_mut() {
            if let Token::Inline(events) = token {
                linkify(events);
            }
        }
    }
}

/// Turn bare URLs in text events into autolinks.
///
/// Text inside links, images and raw `<a>` elements is left alone. Inline code
/// is a separate event and never scanned.
pub(crate) fn linkify(events: &mut Vec<Event<'_>>) {
    let has_url = events
        .iter()
        .any(|event| matches!(event, Event::Text(text) if URL_RE.is_match(text)));
    if !has_url {
        return;
    }

    let mut out = Vec::with_capacity(events.len() + 3);
    let mut link_depth = 0usize;
    for event in events.drain(..) {
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => link_depth += 1,
            Event::End(TagEnd::Link | TagEnd::Image) => link_depth = link_depth.saturating_sub(1),
            Event::InlineHtml(html) if is_anchor_open(html) => link_depth += 1,
            Event::InlineHtml(html) if is_anchor_close(html) => {
                link_depth = link_depth.saturating_sub(1);
            }
            Event::Text(text) if link_depth == 0 => {
                split_urls(text, &mut out);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    *events = out;
}

fn is_anchor_open(html: &str) -> bool {
    let lower = html.trim_start().to_ascii_lowercase();
    lower.starts_with("<a ") || lower.starts_with("<a>")
}

fn is_anchor_close(html: &str) -> bool {
    html.trim().eq_ignore_ascii_case("</a>")
}

fn split_urls(text: &str, out: &mut Vec<Event<'_>>) {
    let mut last = 0;
    for found in URL_RE.find_iter(text) {
        let url = trim_url(found.as_str());
        if !has_host(url) {
            continue;
        }
        let start = found.start();
        if start > last {
            out.push(owned_text(&text[last..start]));
        }

        let href = if url.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
            format!("http://{url}")
        } else {
            url.to_owned()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(owned_text(url));
        out.push(Event::End(TagEnd::Link));
        last = start + url.len();
    }
    if last < text.len() {
        out.push(owned_text(&text[last..]));
    }
}

fn owned_text<'a>(text: &str) -> Event<'a> {
    Event::Text(CowStr::from(text.to_owned()))
}

/// Strip trailing punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(TRAILING_PUNCTUATION);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(rest) if trimmed.matches('(').count() < trimmed.matches(')').count() => rest,
            _ => trimmed,
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

/// Check that something follows the scheme or `www.` prefix.
fn has_host(url: &str) -> bool {
    let rest = match url.find("://") {
        Some(pos) => &url[pos + 3..],
        None => url.get(4..).unwrap_or_default(),
    };
    !rest.is_empty()
}
