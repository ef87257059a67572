//! HTML fragments for block-level elements.
//!
//! Free functions append to an output buffer, mirroring how the serializer
//! writes everything else.

use std::fmt::Write;

use crate::alert::CalloutKind;
use crate::container::{ContainerKind, details_title};
use crate::state::{CompletedHeading, escape_html};

/// Opening tag of an alert callout.
#[must_use]
pub fn callout_start(kind: CalloutKind) -> String {
    format!(r#"<div class="custom-block {}">"#, kind.css_class())
}

/// Closing tag of an alert callout.
#[must_use]
pub fn callout_end() -> &'static str {
    "</div>"
}

/// Opening markup of a container. `details` gets its summary from `info`.
pub fn container_start(kind: ContainerKind, info: &str, out: &mut String) {
    match kind {
        ContainerKind::Details => {
            write!(
                out,
                r#"<details class="custom-block details"><summary>{}</summary>"#,
                escape_html(details_title(info))
            )
            .unwrap();
        }
        _ => {
            write!(out, r#"<div class="custom-block {}">"#, kind.name()).unwrap();
        }
    }
}

/// Closing markup of a container.
pub fn container_end(kind: ContainerKind, out: &mut String) {
    out.push_str(match kind {
        ContainerKind::Details => "</details>",
        _ => "</div>",
    });
}

/// Plain code block without highlighting.
pub fn code_block(content: &str, out: &mut String) {
    write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
}

pub fn blockquote_start(out: &mut String) {
    out.push_str("<blockquote>");
}

pub fn blockquote_end(out: &mut String) {
    out.push_str("</blockquote>");
}

pub fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape_html(title))
    };
    write!(
        out,
        r#"<img src="{}"{title_attr} alt="{}">"#,
        escape_html(src),
        escape_html(alt)
    )
    .unwrap();
}

/// Opening anchor tag. The title attribute is only written when present.
pub fn link_start(href: &str, title: &str, out: &mut String) {
    if title.is_empty() {
        write!(out, r#"<a href="{}">"#, escape_html(href)).unwrap();
    } else {
        write!(
            out,
            r#"<a href="{}" title="{}">"#,
            escape_html(href),
            escape_html(title)
        )
        .unwrap();
    }
}

/// Heading with its anchor id, author attributes and a trailing permalink.
pub fn heading(heading: &CompletedHeading, out: &mut String) {
    let level = heading.level;
    let id = escape_html(&heading.id);
    write!(out, r#"<h{level} id="{id}""#).unwrap();
    if !heading.classes.is_empty() {
        write!(out, r#" class="{}""#, escape_html(&heading.classes.join(" "))).unwrap();
    }
    for (name, value) in &heading.attrs {
        match value {
            Some(value) => {
                write!(out, r#" {}="{}""#, escape_html(name), escape_html(value)).unwrap();
            }
            None => write!(out, " {}", escape_html(name)).unwrap(),
        }
    }
    write!(
        out,
        r##">{} <a class="header-anchor" href="#{id}" aria-hidden="true">#</a></h{level}>"##,
        heading.html.trim()
    )
    .unwrap();
}

pub fn task_list_marker(checked: bool, out: &mut String) {
    if checked {
        out.push_str(r#"<input type="checkbox" class="task-list-item-checkbox" checked disabled>"#);
    } else {
        out.push_str(r#"<input type="checkbox" class="task-list-item-checkbox" disabled>"#);
    }
}

pub fn hard_break(out: &mut String) {
    out.push_str("<br>");
}

pub fn horizontal_rule(out: &mut String) {
    out.push_str("<hr>");
}
