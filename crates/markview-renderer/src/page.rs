//! Standalone HTML page around a rendered fragment.

use std::fmt::Write;

use crate::copy::COPY_SCRIPT;
use crate::state::{TocEntry, escape_html};
use crate::theme::{Appearance, ResolvedTheme};

/// Styles for callouts, containers and code shells.
const PREVIEW_CSS: &str = r#"
:root { color-scheme: light dark; }
body { margin: 0; font: 16px/1.6 -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif; }
body[data-appearance="light"] { background: #ffffff; color: #1f2328; }
body[data-appearance="dark"] { background: #0d1117; color: #e6edf3; }
.markview { max-width: 860px; margin: 0 auto; padding: 2rem 1.5rem 4rem; }
.markview-toc { font-size: 0.875rem; margin-bottom: 2rem; }
.markview-toc a { text-decoration: none; }
.header-anchor { opacity: 0; margin-left: 0.25rem; text-decoration: none; }
h1:hover .header-anchor, h2:hover .header-anchor, h3:hover .header-anchor,
h4:hover .header-anchor, h5:hover .header-anchor, h6:hover .header-anchor { opacity: 0.6; }
.custom-block { border-left: 4px solid; border-radius: 6px; padding: 0.5rem 1rem; margin: 1rem 0; }
.custom-block.note, .custom-block.info { border-color: #0969da; background: rgba(9, 105, 218, 0.08); }
.custom-block.tip { border-color: #1a7f37; background: rgba(26, 127, 55, 0.08); }
.custom-block.important { border-color: #8250df; background: rgba(130, 80, 223, 0.08); }
.custom-block.warning { border-color: #9a6700; background: rgba(154, 103, 0, 0.08); }
.custom-block.caution, .custom-block.danger { border-color: #cf222e; background: rgba(207, 34, 46, 0.08); }
details.custom-block { border-color: #6e7781; background: rgba(110, 119, 129, 0.08); }
details.custom-block summary { cursor: pointer; font-weight: 600; }
.code-block { border-radius: 8px; overflow: hidden; margin: 1rem 0; border: 1px solid rgba(110, 119, 129, 0.3); }
.code-header { display: flex; align-items: center; gap: 0.75rem; padding: 0.4rem 0.75rem; background: rgba(110, 119, 129, 0.12); font-size: 0.75rem; }
.code-dots { display: inline-flex; gap: 6px; }
.code-dots .dot { width: 10px; height: 10px; border-radius: 50%; background: #ff5f56; }
.code-dots .dot:nth-child(2) { background: #ffbd2e; }
.code-dots .dot:nth-child(3) { background: #27c93f; }
.code-lang { flex: 1; text-transform: lowercase; opacity: 0.7; }
.copy-btn { font: inherit; cursor: pointer; border: 1px solid rgba(110, 119, 129, 0.4); border-radius: 4px; background: transparent; color: inherit; padding: 0.1rem 0.5rem; }
.code-body pre { margin: 0; padding: 0.75rem 0; overflow-x: auto; font: 13px/1.5 ui-monospace, SFMono-Regular, Menlo, monospace; }
.code-body pre > code { display: block; }
.code-body .line { display: inline-block; min-width: 100%; padding: 0 1rem; box-sizing: border-box; }
.code-body .line.highlighted { background: rgba(255, 214, 0, 0.18); }
.code-body pre.line-numbers { counter-reset: none; }
.code-body pre.line-numbers .line::before { content: attr(data-line); display: inline-block; width: 2.5em; margin-right: 1rem; text-align: right; opacity: 0.45; }
.mermaid { margin: 1rem 0; text-align: center; }
"#;

/// Data needed to render a standalone page.
pub struct PageData<'a> {
    pub title: &'a str,
    /// Rendered markdown fragment.
    pub html_content: &'a str,
    pub toc: &'a [TocEntry],
    pub theme: &'a ResolvedTheme,
    pub appearance: Appearance,
}

/// Render a complete HTML5 page.
///
/// The fragment sits inside the `data-markview-root` element that the copy
/// script is bound to.
pub fn render_page(page: &PageData<'_>) -> String {
    let mut html = String::with_capacity(page.html_content.len() + 8192);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(page.title));
    html.push_str("<style>");
    html.push_str(PREVIEW_CSS);
    html.push_str("</style>\n</head>\n");
    let _ = writeln!(
        html,
        "<body data-appearance=\"{}\" data-theme=\"{}\">",
        page.appearance,
        escape_html(page.theme.as_str())
    );

    html.push_str("<main class=\"markview\" data-markview-root>\n");
    render_toc(&mut html, page.toc);
    html.push_str("<article>\n");
    html.push_str(page.html_content);
    html.push_str("\n</article>\n</main>\n");

    html.push_str("<script>\n");
    html.push_str(COPY_SCRIPT);
    html.push_str("\n</script>\n");
    html.push_str("</body>\n</html>\n");
    html
}

/// Table of contents as a nested-by-indent list. Skipped when empty.
fn render_toc(html: &mut String, toc: &[TocEntry]) {
    if toc.is_empty() {
        return;
    }
    let min_level = toc.iter().map(|entry| entry.level).min().unwrap_or(1);

    html.push_str("<nav class=\"markview-toc\">\n<ul>\n");
    for entry in toc {
        let indent = f32::from(entry.level - min_level) * 0.75;
        let _ = writeln!(
            html,
            "<li style=\"margin-left:{indent}rem\"><a href=\"#{}\">{}</a></li>",
            escape_html(&entry.id),
            escape_html(&entry.title),
        );
    }
    html.push_str("</ul>\n</nav>\n");
}
