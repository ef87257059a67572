//! Code fence rendering: processors, highlighting and the UI shell.

use std::fmt::Write;

use crate::code_block::{CodeBlockProcessor, FenceInfo, ProcessResult};
use crate::copy::{COPY_LABEL, CodeBlockSource};
use crate::highlight::{HighlightError, HighlightedCode, Highlighter};
use crate::meta::{FenceMeta, parse_meta};
use crate::state::escape_html;
use crate::theme::ResolvedTheme;

/// Renders fence tokens for a single render call.
///
/// Shell ids (`code-{n}`) count highlighted fences from zero in document order.
pub struct FenceRenderer<'h> {
    highlighter: &'h dyn Highlighter,
    theme: ResolvedTheme,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_blocks: Vec<CodeBlockSource>,
    warnings: Vec<String>,
}

impl<'h> FenceRenderer<'h> {
    pub fn new(highlighter: &'h dyn Highlighter, theme: ResolvedTheme) -> Self {
        Self {
            highlighter,
            theme,
            processors: Vec::new(),
            code_blocks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add a code block processor. Processors run in registration order.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn theme(&self) -> &ResolvedTheme {
        &self.theme
    }

    /// Render one fence with info string `info` and body `source` into `out`.
    pub fn render(&mut self, info: &str, source: &str, out: &mut String) {
        let fence = FenceInfo::parse(info);

        for processor in &mut self.processors {
            if let ProcessResult::Inline(html) = processor.process(&fence, source) {
                out.push_str(&html);
                return;
            }
        }

        let meta = parse_meta(&fence.meta);
        let id = format!("code-{}", self.code_blocks.len());

        write_shell_start(&id, &fence.language, out);
        match self.highlighter.highlight(source, &fence.language, &self.theme) {
            Ok(code) => write_highlighted(&code, &meta, &self.theme, out),
            Err(e) => {
                self.record_failure(&id, &fence.language, &e);
                write_plain(source, out);
            }
        }
        out.push_str("</div></div>");

        self.code_blocks.push(CodeBlockSource {
            id,
            language: fence.language,
            source: source.to_owned(),
        });
    }

    fn record_failure(&mut self, id: &str, language: &str, error: &HighlightError) {
        match error {
            HighlightError::UnsupportedLanguage(_) => {
                tracing::debug!(id, language, "No grammar for language, rendering plain code");
            }
            HighlightError::UnknownTheme(_) | HighlightError::Internal(_) => {
                tracing::warn!(id, language, error = %error, "Highlighting failed, rendering plain code");
                self.warnings.push(format!("{id}: {error}"));
            }
        }
    }

    /// Code block sources and warnings collected so far.
    pub fn finish(self) -> (Vec<CodeBlockSource>, Vec<String>) {
        let mut warnings = self.warnings;
        for processor in &self.processors {
            warnings.extend(processor.warnings().iter().cloned());
        }
        (self.code_blocks, warnings)
    }
}

fn write_shell_start(id: &str, language: &str, out: &mut String) {
    let language = escape_html(language);
    write!(
        out,
        concat!(
            r#"<div class="code-block" data-lang="{lang}">"#,
            r#"<div class="code-header">"#,
            r#"<span class="code-dots"><span class="dot"></span><span class="dot"></span><span class="dot"></span></span>"#,
            r#"<span class="code-lang">{lang}</span>"#,
            r#"<button type="button" class="copy-btn" data-copy-target="{id}">{label}</button>"#,
            r#"</div>"#,
            r#"<div class="code-body" id="{id}">"#,
        ),
        lang = language,
        id = id,
        label = COPY_LABEL,
    )
    .unwrap();
}

fn write_highlighted(code: &HighlightedCode, meta: &FenceMeta, theme: &ResolvedTheme, out: &mut String) {
    let class = if meta.line_numbers {
        "highlight line-numbers"
    } else {
        "highlight"
    };
    write!(
        out,
        r#"<pre class="{class}" data-theme="{}""#,
        escape_html(theme.as_str())
    )
    .unwrap();

    let mut style = String::new();
    if let Some(background) = &code.background {
        write!(style, "background-color:{background};").unwrap();
    }
    if let Some(foreground) = &code.foreground {
        write!(style, "color:{foreground};").unwrap();
    }
    if !style.is_empty() {
        write!(out, r#" style="{style}""#).unwrap();
    }
    out.push_str("><code>");

    for (index, line) in code.lines.iter().enumerate() {
        let number = index + 1;
        if index > 0 {
            out.push('\n');
        }
        let class = if meta.is_highlighted(number) {
            "line highlighted"
        } else {
            "line"
        };
        if meta.line_numbers {
            write!(out, r#"<span class="{class}" data-line="{number}">{line}</span>"#).unwrap();
        } else {
            write!(out, r#"<span class="{class}">{line}</span>"#).unwrap();
        }
    }

    out.push_str("</code></pre>");
}

fn write_plain(source: &str, out: &mut String) {
    write!(out, "<pre><code>{}</code></pre>", escape_html(source)).unwrap();
}
