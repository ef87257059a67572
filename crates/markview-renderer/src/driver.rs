//! Render entry point: tokenize, transform, serialize.

use std::sync::Arc;

use crate::code_block::MermaidProcessor;
use crate::container::isolate_fences;
use crate::fence::FenceRenderer;
use crate::highlight::Highlighter;
use crate::linkify::LinkifyTransform;
use crate::pipeline::Pipeline;
use crate::renderer::{HtmlRenderer, RenderOutput};
use crate::theme::{PreferenceSubscription, ResolvedTheme, ThemeResolver};
use crate::token::{TokenizerOptions, tokenize};

/// Rendering switches.
#[derive(Clone, Copy, Debug)]
pub struct MarkviewOptions {
    /// Extract the first H1 as the document title.
    pub extract_title: bool,
    /// Turn bare URLs into links.
    pub linkify: bool,
    /// Smart quotes, dashes and ellipsis.
    pub typographer: bool,
}

impl Default for MarkviewOptions {
    fn default() -> Self {
        Self {
            extract_title: false,
            linkify: true,
            typographer: true,
        }
    }
}

/// Markdown to HTML preview renderer.
///
/// Holds no per-render state: every call builds its own serializer, so a
/// shared `Markview` can render from several threads at once.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use markview_renderer::{
///     Appearance, FixedPreference, Markview, SyntectHighlighter, ThemeMode, ThemeResolver,
/// };
///
/// let resolver = ThemeResolver::new(ThemeMode::Auto, Arc::new(FixedPreference(Appearance::Dark)));
/// let markview = Markview::new(Arc::new(SyntectHighlighter::new()), resolver);
///
/// let html = markview.render("[!TIP] hello");
/// assert_eq!(html, r#"<div class="custom-block tip">hello</div>"#);
/// ```
pub struct Markview {
    highlighter: Arc<dyn Highlighter>,
    theme: ThemeResolver,
    pipeline: Pipeline,
    options: MarkviewOptions,
}

impl Markview {
    pub fn new(highlighter: Arc<dyn Highlighter>, theme: ThemeResolver) -> Self {
        let options = MarkviewOptions::default();
        Self {
            highlighter,
            theme,
            pipeline: pipeline_for(options),
            options,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MarkviewOptions) -> Self {
        self.pipeline = pipeline_for(options);
        self.options = options;
        self
    }

    /// Names of the transform stages, in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    pub fn options(&self) -> MarkviewOptions {
        self.options
    }

    pub fn theme_resolver(&self) -> &ThemeResolver {
        &self.theme
    }

    pub fn highlighter(&self) -> &dyn Highlighter {
        self.highlighter.as_ref()
    }

    /// Render `source` to an HTML fragment.
    pub fn render(&self, source: &str) -> String {
        self.render_document(source).html
    }

    /// Render `source` with the theme resolved at the start of the call.
    pub fn render_document(&self, source: &str) -> RenderOutput {
        self.render_with_theme(source, self.theme.resolve())
    }

    /// Render `source` with an explicit theme, bypassing the resolver.
    pub fn render_with_theme(&self, source: &str, theme: ResolvedTheme) -> RenderOutput {
        let options = TokenizerOptions {
            typographer: self.options.typographer,
        };
        let source = isolate_fences(source);
        let mut tokens = tokenize(&source, options);
        self.pipeline.run(&mut tokens);

        let fences = FenceRenderer::new(self.highlighter.as_ref(), theme)
            .with_processor(MermaidProcessor::new());
        let mut renderer = HtmlRenderer::new(fences);
        if self.options.extract_title {
            renderer = renderer.with_title_extraction();
        }
        let output = renderer.render(&tokens);

        tracing::debug!(
            tokens = tokens.len(),
            code_blocks = output.code_blocks.len(),
            warnings = output.warnings.len(),
            "Rendered markdown"
        );
        output
    }

    /// Call `callback` with the new theme whenever the preference signal
    /// changes. Returns `None` when a named theme is configured.
    pub fn subscribe_theme_changes(
        &self,
        callback: impl Fn(ResolvedTheme) + Send + Sync + 'static,
    ) -> Option<PreferenceSubscription> {
        self.theme.subscribe(callback)
    }
}

/// Standard stages, with autolinking last when enabled.
fn pipeline_for(options: MarkviewOptions) -> Pipeline {
    let pipeline = Pipeline::standard();
    if options.linkify {
        pipeline.with_stage(LinkifyTransform)
    } else {
        pipeline
    }
}
