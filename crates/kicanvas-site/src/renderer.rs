//! Document body rendering: template pre-render, embeds, Markdown.

use std::borrow::Cow;
use std::sync::Arc;

use kicanvas_embed::{EmbedProcessor, EmbedSettings, SchematicFunction};
use minijinja::{Environment, context};
use pulldown_cmark::{Options, Parser};

use crate::document::Document;

/// Result of rendering a document body.
#[derive(Clone, Debug)]
pub struct RenderedContent {
    /// Rendered HTML fragment.
    pub html: String,
    /// Recoverable problems found while rendering.
    pub warnings: Vec<String>,
}

/// Renders document bodies to HTML fragments.
pub struct ContentRenderer {
    settings: Arc<EmbedSettings>,
    env: Environment<'static>,
    template_content: bool,
}

impl ContentRenderer {
    /// Create a renderer with template pre-rendering disabled.
    #[must_use]
    pub fn new(settings: Arc<EmbedSettings>) -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        SchematicFunction::new(Arc::clone(&settings)).register(&mut env);
        Self {
            settings,
            env,
            template_content: false,
        }
    }

    /// Run document bodies through the template engine before embed substitution.
    #[must_use]
    pub fn with_template_content(mut self, enabled: bool) -> Self {
        self.template_content = enabled;
        self
    }

    /// Render a document body to HTML.
    pub fn render(&self, doc: &Document) -> RenderedContent {
        let mut warnings = Vec::new();

        let source = if self.template_content {
            self.pre_render(doc, &mut warnings)
        } else {
            Cow::Borrowed(doc.body.as_str())
        };

        let mut processor = EmbedProcessor::new(&self.settings).with_default_grammars();
        let expanded = processor.process(&source, &doc.facts());
        warnings.extend(
            processor
                .warnings()
                .iter()
                .map(|w| format!("{}: {w}", doc.source_path.display())),
        );

        RenderedContent {
            html: markdown_to_html(&expanded),
            warnings,
        }
    }

    /// Evaluate the body as a template with the document in context.
    ///
    /// Falls back to the raw body when the template engine rejects it.
    fn pre_render<'d>(&self, doc: &'d Document, warnings: &mut Vec<String>) -> Cow<'d, str> {
        let source_path = doc.source_path.display().to_string();
        let ctx = context! {
            __source_path__ => &source_path,
            __article_url__ => &doc.url,
            article => context! {
                title => &doc.title,
                url => &doc.url,
                source_path => &source_path,
            },
        };

        match self.env.render_str(&doc.body, ctx) {
            Ok(rendered) => Cow::Owned(rendered),
            Err(e) => {
                tracing::warn!(
                    path = %doc.source_path.display(),
                    error = %e,
                    "Template pre-render failed, using raw source"
                );
                warnings.push(format!(
                    "{}: template pre-render failed: {e}",
                    doc.source_path.display()
                ));
                Cow::Borrowed(doc.body.as_str())
            }
        }
    }
}

/// Convert Markdown to an HTML fragment.
fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}
