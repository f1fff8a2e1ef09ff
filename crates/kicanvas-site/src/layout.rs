//! Page layout applied around rendered document bodies.

use std::sync::Arc;

use kicanvas_embed::{EmbedSettings, SchematicFunction};
use minijinja::value::Value;
use minijinja::{Environment, context};

use crate::document::Document;

const LAYOUT_NAME: &str = "page.html";

/// Layout used when none is configured.
pub const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ page.title }}</title>
</head>
<body>
<article>
{{ content }}
</article>
</body>
</html>
"#;

/// Page layout backed by a template environment.
///
/// The layout sees `page` (`title`, `url`, `source_path`, `status`) and the
/// rendered `content`, and may call `kicad_schematic` itself.
pub struct PageLayout {
    env: Environment<'static>,
    source: String,
}

impl PageLayout {
    /// Create the default layout.
    pub fn new(settings: Arc<EmbedSettings>) -> Result<Self, minijinja::Error> {
        Self::from_source(settings, DEFAULT_LAYOUT.to_owned())
    }

    /// Create a layout from template source.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not parse.
    pub fn from_source(
        settings: Arc<EmbedSettings>,
        source: String,
    ) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        SchematicFunction::new(settings).register(&mut env);

        let layout = Self { env, source };
        layout.env.template_from_named_str(LAYOUT_NAME, &layout.source)?;
        Ok(layout)
    }

    /// Render a full page.
    pub fn render(&self, doc: &Document, content: &str) -> Result<String, minijinja::Error> {
        let template = self.env.template_from_named_str(LAYOUT_NAME, &self.source)?;
        template.render(context! {
            page => context! {
                title => &doc.title,
                url => &doc.url,
                source_path => doc.source_path.display().to_string(),
                status => doc.status.to_string(),
            },
            content => Value::from_safe_string(content.to_owned()),
        })
    }
}
