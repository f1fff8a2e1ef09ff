//! The `kicad_schematic(filename, style="", controls="")` template function.
//!
//! Unlike the textual grammars, the function always emits `style` and
//! `controls`, substituting the configured defaults for empty arguments.
//! Document facts come from the render context in this order:
//! `__source_path__` / `__article_url__`, then `article.source_path` /
//! `article.url`, or `page.source_path` / `page.url` when there is no
//! `article`.

use std::path::PathBuf;
use std::sync::Arc;

use minijinja::value::{Kwargs, Value};
use minijinja::{Environment, Error, State};

use crate::markup::render_embed_with_defaults;
use crate::reference::ResolvedEmbed;
use crate::resolve::{ResolutionContext, resolve};
use crate::settings::{DocumentFacts, EmbedSettings};

/// Name the function is registered under.
pub const FUNCTION_NAME: &str = "kicad_schematic";

const SOURCE_PATH_KEY: &str = "__source_path__";
const ARTICLE_URL_KEY: &str = "__article_url__";

/// Read-only view of a template render context.
///
/// Empty strings count as missing.
pub trait TemplateContext {
    /// Whether `key` is defined at the top level.
    fn contains(&self, key: &str) -> bool;

    /// Top-level value as a string.
    fn value(&self, key: &str) -> Option<String>;

    /// Attribute `attr` of the top-level object `object`, as a string.
    fn attr(&self, object: &str, attr: &str) -> Option<String>;
}

impl TemplateContext for State<'_, '_> {
    fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some_and(|v| !v.is_undefined())
    }

    fn value(&self, key: &str) -> Option<String> {
        self.lookup(key).and_then(value_to_string)
    }

    fn attr(&self, object: &str, attr: &str) -> Option<String> {
        self.lookup(object)
            .and_then(|obj| obj.get_attr(attr).ok())
            .and_then(value_to_string)
    }
}

impl TemplateContext for serde_json::Value {
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn value(&self, key: &str) -> Option<String> {
        self.get(key).and_then(json_to_string)
    }

    fn attr(&self, object: &str, attr: &str) -> Option<String> {
        self.get(object)
            .and_then(|obj| obj.get(attr))
            .and_then(json_to_string)
    }
}

fn value_to_string(value: Value) -> Option<String> {
    if value.is_undefined() || value.is_none() {
        return None;
    }
    let s = value.as_str().map_or_else(|| value.to_string(), str::to_owned);
    Some(s).filter(|s| !s.is_empty())
}

fn json_to_string(value: &serde_json::Value) -> Option<String> {
    let s = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(s).filter(|s| !s.is_empty())
}

/// Extract document facts from a render context.
#[must_use]
pub fn document_facts(ctx: &(impl TemplateContext + ?Sized)) -> DocumentFacts {
    let mut source_path = ctx.value(SOURCE_PATH_KEY);
    let mut url = ctx.value(ARTICLE_URL_KEY);

    let object = if ctx.contains("article") {
        Some("article")
    } else if ctx.contains("page") {
        Some("page")
    } else {
        None
    };

    if let Some(object) = object {
        if source_path.is_none() {
            source_path = ctx.attr(object, "source_path");
        }
        if url.is_none() {
            url = ctx.attr(object, "url");
        }
    }

    DocumentFacts {
        source_path: source_path.map(PathBuf::from),
        url,
    }
}

/// The `kicad_schematic` function bound to process-wide settings.
#[derive(Clone, Debug)]
pub struct SchematicFunction {
    settings: Arc<EmbedSettings>,
}

impl SchematicFunction {
    #[must_use]
    pub fn new(settings: Arc<EmbedSettings>) -> Self {
        Self { settings }
    }

    /// Render an embed for `filename` in the given context.
    ///
    /// Empty `style` or `controls` fall back to the configured defaults.
    #[must_use]
    pub fn call(
        &self,
        ctx: &(impl TemplateContext + ?Sized),
        filename: &str,
        style: &str,
        controls: &str,
    ) -> String {
        let facts = document_facts(ctx);
        let resolution_ctx = ResolutionContext::new(&self.settings, &facts);
        let embed = ResolvedEmbed {
            url: resolve(filename, &resolution_ctx),
            style: style.to_owned(),
            controls: controls.to_owned(),
        };
        render_embed_with_defaults(
            &embed,
            &self.settings.default_style,
            &self.settings.default_controls,
        )
    }

    /// Install the function into a template environment.
    ///
    /// `style` and `controls` may be passed positionally or by keyword. The
    /// result is marked safe so it is not auto-escaped.
    pub fn register(self, env: &mut Environment<'_>) {
        env.add_function(
            FUNCTION_NAME,
            move |state: &State,
                  filename: String,
                  style: Option<String>,
                  controls: Option<String>,
                  kwargs: Kwargs|
                  -> Result<Value, Error> {
                let style = match style {
                    Some(style) => style,
                    None => kwargs.get::<Option<String>>("style")?.unwrap_or_default(),
                };
                let controls = match controls {
                    Some(controls) => controls,
                    None => kwargs
                        .get::<Option<String>>("controls")?
                        .unwrap_or_default(),
                };
                kwargs.assert_all_used()?;
                Ok(Value::from_safe_string(
                    self.call(state, &filename, &style, &controls),
                ))
            },
        );
    }
}
