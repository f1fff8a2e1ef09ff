//! Static site builder.
//!
//! Each document moves through the same lifecycle:
//!
//! 1. initialized: front matter parsed, embed syntax detected in the source
//! 2. rendered: body pre-rendered, embeds substituted, Markdown converted,
//!    layout applied
//! 3. pre-write: loader script injected into published pages with embeds
//! 4. written: published pages saved as `URL/index.html`
//! 5. schematics next to the source copied into the page's output directory,
//!    and content-tree schematics the page embeds published at their URL

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use kicanvas_config::Config;
use kicanvas_embed::{EmbedSettings, InjectOutcome, LoaderScript};

use crate::copy::{copy_referenced, copy_schematics};
use crate::document::{Document, without_cur_dir};
use crate::error::BuildError;
use crate::layout::PageLayout;
use crate::renderer::ContentRenderer;

/// Glob matching documents under the content root.
const DOCUMENT_GLOB: &str = "**/*.md";

/// Summary of a site build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Output paths written, relative to the output root.
    pub pages_written: Vec<PathBuf>,
    /// Documents rendered but not written (draft or hidden).
    pub drafts: usize,
    /// Documents whose source contains embed syntax.
    pub pages_with_embeds: usize,
    /// Pages that received the loader script.
    pub scripts_injected: usize,
    /// Schematic files copied into the output tree.
    pub schematics_copied: usize,
    /// Recoverable problems.
    pub warnings: Vec<String>,
}

/// Build [`EmbedSettings`] from loaded configuration.
#[must_use]
pub fn embed_settings(config: &Config) -> EmbedSettings {
    let content = &config.content_resolved;
    EmbedSettings {
        content_root: content.source_dir.clone(),
        output_root: content.output_dir.clone(),
        schematics_path: content.schematics_path.clone(),
        use_cdn: config.kicanvas.use_cdn,
        local_loader_url: config.kicanvas.local_url.clone(),
        cdn_loader_url: config.kicanvas.cdn_url.clone(),
        static_schematics_url: config.kicanvas.static_schematics_url().map(str::to_owned),
        default_style: config.template.default_style.clone(),
        default_controls: config.template.default_controls.clone(),
    }
}

/// Builds a static site from a content directory.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use kicanvas_embed::EmbedSettings;
/// use kicanvas_site::SiteBuilder;
///
/// let report = SiteBuilder::new(EmbedSettings::new("content", "output")).build()?;
/// println!("{} pages written", report.pages_written.len());
/// # Ok(())
/// # }
/// ```
pub struct SiteBuilder {
    settings: Arc<EmbedSettings>,
    template_content: bool,
    layout: Option<String>,
}

impl SiteBuilder {
    #[must_use]
    pub fn new(settings: EmbedSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            template_content: false,
            layout: None,
        }
    }

    /// Create a builder from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(embed_settings(config))
            .with_template_content(config.content_resolved.template_content)
    }

    /// Pre-render document bodies through the template engine.
    #[must_use]
    pub fn with_template_content(mut self, enabled: bool) -> Self {
        self.template_content = enabled;
        self
    }

    /// Use a custom page layout template.
    #[must_use]
    pub fn with_layout(mut self, source: impl Into<String>) -> Self {
        self.layout = Some(source.into());
        self
    }

    #[must_use]
    pub fn settings(&self) -> &EmbedSettings {
        &self.settings
    }

    /// Build the site.
    ///
    /// # Errors
    ///
    /// Returns an error if documents cannot be discovered, read or parsed,
    /// the layout fails to render, or a page cannot be written.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let renderer = ContentRenderer::new(Arc::clone(&self.settings))
            .with_template_content(self.template_content);
        let layout = match &self.layout {
            Some(source) => PageLayout::from_source(Arc::clone(&self.settings), source.clone())?,
            None => PageLayout::new(Arc::clone(&self.settings))?,
        };
        let loader = LoaderScript::from_settings(&self.settings);
        let output_root = &self.settings.output_root;

        let mut report = BuildReport::default();

        for path in self.discover()? {
            let mut doc = Document::load(&self.settings.content_root, &path)?;

            let rendered = renderer.render(&doc);
            report.warnings.extend(rendered.warnings);
            if doc.state.observe_rendered(&rendered.html) {
                report.pages_with_embeds += 1;
            }
            let mut html = layout.render(&doc, &rendered.html)?;

            let status = doc.status;
            let outcome = doc.state.inject(&mut html, status, &loader);
            if matches!(outcome, InjectOutcome::Injected(_)) {
                report.scripts_injected += 1;
            }

            if status.is_published() {
                let target = output_root.join(&doc.save_as);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, html)?;
                tracing::debug!(path = %target.display(), ?outcome, "Wrote page");
                report.pages_written.push(doc.save_as.clone());
            } else {
                tracing::debug!(path = %path.display(), %status, "Skipping unpublished document");
                report.drafts += 1;
            }

            if let Some(source_dir) = path.parent() {
                let copied = copy_schematics(source_dir, &output_root.join(doc.output_dir()))?;
                report.schematics_copied += copied.copied;
                report.warnings.extend(copied.warnings);
            }
            let published =
                copy_referenced(&rendered.html, &self.settings.content_root, output_root);
            report.schematics_copied += published.copied;
            report.warnings.extend(published.warnings);
        }

        tracing::info!(
            pages = report.pages_written.len(),
            drafts = report.drafts,
            embeds = report.pages_with_embeds,
            schematics = report.schematics_copied,
            warnings = report.warnings.len(),
            "Site build complete"
        );

        Ok(report)
    }

    /// Find documents under the content root, skipping the output tree.
    fn discover(&self) -> Result<Vec<PathBuf>, BuildError> {
        let root = &self.settings.content_root;
        let pattern = format!(
            "{}/{DOCUMENT_GLOB}",
            glob::Pattern::escape(&root.to_string_lossy())
        );

        let output_root = without_cur_dir(&self.settings.output_root);
        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            if without_cur_dir(&path).starts_with(&output_root) || !path.is_file() {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        tracing::debug!(root = %root.display(), count = paths.len(), "Discovered documents");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_embed_settings_from_config() {
        let config = Config::default();
        let settings = embed_settings(&config);
        assert_eq!(settings.default_controls, config.template.default_controls);
        assert_eq!(settings.loader_url(), config.kicanvas.loader_url());
    }

    #[test]
    fn test_discover_skips_output_inside_content() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("site");
        fs::create_dir_all(content.join("blog")).unwrap();
        fs::create_dir_all(content.join("_out/blog")).unwrap();
        fs::write(content.join("index.md"), "").unwrap();
        fs::write(content.join("blog/post.md"), "").unwrap();
        fs::write(content.join("_out/blog/stale.md"), "").unwrap();

        let builder = SiteBuilder::new(EmbedSettings::new(&content, content.join("_out")));
        let found: Vec<_> = builder
            .discover()
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(&content).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![Path::new("blog/post.md").to_path_buf(), Path::new("index.md").to_path_buf()]
        );
    }
}
