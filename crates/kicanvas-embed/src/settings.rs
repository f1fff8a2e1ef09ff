//! Explicit configuration passed into every resolution and rendering call.

use std::path::{Path, PathBuf};

/// Default loader served from the site's own static files.
pub const DEFAULT_LOCAL_LOADER_URL: &str = "/static/js/kicanvas.js";
/// Default loader served by the upstream KiCanvas site.
pub const DEFAULT_CDN_LOADER_URL: &str = "https://kicanvas.org/kicanvas/kicanvas.js";
/// Where textual grammars point references that no strategy could confirm.
pub const DEFAULT_STATIC_SCHEMATICS_URL: &str = "/static/schematics";
/// Style used by the template function when the caller passes none.
pub const DEFAULT_STYLE: &str = "width: 100%; height: 600px;";
/// Controls used by the template function when the caller passes none.
pub const DEFAULT_CONTROLS: &str = "all";

/// Process-wide embed settings.
///
/// Built once from configuration and shared by reference; never mutated
/// during a generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedSettings {
    /// Root of the authored source tree.
    pub content_root: PathBuf,
    /// Root of the generated output tree.
    pub output_root: PathBuf,
    /// Fallback schematics directory, relative to `content_root`.
    pub schematics_path: Option<String>,
    /// Load the viewer from the CDN instead of the local copy.
    pub use_cdn: bool,
    /// Loader URL when `use_cdn` is false.
    pub local_loader_url: String,
    /// Loader URL when `use_cdn` is true.
    pub cdn_loader_url: String,
    /// URL prefix for unconfirmed references in textual grammars.
    pub static_schematics_url: Option<String>,
    /// Template-function default for `style`.
    pub default_style: String,
    /// Template-function default for `controls`.
    pub default_controls: String,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self::new("content", "output")
    }
}

impl EmbedSettings {
    /// Create settings for the given content and output roots with default values.
    #[must_use]
    pub fn new(content_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            output_root: output_root.into(),
            schematics_path: None,
            use_cdn: false,
            local_loader_url: DEFAULT_LOCAL_LOADER_URL.to_owned(),
            cdn_loader_url: DEFAULT_CDN_LOADER_URL.to_owned(),
            static_schematics_url: Some(DEFAULT_STATIC_SCHEMATICS_URL.to_owned()),
            default_style: DEFAULT_STYLE.to_owned(),
            default_controls: DEFAULT_CONTROLS.to_owned(),
        }
    }

    /// Set the fallback schematics directory.
    #[must_use]
    pub fn with_schematics_path(mut self, path: impl Into<String>) -> Self {
        self.schematics_path = Some(path.into());
        self
    }

    /// Select the CDN loader.
    #[must_use]
    pub fn with_cdn(mut self, use_cdn: bool) -> Self {
        self.use_cdn = use_cdn;
        self
    }

    /// Set or clear the static fallback URL for textual grammars.
    #[must_use]
    pub fn with_static_schematics_url(mut self, url: Option<String>) -> Self {
        self.static_schematics_url = url;
        self
    }

    /// URL of the viewer loader script selected by configuration.
    #[must_use]
    pub fn loader_url(&self) -> &str {
        if self.use_cdn {
            &self.cdn_loader_url
        } else {
            &self.local_loader_url
        }
    }
}

/// Per-document facts supplied by the generation pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentFacts {
    /// Absolute path of the document source file.
    pub source_path: Option<PathBuf>,
    /// Site-relative URL the document is published at.
    pub url: Option<String>,
}

impl DocumentFacts {
    /// Facts for a document with a known source path and URL.
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            url: Some(url.into()),
        }
    }

    /// Source path as a borrowed path.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}
