//! Layered resolution of schematic filenames into publishable URLs.
//!
//! Strategies run in a fixed order and the first one that confirms a file on
//! disk wins:
//!
//! 1. Absolute paths and URLs are used verbatim.
//! 2. The document's own output directory, or its source directory when the
//!    file has not been copied to output yet.
//! 3. The document's source directory, addressed relative to the content root.
//! 4. The configured schematics directory under the content root.
//! 5. The filename unchanged.

use std::path::Path;

use crate::settings::{DocumentFacts, EmbedSettings};

/// Facts needed to resolve one filename.
///
/// Built per call from [`EmbedSettings`] and [`DocumentFacts`]; borrowed,
/// never mutated.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionContext<'a> {
    /// Root of the authored source tree.
    pub content_root: &'a Path,
    /// Root of the generated output tree.
    pub output_root: &'a Path,
    /// Absolute path of the document being processed.
    pub document_source_path: Option<&'a Path>,
    /// Document URL without leading or trailing slashes.
    pub document_url: Option<&'a str>,
    /// Fallback schematics directory, relative to `content_root`.
    pub schematics_path: Option<&'a str>,
}

impl<'a> ResolutionContext<'a> {
    /// Combine process-wide settings with per-document facts.
    #[must_use]
    pub fn new(settings: &'a EmbedSettings, facts: &'a DocumentFacts) -> Self {
        Self {
            content_root: &settings.content_root,
            output_root: &settings.output_root,
            document_source_path: facts.source_path.as_deref(),
            document_url: facts.url.as_deref().and_then(normalize_url),
            schematics_path: settings
                .schematics_path
                .as_deref()
                .map(|p| p.trim_matches('/'))
                .filter(|p| !p.is_empty()),
        }
    }
}

/// Which strategy produced a URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// The filename was already absolute.
    Verbatim,
    /// Found in the document's output directory.
    DocumentOutput,
    /// Found next to the document source; will be copied to its output directory.
    DocumentSource,
    /// Found under the content root.
    ContentTree,
    /// Found in the configured schematics directory.
    SchematicsDir,
    /// Nothing confirmed; filename returned unchanged.
    PassThrough,
}

/// Outcome of resolving one filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Final URL.
    pub url: String,
    /// Strategy that produced `url`.
    pub strategy: Strategy,
}

impl Resolution {
    fn new(url: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            url: url.into(),
            strategy,
        }
    }

    /// Whether any filesystem strategy confirmed the file.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        !matches!(self.strategy, Strategy::PassThrough)
    }
}

/// Resolve `filename` to a URL.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use kicanvas_embed::{ResolutionContext, resolve};
///
/// let ctx = ResolutionContext {
///     content_root: Path::new("content"),
///     output_root: Path::new("output"),
///     document_source_path: None,
///     document_url: None,
///     schematics_path: None,
/// };
///
/// assert_eq!(resolve("/files/amp.kicad_sch", &ctx), "/files/amp.kicad_sch");
/// assert_eq!(resolve("missing.kicad_sch", &ctx), "missing.kicad_sch");
/// ```
#[must_use]
pub fn resolve(filename: &str, ctx: &ResolutionContext<'_>) -> String {
    resolve_with_strategy(filename, ctx).url
}

/// Resolve `filename` and report which strategy matched.
#[must_use]
pub fn resolve_with_strategy(filename: &str, ctx: &ResolutionContext<'_>) -> Resolution {
    let resolution = probe(filename, ctx);
    tracing::debug!(
        filename,
        url = %resolution.url,
        strategy = ?resolution.strategy,
        "Resolved schematic reference"
    );
    resolution
}

fn probe(filename: &str, ctx: &ResolutionContext<'_>) -> Resolution {
    if filename.is_empty() {
        return Resolution::new(filename, Strategy::PassThrough);
    }

    if is_absolute_reference(filename) {
        return Resolution::new(filename, Strategy::Verbatim);
    }

    if let (Some(url), Some(source)) = (ctx.document_url, ctx.document_source_path) {
        if ctx.output_root.join(url).join(filename).is_file() {
            return Resolution::new(format!("/{url}/{filename}"), Strategy::DocumentOutput);
        }
        if let Some(dir) = source.parent()
            && dir.join(filename).is_file()
        {
            return Resolution::new(format!("/{url}/{filename}"), Strategy::DocumentSource);
        }
    }

    if let Some(source) = ctx.document_source_path
        && let Some(url) = content_relative_url(source, filename, ctx.content_root)
    {
        return Resolution::new(url, Strategy::ContentTree);
    }

    if let Some(dir) = ctx.schematics_path
        && ctx.content_root.join(dir).join(filename).is_file()
    {
        return Resolution::new(format!("/{dir}/{filename}"), Strategy::SchematicsDir);
    }

    Resolution::new(filename, Strategy::PassThrough)
}

/// URL of a file next to `source`, if it lies inside `content_root`.
fn content_relative_url(source: &Path, filename: &str, content_root: &Path) -> Option<String> {
    let candidate = source.parent()?.join(filename);
    if !candidate.is_file() {
        return None;
    }

    let canonical = candidate.canonicalize().ok()?;
    let root = content_root.canonicalize().ok()?;
    let Ok(relative) = canonical.strip_prefix(&root) else {
        tracing::debug!(
            path = %canonical.display(),
            "Schematic lies outside the content root, skipping"
        );
        return None;
    };

    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(format!("/{}", segments.join("/")))
}

/// Site-relative URL without surrounding slashes; `None` for the site root.
fn normalize_url(url: &str) -> Option<&str> {
    Some(url.trim_matches('/')).filter(|u| !u.is_empty())
}

fn is_absolute_reference(filename: &str) -> bool {
    filename.starts_with('/') || has_url_scheme(filename)
}

/// Check for a `scheme://` prefix (RFC 3986 scheme characters).
fn has_url_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Temporary site with `content/` and `output/` roots.
    struct Site {
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            fs::create_dir_all(root.join("content")).unwrap();
            fs::create_dir_all(root.join("output")).unwrap();
            Self { _dir: dir, root }
        }

        fn touch(&self, relative: &str) -> PathBuf {
            let path = self.root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "(kicad_sch)").unwrap();
            path
        }

        fn settings(&self) -> EmbedSettings {
            EmbedSettings::new(self.root.join("content"), self.root.join("output"))
        }

        fn post(&self) -> DocumentFacts {
            DocumentFacts::new(
                self.root.join("content/blog/post.md"),
                "blog/2025/post/",
            )
        }
    }

    #[test]
    fn test_absolute_path_verbatim() {
        let site = Site::new();
        let settings = site.settings();
        let facts = site.post();
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("/absolute/amp.kicad_sch", &ctx);
        assert_eq!(resolution.url, "/absolute/amp.kicad_sch");
        assert_eq!(resolution.strategy, Strategy::Verbatim);
    }

    #[test]
    fn test_url_verbatim() {
        let site = Site::new();
        let settings = site.settings();
        let facts = DocumentFacts::default();
        let ctx = ResolutionContext::new(&settings, &facts);

        assert_eq!(
            resolve("https://example.com/amp.kicad_sch", &ctx),
            "https://example.com/amp.kicad_sch"
        );
    }

    #[test]
    fn test_output_directory_wins() {
        let site = Site::new();
        site.touch("output/blog/2025/post/amp.kicad_sch");
        site.touch("content/blog/amp.kicad_sch");
        site.touch("content/schematics/amp.kicad_sch");
        let settings = site.settings().with_schematics_path("schematics");
        let facts = site.post();
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("amp.kicad_sch", &ctx);
        assert_eq!(resolution.url, "/blog/2025/post/amp.kicad_sch");
        assert_eq!(resolution.strategy, Strategy::DocumentOutput);
    }

    #[test]
    fn test_source_directory_uses_document_url() {
        let site = Site::new();
        site.touch("content/blog/amp.kicad_sch");
        let settings = site.settings();
        let facts = site.post();
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("amp.kicad_sch", &ctx);
        assert_eq!(resolution.url, "/blog/2025/post/amp.kicad_sch");
        assert_eq!(resolution.strategy, Strategy::DocumentSource);
    }

    #[test]
    fn test_content_tree_without_url() {
        let site = Site::new();
        site.touch("content/blog/amp.kicad_sch");
        let settings = site.settings();
        let facts = DocumentFacts {
            source_path: Some(site.root.join("content/blog/post.md")),
            url: None,
        };
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("amp.kicad_sch", &ctx);
        assert_eq!(resolution.url, "/blog/amp.kicad_sch");
        assert_eq!(resolution.strategy, Strategy::ContentTree);
    }

    #[test]
    fn test_content_tree_nested_relative() {
        let site = Site::new();
        site.touch("content/shared/boards/psu.kicad_sch");
        fs::create_dir_all(site.root.join("content/blog")).unwrap();
        let settings = site.settings();
        let facts = DocumentFacts {
            source_path: Some(site.root.join("content/blog/post.md")),
            url: None,
        };
        let ctx = ResolutionContext::new(&settings, &facts);

        assert_eq!(
            resolve("../shared/boards/psu.kicad_sch", &ctx),
            "/shared/boards/psu.kicad_sch"
        );
    }

    #[test]
    fn test_outside_content_root_falls_through() {
        let site = Site::new();
        site.touch("outside.kicad_sch");
        site.touch("content/schematics/outside.kicad_sch");
        let settings = site.settings().with_schematics_path("schematics");
        let facts = DocumentFacts {
            source_path: Some(site.root.join("content/post.md")),
            url: None,
        };
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("../outside.kicad_sch", &ctx);
        // Escaping candidate is rejected; the schematics dir has no such path either.
        assert_eq!(resolution.strategy, Strategy::PassThrough);
        assert_eq!(resolution.url, "../outside.kicad_sch");
    }

    #[test]
    fn test_escape_with_empty_schematics_path() {
        let site = Site::new();
        site.touch("content/outside.kicad_sch");
        let settings = EmbedSettings::new(site.root.join("content/blog"), site.root.join("output"))
            .with_schematics_path("/");
        let facts = DocumentFacts {
            source_path: Some(site.root.join("content/blog/post.md")),
            url: None,
        };
        let ctx = ResolutionContext::new(&settings, &facts);
        assert!(ctx.schematics_path.is_none());
        assert_eq!(
            resolve_with_strategy("../outside.kicad_sch", &ctx).strategy,
            Strategy::PassThrough
        );
    }

    #[test]
    fn test_schematics_dir() {
        let site = Site::new();
        site.touch("content/static/schematics/amp.kicad_sch");
        let settings = site.settings().with_schematics_path("static/schematics/");
        let facts = DocumentFacts::default();
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("amp.kicad_sch", &ctx);
        assert_eq!(resolution.url, "/static/schematics/amp.kicad_sch");
        assert_eq!(resolution.strategy, Strategy::SchematicsDir);
    }

    #[test]
    fn test_pass_through() {
        let site = Site::new();
        let settings = site.settings().with_schematics_path("schematics");
        let facts = site.post();
        let ctx = ResolutionContext::new(&settings, &facts);

        let resolution = resolve_with_strategy("missing.kicad_sch", &ctx);
        assert_eq!(resolution.url, "missing.kicad_sch");
        assert!(!resolution.is_confirmed());
    }

    #[test]
    fn test_directory_is_not_a_match() {
        let site = Site::new();
        fs::create_dir_all(site.root.join("content/blog/amp.kicad_sch")).unwrap();
        let settings = site.settings();
        let facts = site.post();
        let ctx = ResolutionContext::new(&settings, &facts);

        assert_eq!(
            resolve_with_strategy("amp.kicad_sch", &ctx).strategy,
            Strategy::PassThrough
        );
    }

    #[test]
    fn test_url_normalization() {
        let settings = EmbedSettings::default();
        let facts = DocumentFacts::new("/c/post.md", "/blog/post/");
        let ctx = ResolutionContext::new(&settings, &facts);
        assert_eq!(ctx.document_url, Some("blog/post"));

        let facts = DocumentFacts::new("/c/index.md", "/");
        let ctx = ResolutionContext::new(&settings, &facts);
        assert_eq!(ctx.document_url, None);
    }

    #[test]
    fn test_url_scheme_detection() {
        assert!(has_url_scheme("http://example.com/a"));
        assert!(has_url_scheme("git+ssh://host/a"));
        assert!(!has_url_scheme("httpfoo.kicad_sch"));
        assert!(!has_url_scheme("dir/amp.kicad_sch"));
        assert!(!has_url_scheme("1http://x"));
    }
}
