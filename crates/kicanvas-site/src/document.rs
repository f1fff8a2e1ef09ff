//! Documents and their place in the output tree.

use std::path::{Component, Path, PathBuf};

use kicanvas_embed::{DocumentFacts, DocumentRenderState, PublishStatus};

use crate::error::BuildError;
use crate::metadata::{FrontMatter, split_front_matter};

/// Output filename for every document.
const INDEX_FILENAME: &str = "index.html";

/// One source document moving through the build lifecycle.
#[derive(Debug)]
pub struct Document {
    /// Source path as discovered under the content root.
    pub source_path: PathBuf,
    /// Site-relative URL without a leading slash (`""` for the site root).
    pub url: String,
    /// Output path relative to the output root.
    pub save_as: PathBuf,
    /// Display title.
    pub title: String,
    /// Publication status.
    pub status: PublishStatus,
    /// Source text with the front matter removed.
    pub body: String,
    /// Embed detection and injection flags.
    pub state: DocumentRenderState,
}

impl Document {
    /// Read and parse a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not under `content_root`, cannot be
    /// read, or has invalid front matter.
    pub fn load(content_root: &Path, source_path: &Path) -> Result<Self, BuildError> {
        let relative = relative_to(content_root, source_path).ok_or_else(|| {
            BuildError::OutsideContentRoot {
                path: source_path.to_path_buf(),
                root: content_root.to_path_buf(),
            }
        })?;
        let text = std::fs::read_to_string(source_path)?;
        Self::parse(source_path, &relative, &text)
    }

    /// Parse document text.
    ///
    /// `relative` is the source path relative to the content root and
    /// determines the URL unless the front matter overrides it.
    pub(crate) fn parse(
        source_path: &Path,
        relative: &Path,
        text: &str,
    ) -> Result<Self, BuildError> {
        let (yaml, body) = split_front_matter(text);
        let meta = match yaml {
            Some(yaml) => FrontMatter::from_yaml(yaml).map_err(|source| BuildError::Metadata {
                path: source_path.to_path_buf(),
                source,
            })?,
            None => FrontMatter::default(),
        };

        let url = meta
            .url
            .as_deref()
            .map_or_else(|| url_for(relative), normalize_url);
        let title = meta.title.unwrap_or_else(|| {
            source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut state = DocumentRenderState::default();
        state.observe_source(body);

        Ok(Self {
            source_path: source_path.to_path_buf(),
            save_as: Path::new(&url).join(INDEX_FILENAME),
            url,
            title,
            status: meta.status,
            body: body.to_owned(),
            state,
        })
    }

    /// Facts the embed resolver needs about this document.
    #[must_use]
    pub fn facts(&self) -> DocumentFacts {
        DocumentFacts::new(&self.source_path, &self.url)
    }

    /// Output directory of this document, relative to the output root.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.save_as.parent().unwrap_or(Path::new(""))
    }
}

/// Drop `.` components, so `./content` and `content` compare equal.
pub(crate) fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// `path` relative to `root`, ignoring `.` components on either side.
fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    without_cur_dir(path)
        .strip_prefix(without_cur_dir(root))
        .ok()
        .map(Path::to_path_buf)
}

/// Derive a URL from a path relative to the content root.
///
/// `a/b.md` becomes `a/b/` and `a/index.md` becomes `a/`.
fn url_for(relative: &Path) -> String {
    let mut segments: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(stem) = relative.file_stem().map(|s| s.to_string_lossy())
        && stem != "index"
    {
        segments.push(stem.into_owned());
    }

    segments.into_iter().map(|s| s + "/").collect()
}

/// Strip the leading slash and ensure a trailing one.
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}
