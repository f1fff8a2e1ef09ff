//! Copying schematics next to the pages that embed them.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::BuildError;

/// Glob matching schematic files in a directory.
const SCHEMATIC_GLOB: &str = "*.kicad_sch";

static EMBED_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<kicanvas-embed\s+src="([^"]*)""#).unwrap());

/// Summary of one copy pass.
#[derive(Debug, Default)]
pub struct CopyReport {
    /// Number of files copied.
    pub copied: usize,
    /// Files that could not be copied.
    pub warnings: Vec<String>,
}

/// Copy every `*.kicad_sch` in `source_dir` into `dest_dir`, keeping file names.
///
/// Failures on individual files are logged and reported, not returned.
///
/// # Errors
///
/// Returns an error only if `source_dir` cannot form a valid glob pattern.
pub fn copy_schematics(source_dir: &Path, dest_dir: &Path) -> Result<CopyReport, BuildError> {
    let pattern = format!(
        "{}/{SCHEMATIC_GLOB}",
        glob::Pattern::escape(&source_dir.to_string_lossy())
    );
    let mut report = CopyReport::default();

    for entry in glob::glob(&pattern)? {
        let source = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read schematic entry");
                report.warnings.push(e.to_string());
                continue;
            }
        };
        let Some(name) = source.file_name() else {
            continue;
        };
        if !source.is_file() {
            continue;
        }

        let target = dest_dir.join(name);
        match fs::create_dir_all(dest_dir).and_then(|()| fs::copy(&source, &target)) {
            Ok(_) => {
                tracing::debug!(
                    from = %source.display(),
                    to = %target.display(),
                    "Copied schematic"
                );
                report.copied += 1;
            }
            Err(e) => {
                tracing::warn!(path = %source.display(), error = %e, "Failed to copy schematic");
                report
                    .warnings
                    .push(format!("failed to copy {}: {e}", source.display()));
            }
        }
    }

    Ok(report)
}

/// Publish content-tree files that rendered embeds point at.
///
/// Every site-absolute `src` in `html` that names a file under
/// `content_root` is copied to the same path under `output_root`, unless
/// the output already has it. References resolved into the content tree or
/// the schematics directory are served this way.
pub fn copy_referenced(html: &str, content_root: &Path, output_root: &Path) -> CopyReport {
    let mut report = CopyReport::default();

    for caps in EMBED_SRC.captures_iter(html) {
        let Some(relative) = site_path(&caps[1]) else {
            continue;
        };
        let source = content_root.join(&relative);
        let target = output_root.join(&relative);
        if !source.is_file() || target.exists() {
            continue;
        }

        let copied = match target.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
        .and_then(|()| fs::copy(&source, &target));
        match copied {
            Ok(_) => {
                tracing::debug!(
                    from = %source.display(),
                    to = %target.display(),
                    "Published referenced schematic"
                );
                report.copied += 1;
            }
            Err(e) => {
                tracing::warn!(path = %source.display(), error = %e, "Failed to copy schematic");
                report
                    .warnings
                    .push(format!("failed to copy {}: {e}", source.display()));
            }
        }
    }

    report
}

/// Relative path for a site-absolute `src`, rejecting URLs and `..` segments.
fn site_path(src: &str) -> Option<PathBuf> {
    let src = src
        .replace("&lt;", "<")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    let relative = src.strip_prefix('/').filter(|rest| !rest.starts_with('/'))?;
    let path = Path::new(relative);
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| path.to_path_buf())
        .filter(|p| !p.as_os_str().is_empty())
}
