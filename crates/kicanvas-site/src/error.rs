//! Error types for site building.

use std::path::PathBuf;

use crate::metadata::MetadataError;

/// Error returned by the site builder.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid document glob pattern.
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// A path matched by the document glob could not be read.
    #[error("Failed to scan documents: {0}")]
    Glob(#[from] glob::GlobError),
    /// Page layout rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    /// A document path does not lie under the content root.
    #[error("{} is not under content root {}", path.display(), root.display())]
    OutsideContentRoot {
        /// Offending document.
        path: PathBuf,
        /// Configured content root.
        root: PathBuf,
    },
    /// Front matter could not be parsed.
    #[error("Invalid front matter in {}: {source}", path.display())]
    Metadata {
        /// Document with the bad front matter.
        path: PathBuf,
        #[source]
        source: MetadataError,
    },
}
