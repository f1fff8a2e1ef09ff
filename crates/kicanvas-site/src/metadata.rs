//! Document metadata via YAML front matter.
//!
//! A document may start with a `---` line, followed by YAML and a closing
//! `---` line. Recognized keys:
//!
//! - `title`: display title (defaults to the file stem)
//! - `status`: `published`, `draft` or `hidden` (case-insensitive)
//! - `url`: site-relative URL overriding the path-derived one
//!
//! Unknown keys are ignored.

use kicanvas_embed::PublishStatus;
use serde::Deserialize;

/// Metadata parsed from front matter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    /// Custom document title.
    #[serde(default)]
    pub title: Option<String>,

    /// Publication status.
    #[serde(default)]
    pub status: PublishStatus,

    /// URL override.
    #[serde(default)]
    pub url: Option<String>,
}

impl FrontMatter {
    /// Parse metadata from YAML content.
    ///
    /// Empty content returns a default instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or `status` is unknown.
    pub fn from_yaml(content: &str) -> Result<Self, MetadataError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(trimmed)
            .map_err(|e| MetadataError::Parse(format!("Invalid YAML: {e}")))
    }
}

/// Error type for metadata operations.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// YAML parsing error.
    #[error("{0}")]
    Parse(String),
}

/// Split a document into its front matter and body.
///
/// Returns `(None, text)` when the document has no complete front matter block.
#[must_use]
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    (None, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_empty_yaml() {
        let meta = FrontMatter::from_yaml("  \n").unwrap();
        assert_eq!(meta, FrontMatter::default());
        assert_eq!(meta.status, PublishStatus::Published);
    }

    #[test]
    fn test_parse_all_fields() {
        let yaml = r#"
title: "Amplifier notes"
status: Draft
url: hardware/amp/
tags: [ignored]
"#;
        let meta = FrontMatter::from_yaml(yaml).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Amplifier notes"));
        assert_eq!(meta.status, PublishStatus::Draft);
        assert_eq!(meta.url.as_deref(), Some("hardware/amp/"));
    }

    #[test]
    fn test_parse_unknown_status() {
        let err = FrontMatter::from_yaml("status: archived").unwrap_err();
        assert!(err.to_string().contains("archived"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(FrontMatter::from_yaml("title: [invalid yaml").is_err());
    }

    #[test]
    fn test_split_front_matter() {
        let (yaml, body) = split_front_matter("---\ntitle: A\n---\n# Heading\n");
        assert_eq!(yaml, Some("title: A\n"));
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn test_split_without_front_matter() {
        let text = "# Heading\n---\n";
        assert_eq!(split_front_matter(text), (None, text));
    }

    #[test]
    fn test_split_unclosed_front_matter() {
        let text = "---\ntitle: A\n# Heading\n";
        assert_eq!(split_front_matter(text), (None, text));
    }

    #[test]
    fn test_split_crlf() {
        let (yaml, body) = split_front_matter("---\r\nstatus: hidden\r\n---\r\nBody");
        assert_eq!(yaml, Some("status: hidden\r\n"));
        assert_eq!(body, "Body");
    }
}
