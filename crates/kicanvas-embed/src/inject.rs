//! Idempotent insertion of the KiCanvas loader script into rendered pages.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::detect::contains_embed;
use crate::markup::EMBED_TAG;
use crate::settings::EmbedSettings;

static HEAD_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head>").unwrap());

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").unwrap());

/// Publication status of a document.
///
/// Only [`PublishStatus::Published`] documents receive the loader script
/// and are written to the output tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum PublishStatus {
    #[default]
    Published,
    Draft,
    Hidden,
}

impl PublishStatus {
    /// Whether documents with this status are published.
    #[must_use]
    pub fn is_published(self) -> bool {
        self == Self::Published
    }
}

impl FromStr for PublishStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" => Ok(Self::Published),
            "draft" => Ok(Self::Draft),
            "hidden" => Ok(Self::Hidden),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

impl TryFrom<String> for PublishStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Published => "published",
            Self::Draft => "draft",
            Self::Hidden => "hidden",
        })
    }
}

/// Status string that is not one of `published`, `draft` or `hidden`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown publish status: {0:?}")]
pub struct UnknownStatus(pub String);

/// Loader script selected from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderScript {
    url: String,
}

impl LoaderScript {
    /// Loader pointing at an explicit URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Pick the CDN or local loader according to `settings.use_cdn`.
    #[must_use]
    pub fn from_settings(settings: &EmbedSettings) -> Self {
        Self::new(settings.loader_url())
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The `<script>` element, newline-terminated.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("<script type=\"module\" src=\"{}\"></script>\n", self.url)
    }
}

/// Where the loader script was placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectPosition {
    /// Immediately before the first `</head>`.
    BeforeHeadClose,
    /// Immediately after the first `<body…>` tag.
    AfterBodyOpen,
    /// At the very start of the document.
    Prepended,
}

/// Result of running the injection guard for one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectOutcome {
    /// The document source contains no embed syntax.
    NoEmbed,
    /// The document is a draft or hidden.
    NotPublished,
    /// The guard already ran for this document.
    AlreadyInjected,
    /// The loader URL already appears in the page.
    AlreadyPresent,
    /// The script was inserted.
    Injected(InjectPosition),
}

/// Per-document flags tracked across the generation lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocumentRenderState {
    /// The raw source matched the embed detector.
    pub has_embed: bool,
    /// The injection guard has run for this document.
    pub script_injected: bool,
}

impl DocumentRenderState {
    /// Run the detector over raw source text and record a match.
    ///
    /// Once set, `has_embed` stays set.
    pub fn observe_source(&mut self, source: &str) -> bool {
        if !self.has_embed && contains_embed(source) {
            self.has_embed = true;
        }
        self.has_embed
    }

    /// Record an embed element in rendered output.
    ///
    /// Catches embeds produced by syntax the source detector does not know,
    /// such as a template call with whitespace control (`{{- … }}`).
    pub fn observe_rendered(&mut self, html: &str) -> bool {
        if !self.has_embed && html.contains(&format!("<{EMBED_TAG}")) {
            self.has_embed = true;
        }
        self.has_embed
    }

    /// Insert the loader script into `html` at most once per document.
    pub fn inject(
        &mut self,
        html: &mut String,
        status: PublishStatus,
        loader: &LoaderScript,
    ) -> InjectOutcome {
        if !self.has_embed {
            return InjectOutcome::NoEmbed;
        }
        if !status.is_published() {
            return InjectOutcome::NotPublished;
        }
        if self.script_injected {
            return InjectOutcome::AlreadyInjected;
        }
        self.script_injected = true;

        if html.contains(loader.url()) {
            return InjectOutcome::AlreadyPresent;
        }

        let position = insert_script(html, &loader.tag());
        tracing::debug!(url = loader.url(), ?position, "Injected loader script");
        InjectOutcome::Injected(position)
    }
}

/// Return `html` with a loader script for `url`, or `None` if `url` already appears.
///
/// # Example
///
/// ```
/// use kicanvas_embed::inject_loader;
///
/// let html = inject_loader("<html><head></head></html>", "/k.js").unwrap();
/// assert_eq!(
///     html,
///     "<html><head><script type=\"module\" src=\"/k.js\"></script>\n</head></html>"
/// );
/// assert!(inject_loader(&html, "/k.js").is_none());
/// ```
#[must_use]
pub fn inject_loader(html: &str, url: &str) -> Option<String> {
    if html.contains(url) {
        return None;
    }
    let mut html = html.to_owned();
    insert_script(&mut html, &LoaderScript::new(url).tag());
    Some(html)
}

fn insert_script(html: &mut String, tag: &str) -> InjectPosition {
    if let Some(m) = HEAD_CLOSE.find(html) {
        html.insert_str(m.start(), tag);
        InjectPosition::BeforeHeadClose
    } else if let Some(m) = BODY_OPEN.find(html) {
        html.insert_str(m.end(), &format!("\n{tag}"));
        InjectPosition::AfterBodyOpen
    } else {
        html.insert_str(0, tag);
        InjectPosition::Prepended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "/static/js/kicanvas.js";

    fn embedded() -> DocumentRenderState {
        DocumentRenderState {
            has_embed: true,
            script_injected: false,
        }
    }

    #[test]
    fn test_inject_before_head_close() {
        let mut html = "<html><HEAD><title>x</title></HEAD><body></body></html>".to_owned();
        let outcome = embedded().inject(&mut html, PublishStatus::Published, &LoaderScript::new(URL));

        assert_eq!(outcome, InjectOutcome::Injected(InjectPosition::BeforeHeadClose));
        assert_eq!(
            html,
            "<html><HEAD><title>x</title><script type=\"module\" src=\"/static/js/kicanvas.js\"></script>\n</HEAD><body></body></html>"
        );
    }

    #[test]
    fn test_inject_after_body_open() {
        let mut html = "<body class=\"post\"><p>hi</p></body>".to_owned();
        let outcome = embedded().inject(&mut html, PublishStatus::Published, &LoaderScript::new(URL));

        assert_eq!(outcome, InjectOutcome::Injected(InjectPosition::AfterBodyOpen));
        assert_eq!(
            html,
            "<body class=\"post\">\n<script type=\"module\" src=\"/static/js/kicanvas.js\"></script>\n<p>hi</p></body>"
        );
    }

    #[test]
    fn test_body_prefix_is_not_body_tag() {
        let mut html = "<bodyguard>x</bodyguard>".to_owned();
        let outcome = embedded().inject(&mut html, PublishStatus::Published, &LoaderScript::new(URL));
        assert_eq!(outcome, InjectOutcome::Injected(InjectPosition::Prepended));
        assert!(html.starts_with("<script"));
    }

    #[test]
    fn test_inject_prepends_fragment() {
        let mut html = "<p>fragment</p>".to_owned();
        let outcome = embedded().inject(&mut html, PublishStatus::Published, &LoaderScript::new(URL));

        assert_eq!(outcome, InjectOutcome::Injected(InjectPosition::Prepended));
        assert_eq!(
            html,
            "<script type=\"module\" src=\"/static/js/kicanvas.js\"></script>\n<p>fragment</p>"
        );
    }

    #[test]
    fn test_inject_twice_single_script() {
        let mut state = embedded();
        let loader = LoaderScript::new(URL);
        let mut html = "<html><head></head><body></body></html>".to_owned();

        state.inject(&mut html, PublishStatus::Published, &loader);
        let outcome = state.inject(&mut html, PublishStatus::Published, &loader);

        assert_eq!(outcome, InjectOutcome::AlreadyInjected);
        assert_eq!(html.matches(URL).count(), 1);
    }

    #[test]
    fn test_fresh_state_respects_existing_script() {
        let loader = LoaderScript::new(URL);
        let mut html = "<html><head></head></html>".to_owned();
        embedded().inject(&mut html, PublishStatus::Published, &loader);

        let outcome = embedded().inject(&mut html, PublishStatus::Published, &loader);
        assert_eq!(outcome, InjectOutcome::AlreadyPresent);
        assert_eq!(html.matches(URL).count(), 1);
    }

    #[test]
    fn test_no_embed_untouched() {
        let mut state = DocumentRenderState::default();
        let mut html = "<html><head></head></html>".to_owned();
        let outcome = state.inject(&mut html, PublishStatus::Published, &LoaderScript::new(URL));

        assert_eq!(outcome, InjectOutcome::NoEmbed);
        assert_eq!(html, "<html><head></head></html>");
        assert!(!state.script_injected);
    }

    #[test]
    fn test_draft_untouched() {
        let mut state = embedded();
        let mut html = "<html><head></head></html>".to_owned();
        let outcome = state.inject(&mut html, PublishStatus::Draft, &LoaderScript::new(URL));

        assert_eq!(outcome, InjectOutcome::NotPublished);
        assert_eq!(html, "<html><head></head></html>");
    }

    #[test]
    fn test_observe_source_sticky() {
        let mut state = DocumentRenderState::default();
        assert!(state.observe_source(".. kicad-schematic:: amp.kicad_sch"));
        assert!(state.observe_source("plain text"));
        assert!(!DocumentRenderState::default().observe_source("plain text"));
    }

    #[test]
    fn test_observe_rendered_element() {
        let mut state = DocumentRenderState::default();
        assert!(!state.observe_rendered("<p>kicanvas-embed is mentioned here</p>"));
        assert!(state.observe_rendered(r#"<kicanvas-embed src="/x.kicad_sch"></kicanvas-embed>"#));
        assert!(state.observe_rendered("plain"));
    }

    #[test]
    fn test_loader_from_settings() {
        let settings = EmbedSettings::default().with_cdn(true);
        let loader = LoaderScript::from_settings(&settings);
        assert_eq!(loader.url(), "https://kicanvas.org/kicanvas/kicanvas.js");
    }

    #[test]
    fn test_publish_status_parse() {
        assert_eq!("Published".parse(), Ok(PublishStatus::Published));
        assert_eq!("DRAFT".parse(), Ok(PublishStatus::Draft));
        assert_eq!(" hidden ".parse(), Ok(PublishStatus::Hidden));
        assert!("archived".parse::<PublishStatus>().is_err());
        assert_eq!(PublishStatus::Draft.to_string(), "draft");
    }

    #[test]
    fn test_publish_status_deserialize() {
        let status: PublishStatus = serde_json::from_str("\"Draft\"").unwrap();
        assert_eq!(status, PublishStatus::Draft);
    }
}
