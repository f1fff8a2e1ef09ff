//! Embed reference types shared by all grammars.

/// One occurrence of embed syntax extracted from source text.
///
/// `style` and `controls` are empty when the author omitted them or wrote
/// them with an empty value; the two cases are not distinguished.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbedReference {
    /// Author-supplied filename (relative, absolute-path-like, or bare).
    pub filename: String,
    /// Raw CSS declarations.
    pub style: String,
    /// Control-set identifier passed through to the viewer.
    pub controls: String,
}

impl EmbedReference {
    /// Create a reference with only a filename.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Set the style declarations.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Set the controls identifier.
    #[must_use]
    pub fn with_controls(mut self, controls: impl Into<String>) -> Self {
        self.controls = controls.into();
        self
    }

    /// Pair this reference with its resolved URL.
    #[must_use]
    pub fn into_resolved(self, url: String) -> ResolvedEmbed {
        ResolvedEmbed {
            url,
            style: self.style,
            controls: self.controls,
        }
    }
}

/// A reference whose filename has been resolved to a publishable URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedEmbed {
    /// Site-root-relative or absolute URL.
    pub url: String,
    /// Raw CSS declarations.
    pub style: String,
    /// Control-set identifier.
    pub controls: String,
}
