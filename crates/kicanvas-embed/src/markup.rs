//! Canonical `<kicanvas-embed>` markup.
//!
//! Textual grammars omit empty attributes. The template function cannot tell
//! "absent" from "empty", so it substitutes visible defaults instead.

use std::fmt::Write;

use crate::reference::ResolvedEmbed;

/// Element name understood by the KiCanvas viewer.
pub const EMBED_TAG: &str = "kicanvas-embed";

/// Render an embed element, emitting `controls` and `style` only when non-empty.
///
/// # Example
///
/// ```
/// use kicanvas_embed::{ResolvedEmbed, render_embed};
///
/// let embed = ResolvedEmbed { url: "/amp.kicad_sch".into(), ..Default::default() };
/// assert_eq!(
///     render_embed(&embed),
///     r#"<kicanvas-embed src="/amp.kicad_sch"></kicanvas-embed>"#
/// );
/// ```
#[must_use]
pub fn render_embed(embed: &ResolvedEmbed) -> String {
    let controls = Some(embed.controls.as_str()).filter(|c| !c.is_empty());
    let style = Some(embed.style.as_str()).filter(|s| !s.is_empty());
    build_element(&embed.url, controls, style)
}

/// Render an embed element that always carries `controls` and `style`,
/// falling back to the given defaults for empty values.
#[must_use]
pub fn render_embed_with_defaults(
    embed: &ResolvedEmbed,
    default_style: &str,
    default_controls: &str,
) -> String {
    let controls = if embed.controls.is_empty() {
        default_controls
    } else {
        &embed.controls
    };
    let style = if embed.style.is_empty() {
        default_style
    } else {
        &embed.style
    };
    build_element(&embed.url, Some(controls), Some(style))
}

fn build_element(src: &str, controls: Option<&str>, style: Option<&str>) -> String {
    let mut html = String::with_capacity(64 + src.len());
    let _ = write!(html, r#"<{EMBED_TAG} src="{}""#, escape_attr(src));
    if let Some(controls) = controls {
        let _ = write!(html, r#" controls="{}""#, escape_attr(controls));
    }
    if let Some(style) = style {
        let _ = write!(html, r#" style="{}""#, escape_attr(style));
    }
    let _ = write!(html, "></{EMBED_TAG}>");
    html
}

/// Escape a value for use inside a double-quoted HTML attribute.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn embed(url: &str, style: &str, controls: &str) -> ResolvedEmbed {
        ResolvedEmbed {
            url: url.to_owned(),
            style: style.to_owned(),
            controls: controls.to_owned(),
        }
    }

    #[test]
    fn test_src_only() {
        assert_eq!(
            render_embed(&embed("/a.kicad_sch", "", "")),
            r#"<kicanvas-embed src="/a.kicad_sch"></kicanvas-embed>"#
        );
    }

    #[test]
    fn test_all_attributes_in_canonical_order() {
        assert_eq!(
            render_embed(&embed("/a.kicad_sch", "width: 800px;", "full")),
            r#"<kicanvas-embed src="/a.kicad_sch" controls="full" style="width: 800px;"></kicanvas-embed>"#
        );
    }

    #[test]
    fn test_defaults_substituted_for_empty_values() {
        assert_eq!(
            render_embed_with_defaults(
                &embed("/t.kicad_sch", "", ""),
                "width: 100%; height: 600px;",
                "all"
            ),
            r#"<kicanvas-embed src="/t.kicad_sch" controls="all" style="width: 100%; height: 600px;"></kicanvas-embed>"#
        );
    }

    #[test]
    fn test_defaults_do_not_override_values() {
        let html = render_embed_with_defaults(&embed("/t", "width: 1px;", "none"), "x", "y");
        assert!(html.contains(r#"controls="none""#));
        assert!(html.contains(r#"style="width: 1px;""#));
    }

    #[test]
    fn test_attribute_values_escaped() {
        let html = render_embed(&embed("/a&b.kicad_sch", r#"font-family: "Arial""#, ""));
        assert!(html.contains(r#"src="/a&amp;b.kicad_sch""#));
        assert!(html.contains(r#"style="font-family: &quot;Arial&quot;""#));
    }

    #[test]
    fn test_unicode_passthrough() {
        let html = render_embed(&embed("/amplificateur_été.kicad_sch", "", ""));
        assert!(html.contains("été"));
    }
}
