//! Substitution of embed syntax with rendered markup.

use super::{EmbedGrammar, EmbedOutput, Occurrence, RstDirectiveGrammar, TemplateCallGrammar};
use crate::markup::render_embed;
use crate::reference::EmbedReference;
use crate::resolve::{ResolutionContext, Strategy, resolve_with_strategy};
use crate::settings::{DocumentFacts, EmbedSettings};

/// Processor for embed grammars.
///
/// Grammars run in registration order, each over the output of the previous
/// one. Every matched reference is resolved against the document and
/// replaced with a `<kicanvas-embed>` element.
///
/// # Example
///
/// ```
/// use kicanvas_embed::{DocumentFacts, EmbedProcessor, EmbedSettings};
/// use kicanvas_embed::syntax::TemplateCallGrammar;
///
/// let settings = EmbedSettings::default();
/// let mut processor = EmbedProcessor::new(&settings).with_grammar(TemplateCallGrammar);
///
/// let html = processor.process(
///     r#"{{ kicad_schematic("/files/amp.kicad_sch", controls="basic") }}"#,
///     &DocumentFacts::default(),
/// );
/// assert_eq!(
///     html,
///     r#"<kicanvas-embed src="/files/amp.kicad_sch" controls="basic"></kicanvas-embed>"#
/// );
/// ```
pub struct EmbedProcessor<'a> {
    settings: &'a EmbedSettings,
    grammars: Vec<Box<dyn EmbedGrammar>>,
    warnings: Vec<String>,
}

impl<'a> EmbedProcessor<'a> {
    /// Create a processor with no grammars registered.
    #[must_use]
    pub fn new(settings: &'a EmbedSettings) -> Self {
        Self {
            settings,
            grammars: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Register a grammar.
    #[must_use]
    pub fn with_grammar<G: EmbedGrammar + 'static>(mut self, grammar: G) -> Self {
        self.grammars.push(Box::new(grammar));
        self
    }

    /// Register every grammar compiled into this crate.
    #[must_use]
    pub fn with_default_grammars(self) -> Self {
        let processor = self
            .with_grammar(TemplateCallGrammar)
            .with_grammar(RstDirectiveGrammar);
        #[cfg(feature = "liquid")]
        let processor = processor.with_grammar(super::LiquidTagGrammar);
        processor
    }

    /// Replace every embed occurrence in `text`.
    ///
    /// All grammars scan the original text, so markup emitted for one
    /// occurrence is never rescanned. Where occurrences overlap, the one
    /// starting first wins, then the grammar registered first.
    /// Text without a recognized occurrence is returned unchanged.
    pub fn process(&mut self, text: &str, facts: &DocumentFacts) -> String {
        let mut found: Vec<(usize, Occurrence)> = Vec::new();
        for (order, grammar) in self.grammars.iter().enumerate() {
            let occurrences = grammar.scan(text);
            if !occurrences.is_empty() {
                tracing::debug!(
                    grammar = grammar.name(),
                    count = occurrences.len(),
                    "Found embeds"
                );
            }
            found.extend(occurrences.into_iter().map(|occ| (order, occ)));
        }
        if found.is_empty() {
            return text.to_owned();
        }
        found.sort_by_key(|(order, occ)| (occ.span.start, *order));

        let ctx = ResolutionContext::new(self.settings, facts);
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for (order, occurrence) in found {
            if occurrence.span.start < last {
                continue;
            }
            output.push_str(&text[last..occurrence.span.start]);
            match occurrence.output {
                EmbedOutput::Embed(reference) => {
                    let html = render(self.settings, reference, &ctx, &mut self.warnings);
                    output.push_str(&html);
                }
                EmbedOutput::Diagnostic(comment) => {
                    self.warnings.push(format!(
                        "{}: invalid embed syntax {:?}",
                        self.grammars[order].name(),
                        &text[occurrence.span.clone()]
                    ));
                    output.push_str(&comment);
                }
            }
            last = occurrence.span.end;
        }
        output.push_str(&text[last..]);
        output
    }

    /// Warnings collected so far: malformed tags and unresolved schematics.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Resolve and render one reference, falling back to the static schematics URL.
fn render(
    settings: &EmbedSettings,
    reference: EmbedReference,
    ctx: &ResolutionContext<'_>,
    warnings: &mut Vec<String>,
) -> String {
    let resolution = resolve_with_strategy(&reference.filename, ctx);
    let url = match (resolution.strategy, &settings.static_schematics_url) {
        (Strategy::PassThrough, Some(base)) => {
            warnings.push(format!(
                "schematic {:?} not found, using {base}",
                reference.filename
            ));
            format!("{}/{}", base.trim_end_matches('/'), reference.filename)
        }
        _ => resolution.url,
    };
    render_embed(&reference.into_resolved(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn process(text: &str) -> String {
        let settings = EmbedSettings::default();
        EmbedProcessor::new(&settings)
            .with_default_grammars()
            .process(text, &DocumentFacts::default())
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "This is just normal text about KiCad.\n";
        assert_eq!(process(text), text);
    }

    #[test]
    fn test_filename_only_all_grammars() {
        let expected = r#"<kicanvas-embed src="/static/schematics/amp.kicad_sch"></kicanvas-embed>"#;
        assert_eq!(process(r#"{{ kicad_schematic("amp.kicad_sch") }}"#), expected);
        assert_eq!(process(".. kicad-schematic:: amp.kicad_sch"), expected);
        #[cfg(feature = "liquid")]
        assert_eq!(process("{% kicad_schematic amp.kicad_sch %}"), expected);
    }

    #[test]
    fn test_cross_grammar_consistency() {
        let expected = r#"<kicanvas-embed src="/static/schematics/amp.kicad_sch" controls="basic" style="height: 400px;"></kicanvas-embed>"#;
        assert_eq!(
            process(r#"{{ kicad_schematic("amp.kicad_sch", controls="basic", style="height: 400px;") }}"#),
            expected
        );
        assert_eq!(
            process(".. kicad-schematic:: amp.kicad_sch\n   :style: height: 400px;\n   :controls: basic"),
            expected
        );
        #[cfg(feature = "liquid")]
        assert_eq!(
            process(r#"{% kicad_schematic amp.kicad_sch style="height: 400px;" controls="basic" %}"#),
            expected
        );
    }

    #[test]
    fn test_empty_options_omitted() {
        assert_eq!(
            process(r#"{{ kicad_schematic("amp.kicad_sch", style="", controls="") }}"#),
            r#"<kicanvas-embed src="/static/schematics/amp.kicad_sch"></kicanvas-embed>"#
        );
    }

    #[test]
    fn test_unterminated_verbatim() {
        let text = r#"{{ kicad_schematic("x.kicad_sch""#;
        assert_eq!(process(text), text);
    }

    #[test]
    fn test_surrounding_text_preserved() {
        assert_eq!(
            process("Intro\n\n.. kicad-schematic:: /a.kicad_sch\n\nOutro\n"),
            "Intro\n\n<kicanvas-embed src=\"/a.kicad_sch\"></kicanvas-embed>\n\nOutro\n"
        );
    }

    #[test]
    fn test_no_static_fallback_passes_through() {
        let settings = EmbedSettings::default().with_static_schematics_url(None);
        let mut processor = EmbedProcessor::new(&settings).with_default_grammars();
        let html = processor.process(".. kicad-schematic:: amp.kicad_sch", &DocumentFacts::default());
        assert_eq!(html, r#"<kicanvas-embed src="amp.kicad_sch"></kicanvas-embed>"#);
        assert!(processor.warnings().is_empty());
    }

    #[test]
    fn test_unresolved_reference_warns() {
        let settings = EmbedSettings::default();
        let mut processor = EmbedProcessor::new(&settings).with_default_grammars();
        processor.process(".. kicad-schematic:: amp.kicad_sch", &DocumentFacts::default());
        assert_eq!(processor.warnings().len(), 1);
        assert!(processor.warnings()[0].contains("amp.kicad_sch"));
    }

    #[test]
    fn test_resolved_against_document() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("blog")).unwrap();
        fs::write(content.join("blog/amp.kicad_sch"), "").unwrap();

        let settings = EmbedSettings::new(&content, dir.path().join("output"));
        let facts = DocumentFacts::new(content.join("blog/post.md"), "blog/post/");
        let mut processor = EmbedProcessor::new(&settings).with_default_grammars();

        assert_eq!(
            processor.process(r#"{{ kicad_schematic("amp.kicad_sch") }}"#, &facts),
            r#"<kicanvas-embed src="/blog/post/amp.kicad_sch"></kicanvas-embed>"#
        );
        assert!(processor.warnings().is_empty());
    }

    #[cfg(feature = "liquid")]
    #[test]
    fn test_liquid_diagnostic() {
        let settings = EmbedSettings::default();
        let mut processor = EmbedProcessor::new(&settings).with_default_grammars();
        let html = processor.process("{% kicad_schematic %}", &DocumentFacts::default());
        assert!(html.starts_with("<!-- Invalid kicad_schematic syntax:"));
        assert_eq!(processor.warnings().len(), 1);
    }

    #[cfg(feature = "liquid")]
    #[test]
    fn test_emitted_markup_is_not_rescanned() {
        let html = process(
            r#"{{ kicad_schematic("/a.kicad_sch", style="{% kicad_schematic /b.kicad_sch %}") }}"#,
        );
        assert_eq!(html.matches("<kicanvas-embed").count(), 1);
        assert!(html.contains(r#"style="{% kicad_schematic /b.kicad_sch %}""#));
    }

    #[test]
    fn test_mixed_grammars() {
        let html = process("{{ kicad_schematic(\"/a.kicad_sch\") }}\n.. kicad-schematic:: /b.kicad_sch\n");
        assert_eq!(html.matches("<kicanvas-embed").count(), 2);
    }
}
