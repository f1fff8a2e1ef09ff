//! `{% kicad_schematic file style="…" controls="…" %}`

use std::sync::LazyLock;

use regex::Regex;

use super::args::OptionArgs;
use super::{EmbedGrammar, EmbedOutput, Occurrence};
use crate::reference::EmbedReference;

static OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{%[ \t]*kicad_schematic[ \t]+").unwrap());

/// Liquid tag grammar.
///
/// The markup runs to the first `%}` on the line. A tag with no filename
/// becomes an HTML comment naming the offending markup.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiquidTagGrammar;

impl EmbedGrammar for LiquidTagGrammar {
    fn name(&self) -> &str {
        "liquid-tag"
    }

    fn scan(&self, text: &str) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        let mut consumed = 0;

        for opener in OPENER.find_iter(text) {
            if opener.start() < consumed {
                continue;
            }
            let rest = &text[opener.end()..];
            let line = rest.split('\n').next().unwrap_or_default();
            let Some(close) = line.find("%}") else {
                tracing::debug!(offset = opener.start(), "Unclosed kicad_schematic tag left unchanged");
                continue;
            };

            let markup = line[..close].trim();
            consumed = opener.end() + close + 2;
            let span = opener.start()..consumed;

            let output = match parse_markup(markup) {
                Some(reference) => EmbedOutput::Embed(reference),
                None => EmbedOutput::Diagnostic(format!(
                    "<!-- Invalid kicad_schematic syntax: {} -->",
                    comment_safe(markup)
                )),
            };
            occurrences.push(Occurrence { span, output });
        }

        occurrences
    }
}

fn parse_markup(markup: &str) -> Option<EmbedReference> {
    let (filename, rest) = split_filename(markup)?;
    if filename.is_empty() {
        return None;
    }

    let options = OptionArgs::parse(rest);
    let mut reference = EmbedReference::new(filename);
    if let Some(style) = options.get("style") {
        style.clone_into(&mut reference.style);
    }
    if let Some(controls) = options.get("controls") {
        controls.clone_into(&mut reference.controls);
    }
    Some(reference)
}

/// Split off the first token, stripping its quotes.
fn split_filename(markup: &str) -> Option<(&str, &str)> {
    let first = markup.chars().next()?;
    if matches!(first, '"' | '\'') {
        let body = &markup[1..];
        return Some(match body.find(first) {
            Some(end) => (&body[..end], &body[end + 1..]),
            None => (body, ""),
        });
    }
    let end = markup.find(char::is_whitespace).unwrap_or(markup.len());
    Some((&markup[..end], &markup[end..]))
}

/// Break up `--` so the markup cannot end the comment early.
fn comment_safe(markup: &str) -> String {
    let mut text = markup.to_owned();
    while text.contains("--") {
        text = text.replace("--", "- -");
    }
    text
}
