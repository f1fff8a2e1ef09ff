//! `{{ kicad_schematic("file", style="…", controls="…") }}`

use std::sync::LazyLock;

use regex::Regex;

use super::args::Cursor;
use super::{EmbedGrammar, Occurrence};
use crate::reference::EmbedReference;

static OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\{\{[ \t]*kicad_schematic[ \t]*\(").unwrap());

/// Template-call grammar.
///
/// Options may appear in any order. An unknown option name or an unbalanced
/// call leaves the candidate untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateCallGrammar;

impl EmbedGrammar for TemplateCallGrammar {
    fn name(&self) -> &str {
        "template-call"
    }

    fn scan(&self, text: &str) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        let mut consumed = 0;

        for opener in OPENER.find_iter(text) {
            if opener.start() < consumed {
                continue;
            }
            let mut cursor = Cursor::new(text, opener.end());
            match parse_call(&mut cursor) {
                Some(reference) => {
                    consumed = cursor.pos();
                    occurrences.push(Occurrence::embed(opener.start()..consumed, reference));
                }
                None => {
                    tracing::debug!(
                        offset = opener.start(),
                        "Malformed kicad_schematic call left unchanged"
                    );
                }
            }
        }

        occurrences
    }
}

/// Parse everything after `kicad_schematic(` through the closing `}}`.
fn parse_call(cursor: &mut Cursor<'_>) -> Option<EmbedReference> {
    cursor.skip_blanks();
    let filename = match cursor.quoted() {
        Some(quoted) => quoted,
        None => cursor.bare(&[',', ')', '"', '\''])?,
    };
    if filename.is_empty() {
        return None;
    }
    let mut reference = EmbedReference::new(filename);

    loop {
        cursor.skip_blanks();
        if !cursor.eat(",") {
            break;
        }
        cursor.skip_blanks();
        let key = cursor.ident()?;
        cursor.skip_blanks();
        if !cursor.eat("=") {
            return None;
        }
        cursor.skip_blanks();
        let value = cursor.quoted()?.to_owned();
        if key.eq_ignore_ascii_case("style") {
            reference.style = value;
        } else if key.eq_ignore_ascii_case("controls") {
            reference.controls = value;
        } else {
            return None;
        }
    }

    if !cursor.eat(")") {
        return None;
    }
    cursor.skip_blanks();
    cursor.eat("}}").then_some(reference)
}
