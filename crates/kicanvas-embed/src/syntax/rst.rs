//! `.. kicad-schematic:: file` with indented `:style:` / `:controls:` options.

use std::sync::LazyLock;

use regex::Regex;

use super::{EmbedGrammar, Occurrence};
use crate::reference::EmbedReference;

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([ \t]*)\.\.[ \t]+kicad-schematic::(.*)$").unwrap());

static OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z][\w-]*):(.*)$").unwrap());

/// reStructuredText directive grammar.
///
/// The directive block is the marker line plus every following non-blank
/// line indented deeper than the marker. Unknown options are consumed and
/// ignored. The marker's own indentation is preserved in the output.
#[derive(Clone, Copy, Debug, Default)]
pub struct RstDirectiveGrammar;

#[derive(Clone, Copy)]
enum Field {
    Style,
    Controls,
    Other,
}

impl EmbedGrammar for RstDirectiveGrammar {
    fn name(&self) -> &str {
        "rst-directive"
    }

    fn scan(&self, text: &str) -> Vec<Occurrence> {
        let lines = lines_with_offsets(text);
        let mut occurrences = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let (start, line) = lines[i];
            i += 1;

            let Some(caps) = DIRECTIVE.captures(line) else {
                continue;
            };
            let indent = caps[1].len();
            let mut tokens = caps[2].split_whitespace();
            let (Some(filename), None) = (tokens.next(), tokens.next()) else {
                tracing::debug!(line = i, "kicad-schematic directive needs exactly one filename");
                continue;
            };

            let mut reference = EmbedReference::new(filename);
            let mut end = start + line.len();
            let mut current = None;

            while let Some(&(line_start, body)) = lines.get(i) {
                if body.trim().is_empty() || indent_of(body) <= indent {
                    break;
                }
                let trimmed = body.trim();
                if let Some(option) = OPTION.captures(trimmed) {
                    let field = match option[1].to_ascii_lowercase().as_str() {
                        "style" => Field::Style,
                        "controls" => Field::Controls,
                        _ => Field::Other,
                    };
                    if let Some(value) = slot(&mut reference, field) {
                        *value = option[2].trim().to_owned();
                    }
                    current = Some(field);
                } else if let Some(value) = current.and_then(|f| slot(&mut reference, f)) {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(trimmed);
                }
                end = line_start + body.len();
                i += 1;
            }

            occurrences.push(Occurrence::embed(start + indent..end, reference));
        }

        occurrences
    }
}

fn slot(reference: &mut EmbedReference, field: Field) -> Option<&mut String> {
    match field {
        Field::Style => Some(&mut reference.style),
        Field::Controls => Some(&mut reference.controls),
        Field::Other => None,
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Lines without terminators, paired with their byte offsets.
fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            (start, raw.trim_end_matches(['\n', '\r']))
        })
        .collect()
}
