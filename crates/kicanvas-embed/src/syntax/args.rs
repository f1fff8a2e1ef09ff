//! Lexical helpers shared by the grammar scanners.

use std::collections::HashMap;

/// Forward-only cursor over a single line of source text.
///
/// Never crosses a newline: every consuming method stops at `\n`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    /// Byte offset into the original text.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Skip spaces and tabs.
    pub(crate) fn skip_blanks(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t']);
        self.pos += rest.len() - trimmed.len();
    }

    /// Consume `token` if it comes next.
    pub(crate) fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Consume an identifier (`[A-Za-z_][A-Za-z0-9_]*`).
    pub(crate) fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            return None;
        }
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Consume a `"…"` or `'…'` string on the current line and return its body.
    pub(crate) fn quoted(&mut self) -> Option<&'a str> {
        let quote = self.peek().filter(|c| matches!(c, '"' | '\''))?;
        let body = &self.rest()[1..];
        let end = body.find([quote, '\n'])?;
        if !body[end..].starts_with(quote) {
            return None;
        }
        self.pos += end + 2;
        Some(&body[..end])
    }

    /// Consume a run of characters up to whitespace or any of `stops`.
    pub(crate) fn bare(&mut self, stops: &[char]) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || stops.contains(&c))
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }
}

/// Key/value options scanned from free-form markup.
///
/// Accepts `key="value"`, `key='value'` and `key=value` in any order. Keys are
/// stored lowercased; a later duplicate replaces an earlier one. Anything
/// that is not a key/value pair is skipped.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct OptionArgs {
    attrs: HashMap<String, String>,
}

impl OptionArgs {
    pub(crate) fn parse(input: &str) -> Self {
        let mut args = Self::default();
        let mut remaining = input.trim();

        while !remaining.is_empty() {
            remaining = remaining.trim_start();

            if let Some((key, value, rest)) = parse_key_value(remaining) {
                args.attrs.insert(key.to_ascii_lowercase(), value.to_owned());
                remaining = rest;
            } else {
                // Skip the unrecognized word
                let end = remaining
                    .find(char::is_whitespace)
                    .unwrap_or(remaining.len());
                remaining = &remaining[end..];
            }
        }

        args
    }

    /// Get an option value by lowercase key.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// Parse a key-value pair at the start of `s`.
///
/// An unterminated quote takes the remainder of `s` as the value.
fn parse_key_value(s: &str) -> Option<(&str, &str, &str)> {
    let word_end = s.find(char::is_whitespace).unwrap_or(s.len());
    let eq_pos = s[..word_end].find('=')?;
    let key = &s[..eq_pos];

    if key.is_empty() {
        return None;
    }

    let after_eq = &s[eq_pos + 1..];

    if let Some(quote) = after_eq.chars().next().filter(|c| matches!(c, '"' | '\'')) {
        let body = &after_eq[1..];
        match body.find(quote) {
            Some(end) => Some((key, &body[..end], &body[end + 1..])),
            None => Some((key, body, "")),
        }
    } else {
        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
        Some((key, &after_eq[..end], &after_eq[end..]))
    }
}
