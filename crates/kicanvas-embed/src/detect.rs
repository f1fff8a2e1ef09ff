//! Cheap detection of embed syntax in raw document sources.
//!
//! Only the opening token of each grammar is matched. A malformed expression
//! still counts as a hit; the grammar scanners decide what actually renders.

use std::sync::LazyLock;

use regex::Regex;

/// Matches the opener of any of the three embed grammars, case-insensitively.
pub static KICAD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)(\{\{\s*kicad_schematic\s*\(|\.\.\s+kicad-schematic::|\{%\s*kicad_schematic\s+)",
    )
    .unwrap()
});

/// Check whether `text` contains at least one embed opener.
#[must_use]
pub fn contains_embed(text: &str) -> bool {
    KICAD_PATTERN.is_match(text)
}
