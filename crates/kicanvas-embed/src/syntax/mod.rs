//! Embed grammars and the processor that substitutes them.
//!
//! Each grammar is an [`EmbedGrammar`] that scans text and reports
//! [`Occurrence`]s: byte spans paired with what should replace them. The
//! [`EmbedProcessor`] runs the registered grammars one after another,
//! resolves every reference and splices in the rendered markup. Text that no
//! grammar claims is never touched.

mod args;
#[cfg(feature = "liquid")]
mod liquid;
mod processor;
mod rst;
mod template_call;

use std::ops::Range;

use crate::reference::EmbedReference;

#[cfg(feature = "liquid")]
pub use liquid::LiquidTagGrammar;
pub use processor::EmbedProcessor;
pub use rst::RstDirectiveGrammar;
pub use template_call::TemplateCallGrammar;

/// A lexical scanner for one embed syntax.
pub trait EmbedGrammar: Send + Sync {
    /// Grammar name used in log messages.
    fn name(&self) -> &str;

    /// Find all well-formed occurrences in `text`, in order, without overlap.
    fn scan(&self, text: &str) -> Vec<Occurrence>;
}

/// One matched span and its replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrence {
    /// Byte range in the scanned text.
    pub span: Range<usize>,
    pub output: EmbedOutput,
}

impl Occurrence {
    pub(crate) fn embed(span: Range<usize>, reference: EmbedReference) -> Self {
        Self {
            span,
            output: EmbedOutput::Embed(reference),
        }
    }
}

/// What a matched span turns into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmbedOutput {
    /// A reference to resolve and render.
    Embed(EmbedReference),
    /// Literal replacement text explaining malformed input.
    Diagnostic(String),
}
