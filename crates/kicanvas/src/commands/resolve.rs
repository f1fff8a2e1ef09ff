//! `kicanvas resolve` command implementation.
//!
//! Runs the resolver for one filename as if it appeared in a document,
//! which is handy when a page shows a broken viewer.

use std::path::PathBuf;

use clap::Args;
use kicanvas_config::Config;
use kicanvas_embed::{ResolutionContext, Strategy, resolve_with_strategy};
use kicanvas_site::{Document, embed_settings};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    /// Document the reference appears in.
    document: PathBuf,

    /// Schematic filename as written in the document.
    filename: String,

    /// Published URL of the document (default: derived from its path).
    #[arg(long)]
    url: Option<String>,

    /// Path to configuration file (default: auto-discover kicanvas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ResolveArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), None)?;
        let settings = embed_settings(&config);

        // Both sides canonical so the document URL derives from its
        // content-relative path.
        let content_root = settings
            .content_root
            .canonicalize()
            .unwrap_or_else(|_| settings.content_root.clone());
        let source_path = self.document.canonicalize()?;
        let document = Document::load(&content_root, &source_path)?;

        let mut facts = document.facts();
        if let Some(url) = self.url {
            facts.url = Some(url);
        }

        let ctx = ResolutionContext::new(&settings, &facts);
        let resolution = resolve_with_strategy(&self.filename, &ctx);

        output.info(&format!(
            "Document: {} ({})",
            source_path.display(),
            facts.url.as_deref().unwrap_or_default()
        ));
        output.info(&format!("Strategy: {}", describe(resolution.strategy)));
        if !resolution.is_confirmed() {
            output.warning(&format!(
                "Warning: {} was not found; the URL is passed through unchanged",
                self.filename
            ));
        }
        output.result(&resolution.url);

        Ok(())
    }
}

fn describe(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Verbatim => "absolute reference",
        Strategy::DocumentOutput => "document output directory",
        Strategy::DocumentSource => "next to document source",
        Strategy::ContentTree => "content tree",
        Strategy::SchematicsDir => "schematics directory",
        Strategy::PassThrough => "pass-through",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_pass_through() {
        assert_eq!(describe(Strategy::PassThrough), "pass-through");
    }

    #[test]
    fn test_describe_is_distinct_per_strategy() {
        let all = [
            Strategy::Verbatim,
            Strategy::DocumentOutput,
            Strategy::DocumentSource,
            Strategy::ContentTree,
            Strategy::SchematicsDir,
            Strategy::PassThrough,
        ];
        let mut labels: Vec<_> = all.iter().map(|s| describe(*s)).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), all.len());
    }
}
