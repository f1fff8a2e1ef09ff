//! `kicanvas build` command implementation.

use std::path::PathBuf;

use clap::Args;
use kicanvas_config::{CliSettings, Config};
use kicanvas_site::SiteBuilder;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Content source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Load the KiCanvas script from the CDN instead of the local copy.
    #[arg(long)]
    cdn: bool,

    /// Path to configuration file (default: auto-discover kicanvas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output (show INFO level logs).
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            use_cdn: self.cdn.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }
        output.info(&format!(
            "Source: {}",
            config.content_resolved.source_dir.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.content_resolved.output_dir.display()
        ));

        let report = SiteBuilder::from_config(&config).build()?;

        for warning in &report.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        output.success(&format!(
            "Built {} page(s): {} with schematics, {} draft(s) skipped, {} schematic(s) copied",
            report.pages_written.len(),
            report.pages_with_embeds,
            report.drafts,
            report.schematics_copied,
        ));

        Ok(())
    }
}
