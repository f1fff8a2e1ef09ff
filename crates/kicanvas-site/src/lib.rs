//! Static site pipeline with KiCanvas schematic embeds.
//!
//! This crate provides:
//! - [`SiteBuilder`]: scans a content directory, renders Markdown documents
//!   and writes the site
//! - [`Document`]: one source document with its URL, status and embed flags
//! - [`copy_schematics`]: places schematics next to the pages that embed them
//! - [`copy_referenced`]: publishes content-tree schematics that embeds point at
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kicanvas_config::Config;
//! use kicanvas_site::SiteBuilder;
//!
//! let config = Config::load(None, None)?;
//! let report = SiteBuilder::from_config(&config).build()?;
//! assert!(report.warnings.is_empty());
//! # Ok(())
//! # }
//! ```

mod builder;
mod copy;
mod document;
mod error;
mod layout;
mod metadata;
mod renderer;

pub use builder::{BuildReport, SiteBuilder, embed_settings};
pub use copy::{CopyReport, copy_referenced, copy_schematics};
pub use document::Document;
pub use error::BuildError;
pub use layout::{DEFAULT_LAYOUT, PageLayout};
pub use metadata::{FrontMatter, MetadataError, split_front_matter};
pub use renderer::{ContentRenderer, RenderedContent};
