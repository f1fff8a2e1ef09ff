//! Detection, resolution and injection engine for KiCanvas schematic embeds.
//!
//! Authors reference `*.kicad_sch` files with one of three grammars:
//!
//! - Template call: `{{ kicad_schematic("amp.kicad_sch", style="…", controls="…") }}`
//! - reStructuredText directive: `.. kicad-schematic:: amp.kicad_sch`
//! - Liquid tag: `{% kicad_schematic amp.kicad_sch style="…" %}` (feature `liquid`)
//!
//! # Architecture
//!
//! - [`detect`]: cheap pre-filter that flags documents containing any grammar opener
//! - [`syntax`]: per-grammar scanners and the [`EmbedProcessor`] that substitutes markup
//! - [`resolve`]: layered filename-to-URL resolution with filesystem probing
//! - [`markup`]: canonical `<kicanvas-embed>` rendering
//! - [`inject`]: idempotent loader-script injection into rendered pages
//! - [`template`]: the `kicad_schematic` function for template engines
//!
//! # Example
//!
//! ```
//! use kicanvas_embed::{DocumentFacts, EmbedProcessor, EmbedSettings};
//!
//! let settings = EmbedSettings::default();
//! let mut processor = EmbedProcessor::new(&settings).with_default_grammars();
//!
//! let html = processor.process(
//!     ".. kicad-schematic:: amp.kicad_sch",
//!     &DocumentFacts::default(),
//! );
//! assert!(html.contains(r#"src="/static/schematics/amp.kicad_sch""#));
//! ```

pub mod detect;
pub mod inject;
pub mod markup;
mod reference;
pub mod resolve;
mod settings;
pub mod syntax;
pub mod template;

pub use detect::{KICAD_PATTERN, contains_embed};
pub use inject::{
    DocumentRenderState, InjectOutcome, InjectPosition, LoaderScript, PublishStatus,
    inject_loader,
};
pub use markup::{render_embed, render_embed_with_defaults};
pub use reference::{EmbedReference, ResolvedEmbed};
pub use resolve::{Resolution, ResolutionContext, Strategy, resolve, resolve_with_strategy};
pub use settings::{DocumentFacts, EmbedSettings};
pub use syntax::{EmbedGrammar, EmbedOutput, EmbedProcessor, Occurrence};
pub use template::{SchematicFunction, TemplateContext};
