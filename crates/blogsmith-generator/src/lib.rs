//! blogsmith generator
//!
//! Turns a loaded site into output files.
//!
//! # Modules
//!
//! - [`loader`] - Record loading and per-record validation
//! - [`model`] - Cross-referenced site model: ordering, tags, pagination, archive
//! - [`template`] - HTML layouts with variable interpolation
//! - [`html`] - Page rendering
//! - [`sitemap`], [`rss`], [`atom`], [`robots`], [`profile`] - Auxiliary outputs
//! - [`output`] - Output writers
//! - [`build`] - Rebuild coordination

pub mod atom;
pub mod build;
pub mod html;
pub mod loader;
pub mod model;
pub mod output;
pub mod profile;
pub mod robots;
pub mod rss;
pub mod sitemap;
pub mod template;
pub mod xml;

pub use build::{BuildError, BuildOptions, BuildStats, Builder, is_ignored};
pub use html::{HtmlGenerator, RenderedPage};
pub use loader::SiteLoader;
pub use model::{SiteModel, SiteSource};
pub use output::{DirWriter, MemoryWriter, OutputError, OutputWriter};
pub use template::{Renderer, Template, TemplateContext, TemplateRegistry};
