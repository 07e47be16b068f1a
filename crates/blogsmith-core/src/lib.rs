//! blogsmith core library
//!
//! Records, validation and the read-only source view for the blogsmith site generator.

pub mod config;
pub mod content;
pub mod date;
pub mod error;
pub mod frontmatter;
pub mod post;
pub mod source;
pub mod tag;
pub mod theme;
pub mod url;

pub use config::Config;
pub use content::{ParsedContent, TocEntry};
pub use error::{CoreError, FieldError, Result};
pub use frontmatter::Frontmatter;
pub use post::{Post, PostState};
pub use source::{ContentSource, DirSource, MemorySource};
pub use tag::Tag;
pub use theme::Theme;
pub use url::build_url;
