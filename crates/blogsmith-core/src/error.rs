//! Error types for the blogsmith core library.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// A localized complaint about one field of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Source file the record came from, relative to the site root.
    pub file: String,
    /// Dotted field path, e.g. `sitemap.priority` or `tags[2].slug`.
    pub field: String,
    /// Human readable description of the problem.
    pub message: String,
    /// Offending value, when there is one to show.
    pub value: Option<String>,
}

impl FieldError {
    #[must_use]
    pub fn new(file: impl Into<String>, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the offending value.
    #[must_use]
    pub fn with_value(mut self, value: impl fmt::Display) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Prefix the field path, used when a nested record is validated on its own.
    #[must_use]
    pub fn nested(mut self, parent: &str) -> Self {
        self.field = if self.field.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.field)
        };
        self
    }

    /// Shorthand for the common "missing required field" case.
    #[must_use]
    pub fn required(file: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(file, field, "is required")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.file, self.field, self.message)?;
        if let Some(value) = &self.value {
            write!(f, " ({value:?})")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// Core error types for blogsmith.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A field is missing, malformed, or outside its allowed domain.
    #[error("validation error: {0}")]
    Validation(FieldError),

    /// A tag or template reference does not resolve.
    #[error("reference error: {0}")]
    Reference(FieldError),

    /// Front matter block could not be located or decoded.
    #[error("front matter error in {path}: {message}")]
    FrontMatter { path: String, message: String },

    /// A source path escapes the root or is otherwise malformed.
    #[error("invalid path {path:?}: {message}")]
    Path { path: String, message: String },

    /// File system I/O error.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Layered configuration error.
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a validation error.
    pub fn validation(file: impl Into<String>, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(FieldError::new(file, field, message))
    }

    /// Create a reference error naming the unresolved value.
    pub fn reference(
        file: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl fmt::Display,
    ) -> Self {
        Self::Reference(FieldError::new(file, field, message).with_value(value))
    }

    /// Create a front matter error.
    pub fn front_matter(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrontMatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a path error.
    pub fn path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The field-level detail, if this is a validation or reference error.
    #[must_use]
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            Self::Validation(e) | Self::Reference(e) => Some(e),
            _ => None,
        }
    }

    /// True when the error points at missing files rather than bad content.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<FieldError> for CoreError {
    fn from(err: FieldError) -> Self {
        Self::Validation(err)
    }
}
