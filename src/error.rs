//! Unified error types for xmlconf.
//!
//! Defines [`XmlConfError`] (the main crate error enum) and
//! [`ValidationError`] for schema validation failures. Both use
//! `thiserror` for `Display` and `Error` derives. Error messages
//! name the offending path so a caller can locate the problem.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Canonical path of the node that failed, e.g. `/configuration/sat/delay`.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum XmlConfError {
    #[error("Path '{path}' matched {found} nodes, expected exactly one")]
    Path { path: String, found: usize },

    #[error("Invalid path expression '{path}': {reason}")]
    PathSyntax { path: String, reason: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Schema validation failed:\n{}", format_errors(.errors))]
    Validation { errors: Vec<ValidationError> },

    #[error("Cannot load {}:\n  {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported export format: '{0}'")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl XmlConfError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    pub(crate) fn load(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_render_one_per_line() {
        let err = XmlConfError::Validation {
            errors: vec![
                ValidationError::new("/configuration/a", "bad value"),
                ValidationError::new("/configuration/b", "missing"),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("Schema validation failed:\n"));
        assert!(text.contains("  /configuration/a: bad value\n  /configuration/b: missing"));
    }

    #[test]
    fn path_error_names_match_count() {
        let err = XmlConfError::Path {
            path: "//spot".into(),
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Path '//spot' matched 3 nodes, expected exactly one"
        );
    }
}
