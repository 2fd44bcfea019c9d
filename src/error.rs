use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a generation run.
///
/// None of these are retried: the output is a pure function of the
/// environment, so the operator has to fix the input and run again.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Variable \"{name}\" must be provided")]
    MissingRequiredVariable { name: String },

    #[error("Variable \"{key}\" does not match {expected} format")]
    MalformedKey { key: String, expected: &'static str },

    #[error("Invalid value for variable \"{variable}\": \"{value}\" (must be one of {expected})")]
    InvalidEnumValue {
        variable: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unresolved placeholder in template {template}: {detail}")]
    UnresolvedTemplatePlaceholder { template: String, detail: String },

    #[error("Failed to render template {template}: {detail}")]
    Template { template: String, detail: String },

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse role definitions from {path:?}: {source}")]
    Roles {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
