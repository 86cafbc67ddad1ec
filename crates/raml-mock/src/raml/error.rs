use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a RAML document. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum DocumentLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Not a RAML document: the first line must start with '#%RAML'")]
    NotRaml,
    #[error("Unsupported RAML version: {0}")]
    UnsupportedVersion(String),
    #[error("Document root must be a mapping")]
    InvalidRoot,
    #[error("Invalid {context}: {reason}")]
    Invalid { context: String, reason: String },
    #[error("Cannot include {path}: {reason}")]
    Include { path: PathBuf, reason: String },
}

impl DocumentLoadError {
    pub(crate) fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            context: context.into(),
            reason: reason.into(),
        }
    }
}
