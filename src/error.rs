use std::path::Path;

use thiserror::Error;

/// Failures that end the run. Everything else is logged and worked around.
#[derive(Error, Debug)]
pub enum ProspectError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("{path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path}: missing Email column")]
    MissingEmailColumn { path: String },

    #[error("webhook inbox returned HTTP {status}")]
    InboxStatus { status: u16 },
}

impl ProspectError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ProspectError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        ProspectError::Json {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn csv(path: &Path, source: csv::Error) -> Self {
        ProspectError::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}
