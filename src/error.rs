//! Error types shared by the adapters, backends and settings loaders.

use std::path::PathBuf;

/// Failures that can surface while answering a request.
///
/// None of these are fatal: the dispatch layer logs them and answers the
/// client with an empty result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A wrapped language backend rejected the query.
    #[error("{language} backend failed: {message}")]
    Backend {
        language: &'static str,
        message: String,
    },

    /// The formatter could not re-serialize a region.
    #[error("failed to format {language} region: {message}")]
    Format {
        language: &'static str,
        message: String,
    },

    /// A configuration file was found but could not be used.
    #[error("invalid configuration in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn backend(language: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            language,
            message: message.into(),
        }
    }

    pub(crate) fn format(language: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            language,
            message: message.into(),
        }
    }
}
