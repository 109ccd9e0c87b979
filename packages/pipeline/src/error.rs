//! One error type for every pipeline entry point, classified into the
//! failure taxonomy reported to users.

use std::path::PathBuf;

use diet_insights_analytics::AnalyticsError;
use diet_insights_charts::ChartError;
use diet_insights_document_store::DocumentStoreError;
use diet_insights_source::SourceError;
use diet_insights_storage::StorageError;
use serde::Serialize;

/// Failure category surfaced in run outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Local file missing or unreadable, or a sink write failed.
    #[serde(rename = "IOError")]
    Io,
    /// Remote service unreachable or credentials rejected.
    #[serde(rename = "ConnectionError")]
    Connection,
    /// Referenced container or blob absent.
    #[serde(rename = "NotFoundError")]
    NotFound,
    /// Malformed or incomplete tabular input.
    #[serde(rename = "ParseError")]
    Parse,
    /// Statistical precondition violated.
    #[serde(rename = "DataError")]
    Data,
    /// Missing or malformed settings.
    #[serde(rename = "ConfigError")]
    Config,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "IOError",
            Self::Connection => "ConnectionError",
            Self::NotFound => "NotFoundError",
            Self::Parse => "ParseError",
            Self::Data => "DataError",
            Self::Config => "ConfigError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading or parsing the dataset failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Analysis preconditions failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Blob storage call failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Writing or reading the result document failed.
    #[error(transparent)]
    DocumentStore(#[from] DocumentStoreError),

    /// Chart rendering failed.
    #[error(transparent)]
    Charts(#[from] ChartError),

    /// The local input file does not exist.
    #[error("File not found: {}", path.display())]
    MissingInput {
        /// Path that was checked.
        path: PathBuf,
    },
}

impl PipelineError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(SourceError::Io(_)) | Self::MissingInput { .. } | Self::Charts(_) => {
                ErrorKind::Io
            }
            Self::Source(_) => ErrorKind::Parse,
            Self::Analytics(_) => ErrorKind::Data,
            Self::Storage(e) => match e {
                StorageError::MissingEnv { .. }
                | StorageError::InvalidConfig { .. }
                | StorageError::InvalidName { .. } => ErrorKind::Config,
                StorageError::Connection { .. }
                | StorageError::Unauthorized { .. }
                | StorageError::Service { .. }
                | StorageError::Request { .. } => ErrorKind::Connection,
                StorageError::ContainerNotFound { .. } | StorageError::BlobNotFound { .. } => {
                    ErrorKind::NotFound
                }
                StorageError::BlobExists { .. } | StorageError::Io(_) => ErrorKind::Io,
            },
            Self::DocumentStore(DocumentStoreError::InvalidName { .. }) => ErrorKind::Config,
            Self::DocumentStore(_) => ErrorKind::Io,
        }
    }
}
