use std::path::PathBuf;
use thiserror::Error;

use crate::bundle::EntityRole;
use crate::records::SourceId;

#[derive(Debug, Error)]
pub enum ImportError {
    /// A required entity file is not in the bundle
    #[error("{}", .role.missing_message())]
    MissingRole { role: EntityRole },

    #[error("unsupported archive format: {path:?} (expected .zip or .tar)")]
    UnsupportedArchive { path: PathBuf },

    #[error("failed to read zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("malformed record at {path:?} line {line}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("no text bounds found for source {source_id}")]
    MissingBounds { source_id: SourceId },

    #[error("payload path escapes the bundle: {directory}/{name}")]
    UnsafePayloadPath { directory: String, name: String },

    #[error(transparent)]
    Client(#[from] client::ClientError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ImportError {
        let path = path.into();
        move |source| ImportError::Io { path, source }
    }

    /// The creation call hit a source that already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ImportError::Client(e) if e.is_conflict())
    }
}
