use reqwest::{Method, StatusCode};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the API client and project handle.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a status >= 300
    #[error("{method} {path} failed with status {status}: {message}")]
    Api {
        status: StatusCode,
        method: Method,
        path: String,
        message: String,
    },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// The server reported that the resource already exists.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }
}
