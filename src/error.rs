use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the catalog HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed after {attempts} attempt(s): HTTP status {status}{}", body_suffix(.body))]
    Status {
        status: u16,
        body: String,
        attempts: usize,
    },
    #[error("request failed after {attempts} attempt(s): transport error: {detail}")]
    Transport { detail: String, attempts: usize },
    #[error("malformed response from {endpoint}: {detail}")]
    Malformed { endpoint: String, detail: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Malformed { .. } => None,
        }
    }

    pub(crate) fn malformed(endpoint: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint: endpoint.to_string(),
            detail: detail.into(),
        }
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({body})")
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("bands file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),
    #[error("failed to read {}", .path.display())]
    DocumentUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", .path.display())]
    DocumentUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no tracks found, playlist was not created or changed")]
    EmptyResultSet,
    #[error("cover image: {0}")]
    CoverImage(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
