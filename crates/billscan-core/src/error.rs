//! Error types for billscan operations.
//!
//! Every failure carries an [`ErrorKind`] with a stable code for logs. The
//! `Display` output is the message shown to HTTP callers, so it must stay
//! free of internal detail beyond what the failure itself reports.

use std::path::Path;

use thiserror::Error;

/// Result type alias for billscan operations.
pub type BillscanResult<T> = Result<T, BillscanError>;

/// Main error type for all billscan operations.
#[derive(Error, Debug)]
pub enum BillscanError {
    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The upload request carried no `file` field.
    #[error("No file uploaded")]
    MissingFile,

    /// The model provider answered with a non-200 status.
    #[error("Error: {reason}")]
    RemoteCall { status: u16, reason: String },

    /// The request to the model provider never produced a response.
    #[error("{message}")]
    Transport {
        message: String,
        timed_out: bool,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider response was not the JSON we expect.
    #[error("{message}")]
    ResponseShape { message: String },

    /// Reading, writing, or deleting a transient upload failed.
    ///
    /// Only the file name is kept; the upload directory stays out of the
    /// message.
    #[error("{source}: '{file}'")]
    LocalIo {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`BillscanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    MissingFile,
    RemoteCall,
    Transport,
    Timeout,
    ResponseShape,
    LocalIo,
}

impl ErrorKind {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CFG_001",
            ErrorKind::MissingFile => "REQ_001",
            ErrorKind::RemoteCall => "RMT_001",
            ErrorKind::Transport => "NET_001",
            ErrorKind::Timeout => "NET_002",
            ErrorKind::ResponseShape => "PARSE_001",
            ErrorKind::LocalIo => "IO_001",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BillscanError {
    /// Create a remote call error from a status code and its reason phrase.
    pub fn remote_call(status: u16, reason: impl Into<String>) -> Self {
        Self::RemoteCall {
            status,
            reason: reason.into(),
        }
    }

    /// Create a local I/O error for the file at `path`.
    pub fn local_io(path: &Path, source: std::io::Error) -> Self {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::LocalIo { file, source }
    }

    /// Create a response shape error.
    pub fn response_shape(message: impl Into<String>) -> Self {
        Self::ResponseShape {
            message: message.into(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::MissingFile => ErrorKind::MissingFile,
            Self::RemoteCall { .. } => ErrorKind::RemoteCall,
            Self::Transport { timed_out: true, .. } => ErrorKind::Timeout,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::ResponseShape { .. } => ErrorKind::ResponseShape,
            Self::LocalIo { .. } => ErrorKind::LocalIo,
        }
    }
}

impl From<serde_json::Error> for BillscanError {
    fn from(err: serde_json::Error) -> Self {
        Self::response_shape(err.to_string())
    }
}
