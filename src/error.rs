use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileError>;

/// Errors surfaced by remote file handles, sessions and format readers.
#[derive(Error, Debug)]
pub enum FileError {
    /// The remote path does not exist
    #[error("remote file not found: {0}")]
    NotFound(String),

    /// A seek target fell outside `[0, size]`
    #[error("seek target {target} out of range for file of size {size}")]
    OutOfRange { target: i128, size: u64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Opaque session or protocol failure, propagated unchanged
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    /// Malformed structured content
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FileError {
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        Self::Transport(err.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Short classification used as the `status` label in instrumentation.
    pub fn kind(&self) -> &'static str {
        match self {
            FileError::NotFound(_) => "not_found",
            FileError::OutOfRange { .. } => "out_of_range",
            FileError::InvalidArgument(_) => "invalid_argument",
            FileError::Transport(_) => "transport",
            FileError::Decode(_) => "decode",
        }
    }
}

impl From<std::io::Error> for FileError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.into())
    }
}

impl From<reqwest::Error> for FileError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.into())
    }
}
