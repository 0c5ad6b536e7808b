//! Error type shared by the dispatcher and the prober.
//!
//! Each variant maps to a process exit code so the binaries can stay thin.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for an invocation name that is not a known personality.
pub const EXIT_UNKNOWN_PERSONALITY: i32 = 5;
/// Exit code when no HTTP client can be constructed.
pub const EXIT_CLIENT_UNAVAILABLE: i32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown personality '{0}' (expected one of: get, head, post, put, patch, submit, filesubmit)")]
    UnknownPersonality(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no usable HTTP client: {0}")]
    ClientUnavailable(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request item '{0}'")]
    RequestItem(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UnknownPersonality(_) => EXIT_UNKNOWN_PERSONALITY,
            Error::ClientUnavailable(_) => EXIT_CLIENT_UNAVAILABLE,
            Error::Usage(_) | Error::RequestItem(_) | Error::Timeout(_) => 2,
            _ => 1,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err)
        } else {
            Error::Transport(err)
        }
    }
}
