//! Error types for endpoint construction and command execution.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed on {endpoint} (exit {status}): {stderr}")]
    CommandFailed {
        endpoint: String,
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("invalid remote address `{input}`: {reason}")]
    InvalidAddress { input: String, reason: &'static str },

    #[error("unsupported operating system `{uname}` on {endpoint}")]
    UnsupportedOs { endpoint: String, uname: String },

    #[error("cannot determine the home directory")]
    HomeNotFound,

    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot transfer between two remote endpoints ({src} -> {dst})")]
    RemoteToRemote { src: String, dst: String },
}

/// Convenience constructor so call sites read
/// `io_err("ssh control socket", e)` instead of the struct literal.
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
