//! Error types for repository bootstrap and history management.

use std::path::PathBuf;

use thiserror::Error;

use tether_core::CoreError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("tgit build failed on {endpoint}: {reason}")]
    BuildFailed { endpoint: String, reason: String },

    #[error(
        "local and remote histories are unrelated (local root {local}, remote root {remote}); \
         move one side away and re-run"
    )]
    IncompatibleRepos { local: String, remote: String },

    #[error("refusing to sync into non-empty {path} on {endpoint}; move its contents away first")]
    TargetNotEmpty { endpoint: String, path: PathBuf },

    #[error("{path} on {endpoint} exists but is not a directory")]
    NotADirectory { endpoint: String, path: PathBuf },

    #[error("no commit on {endpoint}:{path} to mirror")]
    NothingToMirror { endpoint: String, path: PathBuf },
}
