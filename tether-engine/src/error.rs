//! Error types for the sync engine.

use thiserror::Error;

use tether_core::CoreError;
use tether_repo::RepoError;

use crate::phase::SessionPhase;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("session phase cannot move from {from:?} to {to:?}")]
    PhaseViolation {
        from: SessionPhase,
        to: SessionPhase,
    },

    #[error("failed to start filesystem watcher on {endpoint}: {source}")]
    WatcherInit {
        endpoint: String,
        #[source]
        source: notify::Error,
    },

    #[error("watch process on {endpoint} has no stdout pipe")]
    WatcherPipe { endpoint: String },

    #[error("change event stream closed while the session was live")]
    WatcherClosed,

    #[error("daemon wiring requires an ssh-reachable endpoint, got {endpoint}")]
    TunnelRequiresSsh { endpoint: String },
}
