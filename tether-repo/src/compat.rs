//! Deciding whether two endpoints can sync, and making them able to.
//!
//! The decision is a pure function of the two tail hashes; the executor
//! only ever mutates a side that has no history, and refuses to touch a
//! non-empty directory that is not part of the sync.

use tracing::info;

use tether_core::{DirState, EndpointId};

use crate::error::RepoError;
use crate::mirror::mirror;
use crate::vcs::Vcs;

/// What it takes to make the two endpoints compatible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatPlan {
    /// Histories already share a root commit; nothing to do.
    AlreadyCompatible,
    /// Neither side has history; create it locally, then mirror outward.
    InitLocalThenMirror,
    /// Exactly one side has history; mirror it onto the other.
    Mirror { from: EndpointId, to: EndpointId },
    /// Both sides have history but no shared root. Never reconciled
    /// automatically.
    Unrelated { local: String, remote: String },
}

/// Decision table over the two tail hashes.
pub fn plan(local_tail: Option<String>, remote_tail: Option<String>) -> CompatPlan {
    match (local_tail, remote_tail) {
        (Some(local), Some(remote)) => {
            if local == remote {
                CompatPlan::AlreadyCompatible
            } else {
                CompatPlan::Unrelated { local, remote }
            }
        }
        (Some(_), None) => CompatPlan::Mirror {
            from: EndpointId::Local,
            to: EndpointId::Remote,
        },
        (None, Some(_)) => CompatPlan::Mirror {
            from: EndpointId::Remote,
            to: EndpointId::Local,
        },
        (None, None) => CompatPlan::InitLocalThenMirror,
    }
}

/// Probe both histories and carry out the plan. On success both endpoints
/// hold repositories with the same tail hash; on error nothing has been
/// mutated.
pub async fn resolve(local: &Vcs, remote: &Vcs) -> Result<CompatPlan, RepoError> {
    let local_tail = local.tail_hash().await?;
    let remote_tail = remote.tail_hash().await?;
    let plan = plan(local_tail, remote_tail);
    info!(?plan, "compatibility check");

    match &plan {
        CompatPlan::AlreadyCompatible => {}
        CompatPlan::Unrelated { local, remote } => {
            return Err(RepoError::IncompatibleRepos {
                local: local.clone(),
                remote: remote.clone(),
            })
        }
        CompatPlan::Mirror { from, .. } => {
            let (src, dst) = if *from == EndpointId::Local {
                (local, remote)
            } else {
                (remote, local)
            };
            ensure_target_clear(dst).await?;
            mirror(src, dst).await?;
        }
        CompatPlan::InitLocalThenMirror => {
            // Remote is probed first; when both sides are non-empty the
            // refusal names the remote.
            ensure_target_clear(remote).await?;
            ensure_target_clear(local).await?;
            local.init().await?;
            mirror(local, remote).await?;
        }
    }
    Ok(plan)
}

/// A side about to receive a mirror must be missing or an empty directory.
/// Anything else would silently absorb or delete files the user never asked
/// to sync.
async fn ensure_target_clear(vcs: &Vcs) -> Result<(), RepoError> {
    match vcs.endpoint().dir_state(vcs.root()).await? {
        DirState::Missing | DirState::EmptyDir => Ok(()),
        DirState::NonEmptyDir => Err(RepoError::TargetNotEmpty {
            endpoint: vcs.endpoint().name().to_string(),
            path: vcs.root().to_path_buf(),
        }),
        DirState::NotADirectory => Err(RepoError::NotADirectory {
            endpoint: vcs.endpoint().name().to_string(),
            path: vcs.root().to_path_buf(),
        }),
    }
}
