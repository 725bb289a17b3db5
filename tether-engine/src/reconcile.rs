//! The debounced reconciliation loop.
//!
//! Change events accumulate in a [`PendingChangeSet`]. While anything is
//! pending the loop waits only a short debounce window for the next event;
//! once the window passes with no event, every pending endpoint is flushed
//! through a commit/pull cycle. With nothing pending the loop sits in a
//! long idle wait. Event bursts therefore collapse into one flush, however
//! long the burst.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace};

use tether_core::EndpointId;
use tether_repo::Vcs;

use crate::error::EngineError;
use crate::phase::{PhaseTracker, SessionPhase};
use crate::watch::ChangeEvent;

// ---------------------------------------------------------------------------
// Event bookkeeping
// ---------------------------------------------------------------------------

/// Endpoints with observed changes not yet flushed. Which paths changed is
/// irrelevant; the commit cycle stages everything anyway.
#[derive(Debug, Default)]
pub struct PendingChangeSet {
    pending: HashSet<EndpointId>,
}

impl PendingChangeSet {
    pub fn mark(&mut self, endpoint: EndpointId) {
        self.pending.insert(endpoint);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take everything pending. Flush order across endpoints is not
    /// meaningful; each endpoint's cycle is self-contained.
    pub fn drain(&mut self) -> Vec<EndpointId> {
        self.pending.drain().collect()
    }
}

/// One watched sync root, for deciding which events are the repository's
/// own bookkeeping.
#[derive(Debug, Clone)]
pub struct WatchRoot {
    pub endpoint: EndpointId,
    pub root: PathBuf,
    pub meta_dir: String,
}

impl WatchRoot {
    /// Local roots are canonicalized so events from backends that resolve
    /// symlinks still match; remote roots pass through untouched.
    pub fn for_vcs(vcs: &Vcs) -> Self {
        let root = if vcs.endpoint().is_remote() {
            vcs.root().to_path_buf()
        } else {
            vcs.root()
                .canonicalize()
                .unwrap_or_else(|_| vcs.root().to_path_buf())
        };
        Self {
            endpoint: vcs.endpoint().role(),
            root,
            meta_dir: vcs.meta_dir().to_string(),
        }
    }

    /// Whether `path` lies inside this root's repository metadata
    /// directory. Those events are caused by the sync itself; reacting to
    /// them would flush forever.
    pub fn is_repo_internal(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .next()
                .map(|c| c.as_os_str() == self.meta_dir.as_str())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Flushing
// ---------------------------------------------------------------------------

/// One flush for one endpoint: commit what changed there, propagate it to
/// the peer.
#[allow(async_fn_in_trait)]
pub trait Flusher {
    async fn flush(&mut self, changed: EndpointId) -> Result<(), EngineError>;
}

/// The production flusher. The changed side commits; when HEAD moved, the
/// other side pulls the commit through its forwarded daemon port.
#[derive(Debug, Clone)]
pub struct CommitPullCycle {
    local: Vcs,
    remote: Vcs,
}

impl CommitPullCycle {
    pub fn new(local: Vcs, remote: Vcs) -> Self {
        Self { local, remote }
    }

    fn pair(&self, changed: EndpointId) -> (&Vcs, &Vcs) {
        match changed {
            EndpointId::Local => (&self.local, &self.remote),
            EndpointId::Remote => (&self.remote, &self.local),
        }
    }

    /// Returns whether anything actually moved.
    pub async fn run(&self, changed: EndpointId) -> Result<bool, EngineError> {
        let (source, sink) = self.pair(changed);
        if source.commit_all("auto commit").await? {
            sink.pull().await?;
            info!(from = %changed, "synced");
            return Ok(true);
        }
        trace!(from = %changed, "nothing to commit");
        Ok(false)
    }
}

impl Flusher for CommitPullCycle {
    async fn flush(&mut self, changed: EndpointId) -> Result<(), EngineError> {
        self.run(changed).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// The loop
// ---------------------------------------------------------------------------

pub struct ReconcileLoop<F> {
    flusher: F,
    roots: Vec<WatchRoot>,
    debounce: Duration,
    idle_wait: Duration,
    phase: PhaseTracker,
}

impl<F: Flusher> ReconcileLoop<F> {
    /// `phase` must already be at [`SessionPhase::Watching`].
    pub fn new(
        flusher: F,
        roots: Vec<WatchRoot>,
        debounce: Duration,
        idle_wait: Duration,
        phase: PhaseTracker,
    ) -> Self {
        Self {
            flusher,
            roots,
            debounce,
            idle_wait,
            phase,
        }
    }

    /// Run until shutdown is signalled or a flush fails. Returns the final
    /// phase, which is [`SessionPhase::Terminated`] on the clean path.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ChangeEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SessionPhase, EngineError> {
        loop {
            let mut pending = PendingChangeSet::default();
            loop {
                let wait = if pending.is_empty() {
                    self.idle_wait
                } else {
                    self.debounce
                };
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("shutdown requested");
                        self.phase.advance(SessionPhase::Terminated)?;
                        return Ok(self.phase.current());
                    }
                    outcome = tokio::time::timeout(wait, events.recv()) => match outcome {
                        Ok(Some(event)) => {
                            if self.is_repo_internal(&event) {
                                trace!(path = %event.path.display(), "repository-internal event");
                                continue;
                            }
                            debug!(endpoint = %event.endpoint, path = %event.path.display(), "change");
                            pending.mark(event.endpoint);
                        }
                        Ok(None) => return Err(EngineError::WatcherClosed),
                        Err(_) if pending.is_empty() => continue,
                        Err(_) => break,
                    }
                }
            }

            self.phase.advance(SessionPhase::Flushing)?;
            for endpoint in pending.drain() {
                self.flusher.flush(endpoint).await?;
            }
            self.phase.advance(SessionPhase::Watching)?;
        }
    }

    fn is_repo_internal(&self, event: &ChangeEvent) -> bool {
        self.roots
            .iter()
            .any(|root| root.endpoint == event.endpoint && root.is_repo_internal(&event.path))
    }
}
