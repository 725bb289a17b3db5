//! A full sync session, from endpoint construction to termination.
//!
//! The phase order is load-bearing: toolchains first, then history
//! compatibility, then daemons, then watchers, then one warmup exchange
//! for changes that predate the session, and only then the event loop.

use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use tether_core::error::io_err;
use tether_core::{Endpoint, EndpointId, RemoteAddress, SshOptions, SyncConfig};
use tether_repo::{compat, Bootstrapper, Vcs};

use crate::daemons::DaemonManager;
use crate::error::EngineError;
use crate::phase::{PhaseTracker, SessionPhase};
use crate::reconcile::{CommitPullCycle, ReconcileLoop, WatchRoot};
use crate::watch;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub local_path: PathBuf,
    pub remote: RemoteAddress,
    pub ssh: SshOptions,
}

/// Entry point for the CLI: build a runtime and run the session on it.
pub fn start_blocking(options: SessionOptions) -> Result<(), EngineError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| EngineError::from(io_err("tokio runtime", e)))?;
    runtime.block_on(run(options))
}

/// Entry point for `tether build`: ensure the local toolchain without
/// opening a session. Returns whether a build was performed; `false` means
/// the installed tgit was already current. The sync path is irrelevant
/// here; the bootstrapper only cares about the endpoint's home.
pub fn build_toolchain_blocking() -> Result<bool, EngineError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| EngineError::from(io_err("tokio runtime", e)))?;
    runtime.block_on(async {
        let local = Endpoint::local(EndpointId::Local, std::path::Path::new("."))?;
        Ok(Bootstrapper::new(&local).ensure(&local).await?)
    })
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

pub async fn run(options: SessionOptions) -> Result<(), EngineError> {
    let config = SyncConfig::load()?;
    let local = Endpoint::local(EndpointId::Local, &options.local_path)?;
    let remote = Endpoint::remote(&options.remote, options.ssh).await?;
    info!(local = %local.label(), remote = %remote.label(), "sync session starting");

    let outcome = drive(&config, &local, &remote).await;
    remote.close().await;
    outcome
}

async fn drive(
    config: &SyncConfig,
    local: &Endpoint,
    remote: &Endpoint,
) -> Result<(), EngineError> {
    let mut phase = PhaseTracker::new();

    let bootstrapper = Bootstrapper::new(local);
    bootstrapper.ensure(local).await?;
    bootstrapper.ensure(remote).await?;
    phase.advance(SessionPhase::Bootstrapped)?;

    let local_vcs = Vcs::tgit(local);
    let remote_vcs = Vcs::tgit(remote);
    compat::resolve(&local_vcs, &remote_vcs).await?;
    phase.advance(SessionPhase::CompatResolved)?;

    // Children below are spawned kill-on-drop, so an early return still
    // reaps them; the shutdown calls at the end are the orderly path.
    let daemons = DaemonManager::new(config)
        .start(&local_vcs, &remote_vcs)
        .await?;
    phase.advance(SessionPhase::DaemonsUp)?;

    // The local watcher must be armed on the filter's resolved root: the
    // backend reports events under the registered path, so arming a
    // symlinked root raw would let bookkeeping events escape the filter.
    let local_root = WatchRoot::for_vcs(&local_vcs);
    let remote_root = WatchRoot::for_vcs(&remote_vcs);

    // Watchers attach before the warmup exchange so edits made while it
    // runs are not lost; its own bookkeeping is filtered out by the loop.
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let _local_watcher =
        watch::start_local_watcher(local.role(), &local_root.root, events_tx.clone())?;
    let remote_watcher = watch::spawn_remote_watcher(remote, events_tx)?;

    let cycle = CommitPullCycle::new(local_vcs.clone(), remote_vcs.clone());
    cycle.run(EndpointId::Remote).await?;
    cycle.run(EndpointId::Local).await?;
    phase.advance(SessionPhase::WarmedUp)?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received ctrl-c, shutting down session"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
        let _ = signal_tx.send(());
    });

    phase.advance(SessionPhase::Watching)?;
    let reconcile = ReconcileLoop::new(
        cycle,
        vec![local_root, remote_root],
        config.debounce(),
        config.idle_wait(),
        phase,
    );
    let outcome = reconcile.run(events_rx, shutdown_rx).await;

    remote_watcher.shutdown().await;
    daemons.shutdown().await;
    match outcome {
        Ok(final_phase) => {
            info!(?final_phase, "sync session ended");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
