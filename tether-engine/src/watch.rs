//! Filesystem watchers feeding the reconciliation loop.
//!
//! The local sync root is watched in-process with `notify`. The remote root
//! is watched by spawning the platform's watch tool over ssh and streaming
//! its stdout; one line is one changed path. Both feed the same unbounded
//! channel, tagged with the endpoint they came from.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tether_core::{Endpoint, EndpointId, OsFamily};

use crate::error::EngineError;

/// A single changed path on one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub endpoint: EndpointId,
    pub path: PathBuf,
}

/// Watch a local directory tree. The returned watcher must stay alive for
/// the watch to continue; dropping it detaches cleanly.
pub fn start_local_watcher(
    endpoint: EndpointId,
    root: &Path,
    tx: mpsc::UnboundedSender<ChangeEvent>,
) -> Result<RecommendedWatcher, EngineError> {
    let mut watcher = notify::recommended_watcher(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                for path in event.paths {
                    let _ = tx.send(ChangeEvent { endpoint, path });
                }
            }
            Err(e) => warn!(error = %e, "local watch error"),
        },
    )
    .map_err(|e| EngineError::WatcherInit {
        endpoint: "localhost".to_string(),
        source: e,
    })?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| EngineError::WatcherInit {
            endpoint: "localhost".to_string(),
            source: e,
        })?;
    debug!(root = %root.display(), "local watcher attached");
    Ok(watcher)
}

/// The watch tool invocation for a remote endpoint, one changed path per
/// stdout line.
pub fn remote_watch_argv(os: OsFamily, root: &Path) -> Vec<String> {
    let root = root.display().to_string();
    match os {
        OsFamily::Linux => vec![
            "inotifywait".to_string(),
            "--quiet".to_string(),
            "--monitor".to_string(),
            "--recursive".to_string(),
            "--format".to_string(),
            "%w%f".to_string(),
            "--event".to_string(),
            "modify,attrib,move,create,delete".to_string(),
            root,
        ],
        OsFamily::Darwin => vec!["fswatch".to_string(), root],
    }
}

/// A watch process running on the remote endpoint, plus the task pumping
/// its stdout into the event channel.
pub struct RemoteWatcher {
    child: Child,
    pump: JoinHandle<()>,
}

impl RemoteWatcher {
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill remote watch process");
        }
        self.pump.abort();
    }
}

pub fn spawn_remote_watcher(
    endpoint: &Endpoint,
    tx: mpsc::UnboundedSender<ChangeEvent>,
) -> Result<RemoteWatcher, EngineError> {
    let argv_owned = remote_watch_argv(endpoint.os(), endpoint.sync_root());
    let argv: Vec<&str> = argv_owned.iter().map(String::as_str).collect();
    let mut child = endpoint.spawn(None, &argv)?;
    let Some(stdout) = child.stdout.take() else {
        return Err(EngineError::WatcherPipe {
            endpoint: endpoint.name().to_string(),
        });
    };
    let role = endpoint.role();
    let name = endpoint.name().to_string();
    debug!(endpoint = %name, "remote watcher attached");
    let pump = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let path = line.trim();
            if path.is_empty() {
                continue;
            }
            let _ = tx.send(ChangeEvent {
                endpoint: role,
                path: PathBuf::from(path),
            });
        }
        debug!(endpoint = %name, "remote watch stream ended");
    });
    Ok(RemoteWatcher { child, pump })
}
