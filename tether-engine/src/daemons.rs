//! Daemon and tunnel wiring.
//!
//! Each endpoint serves its own repository on a loopback-only tgit daemon.
//! A single ssh process carries one forward in each direction, so either
//! side reaches the other's daemon at `localhost:<connect port>`. Pulls are
//! the only traffic; the daemons never accept pushes.

use std::process::Stdio;

use tokio::process::Child;
use tracing::{debug, info, warn};

use tether_core::error::io_err;
use tether_core::{Endpoint, SyncConfig};
use tether_repo::Vcs;

use crate::error::EngineError;

/// Serve the repository in the working directory on a loopback port.
/// `--export-all` trusts the directory because only tunnel traffic can
/// reach the port; upload is implied, receive-pack stays off.
pub fn daemon_argv(exe: &str, port: u16) -> Vec<String> {
    vec![
        exe.to_string(),
        "daemon".to_string(),
        "--export-all".to_string(),
        "--base-path=.".to_string(),
        "--reuseaddr".to_string(),
        "--listen=localhost".to_string(),
        format!("--port={port}"),
        ".".to_string(),
    ]
}

/// Port forwards for the tunnel: `-L` lets this side reach the remote
/// daemon, `-R` lets the remote side reach ours, both on the connect port.
pub fn tunnel_argv(bind_port: u16, connect_port: u16) -> Vec<String> {
    vec![
        "-N".to_string(),
        "-L".to_string(),
        format!("{connect_port}:localhost:{bind_port}"),
        "-R".to_string(),
        format!("{connect_port}:localhost:{bind_port}"),
    ]
}

/// Children owned by a running session. All are spawned kill-on-drop, so
/// an error unwinding the session still reaps them; `shutdown` is the
/// orderly path.
pub struct DaemonSet {
    children: Vec<(String, Child)>,
}

impl DaemonSet {
    /// Children stop in reverse start order: the tunnel first, then the
    /// daemons behind it.
    pub async fn shutdown(mut self) {
        while let Some((label, mut child)) = self.children.pop() {
            match child.kill().await {
                Ok(()) => debug!(%label, "stopped"),
                Err(e) => warn!(%label, error = %e, "failed to stop"),
            }
        }
    }
}

pub struct DaemonManager<'a> {
    config: &'a SyncConfig,
}

impl<'a> DaemonManager<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Start both daemons and the tunnel, then point each repository's
    /// origin at the peer through the forwarded port.
    pub async fn start(&self, local: &Vcs, remote: &Vcs) -> Result<DaemonSet, EngineError> {
        let mut children = Vec::new();
        for vcs in [local, remote] {
            let argv_owned = daemon_argv(vcs.exe(), self.config.daemon_bind_port);
            let argv: Vec<&str> = argv_owned.iter().map(String::as_str).collect();
            let child = vcs.endpoint().spawn(Some(vcs.root()), &argv)?;
            info!(
                endpoint = %vcs.endpoint().label(),
                port = self.config.daemon_bind_port,
                "daemon up"
            );
            children.push((format!("daemon on {}", vcs.endpoint().name()), child));
        }

        let tunnel = spawn_tunnel(
            remote.endpoint(),
            self.config.daemon_bind_port,
            self.config.daemon_connect_port,
        )?;
        info!(port = self.config.daemon_connect_port, "tunnel up");
        children.push(("ssh tunnel".to_string(), tunnel));

        let url = local.daemon_url(self.config.daemon_connect_port);
        local.set_origin(&url).await?;
        remote.set_origin(&url).await?;
        debug!(%url, "origins wired");

        Ok(DaemonSet { children })
    }
}

/// The tunnel rides the same transport as every other remote command, so a
/// multiplexed session needs no second authentication.
fn spawn_tunnel(remote: &Endpoint, bind_port: u16, connect_port: u16) -> Result<Child, EngineError> {
    let (Some(invocation), Some(target)) = (remote.ssh_invocation(), remote.ssh_target()) else {
        return Err(EngineError::TunnelRequiresSsh {
            endpoint: remote.name().to_string(),
        });
    };
    let mut cmd = tokio::process::Command::new(&invocation[0]);
    cmd.args(&invocation[1..]);
    cmd.args(tunnel_argv(bind_port, connect_port));
    cmd.arg(target);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);
    cmd.spawn().map_err(|e| io_err("ssh tunnel", e).into())
}
