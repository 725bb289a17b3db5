//! `tether sync` — run a sync session until interrupted.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use tether_core::{RemoteAddress, SshOptions};
use tether_engine::{start_blocking, EngineError, SessionOptions};
use tether_repo::RepoError;

use crate::TransportArg;

/// Arguments for `tether sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Local folder to sync. Created on first sync if missing.
    pub local_path: PathBuf,

    /// Remote side as `[user@]host:path`; a relative path is resolved
    /// against the remote home directory.
    pub remote: RemoteAddress,

    /// How remote commands reach the host: one ssh connection per command,
    /// or one shared multiplexed connection.
    #[arg(long, default_value_t = TransportArg::default())]
    pub transport: TransportArg,

    /// Identity file handed to ssh.
    #[arg(long)]
    pub identity: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        println!(
            "{} {} {}",
            self.local_path.display().to_string().cyan(),
            "<->".bold(),
            self.remote.to_string().cyan()
        );

        let options = SessionOptions {
            local_path: self.local_path,
            remote: self.remote.clone(),
            ssh: SshOptions {
                transport: self.transport.into(),
                identity: self.identity,
            },
        };
        match start_blocking(options) {
            Ok(()) => {
                println!("{} session ended", "✓".green().bold());
                Ok(())
            }
            Err(EngineError::Repo(RepoError::IncompatibleRepos { local, remote })) => {
                eprintln!("{}", refusal_report(&local, &remote));
                bail!("sync session with {} refused", self.remote);
            }
            Err(e) => {
                Err(e).with_context(|| format!("sync session with {} failed", self.remote))
            }
        }
    }
}

/// The unrelated-histories refusal, with both root commits called out so
/// the user can tell which side holds which history.
fn refusal_report(local: &str, remote: &str) -> String {
    format!(
        "{} cannot sync unrelated histories:\n  local root commit  [{}]\n  remote root commit [{}]\n  move one side away and re-run",
        "✗".red().bold(),
        local.yellow(),
        remote.yellow(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_report_names_both_root_commits() {
        let report = refusal_report("aaaa1111", "bbbb2222");
        assert!(report.contains("aaaa1111"));
        assert!(report.contains("bbbb2222"));
        assert!(report.contains("cannot sync unrelated histories"));
        assert!(report.contains("move one side away"));
    }
}
