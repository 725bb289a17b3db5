//! rsync transfers between endpoints.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::endpoint::{shell_quote, Endpoint};
use crate::error::{io_err, CoreError};

/// Copy the contents of `src_dir` into `dst_dir`, deleting anything in the
/// destination the source does not have.
///
/// rsync always runs on the local machine, so at most one of the two
/// endpoints may be remote. The destination's parent is created first;
/// rsync itself only creates the final path component.
pub async fn transfer(
    src: &Endpoint,
    src_dir: &Path,
    dst: &Endpoint,
    dst_dir: &Path,
    excludes: &[&str],
) -> Result<(), CoreError> {
    if src.is_remote() && dst.is_remote() {
        return Err(CoreError::RemoteToRemote {
            src: src.label(),
            dst: dst.label(),
        });
    }
    if let Some(parent) = dst_dir.parent() {
        dst.make_dir_all(parent).await?;
    }

    let mut cmd = Command::new("rsync");
    cmd.arg("-az").arg("--delete");
    for exclude in excludes {
        cmd.arg(format!("--exclude={exclude}"));
    }
    if let Some(invocation) = src.ssh_invocation().or_else(|| dst.ssh_invocation()) {
        let remote_shell = invocation
            .iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ");
        cmd.arg("-e").arg(remote_shell);
    }
    let src_spec = location(src, src_dir);
    let dst_spec = location(dst, dst_dir);
    cmd.arg(&src_spec);
    cmd.arg(&dst_spec);
    cmd.stdin(Stdio::null());

    debug!(src = %src_spec, dst = %dst_spec, "rsync");
    let output = cmd.output().await.map_err(|e| io_err("rsync", e))?;
    if !output.status.success() {
        return Err(CoreError::CommandFailed {
            endpoint: "localhost".to_string(),
            command: format!("rsync {src_spec} {dst_spec}"),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// One side of the transfer: `dir/` locally, `user@host:dir/` over ssh.
/// The trailing slash makes rsync copy contents rather than the directory
/// itself.
fn location(endpoint: &Endpoint, dir: &Path) -> String {
    match endpoint.ssh_target() {
        Some(target) => format!("{target}:{}/", dir.display()),
        None => format!("{}/", dir.display()),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::endpoint::EndpointId;

    use super::*;

    async fn rsync_available() -> bool {
        Command::new("rsync")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn endpoint_at(role: EndpointId, home: &TempDir) -> Endpoint {
        Endpoint::local_at(role, home.path(), home.path().to_path_buf()).expect("endpoint")
    }

    #[tokio::test]
    async fn transfer_mirrors_contents_and_deletes_extras() {
        if !rsync_available().await {
            eprintln!("rsync not installed; skipping");
            return;
        }
        let home = TempDir::new().expect("tempdir");
        let src = endpoint_at(EndpointId::Local, &home);
        let dst = endpoint_at(EndpointId::Remote, &home);

        let src_dir = home.path().join("a");
        let dst_dir = home.path().join("deep").join("b");
        std::fs::create_dir_all(src_dir.join("nested")).expect("mkdir");
        std::fs::write(src_dir.join("keep.txt"), "keep").expect("write");
        std::fs::write(src_dir.join("nested/inner.txt"), "inner").expect("write");
        std::fs::create_dir_all(&dst_dir).expect("mkdir");
        std::fs::write(dst_dir.join("stale.txt"), "stale").expect("write");

        transfer(&src, &src_dir, &dst, &dst_dir, &[])
            .await
            .expect("transfer");

        assert_eq!(
            std::fs::read_to_string(dst_dir.join("keep.txt")).expect("read"),
            "keep"
        );
        assert_eq!(
            std::fs::read_to_string(dst_dir.join("nested/inner.txt")).expect("read"),
            "inner"
        );
        assert!(!dst_dir.join("stale.txt").exists(), "--delete should prune");
    }

    #[tokio::test]
    async fn transfer_honors_excludes() {
        if !rsync_available().await {
            eprintln!("rsync not installed; skipping");
            return;
        }
        let home = TempDir::new().expect("tempdir");
        let src = endpoint_at(EndpointId::Local, &home);
        let dst = endpoint_at(EndpointId::Remote, &home);

        let src_dir = home.path().join("a");
        let dst_dir = home.path().join("b");
        std::fs::create_dir_all(src_dir.join("skipme")).expect("mkdir");
        std::fs::write(src_dir.join("wanted.txt"), "yes").expect("write");
        std::fs::write(src_dir.join("skipme/file"), "no").expect("write");

        transfer(&src, &src_dir, &dst, &dst_dir, &["skipme"])
            .await
            .expect("transfer");

        assert!(dst_dir.join("wanted.txt").exists());
        assert!(!dst_dir.join("skipme").exists());
    }
}
