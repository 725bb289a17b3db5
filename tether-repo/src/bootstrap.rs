//! Ensuring the pinned tgit build exists on an endpoint.
//!
//! The source tree is prepared once on the local side (cloned from upstream
//! and checked out at the pinned tag) and seeded to remote endpoints with
//! rsync, so a remote box needs a compiler but neither network access nor
//! a git install. Builds land under `~/.tether/dist`.

use tracing::{debug, info};

use tether_core::{paths, transfer, CoreError, Endpoint};

use crate::error::RepoError;

/// Upstream metadata and the test suite are dead weight on the wire.
const SOURCE_SEED_EXCLUDES: &[&str] = &[".git", "t"];

pub struct Bootstrapper<'a> {
    local: &'a Endpoint,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(local: &'a Endpoint) -> Self {
        Self { local }
    }

    /// Make sure `target` has a working tgit at the pinned version,
    /// building one if necessary. Returns whether a build was performed.
    pub async fn ensure(&self, target: &Endpoint) -> Result<bool, RepoError> {
        if installed_version_current(target).await? {
            debug!(endpoint = %target.name(), version = paths::TGIT_VERSION, "tgit up to date");
            return Ok(false);
        }
        info!(endpoint = %target.name(), version = paths::TGIT_VERSION, "building tgit");
        self.prepare_local_source().await?;
        if target.is_remote() {
            self.seed_remote_source(target).await?;
        }
        self.build(target).await?;
        if !installed_version_current(target).await? {
            return Err(RepoError::BuildFailed {
                endpoint: target.name().to_string(),
                reason: format!("installed tgit does not report {}", paths::TGIT_VERSION),
            });
        }
        Ok(true)
    }

    /// Clone the upstream fork into `~/.tether/src` and put the tree at the
    /// pinned tag. Fetches only when the tag is unknown locally, so offline
    /// rebuilds keep working.
    async fn prepare_local_source(&self) -> Result<(), RepoError> {
        let src = paths::src_dir(self.local.home());
        if !self.local.path_exists(&src.join(".git")).await? {
            self.local
                .make_dir_all(&paths::tether_root(self.local.home()))
                .await?;
            let src_str = src.display().to_string();
            self.local
                .run(None, &["git", "clone", paths::TGIT_UPSTREAM_URL, &src_str])
                .await?;
        }
        let checkout = self
            .local
            .run_unchecked(Some(&src), &["git", "checkout", paths::TGIT_VERSION])
            .await?;
        if !checkout.success() {
            self.local
                .run(Some(&src), &["git", "fetch", "--tags", "origin"])
                .await?;
            self.local
                .run(Some(&src), &["git", "checkout", paths::TGIT_VERSION])
                .await?;
        }
        Ok(())
    }

    async fn seed_remote_source(&self, target: &Endpoint) -> Result<(), RepoError> {
        let local_src = paths::src_dir(self.local.home());
        let target_src = paths::src_dir(target.home());
        transfer(
            self.local,
            &local_src,
            target,
            &target_src,
            SOURCE_SEED_EXCLUDES,
        )
        .await?;
        Ok(())
    }

    async fn build(&self, target: &Endpoint) -> Result<(), RepoError> {
        let src = paths::src_dir(target.home());
        let prefix = format!("prefix={}", paths::dist_dir(target.home()).display());
        target
            .run(
                Some(&src),
                &["make", &prefix, "NO_TCLTK=1", "NO_GETTEXT=1", "install"],
            )
            .await?;
        Ok(())
    }
}

/// Probe `tgit version` on the endpoint. A missing binary, a failing run,
/// and a version mismatch all mean a build is needed.
async fn installed_version_current(target: &Endpoint) -> Result<bool, RepoError> {
    let exe = paths::tgit_exe(target.home()).display().to_string();
    // The build machinery derives the version string from the tag with its
    // leading `v` stripped, so `tgit version` reports `2.45.1` for `v2.45.1`.
    let pinned = paths::TGIT_VERSION.trim_start_matches('v');
    match target.run_unchecked(None, &[&exe, "version"]).await {
        Ok(out) if out.success() => Ok(out.stdout.contains(pinned)),
        Ok(_) => Ok(false),
        Err(CoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
