//! The tgit command surface, bound to one endpoint's sync root.
//!
//! Every operation shells out to the endpoint's tgit binary with the sync
//! root as working directory. The same surface can drive a stock git
//! install (see [`Vcs::git`]), which is how the integration tests exercise
//! repository behavior without a prepared toolchain.

use std::path::{Path, PathBuf};

use tracing::debug;

use tether_core::{paths, CommandOutput, Endpoint};

use crate::error::RepoError;

/// Ignore entries seeded into a fresh repository. Finder metadata is the
/// classic source of ping-pong commits between a Mac and a Linux box.
const DEFAULT_IGNORE: &str = ".DS_Store\n._*\n";

#[derive(Debug, Clone)]
pub struct Vcs {
    endpoint: Endpoint,
    exe: String,
    root: PathBuf,
    scheme: &'static str,
    meta_dir: &'static str,
    ignore_file: &'static str,
}

impl Vcs {
    /// Bind the endpoint's bundled tgit to its sync root.
    pub fn tgit(endpoint: &Endpoint) -> Self {
        Self {
            endpoint: endpoint.clone(),
            exe: paths::tgit_exe(endpoint.home()).display().to_string(),
            root: endpoint.sync_root().to_path_buf(),
            scheme: "tgit",
            meta_dir: paths::REPO_DIR_NAME,
            ignore_file: paths::IGNORE_FILE_NAME,
        }
    }

    /// Drive a stock git install instead of the bundled tgit. Behavior is
    /// identical; only the executable, url scheme, and metadata names
    /// change.
    pub fn git(endpoint: &Endpoint) -> Self {
        Self {
            endpoint: endpoint.clone(),
            exe: "git".to_string(),
            root: endpoint.sync_root().to_path_buf(),
            scheme: "git",
            meta_dir: ".git",
            ignore_file: ".gitignore",
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn exe(&self) -> &str {
        &self.exe
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> &'static str {
        self.meta_dir
    }

    /// `<root>/<meta dir>`, the directory mirrored between endpoints.
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join(self.meta_dir)
    }

    /// Url under which a loopback daemon on `port` serves this repository.
    pub fn daemon_url(&self, port: u16) -> String {
        format!("{}://localhost:{port}/", self.scheme)
    }

    /// Whether a repository exists at the sync root.
    pub async fn exists(&self) -> Result<bool, RepoError> {
        Ok(self.endpoint.path_exists(&self.repo_dir()).await?)
    }

    /// Create a repository at the sync root with a first commit, so the
    /// history has a root hash other endpoints can be compared against.
    /// The branch is pinned to `master` regardless of the binary's default.
    pub async fn init(&self) -> Result<(), RepoError> {
        debug!(endpoint = %self.endpoint.label(), "initializing repository");
        self.endpoint.make_dir_all(&self.root).await?;
        self.run(&["init"]).await?;
        let branch_ref = format!("refs/heads/{}", paths::SYNC_BRANCH);
        self.run(&["symbolic-ref", "HEAD", &branch_ref]).await?;
        self.run(&["config", "user.name", "tether"]).await?;
        self.run(&["config", "user.email", "tether@localhost"]).await?;
        self.run(&["config", "commit.gpgsign", "false"]).await?;
        self.endpoint
            .write_file(&self.root.join(self.ignore_file), DEFAULT_IGNORE)
            .await?;
        self.run(&["add", "--all", "."]).await?;
        self.run(&["commit", "-m", "initial commit"]).await?;
        Ok(())
    }

    /// Identity of this history: the root commit(s) of HEAD, or `None` when
    /// there is no repository or no commit yet. Two endpoints can sync iff
    /// their tail hashes are equal.
    pub async fn tail_hash(&self) -> Result<Option<String>, RepoError> {
        if !self.exists().await? {
            return Ok(None);
        }
        let out = self
            .run_unchecked(&["rev-list", "--max-parents=0", "HEAD"])
            .await?;
        let tail = out.stdout.trim();
        Ok((!tail.is_empty()).then(|| tail.to_string()))
    }

    /// Current HEAD commit, or `None` on an unborn branch.
    pub async fn head_hash(&self) -> Result<Option<String>, RepoError> {
        let out = self.run_unchecked(&["rev-parse", "HEAD"]).await?;
        if !out.success() {
            return Ok(None);
        }
        let head = out.stdout.trim();
        Ok((!head.is_empty()).then(|| head.to_string()))
    }

    /// Stage everything and commit. Returns whether HEAD moved; a cycle
    /// where nothing was actually dirty is a quiet no-op, not an error.
    pub async fn commit_all(&self, message: &str) -> Result<bool, RepoError> {
        let before = self.head_hash().await?;
        self.run(&["add", "--all", "."]).await?;
        let _ = self.run_unchecked(&["commit", "-m", message]).await?;
        let after = self.head_hash().await?;
        Ok(after != before)
    }

    /// Fetch from origin and merge its branch, preferring the incoming side
    /// wherever both endpoints touched the same lines. Returns whether HEAD
    /// moved.
    pub async fn pull(&self) -> Result<bool, RepoError> {
        let before = self.head_hash().await?;
        self.run(&["fetch", "origin"]).await?;
        let merge_ref = format!("origin/{}", paths::SYNC_BRANCH);
        self.run(&[
            "merge",
            &merge_ref,
            "--strategy=recursive",
            "--strategy-option=theirs",
            "--no-edit",
        ])
        .await?;
        let after = self.head_hash().await?;
        Ok(after != before)
    }

    /// Point `origin` at the peer, replacing any previous remote so a
    /// repeated session converges on the current wiring.
    pub async fn set_origin(&self, url: &str) -> Result<(), RepoError> {
        let _ = self.run_unchecked(&["remote", "remove", "origin"]).await?;
        self.run(&["remote", "add", "origin", url]).await?;
        Ok(())
    }

    /// Force the working tree and index to the given commit.
    pub async fn hard_reset(&self, commit: &str) -> Result<(), RepoError> {
        self.run(&["reset", "--hard", commit]).await?;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<String, RepoError> {
        let mut argv = vec![self.exe.as_str()];
        argv.extend_from_slice(args);
        Ok(self.endpoint.run(Some(&self.root), &argv).await?)
    }

    async fn run_unchecked(&self, args: &[&str]) -> Result<CommandOutput, RepoError> {
        let mut argv = vec![self.exe.as_str()];
        argv.extend_from_slice(args);
        Ok(self.endpoint.run_unchecked(Some(&self.root), &argv).await?)
    }
}
