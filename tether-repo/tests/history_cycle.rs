//! Commit/pull behavior against a stock git install.

use std::path::Path;
use std::process::Stdio;

use tempfile::TempDir;

use tether_core::{Endpoint, EndpointId};
use tether_repo::Vcs;

async fn git_available() -> bool {
    tokio::process::Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

fn endpoint(home: &TempDir, role: EndpointId, dir: &str) -> Endpoint {
    Endpoint::local_at(role, &home.path().join(dir), home.path().to_path_buf())
        .expect("local endpoint")
}

async fn clone_repo(home: &TempDir, src: &Path, dst: &Path) {
    let ep = endpoint(home, EndpointId::Local, ".");
    let src = src.display().to_string();
    let dst = dst.display().to_string();
    ep.run(None, &["git", "clone", &src, &dst])
        .await
        .expect("clone");
    // A clone does not carry config over; commits on the clone need an
    // identity of their own.
    for kv in [
        ["user.name", "tether"],
        ["user.email", "tether@localhost"],
        ["commit.gpgsign", "false"],
    ] {
        ep.run(Some(Path::new(&dst)), &["git", "config", kv[0], kv[1]])
            .await
            .expect("config");
    }
}

#[tokio::test]
async fn init_creates_history_with_a_stable_tail() {
    if !git_available().await {
        eprintln!("git not installed; skipping");
        return;
    }
    let home = TempDir::new().expect("tempdir");
    let ep = endpoint(&home, EndpointId::Local, "work");
    let vcs = Vcs::git(&ep);

    assert_eq!(vcs.tail_hash().await.expect("probe"), None);

    vcs.init().await.expect("init");
    let tail = vcs.tail_hash().await.expect("probe").expect("tail after init");
    assert_eq!(vcs.head_hash().await.expect("head").as_deref(), Some(tail.as_str()));

    // A clean tree commits nothing and HEAD stays put.
    assert!(!vcs.commit_all("auto commit").await.expect("commit"));

    std::fs::write(ep.sync_root().join("notes.txt"), "hello").expect("write");
    assert!(vcs.commit_all("auto commit").await.expect("commit"));

    // New commits never move the root of history.
    assert_eq!(vcs.tail_hash().await.expect("probe"), Some(tail));
}

#[tokio::test]
async fn unborn_head_has_no_tail() {
    if !git_available().await {
        eprintln!("git not installed; skipping");
        return;
    }
    let home = TempDir::new().expect("tempdir");
    let ep = endpoint(&home, EndpointId::Local, "bare-init");
    std::fs::create_dir_all(ep.sync_root()).expect("mkdir");
    ep.run(Some(ep.sync_root()), &["git", "init"])
        .await
        .expect("git init");

    let vcs = Vcs::git(&ep);
    assert_eq!(vcs.tail_hash().await.expect("probe"), None);
    assert_eq!(vcs.head_hash().await.expect("probe"), None);
}

#[tokio::test]
async fn pull_carries_commits_in_both_directions() {
    if !git_available().await {
        eprintln!("git not installed; skipping");
        return;
    }
    let home = TempDir::new().expect("tempdir");
    let a_ep = endpoint(&home, EndpointId::Local, "a");
    let b_ep = endpoint(&home, EndpointId::Remote, "b");
    let a = Vcs::git(&a_ep);

    a.init().await.expect("init a");
    clone_repo(&home, a_ep.sync_root(), b_ep.sync_root()).await;
    let b = Vcs::git(&b_ep);
    assert_eq!(
        a.tail_hash().await.expect("a tail"),
        b.tail_hash().await.expect("b tail")
    );

    // a -> b
    std::fs::write(a_ep.sync_root().join("from-a.txt"), "written on a").expect("write");
    assert!(a.commit_all("auto commit").await.expect("commit a"));
    assert!(b.pull().await.expect("pull into b"));
    assert_eq!(
        std::fs::read_to_string(b_ep.sync_root().join("from-a.txt")).expect("read"),
        "written on a"
    );

    // b -> a
    std::fs::write(b_ep.sync_root().join("from-b.txt"), "written on b").expect("write");
    assert!(b.commit_all("auto commit").await.expect("commit b"));
    let b_root = b_ep.sync_root().display().to_string();
    a.set_origin(&b_root).await.expect("wire origin");
    assert!(a.pull().await.expect("pull into a"));
    assert_eq!(
        std::fs::read_to_string(a_ep.sync_root().join("from-b.txt")).expect("read"),
        "written on b"
    );

    // Nothing new: the pull is a quiet no-op.
    assert!(!a.pull().await.expect("idle pull"));
}

#[tokio::test]
async fn pull_prefers_the_incoming_side_on_conflict() {
    if !git_available().await {
        eprintln!("git not installed; skipping");
        return;
    }
    let home = TempDir::new().expect("tempdir");
    let a_ep = endpoint(&home, EndpointId::Local, "a");
    let b_ep = endpoint(&home, EndpointId::Remote, "b");
    let a = Vcs::git(&a_ep);

    a.init().await.expect("init a");
    std::fs::write(a_ep.sync_root().join("shared.txt"), "base\n").expect("write");
    a.commit_all("auto commit").await.expect("commit base");
    clone_repo(&home, a_ep.sync_root(), b_ep.sync_root()).await;
    let b = Vcs::git(&b_ep);

    // Divergent edits to the same line on both sides.
    std::fs::write(a_ep.sync_root().join("shared.txt"), "a version\n").expect("write");
    a.commit_all("auto commit").await.expect("commit a");
    std::fs::write(b_ep.sync_root().join("shared.txt"), "b version\n").expect("write");
    b.commit_all("auto commit").await.expect("commit b");

    assert!(b.pull().await.expect("pull resolves"));
    assert_eq!(
        std::fs::read_to_string(b_ep.sync_root().join("shared.txt")).expect("read"),
        "a version\n",
        "the incoming side wins conflicted lines"
    );
}
