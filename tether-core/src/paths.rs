//! Constants and path helpers for the per-endpoint state root.
//!
//! Every endpoint keeps its tether state under `<home>/.tether/`:
//!
//! ```text
//! ~/.tether/
//!   src/           prepared tgit source tree, checked out at TGIT_VERSION
//!   dist/          installed tgit (dist/bin/tgit)
//!   config.yaml    optional overrides, see the `config` module
//! ```
//!
//! Helpers take the home directory explicitly so tests can point them at a
//! temporary directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pinned tgit release tag. Builds report the version with the tag's
/// leading `v` stripped; an install reporting anything else gets rebuilt.
pub const TGIT_VERSION: &str = "v2.45.1";

/// Upstream of the tgit fork, cloned during source preparation.
pub const TGIT_UPSTREAM_URL: &str = "https://github.com/tethersync/tgit.git";

/// Repository metadata directory managed by tgit inside the sync root.
pub const REPO_DIR_NAME: &str = ".tgit";

/// Ignore file consulted by tgit at the top of the sync root.
pub const IGNORE_FILE_NAME: &str = ".tgitignore";

/// Branch both sides commit to and pull from.
pub const SYNC_BRANCH: &str = "master";

/// Loopback port each tgit daemon binds on its own endpoint.
pub const DAEMON_BIND_PORT: u16 = 42317;

/// Forwarded port through which the peer's daemon is reached. Once the
/// tunnel is up, `tgit://localhost:<port>/` on either side serves the other
/// endpoint's repository.
pub const DAEMON_CONNECT_PORT: u16 = 42318;

/// Quiet period after the last filesystem event before pending endpoints
/// are flushed.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Event wait when no endpoint is pending; effectively forever next to a
/// sync session.
pub const IDLE_WAIT: Duration = Duration::from_secs(10_000);

/// `<home>/.tether`
pub fn tether_root(home: &Path) -> PathBuf {
    home.join(".tether")
}

/// `<home>/.tether/src`
pub fn src_dir(home: &Path) -> PathBuf {
    tether_root(home).join("src")
}

/// `<home>/.tether/dist`
pub fn dist_dir(home: &Path) -> PathBuf {
    tether_root(home).join("dist")
}

/// `<home>/.tether/dist/bin/tgit`
pub fn tgit_exe(home: &Path) -> PathBuf {
    dist_dir(home).join("bin").join("tgit")
}

/// `<home>/.tether/config.yaml`
pub fn config_path(home: &Path) -> PathBuf {
    tether_root(home).join("config.yaml")
}
