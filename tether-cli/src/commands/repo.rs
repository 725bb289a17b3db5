//! `tether repo` — passthrough to the bundled tgit install, building it
//! on demand.

use std::process::Command;

use anyhow::{Context, Result};
use clap::Args;

use tether_core::paths;
use tether_engine::build_toolchain_blocking;

/// Arguments for `tether repo`.
#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Arguments passed to tgit verbatim.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl RepoArgs {
    pub fn run(self) -> Result<()> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let exe = paths::tgit_exe(&home);
        if !exe.exists() {
            build_toolchain_blocking().context("toolchain build failed")?;
        }

        let status = Command::new(&exe)
            .args(&self.args)
            .status()
            .with_context(|| format!("failed to run {}", exe.display()))?;
        if !status.success() {
            std::process::exit(status.code().unwrap_or(1));
        }
        Ok(())
    }
}
