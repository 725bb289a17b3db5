//! `tether build` — prepare the local tgit toolchain ahead of a session.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tether_core::paths;
use tether_engine::build_toolchain_blocking;

/// Arguments for `tether build`.
#[derive(Args, Debug)]
pub struct BuildArgs {}

impl BuildArgs {
    pub fn run(self) -> Result<()> {
        let built = build_toolchain_blocking().context("toolchain build failed")?;

        let home = dirs::home_dir().context("could not determine home directory")?;
        let exe = paths::tgit_exe(&home);
        if built {
            println!(
                "{} built tgit {} at {}",
                "✓".green().bold(),
                paths::TGIT_VERSION,
                exe.display()
            );
        } else {
            println!(
                "{} tgit {} already built at {}",
                "✓".green().bold(),
                paths::TGIT_VERSION,
                exe.display()
            );
        }
        Ok(())
    }
}
