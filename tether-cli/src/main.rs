//! Tether — continuous bidirectional folder sync over ssh.
//!
//! # Usage
//!
//! ```text
//! tether sync <local-path> <[user@]host:path> [--transport plain|multiplex] [--identity <key>]
//! tether build
//! tether repo [tgit arguments...]
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{build::BuildArgs, repo::RepoArgs, sync::SyncArgs};
use tether_core::TransportKind;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tether",
    version,
    about = "Keep a local and a remote folder continuously in sync",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync a local folder with a folder on a remote host.
    Sync(SyncArgs),

    /// Build the bundled tgit toolchain for this machine.
    Build(BuildArgs),

    /// Run a raw tgit command against the local install.
    Repo(RepoArgs),
}

// ---------------------------------------------------------------------------
// Shared transport argument — parsed from CLI strings, converts to core type
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse `TransportKind` from CLI args.
#[derive(Debug, Clone, Default)]
pub struct TransportArg(pub TransportKind);

impl FromStr for TransportArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self(TransportKind::Plain)),
            "multiplex" => Ok(Self(TransportKind::Multiplex)),
            other => Err(format!(
                "unknown transport '{other}'; expected: plain, multiplex"
            )),
        }
    }
}

impl fmt::Display for TransportArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            TransportKind::Plain => write!(f, "plain"),
            TransportKind::Multiplex => write!(f, "multiplex"),
        }
    }
}

impl From<TransportArg> for TransportKind {
    fn from(t: TransportArg) -> Self {
        t.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Build(args) => args.run(),
        Commands::Repo(args) => args.run(),
    }
}
