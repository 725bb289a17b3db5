//! Repository management for tether: building the tgit toolchain, probing
//! and reconciling histories, and the commit/pull primitives the sync
//! engine drives.

pub mod bootstrap;
pub mod compat;
pub mod error;
pub mod mirror;
pub mod vcs;

pub use bootstrap::Bootstrapper;
pub use compat::{plan, resolve, CompatPlan};
pub use error::RepoError;
pub use mirror::mirror;
pub use vcs::Vcs;
