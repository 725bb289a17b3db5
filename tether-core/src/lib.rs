//! Shared foundation for tether: endpoints, transports, addresses, and
//! configuration.
//!
//! Everything that talks to an endpoint, local or over ssh, goes through
//! [`Endpoint`]; the higher crates never spawn their own processes.

pub mod address;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod paths;
pub mod transfer;

pub use address::RemoteAddress;
pub use config::SyncConfig;
pub use endpoint::{
    CommandOutput, DirState, Endpoint, EndpointId, OsFamily, SshOptions, TransportKind,
};
pub use error::CoreError;
pub use transfer::transfer;
