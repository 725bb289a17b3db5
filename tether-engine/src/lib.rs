//! The tether sync engine: filesystem watchers, daemon wiring, and the
//! debounced reconciliation loop that keeps two endpoints converged.

pub mod daemons;
pub mod error;
pub mod phase;
pub mod reconcile;
pub mod session;
pub mod watch;

pub use error::EngineError;
pub use phase::{PhaseTracker, SessionPhase};
pub use reconcile::{CommitPullCycle, Flusher, PendingChangeSet, ReconcileLoop, WatchRoot};
pub use session::{build_toolchain_blocking, run, start_blocking, SessionOptions};
pub use watch::ChangeEvent;
