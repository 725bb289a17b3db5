//! Session lifecycle phases.
//!
//! A session moves strictly forward through setup, then alternates between
//! watching and flushing until something ends it. The tracker turns an
//! out-of-order transition into an error instead of undefined behavior.

use tracing::debug;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Endpoints constructed, nothing verified yet.
    Init,
    /// Both endpoints hold a working tgit at the pinned version.
    Bootstrapped,
    /// Both endpoints hold repositories with a shared root commit.
    CompatResolved,
    /// Daemons and the tunnel are up, origins are wired.
    DaemonsUp,
    /// Changes from before the session started have been exchanged.
    WarmedUp,
    /// Waiting for filesystem events.
    Watching,
    /// Draining pending endpoints through commit/pull cycles.
    Flushing,
    /// Session over; processes stopped or stopping.
    Terminated,
}

impl SessionPhase {
    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        if next == Terminated {
            return self != Terminated;
        }
        matches!(
            (self, next),
            (Init, Bootstrapped)
                | (Bootstrapped, CompatResolved)
                | (CompatResolved, DaemonsUp)
                | (DaemonsUp, WarmedUp)
                | (WarmedUp, Watching)
                | (Watching, Flushing)
                | (Flushing, Watching)
        )
    }
}

#[derive(Debug)]
pub struct PhaseTracker {
    current: SessionPhase,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: SessionPhase::Init,
        }
    }

    pub fn current(&self) -> SessionPhase {
        self.current
    }

    pub fn advance(&mut self, next: SessionPhase) -> Result<(), EngineError> {
        if !self.current.can_advance_to(next) {
            return Err(EngineError::PhaseViolation {
                from: self.current,
                to: next,
            });
        }
        debug!(from = ?self.current, to = ?next, "phase");
        self.current = next;
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl PhaseTracker {
    pub(crate) fn at(phase: SessionPhase) -> Self {
        Self { current: phase }
    }
}
