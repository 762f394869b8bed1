use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::mpsc;

use super::SessionScope;

/// A flag which can be claimed exactly once, from any thread.
#[derive(Debug, Default)]
pub struct OnceGuard {
    claimed: AtomicBool,
}

impl OnceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for the first caller only.
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// The two halves of a session clearance.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearanceKind {
    Cache,
    Storage,
}

/// Completion handle handed to the host with each clearance request.
///
/// Only the first call to [ClearanceSignal::signal] counts. Calls arriving
/// after that, or after the owning barrier resolved, are observed and dropped.
#[derive(uniffi::Object)]
pub struct ClearanceSignal {
    scope: SessionScope,
    kind: ClearanceKind,
    fired: OnceGuard,
    completions: mpsc::UnboundedSender<ClearanceKind>,
}

impl ClearanceSignal {
    pub(crate) fn new(
        scope: SessionScope,
        kind: ClearanceKind,
        completions: mpsc::UnboundedSender<ClearanceKind>,
    ) -> Self {
        Self {
            scope,
            kind,
            fired: OnceGuard::new(),
            completions,
        }
    }
}

#[uniffi::export]
impl ClearanceSignal {
    /// Reports that the clearance operation finished, successfully or not.
    pub fn signal(&self) {
        if !self.fired.try_claim() {
            debug!("Duplicate {:?} signal ignored - {}", self.kind, self.scope);
            return;
        }

        match self.kind {
            ClearanceKind::Cache => debug!("SESSION CACHE CLEARED - {}", self.scope),
            ClearanceKind::Storage => debug!("SESSION STORAGE DATA CLEARED - {}", self.scope),
        }

        if self.completions.send(self.kind).is_err() {
            debug!(
                "{:?} signal arrived after the barrier resolved - {}",
                self.kind, self.scope
            );
        }
    }

    pub fn kind(&self) -> ClearanceKind {
        self.kind
    }

    pub fn scope(&self) -> SessionScope {
        self.scope
    }
}

impl std::fmt::Debug for ClearanceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearanceSignal")
            .field("scope", &self.scope)
            .field("kind", &self.kind)
            .field("fired", &self.fired.is_claimed())
            .finish()
    }
}
