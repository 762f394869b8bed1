use std::{sync::Arc, time::Duration};

use futures::{pin_mut, select, FutureExt};
use log::{debug, warn};
use tokio::{
    sync::mpsc,
    time::{sleep, Instant},
};

use super::{ClearanceKind, ClearanceSignal, SessionScope, StorageClearOptions};
use crate::callbacks::ClearableSession;

/// How a barrier resolved.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearancePath {
    /// Both operations signalled before the deadline.
    Completed,
    /// The deadline expired first.
    TimedOut,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct ClearanceOutcome {
    pub scope: SessionScope,
    pub path: ClearancePath,
    pub cache_cleared: bool,
    pub storage_cleared: bool,
    pub elapsed_ms: u64,
}

enum Wake {
    Signal(Option<ClearanceKind>),
    Deadline,
}

/// Clears the cache and storage of one session concurrently and resolves
/// once, either when both report back or when the deadline expires.
pub struct ClearanceBarrier {
    scope: SessionScope,
    session: Option<Arc<dyn ClearableSession>>,
    options: StorageClearOptions,
    timeout: Duration,
}

impl ClearanceBarrier {
    pub fn new(
        scope: SessionScope,
        session: Option<Arc<dyn ClearableSession>>,
        options: StorageClearOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            scope,
            session,
            options,
            timeout,
        }
    }

    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    /// Starts both operations and waits for the barrier to resolve.
    ///
    /// An absent session signals both halves immediately, so the barrier
    /// resolves through the normal path without waiting on the deadline.
    pub async fn run(self) -> ClearanceOutcome {
        let scope = self.scope;
        let started = Instant::now();
        let (completions, mut rx) = mpsc::unbounded_channel();

        let cache = Arc::new(ClearanceSignal::new(
            scope,
            ClearanceKind::Cache,
            completions.clone(),
        ));
        let storage = Arc::new(ClearanceSignal::new(
            scope,
            ClearanceKind::Storage,
            completions,
        ));

        match &self.session {
            Some(session) => {
                session.clear_cache(cache);
                session.clear_storage(self.options.clone(), storage);
            }
            None => {
                debug!("No session for {scope}, nothing to clear");
                cache.signal();
                storage.signal();
            }
        }

        let mut cache_cleared = false;
        let mut storage_cleared = false;

        let deadline = sleep(self.timeout).fuse();
        pin_mut!(deadline);

        let path = loop {
            if cache_cleared && storage_cleared {
                break ClearancePath::Completed;
            }

            let wake = {
                let next = rx.recv().fuse();
                pin_mut!(next);

                select! {
                    kind = next => Wake::Signal(kind),
                    _ = deadline => Wake::Deadline,
                }
            };

            match wake {
                Wake::Signal(Some(ClearanceKind::Cache)) => cache_cleared = true,
                Wake::Signal(Some(ClearanceKind::Storage)) => storage_cleared = true,
                Wake::Signal(None) => {
                    // every outstanding signal was released unfired
                    warn!("Clearance signals for {scope} were dropped, waiting out the deadline");
                    deadline.as_mut().await;
                    break ClearancePath::TimedOut;
                }
                Wake::Deadline => break ClearancePath::TimedOut,
            }
        };

        match path {
            ClearancePath::Completed => debug!("Cache and StorageData cleared {scope}"),
            ClearancePath::TimedOut => warn!(
                "Cache and StorageData clearance waited enough {scope} (cache: {cache_cleared}, storage: {storage_cleared}) => moving on"
            ),
        }

        ClearanceOutcome {
            scope,
            path,
            cache_cleared,
            storage_cleared,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

impl std::fmt::Debug for ClearanceBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearanceBarrier")
            .field("scope", &self.scope)
            .field("session", &self.session.is_some().then_some("..."))
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish()
    }
}
