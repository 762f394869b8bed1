use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use log::{debug, warn};
use tokio::{runtime::Handle, sync::oneshot, time::sleep};

use super::{
    ClearanceBarrier, ClearanceOutcome, ClearancePath, ClearanceStats, ClearanceStatsSnapshot,
    OnceGuard, SessionScope, StorageClearOptions,
};
use crate::{
    callbacks::{ClearableSession, ExitAction, HandlerResponse, ShutdownPath, ShutdownTrigger},
    client::ShellSessionsConfiguration,
    error::ShellError,
};

/// Every barrier a sequence ran, in order.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct SequenceReport {
    pub outcomes: Vec<ClearanceOutcome>,
}

impl SequenceReport {
    pub fn fully_cleared(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| outcome.path == ClearancePath::Completed)
    }
}

struct ClearanceTarget {
    scope: SessionScope,
    session: Option<Arc<dyn ClearableSession>>,
}

/// Decrements the in flight count when a sequence ends, however it ends.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count.clone())
    }

    /// Enters only if nothing else is running.
    fn reserve(count: &Arc<AtomicUsize>) -> Option<Self> {
        count
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(count.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Runs the host action for one coordinator run, at most once.
struct ExitOnce {
    trigger: ShutdownTrigger,
    guard: OnceGuard,
    action: Arc<dyn ExitAction>,
    stats: Arc<ClearanceStats>,
    done: Mutex<Option<oneshot::Sender<ShutdownPath>>>,
}

impl ExitOnce {
    fn fire(&self, path: ShutdownPath) -> bool {
        let trigger = self.trigger;

        if !self.guard.try_claim() {
            debug!("{trigger:?} already handed over, {path:?} path ignored");
            return false;
        }

        match path {
            ShutdownPath::Completed => {
                debug!("Cache and StorageData cleared, now continuing {trigger:?}...")
            }
            ShutdownPath::Forced => {
                warn!("Cache and StorageData clearance waited enough => forcing {trigger:?}...")
            }
        }

        self.stats.record_sequence(path);
        self.action.perform(trigger, path);

        if let Some(done) = self.done.lock().unwrap().take() {
            let _ = done.send(path);
        }

        true
    }
}

/// Sequences one [ClearanceBarrier] per session scope and guarantees the
/// exit/continue action runs once, within the outer deadline.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    targets: Arc<Vec<ClearanceTarget>>,
    options: StorageClearOptions,
    clearance_timeout: Duration,
    shutdown_timeout: Duration,
    stats: Arc<ClearanceStats>,
    in_flight: Arc<AtomicUsize>,
}

impl ShutdownCoordinator {
    pub fn new(config: &ShellSessionsConfiguration) -> Self {
        let targets = config
            .clearance_order
            .scopes()
            .into_iter()
            .map(|scope| ClearanceTarget {
                scope,
                session: match scope {
                    SessionScope::Default => config.default_session.clone(),
                    SessionScope::Webview => config.webview_session.clone(),
                },
            })
            .collect();

        Self {
            targets: Arc::new(targets),
            options: config.storage_options.clone(),
            clearance_timeout: Duration::from_millis(config.clearance_timeout_ms),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            stats: Arc::default(),
            in_flight: Arc::default(),
        }
    }

    /// True while any clearance sequence is still running, including ones
    /// whose action was already forced by the outer deadline.
    pub fn is_clearing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub fn stats(&self) -> ClearanceStatsSnapshot {
        self.stats.snapshot()
    }

    /// Clears every scope in order. A stage only starts once the previous
    /// barrier resolved, timed out or not.
    pub async fn clear_sessions(&self) -> SequenceReport {
        self.clear_with(InFlight::enter(&self.in_flight)).await
    }

    /// Like [ShutdownCoordinator::clear_sessions], but refuses to start while
    /// another sequence is still running.
    pub async fn try_clear_sessions(&self) -> Result<SequenceReport, ShellError> {
        let in_flight =
            InFlight::reserve(&self.in_flight).ok_or(ShellError::ClearanceInProgress)?;
        Ok(self.clear_with(in_flight).await)
    }

    async fn clear_with(&self, _in_flight: InFlight) -> SequenceReport {
        let mut outcomes = Vec::with_capacity(self.targets.len());

        for target in self.targets.iter() {
            let barrier = ClearanceBarrier::new(
                target.scope,
                target.session.clone(),
                self.options.clone(),
                self.clearance_timeout,
            );

            let outcome = barrier.run().await;
            self.stats.record_barrier(outcome.path);
            outcomes.push(outcome);
        }

        SequenceReport { outcomes }
    }

    /// Clears every scope, then performs `action`. If the sequence has not
    /// finished within the outer deadline the action is forced. Either way it
    /// runs exactly once, and a sequence outliving the deadline keeps going in
    /// the background.
    pub async fn run(&self, trigger: ShutdownTrigger, action: Arc<dyn ExitAction>) -> ShutdownPath {
        self.run_with(InFlight::enter(&self.in_flight), trigger, action).await
    }

    /// Like [ShutdownCoordinator::run], but refuses to start while another
    /// sequence is still running.
    pub async fn try_run(
        &self,
        trigger: ShutdownTrigger,
        action: Arc<dyn ExitAction>,
    ) -> Result<ShutdownPath, ShellError> {
        let in_flight =
            InFlight::reserve(&self.in_flight).ok_or(ShellError::ClearanceInProgress)?;
        Ok(self.run_with(in_flight, trigger, action).await)
    }

    async fn run_with(
        &self,
        in_flight: InFlight,
        trigger: ShutdownTrigger,
        action: Arc<dyn ExitAction>,
    ) -> ShutdownPath {
        let (done, handed_over) = oneshot::channel();
        let exit = Arc::new(ExitOnce {
            trigger,
            guard: OnceGuard::new(),
            action,
            stats: self.stats.clone(),
            done: Mutex::new(Some(done)),
        });

        {
            let coordinator = self.clone();
            let exit = exit.clone();
            tokio::spawn(async move {
                let report = coordinator.clear_with(in_flight).await;
                if !exit.fire(ShutdownPath::Completed) {
                    debug!(
                        "{trigger:?} clearance finished late, fully cleared: {}",
                        report.fully_cleared()
                    );
                }
            });
        }

        {
            let exit = exit.clone();
            let timeout = self.shutdown_timeout;
            tokio::spawn(async move {
                sleep(timeout).await;
                exit.fire(ShutdownPath::Forced);
            });
        }

        handed_over.await.unwrap_or(ShutdownPath::Forced)
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scopes: Vec<_> = self.targets.iter().map(|target| target.scope).collect();
        f.debug_struct("ShutdownCoordinator")
            .field("scopes", &scopes)
            .field("clearance_timeout", &self.clearance_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

/// A will-quit listener. The first exit intent it sees is deferred until the
/// sessions are cleared, after which the subscription is spent and lets
/// every later exit intent through.
#[derive(uniffi::Object)]
pub struct WillQuitSubscription {
    coordinator: ShutdownCoordinator,
    action: Arc<dyn ExitAction>,
    runtime: Handle,
    spent: OnceGuard,
}

impl WillQuitSubscription {
    pub(crate) fn new(
        coordinator: ShutdownCoordinator,
        action: Arc<dyn ExitAction>,
        runtime: Handle,
    ) -> Self {
        Self {
            coordinator,
            action,
            runtime,
            spent: OnceGuard::new(),
        }
    }
}

#[uniffi::export]
impl WillQuitSubscription {
    /// Call from the host's will-quit hook and honour the response.
    pub fn on_will_quit(&self) -> HandlerResponse {
        if !self.spent.try_claim() {
            debug!("app will quit");
            return HandlerResponse::Default;
        }

        debug!("app will quit, clearing sessions first");

        let coordinator = self.coordinator.clone();
        let action = self.action.clone();
        self.runtime.spawn(async move {
            coordinator.run(ShutdownTrigger::WillQuit, action).await;
        });

        HandlerResponse::PreventDefault
    }

    pub fn unsubscribe(&self) {
        if self.spent.try_claim() {
            debug!("will-quit subscription removed");
        }
    }

    pub fn is_active(&self) -> bool {
        !self.spent.is_claimed()
    }
}
