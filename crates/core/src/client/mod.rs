mod config;
mod logging;

#[cfg(test)]
mod tests;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub use config::*;
use log::debug;
use logging::*;
use tokio::runtime::Handle;

use crate::{
    callbacks::*,
    error::ShellError,
    sessions::{
        ClearanceOrder, ClearanceStatsSnapshot, SequenceReport, ShutdownCoordinator,
        StorageClearOptions, WillQuitSubscription,
    },
    trust::{
        CertificateErrorDecision, CertificateVerdict, CertificateVerifier,
        ClientCertificateSelection, RequestHeaderInjector,
    },
};

/// A configuration interface for building [ShellSessions].
///
/// Provides the shell with its collaborators: the embedded server whose
/// identity is trusted, and the sessions which are wiped on start-up, on
/// session resets and before exiting. Unset collaborators degrade gracefully,
/// see [ShellSessionsConfiguration].
#[derive(uniffi::Object, Default)]
pub struct ShellSessionsBuilder {
    config: Mutex<ShellSessionsConfiguration>,
}

#[uniffi::export(async_runtime = "tokio")]
impl ShellSessionsBuilder {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self {
            config: Default::default(),
        }
    }

    /// The embedded content server whose requests and certificates are trusted.
    pub fn set_server(&self, server: Box<dyn ServerTrust>) {
        let mut config = self.config.lock().unwrap();
        config.server = Some(server.into());
    }

    /// The shell's default session.
    pub fn set_default_session(&self, session: Box<dyn ClearableSession>) {
        let mut config = self.config.lock().unwrap();
        config.default_session = Some(session.into());
    }

    /// The partition publication webviews browse in.
    pub fn set_webview_session(&self, session: Box<dyn ClearableSession>) {
        let mut config = self.config.lock().unwrap();
        config.webview_session = Some(session.into());
    }

    /// Set the log filter level.
    ///
    /// By Default the log filter is set to [LogLevel::Info]
    pub fn set_log_level(&self, level: LogLevel) {
        let mut config = self.config.lock().unwrap();
        config.log_level = level;
    }

    /// Set the deadline for clearing a single session in milliseconds.
    ///
    /// By default the timeout is 6 seconds.
    pub fn set_clearance_timeout_ms(&self, timeout: u64) {
        let mut config = self.config.lock().unwrap();
        config.clearance_timeout_ms = timeout;
    }

    /// Set the deadline after which the exit/continue action is forced,
    /// whatever state the session clearances are in, in milliseconds.
    ///
    /// By default the timeout is 6 seconds.
    pub fn set_shutdown_timeout_ms(&self, timeout: u64) {
        let mut config = self.config.lock().unwrap();
        config.shutdown_timeout_ms = timeout;
    }

    /// Which session is cleared first, defaults to [ClearanceOrder::DefaultFirst].
    pub fn set_clearance_order(&self, order: ClearanceOrder) {
        let mut config = self.config.lock().unwrap();
        config.clearance_order = order;
    }

    /// By default every storage category of every origin is wiped.
    pub fn set_storage_options(&self, options: StorageClearOptions) {
        let mut config = self.config.lock().unwrap();
        config.storage_options = options;
    }

    /// Sets the `User-Agent` marker the embedded server uses to recognize
    /// shell traffic, defaults to `R2`.
    pub fn set_user_agent(&self, user_agent: String) {
        let mut config = self.config.lock().unwrap();
        config.user_agent = user_agent;
    }

    /// Returns the current log level setting.
    pub fn log_level(&self) -> LogLevel {
        let config = self.config.lock().unwrap();
        config.log_level
    }

    /// Returns the current single session deadline in milliseconds.
    pub fn clearance_timeout_ms(&self) -> u64 {
        let config = self.config.lock().unwrap();
        config.clearance_timeout_ms
    }

    /// Returns the current sequence deadline in milliseconds.
    pub fn shutdown_timeout_ms(&self) -> u64 {
        let config = self.config.lock().unwrap();
        config.shutdown_timeout_ms
    }

    pub fn clearance_order(&self) -> ClearanceOrder {
        let config = self.config.lock().unwrap();
        config.clearance_order
    }

    pub fn user_agent(&self) -> String {
        let config = self.config.lock().unwrap();
        config.user_agent.clone()
    }

    /// Builds [ShellSessions] from the parameters set above.
    pub async fn build(&self) -> Arc<ShellSessions> {
        let config = self.config.lock().unwrap().clone();
        Arc::new(ShellSessions::new(config))
    }
}

/// The shell side of the embedded server: request stamping, TLS trust
/// decisions and session clearance around lifecycle events.
#[derive(uniffi::Object)]
pub struct ShellSessions {
    injector: RequestHeaderInjector,
    verifier: CertificateVerifier,
    coordinator: ShutdownCoordinator,
    runtime: Handle,
}

impl ShellSessions {
    /// Must be called from within a tokio runtime, which later lifecycle
    /// hooks are spawned onto.
    pub fn new(config: ShellSessionsConfiguration) -> Self {
        init_log(config.log_level);
        debug!("Configuring shell sessions {config:?}");

        Self {
            injector: RequestHeaderInjector::new(config.server.clone(), config.user_agent.clone()),
            verifier: CertificateVerifier::new(config.server.clone()),
            coordinator: ShutdownCoordinator::new(&config),
            runtime: Handle::current(),
        }
    }

    pub fn injector(&self) -> &RequestHeaderInjector {
        &self.injector
    }

    pub fn verifier(&self) -> &CertificateVerifier {
        &self.verifier
    }

    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl ShellSessions {
    /// Stamps the headers of an outbound request and returns them.
    pub fn inject_headers(&self, mut headers: HashMap<String, String>) -> HashMap<String, String> {
        self.injector.inject(&mut headers);
        headers
    }

    /// Certificate verification for a TLS handshake with `hostname`.
    pub fn verify_certificate(&self, hostname: String) -> CertificateVerdict {
        self.verifier.verify_handshake(&hostname)
    }

    /// Decides whether a certificate validation `error` on `url` is overridden.
    pub fn certificate_error(&self, url: String, error: String) -> CertificateErrorDecision {
        self.verifier.certificate_error(&url, error)
    }

    /// Answers a client certificate prompt from `url`.
    pub fn select_client_certificate(
        &self,
        url: String,
        candidates: Vec<ClientCertificate>,
    ) -> ClientCertificateSelection {
        self.verifier.select_client_certificate(&url, &candidates)
    }

    /// Clears leftovers from a previous run when the application is ready,
    /// then performs `action`. Start-up is held back by the sequence
    /// deadline at most.
    pub async fn on_ready(&self, action: Box<dyn ExitAction>) -> ShutdownPath {
        debug!("app ready");
        self.coordinator
            .run(ShutdownTrigger::Ready, action.into())
            .await
    }

    /// Registers the exit action which runs once the sessions were cleared
    /// on exit. The returned subscription must be consulted by the host's
    /// will-quit hook.
    pub fn subscribe_will_quit(&self, action: Box<dyn ExitAction>) -> Arc<WillQuitSubscription> {
        Arc::new(WillQuitSubscription::new(
            self.coordinator.clone(),
            action.into(),
            self.runtime.clone(),
        ))
    }

    /// Wipes every session before a fresh browsing session starts, then
    /// performs `action`. Fails if a clearance is already running.
    pub async fn reset_sessions(
        &self,
        action: Box<dyn ExitAction>,
    ) -> Result<ShutdownPath, ShellError> {
        self.coordinator
            .try_run(ShutdownTrigger::SessionReset, action.into())
            .await
    }

    /// Wipes every session, without an outer deadline or follow-up action.
    /// Fails if a clearance is already running.
    pub async fn clear_sessions(&self) -> Result<SequenceReport, ShellError> {
        self.coordinator.try_clear_sessions().await
    }

    pub fn is_clearing(&self) -> bool {
        self.coordinator.is_clearing()
    }

    pub fn stats(&self) -> ClearanceStatsSnapshot {
        self.coordinator.stats()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        set_log_level(level)
    }
}
