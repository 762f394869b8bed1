use std::sync::Arc;

use crate::{
    callbacks::{ClearableSession, ServerTrust},
    sessions::{ClearanceOrder, StorageClearOptions, DEFAULT_CLEARANCE_TIMEOUT_MS},
    trust::DEFAULT_USER_AGENT,
};

#[derive(uniffi::Enum, Debug, Clone, Default, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Clone)]
pub struct ShellSessionsConfiguration {
    /// The embedded content server. Without one every trust check resolves
    /// to its safe default.
    pub server: Option<Arc<dyn ServerTrust>>,
    /// The shell's default session, absent sessions are treated as already cleared.
    pub default_session: Option<Arc<dyn ClearableSession>>,
    /// The partition publication webviews browse in.
    pub webview_session: Option<Arc<dyn ClearableSession>>,
    /// Initial log level - defaults to [LogLevel::Info]
    pub log_level: LogLevel,
    /// Deadline for each single session clearance, in milliseconds.
    pub clearance_timeout_ms: u64,
    /// Deadline for a whole clearance sequence before the exit/continue
    /// action is forced, in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Which session is cleared first.
    pub clearance_order: ClearanceOrder,
    /// The storage categories each clearance wipes.
    pub storage_options: StorageClearOptions,
    /// The `User-Agent` marker set on shell traffic.
    pub user_agent: String,
}

impl Default for ShellSessionsConfiguration {
    fn default() -> Self {
        Self {
            server: None,
            default_session: None,
            webview_session: None,
            log_level: LogLevel::default(),
            clearance_timeout_ms: DEFAULT_CLEARANCE_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_CLEARANCE_TIMEOUT_MS,
            clearance_order: ClearanceOrder::default(),
            storage_options: StorageClearOptions::all(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl std::fmt::Debug for ShellSessionsConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSessionsConfiguration")
            .field("server", &self.server.is_some().then_some("..."))
            .field(
                "default_session",
                &self.default_session.is_some().then_some("..."),
            )
            .field(
                "webview_session",
                &self.webview_session.is_some().then_some("..."),
            )
            .field("log_level", &self.log_level)
            .field("clearance_timeout_ms", &self.clearance_timeout_ms)
            .field("shutdown_timeout_ms", &self.shutdown_timeout_ms)
            .field("clearance_order", &self.clearance_order)
            .field("storage_options", &self.storage_options)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
