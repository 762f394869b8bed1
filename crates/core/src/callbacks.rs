use std::sync::Arc;

use crate::sessions::{ClearanceSignal, StorageClearOptions};

/// The identity material an embedded server publishes while it runs in
/// secured (TLS) mode. It lives as long as that server instance.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct TrustToken {
    /// Suffix of the secret header name, sent as `X-Debug-<trust_key>`.
    pub trust_key: String,
    /// Value of the secret header.
    pub trust_val: String,
    /// Hostname the server's certificate is issued for.
    pub url_host: String,
    /// Client certificate presented back to the server when it asks for one.
    pub client_certificate: Vec<u8>,
}

#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct ClientCertificate {
    pub data: Vec<u8>,
}

/// Implemented by the host around its embedded content server.
#[uniffi::export(callback_interface)]
pub trait ServerTrust: Send + Sync {
    /// True when the server is running over TLS with an ephemeral certificate.
    fn is_secured(&self) -> bool;

    /// The base url of the server, for example `https://127.0.0.1:4040`.
    fn server_url(&self) -> String;

    /// The trust tuple for this server instance, if one was produced.
    fn server_info(&self) -> Option<TrustToken>;
}

/// A cache/storage partition owned by the host, such as the default session
/// or the webview partition.
///
/// Both operations must return immediately. Completion is reported through the
/// provided [ClearanceSignal], from any thread, at any later point.
#[uniffi::export(callback_interface)]
pub trait ClearableSession: Send + Sync {
    fn clear_cache(&self, done: Arc<ClearanceSignal>);

    fn clear_storage(&self, options: StorageClearOptions, done: Arc<ClearanceSignal>);
}

/// The action a clearance sequence unblocks: quitting the process on exit,
/// or resuming normal operation after start-up and session resets.
#[uniffi::export(callback_interface)]
pub trait ExitAction: Send + Sync {
    fn perform(&self, trigger: ShutdownTrigger, path: ShutdownPath);
}

/// User emitted response from lifecycle event hooks.
/// Determines whether or not the default platform action is taken.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HandlerResponse {
    #[default]
    /// Return this to proceed as normal.
    Default,
    /// Return this to cancel the platform action, it will be taken later.
    PreventDefault,
}

/// The lifecycle event which started a clearance sequence.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// Application start-up, clearing leftovers from a previous run.
    Ready,
    /// The application is about to exit.
    WillQuit,
    /// A fresh browsing session was requested.
    SessionReset,
}

/// How a clearance sequence handed control to its [ExitAction].
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownPath {
    /// Every stage of the sequence ran to its end.
    Completed,
    /// The outer deadline expired first.
    Forced,
}
