//! Wiping transient browsing state (http cache, cookies, storage) without
//! ever hanging on a host that does not report back.
//!
//! A [ClearanceBarrier] clears one session and resolves once both of its
//! operations signal, or when its deadline expires. The [ShutdownCoordinator]
//! chains one barrier per session scope behind an outer deadline and invokes
//! the host's exit/continue action exactly once.

mod barrier;
mod coordinator;
mod signal;

#[cfg(test)]
pub(crate) mod tests;

use std::sync::atomic::{AtomicU64, Ordering};

pub use barrier::{ClearanceBarrier, ClearanceOutcome, ClearancePath};
pub use coordinator::{SequenceReport, ShutdownCoordinator, WillQuitSubscription};
use serde::Serialize;
pub use signal::{ClearanceKind, ClearanceSignal, OnceGuard};

use crate::callbacks::ShutdownPath;

/// Default deadline for a single barrier and for a whole sequence.
pub const DEFAULT_CLEARANCE_TIMEOUT_MS: u64 = 6000;

/// An isolated cache/storage partition.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionScope {
    /// The shell's default session.
    Default,
    /// The partition publication webviews browse in.
    Webview,
}

impl std::fmt::Display for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionScope::Default => f.write_str("[default]"),
            SessionScope::Webview => f.write_str("[webview]"),
        }
    }
}

/// Which scope a clearance sequence wipes first.
#[derive(uniffi::Enum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClearanceOrder {
    #[default]
    DefaultFirst,
    WebviewFirst,
}

impl ClearanceOrder {
    pub fn scopes(self) -> [SessionScope; 2] {
        match self {
            ClearanceOrder::DefaultFirst => [SessionScope::Default, SessionScope::Webview],
            ClearanceOrder::WebviewFirst => [SessionScope::Webview, SessionScope::Default],
        }
    }
}

#[derive(uniffi::Enum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageQuota {
    Temporary,
    Persistent,
    Syncable,
}

#[derive(uniffi::Enum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Appcache,
    Cookies,
    Filesystem,
    Indexdb,
    Localstorage,
    Shadercache,
    Websql,
    Serviceworkers,
}

/// The storage categories a session is asked to wipe.
#[derive(uniffi::Record, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StorageClearOptions {
    pub origin: String,
    pub quotas: Vec<StorageQuota>,
    pub storages: Vec<StorageKind>,
}

impl StorageClearOptions {
    /// Every origin, quota and storage category.
    pub fn all() -> Self {
        Self {
            origin: "*".to_owned(),
            quotas: vec![
                StorageQuota::Temporary,
                StorageQuota::Persistent,
                StorageQuota::Syncable,
            ],
            storages: vec![
                StorageKind::Appcache,
                StorageKind::Cookies,
                StorageKind::Filesystem,
                StorageKind::Indexdb,
                StorageKind::Localstorage,
                StorageKind::Shadercache,
                StorageKind::Websql,
                StorageKind::Serviceworkers,
            ],
        }
    }

    /// Renders the options in the shape browser shells accept for storage
    /// clearing, so hosts can forward them untouched.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

impl Default for StorageClearOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Process-lifetime counters of how clearances resolved.
#[derive(Debug, Default)]
pub struct ClearanceStats {
    barriers_completed: AtomicU64,
    barriers_forced: AtomicU64,
    sequences_completed: AtomicU64,
    sequences_forced: AtomicU64,
}

#[derive(uniffi::Record, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClearanceStatsSnapshot {
    pub barriers_completed: u64,
    pub barriers_forced: u64,
    pub sequences_completed: u64,
    pub sequences_forced: u64,
}

impl ClearanceStats {
    pub(crate) fn record_barrier(&self, path: ClearancePath) {
        let counter = match path {
            ClearancePath::Completed => &self.barriers_completed,
            ClearancePath::TimedOut => &self.barriers_forced,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sequence(&self, path: ShutdownPath) {
        let counter = match path {
            ShutdownPath::Completed => &self.sequences_completed,
            ShutdownPath::Forced => &self.sequences_forced,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ClearanceStatsSnapshot {
        ClearanceStatsSnapshot {
            barriers_completed: self.barriers_completed.load(Ordering::Relaxed),
            barriers_forced: self.barriers_forced.load(Ordering::Relaxed),
            sequences_completed: self.sequences_completed.load(Ordering::Relaxed),
            sequences_forced: self.sequences_forced.load(Ordering::Relaxed),
        }
    }
}
