// Host doubles for clearance tests.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::sleep;

use crate::{
    callbacks::{ClearableSession, ExitAction, ShutdownPath, ShutdownTrigger},
    client::ShellSessionsConfiguration,
    sessions::{ClearanceSignal, SessionScope, StorageClearOptions},
};

#[derive(Debug, Clone, PartialEq)]
pub enum MockMessage {
    CacheRequested(SessionScope),
    StorageRequested(SessionScope, StorageClearOptions),
    Exit(ShutdownTrigger, ShutdownPath),
}

#[derive(Default)]
pub struct MockMessageStore {
    messages: Mutex<Vec<MockMessage>>,
}

impl MockMessageStore {
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    pub fn add_message(&self, msg: MockMessage) {
        self.messages.lock().unwrap().push(msg);
    }

    pub fn messages(&self) -> Vec<MockMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn exits(&self) -> Vec<(ShutdownTrigger, ShutdownPath)> {
        self.messages()
            .into_iter()
            .filter_map(|msg| match msg {
                MockMessage::Exit(trigger, path) => Some((trigger, path)),
                _ => None,
            })
            .collect()
    }

    /// The scope of every clearance request, in request order.
    pub fn requested_scopes(&self) -> Vec<SessionScope> {
        self.messages()
            .into_iter()
            .filter_map(|msg| match msg {
                MockMessage::CacheRequested(scope) => Some(scope),
                MockMessage::StorageRequested(scope, _) => Some(scope),
                _ => None,
            })
            .collect()
    }
}

/// How a mocked clearance operation reports back.
#[derive(Debug, Clone, Copy)]
pub enum Completion {
    Immediate,
    After(Duration),
    /// Signals twice in a row after the delay.
    Twice(Duration),
    /// Holds on to the signal and never fires it.
    Never,
    /// Releases the signal without firing it.
    Dropped,
}

pub struct MockSession {
    cache: Completion,
    storage: Completion,
    store: Arc<MockMessageStore>,
    held: Mutex<Vec<Arc<ClearanceSignal>>>,
}

impl MockSession {
    pub fn new(cache: Completion, storage: Completion, store: Arc<MockMessageStore>) -> Arc<Self> {
        Arc::new(Self {
            cache,
            storage,
            store,
            held: Mutex::default(),
        })
    }

    pub fn responsive(store: Arc<MockMessageStore>) -> Arc<Self> {
        Self::new(
            Completion::After(Duration::from_millis(1)),
            Completion::After(Duration::from_millis(1)),
            store,
        )
    }

    fn complete(&self, completion: Completion, done: Arc<ClearanceSignal>) {
        match completion {
            Completion::Immediate => done.signal(),
            Completion::After(delay) => {
                tokio::spawn(async move {
                    sleep(delay).await;
                    done.signal();
                });
            }
            Completion::Twice(delay) => {
                tokio::spawn(async move {
                    sleep(delay).await;
                    done.signal();
                    done.signal();
                });
            }
            Completion::Never => self.held.lock().unwrap().push(done),
            Completion::Dropped => drop(done),
        }
    }
}

impl ClearableSession for MockSession {
    fn clear_cache(&self, done: Arc<ClearanceSignal>) {
        self.store
            .add_message(MockMessage::CacheRequested(done.scope()));
        self.complete(self.cache, done);
    }

    fn clear_storage(&self, options: StorageClearOptions, done: Arc<ClearanceSignal>) {
        self.store
            .add_message(MockMessage::StorageRequested(done.scope(), options));
        self.complete(self.storage, done);
    }
}

/// Lets a shared mock session be handed to the builder, which takes ownership.
impl ClearableSession for Arc<MockSession> {
    fn clear_cache(&self, done: Arc<ClearanceSignal>) {
        self.as_ref().clear_cache(done)
    }

    fn clear_storage(&self, options: StorageClearOptions, done: Arc<ClearanceSignal>) {
        self.as_ref().clear_storage(options, done)
    }
}

pub struct MockExit {
    store: Arc<MockMessageStore>,
}

impl MockExit {
    pub fn new(store: Arc<MockMessageStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }

    pub fn boxed(store: Arc<MockMessageStore>) -> Box<Self> {
        Box::new(Self { store })
    }
}

impl ExitAction for MockExit {
    fn perform(&self, trigger: ShutdownTrigger, path: ShutdownPath) {
        self.store.add_message(MockMessage::Exit(trigger, path));
    }
}

pub fn config(
    default_session: Option<Arc<MockSession>>,
    webview_session: Option<Arc<MockSession>>,
) -> ShellSessionsConfiguration {
    ShellSessionsConfiguration {
        default_session: default_session.map(|s| s as Arc<dyn ClearableSession>),
        webview_session: webview_session.map(|s| s as Arc<dyn ClearableSession>),
        ..Default::default()
    }
}
