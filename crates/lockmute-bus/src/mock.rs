//! Mock bus for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lockmute_types::{SessionHandle, SessionKind, SessionRecord};

use crate::error::BusError;
use crate::{BusSignal, SessionManager, SignalBus, SignalSink, SignalSubject, Subscription};

#[derive(Default)]
struct MockBusState {
    sessions: Vec<SessionRecord>,
    kinds: HashMap<String, SessionKind>,
    pid_session: Option<SessionHandle>,
    listing_fails: bool,
    screensavers: Vec<String>,
    next_id: u64,
    subscribers: Vec<(u64, SignalSubject, SignalSink)>,
}

/// Scriptable session manager and signal bus.
///
/// Clones share state, so the same bus can be handed to the daemon as both
/// its [`SessionManager`] and its [`SignalBus`].
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clonable handle for scripting the bus from tests.
    pub fn handle(&self) -> MockBusHandle {
        MockBusHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable control handle for `MockBus`.
#[derive(Clone)]
pub struct MockBusHandle {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBusHandle {
    /// Add a session to the listing, optionally with a `Type` attribute.
    pub fn add_session(&self, record: SessionRecord, kind: Option<SessionKind>) {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = kind {
            state.kinds.insert(record.path.clone(), kind);
        }
        state.sessions.push(record);
    }

    /// Session returned for any `session_by_pid` lookup.
    pub fn set_pid_session(&self, handle: SessionHandle) {
        self.state.lock().unwrap().pid_session = Some(handle);
    }

    /// Make `list_sessions` fail.
    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().listing_fails = fail;
    }

    /// Put a screensaver service on the bus.
    pub fn add_screensaver(&self, service: &str) {
        self.state
            .lock()
            .unwrap()
            .screensavers
            .push(service.to_string());
    }

    /// Subjects of the live subscriptions.
    pub fn subscriptions(&self) -> Vec<SignalSubject> {
        self.state
            .lock()
            .unwrap()
            .subscribers
            .iter()
            .map(|(_, subject, _)| subject.clone())
            .collect()
    }

    /// Deliver a signal to every live subscriber of the matching object kind,
    /// the way a bus reader would: synchronously, before returning.
    ///
    /// Returns how many subscribers received it.
    pub fn emit(&self, signal: BusSignal) -> usize {
        let sinks: Vec<SignalSink> = self
            .state
            .lock()
            .unwrap()
            .subscribers
            .iter()
            .filter(|(_, subject, _)| routes_to(subject, signal))
            .map(|(_, _, sink)| Arc::clone(sink))
            .collect();

        for sink in &sinks {
            sink(signal);
        }
        sinks.len()
    }
}

fn routes_to(subject: &SignalSubject, signal: BusSignal) -> bool {
    matches!(
        (subject, signal),
        (
            SignalSubject::Session(_),
            BusSignal::Lock | BusSignal::Unlock
        ) | (SignalSubject::Manager, BusSignal::PrepareForSleep(_))
            | (SignalSubject::ScreenSaver(_), BusSignal::ActiveChanged(_))
    )
}

#[async_trait]
impl SessionManager for MockBus {
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, BusError> {
        let state = self.state.lock().unwrap();
        if state.listing_fails {
            return Err(BusError::call("ListSessions", "mock listing failure"));
        }
        Ok(state.sessions.clone())
    }

    async fn session_type(
        &self,
        session: &SessionRecord,
    ) -> Result<Option<SessionKind>, BusError> {
        Ok(self.state.lock().unwrap().kinds.get(&session.path).cloned())
    }

    async fn session_by_pid(&self, _pid: u32) -> Result<SessionHandle, BusError> {
        self.state
            .lock()
            .unwrap()
            .pid_session
            .clone()
            .ok_or_else(|| BusError::call("GetSessionByPID", "no session for pid"))
    }
}

#[async_trait]
impl SignalBus for MockBus {
    async fn subscribe(
        &mut self,
        subject: &SignalSubject,
        sink: SignalSink,
    ) -> Result<Subscription, BusError> {
        let mut state = self.state.lock().unwrap();
        if let SignalSubject::ScreenSaver(target) = subject {
            if !state.screensavers.contains(&target.service) {
                return Err(BusError::Unavailable(target.service.clone()));
            }
        }
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, subject.clone(), sink));

        let shared = Arc::clone(&self.state);
        Ok(Subscription::new(subject.clone(), move || {
            shared
                .lock()
                .unwrap()
                .subscribers
                .retain(|(other, _, _)| *other != id);
        }))
    }
}
