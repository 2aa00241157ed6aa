//! Event source adapters.
//!
//! Each adapter binds one upstream signal shape to the normalized
//! [`LockEvent`] and pushes it into the daemon's event queue straight from the
//! bus reader. No adapter has a queue or task of its own, so events reach the
//! daemon in the order they were read. Adapters never touch the audio device.

use std::sync::Arc;

use lockmute_bus::{
    BusError, BusSignal, ScreenSaverTarget, SignalBus, SignalSink, SignalSubject, Subscription,
};
use lockmute_types::{LockEvent, LockSource, SessionHandle};
use tokio::sync::mpsc;
use tracing::debug;

use crate::daemon::DaemonEvent;

/// Upstream signal shape an adapter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Separate `Lock` / `Unlock` signals on the session.
    SessionLock,
    /// `PrepareForSleep(sleeping)` on the manager.
    SleepPrepare,
    /// `ActiveChanged(active)` on the desktop screensaver.
    ScreenSaver,
}

impl AdapterKind {
    pub fn source(self) -> LockSource {
        match self {
            Self::SessionLock => LockSource::Session,
            Self::SleepPrepare => LockSource::Sleep,
            Self::ScreenSaver => LockSource::ScreenSaver,
        }
    }

    /// Translate a raw signal. Shapes this adapter does not own map to `None`.
    pub fn normalize(self, signal: BusSignal) -> Option<LockEvent> {
        let locked = match (self, signal) {
            (Self::SessionLock, BusSignal::Lock) => true,
            (Self::SessionLock, BusSignal::Unlock) => false,
            (Self::SleepPrepare, BusSignal::PrepareForSleep(sleeping)) => sleeping,
            (Self::ScreenSaver, BusSignal::ActiveChanged(active)) => active,
            _ => return None,
        };
        Some(LockEvent::new(self.source(), locked))
    }
}

/// One signal binding: an object on the bus plus the shape it emits.
#[derive(Debug, Clone)]
pub struct EventSourceAdapter {
    kind: AdapterKind,
    subject: SignalSubject,
}

impl EventSourceAdapter {
    pub fn session_lock(session: SessionHandle) -> Self {
        Self {
            kind: AdapterKind::SessionLock,
            subject: SignalSubject::Session(session),
        }
    }

    pub fn sleep_prepare() -> Self {
        Self {
            kind: AdapterKind::SleepPrepare,
            subject: SignalSubject::Manager,
        }
    }

    pub fn screensaver(target: ScreenSaverTarget) -> Self {
        Self {
            kind: AdapterKind::ScreenSaver,
            subject: SignalSubject::ScreenSaver(target),
        }
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// Subscribe on `bus` and push normalized events into `events`.
    pub async fn register(
        &self,
        bus: &mut dyn SignalBus,
        events: mpsc::UnboundedSender<DaemonEvent>,
    ) -> Result<Subscription, BusError> {
        let kind = self.kind;
        let sink: SignalSink = Arc::new(move |signal| match kind.normalize(signal) {
            Some(event) => {
                // A closed queue means the daemon is shutting down.
                let _ = events.send(DaemonEvent::Lock(event));
            }
            None => debug!(?kind, ?signal, "ignoring foreign signal"),
        });
        bus.subscribe(&self.subject, sink).await
    }
}
